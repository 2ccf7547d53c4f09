//! Terminal writer.
//!
//! Batches primitive terminal operations so a refresh emits a single write.
//!
//! Design invariants:
//! * Commands preserve ordering; no flushing mid-frame.
//! * All positions are absolute (0,0) origin; caller ensures bounds.
//! * Style changes are emitted only when the style actually changes between
//!   consecutive prints.
//! * Writer owns no global state; it is a short-lived object per refresh.

use crate::style::{Attr, Color, Style};
use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color as CColor, Print, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(u16, u16),
    ClearAll,
    Style(Style),
    Print(String),
}

#[derive(Default)]
pub struct Writer {
    cmds: Vec<Command>,
    current: Option<Style>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, col: u16, row: u16) {
        self.cmds.push(Command::MoveTo(col, row));
    }

    pub fn clear_all(&mut self) {
        self.cmds.push(Command::ClearAll);
        self.current = None;
    }

    pub fn set_style(&mut self, style: Style) {
        if self.current != Some(style) {
            self.cmds.push(Command::Style(style));
            self.current = Some(style);
        }
    }

    pub fn print<S: Into<String>>(&mut self, s: S) {
        let s: String = s.into();
        if s.is_empty() {
            return;
        }
        // Merge adjacent prints so a row becomes one command per style run.
        if let Some(Command::Print(prev)) = self.cmds.last_mut() {
            prev.push_str(&s);
        } else {
            self.cmds.push(Command::Print(s));
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Emit every queued command into `out` and flush it. Returns the number
    /// of commands written.
    pub fn flush_to<W: Write>(self, out: &mut W) -> Result<usize> {
        let count = self.cmds.len();
        for c in self.cmds {
            match c {
                Command::MoveTo(x, y) => {
                    queue!(out, MoveTo(x, y))?;
                }
                Command::ClearAll => {
                    queue!(out, Clear(ClearType::All))?;
                }
                Command::Style(style) => {
                    queue!(out, SetAttribute(Attribute::Reset))?;
                    if style.attrs.contains(Attr::BOLD) {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    if style.attrs.contains(Attr::REVERSE) {
                        queue!(out, SetAttribute(Attribute::Reverse))?;
                    }
                    if style.attrs.contains(Attr::DIM) {
                        queue!(out, SetAttribute(Attribute::Dim))?;
                    }
                    if let Some(fg) = style.fg {
                        queue!(out, SetForegroundColor(map_color(fg)))?;
                    }
                }
                Command::Print(s) => {
                    queue!(out, Print(s))?;
                }
            }
        }
        queue!(out, SetAttribute(Attribute::Reset))?;
        out.flush()?;
        Ok(count)
    }
}

fn map_color(c: Color) -> CColor {
    match c {
        Color::Black => CColor::Black,
        Color::Red => CColor::DarkRed,
        Color::Green => CColor::DarkGreen,
        Color::Yellow => CColor::DarkYellow,
        Color::Blue => CColor::DarkBlue,
        Color::Magenta => CColor::DarkMagenta,
        Color::Cyan => CColor::DarkCyan,
        Color::White => CColor::Grey,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_prints_merge_and_styles_dedupe() {
        let mut w = Writer::new();
        w.move_to(0, 0);
        w.set_style(Style::plain());
        w.print("a");
        w.print("b");
        w.set_style(Style::plain());
        w.print("c");
        w.set_style(Style::reverse());
        w.print("x");
        assert_eq!(
            w.commands(),
            &[
                Command::MoveTo(0, 0),
                Command::Style(Style::plain()),
                Command::Print("abc".into()),
                Command::Style(Style::reverse()),
                Command::Print("x".into()),
            ]
        );
    }

    #[test]
    fn flush_writes_escape_sequences() {
        let mut w = Writer::new();
        w.move_to(2, 1);
        w.set_style(Style::bold());
        w.print("hi");
        let mut buf: Vec<u8> = Vec::new();
        let n = w.flush_to(&mut buf).unwrap();
        assert_eq!(n, 3);
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("hi"));
        assert!(out.contains("\x1b[2;3H"), "MoveTo is 1-based row;col: {out:?}");
    }
}
