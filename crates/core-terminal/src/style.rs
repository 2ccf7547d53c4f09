//! Cell styling.
//!
//! Deliberately small: the panes only need bold, reverse video, dim and a
//! foreground color. `Style::default()` is plain text.

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attr: u8 {
        const BOLD    = 0b0000_0001;
        const REVERSE = 0b0000_0010;
        const DIM     = 0b0000_0100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub attrs: Attr,
    pub fg: Option<Color>,
}

impl Style {
    pub const fn plain() -> Self {
        Self {
            attrs: Attr::empty(),
            fg: None,
        }
    }

    pub const fn bold() -> Self {
        Self {
            attrs: Attr::BOLD,
            fg: None,
        }
    }

    pub const fn reverse() -> Self {
        Self {
            attrs: Attr::REVERSE,
            fg: None,
        }
    }

    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn is_bold(&self) -> bool {
        self.attrs.contains(Attr::BOLD)
    }

    pub fn is_reverse(&self) -> bool {
        self.attrs.contains(Attr::REVERSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_compose() {
        let s = Style::bold().fg(Color::Cyan);
        assert!(s.is_bold());
        assert!(!s.is_reverse());
        assert_eq!(s.fg, Some(Color::Cyan));
        assert_eq!(Style::default(), Style::plain());
    }
}
