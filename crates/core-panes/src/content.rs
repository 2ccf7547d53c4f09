//! Content sources for list previews.
//!
//! A source maps an item identifier to the lines shown in the preview area.
//! Missing or unreadable content is an ordinary outcome here: callers turn
//! the error into a placeholder line instead of propagating it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use tracing::debug;

const TAB_WIDTH: usize = 4;
/// Lines read per file. No preview region is taller than this.
pub const PREVIEW_LINE_LIMIT: usize = 500;
/// Bytes read per file, so one enormous line cannot pull in the whole file.
const PREVIEW_BYTE_LIMIT: u64 = 256 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ContentLoadError {
    #[error("{id} not found")]
    NotFound { id: String },
    #[error("cannot read {id}: {source}")]
    Unreadable {
        id: String,
        #[source]
        source: io::Error,
    },
}

impl ContentLoadError {
    /// Single line shown in place of the content.
    pub fn placeholder(&self) -> String {
        match self {
            ContentLoadError::NotFound { id } => format!("File not found: {id}"),
            ContentLoadError::Unreadable { id, .. } => format!("Cannot read: {id}"),
        }
    }
}

pub trait ContentSource {
    fn load(&self, id: &str) -> Result<Vec<String>, ContentLoadError>;
}

/// Treats identifiers as file paths, optionally relative to a base directory.
#[derive(Debug, Clone, Default)]
pub struct FsContentSource {
    base: Option<PathBuf>,
}

impl FsContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn resolve(&self, id: &str) -> PathBuf {
        match &self.base {
            Some(base) => base.join(id),
            None => PathBuf::from(id),
        }
    }
}

fn classify(id: &str, source: io::Error) -> ContentLoadError {
    match source.kind() {
        io::ErrorKind::NotFound => ContentLoadError::NotFound { id: id.to_string() },
        _ => ContentLoadError::Unreadable {
            id: id.to_string(),
            source,
        },
    }
}

impl ContentSource for FsContentSource {
    /// Reads at most `PREVIEW_LINE_LIMIT` lines from the head of the file.
    fn load(&self, id: &str) -> Result<Vec<String>, ContentLoadError> {
        let file = File::open(self.resolve(id)).map_err(|e| classify(id, e))?;
        let mut reader = BufReader::new(file.take(PREVIEW_BYTE_LIMIT));
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        while lines.len() < PREVIEW_LINE_LIMIT {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| classify(id, e))?;
            if n == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            lines.push(expand_tabs(&String::from_utf8_lossy(&buf)));
        }
        debug!(target: "pane.list", id, lines = lines.len(), "preview loaded");
        Ok(lines)
    }
}

fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + TAB_WIDTH);
    let mut col = 0usize;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - col % TAB_WIDTH;
            out.extend(std::iter::repeat_n(' ', pad));
            col += pad;
        } else {
            out.push(ch);
            col += 1;
        }
    }
    out
}

/// In-memory source keyed by identifier. Unknown identifiers are `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct StaticContentSource {
    entries: HashMap<String, Vec<String>>,
}

impl StaticContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, text: &str) -> Self {
        self.entries
            .insert(id.to_string(), text.lines().map(str::to_string).collect());
        self
    }
}

impl ContentSource for StaticContentSource {
    fn load(&self, id: &str) -> Result<Vec<String>, ContentLoadError> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| ContentLoadError::NotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_expand_to_next_stop() {
        assert_eq!(expand_tabs("a\tb"), "a   b");
        assert_eq!(expand_tabs("\tx"), "    x");
        assert_eq!(expand_tabs("plain"), "plain");
    }

    #[test]
    fn placeholders_name_the_item() {
        let missing = ContentLoadError::NotFound { id: "x.txt".into() };
        assert_eq!(missing.placeholder(), "File not found: x.txt");
        let denied = ContentLoadError::Unreadable {
            id: "y".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(denied.placeholder(), "Cannot read: y");
    }

    #[test]
    fn static_source_misses_are_not_found() {
        let src = StaticContentSource::new().with("a", "one\ntwo");
        assert_eq!(src.load("a").unwrap(), vec!["one", "two"]);
        assert!(matches!(src.load("b"), Err(ContentLoadError::NotFound { .. })));
    }
}
