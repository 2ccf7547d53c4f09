//! Display-width aware clipping.
//!
//! All width decisions for drawn text flow through `cluster_width` so the
//! surfaces and the panes agree on how many columns a string occupies.
//! Text is measured per extended grapheme cluster; control characters are
//! replaced before measuring so a stray escape byte can never move the
//! terminal cursor outside the region being drawn.

use std::borrow::Cow;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

pub const ELLIPSIS: &str = "...";

/// Column width of a single grapheme cluster (never zero so every cluster
/// owns at least one cell).
pub fn cluster_width(cluster: &str) -> u16 {
    UnicodeWidthStr::width(cluster).clamp(1, 2) as u16
}

/// Total display width of `text`.
pub fn display_width(text: &str) -> usize {
    clusters(text).map(|(_, w)| w as usize).sum()
}

/// Iterate sanitized clusters with their widths.
pub fn clusters(text: &str) -> impl Iterator<Item = (&str, u16)> {
    text.graphemes(true).map(|g| {
        if g.chars().any(char::is_control) {
            let replacement: &str = if g == "\t" { " " } else { "?" };
            (replacement, 1)
        } else {
            (g, cluster_width(g))
        }
    })
}

/// Longest prefix of `text` that fits in `max_cols` columns. A wide cluster
/// that would straddle the limit is dropped rather than split.
pub fn clip_to_width(text: &str, max_cols: usize) -> Cow<'_, str> {
    let clean = !text.chars().any(char::is_control);
    if clean && display_width(text) <= max_cols {
        return Cow::Borrowed(text);
    }
    let mut used = 0usize;
    let mut out = String::new();
    for (cluster, w) in clusters(text) {
        if used + w as usize > max_cols {
            break;
        }
        used += w as usize;
        out.push_str(cluster);
    }
    Cow::Owned(out)
}

/// Fit `text` into `max_cols`: unchanged when it fits, otherwise cut to
/// `max_cols - 3` columns and suffixed with `...`. Limits narrower than the
/// ellipsis fall back to a plain clip.
pub fn truncate_with_ellipsis(text: &str, max_cols: usize) -> Cow<'_, str> {
    if display_width(text) <= max_cols {
        return Cow::Borrowed(text);
    }
    if max_cols <= ELLIPSIS.len() {
        return Cow::Owned(clip_to_width(text, max_cols).into_owned());
    }
    let mut out = clip_to_width(text, max_cols - ELLIPSIS.len()).into_owned();
    out.push_str(ELLIPSIS);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_widths() {
        assert_eq!(display_width("hello"), 5);
        assert_eq!(clip_to_width("hello", 3), "hel");
        assert_eq!(clip_to_width("hello", 10), "hello");
    }

    #[test]
    fn wide_cluster_not_split_at_boundary() {
        // "a" + CJK ideograph (2 cols) + "b"
        let s = "a\u{4E16}b";
        assert_eq!(display_width(s), 4);
        assert_eq!(clip_to_width(s, 2), "a");
        assert_eq!(clip_to_width(s, 3), "a\u{4E16}");
    }

    #[test]
    fn control_chars_are_replaced() {
        assert_eq!(clip_to_width("a\x1bb", 10), "a?b");
        assert_eq!(clip_to_width("a\tb", 10), "a b");
    }

    #[test]
    fn ellipsis_truncation() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("Item ----------", 10), "Item --...");
        assert_eq!(display_width(&truncate_with_ellipsis("Item ----------", 10)), 10);
        assert_eq!(truncate_with_ellipsis("abcdef", 2), "ab");
    }
}
