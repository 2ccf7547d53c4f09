//! Panel browser runtime: layout bootstrap, event loop and resize watcher.

pub mod resize;
pub mod runtime;

use core_config::Config;
use core_model::{Direction, LayoutError, LayoutNode, Side, SplitRatio};
use core_panes::{ContentSource, Indicator, ListPreviewPane, ProcessLauncher, StatusBar};
use core_terminal::{Region, Size};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use resize::ResizeWatcher;
pub use runtime::{LoopState, QUIT_KEY, Runtime, ShutdownReason};

/// Screen layout: the list pane on top and the status bar below it, taking
/// `config.status_ratio` of the height.
pub fn build_layout(
    config: &Config,
    size: Size,
    items: Vec<String>,
    indicators: Vec<Indicator>,
    source: Box<dyn ContentSource>,
    launcher: Box<dyn ProcessLauncher>,
) -> Result<LayoutNode, LayoutError> {
    let mut root = LayoutNode::root(Region::full(size)?);
    root.split_toward(Direction::Down, config.status_ratio)?;

    let list = ListPreviewPane::new(items, source, launcher)
        .with_title(config.title.clone())
        .with_editor(config.editor.clone())
        .with_pager(config.pager.clone())
        .with_list_ratio(SplitRatio::try_from(config.list_ratio)?);
    if let Some(node) = root.node_mut(&[Side::First]) {
        node.bind(Box::new(list))?;
    }
    if let Some(node) = root.node_mut(&[Side::Second]) {
        node.bind(Box::new(StatusBar::new(indicators)))?;
    }
    Ok(root)
}

/// Directory for `mopx.log`: `dir` when given, else `mopx` under the system
/// temp directory, so the log never shows up in a listed working directory.
pub fn log_dir(dir: Option<&Path>) -> PathBuf {
    match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::temp_dir().join("mopx"),
    }
}

/// Sorted entry names of `dir`, used when no paths are given.
pub fn list_dir_items(dir: &Path) -> io::Result<Vec<String>> {
    let mut items = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        items.push(entry.file_name().to_string_lossy().into_owned());
    }
    items.sort();
    debug!(target: "runtime", dir = %dir.display(), count = items.len(), "listed");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_panes::{RecordingLauncher, StaticContentSource};

    #[test]
    fn list_over_status_bar() {
        let root = build_layout(
            &Config::default(),
            Size::new(24, 80),
            vec!["a".into()],
            Vec::new(),
            Box::new(StaticContentSource::new()),
            Box::new(RecordingLauncher::new()),
        )
        .unwrap();
        let leaves = root.leaf_regions();
        assert_eq!(leaves.len(), 2);
        // 0.2 of 24 rows goes to the status bar; the list keeps floor(24 * 0.8).
        assert_eq!((leaves[0].height(), leaves[0].width()), (19, 80));
        assert_eq!((leaves[1].origin_row(), leaves[1].height()), (19, 5));
        assert_eq!(root.node(&[Side::First]).and_then(|n| n.pane()).map(|p| p.name()), Some("list"));
        assert_eq!(root.node(&[Side::Second]).and_then(|n| n.pane()).map(|p| p.name()), Some("status"));
    }

    #[test]
    fn log_dir_defaults_under_temp_dir() {
        let dir = log_dir(None);
        assert!(dir.starts_with(std::env::temp_dir()));
        assert_ne!(dir, Path::new("."));

        let chosen = tempfile::tempdir().unwrap();
        assert_eq!(log_dir(Some(chosen.path())), chosen.path());
    }

    #[test]
    fn lists_directory_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.txt", "c"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        assert_eq!(list_dir_items(dir.path()).unwrap(), vec!["a.txt", "b.txt", "c"]);
    }
}
