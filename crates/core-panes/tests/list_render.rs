//! Rendering and key handling of the list/preview pane against a headless surface.

use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_model::{KeyOutcome, Pane};
use core_panes::{
    FsContentSource, LaunchRequest, ListPreviewPane, MORE_MARKER, RecordingLauncher,
    StaticContentSource,
};
use core_terminal::{DisplaySurface, HeadlessSurface, Size};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::time::Duration;

fn render(pane: &mut ListPreviewPane, rows: u16, cols: u16) -> HeadlessSurface {
    let mut surface = HeadlessSurface::new(Size::new(rows, cols));
    let handle = surface.make_region(rows, cols, 0, 0).unwrap();
    pane.update(handle.region());
    pane.render(&mut surface, &handle).unwrap();
    surface
}

/// Inner text of list row `row` (between the side borders).
fn list_row(surface: &HeadlessSurface, row: u16, list_width: usize) -> String {
    surface
        .row_text(row)
        .chars()
        .skip(1)
        .take(list_width - 2)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn items(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("i{i}")).collect()
}

fn list(items: Vec<String>) -> ListPreviewPane {
    ListPreviewPane::new(
        items,
        Box::new(StaticContentSource::new()),
        Box::new(RecordingLauncher::new()),
    )
}

#[test]
fn short_list_draws_each_item_once_with_title() {
    let mut p = list(vec!["a".into(), "b".into(), "c".into()]).with_title("Files");
    p.scroll_down();
    let s = render(&mut p, 8, 40);
    // 40 cols: list gets 10, preview 30.
    assert_eq!(s.find("Files"), Some((0, 1)));
    assert!(s.style_at(0, 1).unwrap().is_bold());
    let rows: Vec<String> = (1..7).map(|r| list_row(&s, r, 10)).collect();
    assert_eq!(rows, vec!["b", "c", "a", "", "", ""]);
    assert!(!s.contains(MORE_MARKER));
}

#[test]
fn highlight_is_first_visible_row_and_depends_on_focus() {
    let mut p = list(items(3));
    let s = render(&mut p, 6, 40);
    let style = s.style_at(1, 1).unwrap();
    assert!(style.is_bold() && !style.is_reverse());
    assert!(!s.style_at(2, 1).unwrap().is_bold());

    p.focus();
    let s = render(&mut p, 6, 40);
    assert!(s.style_at(1, 1).unwrap().is_reverse());
}

#[test]
fn long_items_are_truncated_with_ellipsis() {
    let mut p = list(vec![format!("Item {}", "-".repeat(20))]);
    // 80 cols: list is 20 wide, 18 inner, so 15 columns of text plus "...".
    let s = render(&mut p, 5, 80);
    assert_eq!(list_row(&s, 1, 20), "Item ----------...");
}

#[test]
fn window_wraps_but_never_repeats() {
    let mut p = list(items(4));
    for _ in 0..3 {
        p.scroll_down();
    }
    // 6 rows: 4 inner rows hold exactly the 4 items.
    let s = render(&mut p, 6, 40);
    let rows: Vec<String> = (1..5).map(|r| list_row(&s, r, 10)).collect();
    assert_eq!(rows, vec!["i3", "i0", "i1", "i2"]);
}

proptest! {
    #[test]
    fn overflowing_list_shows_one_marker(len in 1usize..80, rows in 3u16..30, down in 0usize..100) {
        let mut p = list(items(len));
        for _ in 0..down {
            p.scroll_down();
        }
        // 80 cols: the list is 20 wide, enough for the marker.
        let s = render(&mut p, rows, 80);
        let inner = (rows - 2) as usize;
        let texts: Vec<String> = (1..rows - 1).map(|r| list_row(&s, r, 20)).collect();
        let markers = texts.iter().filter(|t| t.as_str() == MORE_MARKER).count();
        let item_rows = texts.iter().filter(|t| t.starts_with('i')).count();
        if len > inner {
            prop_assert_eq!(markers, 1);
            prop_assert_eq!(texts.last().map(String::as_str), Some(MORE_MARKER));
            prop_assert_eq!(item_rows, inner - 1);
        } else {
            prop_assert_eq!(markers, 0);
            prop_assert_eq!(item_rows, len);
        }
        prop_assert!(item_rows <= inner);
    }
}

#[test]
fn focused_pane_previews_selected_item() {
    let source = StaticContentSource::new()
        .with("a", "alpha line\nsecond")
        .with("b", "beta");
    let mut p = ListPreviewPane::new(
        vec!["a".into(), "b".into()],
        Box::new(source),
        Box::new(RecordingLauncher::new()),
    );
    p.focus();
    let s = render(&mut p, 6, 40);
    assert_eq!(s.find("alpha line"), Some((1, 11)));
    assert_eq!(s.find("second"), Some((2, 11)));

    p.scroll_down();
    let s = render(&mut p, 6, 40);
    assert_eq!(s.find("beta"), Some((1, 11)));
    assert!(!s.contains("alpha"));

    p.unfocus();
    let s = render(&mut p, 6, 40);
    assert!(!s.contains("beta"));
    // Unfocused preview area is blank, border included.
    assert_eq!(s.row_text(0).chars().nth(10), Some(' '));
}

#[test]
fn preview_is_clipped_to_its_region() {
    let long = "x".repeat(100);
    let text = (0..20).map(|i| format!("{i}{long}")).collect::<Vec<_>>().join("\n");
    let mut p = ListPreviewPane::new(
        vec!["f".into()],
        Box::new(StaticContentSource::new().with("f", &text)),
        Box::new(RecordingLauncher::new()),
    );
    p.focus();
    let s = render(&mut p, 5, 40);
    // 3 inner preview rows, 28 inner columns, then the right border.
    assert_eq!(s.find("0xx"), Some((1, 11)));
    assert_eq!(s.find("2xx"), Some((3, 11)));
    assert!(!s.contains("3xx"));
    assert!(s.row_text(1).ends_with("x│"));
}

#[test]
fn missing_file_renders_placeholder_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = ListPreviewPane::new(
        vec!["nope.txt".into()],
        Box::new(FsContentSource::with_base(dir.path())),
        Box::new(RecordingLauncher::new()),
    );
    p.focus();
    let s = render(&mut p, 5, 80);
    assert_eq!(s.find("File not found: nope.txt"), Some((1, 21)));
}

#[test]
fn preview_is_loaded_once_and_cached() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "first version").unwrap();
    let mut p = ListPreviewPane::new(
        vec!["notes.txt".into()],
        Box::new(FsContentSource::with_base(dir.path())),
        Box::new(RecordingLauncher::new()),
    );
    p.focus();
    assert!(render(&mut p, 5, 80).contains("first version"));
    std::fs::write(&path, "second version").unwrap();
    assert!(render(&mut p, 5, 80).contains("first version"));
}

#[test]
fn navigation_and_delegation_keys() {
    let launcher = RecordingLauncher::new();
    let mut p = ListPreviewPane::new(
        vec!["a".into(), "b".into()],
        Box::new(StaticContentSource::new()),
        Box::new(launcher.clone()),
    )
    .with_editor("vim")
    .with_pager("most");

    assert_eq!(p.handle_key(&KeyEvent::char('j')), KeyOutcome::Handled);
    assert_eq!(p.selected_item(), Some("b"));
    assert_eq!(p.handle_key(&KeyEvent::plain(KeyCode::Up)), KeyOutcome::Handled);
    assert_eq!(p.handle_key(&KeyEvent::plain(KeyCode::Down)), KeyOutcome::Handled);
    assert_eq!(p.handle_key(&KeyEvent::plain(KeyCode::Enter)), KeyOutcome::Handled);
    assert_eq!(p.handle_key(&KeyEvent::char('e')), KeyOutcome::Handled);
    assert_eq!(p.handle_key(&KeyEvent::char('x')), KeyOutcome::Ignored);
    assert_eq!(
        p.handle_key(&KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CTRL)),
        KeyOutcome::Ignored
    );
    assert_eq!(p.selected_item(), Some("b"));
    assert_eq!(
        launcher.calls(),
        vec![
            LaunchRequest::for_item("most", "b"),
            LaunchRequest::for_item("vim", "b"),
        ]
    );
}

#[test]
fn unconfigured_pane_delegates_to_config_defaults() {
    let launcher = RecordingLauncher::new();
    let mut p = ListPreviewPane::new(
        vec!["a".into()],
        Box::new(StaticContentSource::new()),
        Box::new(launcher.clone()),
    );
    p.handle_key(&KeyEvent::plain(KeyCode::Enter));
    p.handle_key(&KeyEvent::char('e'));
    assert_eq!(
        launcher.calls(),
        vec![
            LaunchRequest::for_item(core_config::DEFAULT_PAGER, "a"),
            LaunchRequest::for_item(core_config::DEFAULT_EDITOR, "a"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn spawn_failure_shows_expiring_notice() {
    let mut p = ListPreviewPane::new(
        vec!["a".into()],
        Box::new(StaticContentSource::new()),
        Box::new(RecordingLauncher::failing()),
    );
    assert_eq!(p.handle_key(&KeyEvent::char('l')), KeyOutcome::Handled);
    let notice = p.notice().map(str::to_string).unwrap();
    assert!(notice.starts_with("failed to launch less"), "{notice}");

    let s = render(&mut p, 6, 120);
    assert_eq!(s.find("failed to"), Some((5, 1)));

    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(p.notice(), None);
    let s = render(&mut p, 6, 120);
    assert!(!s.contains("failed to"));
    assert!(s.row_text(5).starts_with("└──"));
}
