//! Scrollable list with a live preview of the selected item.
//!
//! The pane splits its own region: the list on the left (`list_ratio` of the
//! width) and, while focused, a preview of the selected item on the right.
//!
//! Scroll model: `offset` is the topmost visible item and `selected` moves in
//! lock step with it, both wrapping modulo the item count. The highlighted
//! row is therefore always the first visible row. The visible window wraps
//! circularly through the list but never shows an item twice.
//!
//! Previews are loaded through the `ContentSource` on first view and cached
//! untruncated for the pane's lifetime; load failures are cached as their
//! placeholder line and never surface as render errors.

use crate::content::ContentSource;
use crate::process::{LaunchRequest, ProcessLauncher};
use core_config::{DEFAULT_EDITOR, DEFAULT_PAGER};
use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_model::{Axis, KeyOutcome, Pane, SplitRatio, partition};
use core_terminal::clip::{clip_to_width, truncate_with_ellipsis};
use core_terminal::{DisplaySurface, Region, RegionHandle, Style};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const MORE_MARKER: &str = "...(more)";
const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    until: Instant,
}

pub struct ListPreviewPane {
    items: Vec<String>,
    offset: usize,
    selected: usize,
    focused: bool,
    title: Option<String>,
    region: Option<Region>,
    list_ratio: SplitRatio,
    previews: HashMap<String, Vec<String>>,
    source: Box<dyn ContentSource>,
    launcher: Box<dyn ProcessLauncher>,
    editor: String,
    pager: String,
    notice: Option<Notice>,
}

impl ListPreviewPane {
    pub fn new(
        items: Vec<String>,
        source: Box<dyn ContentSource>,
        launcher: Box<dyn ProcessLauncher>,
    ) -> Self {
        Self {
            items,
            offset: 0,
            selected: 0,
            focused: false,
            title: None,
            region: None,
            list_ratio: SplitRatio::QUARTER,
            previews: HashMap::new(),
            source,
            launcher,
            editor: DEFAULT_EDITOR.to_string(),
            pager: DEFAULT_PAGER.to_string(),
            notice: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }

    pub fn with_pager(mut self, pager: impl Into<String>) -> Self {
        self.pager = pager.into();
        self
    }

    pub fn with_list_ratio(mut self, ratio: SplitRatio) -> Self {
        self.list_ratio = ratio;
        self
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Region last assigned by the layout tree.
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn selected_item(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }

    /// Message currently shown on the bottom border, if not yet expired.
    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| Instant::now() < n.until)
            .map(|n| n.text.as_str())
    }

    pub fn scroll_down(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        self.offset = (self.offset + 1) % len;
        self.selected = (self.selected + 1) % len;
    }

    pub fn scroll_up(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        self.offset = (self.offset + len - 1) % len;
        self.selected = (self.selected + len - 1) % len;
    }

    /// Cached preview lines for `id`, loading them on first access.
    fn preview_lines(&mut self, id: &str) -> &[String] {
        let source = &self.source;
        self.previews.entry(id.to_string()).or_insert_with(|| {
            source.load(id).unwrap_or_else(|e| {
                debug!(target: "pane.list", id, error = %e, "preview unavailable");
                vec![e.placeholder()]
            })
        })
    }

    fn launch(&mut self, program: &str) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let request = LaunchRequest::for_item(program, item);
        match self.launcher.spawn(&request) {
            Ok(out) => {
                info!(target: "pane.list", argv = ?request.argv, status = ?out.status_code, "delegated");
            }
            Err(e) => {
                warn!(target: "pane.list", argv = ?request.argv, error = %e, "delegation failed");
                self.notice = Some(Notice {
                    text: e.to_string(),
                    until: Instant::now() + NOTICE_TTL,
                });
            }
        }
    }

    fn render_list(
        &mut self,
        surface: &mut dyn DisplaySurface,
        list: &RegionHandle,
    ) -> anyhow::Result<()> {
        surface.clear_region(list)?;
        surface.draw_border(list)?;
        if let Some(title) = &self.title {
            surface.draw_text(list, 0, 1, title, Style::bold())?;
        }

        let (h, w) = (list.height() as usize, list.width() as usize);
        let inner_rows = h.saturating_sub(2);
        let inner_cols = w.saturating_sub(2);
        let len = self.items.len();
        let overflow = len > inner_rows;
        let item_rows = if overflow {
            inner_rows.saturating_sub(1)
        } else {
            len
        };

        for i in 0..item_rows {
            let item = &self.items[(self.offset + i) % len];
            let text = truncate_with_ellipsis(item, inner_cols);
            let style = match (i, self.focused) {
                (0, true) => Style::reverse(),
                (0, false) => Style::bold(),
                _ => Style::plain(),
            };
            surface.draw_text(list, i as u16 + 1, 1, &text, style)?;
        }
        if overflow && inner_rows > 0 {
            surface.draw_text(list, inner_rows as u16, 1, MORE_MARKER, Style::plain())?;
        }

        let notice = self
            .notice()
            .map(|text| truncate_with_ellipsis(text, inner_cols).into_owned());
        match notice {
            Some(text) => surface.draw_text(list, (h - 1) as u16, 1, &text, Style::bold())?,
            None => self.notice = None,
        }
        Ok(())
    }

    fn render_preview(
        &mut self,
        surface: &mut dyn DisplaySurface,
        preview: &RegionHandle,
    ) -> anyhow::Result<()> {
        surface.clear_region(preview)?;
        if !self.focused {
            return Ok(());
        }
        surface.draw_border(preview)?;
        let Some(id) = self.selected_item().map(str::to_string) else {
            return Ok(());
        };
        let rows = preview.height().saturating_sub(2) as usize;
        let cols = preview.width().saturating_sub(2) as usize;
        let lines: Vec<String> = self
            .preview_lines(&id)
            .iter()
            .take(rows)
            .map(|l| clip_to_width(l, cols).into_owned())
            .collect();
        for (i, line) in lines.iter().enumerate() {
            surface.draw_text(preview, i as u16 + 1, 1, line, Style::plain())?;
        }
        Ok(())
    }
}

impl Pane for ListPreviewPane {
    fn name(&self) -> &str {
        "list"
    }

    fn update(&mut self, region: Region) {
        debug!(target: "pane.list", %region, "update");
        self.region = Some(region);
    }

    fn render(
        &mut self,
        surface: &mut dyn DisplaySurface,
        region: &RegionHandle,
    ) -> anyhow::Result<()> {
        // Too narrow to split: the list takes everything.
        match partition(region.region(), Axis::Vertical, self.list_ratio) {
            Ok((list, preview)) => {
                let list = surface.region_handle(list)?;
                let preview = surface.region_handle(preview)?;
                self.render_list(surface, &list)?;
                self.render_preview(surface, &preview)
            }
            Err(_) => self.render_list(surface, region),
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> KeyOutcome {
        if key.mods.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) {
            return KeyOutcome::Ignored;
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(),
            KeyCode::Enter | KeyCode::Char('l') => {
                let pager = self.pager.clone();
                self.launch(&pager);
            }
            KeyCode::Char('e') => {
                let editor = self.editor.clone();
                self.launch(&editor);
            }
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Handled
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn unfocus(&mut self) {
        self.focused = false;
    }

    fn accepts_focus(&self) -> bool {
        true
    }
}
