//! Pane implementations hosted by the layout tree.
//!
//! * `ListPreviewPane`: scrollable, selectable list with a preview of the
//!   selected item and delegation to a pager or editor.
//! * `StatusBar`: read-only indicators in a flowed grid.
//!
//! Both talk to the outside world only through the collaborator traits in
//! `content` and `process`, so tests can swap in in-memory versions.

pub mod content;
pub mod list_preview;
pub mod process;
pub mod status_bar;

pub use content::{
    ContentLoadError, ContentSource, FsContentSource, PREVIEW_LINE_LIMIT, StaticContentSource,
};
pub use list_preview::{ListPreviewPane, MORE_MARKER};
pub use process::{
    ExternalProcessError, LaunchOutput, LaunchRequest, ProcessLauncher, RecordingLauncher,
    SystemLauncher,
};
pub use status_bar::{
    HIDDEN_MARKER, Indicator, IndicatorError, IndicatorParseError, IndicatorValue, StatusBar,
    StatusRenderReport,
};
