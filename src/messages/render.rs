//! Render state - data structure sent from App layer to UI for rendering

use crate::app::state::{Outcome, StatusMessage};
use crate::import::Format;
use crate::messages::ui_events::{InputMode, Panel};
use crate::models::{Header, HttpMethod};
use crate::tree::TreeLine;

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Request data
    pub method: HttpMethod,
    pub url: String,
    pub body: String,
    pub headers: Vec<Header>,
    pub imported_format: Option<Format>,
    pub warnings: Vec<String>,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,
    pub cursor_position: usize,

    // Headers panel
    pub selected_header: usize,
    /// `Key: Value` line while a header is being edited
    pub header_buffer: Option<String>,

    // Response
    pub outcome: Option<Outcome>,
    /// Visible tree lines; `None` when the body is shown as text
    pub tree_lines: Option<Vec<TreeLine>>,
    pub selected_line: usize,
    pub response_scroll: u16,
    pub show_response_headers: bool,
    pub is_loading: bool,

    // Popups
    pub show_help: bool,
    pub show_import: bool,
    pub import_buffer: String,

    pub status: Option<StatusMessage>,
}
