//! App state - pure data structure with no I/O logic

use crate::config::Config;
use crate::error::TransportError;
use crate::import::Format;
use crate::messages::ui_events::{InputMode, Panel};
use crate::messages::RenderState;
use crate::models::{Request, Response};
use crate::tree::BodyView;

/// Result of the latest replay
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Response(Response),
    Failed(TransportError),
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One-line message shown in the status bar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

/// Main application state - pure data, no I/O
pub struct AppState {
    pub config: Config,

    // Imported request, edited in place
    pub request: Request,
    pub imported_format: Option<Format>,
    pub warnings: Vec<String>,
    pub cursor_position: usize,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,

    // Headers panel
    pub selected_header: usize,
    pub header_buffer: Option<String>,

    // Replay
    pub outcome: Option<Outcome>,
    pub body_view: Option<BodyView>,
    pub selected_line: usize,
    pub response_scroll: u16,
    pub show_response_headers: bool,
    pub is_loading: bool,
    pub next_request_id: u64,
    pub pending_request_id: Option<u64>,

    // Popups
    pub show_help: bool,
    pub show_import: bool,
    pub import_buffer: String,

    pub status: Option<StatusMessage>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl AppState {
    /// A fresh session opens on the import popup: nothing can be edited
    /// or replayed before a capture is pasted.
    pub fn new(config: Config) -> Self {
        AppState {
            config,
            request: Request::default(),
            imported_format: None,
            warnings: Vec::new(),
            cursor_position: 0,
            active_panel: Panel::Url,
            input_mode: InputMode::Normal,
            selected_header: 0,
            header_buffer: None,
            outcome: None,
            body_view: None,
            selected_line: 0,
            response_scroll: 0,
            show_response_headers: false,
            is_loading: false,
            next_request_id: 1,
            pending_request_id: None,
            show_help: false,
            show_import: true,
            import_buffer: String::new(),
            status: None,
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
        });
    }

    /// Get the current input field content
    pub fn current_input(&self) -> &str {
        match self.active_panel {
            Panel::Url => &self.request.url,
            Panel::Body => &self.request.body,
            Panel::Headers => self.header_buffer.as_deref().unwrap_or(""),
            Panel::Response => "",
        }
    }

    /// Get mutable reference to current input field
    pub fn current_input_mut(&mut self) -> Option<&mut String> {
        match self.active_panel {
            Panel::Url => Some(&mut self.request.url),
            Panel::Body => Some(&mut self.request.body),
            Panel::Headers => self.header_buffer.as_mut(),
            Panel::Response => None,
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let tree_lines = match &self.body_view {
            Some(BodyView::Tree(tree)) => Some(tree.lines()),
            _ => None,
        };

        RenderState {
            method: self.request.method.clone(),
            url: self.request.url.clone(),
            body: self.request.body.clone(),
            headers: self.request.headers.clone(),
            imported_format: self.imported_format,
            warnings: self.warnings.clone(),
            active_panel: self.active_panel,
            input_mode: self.input_mode,
            cursor_position: self.cursor_position,
            selected_header: self.selected_header,
            header_buffer: self.header_buffer.clone(),
            outcome: self.outcome.clone(),
            tree_lines,
            selected_line: self.selected_line,
            response_scroll: self.response_scroll,
            show_response_headers: self.show_response_headers,
            is_loading: self.is_loading,
            show_help: self.show_help,
            show_import: self.show_import,
            import_buffer: self.import_buffer.clone(),
            status: self.status.clone(),
        }
    }
}
