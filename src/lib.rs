//! # recapture
//!
//! Replay HTTP requests copied out of a browser's network panel.
//!
//! ## Features
//! - Import a `curl` command, a `fetch(...)` call or a HAR capture
//! - Edit method, URL, headers and body before sending
//! - Replay with timing; later replays supersede earlier ones
//! - Collapsible JSON response tree with copy to clipboard
//! - Export the edited request back to curl, fetch or HAR
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime)

pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod import;
pub mod messages;
pub mod models;
pub mod network;
pub mod tree;
pub mod ui;

// Re-export commonly used types
pub use app::{AppActor, AppState};
pub use config::Config;
pub use error::{ImportError, TransportError};
pub use import::{export, import, Format, Imported, ParseOutcome};
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{Header, HttpMethod, Request, Response};
pub use network::{execute_request, NetworkActor};
pub use tree::{render, BodyView, JsonNode, TreeNode, TreeRow};
