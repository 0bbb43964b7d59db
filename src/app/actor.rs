//! App actor - message loop processing UI events and network responses

use tokio::sync::mpsc;

use crate::app::state::{AppState, StatusLevel};
use crate::messages::ui_events::InputMode;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        state: AppState,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state,
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    self.state.handle_response(response);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    fn send(&self, cmd: Option<NetworkCommand>) {
        if let Some(cmd) = cmd {
            let _ = self.network_tx.send(cmd);
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Panel navigation
            UiEvent::NextPanel => self.state.next_panel(),
            UiEvent::PrevPanel => self.state.prev_panel(),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Newline => self.state.enter_newline(),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),
            UiEvent::Paste(text) => self.state.paste(&text),

            // Request actions
            UiEvent::CycleMethod => self.state.cycle_method(),
            UiEvent::SendRequest => {
                // Stop editing first if in URL panel
                if self.state.input_mode == InputMode::Editing {
                    self.state.stop_editing();
                }
                let cmd = self.state.prepare_request();
                self.send(cmd);
            }
            UiEvent::CancelRequest => {
                let cmd = self.state.cancel_request();
                self.send(cmd);
            }
            UiEvent::CopyRequest => match self.state.export_request() {
                Some((format, text)) => self.copy_to_clipboard(&text, &format!("Copied request as {}", format)),
                None => self.state.set_status("Nothing to copy yet", StatusLevel::Warning),
            },

            // Headers
            UiEvent::NextHeader => self.state.next_header(),
            UiEvent::PrevHeader => self.state.prev_header(),
            UiEvent::ToggleHeader => self.state.toggle_header(),
            UiEvent::AddHeader => self.state.add_header(),
            UiEvent::DeleteHeader => self.state.delete_header(),

            // Import popup
            UiEvent::ShowImport => self.state.open_import(),
            UiEvent::ImportChar(c) => self.state.import_char(c),
            UiEvent::ImportNewline => self.state.import_char('\n'),
            UiEvent::ImportBackspace => self.state.import_backspace(),
            UiEvent::ImportFromClipboard => match paste_from_clipboard() {
                Some(text) => self.state.paste(&text),
                None => self.state.set_status("Clipboard is empty or unavailable", StatusLevel::Warning),
            },
            UiEvent::SubmitImport => {
                let cmd = self.state.submit_import();
                self.send(cmd);
            }
            UiEvent::CancelImport => self.state.cancel_import(),

            // Response tree
            UiEvent::PrevLine => self.state.select_prev_line(),
            UiEvent::NextLine => self.state.select_next_line(),
            UiEvent::ToggleRow => self.state.toggle_selected_row(),
            UiEvent::ExpandAll => self.state.set_all_rows(true),
            UiEvent::CollapseAll => self.state.set_all_rows(false),
            UiEvent::CopyRow => match self.state.copy_selected() {
                Some(text) => self.copy_to_clipboard(&text, "Copied value to clipboard"),
                None => self.state.set_status("No JSON value under the cursor", StatusLevel::Warning),
            },
            UiEvent::CopyBody => match self.state.copy_body() {
                Some(text) => self.copy_to_clipboard(&text, "Copied response body to clipboard"),
                None => self.state.set_status("No response body to copy", StatusLevel::Warning),
            },
            UiEvent::ToggleResponseHeaders => self.state.toggle_response_headers(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }

    /// Copy content to clipboard
    fn copy_to_clipboard(&mut self, content: &str, done: &str) {
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(content.to_string()) {
                    tracing::warn!(error = %e, "Clipboard write failed");
                    self.state.set_status(format!("Failed to copy: {}", e), StatusLevel::Error);
                } else {
                    self.state.set_status(done, StatusLevel::Success);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Clipboard unavailable");
                self.state
                    .set_status(format!("Clipboard not available: {}", e), StatusLevel::Error);
            }
        }
    }
}

/// Paste from clipboard, returning the text if successful
fn paste_from_clipboard() -> Option<String> {
    arboard::Clipboard::new()
        .ok()
        .and_then(|mut cb| cb.get_text().ok())
}
