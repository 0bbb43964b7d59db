//! Command handlers - business logic for processing UI events

use crate::app::state::{AppState, Outcome, StatusLevel};
use crate::import::{self, Format};
use crate::messages::ui_events::{InputMode, Panel};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::Header;
use crate::tree::{BodyView, TreeNode};

impl AppState {
    // ========================
    // Navigation
    // ========================

    pub fn next_panel(&mut self) {
        self.active_panel = self.active_panel.next();
    }

    pub fn prev_panel(&mut self) {
        self.active_panel = self.active_panel.prev();
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        match self.active_panel {
            Panel::Url | Panel::Body => {}
            Panel::Headers => {
                let Some(header) = self.request.headers.get(self.selected_header) else {
                    return;
                };
                self.header_buffer = Some(format!("{}: {}", header.key, header.value));
            }
            Panel::Response => return,
        }
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.current_input().len();
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
        if let Some(line) = self.header_buffer.take() {
            self.commit_header(&line);
        }
    }

    fn commit_header(&mut self, line: &str) {
        let Some(parsed) = Header::parse_line(line) else {
            self.set_status("Header must look like 'Key: Value'", StatusLevel::Error);
            return;
        };
        if let Some(header) = self.request.headers.get_mut(self.selected_header) {
            header.key = parsed.key;
            header.value = parsed.value;
        }
    }

    pub fn move_cursor_left(&mut self) {
        let input = self.current_input();
        if self.cursor_position > 0 {
            let new_pos = input[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.cursor_position = new_pos;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let input = self.current_input();
        if self.cursor_position < input.len() {
            let new_pos = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
            self.cursor_position = new_pos;
        }
    }

    pub fn enter_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.insert_text(c.encode_utf8(&mut buf));
    }

    /// Newlines only make sense in the body
    pub fn enter_newline(&mut self) {
        if self.active_panel == Panel::Body {
            self.enter_char('\n');
        }
    }

    fn insert_text(&mut self, text: &str) {
        let cursor_pos = self.cursor_position;
        let inserted = match self.current_input_mut() {
            Some(input) if cursor_pos <= input.len() => {
                input.insert_str(cursor_pos, text);
                true
            }
            _ => false,
        };
        if inserted {
            self.cursor_position = cursor_pos + text.len();
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let cursor_pos = self.cursor_position;
        let removed_at = self.current_input_mut().and_then(|input| {
            let prev_pos = input[..cursor_pos].char_indices().last().map(|(i, _)| i)?;
            input.remove(prev_pos);
            Some(prev_pos)
        });
        if let Some(prev_pos) = removed_at {
            self.cursor_position = prev_pos;
        }
    }

    /// Route pasted text: the import popup, then the field being edited.
    /// A paste anywhere else opens the import popup with it.
    pub fn paste(&mut self, text: &str) {
        if self.show_import {
            self.import_buffer.push_str(text);
        } else if self.input_mode == InputMode::Editing {
            if self.active_panel == Panel::Body {
                self.insert_text(text);
            } else {
                let single_line: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
                self.insert_text(&single_line);
            }
        } else {
            self.import_buffer = text.to_string();
            self.show_import = true;
        }
    }

    // ========================
    // HTTP Method
    // ========================

    pub fn cycle_method(&mut self) {
        self.request.method = self.request.method.next();
    }

    // ========================
    // Headers
    // ========================

    pub fn next_header(&mut self) {
        if !self.request.headers.is_empty() {
            self.selected_header = (self.selected_header + 1) % self.request.headers.len();
        }
    }

    pub fn prev_header(&mut self) {
        if !self.request.headers.is_empty() {
            self.selected_header = self
                .selected_header
                .checked_sub(1)
                .unwrap_or(self.request.headers.len() - 1);
        }
    }

    pub fn toggle_header(&mut self) {
        if let Some(header) = self.request.headers.get_mut(self.selected_header) {
            header.enabled = !header.enabled;
        }
    }

    pub fn add_header(&mut self) {
        self.request.headers.push(Header::new("X-Custom", "value"));
        self.selected_header = self.request.headers.len() - 1;
    }

    pub fn delete_header(&mut self) {
        if self.selected_header < self.request.headers.len() {
            self.request.headers.remove(self.selected_header);
            if self.selected_header > 0 && self.selected_header >= self.request.headers.len() {
                self.selected_header -= 1;
            }
        }
    }

    // ========================
    // Import / export
    // ========================

    pub fn open_import(&mut self) {
        self.show_import = true;
    }

    pub fn import_char(&mut self, c: char) {
        self.import_buffer.push(c);
    }

    pub fn import_backspace(&mut self) {
        self.import_buffer.pop();
    }

    pub fn cancel_import(&mut self) {
        self.import_buffer.clear();
        self.show_import = false;
    }

    /// Import whatever sits in the popup. On failure the popup stays open
    /// with the text so it can be fixed. Returns a cancel command for a
    /// replay of the previous request still in flight.
    pub fn submit_import(&mut self) -> Option<NetworkCommand> {
        let pending = self.pending_request_id;
        let input = self.import_buffer.clone();
        if !self.import_input(&input) {
            return None;
        }
        self.import_buffer.clear();
        self.show_import = false;
        pending.map(NetworkCommand::CancelRequest)
    }

    /// Pre-fill the popup (e.g. from a file) and import it right away
    pub fn preload(&mut self, input: &str) {
        self.import_buffer = input.to_string();
        self.show_import = true;
        if self.import_input(input) {
            self.import_buffer.clear();
            self.show_import = false;
        }
    }

    /// Run the import pipeline and replace the session's request.
    /// Returns whether the input was imported.
    pub fn import_input(&mut self, input: &str) -> bool {
        let imported = match import::import(input) {
            Ok(imported) => imported,
            Err(e) => {
                self.set_status(e.to_string(), StatusLevel::Error);
                return false;
            }
        };

        let mut request = imported.request;
        if imported.format == Format::Fetch && self.config.pretty_fetch_body {
            if let Some(pretty) = serde_json::from_str::<serde_json::Value>(&request.body)
                .ok()
                .and_then(|v| serde_json::to_string_pretty(&v).ok())
            {
                request.body = pretty;
            }
        }

        self.cursor_position = request.url.len();
        self.request = request;
        self.imported_format = Some(imported.format);
        self.warnings = imported.warnings;
        self.active_panel = Panel::Url;
        self.input_mode = InputMode::Normal;
        self.selected_header = 0;
        self.header_buffer = None;
        self.outcome = None;
        self.body_view = None;
        self.selected_line = 0;
        self.response_scroll = 0;
        self.is_loading = false;
        self.pending_request_id = None;

        if self.warnings.is_empty() {
            self.set_status(format!("Imported {} request", imported.format), StatusLevel::Success);
        } else {
            self.set_status(
                format!("Imported {} request with {} warning(s)", imported.format, self.warnings.len()),
                StatusLevel::Warning,
            );
        }
        true
    }

    /// The edited request in the notation it was imported from (curl when
    /// nothing was imported yet)
    pub fn export_request(&self) -> Option<(Format, String)> {
        if self.request.url.trim().is_empty() {
            return None;
        }
        let format = self.imported_format.unwrap_or(Format::Curl);
        Some((format, import::export(&self.request, format)))
    }

    // ========================
    // Request sending
    // ========================

    /// Start a replay. A replay still in flight is superseded: its
    /// response will no longer match `pending_request_id`.
    pub fn prepare_request(&mut self) -> Option<NetworkCommand> {
        if self.request.url.trim().is_empty() {
            self.set_status("Nothing to send: import a request first (i)", StatusLevel::Warning);
            return None;
        }

        let id = self.next_id();
        if let Some(previous) = self.pending_request_id {
            tracing::debug!(previous, id, "Superseding in-flight request");
        }
        self.pending_request_id = Some(id);
        self.is_loading = true;
        self.set_status(
            format!("Sending {} {}", self.request.method, self.request.url),
            StatusLevel::Info,
        );

        Some(NetworkCommand::ExecuteRequest {
            id,
            request: self.request.clone(),
        })
    }

    /// Cancel the current pending request
    pub fn cancel_request(&mut self) -> Option<NetworkCommand> {
        self.pending_request_id.map(NetworkCommand::CancelRequest)
    }

    // ========================
    // Response handling
    // ========================

    pub fn handle_response(&mut self, response: NetworkResponse) {
        // Responses to superseded replays are dropped
        let response_id = response.id();
        if self.pending_request_id != Some(response_id) {
            tracing::debug!(id = response_id, "Ignoring response for superseded request");
            return;
        }

        match response {
            NetworkResponse::Completed { response, .. } => {
                let view = BodyView::from_body(&response.body_text);
                let level = if response.is_success() {
                    StatusLevel::Success
                } else {
                    StatusLevel::Warning
                };
                let mut text = format!(
                    "{} {} in {}ms",
                    response.status, response.status_text, response.duration_ms
                );
                let claims_json = response
                    .content_type()
                    .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
                if claims_json && matches!(view, BodyView::Text(_)) {
                    text.push_str(" (body is not valid JSON; shown as text)");
                }
                self.set_status(text, level);
                self.body_view = Some(view);
                self.outcome = Some(Outcome::Response(response));
            }
            NetworkResponse::Failed { error, .. } => {
                self.set_status(error.to_string(), StatusLevel::Error);
                self.body_view = None;
                self.outcome = Some(Outcome::Failed(error));
            }
            NetworkResponse::Cancelled { .. } => {
                self.set_status("Request cancelled", StatusLevel::Info);
                self.body_view = None;
                self.outcome = Some(Outcome::Cancelled);
            }
        }

        self.is_loading = false;
        self.pending_request_id = None;
        self.selected_line = 0;
        self.response_scroll = 0;
    }

    // ========================
    // Response tree
    // ========================

    fn tree(&self) -> Option<&TreeNode> {
        match &self.body_view {
            Some(BodyView::Tree(tree)) => Some(tree),
            _ => None,
        }
    }

    fn tree_mut(&mut self) -> Option<&mut TreeNode> {
        match &mut self.body_view {
            Some(BodyView::Tree(tree)) => Some(tree),
            _ => None,
        }
    }

    /// Row under the cursor; `None` on the root value's own lines
    fn selected_row_path(&self) -> Option<Vec<usize>> {
        self.tree()?.lines().get(self.selected_line)?.row.clone()
    }

    /// Move the cursor onto the head line of `path`, or of its closest
    /// visible ancestor
    fn reselect(&mut self, path: &[usize]) {
        let Some(lines) = self.tree().map(TreeNode::lines) else {
            return;
        };
        for len in (1..=path.len()).rev() {
            let prefix = &path[..len];
            if let Some(i) = lines
                .iter()
                .position(|l| l.is_row_head() && l.row.as_deref() == Some(prefix))
            {
                self.selected_line = i;
                return;
            }
        }
        self.selected_line = self.selected_line.min(lines.len().saturating_sub(1));
    }

    pub fn select_prev_line(&mut self) {
        if self.tree().is_some() {
            self.selected_line = self.selected_line.saturating_sub(1);
        } else {
            self.response_scroll = self.response_scroll.saturating_sub(1);
        }
    }

    pub fn select_next_line(&mut self) {
        match self.tree().map(|t| t.lines().len()) {
            Some(count) => {
                if self.selected_line + 1 < count {
                    self.selected_line += 1;
                }
            }
            None => self.response_scroll = self.response_scroll.saturating_add(1),
        }
    }

    pub fn toggle_selected_row(&mut self) {
        let Some(path) = self.selected_row_path() else {
            return;
        };
        let toggled = self.tree_mut().is_some_and(|tree| tree.toggle(&path));
        if toggled {
            self.reselect(&path);
        }
    }

    pub fn set_all_rows(&mut self, expanded: bool) {
        let path = self.selected_row_path();
        if let Some(tree) = self.tree_mut() {
            tree.set_all(expanded);
        }
        match path {
            Some(path) => self.reselect(&path),
            None => self.reselect(&[]),
        }
    }

    /// Pretty JSON of the selected row's value (the whole body on the
    /// root lines)
    pub fn copy_selected(&self) -> Option<String> {
        let tree = self.tree()?;
        match self.selected_row_path() {
            Some(path) => tree.row(&path).map(|row| row.copy_text()),
            None => Some(tree.copy_text()),
        }
    }

    pub fn copy_body(&self) -> Option<String> {
        match self.body_view.as_ref()? {
            BodyView::Tree(tree) => Some(tree.copy_text()),
            BodyView::Text(text) => Some(text.clone()),
        }
    }

    pub fn toggle_response_headers(&mut self) {
        self.show_response_headers = !self.show_response_headers;
    }

    // ========================
    // Help popup
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::TransportError;
    use crate::models::{HttpMethod, Response};

    const CURL: &str = "curl 'https://api.example.com/users' -H 'Accept: application/json' -H 'X-Trace: 1'";

    fn imported_state() -> AppState {
        let mut state = AppState::default();
        state.preload(CURL);
        state
    }

    fn json_response(body: &str) -> Response {
        Response {
            status: 200,
            status_text: "OK".into(),
            headers: vec![("content-type".into(), "application/json".into())],
            body_text: body.into(),
            duration_ms: 12,
        }
    }

    fn replay(state: &mut AppState, body: &str) {
        let Some(NetworkCommand::ExecuteRequest { id, .. }) = state.prepare_request() else {
            panic!("expected a request");
        };
        state.handle_response(NetworkResponse::Completed {
            id,
            response: json_response(body),
        });
    }

    #[test]
    fn test_preload_imports_and_closes_popup() {
        let state = imported_state();
        assert!(!state.show_import);
        assert_eq!(state.imported_format, Some(Format::Curl));
        assert_eq!(state.request.url, "https://api.example.com/users");
        assert_eq!(state.request.headers.len(), 2);
        assert_eq!(state.status.as_ref().map(|s| s.level), Some(StatusLevel::Success));
    }

    #[test]
    fn test_failed_import_keeps_popup_open() {
        let mut state = AppState::default();
        state.paste("hello world");
        assert!(state.show_import);
        assert!(state.submit_import().is_none());
        assert!(state.show_import);
        assert_eq!(state.import_buffer, "hello world");
        let status = state.status.clone().unwrap();
        assert_eq!(status.level, StatusLevel::Error);
        assert!(status.text.contains("Unrecognized"));
    }

    #[test]
    fn test_latest_replay_wins() {
        let mut state = imported_state();
        let Some(NetworkCommand::ExecuteRequest { id: first, .. }) = state.prepare_request() else {
            panic!("expected a request");
        };
        let Some(NetworkCommand::ExecuteRequest { id: second, .. }) = state.prepare_request() else {
            panic!("expected a request");
        };
        assert_ne!(first, second);

        state.handle_response(NetworkResponse::Completed {
            id: first,
            response: json_response(r#"{"stale":true}"#),
        });
        assert!(state.outcome.is_none());
        assert!(state.is_loading);

        state.handle_response(NetworkResponse::Cancelled { id: first });
        assert!(state.outcome.is_none());

        state.handle_response(NetworkResponse::Completed {
            id: second,
            response: json_response(r#"{"fresh":true}"#),
        });
        assert!(!state.is_loading);
        assert_eq!(state.copy_body().unwrap(), "{\n  \"fresh\": true\n}");
    }

    #[test]
    fn test_transport_failure_is_not_a_response() {
        let mut state = imported_state();
        let Some(NetworkCommand::ExecuteRequest { id, .. }) = state.prepare_request() else {
            panic!("expected a request");
        };
        state.handle_response(NetworkResponse::Failed {
            id,
            error: TransportError::Timeout { time_ms: 30_000 },
        });
        assert!(matches!(state.outcome, Some(Outcome::Failed(TransportError::Timeout { .. }))));
        assert!(state.body_view.is_none());
        assert_eq!(state.status.unwrap().level, StatusLevel::Error);
    }

    #[test]
    fn test_send_without_request_is_refused() {
        let mut state = AppState::default();
        assert!(state.prepare_request().is_none());
        assert_eq!(state.status.unwrap().level, StatusLevel::Warning);
    }

    #[test]
    fn test_tree_toggle_and_copy() {
        let mut state = imported_state();
        replay(&mut state, r#"{"user":{"id":1,"tags":["a","b"]},"ok":true}"#);

        // Line 0 is "{", line 1 is the "user" row
        state.select_next_line();
        assert_eq!(state.copy_selected().unwrap(), "{\n  \"id\": 1,\n  \"tags\": [\n    \"a\",\n    \"b\"\n  ]\n}");

        let before = state.tree().unwrap().lines().len();
        state.toggle_selected_row();
        let lines = state.tree().unwrap().lines();
        assert!(lines.len() < before);
        assert_eq!(lines[state.selected_line].text(), "  \"user\": {…},");
        // Collapsing never changes what gets copied
        assert!(state.copy_selected().unwrap().contains("\"tags\""));

        state.toggle_selected_row();
        assert_eq!(state.tree().unwrap().lines().len(), before);
    }

    #[test]
    fn test_collapse_all_keeps_cursor_on_ancestor() {
        let mut state = imported_state();
        replay(&mut state, r#"{"a":{"b":{"c":1}},"d":2}"#);
        // "{", "a": {, "b": {, "c": 1
        for _ in 0..3 {
            state.select_next_line();
        }
        assert_eq!(state.copy_selected().unwrap(), "1");

        state.set_all_rows(false);
        let lines = state.tree().unwrap().lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[state.selected_line].text(), "  \"a\": {…},");

        state.set_all_rows(true);
        assert_eq!(state.tree().unwrap().lines().len(), 8);
        assert_eq!(state.copy_selected().unwrap(), "1");
    }

    #[test]
    fn test_non_json_body_scrolls_as_text() {
        let mut state = imported_state();
        replay(&mut state, "<html>oops</html>");
        assert!(matches!(state.body_view, Some(BodyView::Text(_))));
        assert!(state.copy_selected().is_none());
        assert_eq!(state.copy_body().unwrap(), "<html>oops</html>");
        assert!(state.status.as_ref().unwrap().text.contains("not valid JSON"));

        state.select_next_line();
        assert_eq!(state.response_scroll, 1);
        assert_eq!(state.selected_line, 0);
    }

    #[test]
    fn test_header_edit_commits_on_stop() {
        let mut state = imported_state();
        state.active_panel = Panel::Headers;
        state.next_header();
        state.start_editing();
        assert_eq!(state.current_input(), "X-Trace: 1");

        state.delete_char();
        state.enter_char('2');
        state.stop_editing();
        assert_eq!(state.request.headers[1], Header::new("X-Trace", "2"));

        state.start_editing();
        state.header_buffer = Some("no colon".into());
        state.stop_editing();
        assert_eq!(state.request.headers[1], Header::new("X-Trace", "2"));
        assert_eq!(state.status.unwrap().level, StatusLevel::Error);
    }

    #[test]
    fn test_header_add_delete_toggle() {
        let mut state = imported_state();
        state.add_header();
        assert_eq!(state.selected_header, 2);
        state.toggle_header();
        assert!(!state.request.headers[2].enabled);
        state.delete_header();
        assert_eq!(state.request.headers.len(), 2);
        assert_eq!(state.selected_header, 1);
    }

    #[test]
    fn test_url_edit_with_multibyte_chars() {
        let mut state = imported_state();
        state.start_editing();
        state.enter_char('é');
        state.move_cursor_left();
        state.enter_char('/');
        assert_eq!(state.request.url, "https://api.example.com/users/é");
        state.move_cursor_right();
        state.delete_char();
        assert_eq!(state.request.url, "https://api.example.com/users/");
    }

    #[test]
    fn test_paste_while_editing_url_drops_newlines() {
        let mut state = imported_state();
        state.start_editing();
        state.paste("?a=1\n");
        assert_eq!(state.request.url, "https://api.example.com/users?a=1");
    }

    #[test]
    fn test_pretty_fetch_body() {
        let snippet = r#"fetch("https://a.example/x", {"method": "POST", "body": "{\"b\":[1],\"a\":2}"});"#;

        let mut plain = AppState::default();
        plain.preload(snippet);
        assert_eq!(plain.request.body, r#"{"b":[1],"a":2}"#);

        let mut pretty = AppState::new(Config {
            pretty_fetch_body: true,
            ..Config::default()
        });
        pretty.preload(snippet);
        assert_eq!(pretty.request.body, "{\n  \"b\": [\n    1\n  ],\n  \"a\": 2\n}");
        assert_eq!(pretty.request.method, HttpMethod::POST);
    }

    #[test]
    fn test_reimport_cancels_inflight_replay() {
        let mut state = imported_state();
        let Some(NetworkCommand::ExecuteRequest { id, .. }) = state.prepare_request() else {
            panic!("expected a request");
        };
        state.open_import();
        state.paste("curl https://other.example");
        assert!(matches!(state.submit_import(), Some(NetworkCommand::CancelRequest(c)) if c == id));
        assert!(!state.is_loading);
        assert_eq!(state.request.url, "https://other.example");
    }

    #[test]
    fn test_export_uses_imported_notation() {
        let mut state = AppState::default();
        assert!(state.export_request().is_none());
        state.preload(r#"fetch("https://a.example/")"#);
        let (format, text) = state.export_request().unwrap();
        assert_eq!(format, Format::Fetch);
        assert!(text.starts_with("fetch(\"https://a.example/\""));
    }
}
