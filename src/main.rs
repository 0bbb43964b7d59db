//! recapture - replay HTTP requests copied from browser dev tools
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - session state machine processing events
//! - Network Layer (Tokio) - async request replay

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use recapture::app::{AppActor, AppState, Outcome};
use recapture::config::Config;
use recapture::constants::{APP_NAME, APP_VERSION, DEFAULT_LOG_FILE, LOG_ENV_VAR};
use recapture::messages::ui_events::{key_to_ui_event, InputMode, Panel};
use recapture::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use recapture::network::{create_client, NetworkActor};
use recapture::ui::{self, method_color, status_color, status_level_color, tree_line};

#[derive(Parser, Debug)]
#[command(name = "recapture", version, about, long_about = None)]
struct Args {
    /// File holding a curl command, a fetch(...) call or a HAR capture
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Print the imported request as JSON and exit (no TUI)
    #[arg(long, requires = "input")]
    print_request: bool,

    /// Request timeout in seconds; 0 disables it
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Config file (default: ~/.recapture/config.yaml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }

    let input = match &args.input {
        Some(path) => Some(
            fs::read_to_string(path).with_context(|| format!("reading input {}", path.display()))?,
        ),
        None => None,
    };

    // Initialize logging to file
    let config_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_dir);
    let _log_guard = init_logging(&config, &config_dir)?;
    tracing::info!(version = APP_VERSION, config = %config_path.display(), "Starting {}", APP_NAME);

    if args.print_request {
        return print_request(input.as_deref().unwrap_or_default());
    }

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(create_client(&config), net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let mut state = AppState::new(config);
    if let Some(input) = &input {
        state.preload(input);
    }
    let app_actor = AppActor::new(state, net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    Ok(())
}

/// File logging; the terminal belongs to the UI
fn init_logging(config: &Config, config_dir: &Path) -> Result<WorkerGuard> {
    let path = config.log_path(config_dir);
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir).with_context(|| format!("creating log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.into());

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
    Ok(guard)
}

/// Import `input` and print the canonical request
fn print_request(input: &str) -> Result<()> {
    let imported = recapture::import::import(input)?;
    for warning in &imported.warnings {
        eprintln!("warning: {}", warning);
    }
    println!("{}", serde_json::to_string_pretty(&imported.request)?);
    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            let ui_event = match event::read()? {
                Event::Key(key) => key_to_ui_event(
                    key,
                    current_state.active_panel,
                    current_state.input_mode,
                    current_state.show_help,
                    current_state.show_import,
                ),
                Event::Paste(text) => Some(UiEvent::Paste(text)),
                _ => None,
            };
            if let Some(event) = ui_event {
                let quit = matches!(event, UiEvent::Quit);
                let _ = ui_tx.send(event);
                if quit {
                    break;
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();
    let warning_rows = state.warnings.len().min(3) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Method + URL
            Constraint::Length(9),            // Headers | Body
            Constraint::Min(5),               // Response
            Constraint::Length(warning_rows), // Import warnings
            Constraint::Length(1),            // Status bar
        ])
        .split(area);

    draw_url_bar(f, state, chunks[0]);
    draw_request_panels(f, state, chunks[1]);
    draw_response(f, state, chunks[2]);
    draw_warnings(f, state, chunks[3]);
    draw_status_bar(f, state, chunks[4]);

    // Popups
    if state.show_help {
        draw_help_popup(f, area);
    }

    if state.show_import {
        draw_import_popup(f, state, area);
    }
}

fn border_style(focused: bool, editing: bool) -> Style {
    if focused && editing {
        Style::default().fg(Color::Yellow)
    } else if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Column and row of a byte offset inside (possibly multi-line) text
fn cursor_offset(text: &str, pos: usize) -> (u16, u16) {
    let before = text.get(..pos).unwrap_or(text);
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0);
    (col as u16, row as u16)
}

fn place_cursor(f: &mut Frame, area: Rect, text: &str, pos: usize) {
    let (col, row) = cursor_offset(text, pos);
    let max_x = area.x + area.width.saturating_sub(2);
    let max_y = area.y + area.height.saturating_sub(2);
    let cursor_x = (area.x + col + 1).min(max_x);
    let cursor_y = (area.y + row + 1).min(max_y);
    f.set_cursor_position(Position::new(cursor_x, cursor_y));
}

fn draw_url_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Url;
    let editing = state.input_mode == InputMode::Editing;
    let mcolor = method_color(state.method.as_str());

    let loading = if state.is_loading { " [...]" } else { "" };
    let source = state
        .imported_format
        .map(|format| format!(" (from {})", format))
        .unwrap_or_default();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, editing))
        .title(format!(" {}{}{} ", state.method.as_str(), loading, source))
        .title_style(Style::default().fg(mcolor).bold());

    let input = Paragraph::new(state.url.as_str()).block(block);
    f.render_widget(input, area);

    if is_focused && editing {
        place_cursor(f, area, &state.url, state.cursor_position);
    }
}

fn draw_request_panels(f: &mut Frame, state: &RenderState, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_headers_panel(f, state, columns[0]);
    draw_body_panel(f, state, columns[1]);
}

fn draw_headers_panel(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Headers;
    let editing = is_focused && state.input_mode == InputMode::Editing;

    let items: Vec<ListItem> = state
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let selected = is_focused && i == state.selected_header;
            let prefix = if h.enabled { "[x]" } else { "[ ]" };
            if selected && editing {
                let line = state.header_buffer.as_deref().unwrap_or_default();
                return ListItem::new(format!("{} {}", prefix, line)).style(Style::default().fg(Color::Yellow));
            }
            let style = if !h.enabled {
                Style::default().fg(Color::DarkGray)
            } else if selected {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            };
            ListItem::new(format!("{} {}: {}", prefix, h.key, h.value)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(is_focused, editing))
            .title(" Headers (a:add d:del e:edit Enter:toggle) "),
    );

    let mut list_state = ListState::default();
    list_state.select(Some(state.selected_header));
    f.render_stateful_widget(list, area, &mut list_state);

    if editing {
        if let Some(line) = &state.header_buffer {
            // "[x] " precedes the editable text
            let row_area = Rect {
                x: area.x + 4,
                y: area.y + state.selected_header as u16,
                width: area.width.saturating_sub(4),
                height: area.height.saturating_sub(state.selected_header as u16),
            };
            place_cursor(f, row_area, line, state.cursor_position);
        }
    }
}

fn draw_body_panel(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Body;
    let editing = state.input_mode == InputMode::Editing;

    let title = if !state.method.sends_body() && !state.body.is_empty() {
        format!(" Body (not sent with {}) ", state.method)
    } else {
        String::from(" Body ")
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, editing))
        .title(title);

    let body = Paragraph::new(state.body.as_str()).block(block);
    f.render_widget(body, area);

    if is_focused && editing {
        place_cursor(f, area, &state.body, state.cursor_position);
    }
}

fn draw_response(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Response;

    let (status_text, time_text) = match &state.outcome {
        Some(Outcome::Response(response)) => (
            Span::styled(
                format!(" {} {} ", response.status, response.status_text),
                Style::default().fg(status_color(response.status)).bold(),
            ),
            format!(" {}ms ", response.duration_ms),
        ),
        Some(Outcome::Failed(error)) => (
            Span::styled(" Transport error ", Style::default().fg(Color::Red).bold()),
            format!(" {}ms ", error.time_ms()),
        ),
        _ => (Span::raw(" Response "), String::new()),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, false))
        .title(status_text)
        .title_bottom(Line::from(time_text).right_aligned());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let tabs = ui::render_tabs(&["Body", "Headers (h)"], usize::from(state.show_response_headers));
    f.render_widget(tabs, rows[0]);
    let content_area = rows[1];

    let hint = Style::default().fg(Color::DarkGray);
    let response = match &state.outcome {
        None if state.is_loading => {
            f.render_widget(Paragraph::new("Sending...").style(hint), content_area);
            return;
        }
        None => {
            f.render_widget(Paragraph::new("Press 's' to replay the request").style(hint), content_area);
            return;
        }
        Some(Outcome::Cancelled) => {
            f.render_widget(Paragraph::new("Request cancelled").style(hint), content_area);
            return;
        }
        Some(Outcome::Failed(error)) => {
            let text = format!("{}\n\nNo response was received.", error);
            let paragraph = Paragraph::new(text)
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false });
            f.render_widget(paragraph, content_area);
            return;
        }
        Some(Outcome::Response(response)) => response,
    };

    if state.show_response_headers {
        let lines: Vec<Line> = response
            .headers
            .iter()
            .map(|(k, v)| {
                Line::from(vec![
                    Span::styled(format!("{}: ", k), Style::default().fg(Color::Cyan)),
                    Span::raw(v.clone()),
                ])
            })
            .collect();
        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((state.response_scroll, 0));
        f.render_widget(paragraph, content_area);
        return;
    }

    match &state.tree_lines {
        Some(lines) => {
            // Keep the cursor line on screen
            let height = usize::from(content_area.height.max(1));
            let offset = state.selected_line.saturating_sub(height - 1);
            let rendered: Vec<Line> = lines
                .iter()
                .enumerate()
                .map(|(i, line)| tree_line(line, is_focused && i == state.selected_line))
                .collect();
            let paragraph = Paragraph::new(rendered).scroll((offset as u16, 0));
            f.render_widget(paragraph, content_area);
        }
        None => {
            let paragraph = Paragraph::new(response.body_text.as_str())
                .wrap(Wrap { trim: false })
                .scroll((state.response_scroll, 0));
            f.render_widget(paragraph, content_area);
        }
    }
}

fn draw_warnings(f: &mut Frame, state: &RenderState, area: Rect) {
    if area.height == 0 {
        return;
    }
    let lines: Vec<Line> = state
        .warnings
        .iter()
        .take(area.height as usize)
        .map(|w| Line::from(Span::styled(format!(" ! {}", w), Style::default().fg(Color::Yellow))))
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let hints = if state.show_import {
        " Enter:import | Alt+Enter:newline | Ctrl+V:paste | Esc:close "
    } else if state.input_mode == InputMode::Editing {
        " ESC:stop editing | arrows:move "
    } else if state.active_panel == Panel::Response {
        " Enter:fold | y/Y:copy value/body | E/C:expand/collapse all | h:headers "
    } else {
        " Tab:panel | i:import | e:edit | m:method | s:send | c:copy request | ?:help | q:quit "
    };

    let mut spans = Vec::new();
    if let Some(status) = &state.status {
        spans.push(Span::styled(
            format!(" {} ", status.text),
            Style::default().fg(status_level_color(status.level)),
        ));
        spans.push(Span::raw("|"));
    }
    spans.push(Span::styled(hints, Style::default().fg(Color::DarkGray)));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 80, area);

    let help_text = r#"
 RECAPTURE - Keyboard Shortcuts

 IMPORT
   i                  Open import popup
   Enter              Import pasted text
   Alt+Enter / Ctrl+J Insert newline
   Ctrl+V             Paste from clipboard

 REQUEST
   Tab / Shift+Tab    Switch panels
   e / Enter          Edit URL, body or header
   m                  Cycle HTTP method
   s                  Send (replaces a request in flight)
   Ctrl+X             Cancel request
   c                  Copy request in its original notation

 HEADERS
   a / d              Add / delete header
   Enter / Space      Toggle header enabled

 RESPONSE
   ↑ / ↓              Move cursor
   Enter / Space      Expand or collapse row
   E / C              Expand / collapse all
   y                  Copy value under cursor
   Y                  Copy whole body
   h                  Show response headers

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn draw_import_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(80, 60, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Import request: curl command, fetch(...) call or HAR capture ")
        .style(Style::default().bg(Color::Black));

    let (content, style) = if state.import_buffer.is_empty() {
        (
            "Paste a request copied from the browser's network panel...",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (state.import_buffer.as_str(), Style::default())
    };

    // Follow the end of long pastes
    let height = popup_area.height.saturating_sub(2);
    let line_count = content.lines().count() as u16;
    let input = Paragraph::new(content)
        .style(style)
        .block(block)
        .scroll((line_count.saturating_sub(height), 0));

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
