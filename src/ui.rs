use ratatui::{prelude::*, widgets::*};

use crate::app::StatusLevel;
use crate::tree::{Container, LineToken, Marker, TreeLine};

/// Renders tabs
pub fn render_tabs<'a>(titles: &[&'a str], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// One response tree line, coloured, with its expand/collapse marker in
/// the last indentation cell
pub fn tree_line(line: &TreeLine, selected: bool) -> Line<'static> {
    let mut spans = Vec::new();

    if line.depth > 0 {
        let marker = match line.marker {
            Marker::Expanded if line.is_row_head() => "▾ ",
            Marker::Collapsed => "▸ ",
            _ => "  ",
        };
        spans.push(Span::raw("  ".repeat(line.depth - 1)));
        spans.push(Span::styled(marker, Style::default().fg(Color::DarkGray)));
    }

    if let Some(label) = line.label_text() {
        spans.push(Span::styled(label, Style::default().fg(Color::Cyan)));
    }

    let bracket = Style::default().fg(Color::White);
    match &line.token {
        LineToken::Value(literal) => {
            spans.push(Span::styled(literal.clone(), Style::default().fg(literal_color(literal))));
        }
        LineToken::Collapsed { container, count } => {
            spans.push(Span::styled(line.token_text(), bracket));
            let noun = match (container, *count) {
                (Container::Array, 1) => "item",
                (Container::Array, _) => "items",
                (Container::Object, 1) => "key",
                (Container::Object, _) => "keys",
            };
            spans.push(Span::styled(
                format!(" {} {}", count, noun),
                Style::default().fg(Color::DarkGray).italic(),
            ));
        }
        _ => spans.push(Span::styled(line.token_text(), bracket)),
    }

    if line.comma {
        spans.push(Span::raw(","));
    }

    let line = Line::from(spans);
    if selected {
        line.style(Style::default().bg(Color::DarkGray))
    } else {
        line
    }
}

fn literal_color(literal: &str) -> Color {
    match literal.chars().next() {
        Some('"') => Color::Green,
        Some('t' | 'f' | 'n') => Color::Magenta,
        _ => Color::Yellow,
    }
}

/// Status code color
pub fn status_color(code: u16) -> Color {
    match code {
        200..=299 => Color::Green,
        300..=399 => Color::Cyan,
        400..=499 => Color::Red,
        500..=599 => Color::Magenta,
        _ => Color::Yellow,
    }
}

/// Method color
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Yellow,
        "PUT" => Color::Blue,
        "PATCH" => Color::Cyan,
        "DELETE" => Color::Red,
        _ => Color::White,
    }
}

pub fn status_level_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Info => Color::Gray,
        StatusLevel::Success => Color::Green,
        StatusLevel::Warning => Color::Yellow,
        StatusLevel::Error => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{render, JsonNode};

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_collapsed_rows_show_count() {
        let node = JsonNode::parse(r#"{"list":[1,2,3],"one":{"k":null}}"#).unwrap();
        let mut tree = render(&node);
        tree.set_all(false);
        let lines = tree.lines();

        assert_eq!(plain(&tree_line(&lines[1], false)), "▸ \"list\": […] 3 items,");
        assert_eq!(plain(&tree_line(&lines[2], false)), "▸ \"one\": {…} 1 key");
    }

    #[test]
    fn test_expanded_lines_keep_indentation() {
        let node = JsonNode::parse(r#"{"a":[true]}"#).unwrap();
        let tree = render(&node);
        let rendered: Vec<String> = tree.lines().iter().map(|l| plain(&tree_line(l, false))).collect();
        assert_eq!(rendered, vec!["{", "▾ \"a\": [", "    true", "  ]", "}"]);
    }
}
