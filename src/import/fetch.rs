//! Browser `fetch(...)` snippet import/export
//!
//! This is pattern matching, not a JavaScript parser. The URL must be a
//! string literal, the options argument an inline object literal whose
//! top-level `method`, `headers`, `body` and `referrer` properties must
//! themselves be literals. Anything else is reported as a parse failure on
//! the offending field.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ImportError;
use crate::import::{Format, Imported};
use crate::models::{Header, HttpMethod, Request};

fn fail(field: &'static str, reason: impl Into<String>) -> ImportError {
    ImportError::parse(Format::Fetch, field, reason)
}

/// Parse a fetch call into a Request
pub fn parse_fetch(input: &str) -> Result<Imported, ImportError> {
    static CALL: OnceLock<Regex> = OnceLock::new();
    let call_re = CALL.get_or_init(|| Regex::new(r"^\s*(?:await\s+)?fetch\s*\(\s*").unwrap());

    let call = call_re
        .find(input)
        .ok_or_else(|| fail("url", "expected a fetch(...) call"))?;
    let rest = &input[call.end()..];

    let (url, used) = read_js_string(rest)
        .ok_or_else(|| fail("url", "the first argument must be a string literal"))?;
    let url = url.trim().to_string();
    if url.is_empty() {
        return Err(fail("url", "the URL literal is empty"));
    }

    let mut warnings = Vec::new();
    let after = rest[used..].trim_start();
    let options = match after.strip_prefix(',') {
        Some(more) => {
            let more = more.trim_start();
            if more.starts_with(')') || more.is_empty() {
                None
            } else if more.starts_with('{') {
                // Boundary match: the options object ends at the last brace
                let close = more
                    .rfind('}')
                    .filter(|&i| i > 0)
                    .ok_or_else(|| fail("options", "the options object is not closed"))?;
                Some(&more[1..close])
            } else {
                return Err(fail("options", "the second argument must be an inline object literal"));
            }
        }
        None if after.starts_with(')') => None,
        None => return Err(fail("url", "the URL argument is not followed by ',' or ')'")),
    };

    let mut request = Request::new(HttpMethod::GET, url);
    let Some(options) = options else {
        return Ok(Imported::new(request, Format::Fetch));
    };

    let props = Properties::scan(options);
    let body = extract_body(&props)?;
    let method = extract_method(&props)?;
    request.headers = extract_headers(&props)?;
    if let Some(referrer) = extract_string_option(&props, "referrer")? {
        if !referrer.is_empty() && !request.has_header("referer") {
            request.headers.push(Header::new("Referer", referrer));
        }
    }

    if request.headers.iter().any(|h| h.key.is_empty()) {
        request.headers.retain(|h| !h.key.is_empty());
        warnings.push("Header with an empty name ignored".to_string());
    }

    request.body = body;
    request.method = method.unwrap_or_else(|| HttpMethod::implied(!request.body.is_empty()));

    let mut imported = Imported::new(request, Format::Fetch);
    imported.warnings = warnings;
    Ok(imported)
}

/// Top-level properties of the options object, each key paired with the
/// text starting at its value
struct Properties<'a> {
    entries: Vec<(String, &'a str)>,
}

impl<'a> Properties<'a> {
    /// Walk `key: value` pairs at depth 0. Entries that are not plain
    /// properties (spreads, shorthands) are skipped.
    fn scan(options: &'a str) -> Self {
        let mut entries = Vec::new();
        let mut rest = options;
        loop {
            rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            if rest.is_empty() {
                return Self { entries };
            }
            let key = read_js_string(rest).or_else(|| read_identifier(rest));
            if let Some((key, used)) = key {
                if let Some(value) = rest[used..].trim_start().strip_prefix(':') {
                    let value = value.trim_start();
                    entries.push((key, value));
                    rest = &value[value_len(value)..];
                    continue;
                }
            }
            let skip = value_len(rest).max(1);
            rest = rest.get(skip..).unwrap_or("");
        }
    }

    /// Value text of `key`; a repeated key keeps its last occurrence
    fn get(&self, key: &str) -> Option<&'a str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }
}

/// Byte length of a value expression, up to the next `,` at depth 0
fn value_len(value: &str) -> usize {
    let mut depth = 0usize;
    let mut i = 0;
    while let Some(c) = value[i..].chars().next() {
        match c {
            '\'' | '"' | '`' => {
                match read_js_string(&value[i..]) {
                    Some((_, used)) => i += used,
                    None => return value.len(),
                }
                continue;
            }
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return i,
            _ => {}
        }
        i += c.len_utf8();
    }
    value.len()
}

/// `null` or `undefined` as a whole word
fn is_nullish(value: &str) -> bool {
    ["null", "undefined"].iter().any(|word| {
        value.strip_prefix(word).is_some_and(|after| {
            !after
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$'))
        })
    })
}

fn extract_body(props: &Properties<'_>) -> Result<String, ImportError> {
    let Some(value) = props.get("body") else {
        return Ok(String::new());
    };
    if is_nullish(value) {
        return Ok(String::new());
    }
    match read_js_string(value) {
        Some((body, _)) => Ok(body),
        None => Err(fail(
            "body",
            "the body must be a string literal or null (expressions such as JSON.stringify(...) are not evaluated)",
        )),
    }
}

fn extract_string_option(props: &Properties<'_>, key: &'static str) -> Result<Option<String>, ImportError> {
    let Some(value) = props.get(key) else {
        return Ok(None);
    };
    if is_nullish(value) {
        return Ok(None);
    }
    read_js_string(value)
        .map(|(s, _)| Some(s))
        .ok_or_else(|| fail(key, format!("{} must be a string literal", key)))
}

fn extract_method(props: &Properties<'_>) -> Result<Option<HttpMethod>, ImportError> {
    match extract_string_option(props, "method")? {
        Some(raw) => HttpMethod::parse(&raw)
            .map(Some)
            .ok_or_else(|| fail("method", format!("invalid method: {}", raw))),
        None => Ok(None),
    }
}

/// Flatten the inline `headers: { ... }` literal into ordered pairs
fn extract_headers(props: &Properties<'_>) -> Result<Vec<Header>, ImportError> {
    let Some(value) = props.get("headers") else {
        return Ok(Vec::new());
    };
    let Some(mut rest) = value.strip_prefix('{') else {
        return Err(fail("headers", "headers must be an inline object literal"));
    };

    let mut headers = Vec::new();
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.starts_with('}') {
            return Ok(headers);
        }
        if rest.is_empty() {
            return Err(fail("headers", "the headers object is not closed"));
        }

        let (key, used) = read_js_string(rest)
            .or_else(|| read_identifier(rest))
            .ok_or_else(|| fail("headers", "expected a header name"))?;
        rest = rest[used..].trim_start();
        rest = rest
            .strip_prefix(':')
            .ok_or_else(|| fail("headers", format!("expected ':' after header {}", key)))?
            .trim_start();

        let (value, used) = read_js_string(rest)
            .ok_or_else(|| fail("headers", format!("the value of header {} must be a string literal", key)))?;
        rest = &rest[used..];
        headers.push(Header::new(key, value));
    }
}

fn read_identifier(s: &str) -> Option<(String, usize)> {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-')))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    if end == 0 {
        None
    } else {
        Some((s[..end].to_string(), end))
    }
}

/// Decode a leading JS string literal ('..', ".." or `..`).
/// Returns the decoded text and the number of bytes consumed.
fn read_js_string(s: &str) -> Option<(String, usize)> {
    let mut chars = s.char_indices().peekable();
    let (_, quote) = chars.next()?;
    if !matches!(quote, '\'' | '"' | '`') {
        return None;
    }

    let mut out = String::new();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Some((out, i + c.len_utf8()));
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let (_, esc) = chars.next()?;
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0' => out.push('\0'),
            // Line continuation inside a literal
            '\n' => {}
            'x' | 'u' => {
                let braced = esc == 'u' && matches!(chars.peek(), Some((_, '{')));
                if braced {
                    chars.next();
                }
                let mut digits = String::new();
                let max = if esc == 'x' { 2 } else if braced { 6 } else { 4 };
                while digits.len() < max {
                    match chars.peek() {
                        Some((_, d)) if d.is_ascii_hexdigit() => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                if braced {
                    match chars.next() {
                        Some((_, '}')) => {}
                        _ => return None,
                    }
                }
                let code = u32::from_str_radix(&digits, 16).ok()?;
                // Surrogate pairs as emitted by JSON.stringify
                if (0xD800..0xDC00).contains(&code) {
                    let low = read_low_surrogate(&mut chars)?;
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    out.push(char::from_u32(combined)?);
                } else {
                    out.push(char::from_u32(code)?);
                }
            }
            other => out.push(other),
        }
    }
    None
}

fn read_low_surrogate(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Option<u32> {
    match (chars.next(), chars.next()) {
        (Some((_, '\\')), Some((_, 'u'))) => {}
        _ => return None,
    }
    let mut digits = String::new();
    for _ in 0..4 {
        let (_, d) = chars.next()?;
        digits.push(d);
    }
    let low = u32::from_str_radix(&digits, 16).ok()?;
    (0xDC00..0xE000).contains(&low).then_some(low)
}

fn js_string(s: &str) -> String {
    // A JSON string is a valid JS string literal
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// Format request as a fetch call, the way browsers copy it
pub fn to_fetch(request: &Request) -> String {
    let mut out = format!("fetch({}, {{\n", js_string(&request.url));

    let headers: Vec<&Header> = request.enabled_headers().collect();
    if headers.is_empty() {
        out.push_str("  \"headers\": {},\n");
    } else {
        out.push_str("  \"headers\": {\n");
        let lines: Vec<String> = headers
            .iter()
            .map(|h| format!("    {}: {}", js_string(&h.key), js_string(&h.value)))
            .collect();
        out.push_str(&lines.join(",\n"));
        out.push_str("\n  },\n");
    }

    if request.body.is_empty() {
        out.push_str("  \"body\": null,\n");
    } else {
        out.push_str(&format!("  \"body\": {},\n", js_string(&request.body)));
    }
    out.push_str(&format!("  \"method\": {}\n", js_string(request.method.as_str())));
    out.push_str("});");
    out
}
