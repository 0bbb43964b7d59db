//! curl command import/export
//!
//! Covers the subset browsers emit with "Copy as cURL": shell quoting
//! (including `$'...'` strings) or the cmd.exe flavour (`^"...^"` with
//! caret escapes), `-X`, `-H`, the `--data` family and a handful of flags
//! that map onto headers.

use base64::Engine;

use crate::error::ImportError;
use crate::import::{Format, Imported};
use crate::models::{Header, HttpMethod, Request};

/// Flags that carry no value and do not change the request
const IGNORED_SWITCHES: &[&str] = &[
    "--compressed", "-k", "--insecure", "-L", "--location", "-s", "--silent",
    "-S", "--show-error", "-v", "--verbose", "-i", "--include", "-g", "--globoff",
    "-f", "--fail", "--http1.1", "--http2", "--http2-prior-knowledge",
];

/// Flags that take a value we cannot represent; value is skipped
const IGNORED_WITH_VALUE: &[&str] = &[
    "-o", "--output", "-m", "--max-time", "--connect-timeout", "-x", "--proxy",
    "--cacert", "--cert", "--key", "-w", "--write-out", "--retry", "-F", "--form",
    "--data-urlencode", "-T", "--upload-file", "--resolve", "--max-redirs",
    "-r", "--range", "-c", "--cookie-jar", "-U", "--proxy-user", "-D", "--dump-header",
    "--oauth2-bearer", "-E", "--interface", "--limit-rate", "-K", "--config",
    "--proto", "--ciphers", "-y", "--speed-time", "-Y", "--speed-limit",
];

/// Short flags whose value may be glued on (`-XPOST`)
const SHORT_WITH_VALUE: &[&str] = &["-X", "-H", "-d", "-A", "-b", "-e", "-u"];

/// Parse a curl command into a Request
pub fn parse_curl(input: &str) -> Result<Imported, ImportError> {
    let tokens = if is_cmd_style(input) {
        tokenize_cmd(input)
    } else {
        tokenize(input)
    };
    let tokens = tokens.map_err(|reason| ImportError::parse(Format::Curl, "quoting", reason))?;

    let mut tokens = tokens.into_iter().peekable();
    // Skip 'curl' command if present
    if matches!(tokens.peek().map(String::as_str), Some("curl") | Some("curl.exe")) {
        tokens.next();
    }

    let mut warnings = Vec::new();
    let mut url: Option<String> = None;
    let mut positional: Vec<String> = Vec::new();
    let mut method: Option<HttpMethod> = None;
    let mut head_only = false;
    let mut headers: Vec<Header> = Vec::new();
    let mut data: Vec<String> = Vec::new();

    while let Some(token) = tokens.next() {
        if !token.starts_with('-') || token == "-" {
            positional.push(token);
            continue;
        }

        let (flag, attached) = split_flag(&token);
        let mut value = |name: &str| -> Result<String, ImportError> {
            match attached.clone() {
                Some(v) => Ok(v),
                None => tokens.next().ok_or_else(|| {
                    ImportError::parse(Format::Curl, "arguments", format!("{} is missing its value", name))
                }),
            }
        };

        match flag {
            "-X" | "--request" => {
                let raw = value(flag)?;
                let parsed = HttpMethod::parse(&raw).ok_or_else(|| {
                    ImportError::parse(Format::Curl, "method", format!("invalid method: {}", raw))
                })?;
                method = Some(parsed);
            }
            "-H" | "--header" => {
                let raw = value(flag)?;
                match Header::parse_line(&raw) {
                    Some(header) => headers.push(header),
                    None => warnings.push(format!("Header without a name ignored: {}", raw)),
                }
            }
            "-d" | "--data" | "--data-ascii" | "--data-binary" => {
                let raw = value(flag)?;
                if raw.starts_with('@') {
                    return Err(ImportError::parse(
                        Format::Curl,
                        "body",
                        format!("{} reads the body from a file ({}), which cannot be replayed", flag, raw),
                    ));
                }
                data.push(raw);
            }
            "--data-raw" => data.push(value(flag)?),
            "--url" => {
                let raw = value(flag)?;
                if url.is_none() {
                    url = Some(raw);
                } else {
                    warnings.push(format!("Extra URL ignored: {}", raw));
                }
            }
            "-A" | "--user-agent" => headers.push(Header::new("User-Agent", value(flag)?)),
            "-b" | "--cookie" => headers.push(Header::new("Cookie", value(flag)?)),
            "-e" | "--referer" => headers.push(Header::new("Referer", value(flag)?)),
            "-u" | "--user" => {
                let credentials = value(flag)?;
                let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
                headers.push(Header::new("Authorization", format!("Basic {}", encoded)));
            }
            "-I" | "--head" => head_only = true,
            _ if IGNORED_SWITCHES.contains(&flag) => {}
            _ if IGNORED_WITH_VALUE.contains(&flag) => {
                let _ = value(flag)?;
                warnings.push(format!("Unsupported flag ignored: {}", flag));
            }
            _ => warnings.push(format!("Unknown flag ignored: {}", flag)),
        }
    }

    let url = match url {
        Some(url) => {
            warnings.extend(positional.iter().map(|t| format!("Extra argument ignored: {}", t)));
            Some(url)
        }
        // The value of an unrecognised flag can land here; prefer a token
        // that carries a scheme over the first bare one
        None if !positional.is_empty() => {
            let pick = positional.iter().position(|t| t.contains("://")).unwrap_or(0);
            let url = positional.remove(pick);
            warnings.extend(positional.iter().map(|t| format!("Extra argument ignored: {}", t)));
            Some(url)
        }
        None => None,
    };
    let url = url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ImportError::parse(Format::Curl, "url", "no URL found in the command"))?;

    // curl joins repeated data flags with '&'
    let body = data.join("&");
    let method = method.unwrap_or_else(|| {
        if head_only {
            HttpMethod::HEAD
        } else {
            HttpMethod::implied(!body.is_empty())
        }
    });

    let mut request = Request::new(method, url);
    request.headers = headers;
    request.body = body;

    let mut imported = Imported::new(request, Format::Curl);
    imported.warnings = warnings;
    Ok(imported)
}

/// Split `--flag=value` and `-Xvalue` forms
fn split_flag(token: &str) -> (&str, Option<String>) {
    if token.starts_with("--") {
        if let Some((flag, value)) = token.split_once('=') {
            return (flag, Some(value.to_string()));
        }
        return (token, None);
    }
    if token.len() > 2 && token.is_char_boundary(2) {
        let (flag, rest) = token.split_at(2);
        if SHORT_WITH_VALUE.contains(&flag) {
            return (flag, Some(rest.to_string()));
        }
    }
    (token, None)
}

#[derive(Clone, Copy, PartialEq)]
enum Quote {
    None,
    Single,
    Double,
    AnsiC,
}

/// Tokenize a curl command, respecting shell quotes and line continuations
fn tokenize(input: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut quote = Quote::None;

    let normalized = input.replace("\r\n", "\n");
    let mut chars = normalized.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(c);
                }
            }
            Quote::Double => match c {
                '"' => quote = Quote::None,
                '\\' => match chars.next() {
                    Some(n @ ('"' | '\\' | '$' | '`')) => current.push(n),
                    Some('\n') => {}
                    Some(n) => {
                        current.push('\\');
                        current.push(n);
                    }
                    None => return Err("trailing backslash inside double quotes".to_string()),
                },
                _ => current.push(c),
            },
            Quote::AnsiC => match c {
                '\'' => quote = Quote::None,
                '\\' => push_ansi_escape(&mut chars, &mut current)?,
                _ => current.push(c),
            },
            Quote::None => match c {
                '\'' => {
                    quote = Quote::Single;
                    has_token = true;
                }
                '"' => {
                    quote = Quote::Double;
                    has_token = true;
                }
                '$' if chars.peek() == Some(&'\'') => {
                    chars.next();
                    quote = Quote::AnsiC;
                    has_token = true;
                }
                '\\' => match chars.next() {
                    // Line continuation
                    Some('\n') => {}
                    Some(n) => {
                        current.push(n);
                        has_token = true;
                    }
                    None => return Err("trailing backslash".to_string()),
                },
                // cmd.exe line continuation
                '^' if chars.peek() == Some(&'\n') => {
                    chars.next();
                }
                c if c.is_whitespace() => {
                    if has_token {
                        tokens.push(std::mem::take(&mut current));
                        has_token = false;
                    }
                }
                _ => {
                    current.push(c);
                    has_token = true;
                }
            },
        }
    }

    match quote {
        Quote::None => {}
        Quote::Single | Quote::AnsiC => return Err("unterminated single quote".to_string()),
        Quote::Double => return Err("unterminated double quote".to_string()),
    }

    if has_token {
        tokens.push(current);
    }

    Ok(tokens)
}

/// cmd.exe flavour: `^"` quoting or `^` line continuations
pub(crate) fn is_cmd_style(input: &str) -> bool {
    input.contains("^\"") || input.lines().any(|line| line.trim_end().ends_with('^'))
}

/// Tokenize a cmd.exe command line: caret escapes first, then the
/// Windows argv rules for `"` and backslashes
fn tokenize_cmd(input: &str) -> Result<Vec<String>, String> {
    let normalized = input.replace("\r\n", "\n");
    let mut unescaped = String::with_capacity(normalized.len());
    let mut chars = normalized.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            // `^` + blank line is an escaped newline inside an argument
            Some('\n') if chars.peek() == Some(&'\n') => {
                chars.next();
                unescaped.push('\n');
            }
            Some('\n') => {}
            Some(n) => unescaped.push(n),
            None => return Err("trailing caret".to_string()),
        }
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut in_quotes = false;
    let mut chars = unescaped.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let mut slashes = 1;
                while chars.peek() == Some(&'\\') {
                    chars.next();
                    slashes += 1;
                }
                if chars.peek() == Some(&'"') {
                    current.push_str(&"\\".repeat(slashes / 2));
                    if slashes % 2 == 1 {
                        chars.next();
                        current.push('"');
                    }
                } else {
                    current.push_str(&"\\".repeat(slashes));
                }
                has_token = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            _ => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated double quote".to_string());
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Decode one escape inside a `$'...'` string (the backslash is consumed)
fn push_ansi_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    out: &mut String,
) -> Result<(), String> {
    let c = chars
        .next()
        .ok_or_else(|| "trailing backslash in $'...' string".to_string())?;
    let decoded = match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'v' => '\x0b',
        'e' | 'E' => '\x1b',
        '\\' | '\'' | '"' | '?' => c,
        'x' | 'u' | 'U' => {
            let max = match c {
                'x' => 2,
                'u' => 4,
                _ => 8,
            };
            let mut digits = String::new();
            while digits.len() < max {
                match chars.peek() {
                    Some(d) if d.is_ascii_hexdigit() => {
                        digits.push(*d);
                        chars.next();
                    }
                    _ => break,
                }
            }
            if digits.is_empty() {
                out.push('\\');
                c
            } else {
                let code = u32::from_str_radix(&digits, 16).map_err(|e| e.to_string())?;
                char::from_u32(code).ok_or_else(|| format!("invalid escape \\{}{}", c, digits))?
            }
        }
        '0'..='7' => {
            let mut digits = String::from(c);
            while digits.len() < 3 {
                match chars.peek() {
                    Some(d @ '0'..='7') => {
                        digits.push(*d);
                        chars.next();
                    }
                    _ => break,
                }
            }
            let code = u32::from_str_radix(&digits, 8).map_err(|e| e.to_string())?;
            char::from_u32(code).ok_or_else(|| format!("invalid escape \\{}", digits))?
        }
        other => {
            out.push('\\');
            other
        }
    };
    out.push(decoded);
    Ok(())
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Format request as cURL command
pub fn to_curl(request: &Request) -> String {
    let mut parts = vec![format!("curl {}", shell_quote(&request.url))];

    // Method, unless the flags below already imply it
    let implied = HttpMethod::implied(!request.body.is_empty());
    if request.method != implied {
        parts.push(format!("-X {}", request.method.as_str()));
    }

    for header in request.enabled_headers() {
        parts.push(format!("-H {}", shell_quote(&format!("{}: {}", header.key, header.value))));
    }

    if !request.body.is_empty() {
        parts.push(format!("--data-raw {}", shell_quote(&request.body)));
    }

    parts.join(" \\\n  ")
}
