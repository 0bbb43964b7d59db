//! Notation detection for pasted captures
//!
//! Precedence is fixed: a HAR document wins over anything else, then a curl
//! command, then a fetch call. Several `;`-joined commands collapse to the
//! first one that is recognized.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ImportError;
use crate::import::curl;
use crate::import::har::{self, Har};

/// What the detector found, borrowing the slice the parser should read
#[derive(Debug)]
pub enum Source<'a> {
    Har(Har),
    Curl(&'a str),
    Fetch(&'a str),
}

#[derive(Debug)]
pub struct Detection<'a> {
    pub source: Source<'a>,
    /// Commands after the chosen one that were dropped
    pub discarded: usize,
}

/// Classify raw input text
pub fn detect(input: &str) -> Result<Detection<'_>, ImportError> {
    let input = input.trim();

    // A HAR document is JSON, so it may well contain "curl" or "fetch(" in
    // some string; it has to be tried before any textual check.
    if let Some(capture) = har::try_capture(input) {
        return Ok(Detection {
            source: Source::Har(capture),
            discarded: 0,
        });
    }

    let quoting = if is_fetch(input) {
        Quoting::Script
    } else if curl::is_cmd_style(input) {
        Quoting::Cmd
    } else {
        Quoting::Shell
    };
    let segments = split_commands(input, quoting);
    for (i, segment) in segments.iter().enumerate() {
        let source = if is_curl(segment) {
            Source::Curl(segment)
        } else if is_fetch(segment) {
            Source::Fetch(segment)
        } else {
            continue;
        };
        return Ok(Detection {
            source,
            discarded: segments.len() - i - 1,
        });
    }

    Err(ImportError::Unrecognized)
}

/// First whitespace-delimited token is the curl binary
pub fn is_curl(text: &str) -> bool {
    matches!(
        text.split_whitespace().next(),
        Some("curl") | Some("curl.exe")
    )
}

/// Text opens with a `fetch(` call, optionally awaited
pub fn is_fetch(text: &str) -> bool {
    static FETCH_CALL: OnceLock<Regex> = OnceLock::new();
    let re = FETCH_CALL.get_or_init(|| Regex::new(r"^(?:await\s+)?fetch\s*\(").unwrap());
    re.is_match(text.trim_start())
}

/// String rules used when looking for `;` separators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    /// POSIX shell: nothing escapes inside `'...'`, `$'...'` honours `\`
    Shell,
    /// JavaScript: `\` escapes inside `'`, `"` and backtick strings
    Script,
    /// cmd.exe: carets are escapes, only `"` quotes
    Cmd,
}

/// Split on `;` outside of quotes. Empty segments are dropped.
pub fn split_commands(input: &str, quoting: Quoting) -> Vec<&str> {
    // `$` marks an ANSI-C `$'...'` string
    let mut quote: Option<char> = None;
    let mut segments = Vec::new();
    let mut escape_next = false;
    let mut prev = '\0';
    let mut start = 0;

    for (i, c) in input.char_indices() {
        if quoting == Quoting::Cmd && c == '^' {
            continue;
        }
        if escape_next {
            escape_next = false;
            prev = '\0';
            continue;
        }
        match (quote, c) {
            (None, '\'' | '`') if quoting == Quoting::Cmd => {}
            (Some('\'' | '$'), '\'') if quoting == Quoting::Shell => quote = None,
            (Some('\''), _) if quoting == Quoting::Shell => {}
            (_, '\\') => escape_next = true,
            (Some('$'), _) => {}
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'') if prev == '$' && quoting == Quoting::Shell => quote = Some('$'),
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, ';') => {
                segments.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        prev = c;
    }
    segments.push(input[start..].trim());

    segments.retain(|s| !s.is_empty());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_har_wins_even_when_it_mentions_curl_and_fetch() {
        let har = r#"{"log":{"entries":[{"request":{"method":"GET","url":"https://x/curl","headers":[{"name":"X-Note","value":"fetch('y')"}]}}]}}"#;
        let detection = detect(har).unwrap();
        assert!(matches!(detection.source, Source::Har(_)));
    }

    #[test]
    fn test_empty_har_is_unrecognized() {
        let har = r#"{"log":{"entries":[]}}"#;
        assert_eq!(detect(har).unwrap_err(), ImportError::Unrecognized);
    }

    #[test]
    fn test_curl_and_fetch_detection() {
        assert!(matches!(detect("  curl https://a").unwrap().source, Source::Curl(_)));
        assert!(matches!(detect("fetch('https://a')").unwrap().source, Source::Fetch(_)));
        assert!(matches!(detect("await fetch (\"https://a\")").unwrap().source, Source::Fetch(_)));
        assert!(detect("curly https://a").is_err());
        assert!(detect("wget https://a").is_err());
    }

    #[test]
    fn test_joined_commands_keep_first() {
        let detection = detect("curl https://a; curl https://b ; curl https://c").unwrap();
        match detection.source {
            Source::Curl(text) => assert_eq!(text, "curl https://a"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(detection.discarded, 2);
    }

    #[test]
    fn test_semicolons_inside_quotes_do_not_split() {
        let segments = split_commands(
            r#"curl 'https://a/?x=1;y=2' -H "Cookie: a=1; b=2";"#,
            Quoting::Shell,
        );
        assert_eq!(segments.len(), 1);
        let segments = split_commands(r#"fetch("https://a", {"body": "a;b"});"#, Quoting::Script);
        assert_eq!(segments, vec![r#"fetch("https://a", {"body": "a;b"})"#]);
    }

    #[test]
    fn test_escaped_quote_in_script_string_keeps_semicolon_inside() {
        let input = r#"fetch('https://a/x', {method:'POST', body:'it\'s; fine'}); fetch('https://b')"#;
        let segments = split_commands(input, Quoting::Script);
        assert_eq!(
            segments,
            vec![r#"fetch('https://a/x', {method:'POST', body:'it\'s; fine'})"#, "fetch('https://b')"]
        );

        // Shell single quotes have no escapes: `'it\'` closes before `s`
        let segments = split_commands(r#"curl 'a\'; curl b"#, Quoting::Shell);
        assert_eq!(segments, vec![r#"curl 'a\'"#, "curl b"]);

        let detection = detect(input).unwrap();
        assert!(matches!(detection.source, Source::Fetch(_)));
        assert_eq!(detection.discarded, 1);
    }

    #[test]
    fn test_cmd_quoting_keeps_escaped_quotes_together() {
        let input = r#"curl ^"https://a^" --data-raw ^"^{^\^"k^\^":^\^"a;b^\^"^}^"; curl ^"https://b^""#;
        let segments = split_commands(input, Quoting::Cmd);
        assert_eq!(segments.len(), 2);
        assert!(segments[0].ends_with(r#"^}^""#));

        let detection = detect(input).unwrap();
        assert_eq!(detection.discarded, 1);
    }

    #[test]
    fn test_trailing_semicolon_is_not_a_discarded_command() {
        let detection = detect("fetch('https://a');").unwrap();
        assert_eq!(detection.discarded, 0);
    }
}
