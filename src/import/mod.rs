//! Capture import - turns pasted text into a canonical [`Request`]
//!
//! Three notations are understood: a HAR capture (JSON export of recorded
//! exchanges), a `curl` command line and a browser `fetch(...)` call. They
//! are a best-effort subset of what browser "copy as ..." features emit.

pub mod curl;
pub mod detector;
pub mod fetch;
pub mod har;

use std::fmt;

use crate::error::ImportError;
use crate::models::Request;
use detector::Source;

/// Supported capture notations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Har,
    Curl,
    Fetch,
}

impl Format {
    pub fn as_str(&self) -> &str {
        match self {
            Format::Har => "HAR",
            Format::Curl => "curl",
            Format::Fetch => "fetch",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully imported request plus anything the user should know
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Imported {
    pub request: Request,
    pub format: Format,
    /// Non-fatal notes: dropped commands, ignored flags, unsent bodies
    pub warnings: Vec<String>,
}

impl Imported {
    pub fn new(request: Request, format: Format) -> Self {
        Imported {
            request,
            format,
            warnings: Vec::new(),
        }
    }
}

pub type ParseOutcome = Result<Imported, ImportError>;

/// Detect the notation of `input` and parse it
pub fn import(input: &str) -> ParseOutcome {
    let detection = match detector::detect(input) {
        Ok(detection) => detection,
        Err(e) => {
            tracing::info!(error = %e, "Import rejected");
            return Err(e);
        }
    };

    let parsed = match detection.source {
        Source::Har(capture) => har::from_capture(capture),
        Source::Curl(text) => curl::parse_curl(text),
        Source::Fetch(text) => fetch::parse_fetch(text),
    };
    let mut imported = match parsed {
        Ok(imported) => imported,
        Err(e) => {
            tracing::info!(error = %e, "Import failed");
            return Err(e);
        }
    };

    if detection.discarded > 0 {
        imported.warnings.insert(
            0,
            format!(
                "Input held {} more command(s) after the first; only the first was imported",
                detection.discarded
            ),
        );
    }

    let request = &imported.request;
    if !request.method.sends_body() && !request.body.is_empty() {
        imported.warnings.push(format!(
            "{} requests are sent without a body; the imported body is kept for editing",
            request.method
        ));
    }

    tracing::info!(
        format = %imported.format,
        method = %imported.request.method,
        url = %imported.request.url,
        warnings = imported.warnings.len(),
        "Imported request"
    );
    Ok(imported)
}

/// Serialise a request back into the given notation
pub fn export(request: &Request, format: Format) -> String {
    match format {
        Format::Har => har::to_har(request),
        Format::Curl => curl::to_curl(request),
        Format::Fetch => fetch::to_fetch(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Header, HttpMethod};

    fn sample_request() -> Request {
        let mut request = Request::new(HttpMethod::PATCH, "https://api.example.com/items/7?x=1&y=2");
        request.headers.push(Header::new("Content-Type", "application/json"));
        request.headers.push(Header::new("X-Quote", "it's \"quoted\""));
        request.headers.push(Header::new("x-quote", "duplicate"));
        request.body = "{\"name\":\"O'Brien\",\n\"tags\":[\"a;b\"]}".to_string();
        request
    }

    #[test]
    fn test_export_then_import_is_stable_for_every_format() {
        let original = sample_request();
        for format in [Format::Curl, Format::Fetch, Format::Har] {
            let text = export(&original, format);
            let imported = import(&text).unwrap_or_else(|e| panic!("{}: {}\n{}", format, e, text));
            assert_eq!(imported.format, format);
            assert_eq!(imported.request, original, "{} round trip\n{}", format, text);
        }
    }

    #[test]
    fn test_get_with_body_keeps_body_and_warns() {
        let imported = import("curl -X GET https://a --data-raw 'q=1'").unwrap();
        assert_eq!(imported.request.method, HttpMethod::GET);
        assert_eq!(imported.request.body, "q=1");
        assert!(imported.warnings.iter().any(|w| w.contains("without a body")));
    }

    #[test]
    fn test_discarded_commands_are_reported() {
        let imported = import("curl https://a; curl https://b").unwrap();
        assert_eq!(imported.request.url, "https://a");
        assert!(imported.warnings[0].contains("1 more command"));
    }

    #[test]
    fn test_unrecognized_input() {
        assert_eq!(import("GET https://a HTTP/1.1").unwrap_err(), ImportError::Unrecognized);
        assert_eq!(import("   ").unwrap_err(), ImportError::Unrecognized);
    }
}
