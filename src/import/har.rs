//! HAR (HTTP Archive) capture import/export
//!
//! Only the first entry's request is imported.

use serde::{Deserialize, Serialize};

use crate::constants::{APP_NAME, APP_VERSION};
use crate::error::ImportError;
use crate::import::{Format, Imported};
use crate::models::{Header, HttpMethod, Request};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Har {
    pub log: HarLog,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<HarCreator>,
    #[serde(default)]
    pub entries: Vec<HarEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarCreator {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarEntry {
    pub request: HarRequest,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarRequest {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_version: Option<String>,
    #[serde(default)]
    pub headers: Vec<HarHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<HarPostData>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarHeader {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarPostData {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Parse `input` as a HAR document holding at least one entry.
///
/// Anything else (not JSON, wrong shape, no entries) is `None`: the detector
/// then moves on to the textual notations.
pub fn try_capture(input: &str) -> Option<Har> {
    if !input.trim_start().starts_with('{') {
        return None;
    }
    let har: Har = serde_json::from_str(input).ok()?;
    if har.log.entries.is_empty() {
        None
    } else {
        Some(har)
    }
}

/// Build a Request from the first entry of a capture
pub fn from_capture(har: Har) -> Result<Imported, ImportError> {
    let total = har.log.entries.len();
    let entry = har
        .log
        .entries
        .into_iter()
        .next()
        .ok_or_else(|| ImportError::parse(Format::Har, "entries", "the capture holds no entries"))?;
    let req = entry.request;

    let url = req.url.trim().to_string();
    if url.is_empty() {
        return Err(ImportError::parse(Format::Har, "url", "the first entry has no URL"));
    }

    let body = req.post_data.and_then(|p| p.text).unwrap_or_default();
    let method = if req.method.trim().is_empty() {
        HttpMethod::implied(!body.is_empty())
    } else {
        HttpMethod::parse(&req.method).ok_or_else(|| {
            ImportError::parse(Format::Har, "method", format!("invalid method: {}", req.method))
        })?
    };

    let mut request = Request::new(method, url);
    // HTTP/2 pseudo-headers (":authority", ":path", ...) are not replayable
    request.headers = req
        .headers
        .into_iter()
        .filter(|h| !h.name.starts_with(':'))
        .map(|h| Header::new(h.name, h.value))
        .collect();
    request.body = body;

    let mut imported = Imported::new(request, Format::Har);
    if total > 1 {
        imported
            .warnings
            .push(format!("Capture holds {} entries; only the first was imported", total));
    }
    Ok(imported)
}

/// Parse a HAR document directly, skipping detection
pub fn parse_har(input: &str) -> Result<Imported, ImportError> {
    let har: Har = serde_json::from_str(input)
        .map_err(|e| ImportError::parse(Format::Har, "document", e.to_string()))?;
    from_capture(har)
}

/// Format request as a single-entry HAR document
pub fn to_har(request: &Request) -> String {
    let post_data = if request.body.is_empty() {
        None
    } else {
        Some(HarPostData {
            mime_type: request
                .header("content-type")
                .map(|h| h.value.clone())
                .unwrap_or_default(),
            text: Some(request.body.clone()),
        })
    };

    let har = Har {
        log: HarLog {
            version: Some("1.2".to_string()),
            creator: Some(HarCreator {
                name: APP_NAME.to_string(),
                version: APP_VERSION.to_string(),
            }),
            entries: vec![HarEntry {
                request: HarRequest {
                    method: request.method.as_str().to_string(),
                    url: request.url.clone(),
                    http_version: Some("HTTP/1.1".to_string()),
                    headers: request
                        .enabled_headers()
                        .map(|h| HarHeader {
                            name: h.key.clone(),
                            value: h.value.clone(),
                        })
                        .collect(),
                    post_data,
                },
            }],
        },
    };

    serde_json::to_string_pretty(&har).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPTURE: &str = r#"{
  "log": {
    "version": "1.2",
    "entries": [
      {
        "startedDateTime": "2024-01-01T00:00:00.000Z",
        "request": {
          "method": "POST",
          "url": "https://api.example.com/search",
          "httpVersion": "h2",
          "headers": [
            {"name": ":authority", "value": "api.example.com"},
            {"name": "content-type", "value": "application/json"},
            {"name": "x-id", "value": "1"},
            {"name": "X-Id", "value": "2"}
          ],
          "queryString": [],
          "cookies": [],
          "postData": {"mimeType": "application/json", "text": "{\"q\":\"curl\"}"}
        },
        "response": {"status": 200}
      },
      {
        "request": {"method": "GET", "url": "https://api.example.com/other", "headers": []}
      }
    ]
  }
}"#;

    #[test]
    fn test_first_entry_is_imported() {
        let imported = from_capture(try_capture(CAPTURE).unwrap()).unwrap();
        let req = &imported.request;
        assert_eq!(req.method, HttpMethod::POST);
        assert_eq!(req.url, "https://api.example.com/search");
        let keys: Vec<&str> = req.headers.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["content-type", "x-id", "X-Id"]);
        assert_eq!(req.body, r#"{"q":"curl"}"#);
        assert_eq!(imported.warnings.len(), 1);
    }

    #[test]
    fn test_missing_post_data_means_empty_body() {
        let input = r#"{"log":{"entries":[{"request":{"method":"GET","url":"https://a","headers":[]}}]}}"#;
        let imported = parse_har(input).unwrap();
        assert_eq!(imported.request.body, "");
        assert!(imported.warnings.is_empty());
    }

    #[test]
    fn test_rejections_fall_through() {
        assert!(try_capture("not json").is_none());
        assert!(try_capture(r#"{"log":{"entries":[]}}"#).is_none());
        assert!(try_capture(r#"{"something":"else"}"#).is_none());
        assert!(try_capture("[1, 2]").is_none());
    }

    #[test]
    fn test_empty_url_is_a_parse_failure() {
        let input = r#"{"log":{"entries":[{"request":{"method":"GET","url":""}}]}}"#;
        let err = parse_har(input).unwrap_err();
        assert!(matches!(err, ImportError::Parse { field: "url", .. }));
    }

    #[test]
    fn test_to_har_round_trip() {
        let mut request = Request::new(HttpMethod::PUT, "https://a/b");
        request.headers.push(Header::new("Content-Type", "text/plain"));
        request.body = "hello".into();
        let exported = to_har(&request);
        assert!(exported.contains("\"mimeType\": \"text/plain\""));
        assert_eq!(parse_har(&exported).unwrap().request, request);
    }
}
