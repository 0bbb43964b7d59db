use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// HTTP Method
///
/// The common verbs get their own variant so the editor can cycle through
/// them; anything else a capture carries is kept verbatim (uppercased).
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    HEAD,
    OPTIONS,
    Other(String),
}

impl HttpMethod {
    /// Parse a method token. Returns `None` unless the token is a plain
    /// alphabetic word.
    pub fn parse(token: &str) -> Option<HttpMethod> {
        let token = token.trim();
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let method = match token.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::GET,
            "POST" => HttpMethod::POST,
            "PUT" => HttpMethod::PUT,
            "PATCH" => HttpMethod::PATCH,
            "DELETE" => HttpMethod::DELETE,
            "HEAD" => HttpMethod::HEAD,
            "OPTIONS" => HttpMethod::OPTIONS,
            other => HttpMethod::Other(other.to_string()),
        };
        Some(method)
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::Other(name) => name,
        }
    }

    pub fn next(&self) -> HttpMethod {
        match self {
            HttpMethod::GET => HttpMethod::POST,
            HttpMethod::POST => HttpMethod::PUT,
            HttpMethod::PUT => HttpMethod::PATCH,
            HttpMethod::PATCH => HttpMethod::DELETE,
            HttpMethod::DELETE => HttpMethod::HEAD,
            HttpMethod::HEAD => HttpMethod::OPTIONS,
            HttpMethod::OPTIONS | HttpMethod::Other(_) => HttpMethod::GET,
        }
    }

    /// GET and HEAD never transmit a body, whatever the model holds.
    pub fn sends_body(&self) -> bool {
        !matches!(self, HttpMethod::GET | HttpMethod::HEAD)
    }

    /// Default method for a notation that did not name one explicitly.
    pub fn implied(has_body: bool) -> HttpMethod {
        if has_body {
            HttpMethod::POST
        } else {
            HttpMethod::GET
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        HttpMethod::parse(&token)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid HTTP method: {}", token)))
    }
}

/// HTTP Header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
    /// Disabled headers stay in the editor but are not sent
    #[serde(skip_serializing, default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Header names compare case-insensitively
    pub fn is(&self, name: &str) -> bool {
        self.key.eq_ignore_ascii_case(name)
    }

    /// Parse a `Key: Value` line, splitting on the first colon only
    pub fn parse_line(line: &str) -> Option<Header> {
        let (key, value) = line.split_once(':')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(Header::new(key, value.trim()))
    }
}

/// The canonical request every import notation produces.
///
/// `body` is never absent: an empty string means "no body".
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Request {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<Header>,
    pub body: String,
}

impl Request {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Request {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// First header with the given name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.is(name))
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Body that actually goes over the wire
    pub fn body_to_send(&self) -> Option<&str> {
        if self.method.sends_body() && !self.body.is_empty() {
            Some(&self.body)
        } else {
            None
        }
    }

    /// Headers that actually go over the wire, in order
    pub fn enabled_headers(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter().filter(|h| h.enabled)
    }
}

/// Response from a replayed request. Created once per execution.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body_text: String,
    pub duration_ms: u64,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!(HttpMethod::parse("post"), Some(HttpMethod::POST));
        assert_eq!(HttpMethod::parse("PROPFIND"), Some(HttpMethod::Other("PROPFIND".into())));
        assert_eq!(HttpMethod::parse("GE T"), None);
        assert_eq!(HttpMethod::parse(""), None);
    }

    #[test]
    fn test_get_and_head_never_send_body() {
        let mut req = Request::new(HttpMethod::GET, "https://example.com");
        req.body = "payload".into();
        assert_eq!(req.body_to_send(), None);
        req.method = HttpMethod::HEAD;
        assert_eq!(req.body_to_send(), None);
        req.method = HttpMethod::DELETE;
        assert_eq!(req.body_to_send(), Some("payload"));
        assert_eq!(req.body, "payload");
    }

    #[test]
    fn test_header_line_splits_on_first_colon() {
        let h = Header::parse_line("X-Time:  12:30:00 ").unwrap();
        assert_eq!(h.key, "X-Time");
        assert_eq!(h.value, "12:30:00");
        assert!(h.is("x-time"));
        assert!(Header::parse_line("no colon here").is_none());
    }

    #[test]
    fn test_canonical_json_shape() {
        let mut req = Request::new(HttpMethod::PUT, "https://x/y");
        req.headers.push(Header::new("X-Token", "abc"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "method": "PUT",
                "url": "https://x/y",
                "headers": [{"key": "X-Token", "value": "abc"}],
                "body": ""
            })
        );
        let back: Request = serde_json::from_value(json).unwrap();
        assert_eq!(back, req);
    }
}
