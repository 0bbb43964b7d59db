//! HTTP client wrapper - executes requests and captures responses

use std::time::Instant;

use reqwest::header::{HeaderName, HeaderValue};

use crate::config::Config;
use crate::error::TransportError;
use crate::models::{Request, Response};

/// Build a reqwest request from the canonical one.
///
/// Headers are appended in order, so duplicates survive and anything the
/// client would add by default is overridden by the caller's value.
fn build_request(
    client: &reqwest::Client,
    request: &Request,
) -> Result<reqwest::RequestBuilder, String> {
    let url = reqwest::Url::parse(request.url.trim()).map_err(|e| format!("invalid URL '{}': {}", request.url, e))?;
    let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
        .map_err(|_| format!("invalid method '{}'", request.method))?;

    let mut req_builder = client.request(method, url);

    for header in request.enabled_headers() {
        let name = HeaderName::from_bytes(header.key.as_bytes())
            .map_err(|_| format!("invalid header name '{}'", header.key))?;
        // Raw bytes so UTF-8 (obs-text) values go out as given
        let value = HeaderValue::from_bytes(header.value.as_bytes())
            .map_err(|_| format!("invalid value for header '{}'", header.key))?;
        req_builder = req_builder.header(name, value);
    }

    // GET and HEAD go out without a body whatever the model holds
    if let Some(body) = request.body_to_send() {
        req_builder = req_builder.body(body.to_string());
    }

    Ok(req_builder)
}

/// Execute an HTTP request and return the response.
///
/// Any status the server answers with is a `Response`; only failures to
/// reach it or to read its answer are errors.
pub async fn execute_request(
    client: &reqwest::Client,
    request: &Request,
) -> Result<Response, TransportError> {
    let start = Instant::now();
    let elapsed = || start.elapsed().as_millis() as u64;

    let req_builder = build_request(client, request).map_err(|message| TransportError::InvalidRequest {
        message,
        time_ms: elapsed(),
    })?;

    let resp = req_builder
        .send()
        .await
        .map_err(|e| TransportError::from_reqwest(&e, elapsed()))?;

    let status = resp.status();
    let headers = resp
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();

    let body_text = resp
        .text()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { time_ms: elapsed() }
            } else {
                TransportError::Body {
                    message: e.to_string(),
                    time_ms: elapsed(),
                }
            }
        })?;

    Ok(Response {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        headers,
        body_text,
        duration_ms: elapsed(),
    })
}

/// Create an HTTP client from configuration
pub fn create_client(config: &Config) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);

    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(agent) = &config.user_agent {
        builder = builder.user_agent(agent.clone());
    }

    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Falling back to default HTTP client");
        reqwest::Client::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Header, HttpMethod};

    #[test]
    fn test_invalid_inputs_are_rejected_before_sending() {
        let client = reqwest::Client::new();

        let request = Request::new(HttpMethod::GET, "not a url");
        assert!(build_request(&client, &request).unwrap_err().contains("invalid URL"));

        let mut request = Request::new(HttpMethod::GET, "https://example.com");
        request.headers.push(Header::new("Bad Name", "x"));
        assert!(build_request(&client, &request).unwrap_err().contains("Bad Name"));

        let mut request = Request::new(HttpMethod::GET, "https://example.com");
        request.headers.push(Header::new("X-Split", "a\r\nb"));
        assert!(build_request(&client, &request).unwrap_err().contains("X-Split"));
    }

    #[test]
    fn test_non_ascii_header_value_is_sent_as_bytes() {
        let client = reqwest::Client::new();
        let mut request = Request::new(HttpMethod::GET, "https://example.com");
        request.headers.push(Header::new("X-Name", "Zoë 😀"));

        let built = build_request(&client, &request).unwrap().build().unwrap();
        let value = built.headers().get("x-name").unwrap();
        assert_eq!(value.as_bytes(), "Zoë 😀".as_bytes());
    }

    #[test]
    fn test_get_body_is_not_attached() {
        let client = reqwest::Client::new();
        let mut request = Request::new(HttpMethod::GET, "https://example.com");
        request.body = "ignored".into();
        let built = build_request(&client, &request).unwrap().build().unwrap();
        assert!(built.body().is_none());

        request.method = HttpMethod::POST;
        let built = build_request(&client, &request).unwrap().build().unwrap();
        assert_eq!(built.body().and_then(|b| b.as_bytes()), Some("ignored".as_bytes()));
    }

    #[test]
    fn test_duplicate_headers_are_kept_in_order() {
        let client = reqwest::Client::new();
        let mut request = Request::new(HttpMethod::GET, "https://example.com");
        request.headers.push(Header::new("X-Dup", "1"));
        request.headers.push(Header::new("x-dup", "2"));
        let mut off = Header::new("X-Off", "1");
        off.enabled = false;
        request.headers.push(off);

        let built = build_request(&client, &request).unwrap().build().unwrap();
        let values: Vec<&str> = built
            .headers()
            .get_all("x-dup")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["1", "2"]);
        assert!(built.headers().get("x-off").is_none());
    }
}
