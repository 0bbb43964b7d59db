//! End-to-end import -> render scenarios, through the public API only

use serde_json::json;

use recapture::tree::{render, JsonNode, TreeNode};
use recapture::{export, import, Format, Header, HttpMethod, ImportError, Request};

#[test]
fn test_scenario_a_curl() {
    let imported = import(
        r#"curl https://api.example.com/users -X POST -H "Content-Type: application/json" --data '{"a":1}'"#,
    )
    .unwrap();

    assert_eq!(imported.format, Format::Curl);
    assert!(imported.warnings.is_empty());
    let mut expected = Request::new(HttpMethod::POST, "https://api.example.com/users");
    expected.headers.push(Header::new("Content-Type", "application/json"));
    expected.body = r#"{"a":1}"#.into();
    assert_eq!(imported.request, expected);
}

#[test]
fn test_scenario_b_fetch() {
    let imported =
        import(r#"fetch('https://x/y', {method:'PUT', headers:{'X-Token':'abc'}, body:'"z"'})"#).unwrap();

    assert_eq!(imported.format, Format::Fetch);
    let request = imported.request;
    assert_eq!(request.method, HttpMethod::PUT);
    assert_eq!(request.url, "https://x/y");
    assert_eq!(request.headers, vec![Header::new("X-Token", "abc")]);
    assert_eq!(request.body, r#""z""#);
}

#[test]
fn test_scenario_c_empty_capture_is_unrecognized() {
    let err = import(r#"{"log": {"version": "1.2", "entries": []}}"#).unwrap_err();
    assert_eq!(err, ImportError::Unrecognized);
}

#[test]
fn test_scenario_d_tree_shape() {
    let node = JsonNode::parse(r#"{"a":[1,2,{"b":null}]}"#).unwrap();
    let tree = render(&node);

    let rows = tree.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label.as_deref(), Some("a"));

    let items = rows[0].value.rows();
    assert_eq!(items.len(), 3);
    let inner = items[2].value.rows();
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].label.as_deref(), Some("b"));
    assert_eq!(inner[0].value, TreeNode::Leaf("null".into()));
}

#[test]
fn test_capture_mentioning_curl_is_still_har() {
    let capture = json!({
        "log": {
            "entries": [{
                "request": {
                    "method": "POST",
                    "url": "https://api.example.com/run",
                    "headers": [{"name": "User-Agent", "value": "curl/8.4.0"}],
                    "postData": {"mimeType": "text/plain", "text": "curl https://evil; fetch('x')"}
                }
            }]
        }
    })
    .to_string();

    let imported = import(&capture).unwrap();
    assert_eq!(imported.format, Format::Har);
    assert_eq!(imported.request.url, "https://api.example.com/run");
    assert_eq!(imported.request.body, "curl https://evil; fetch('x')");
}

#[test]
fn test_header_count_and_order_follow_the_command() {
    let imported = import(
        "curl -X PATCH 'https://a.example/v1' -H 'B: 2' -H 'A: 1' -H 'b: 3' --data-raw 'x=1&y=\"2\"'",
    )
    .unwrap();
    let keys: Vec<(&str, &str)> = imported
        .request
        .headers
        .iter()
        .map(|h| (h.key.as_str(), h.value.as_str()))
        .collect();
    assert_eq!(keys, vec![("B", "2"), ("A", "1"), ("b", "3")]);
    assert_eq!(imported.request.body, "x=1&y=\"2\"");
}

#[test]
fn test_export_then_import_is_stable_for_every_notation() {
    let mut request = Request::new(HttpMethod::DELETE, "https://api.example.com/items/1?force=true");
    request.headers.push(Header::new("Authorization", "Bearer it's-a-token"));
    request.headers.push(Header::new("X-Json", r#"{"k":"v"}"#));
    request.body = "line one\nline 'two'\t\"three\"".into();

    for format in [Format::Curl, Format::Fetch, Format::Har] {
        let text = export(&request, format);
        let imported = import(&text).unwrap();
        assert_eq!(imported.format, format, "{}", text);
        assert_eq!(imported.request, request, "{}", text);
    }
}

#[test]
fn test_canonical_json_shape() {
    let imported = import("curl https://a.example -H 'Accept: */*'").unwrap();
    let value = serde_json::to_value(&imported.request).unwrap();
    assert_eq!(
        value,
        json!({
            "method": "GET",
            "url": "https://a.example",
            "headers": [{"key": "Accept", "value": "*/*"}],
            "body": ""
        })
    );
}

#[test]
fn test_garbage_names_every_notation() {
    let message = import("GET / HTTP/1.1").unwrap_err().to_string();
    for notation in ["HAR", "curl", "fetch"] {
        assert!(message.contains(notation), "{}", message);
    }
}
