//! Mirror endpoint (`POST /post`)
//!
//! Echoes the request back as JSON in the httpbin shape: query arguments,
//! normalized headers, the raw body and, depending on `Content-Type`,
//! either the decoded form or the parsed JSON document.

use hyper::header::CONTENT_TYPE;
use hyper::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::http::{self, form, HttpResponse, MultiMap, SingleMap};
use crate::logger;
use crate::routing::IncomingRequest;

const JSON_MARKER: &str = "application/json";
const FORM_MARKER: &str = "application/x-www-form-urlencoded";

/// Body of a `POST /post` response
#[derive(Debug, Clone, Serialize)]
pub struct MirrorResponse {
    /// Query parameters, last value wins
    pub args: SingleMap,
    /// Raw body text, whatever the content type
    pub data: String,
    /// Multipart uploads are not decoded; always empty
    pub files: MultiMap,
    pub form: MultiMap,
    pub headers: MultiMap,
    pub json: Option<Value>,
    pub method: String,
    pub origin: String,
    pub url: String,
}

/// How the body is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    Raw,
}

impl BodyKind {
    /// Classify by substring, so `application/json; charset=utf-8` is JSON.
    /// Matching is case-sensitive.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.contains(JSON_MARKER) => Self::Json,
            Some(ct) if ct.contains(FORM_MARKER) => Self::Form,
            _ => Self::Raw,
        }
    }
}

/// Describe a buffered request
pub fn mirror(req: &IncomingRequest) -> MirrorResponse {
    let content_type = req
        .headers
        .get(CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()));

    let mut form_fields = MultiMap::new();
    let mut json = None;
    match BodyKind::from_content_type(content_type.as_deref()) {
        BodyKind::Json => {
            json = serde_json::from_str::<Value>(&req.body)
                .map_err(|e| logger::log_debug(&format!("Ignoring invalid JSON body: {e}")))
                .ok();
        }
        BodyKind::Form => form_fields = form::parse_form(&req.body),
        BodyKind::Raw => {}
    }

    MirrorResponse {
        args: form::parse_args(req.query()),
        data: req.body.clone(),
        files: MultiMap::new(),
        form: form_fields,
        headers: form::normalize_headers(&req.headers),
        json,
        method: req.method.to_string(),
        origin: req
            .remote_addr
            .map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string()),
        url: reconstruct_url(req),
    }
}

/// Absolute URL of the request, using the Host header for the authority
fn reconstruct_url(req: &IncomingRequest) -> String {
    if req.uri.scheme().is_some() && req.uri.authority().is_some() {
        return req.uri.to_string();
    }
    let host = req.header("host").unwrap_or("localhost");
    let path_and_query = req.uri.path_and_query().map_or("/", |pq| pq.as_str());
    format!("http://{host}{path_and_query}")
}

pub async fn handle_post(req: IncomingRequest) -> HttpResponse {
    http::build_json_response(StatusCode::OK, &mirror(&req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;
    use hyper::{HeaderMap, Method, Uri};
    use std::net::SocketAddr;

    fn post(uri: &str, content_type: Option<&'static str>, body: &str) -> IncomingRequest {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("localhost:3000"));
        if let Some(ct) = content_type {
            headers.insert("content-type", HeaderValue::from_static(ct));
        }
        IncomingRequest {
            method: Method::POST,
            uri: uri.parse::<Uri>().unwrap(),
            headers,
            body: body.to_string(),
            remote_addr: Some("192.168.0.9:61000".parse::<SocketAddr>().unwrap()),
        }
    }

    fn as_json(resp: &MirrorResponse) -> Value {
        serde_json::to_value(resp).unwrap()
    }

    #[test]
    fn test_content_type_detection() {
        assert_eq!(BodyKind::from_content_type(Some("application/json")), BodyKind::Json);
        assert_eq!(
            BodyKind::from_content_type(Some("application/json; charset=utf-8")),
            BodyKind::Json
        );
        assert_eq!(
            BodyKind::from_content_type(Some("application/x-www-form-urlencoded; charset=UTF-8")),
            BodyKind::Form
        );
        assert_eq!(BodyKind::from_content_type(Some("text/plain")), BodyKind::Raw);
        assert_eq!(BodyKind::from_content_type(Some("Application/JSON")), BodyKind::Raw);
        assert_eq!(BodyKind::from_content_type(None), BodyKind::Raw);
    }

    #[test]
    fn test_form_body() {
        let req = post(
            "/post",
            Some("application/x-www-form-urlencoded"),
            "custname=John+Doe&topping=bacon&topping=cheese",
        );
        let value = as_json(&mirror(&req));

        assert_eq!(value["form"]["custname"], serde_json::json!(["John Doe"]));
        assert_eq!(value["form"]["topping"], serde_json::json!(["bacon", "cheese"]));
        assert_eq!(value["json"], Value::Null);
        assert_eq!(value["data"], "custname=John+Doe&topping=bacon&topping=cheese");
    }

    #[test]
    fn test_json_body() {
        let req = post("/post", Some("application/json"), r#"{"name":"Jane"}"#);
        let value = as_json(&mirror(&req));

        assert_eq!(value["json"]["name"], "Jane");
        assert_eq!(value["form"], serde_json::json!({}));
        assert_eq!(value["data"], r#"{"name":"Jane"}"#);
    }

    #[test]
    fn test_malformed_json_degrades_to_null() {
        let raw = r#"{"invalid": json}"#;
        let req = post("/post", Some("application/json"), raw);
        let value = as_json(&mirror(&req));

        assert_eq!(value["json"], Value::Null);
        assert_eq!(value["data"], raw);
        assert_eq!(value["form"], serde_json::json!({}));
    }

    #[test]
    fn test_empty_json_body_is_null() {
        let value = as_json(&mirror(&post("/post", Some("application/json"), "")));
        assert_eq!(value["json"], Value::Null);
        assert_eq!(value["data"], "");
    }

    #[test]
    fn test_other_content_type_is_raw() {
        let value = as_json(&mirror(&post("/post", Some("text/plain"), "a=1&b=2")));
        assert_eq!(value["form"], serde_json::json!({}));
        assert_eq!(value["json"], Value::Null);
        assert_eq!(value["data"], "a=1&b=2");

        let value = as_json(&mirror(&post("/post", None, "a=1")));
        assert_eq!(value["form"], serde_json::json!({}));
    }

    #[test]
    fn test_args_and_url() {
        let req = post("/post?x=1&y=two&x=3", None, "");
        let value = as_json(&mirror(&req));

        assert_eq!(value["args"], serde_json::json!({"x": "3", "y": "two"}));
        assert_eq!(value["url"], "http://localhost:3000/post?x=1&y=two&x=3");
        assert_eq!(value["method"], "POST");
        assert_eq!(value["origin"], "192.168.0.9");
    }

    #[test]
    fn test_headers_are_capitalized_lists() {
        let req = post("/post", Some("application/json"), "{}");
        let value = as_json(&mirror(&req));

        assert_eq!(value["headers"]["Host"], serde_json::json!(["localhost:3000"]));
        assert_eq!(
            value["headers"]["Content-type"],
            serde_json::json!(["application/json"])
        );
        assert!(value["headers"].get("content-type").is_none());
    }

    #[test]
    fn test_files_always_empty_and_origin_fallback() {
        let mut req = post("/post", Some("multipart/form-data; boundary=x"), "--x--");
        req.remote_addr = None;
        let value = as_json(&mirror(&req));

        assert_eq!(value["files"], serde_json::json!({}));
        assert_eq!(value["origin"], "unknown");
    }

    #[test]
    fn test_missing_host_and_absolute_uri() {
        let mut req = post("/post", None, "");
        req.headers.remove("host");
        assert_eq!(mirror(&req).url, "http://localhost/post");

        let req = post("http://example.test:8080/post?q=1", None, "");
        assert_eq!(mirror(&req).url, "http://example.test:8080/post?q=1");
    }

    #[test]
    fn test_same_request_same_response() {
        let req = post("/post?a=1", Some("application/json"), r#"{"k":[1,2]}"#);
        assert_eq!(as_json(&mirror(&req)), as_json(&mirror(&req)));
    }

    #[test]
    fn test_field_order() {
        let json = serde_json::to_string(&mirror(&post("/post", None, ""))).unwrap();
        let fields = [
            "args", "data", "files", "form", "headers", "json", "method", "origin", "url",
        ];
        let order: Vec<usize> = fields
            .iter()
            .map(|field| format!("\"{field}\":"))
            .map(|key| json.find(&key).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }
}
