//! Smoke checks against a running mirror server
//!
//! Used by the `mirror-probe` binary and by end-to-end tests. The target
//! comes from `MIRROR_BASE_URL`, which must be set before anything
//! touches the network.

mod client;
pub mod fallback;

use std::fmt;

use hyper::StatusCode;

pub use client::{ProbeClient, ProbeResponse};
pub use fallback::{first_available, Attempt, FallbackError};

/// Environment variable naming the server to probe
pub const BASE_URL_VAR: &str = "MIRROR_BASE_URL";

/// Paths where the sample form page may live, most likely first
pub const FORM_PAGE_CANDIDATES: [&str; 2] = ["/forms/post", "/forms/post.html"];

#[derive(Debug)]
pub enum ProbeError {
    /// A required environment variable is unset or blank
    MissingEnv(String),
    InvalidBaseUrl(String),
    Request(hyper_util::client::legacy::Error),
    Body(hyper::Error),
    Json(serde_json::Error),
    UnexpectedStatus { path: String, status: StatusCode },
    UnexpectedBody { path: String, detail: String },
    NotFound(FallbackError<Box<ProbeError>>),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEnv(name) => {
                write!(f, "Environment variable {name} is required but not set")
            }
            Self::InvalidBaseUrl(detail) => write!(f, "Invalid base URL {detail}"),
            Self::Request(e) => write!(f, "Request failed: {e}"),
            Self::Body(e) => write!(f, "Failed to read response body: {e}"),
            Self::Json(e) => write!(f, "Response is not valid JSON: {e}"),
            Self::UnexpectedStatus { path, status } => {
                write!(f, "{path} answered {status}")
            }
            Self::UnexpectedBody { path, detail } => write!(f, "{path}: {detail}"),
            Self::NotFound(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(e) => Some(e),
            Self::Body(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::NotFound(e) => Some(e),
            _ => None,
        }
    }
}

/// Read a required environment variable, failing with its name if absent
pub fn require_env(name: &str) -> Result<String, ProbeError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ProbeError::MissingEnv(name.to_string()))
}

/// Result of one smoke check
#[derive(Debug)]
pub struct CheckOutcome {
    pub name: &'static str,
    /// Short description on success
    pub result: Result<String, ProbeError>,
}

impl CheckOutcome {
    pub const fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run every check once, in order, without stopping on failures
pub async fn run_smoke_checks(client: &ProbeClient) -> Vec<CheckOutcome> {
    vec![
        CheckOutcome {
            name: "health",
            result: check_health(client).await,
        },
        CheckOutcome {
            name: "form page",
            result: check_form_page(client).await,
        },
        CheckOutcome {
            name: "mirror form body",
            result: check_mirror_form(client).await,
        },
        CheckOutcome {
            name: "mirror json body",
            result: check_mirror_json(client).await,
        },
        CheckOutcome {
            name: "unknown route",
            result: check_not_found(client).await,
        },
    ]
}

fn expect_status(path: &str, resp: &ProbeResponse, expected: StatusCode) -> Result<(), ProbeError> {
    if resp.status == expected {
        Ok(())
    } else {
        Err(ProbeError::UnexpectedStatus {
            path: path.to_string(),
            status: resp.status,
        })
    }
}

fn expect_json(path: &str, resp: &ProbeResponse) -> Result<serde_json::Value, ProbeError> {
    match resp.content_type.as_deref() {
        Some(ct) if ct.starts_with("application/json") => resp.json(),
        other => Err(unexpected(
            path,
            format!("content type is {}", other.unwrap_or("missing")),
        )),
    }
}

fn unexpected(path: &str, detail: impl Into<String>) -> ProbeError {
    ProbeError::UnexpectedBody {
        path: path.to_string(),
        detail: detail.into(),
    }
}

async fn check_health(client: &ProbeClient) -> Result<String, ProbeError> {
    let path = "/health";
    let resp = client.get(path).await?;
    expect_status(path, &resp, StatusCode::OK)?;

    let value = expect_json(path, &resp)?;
    if value["status"] != "healthy" {
        return Err(unexpected(path, format!("status is {}", value["status"])));
    }
    match value["uptime"].as_f64() {
        Some(uptime) if uptime >= 0.0 => Ok(format!(
            "healthy, uptime {uptime:.1}s, environment {}",
            value["environment"]
        )),
        _ => Err(unexpected(path, "uptime is missing or negative")),
    }
}

async fn check_form_page(client: &ProbeClient) -> Result<String, ProbeError> {
    let found = first_available(&FORM_PAGE_CANDIDATES, |path: &&str| async move {
        match client.get(path).await {
            Ok(resp) if resp.status == StatusCode::OK => Ok(Attempt::Found(resp.body.len())),
            Ok(resp) if resp.status == StatusCode::NOT_FOUND => Ok(Attempt::Missing),
            Ok(resp) => Err(Box::new(ProbeError::UnexpectedStatus {
                path: (*path).to_string(),
                status: resp.status,
            })),
            Err(e) => Err(Box::new(e)),
        }
    })
    .await;

    match found {
        Ok((path, size)) => Ok(format!("{path} served {size} bytes")),
        Err(e) => Err(ProbeError::NotFound(e)),
    }
}

async fn check_mirror_form(client: &ProbeClient) -> Result<String, ProbeError> {
    let path = "/post";
    let resp = client
        .post(
            path,
            "application/x-www-form-urlencoded",
            "custname=John+Doe&topping=bacon&topping=cheese",
        )
        .await?;
    expect_status(path, &resp, StatusCode::OK)?;

    let value = expect_json(path, &resp)?;
    if value["form"]["custname"] != serde_json::json!(["John Doe"])
        || value["form"]["topping"] != serde_json::json!(["bacon", "cheese"])
    {
        return Err(unexpected(path, format!("form echoed as {}", value["form"])));
    }
    if !value["json"].is_null() {
        return Err(unexpected(path, "json should be null for a form body"));
    }
    Ok("form fields echoed".to_string())
}

async fn check_mirror_json(client: &ProbeClient) -> Result<String, ProbeError> {
    let path = "/post";
    let resp = client
        .post(path, "application/json", r#"{"name":"Jane"}"#)
        .await?;
    expect_status(path, &resp, StatusCode::OK)?;

    let value = expect_json(path, &resp)?;
    if value["json"]["name"] != "Jane" {
        return Err(unexpected(path, format!("json echoed as {}", value["json"])));
    }
    if value["form"] != serde_json::json!({}) {
        return Err(unexpected(path, "form should be empty for a JSON body"));
    }
    Ok("json document echoed".to_string())
}

async fn check_not_found(client: &ProbeClient) -> Result<String, ProbeError> {
    let path = "/nonexistent";
    let resp = client.get(path).await?;
    expect_status(path, &resp, StatusCode::NOT_FOUND)?;
    if resp.text() != "Not Found" {
        return Err(unexpected(path, format!("body was {:?}", resp.text())));
    }
    Ok("404 Not Found".to_string())
}
