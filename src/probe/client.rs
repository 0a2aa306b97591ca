//! Minimal HTTP client for probing a running mirror server

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use super::ProbeError;

/// Status and fully read body of one probe request
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl ProbeResponse {
    pub fn json(&self) -> Result<serde_json::Value, ProbeError> {
        serde_json::from_slice(&self.body).map_err(ProbeError::Json)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Plain-HTTP client bound to one base URL
#[derive(Debug, Clone)]
pub struct ProbeClient {
    base_url: String,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl ProbeClient {
    /// `base_url` must be an absolute `http://` URL, e.g. `http://127.0.0.1:3000`
    pub fn new(base_url: &str) -> Result<Self, ProbeError> {
        let uri: Uri = base_url
            .parse()
            .map_err(|e| ProbeError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if uri.scheme_str() != Some("http") || uri.authority().is_none() {
            return Err(ProbeError::InvalidBaseUrl(format!(
                "{base_url}: expected http://host[:port]"
            )));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder(TokioExecutor::new()).build_http(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str) -> Result<ProbeResponse, ProbeError> {
        self.send(Method::GET, path, None, Bytes::new()).await
    }

    pub async fn post(
        &self,
        path: &str,
        content_type: &str,
        body: &'static str,
    ) -> Result<ProbeResponse, ProbeError> {
        self.send(Method::POST, path, Some(content_type), Bytes::from_static(body.as_bytes()))
            .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<ProbeResponse, ProbeError> {
        let uri = format!("{}{path}", self.base_url);
        let mut builder = Request::builder()
            .method(method)
            .uri(uri.as_str())
            .header("user-agent", concat!("mirror-probe/", env!("CARGO_PKG_VERSION")));
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let request = builder
            .body(Full::new(body))
            .map_err(|e| ProbeError::InvalidBaseUrl(format!("{uri}: {e}")))?;

        let response = self.client.request(request).await.map_err(ProbeError::Request)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(ProbeError::Body)?
            .to_bytes();

        Ok(ProbeResponse {
            status,
            content_type,
            body,
        })
    }
}
