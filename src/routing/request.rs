//! Buffered request passed to route handlers

use hyper::{HeaderMap, Method, Uri};
use std::net::SocketAddr;

/// A request whose body, if any, has been read to the end
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    /// Request target as received (path + query, or absolute form)
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Body decoded as UTF-8 (lossy); empty for GET
    pub body: String,
    pub remote_addr: Option<SocketAddr>,
}

impl IncomingRequest {
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// First value of a header, if it is valid visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
