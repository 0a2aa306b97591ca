//! Route table and request dispatch
//!
//! Routes are matched on exact method and exact path (query string
//! ignored). The first registration wins when a (method, path) pair is
//! registered twice. POST bodies are read to the end before the handler
//! runs; there is no size limit.

use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::{Method, Request};
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

use super::request::IncomingRequest;
use crate::http::{self, HttpResponse};
use crate::logger;

/// Boxed future returned by a [`Handler`]
pub type HandlerFuture = Pin<Box<dyn Future<Output = HttpResponse> + Send>>;

/// Something that turns a buffered request into a response
///
/// Implemented for every `Fn(IncomingRequest) -> impl Future<Output = HttpResponse>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: IncomingRequest) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(IncomingRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    fn call(&self, req: IncomingRequest) -> HandlerFuture {
        Box::pin(self(req))
    }
}

/// Methods a route can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
}

impl RouteMethod {
    /// Map an HTTP method; anything but GET and POST has no routes
    pub fn from_http(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Self::Get),
            Method::POST => Some(Self::Post),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registration in the route table
pub struct Route {
    pub method: RouteMethod,
    pub path: String,
    handler: Box<dyn Handler>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Ordered route table
///
/// Built once at startup and handed to the server; tests build a fresh
/// one per case.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Duplicates are accepted but never reached.
    pub fn register(
        &mut self,
        method: RouteMethod,
        path: impl Into<String>,
        handler: impl Handler,
    ) -> &mut Self {
        let path = path.into();
        if self.find(method, &path).is_some() {
            logger::log_warning(&format!(
                "Route {method} {path} is already registered, the new handler is unreachable"
            ));
        }
        self.routes.push(Route {
            method,
            path,
            handler: Box::new(handler),
        });
        self
    }

    pub fn get(&mut self, path: impl Into<String>, handler: impl Handler) -> &mut Self {
        self.register(RouteMethod::Get, path, handler)
    }

    pub fn post(&mut self, path: impl Into<String>, handler: impl Handler) -> &mut Self {
        self.register(RouteMethod::Post, path, handler)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// First route registered for exactly this method and path
    pub fn find(&self, method: RouteMethod, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.method == method && route.path == path)
    }

    /// Dispatch a request to its route, or answer 404
    pub async fn handle<B>(&self, req: Request<B>, remote_addr: Option<SocketAddr>) -> HttpResponse
    where
        B: Body,
        B::Error: fmt::Display,
    {
        let route = RouteMethod::from_http(req.method())
            .and_then(|method| self.find(method, req.uri().path()));
        let Some(route) = route else {
            logger::log_debug(&format!("No route for {} {}", req.method(), req.uri().path()));
            return http::build_404_response();
        };

        let (parts, body) = req.into_parts();
        let body = match route.method {
            RouteMethod::Post => match body.collect().await {
                Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
                Err(e) => {
                    logger::log_error(&format!(
                        "Failed to read request body for {} {}: {e}",
                        parts.method,
                        parts.uri.path()
                    ));
                    return http::build_400_response();
                }
            },
            RouteMethod::Get => String::new(),
        };

        route
            .handler
            .call(IncomingRequest {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body,
                remote_addr,
            })
            .await
    }
}
