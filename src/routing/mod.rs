//! Routing module
//!
//! Exact method + path routing over an explicitly built route table:
//! - `Router` owns the ordered registrations and dispatches requests
//! - `IncomingRequest` is the fully buffered request handed to handlers

mod request;
mod router;

pub use request::IncomingRequest;
pub use router::{Handler, HandlerFuture, Route, RouteMethod, Router};
