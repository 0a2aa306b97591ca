//! mirror-lab
//!
//! An httpbin-style echo server used as a target for test suites:
//! `POST /post` mirrors the request back as JSON, with a static form
//! page, a health check and a root greeting alongside. The `probe`
//! module is a small client that smoke-checks a running instance.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod probe;
pub mod routing;
pub mod server;
