//! HTTP protocol layer module
//!
//! Response builders and request-data decoding, independent of routing.

pub mod form;
pub mod response;

// Re-export commonly used types
pub use form::{MultiMap, SingleMap};
pub use response::{
    build_400_response, build_404_response, build_html_response, build_json_response,
    build_text_response, HttpResponse,
};
