//! Static pages
//!
//! The root greeting and the HTML form that posts to the mirror endpoint.

use crate::http::{self, HttpResponse};
use crate::logger;
use std::path::Path;
use tokio::fs;

pub const ROOT_BODY: &str = "Hello World!";

/// `GET /`
pub fn serve_root() -> HttpResponse {
    http::build_html_response(ROOT_BODY, "text/html")
}

/// `GET /forms/post`: any read failure is reported as 404
pub async fn serve_form_page(file_path: &Path) -> HttpResponse {
    match fs::read(file_path).await {
        Ok(content) => http::build_html_response(content, "text/html; charset=utf-8"),
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to read form page '{}': {e}",
                file_path.display()
            ));
            http::build_404_response()
        }
    }
}
