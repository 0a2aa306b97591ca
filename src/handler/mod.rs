//! Request handler module
//!
//! Route handlers and the default route table:
//!
//! | Method | Path          | Handler                          |
//! |--------|---------------|----------------------------------|
//! | GET    | `/`           | [`static_files::serve_root`]      |
//! | GET    | `/forms/post` | [`static_files::serve_form_page`] |
//! | POST   | `/post`       | [`mirror::handle_post`]           |
//! | GET    | `/health`     | [`health::handle_health`]         |

pub mod health;
pub mod mirror;
pub mod static_files;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppState;
use crate::routing::{IncomingRequest, Router};

/// Build the route table served by the mirror server
pub fn build_router(state: &Arc<AppState>) -> Router {
    let form_page = Arc::new(PathBuf::from(&state.config.site.forms_post_file));
    let health_state = Arc::clone(state);

    let mut router = Router::new();
    router
        .get("/", |_req: IncomingRequest| async { static_files::serve_root() })
        .get("/forms/post", move |_req: IncomingRequest| {
            let form_page = Arc::clone(&form_page);
            async move { static_files::serve_form_page(&form_page).await }
        })
        .post("/post", mirror::handle_post)
        .get("/health", move |_req: IncomingRequest| {
            let state = Arc::clone(&health_state);
            async move { health::handle_health(&state) }
        });
    router
}
