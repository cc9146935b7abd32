use crate::routes::{html_response, HttpResponse};

const INDEX_HTML: &str = include_str!("../assets/index.html");

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub fn handle_get() -> HttpResponse {
    html_response(INDEX_HTML)
}
