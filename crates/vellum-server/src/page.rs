//! The composed page: `GET /`.

use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::response::{Html, IntoResponse, Response};
use vellum_render::ComposedPage;

use crate::error::ServerResult;
use crate::state::AppState;

/// Escape text for use inside an HTML element or quoted attribute.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap composed markup in a full document with a "Last updated" badge.
pub fn document(page: &ComposedPage) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n",
            "<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<title>{title}</title>\n",
            "</head>\n",
            "<body>\n",
            "<div style=\"min-height:100vh\">{markup}</div>\n",
            "<div style=\"position:fixed;bottom:10px;right:10px;",
            "background:rgba(0,0,0,0.7);color:white;padding:5px 10px;",
            "border-radius:5px;font-size:12px;z-index:1000\">",
            "Last updated: <time datetime=\"{iso}\">{display}</time></div>\n",
            "</body>\n",
            "</html>\n",
        ),
        title = escape(&page.title),
        markup = page.markup,
        iso = vellum_types::format_timestamp(&page.last_updated),
        display = page.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

pub async fn page_handler(State(state): State<AppState>) -> ServerResult<Response> {
    let page = state.cache.page().await?;
    let mut response = Html(document(&page)).into_response();
    if let Ok(v) = HeaderValue::from_str(&AppState::cache_control(state.cache.ttl())) {
        response.headers_mut().insert(CACHE_CONTROL, v);
    }
    Ok(response)
}
