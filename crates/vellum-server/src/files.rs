//! Raw artifact reads: `GET /files/{path...}`.

use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;
use vellum_store::Resolver;
use vellum_types::ArtifactVersion;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Content type for a path, by extension. Case-insensitive; anything
/// unknown is served as plain text.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "text/plain",
    }
}

/// A resolved artifact ready to be written to the wire.
#[derive(Clone, Debug)]
pub struct RawArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub etag: String,
}

impl From<ArtifactVersion> for RawArtifact {
    fn from(version: ArtifactVersion) -> Self {
        Self {
            content_type: content_type_for(version.path().as_str()),
            etag: format!("\"{}\"", version.digest().to_hex()),
            bytes: version.content().to_vec(),
        }
    }
}

/// Resolve the latest version of `path`.
pub async fn serve(resolver: &Resolver, path: &str) -> ServerResult<RawArtifact> {
    match resolver.latest_for(path).await? {
        Some(version) => Ok(version.into()),
        None => Err(ServerError::NotFound(path.to_string())),
    }
}

fn header(value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(value).ok()
}

pub async fn file_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    let artifact = serve(&state.resolver, &path).await?;
    debug!(path = %path, bytes = artifact.bytes.len(), "serving file");

    let cache_control = AppState::cache_control(state.file_max_age);
    let not_modified = headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == artifact.etag));

    let mut response = if not_modified {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        let mut response = artifact.bytes.into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(artifact.content_type));
        response
    };

    let out = response.headers_mut();
    if let Some(v) = header(&cache_control) {
        out.insert(CACHE_CONTROL, v);
    }
    if let Some(v) = header(&artifact.etag) {
        out.insert(ETAG, v);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_table() {
        let cases = [
            ("index.html", "text/html"),
            ("public/styles.css", "text/css"),
            ("app.js", "application/javascript"),
            ("data.json", "application/json"),
            ("notes.txt", "text/plain"),
            ("logo.png", "image/png"),
            ("photo.jpg", "image/jpeg"),
            ("photo.jpeg", "image/jpeg"),
            ("anim.gif", "image/gif"),
            ("public/mongodb-icon.svg", "image/svg+xml"),
        ];
        for (path, expected) in cases {
            assert_eq!(content_type_for(path), expected, "{path}");
        }
    }

    #[test]
    fn content_type_is_case_insensitive() {
        assert_eq!(content_type_for("INDEX.HTML"), "text/html");
        assert_eq!(content_type_for("Logo.SvG"), "image/svg+xml");
    }

    #[test]
    fn unknown_or_missing_extension_is_plain_text() {
        assert_eq!(content_type_for("archive.tar.zst"), "text/plain");
        assert_eq!(content_type_for("Makefile"), "text/plain");
        assert_eq!(content_type_for("v1.2/README"), "text/plain");
        assert_eq!(content_type_for("trailing."), "text/plain");
    }
}
