use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vellum_render::CompositionLayout;
use vellum_store::SyncMode;

use crate::error::{ServerError, ServerResult};

/// Server configuration, loadable from TOML. Every field is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Segment file of the durable version log.
    pub store_path: PathBuf,
    /// Bound on every version log call.
    pub backend_timeout_ms: u64,
    /// How long a composed page stays fresh.
    pub page_ttl_secs: u64,
    /// `s-maxage` on raw artifact responses.
    pub file_cache_max_age_secs: u64,
    pub sync: SyncMode,
    pub layout: CompositionLayout,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            store_path: PathBuf::from("vellum.log"),
            backend_timeout_ms: 5_000,
            page_ttl_secs: 60,
            file_cache_max_age_secs: 60,
            sync: SyncMode::default(),
            layout: CompositionLayout::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    pub fn page_ttl(&self) -> Duration {
        Duration::from_secs(self.page_ttl_secs)
    }

    pub fn file_max_age(&self) -> Duration {
        Duration::from_secs(self.file_cache_max_age_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.backend_timeout(), Duration::from_secs(5));
        assert_eq!(c.page_ttl(), Duration::from_secs(60));
        assert_eq!(c.file_max_age(), Duration::from_secs(60));
        assert_eq!(c.sync, SyncMode::OsDefault);
        assert_eq!(c.layout.primary, "index.html");
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(ServerConfig::from_toml_str("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn partial_file_overrides_named_fields() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:8080"
            page_ttl_secs = 5
            sync = "every-write"

            [layout]
            vector_width = 120
            "#,
        )
        .unwrap();

        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.page_ttl(), Duration::from_secs(5));
        assert_eq!(c.sync, SyncMode::EveryWrite);
        assert_eq!(c.layout.vector_width, 120);
        assert_eq!(c.layout.primary, "index.html");
        assert_eq!(c.store_path, PathBuf::from("vellum.log"));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = ServerConfig::from_toml_str("page_ttl_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ServerError::Config(msg) if msg.contains("absent.toml")));
    }
}
