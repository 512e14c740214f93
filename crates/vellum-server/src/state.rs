use std::sync::Arc;
use std::time::Duration;

use vellum_render::{CompositionCache, Renderer};
use vellum_store::{Resolver, VersionReader};

use crate::config::ServerConfig;

/// Shared handler state. Cloned per request; everything inside is shared.
#[derive(Clone, Debug)]
pub struct AppState {
    pub resolver: Resolver,
    pub cache: Arc<CompositionCache>,
    pub file_max_age: Duration,
}

impl AppState {
    pub fn new(reader: Arc<dyn VersionReader>, config: &ServerConfig) -> Self {
        let resolver = Resolver::with_timeout(reader, config.backend_timeout());
        let renderer = Renderer::new(resolver.clone(), config.layout.clone());
        Self {
            resolver,
            cache: Arc::new(CompositionCache::new(renderer, config.page_ttl())),
            file_max_age: config.file_max_age(),
        }
    }

    /// `Cache-Control` value for shared caches.
    pub fn cache_control(max_age: Duration) -> String {
        format!("s-maxage={}, stale-while-revalidate", max_age.as_secs())
    }
}
