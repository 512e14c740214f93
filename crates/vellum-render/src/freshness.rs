//! Time- and event-based freshness for the composed page.
//!
//! ```text
//! EMPTY --read--> FRESH --ttl expiry / invalidate--> STALE --read--> FRESH
//! ```
//!
//! There is no computing lock: concurrent readers of a stale slot each
//! render. Every invalidation bumps a generation counter and a render only
//! installs its page if the generation it started under is still current,
//! so a render that began before an invalidation is never served as fresh
//! afterwards.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::compose::ComposedPage;
use crate::error::{CacheError, CacheResult};
use crate::renderer::Renderer;

/// Default time-to-live of a composed page.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

struct Cached {
    page: Arc<ComposedPage>,
    rendered_at: Instant,
    generation: u64,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    cached: Option<Cached>,
}

impl Slot {
    fn fresh(&self, ttl: Duration) -> Option<&Arc<ComposedPage>> {
        self.cached
            .as_ref()
            .filter(|c| c.generation == self.generation && c.rendered_at.elapsed() < ttl)
            .map(|c| &c.page)
    }
}

/// Process-wide cache of the composed page.
pub struct CompositionCache {
    renderer: Renderer,
    ttl: Duration,
    slot: Mutex<Slot>,
}

impl CompositionCache {
    pub fn new(renderer: Renderer, ttl: Duration) -> Self {
        Self {
            renderer,
            ttl,
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Slot>> {
        self.slot.lock().map_err(|_| CacheError::Poisoned)
    }

    /// The cached page if fresh, otherwise a newly rendered one.
    ///
    /// A failed render is never cached, so the next read tries again. Until
    /// then the last good page is served even though it is stale; with
    /// nothing cached the read degrades to an empty page.
    pub async fn page(&self) -> CacheResult<Arc<ComposedPage>> {
        let generation = {
            let slot = self.lock()?;
            if let Some(page) = slot.fresh(self.ttl) {
                debug!("composition cache hit");
                return Ok(Arc::clone(page));
            }
            slot.generation
        };

        let started = Instant::now();
        let page = match self.renderer.try_render().await {
            Ok(page) => Arc::new(page),
            Err(e) => {
                if let Some(cached) = &self.lock()?.cached {
                    warn!(error = %e, "render failed; serving stale page");
                    return Ok(Arc::clone(&cached.page));
                }
                warn!(error = %e, "render failed; serving empty page");
                return Ok(Arc::new(ComposedPage::empty(
                    self.renderer.layout(),
                    Utc::now(),
                )));
            }
        };

        let mut slot = self.lock()?;
        if slot.generation != generation {
            debug!(started_under = generation, current = slot.generation, "invalidated during render; not caching");
            return Ok(page);
        }
        let newer_installed = slot
            .cached
            .as_ref()
            .is_some_and(|c| c.generation == generation && c.rendered_at > started);
        if !newer_installed {
            slot.cached = Some(Cached {
                page: Arc::clone(&page),
                rendered_at: started,
                generation,
            });
            debug!(generation, "composition cached");
        }
        Ok(page)
    }

    /// Mark the cached page stale. Returns the invalidation time.
    pub fn invalidate(&self) -> CacheResult<DateTime<Utc>> {
        let mut slot = self.lock()?;
        slot.generation += 1;
        debug!(generation = slot.generation, "composition invalidated");
        Ok(Utc::now())
    }

    pub fn state(&self) -> CacheResult<CacheState> {
        let slot = self.lock()?;
        Ok(match &slot.cached {
            None => CacheState::Empty,
            Some(_) if slot.fresh(self.ttl).is_some() => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        })
    }
}

impl std::fmt::Debug for CompositionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionCache")
            .field("ttl", &self.ttl)
            .field("state", &self.state().ok())
            .finish_non_exhaustive()
    }
}
