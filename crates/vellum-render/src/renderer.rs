use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use vellum_store::{ResolutionError, Resolver};

use crate::compose::{compose, ComposedPage};
use crate::layout::CompositionLayout;
use crate::substitution::{PatternSubstitution, Substitution};

/// Resolves the latest artifacts and composes them into a page.
#[derive(Clone)]
pub struct Renderer {
    resolver: Resolver,
    layout: Arc<CompositionLayout>,
    substitution: Arc<dyn Substitution>,
}

impl Renderer {
    pub fn new(resolver: Resolver, layout: CompositionLayout) -> Self {
        Self {
            resolver,
            layout: Arc::new(layout),
            substitution: Arc::new(PatternSubstitution),
        }
    }

    pub fn with_substitution(mut self, substitution: Arc<dyn Substitution>) -> Self {
        self.substitution = substitution;
        self
    }

    pub fn layout(&self) -> &CompositionLayout {
        &self.layout
    }

    /// Render, surfacing resolution failures.
    pub async fn try_render(&self) -> Result<ComposedPage, ResolutionError> {
        let files = self.resolver.latest_for_all().await?;
        debug!(artifacts = files.len(), "composing page");
        Ok(compose(
            &files,
            &self.layout,
            self.substitution.as_ref(),
            Utc::now(),
        ))
    }

    /// Render, degrading to an empty page if resolution fails.
    pub async fn render(&self) -> ComposedPage {
        match self.try_render().await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "render failed; serving empty page");
                ComposedPage::empty(&self.layout, Utc::now())
            }
        }
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("resolver", &self.resolver)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}
