//! Composition renderer for Vellum.
//!
//! Turns the latest version of every known artifact into a single page:
//! the primary markup with its stylesheet and vector image inlined, plus a
//! derived title and last-updated time. [`CompositionCache`] keeps the
//! rendered page fresh by TTL and explicit invalidation.
//!
//! # Key Types
//!
//! - [`CompositionLayout`] -- which store paths feed the page
//! - [`Substitution`] / [`PatternSubstitution`] -- asset inlining
//! - [`compose`] / [`ComposedPage`] -- the pure composition step
//! - [`Renderer`] -- resolve then compose
//! - [`CompositionCache`] -- freshness controller

pub mod compose;
pub mod error;
pub mod freshness;
pub mod layout;
pub mod renderer;
pub mod substitution;
pub mod title;

pub use compose::{compose, ComposedPage};
pub use error::{CacheError, CacheResult};
pub use freshness::{CacheState, CompositionCache, DEFAULT_TTL};
pub use layout::{CompositionLayout, InlineAsset};
pub use renderer::Renderer;
pub use substitution::{PatternSubstitution, Substitution};
pub use title::{extract_title, DEFAULT_TITLE};
