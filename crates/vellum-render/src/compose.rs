use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vellum_types::ArtifactVersion;

use crate::layout::CompositionLayout;
use crate::substitution::Substitution;
use crate::title::extract_title;

/// The rendered page: substituted markup plus display metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedPage {
    pub markup: String,
    pub title: String,
    /// Newest `source_timestamp` among the artifacts composed.
    pub last_updated: DateTime<Utc>,
}

impl ComposedPage {
    /// The page shown when nothing can be resolved.
    pub fn empty(layout: &CompositionLayout, now: DateTime<Utc>) -> Self {
        Self {
            markup: String::new(),
            title: layout.default_title.clone(),
            last_updated: now,
        }
    }
}

/// Build a page from the latest version of every known path.
///
/// Pure: the only input besides `files` is `now`, used for `last_updated`
/// when `files` is empty.
pub fn compose(
    files: &BTreeMap<String, ArtifactVersion>,
    layout: &CompositionLayout,
    substitution: &dyn Substitution,
    now: DateTime<Utc>,
) -> ComposedPage {
    let mut markup = files
        .get(&layout.primary)
        .map(|v| v.content_str().into_owned())
        .unwrap_or_default();

    if let Some(css) = layout.stylesheet.locate(files) {
        markup = substitution.inline_stylesheet(
            &markup,
            &layout.stylesheet.reference,
            &css.content_str(),
        );
    }
    if let Some(svg) = layout.vector.locate(files) {
        markup = substitution.inline_vector(
            &markup,
            &layout.vector.reference,
            &svg.content_str(),
            layout.vector_width,
        );
    }

    let title = extract_title(&markup)
        .map(str::to_string)
        .unwrap_or_else(|| layout.default_title.clone());
    let last_updated = files
        .values()
        .map(ArtifactVersion::source_timestamp)
        .max()
        .unwrap_or(now);

    ComposedPage {
        markup,
        title,
        last_updated,
    }
}
