use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vellum_types::ArtifactVersion;

use crate::title::DEFAULT_TITLE;

/// An optional asset inlined into the primary markup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineAsset {
    /// The reference as it appears in the markup's `href`/`src`.
    pub reference: String,
    /// Store paths to look the asset up under, tried in order.
    pub candidates: Vec<String>,
}

impl InlineAsset {
    pub fn new(reference: impl Into<String>, candidates: &[&str]) -> Self {
        Self {
            reference: reference.into(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The first candidate present in `files`.
    pub fn locate<'a>(
        &self,
        files: &'a BTreeMap<String, ArtifactVersion>,
    ) -> Option<&'a ArtifactVersion> {
        self.candidates.iter().find_map(|c| files.get(c))
    }
}

/// Which artifacts make up the composed page and how they are combined.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionLayout {
    /// Store path of the primary markup.
    pub primary: String,
    pub stylesheet: InlineAsset,
    pub vector: InlineAsset,
    /// `width` attribute on the inlined `<svg>` wrapper.
    pub vector_width: u32,
    pub default_title: String,
}

impl Default for CompositionLayout {
    fn default() -> Self {
        Self {
            primary: "index.html".into(),
            stylesheet: InlineAsset::new(
                "public/styles.css",
                &["public/styles.css", "styles.css"],
            ),
            vector: InlineAsset::new(
                "public/mongodb-icon.svg",
                &["public/mongodb-icon.svg", "mongodb-icon.svg"],
            ),
            vector_width: 300,
            default_title: DEFAULT_TITLE.into(),
        }
    }
}
