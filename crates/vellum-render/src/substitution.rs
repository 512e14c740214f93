//! Asset inlining: rewriting references in markup into embedded content.

use regex::{NoExpand, Regex, RegexBuilder};
use tracing::warn;

/// Rewrites asset references in markup into inline content.
///
/// Implementations must replace every occurrence, match case-insensitively
/// and insert the supplied content literally.
pub trait Substitution: Send + Sync {
    /// Replace every `<link … href="{reference}" …>` with `<style>{css}</style>`.
    fn inline_stylesheet(&self, markup: &str, reference: &str, css: &str) -> String;

    /// Replace every `<img … src="{reference}" …>` with
    /// `<svg width="{width}">{svg}</svg>`.
    fn inline_vector(&self, markup: &str, reference: &str, svg: &str, width: u32) -> String;
}

/// Regex-based [`Substitution`].
///
/// Tag boundaries are found with `[^>]*`, so attribute values containing `>`
/// are not handled. Good enough for generated markup; a parser-backed
/// implementation can be swapped in through the trait.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatternSubstitution;

impl PatternSubstitution {
    fn replace_tag(markup: &str, tag: &str, attr: &str, reference: &str, replacement: &str) -> String {
        let pattern = format!(r#"<{tag}[^>]*{attr}="{}"[^>]*>"#, regex::escape(reference));
        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(re) => replace_all_literal(&re, markup, replacement),
            Err(e) => {
                warn!(tag, reference, error = %e, "could not build substitution pattern");
                markup.to_string()
            }
        }
    }
}

fn replace_all_literal(re: &Regex, haystack: &str, replacement: &str) -> String {
    re.replace_all(haystack, NoExpand(replacement)).into_owned()
}

impl Substitution for PatternSubstitution {
    fn inline_stylesheet(&self, markup: &str, reference: &str, css: &str) -> String {
        Self::replace_tag(markup, "link", "href", reference, &format!("<style>{css}</style>"))
    }

    fn inline_vector(&self, markup: &str, reference: &str, svg: &str, width: u32) -> String {
        Self::replace_tag(
            markup,
            "img",
            "src",
            reference,
            &format!(r#"<svg width="{width}">{svg}</svg>"#),
        )
    }
}
