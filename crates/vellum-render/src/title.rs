use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

/// Title used when the markup carries none.
pub const DEFAULT_TITLE: &str = "Dynamic Website";

fn title_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            RegexBuilder::new("<title>(.*?)</title>")
                .case_insensitive(true)
                .build()
                .ok()
        })
        .as_ref()
}

/// Text of the first `<title>` element. Does not span lines.
///
/// An empty `<title></title>` yields `Some("")`.
pub fn extract_title(markup: &str) -> Option<&str> {
    title_pattern()?
        .captures(markup)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
