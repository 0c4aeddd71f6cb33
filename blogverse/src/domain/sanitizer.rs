//! HTML sanitiser for author-supplied rich content.
//!
//! Editor output passes through two stages before it reaches visitors:
//! a pre-pass that drops `class` attributes carrying editor-internal `ql-`
//! fragments, then an allow-list pass over tags and attributes. The result
//! is stable under repeated sanitisation.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{LazyLock, OnceLock};

use ammonia::Builder;
use regex::Regex;
use tracing::warn;

/// Tags kept by [`sanitize`].
pub const ALLOWED_TAGS: [&str; 29] = [
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "p",
    "a",
    "ul",
    "ol",
    "li",
    "strong",
    "em",
    "blockquote",
    "pre",
    "code",
    "img",
    "figure",
    "figcaption",
    "hr",
    "br",
    "table",
    "thead",
    "tbody",
    "tr",
    "th",
    "td",
    "div",
    "span",
];

/// Attributes kept on any allowed tag.
pub const ALLOWED_ATTRIBUTES: [&str; 7] = ["href", "src", "alt", "title", "width", "height", "class"];

/// Preview length on the home feed.
pub const HOME_EXCERPT_CHARS: usize = 220;

/// Preview length on category pages.
pub const CATEGORY_EXCERPT_CHARS: usize = 150;

const EDITOR_CLASS_MARKER: &str = "ql-";

static EDITOR_CLASS: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+class\s*=\s*(?:"[^"]*ql-[^"]*"|'[^']*ql-[^']*')"#)
});

static TAG: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(r"<[^>]+>"));

static WHITESPACE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(r"\s+"));

fn policy() -> &'static Builder<'static> {
    static POLICY: OnceLock<Builder<'static>> = OnceLock::new();
    POLICY.get_or_init(|| {
        let mut builder = Builder::default();
        builder
            .tags(ALLOWED_TAGS.into_iter().collect::<HashSet<_>>())
            .generic_attributes(ALLOWED_ATTRIBUTES.into_iter().collect::<HashSet<_>>())
            .tag_attributes(HashMap::new())
            .link_rel(None)
            .attribute_filter(|_element, attribute, value| {
                if attribute == "class" && value.contains(EDITOR_CLASS_MARKER) {
                    None
                } else {
                    Some(value.into())
                }
            });
        builder
    })
}

/// Drop `class` attributes that carry editor-internal `ql-` fragments.
///
/// # Examples
/// ```
/// use blogverse::domain::strip_editor_classes;
///
/// assert_eq!(
///     strip_editor_classes(r#"<p class="ql-align-center">x</p>"#),
///     "<p>x</p>"
/// );
/// ```
pub fn strip_editor_classes(raw_html: &str) -> Cow<'_, str> {
    match EDITOR_CLASS.as_ref() {
        Ok(pattern) => pattern.replace_all(raw_html, ""),
        Err(_) => Cow::Borrowed(raw_html),
    }
}

/// Sanitise author HTML for rendering.
///
/// Output never contains `<script>` elements or `style`, `onclick` and
/// `onerror` attributes. When the sanitiser itself fails the raw input is
/// returned and a warning is logged.
///
/// # Examples
/// ```
/// use blogverse::domain::sanitize;
///
/// let clean = sanitize(r#"<p onclick="x()">hi<script>alert(1)</script></p>"#);
/// assert_eq!(clean, "<p>hi</p>");
/// ```
pub fn sanitize(raw_html: &str) -> String {
    fail_open(raw_html, |html| {
        let stripped = strip_editor_classes(html);
        policy().clean(&stripped).to_string()
    })
}

fn fail_open(raw_html: &str, clean: impl FnOnce(&str) -> String) -> String {
    match catch_unwind(AssertUnwindSafe(|| clean(raw_html))) {
        Ok(output) => output,
        Err(_) => {
            warn!(
                input_len = raw_html.len(),
                "html sanitiser failed; rendering raw input"
            );
            raw_html.to_owned()
        }
    }
}

/// Plain-text preview of `html`, at most `max_chars` characters.
///
/// Tags are removed and whitespace runs collapse to a single space.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = match TAG.as_ref() {
        Ok(pattern) => pattern.replace_all(html, " "),
        Err(_) => Cow::Borrowed(html),
    };
    let collapsed = match WHITESPACE.as_ref() {
        Ok(pattern) => pattern.replace_all(text.trim(), " ").into_owned(),
        Err(_) => text.trim().to_owned(),
    };
    collapsed.chars().take(max_chars).collect()
}
