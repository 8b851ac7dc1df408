//! Critical CSS inlining.
//!
//! The built-in inliner swaps the blocking stylesheet link for the
//! stylesheet itself and loads the full file asynchronously:
//!
//! ```text
//! <link rel="stylesheet" href="css/main-1f2e3d4c.css">
//!                       ↓
//! <style>…</style>
//! <link rel="preload" href="css/main-1f2e3d4c.css" as="style" onload="…">
//! <noscript><link rel="stylesheet" href="css/main-1f2e3d4c.css"></noscript>
//! ```
//!
//! An external inliner can be configured instead; it receives the page on
//! stdin and `$STAMP_INPUT`/`$STAMP_STYLESHEET`, and its stdout replaces the
//! page.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("valid link pattern"));

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(rel|href)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid attribute pattern")
});

/// Read the `rel` and `href` attributes of a `<link>` tag.
fn link_attrs(tag: &str) -> (Option<&str>, Option<&str>) {
    let mut rel = None;
    let mut href = None;
    for caps in ATTR.captures_iter(tag) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        if caps[1].eq_ignore_ascii_case("rel") {
            rel = Some(value);
        } else {
            href = Some(value);
        }
    }
    (rel, href)
}

/// Whether `href` points at the dest-relative `stylesheet`.
///
/// Accepts `css/main.css`, `/css/main.css`, `../css/main.css` and absolute
/// URLs ending in `/css/main.css`, ignoring query and fragment.
fn refers_to(href: &str, stylesheet: &str) -> bool {
    let href = href.split(['?', '#']).next().unwrap_or(href);
    href == stylesheet
        || href
            .strip_suffix(stylesheet)
            .is_some_and(|prefix| prefix.ends_with('/'))
}

/// The `href` of a stylesheet link to `stylesheet`, if `tag` is one.
fn target_href<'t>(tag: &'t str, stylesheet: &str) -> Option<&'t str> {
    let (Some(rel), Some(href)) = link_attrs(tag) else {
        return None;
    };
    let is_stylesheet = rel
        .split_ascii_whitespace()
        .any(|r| r.eq_ignore_ascii_case("stylesheet"));
    (is_stylesheet && refers_to(href, stylesheet)).then_some(href)
}

/// Inline `css` in place of every stylesheet link to `stylesheet`.
///
/// Pages without a matching link are returned borrowed.
pub fn inline_critical<'h>(html: &'h str, stylesheet: &str, css: &str) -> Cow<'h, str> {
    if !LINK_TAG
        .find_iter(html)
        .any(|m| target_href(m.as_str(), stylesheet).is_some())
    {
        return Cow::Borrowed(html);
    }

    // `</style` inside the CSS would end the element early
    let css = css.replace("</style", "<\\/style");

    LINK_TAG.replace_all(html, |caps: &Captures| {
        let tag = &caps[0];
        match target_href(tag, stylesheet) {
            Some(href) => format!(
                "<style>{css}</style>\
                 <link rel=\"preload\" href=\"{href}\" as=\"style\" onload=\"this.onload=null;this.rel='stylesheet'\">\
                 <noscript>{tag}</noscript>"
            ),
            None => tag.to_string(),
        }
    })
}
