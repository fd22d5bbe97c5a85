//! Link-target classification: which `href` values name an identifier in
//! the current document.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::LinkScope;
use crate::types::Identifier;

/// Splits an href at its last `#`: prefix in group 1, fragment in group 2.
#[allow(clippy::expect_used, reason = "literal pattern, checked by tests")]
static FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(?s)(.*)#([^#]*)$").expect("valid regex"));

/// Why an href was not accepted as a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The prefix names some other document.
    Foreign,
    /// No identifier could be extracted.
    Malformed(&'static str),
}

/// Extract the identifier an href points at, relative to `document_path`.
///
/// Fragment-only targets (`#foo`) are accepted. A prefixed target is accepted
/// when the prefix names this document, or unconditionally under
/// [`LinkScope::AnyDocument`].
///
/// # Errors
///
/// Returns `Rejection::Malformed` when there is no `#` or nothing after it,
/// and `Rejection::Foreign` when the prefix names another document.
pub fn classify(href: &str, document_path: &str, scope: LinkScope) -> Result<Identifier, Rejection> {
    let Some(caps) = FRAGMENT.captures(href) else {
        return Err(Rejection::Malformed("no fragment"));
    };
    let prefix = caps.get(1).map_or("", |m| return m.as_str());
    let fragment = caps.get(2).map_or("", |m| return m.as_str());

    let Some(identifier) = Identifier::new(fragment) else {
        return Err(Rejection::Malformed("empty identifier"));
    };

    if scope == LinkScope::AnyDocument || names_document(prefix, document_path) {
        return Ok(identifier);
    }
    return Err(Rejection::Foreign);
}

/// Whether a link prefix refers to the document at `document_path`.
/// Query strings are ignored; relative prefixes match by trailing path segments.
/// A prefix that is itself a fragment (`#a` in `#a#b`) stays in this document.
fn names_document(prefix: &str, document_path: &str) -> bool {
    let prefix = strip_query(prefix);
    if prefix.is_empty() || prefix.starts_with('#') {
        return true;
    }
    let document_path = strip_query(document_path);
    return prefix == document_path
        || document_path.ends_with(&format!("/{prefix}"))
        || prefix.ends_with(&format!("/{document_path}"));
}

/// Drop everything from the first `?`.
fn strip_query(path: &str) -> &str {
    return path.split('?').next().unwrap_or(path);
}
