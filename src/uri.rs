//! Document location, navigation parameter, and the shareable, pop-out, and
//! export URIs derived from it.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::Identifier;

/// Path, optional `?query`, optional `#fragment`. Matches any string.
#[allow(clippy::expect_used, reason = "literal pattern, checked by tests")]
static LOCATION: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^(?s)([^?#]*)(\?[^#]*)?(?:#(.*))?$").expect("valid regex"));

/// Export frame size used until a viewport is known.
pub const DEFAULT_EXPORT_SIZE: Viewport = Viewport {
    height: 500,
    width: 700,
};

/// Visible area of the document, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Viewport {
    /// Height in pixels.
    pub height: u32,
    /// Width in pixels.
    pub width: u32,
}

/// The document's current location, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUri {
    /// Everything before `?` or `#`; the canonical document path.
    base: String,
    /// Fragment without its `#`.
    fragment: Option<String>,
    /// Query including its leading `?`.
    query: Option<String>,
}

impl DocumentUri {
    /// Split a location string. Never fails; odd input lands in `base`.
    pub fn parse(href: &str) -> Self {
        let Some(caps) = LOCATION.captures(href) else {
            return Self {
                base: href.to_string(),
                fragment: None,
                query: None,
            };
        };
        return Self {
            base: caps.get(1).map_or_else(String::new, |m| return m.as_str().to_string()),
            fragment: caps.get(3).map(|m| return m.as_str().to_string()),
            query: caps.get(2).map(|m| return m.as_str().to_string()),
        };
    }

    /// Canonical document path: the location without query or fragment.
    pub fn base(&self) -> &str {
        return &self.base;
    }

    /// Current fragment without `#`.
    pub fn fragment(&self) -> Option<&str> {
        return self.fragment.as_deref();
    }

    /// Value of a non-empty query parameter.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        let query = self.query.as_deref()?.strip_prefix('?')?;
        return query
            .split('&')
            .filter_map(|pair| return pair.split_once('='))
            .find(|(key, _)| return *key == name)
            .map(|(_, value)| return value)
            .filter(|value| return !value.is_empty());
    }

    /// Jump to an anchor: replaces the fragment, keeps path and query.
    pub fn set_fragment(&mut self, identifier: &Identifier) {
        self.fragment = Some(identifier.as_str().to_string());
    }

    /// Replace the whole location with `base#identifier`.
    pub fn redirect_to_anchor(&mut self, identifier: &Identifier) {
        self.query = None;
        self.set_fragment(identifier);
    }

    /// Reassemble the location string.
    pub fn href(&self) -> String {
        let mut out = self.base.clone();
        if let Some(query) = &self.query {
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        return out;
    }
}

impl fmt::Display for DocumentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.href());
    }
}

/// How an identifier is attached to a document path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor<'a> {
    /// `path#identifier`: a plain anchor jump.
    Fragment,
    /// `path?name=identifier`: selects embedded navigation.
    Query(&'a str),
}

/// Attach an identifier to a document path, or return the bare path.
pub fn full_uri(base: &str, identifier: Option<&Identifier>, anchor: Anchor<'_>) -> String {
    let Some(identifier) = identifier else {
        return base.to_string();
    };
    return match anchor {
        Anchor::Fragment => format!("{base}#{identifier}"),
        Anchor::Query(name) => format!("{base}?{name}={identifier}"),
    };
}

/// The embeddable `<iframe>` snippet offered outside frames.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ExportSnippet {
    /// Frame height.
    pub height: u32,
    /// Frame source URI.
    pub src: String,
    /// Frame width.
    pub width: u32,
}

impl fmt::Display for ExportSnippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(
            f,
            "<iframe src=\"{}\" width=\"{}\" height=\"{}\" frameborder=\"0\"> </iframe>",
            self.src, self.width, self.height
        );
    }
}
