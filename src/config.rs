use std::path::Path;
use std::time::Duration;

use crate::error::Error;

/// Name of the per-project config file.
pub const CONFIG_FILE: &str = ".linkedsrc.toml";

/// What to do when two elements claim the same identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep the element seen first in document order.
    FirstWins,
    /// Keep the element seen last in document order.
    #[default]
    LastWins,
    /// Fail the index build.
    Reject,
}

/// Which link prefixes count as pointing into the current document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkScope {
    /// Any `...#id` target, whatever the prefix.
    AnyDocument,
    /// Bare `#id` or a prefix naming this document.
    #[default]
    SameDocument,
}

/// Project configuration loaded from `.linkedsrc.toml`.
/// Include/exclude patterns are path prefixes applied to audited documents.
#[derive(Debug, Clone)]
pub struct Config {
    /// Duplicate-identifier policy for index builds.
    pub duplicates: DuplicatePolicy,
    /// Path prefixes never audited.
    exclude: Vec<String>,
    /// Path prefixes audited; empty means everything.
    include: Vec<String>,
    /// Link prefix policy for references.
    pub link_scope: LinkScope,
    /// Query parameter selecting embedded navigation.
    pub nav_parameter: String,
    /// Duration of each scroll-to-definition animation.
    pub scroll_duration: Duration,
}

/// Raw TOML structure for `.linkedsrc.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct LinkedsrcTomlConfig {
    /// `duplicates = "first-wins" | "last-wins" | "reject"`.
    #[serde(default)]
    duplicates: DuplicatePolicy,
    /// Path prefixes to skip.
    #[serde(default)]
    exclude: Vec<String>,
    /// Path prefixes to audit.
    #[serde(default)]
    include: Vec<String>,
    /// `link_scope = "same-document" | "any-document"`.
    #[serde(default)]
    link_scope: LinkScope,
    /// Navigation query parameter; empty falls back to the default.
    nav_parameter: Option<String>,
    /// Scroll animation length in milliseconds.
    scroll_duration_ms: Option<u64>,
}

/// Default navigation query parameter.
const DEFAULT_NAV_PARAMETER: &str = "id";

/// Default scroll animation length.
const DEFAULT_SCROLL_MS: u64 = 300;

impl Default for Config {
    fn default() -> Self {
        return Self {
            duplicates: DuplicatePolicy::default(),
            exclude: Vec::new(),
            include: Vec::new(),
            link_scope: LinkScope::default(),
            nav_parameter: DEFAULT_NAV_PARAMETER.to_string(),
            scroll_duration: Duration::from_millis(DEFAULT_SCROLL_MS),
        };
    }
}

impl Config {
    /// Load config from `.linkedsrc.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist. A file that exists
    /// but is malformed is an error, never a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: LinkedsrcTomlConfig = toml::from_str(content)?;
        let nav_parameter = raw
            .nav_parameter
            .filter(|p| return !p.is_empty())
            .unwrap_or_else(|| return DEFAULT_NAV_PARAMETER.to_string());
        return Ok(Self {
            duplicates: raw.duplicates,
            exclude: raw.exclude,
            include: raw.include,
            link_scope: raw.link_scope,
            nav_parameter,
            scroll_duration: Duration::from_millis(raw.scroll_duration_ms.unwrap_or(DEFAULT_SCROLL_MS)),
        });
    }

    /// Check whether a document path should be audited.
    ///
    /// A path is included if no include patterns are set (audit everything),
    /// or if it starts with at least one include pattern. An included path
    /// is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}
