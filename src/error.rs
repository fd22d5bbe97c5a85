/// Crate-level error types and non-fatal index anomalies.
use std::path::PathBuf;

use crate::types::{Identifier, NodeId};

/// Fatal errors. Each variant names the file, identifier, or reason for
/// failure so the CLI can render a useful diagnostic.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two elements claim the same identifier and the policy is `reject`.
    #[error("duplicate identifier `{identifier}` (elements {first} and {second})")]
    DuplicateIdentifier {
        /// Element registered first.
        first: NodeId,
        /// The identifier claimed twice.
        identifier: Identifier,
        /// Element that tried to register it again.
        second: NodeId,
    },

    /// A document or script file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A replay selector did not parse.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        /// Why it was rejected.
        reason: &'static str,
        /// The selector text as written.
        selector: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// Tree-sitter failed to parse a document.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A replay selector parsed but names nothing in the document.
    #[error("selector `{selector}` matches no node")]
    UnknownSelector {
        /// The selector text as written.
        selector: String,
    },

    /// No front end for this file extension.
    #[error("unsupported document type: .{ext}")]
    UnsupportedDocument {
        /// File extension without the leading dot.
        ext: String,
    },

    /// The filesystem watcher could not be started.
    #[error("watch failed: {reason}")]
    WatchFailed {
        /// Description of the watcher failure.
        reason: String,
    },
}

/// Problems found while indexing or resolving. Never fatal: the affected
/// element simply does not highlight or navigate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// A second element claimed an already registered identifier.
    #[error("duplicate identifier `{identifier}`: {kept} kept, {dropped} dropped")]
    DuplicateIdentifier {
        /// Element that lost under the configured policy.
        dropped: NodeId,
        /// The contested identifier.
        identifier: Identifier,
        /// Element that remains the definition.
        kept: NodeId,
    },

    /// Link target points into another document.
    #[error("link target `{href}` on {node} points at another document")]
    ForeignLinkTarget {
        /// The raw href value.
        href: String,
        /// Element carrying the link.
        node: NodeId,
    },

    /// Link target has no identifier to extract.
    #[error("malformed link target `{href}` on {node}: {reason}")]
    MalformedLinkTarget {
        /// The raw href value.
        href: String,
        /// Element carrying the link.
        node: NodeId,
        /// Why no identifier could be extracted.
        reason: &'static str,
    },

    /// A reference names an identifier with no registered definition.
    #[error("unresolved identifier `{identifier}` referenced from {node}")]
    UnresolvedIdentifier {
        /// The identifier nobody defines.
        identifier: Identifier,
        /// Referencing element.
        node: NodeId,
    },
}
