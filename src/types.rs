/// Core domain types shared by the index, walker, highlighter, and navigator.
use std::borrow::Borrow;
use std::fmt;

/// Index of a node in a [`crate::document::Document`] arena.
/// Stable for the lifetime of the document; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct NodeId(
    /// Position in the arena, root is zero.
    pub usize,
);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "%{}", self.0);
    }
}

/// An opaque, non-empty identifier naming one definition within a document.
/// Newtype prevents mixing with raw attribute strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct Identifier(
    /// The identifier text, without any leading `#`.
    String,
);

impl Identifier {
    /// Wrap a raw attribute value. Returns `None` for the empty string.
    pub fn new(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        return Some(Self(raw.to_string()));
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        return &self.0;
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// The annotation role of one node, computed once when the index is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Registered definition that also links to another identifier.
    Both {
        /// Identifier this element defines.
        identifier: Identifier,
        /// Identifier this element links to.
        target: Identifier,
    },
    /// Registered definition of an identifier.
    Definition(Identifier),
    /// Neither a registered definition nor a same-document link.
    Plain,
    /// Link to an identifier in the same document.
    Reference(Identifier),
}

impl Role {
    /// Identifier this node defines, if any.
    pub fn defines(&self) -> Option<&Identifier> {
        return match self {
            Role::Both { identifier, .. } | Role::Definition(identifier) => Some(identifier),
            Role::Plain | Role::Reference(_) => None,
        };
    }

    /// Identifier this node links to, if any.
    pub fn targets(&self) -> Option<&Identifier> {
        return match self {
            Role::Both { target, .. } | Role::Reference(target) => Some(target),
            Role::Definition(_) | Role::Plain => None,
        };
    }

    /// Whether the ancestor walker should stop at this node.
    pub fn is_plain(&self) -> bool {
        return matches!(self, Role::Plain);
    }
}
