//! Ancestor walker: from the node under the pointer up through every
//! enclosing annotated element.

use crate::document::Document;
use crate::index::Index;
use crate::types::{NodeId, Role};

/// One annotated element on the way up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLevel {
    /// The annotated element.
    pub node: NodeId,
    /// Its role; a `Both` level carries the definition and the link side together.
    pub role: Role,
}

/// Collect the annotated elements enclosing `start`, innermost first.
///
/// Text nodes start the walk at their parent element. The walk stops at the
/// first plain element or at the root.
pub fn resolve_chain(document: &Document, index: &Index, start: NodeId) -> Vec<ChainLevel> {
    let mut chain = Vec::new();
    let mut current = if document.is_element(start) {
        Some(start)
    } else {
        document.parent(start)
    };

    while let Some(node) = current {
        let role = index.role_of(node);
        if role.is_plain() {
            break;
        }
        chain.push(ChainLevel {
            node,
            role: role.clone(),
        });
        current = document.parent(node);
    }

    return chain;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "tests")]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn reference_nested_in_definition_yields_two_levels() {
        let mut doc = Document::new("page.html");
        let pre = doc.append_element(doc.root(), "pre", &[]);
        let outer = doc.append_element(pre, "span", &[("id", "Outer")]);
        let inner = doc.append_element(outer, "a", &[("href", "#Inner")]);
        let text = doc.append_text(inner, "Inner");
        doc.append_element(pre, "span", &[("id", "Inner")]);
        let index = Index::build(&doc, &Config::default()).unwrap();

        let chain = resolve_chain(&doc, &index, text);
        let nodes: Vec<NodeId> = chain.iter().map(|l| l.node).collect();
        assert_eq!(nodes, vec![inner, outer]);
        assert!(matches!(chain[0].role, Role::Reference(_)));
        assert!(matches!(chain[1].role, Role::Definition(_)));
    }

    #[test]
    fn plain_element_stops_the_walk() {
        let mut doc = Document::new("page.html");
        let def = doc.append_element(doc.root(), "span", &[("id", "a")]);
        let plain = doc.append_element(def, "b", &[]);
        let text = doc.append_text(plain, "x");
        let index = Index::build(&doc, &Config::default()).unwrap();

        assert!(resolve_chain(&doc, &index, text).is_empty());
        assert_eq!(resolve_chain(&doc, &index, def).len(), 1);
    }

    #[test]
    fn both_roles_surface_at_one_level() {
        let mut doc = Document::new("page.html");
        let a = doc.append_element(doc.root(), "a", &[("id", "f2"), ("href", "#f1")]);
        let index = Index::build(&doc, &Config::default()).unwrap();

        let chain = resolve_chain(&doc, &index, a);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].role.defines().map(|i| i.as_str()), Some("f2"));
        assert_eq!(chain[0].role.targets().map(|i| i.as_str()), Some("f1"));
    }
}
