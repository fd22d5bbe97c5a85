//! Identifier index: definition-by-id and references-by-id tables, plus the
//! per-node role every event handler consults.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use crate::config::{Config, DuplicatePolicy};
use crate::document::Document;
use crate::error::{Anomaly, Error};
use crate::link::{self, Rejection};
use crate::types::{Identifier, NodeId, Role};

/// Role reported for ids outside the document.
static PLAIN: Role = Role::Plain;

/// Built once per document, read-only afterward.
#[derive(Debug)]
pub struct Index {
    /// Everything odd found while building, in discovery order.
    anomalies: Vec<Anomaly>,
    /// Identifier to its single definition element.
    definitions: HashMap<Identifier, NodeId>,
    /// Identifier to referencing elements, in document order.
    references: HashMap<Identifier, Vec<NodeId>>,
    /// Role per node, parallel to the document arena.
    roles: Vec<Role>,
}

impl Index {
    /// Scan a document and build its index.
    ///
    /// Duplicate identifiers are resolved by `config.duplicates` and recorded
    /// as anomalies. Links are classified under `config.link_scope`; rejected
    /// ones are recorded and skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateIdentifier` only under [`DuplicatePolicy::Reject`].
    pub fn build(document: &Document, config: &Config) -> Result<Self, Error> {
        let mut anomalies = Vec::new();
        let definitions = register_definitions(document, config.duplicates, &mut anomalies)?;

        let mut references: HashMap<Identifier, Vec<NodeId>> = HashMap::new();
        let mut targets: Vec<Option<Identifier>> = vec![None; document.len()];
        for node in document.node_ids() {
            let Some(href) = document.attribute(node, "href") else {
                continue;
            };
            match link::classify(href, document.path(), config.link_scope) {
                Err(Rejection::Foreign) => {
                    debug!(%node, href, "skipping link into another document");
                    anomalies.push(Anomaly::ForeignLinkTarget {
                        href: href.to_string(),
                        node,
                    });
                },
                Err(Rejection::Malformed(reason)) => {
                    debug!(%node, href, reason, "skipping malformed link target");
                    anomalies.push(Anomaly::MalformedLinkTarget {
                        href: href.to_string(),
                        node,
                        reason,
                    });
                },
                Ok(identifier) => {
                    if !definitions.contains_key(&identifier) {
                        anomalies.push(Anomaly::UnresolvedIdentifier {
                            identifier: identifier.clone(),
                            node,
                        });
                    }
                    references.entry(identifier.clone()).or_default().push(node);
                    if let Some(slot) = targets.get_mut(node.0) {
                        *slot = Some(identifier);
                    }
                },
            }
        }

        let roles = document
            .node_ids()
            .zip(targets)
            .map(|(node, target)| return role_for(document, &definitions, node, target))
            .collect();

        return Ok(Self {
            anomalies,
            definitions,
            references,
            roles,
        });
    }

    /// The definition element for an identifier.
    pub fn definition_of(&self, identifier: &str) -> Option<NodeId> {
        return self.definitions.get(identifier).copied();
    }

    /// Elements referencing an identifier, in document order. Empty, never absent.
    pub fn references_of(&self, identifier: &str) -> &[NodeId] {
        return self.references.get(identifier).map_or(&[], Vec::as_slice);
    }

    /// Role of a node; `Plain` for ids outside the document.
    pub fn role_of(&self, node: NodeId) -> &Role {
        return self.roles.get(node.0).unwrap_or(&PLAIN);
    }

    /// Anomalies recorded while building.
    pub fn anomalies(&self) -> &[Anomaly] {
        return &self.anomalies;
    }

    /// All definitions, sorted by identifier.
    pub fn definitions(&self) -> Vec<(&Identifier, NodeId)> {
        let mut all: Vec<_> = self.definitions.iter().map(|(k, v)| return (k, *v)).collect();
        all.sort();
        return all;
    }

    /// All referenced identifiers with their referencing elements, sorted by identifier.
    pub fn references(&self) -> Vec<(&Identifier, &[NodeId])> {
        let mut all: Vec<_> = self
            .references
            .iter()
            .map(|(k, v)| return (k, v.as_slice()))
            .collect();
        all.sort();
        return all;
    }

    /// Every element that lights up together with `node`: for each identifier
    /// the node defines or targets, that identifier's definition and all of
    /// its references. Sorted, deduplicated.
    ///
    /// Returns `None` for plain nodes and for nodes whose identifiers are all
    /// unresolved.
    pub fn linked_set(&self, node: NodeId) -> Option<Vec<NodeId>> {
        let role = self.role_of(node);
        let mut set = Vec::new();
        for identifier in [role.defines(), role.targets()].into_iter().flatten() {
            let Some(definition) = self.definition_of(identifier.as_str()) else {
                debug!(%node, %identifier, "unresolved identifier");
                continue;
            };
            set.push(definition);
            set.extend_from_slice(self.references_of(identifier.as_str()));
        }
        if set.is_empty() {
            return None;
        }
        set.sort_unstable();
        set.dedup();
        return Some(set);
    }
}

/// Register every element carrying a non-empty `id`, applying the duplicate policy.
///
/// # Errors
///
/// Returns `Error::DuplicateIdentifier` under [`DuplicatePolicy::Reject`].
fn register_definitions(
    document: &Document,
    policy: DuplicatePolicy,
    anomalies: &mut Vec<Anomaly>,
) -> Result<HashMap<Identifier, NodeId>, Error> {
    let mut definitions: HashMap<Identifier, NodeId> = HashMap::new();

    for node in document.node_ids() {
        let Some(identifier) = document.attribute(node, "id").and_then(Identifier::new) else {
            continue;
        };
        match definitions.entry(identifier) {
            Entry::Vacant(slot) => {
                slot.insert(node);
            },
            Entry::Occupied(mut slot) => {
                let first = *slot.get();
                let (kept, dropped) = match policy {
                    DuplicatePolicy::FirstWins => (first, node),
                    DuplicatePolicy::LastWins => {
                        slot.insert(node);
                        (node, first)
                    },
                    DuplicatePolicy::Reject => {
                        return Err(Error::DuplicateIdentifier {
                            first,
                            identifier: slot.key().clone(),
                            second: node,
                        });
                    },
                };
                warn!(identifier = %slot.key(), %kept, %dropped, "duplicate identifier");
                anomalies.push(Anomaly::DuplicateIdentifier {
                    dropped,
                    identifier: slot.key().clone(),
                    kept,
                });
            },
        }
    }

    return Ok(definitions);
}

/// Combine a node's registered definition (if it won) and its link target into a role.
fn role_for(
    document: &Document,
    definitions: &HashMap<Identifier, NodeId>,
    node: NodeId,
    target: Option<Identifier>,
) -> Role {
    let defined = document
        .attribute(node, "id")
        .and_then(Identifier::new)
        .filter(|id| return definitions.get(id) == Some(&node));

    return match (defined, target) {
        (Some(identifier), Some(target)) => Role::Both { identifier, target },
        (Some(identifier), None) => Role::Definition(identifier),
        (None, Some(target)) => Role::Reference(target),
        (None, None) => Role::Plain,
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "tests")]
mod tests {
    use super::*;

    /// `<pre><span id=def1>foo</span> <a href=#def1>foo</a> <a href=page.html#def1>foo</a></pre>`
    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new("/src/page.html");
        let pre = doc.append_element(doc.root(), "pre", &[]);
        let def = doc.append_element(pre, "span", &[("id", "def1")]);
        doc.append_text(def, "foo");
        let r1 = doc.append_element(pre, "a", &[("href", "#def1")]);
        doc.append_text(r1, "foo");
        let r2 = doc.append_element(pre, "a", &[("href", "page.html#def1")]);
        (doc, def, r1, r2)
    }

    #[test]
    fn indexes_definitions_and_references_in_document_order() {
        let (doc, def, r1, r2) = sample();
        let index = Index::build(&doc, &Config::default()).unwrap();

        assert_eq!(index.definition_of("def1"), Some(def));
        assert_eq!(index.references_of("def1"), &[r1, r2]);
        assert_eq!(index.references_of("nothing"), &[] as &[NodeId]);
        assert_eq!(index.role_of(def), &Role::Definition(Identifier::new("def1").unwrap()));
        assert_eq!(index.role_of(r1), &Role::Reference(Identifier::new("def1").unwrap()));
        assert!(index.anomalies().is_empty());
    }

    #[test]
    fn linked_set_is_symmetric() {
        let (doc, def, r1, r2) = sample();
        let index = Index::build(&doc, &Config::default()).unwrap();

        let expected = Some(vec![def, r1, r2]);
        assert_eq!(index.linked_set(def), expected);
        assert_eq!(index.linked_set(r1), expected);
        assert_eq!(index.linked_set(r2), expected);
        assert_eq!(index.linked_set(doc.root()), None);
    }

    #[test]
    fn malformed_targets_are_skipped_not_fatal() {
        let mut doc = Document::new("page.html");
        let a = doc.append_element(doc.root(), "a", &[("href", "#")]);
        let b = doc.append_element(doc.root(), "a", &[("href", "elsewhere.html")]);
        let index = Index::build(&doc, &Config::default()).unwrap();

        assert!(index.role_of(a).is_plain());
        assert!(index.role_of(b).is_plain());
        assert!(index.references().is_empty());
        assert_eq!(index.anomalies().len(), 2);
    }

    #[test]
    fn unresolved_reference_is_recorded_and_links_nothing() {
        let mut doc = Document::new("page.html");
        let a = doc.append_element(doc.root(), "a", &[("href", "#ghost")]);
        let index = Index::build(&doc, &Config::default()).unwrap();

        assert_eq!(index.references_of("ghost"), &[a]);
        assert_eq!(index.linked_set(a), None);
        assert!(matches!(
            index.anomalies(),
            [Anomaly::UnresolvedIdentifier { node, .. }] if *node == a
        ));
    }

    /// Two spans claiming `dup`.
    fn duplicated() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new("page.html");
        let first = doc.append_element(doc.root(), "span", &[("id", "dup")]);
        let second = doc.append_element(doc.root(), "span", &[("id", "dup")]);
        (doc, first, second)
    }

    #[test]
    fn duplicate_policy_last_wins_by_default() {
        let (doc, first, second) = duplicated();
        let index = Index::build(&doc, &Config::default()).unwrap();

        assert_eq!(index.definition_of("dup"), Some(second));
        assert!(index.role_of(first).is_plain());
        assert_eq!(index.definitions().len(), 1);
        assert!(matches!(
            index.anomalies(),
            [Anomaly::DuplicateIdentifier { kept, dropped, .. }] if *kept == second && *dropped == first
        ));
    }

    #[test]
    fn duplicate_policy_first_wins_and_reject() {
        let (doc, first, second) = duplicated();

        let config = Config::parse("duplicates = \"first-wins\"").unwrap();
        assert_eq!(config.duplicates, DuplicatePolicy::FirstWins);
        let index = Index::build(&doc, &config).unwrap();
        assert_eq!(index.definition_of("dup"), Some(first));

        let config = Config::parse("duplicates = \"reject\"").unwrap();
        let err = Index::build(&doc, &config).unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentifier { first: f, second: s, .. } if f == first && s == second));
    }

    #[test]
    fn element_with_id_and_href_has_both_roles() {
        let mut doc = Document::new("page.html");
        let a = doc.append_element(doc.root(), "a", &[("id", "overload2"), ("href", "#overload1")]);
        let o1 = doc.append_element(doc.root(), "span", &[("id", "overload1")]);
        let index = Index::build(&doc, &Config::default()).unwrap();

        let role = index.role_of(a);
        assert_eq!(role.defines().map(Identifier::as_str), Some("overload2"));
        assert_eq!(role.targets().map(Identifier::as_str), Some("overload1"));
        assert_eq!(index.linked_set(a), Some(vec![a, o1]));
        assert_eq!(index.linked_set(o1), Some(vec![a, o1]));
    }
}
