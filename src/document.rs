//! Arena document model: elements and text nodes with parent links.
//!
//! Built once by a front end (see [`crate::html`]) or by hand in tests, then
//! read-only. Node zero is always the synthetic root.

use crate::types::NodeId;

/// Payload of one node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// An element with its tag name and attributes in source order.
    Element {
        /// Attribute name/value pairs. Names are lowercase.
        attributes: Vec<(String, String)>,
        /// Lowercase tag name.
        tag: String,
    },
    /// The synthetic document root.
    Root,
    /// Character data.
    Text(String),
}

/// One node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// Child nodes in document order.
    pub children: Vec<NodeId>,
    /// Element, text, or root payload.
    pub kind: NodeKind,
    /// Owning node, `None` only for the root.
    pub parent: Option<NodeId>,
}

/// A static document tree plus the canonical path it was loaded from.
#[derive(Debug, Clone)]
pub struct Document {
    /// Arena storage; `NodeId` indexes into it.
    nodes: Vec<Node>,
    /// Canonical document path used to recognise same-document links.
    path: String,
}

impl Document {
    /// Create an empty document holding only the root.
    pub fn new(path: &str) -> Self {
        return Self {
            nodes: vec![Node {
                children: Vec::new(),
                kind: NodeKind::Root,
                parent: None,
            }],
            path: path.to_string(),
        };
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        return NodeId(0);
    }

    /// Canonical document path.
    pub fn path(&self) -> &str {
        return &self.path;
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        return self.nodes.len();
    }

    /// True when only the root exists.
    pub fn is_empty(&self) -> bool {
        return self.nodes.len() <= 1;
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        return self.nodes.get(id.0);
    }

    /// All node ids in document (pre-)order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        return (0..self.nodes.len()).map(NodeId);
    }

    /// Parent of a node, `None` for the root or an unknown id.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        return self.node(id).and_then(|n| return n.parent);
    }

    /// Whether the node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        return self
            .node(id)
            .is_some_and(|n| return matches!(n.kind, NodeKind::Element { .. }));
    }

    /// Tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        return match &self.node(id)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Root | NodeKind::Text(_) => None,
        };
    }

    /// Value of an attribute on an element. The first occurrence wins, as in browsers.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let NodeKind::Element { attributes, .. } = &self.node(id)?.kind else {
            return None;
        };
        return attributes
            .iter()
            .find(|(n, _)| return n == name)
            .map(|(_, v)| return v.as_str());
    }

    /// Concatenated text content beneath a node.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        return out;
    }

    /// Depth-first text accumulation for [`Self::text_content`].
    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        if let NodeKind::Text(text) = &node.kind {
            out.push_str(text);
        }
        for child in &node.children {
            self.collect_text(*child, out);
        }
    }

    /// Append an element under `parent` and return its id.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> NodeId {
        let attributes = attributes
            .iter()
            .map(|(n, v)| return (n.to_ascii_lowercase(), (*v).to_string()))
            .collect();
        return self.append(
            parent,
            NodeKind::Element {
                attributes,
                tag: tag.to_ascii_lowercase(),
            },
        );
    }

    /// Append a text node under `parent` and return its id.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        return self.append(parent, NodeKind::Text(text.to_string()));
    }

    /// Push a node and link it to its parent.
    /// Appending in parse order keeps arena order equal to document order.
    fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            children: Vec::new(),
            kind,
            parent: Some(parent),
        });
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        return id;
    }
}
