//! Highlight coordination: a hover layer and an exclusive-definition layer
//! folded into one visual on/off state per element.

use std::collections::HashMap;

use crate::index::Index;
use crate::types::NodeId;

/// Paints highlight state. Implemented by whatever renders the document.
pub trait Surface {
    /// Turn the highlight of one element on or off.
    fn set_highlighted(&mut self, node: NodeId, highlighted: bool);
}

/// Highlight layers for one element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Mark {
    /// Set while this element is the exclusive navigation target.
    exclusive: bool,
    /// Number of active hovers covering this element.
    hover: u32,
}

impl Mark {
    /// Visible iff either layer holds it.
    fn is_lit(self) -> bool {
        return self.exclusive || self.hover > 0;
    }
}

/// Owns the surface and every element's highlight layers.
/// The surface only hears about real on/off transitions.
#[derive(Debug)]
pub struct Highlighter<S> {
    /// The current exclusive definition.
    exclusive: Option<NodeId>,
    /// Layers per element; absent means both layers off.
    marks: HashMap<NodeId, Mark>,
    /// Rendering collaborator.
    surface: S,
}

impl<S: Surface> Highlighter<S> {
    /// Wrap a surface with everything unhighlighted.
    pub fn new(surface: S) -> Self {
        return Self {
            exclusive: None,
            marks: HashMap::new(),
            surface,
        };
    }

    /// Hover-highlight `node` together with its counterparts.
    /// Returns how many elements were covered; zero for plain or unresolved nodes.
    pub fn highlight_pair(&mut self, index: &Index, node: NodeId) -> usize {
        let Some(set) = index.linked_set(node) else {
            return 0;
        };
        for member in &set {
            self.update(*member, |m| m.hover = m.hover.saturating_add(1));
        }
        return set.len();
    }

    /// Undo one [`Self::highlight_pair`]. Elements without an active hover are left alone.
    pub fn unhighlight_pair(&mut self, index: &Index, node: NodeId) -> usize {
        let Some(set) = index.linked_set(node) else {
            return 0;
        };
        for member in &set {
            self.update(*member, |m| m.hover = m.hover.saturating_sub(1));
        }
        return set.len();
    }

    /// Make `definition` the single exclusive definition, releasing the previous one.
    pub fn set_exclusive_definition(&mut self, definition: NodeId) {
        if let Some(previous) = self.exclusive
            && previous != definition
        {
            self.update(previous, |m| m.exclusive = false);
        }
        self.update(definition, |m| m.exclusive = true);
        self.exclusive = Some(definition);
    }

    /// The current exclusive definition.
    pub fn exclusive(&self) -> Option<NodeId> {
        return self.exclusive;
    }

    /// Every visibly highlighted element, sorted.
    pub fn highlighted(&self) -> Vec<NodeId> {
        let mut lit: Vec<NodeId> = self
            .marks
            .iter()
            .filter(|(_, m)| return m.is_lit())
            .map(|(n, _)| return *n)
            .collect();
        lit.sort_unstable();
        return lit;
    }

    /// The rendering collaborator.
    pub fn surface(&self) -> &S {
        return &self.surface;
    }

    /// Apply a layer change and tell the surface if the visual state flipped.
    fn update(&mut self, node: NodeId, change: impl FnOnce(&mut Mark)) {
        let mark = self.marks.entry(node).or_default();
        let before = mark.is_lit();
        change(mark);
        let after = mark.is_lit();
        if *mark == Mark::default() {
            self.marks.remove(&node);
        }
        if before != after {
            self.surface.set_highlighted(node, after);
        }
    }
}
