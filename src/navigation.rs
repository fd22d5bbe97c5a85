//! Navigation controller: pointer and click handling, the scroll-to-definition
//! sequence, and the navigation state behind the shareable URIs.
//!
//! Everything runs on one event loop. The only suspension point is the
//! scroll animation: [`Navigator::navigate_to`] hands a [`ScrollRequest`] to
//! the [`Scroller`] and returns; the animation later reports back through
//! [`Navigator::on_scroll_complete`] with the request's [`Ticket`]. Tickets
//! come from a monotonically increasing sequence, and only the newest one may
//! touch navigation state, so state converges to the last requested target
//! whatever order completions arrive in.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::document::Document;
use crate::highlight::{Highlighter, Surface};
use crate::index::Index;
use crate::types::{Identifier, NodeId};
use crate::uri::{self, Anchor, DocumentUri, ExportSnippet, Viewport};
use crate::walker;

/// Identifies one scroll request. Later navigations get larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct Ticket(
    /// Navigation sequence number.
    pub u64,
);

/// Scroll axis. Navigation only ever scrolls vertically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Up/down.
    Vertical,
}

/// One request to bring an element into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    /// Axis to animate.
    pub axis: Axis,
    /// Animation length.
    pub duration: Duration,
    /// Element to scroll to.
    pub target: NodeId,
    /// Hand back to [`Navigator::on_scroll_complete`] when done.
    pub ticket: Ticket,
}

/// Runs scroll animations. Implemented by whatever hosts the document.
pub trait Scroller {
    /// Start an animation; completion is reported with the request's ticket.
    fn scroll_to(&mut self, request: ScrollRequest);

    /// Abandon an animation that has been superseded. Its completion may
    /// still arrive and will be ignored.
    fn cancel(&mut self, ticket: Ticket);
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Plain content, or a link to an identifier nobody defines.
    Ignored,
    /// A scroll to the definition has been requested.
    Navigating(Ticket),
}

/// What a scroll completion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Direct view: the location fragment now names the definition.
    FragmentSet(NodeId),
    /// Embedded view: the definition is now the exclusive highlight.
    Highlighted(NodeId),
    /// A newer navigation was requested; nothing changed.
    Superseded,
}

/// What loading the navigation parameter did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No navigation parameter.
    Idle,
    /// Framed view: scrolling to the parameter's definition.
    Navigating(Ticket),
    /// Top-level view: the location now anchors the definition directly.
    Redirected(NodeId),
    /// The parameter names no definition.
    Unresolved,
}

/// The navigation currently waiting on its animation.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    /// Definition being scrolled to.
    target: NodeId,
    /// Ticket the completion must carry.
    ticket: Ticket,
}

/// One document view: its index, highlight layers, location, and navigation state.
/// Independent views never share state.
#[derive(Debug)]
pub struct Navigator<S, A> {
    /// The static document.
    document: Document,
    /// True when displayed inside an embedding frame.
    framed: bool,
    /// Hover and exclusive highlight layers.
    highlights: Highlighter<S>,
    /// Element the pointer is currently over.
    hovered: Option<NodeId>,
    /// Built once from `document`.
    index: Index,
    /// Navigation awaiting its scroll completion.
    in_flight: Option<InFlight>,
    /// Definition reached by the last completed navigation.
    last_definition: Option<NodeId>,
    /// Current document location.
    location: DocumentUri,
    /// Query parameter selecting embedded navigation.
    nav_parameter: String,
    /// Animation length for each navigation.
    scroll_duration: Duration,
    /// Animation collaborator.
    scroller: A,
    /// Last issued ticket number.
    sequence: u64,
    /// Identifier carried by the shareable URI.
    shared: Option<Identifier>,
    /// Last reported viewport size.
    viewport: Option<Viewport>,
}

impl<S: Surface, A: Scroller> Navigator<S, A> {
    /// Create a view over an indexed document.
    #[allow(clippy::too_many_arguments, reason = "one slot per collaborator")]
    pub fn new(
        document: Document,
        index: Index,
        config: &Config,
        location: DocumentUri,
        framed: bool,
        surface: S,
        scroller: A,
    ) -> Self {
        return Self {
            document,
            framed,
            highlights: Highlighter::new(surface),
            hovered: None,
            index,
            in_flight: None,
            last_definition: None,
            location,
            nav_parameter: config.nav_parameter.clone(),
            scroll_duration: config.scroll_duration,
            scroller,
            sequence: 0,
            shared: None,
            viewport: None,
        };
    }

    // ── Pointer ───────────────────────────────────────────────────────

    /// Pointer entered `node`: hover-highlight every annotated level enclosing it.
    /// Entering a new node first leaves the previous one.
    pub fn on_pointer_enter(&mut self, node: NodeId) -> usize {
        if self.hovered == Some(node) {
            return 0;
        }
        if let Some(previous) = self.hovered {
            self.on_pointer_leave(previous);
        }
        self.hovered = Some(node);

        let chain = walker::resolve_chain(&self.document, &self.index, node);
        return chain
            .iter()
            .map(|level| return self.highlights.highlight_pair(&self.index, level.node))
            .sum();
    }

    /// Pointer left `node`: undo its hover. Leaving anything but the hovered node is a no-op.
    pub fn on_pointer_leave(&mut self, node: NodeId) -> usize {
        if self.hovered != Some(node) {
            return 0;
        }
        self.hovered = None;

        let chain = walker::resolve_chain(&self.document, &self.index, node);
        return chain
            .iter()
            .map(|level| return self.highlights.unhighlight_pair(&self.index, level.node))
            .sum();
    }

    // ── Navigation ────────────────────────────────────────────────────

    /// Click on `node`. The innermost annotated level decides: a link goes to
    /// its target's definition, a bare definition scrolls to itself.
    pub fn on_click(&mut self, node: NodeId) -> ClickOutcome {
        let chain = walker::resolve_chain(&self.document, &self.index, node);
        let Some(level) = chain.first() else {
            return ClickOutcome::Ignored;
        };

        let destination = match level.role.targets() {
            Some(target) => {
                let Some(definition) = self.index.definition_of(target.as_str()) else {
                    debug!(%node, identifier = %target, "click on unresolved reference");
                    return ClickOutcome::Ignored;
                };
                definition
            },
            None => level.node,
        };

        return self
            .navigate_to(destination)
            .map_or(ClickOutcome::Ignored, ClickOutcome::Navigating);
    }

    /// Request a scroll to `definition`, superseding any navigation in flight.
    /// Returns `None` when the node is not a registered definition.
    pub fn navigate_to(&mut self, definition: NodeId) -> Option<Ticket> {
        let identifier = self.index.role_of(definition).defines()?;
        info!(%identifier, node = %definition, "navigating");

        self.sequence = self.sequence.saturating_add(1);
        let ticket = Ticket(self.sequence);
        if let Some(previous) = self.in_flight.take() {
            debug!(superseded = previous.ticket.0, by = ticket.0, "cancelling scroll");
            self.scroller.cancel(previous.ticket);
        }
        self.scroller.scroll_to(ScrollRequest {
            axis: Axis::Vertical,
            duration: self.scroll_duration,
            target: definition,
            ticket,
        });
        self.in_flight = Some(InFlight {
            target: definition,
            ticket,
        });
        return Some(ticket);
    }

    /// A scroll animation finished. Only the newest ticket mutates state:
    /// embedded views switch the exclusive highlight, direct views set the
    /// location fragment, and both update the shareable identifier.
    pub fn on_scroll_complete(&mut self, ticket: Ticket) -> Completion {
        let current = match self.in_flight {
            Some(flight) if flight.ticket == ticket => flight,
            Some(_) | None => {
                debug!(ticket = ticket.0, "ignoring superseded scroll completion");
                return Completion::Superseded;
            },
        };
        self.in_flight = None;

        let Some(identifier) = self.index.role_of(current.target).defines().cloned() else {
            return Completion::Superseded;
        };

        let completion = if self.is_embedded() {
            self.highlights.set_exclusive_definition(current.target);
            Completion::Highlighted(current.target)
        } else {
            self.location.set_fragment(&identifier);
            Completion::FragmentSet(current.target)
        };

        self.last_definition = Some(current.target);
        self.shared = Some(identifier);
        return completion;
    }

    /// Apply the navigation parameter present at load time. Framed views
    /// scroll to it; top-level views redirect to a plain anchor instead.
    /// Without a parameter, a fragment naming a definition seeds the shareable URI.
    pub fn on_load(&mut self) -> LoadOutcome {
        let Some(requested) = self.location.parameter(&self.nav_parameter).map(str::to_string) else {
            if let Some(fragment) = self.location.fragment()
                && self.index.definition_of(fragment).is_some()
            {
                self.shared = Identifier::new(fragment);
            }
            return LoadOutcome::Idle;
        };
        let Some(definition) = self.index.definition_of(&requested) else {
            debug!(identifier = %requested, "navigation parameter names no definition");
            return LoadOutcome::Unresolved;
        };

        if self.framed {
            return self
                .navigate_to(definition)
                .map_or(LoadOutcome::Unresolved, LoadOutcome::Navigating);
        }

        let Some(identifier) = Identifier::new(&requested) else {
            return LoadOutcome::Unresolved;
        };
        self.location.redirect_to_anchor(&identifier);
        self.shared = Some(identifier);
        return LoadOutcome::Redirected(definition);
    }

    /// The viewport changed size.
    pub fn on_resize(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    // ── Shareable state ───────────────────────────────────────────────

    /// `path?id=<current>`, or the bare path before any navigation.
    pub fn share_uri(&self) -> String {
        return uri::full_uri(
            self.location.base(),
            self.shared.as_ref(),
            Anchor::Query(&self.nav_parameter),
        );
    }

    /// `path#<last>` for opening the current definition outside the frame.
    pub fn pop_out_uri(&self) -> String {
        let last = self
            .last_definition
            .and_then(|node| return self.index.role_of(node).defines());
        return uri::full_uri(self.location.base(), last, Anchor::Fragment);
    }

    /// The iframe snippet for embedding this view; `None` when already framed.
    pub fn export_snippet(&self) -> Option<ExportSnippet> {
        if self.framed {
            return None;
        }
        let size = self.viewport.unwrap_or(uri::DEFAULT_EXPORT_SIZE);
        return Some(ExportSnippet {
            height: size.height,
            src: self.share_uri(),
            width: size.width,
        });
    }

    // ── Accessors ─────────────────────────────────────────────────────

    /// Whether the location carries the navigation parameter.
    pub fn is_embedded(&self) -> bool {
        return self.location.parameter(&self.nav_parameter).is_some();
    }

    /// The document.
    pub fn document(&self) -> &Document {
        return &self.document;
    }

    /// The identifier index.
    pub fn index(&self) -> &Index {
        return &self.index;
    }

    /// Highlight layers and their surface.
    pub fn highlights(&self) -> &Highlighter<S> {
        return &self.highlights;
    }

    /// The animation collaborator.
    pub fn scroller(&self) -> &A {
        return &self.scroller;
    }

    /// The animation collaborator, for hosts that deliver completions from it.
    pub fn scroller_mut(&mut self) -> &mut A {
        return &mut self.scroller;
    }

    /// Current location.
    pub fn location(&self) -> &DocumentUri {
        return &self.location;
    }

    /// Ticket of the navigation still animating.
    pub fn pending(&self) -> Option<Ticket> {
        return self.in_flight.map(|f| return f.ticket);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "tests")]
mod tests {
    use super::*;
    use crate::highlight::Surface;

    /// Counts surface writes.
    #[derive(Default, Debug)]
    struct Paint(usize);

    impl Surface for Paint {
        fn set_highlighted(&mut self, _node: NodeId, _highlighted: bool) {
            self.0 = self.0.saturating_add(1);
        }
    }

    /// Remembers requests and cancellations.
    #[derive(Default, Debug)]
    struct Anim {
        cancelled: Vec<Ticket>,
        requests: Vec<ScrollRequest>,
    }

    impl Scroller for Anim {
        fn scroll_to(&mut self, request: ScrollRequest) {
            self.requests.push(request);
        }

        fn cancel(&mut self, ticket: Ticket) {
            self.cancelled.push(ticket);
        }
    }

    struct Fixture {
        nav: Navigator<Paint, Anim>,
        a: NodeId,
        b: NodeId,
        ref_a: NodeId,
        ref_b: NodeId,
        ghost: NodeId,
    }

    /// `<span id=A>` `<span id=B>` `<a href=#A>` `<a href=#B>` `<a href=#ghost>`
    fn fixture(location: &str, framed: bool) -> Fixture {
        let mut doc = Document::new("/src/page.html");
        let a = doc.append_element(doc.root(), "span", &[("id", "A")]);
        let b = doc.append_element(doc.root(), "span", &[("id", "B")]);
        let ref_a = doc.append_element(doc.root(), "a", &[("href", "#A")]);
        let ref_b = doc.append_element(doc.root(), "a", &[("href", "#B")]);
        let ghost = doc.append_element(doc.root(), "a", &[("href", "#ghost")]);
        let config = Config::default();
        let index = Index::build(&doc, &config).unwrap();
        let nav = Navigator::new(
            doc,
            index,
            &config,
            DocumentUri::parse(location),
            framed,
            Paint::default(),
            Anim::default(),
        );
        Fixture { nav, a, b, ref_a, ref_b, ghost }
    }

    #[test]
    fn direct_view_click_sets_fragment() {
        let mut f = fixture("/src/page.html", false);
        f.nav.on_pointer_enter(f.ref_a);
        assert_eq!(f.nav.highlights().highlighted(), vec![f.a, f.ref_a]);

        let ClickOutcome::Navigating(ticket) = f.nav.on_click(f.ref_a) else {
            panic!("click should navigate");
        };
        let request = f.nav.scroller().requests[0];
        assert_eq!(request.target, f.a);
        assert_eq!(request.axis, Axis::Vertical);
        assert_eq!(request.duration, Duration::from_millis(300));

        assert_eq!(f.nav.on_scroll_complete(ticket), Completion::FragmentSet(f.a));
        assert_eq!(f.nav.location().fragment(), Some("A"));
        assert_eq!(f.nav.highlights().exclusive(), None);

        f.nav.on_pointer_leave(f.ref_a);
        assert!(f.nav.highlights().highlighted().is_empty());
        assert_eq!(f.nav.share_uri(), "/src/page.html?id=A");
        assert_eq!(f.nav.pop_out_uri(), "/src/page.html#A");
    }

    #[test]
    fn embedded_view_click_switches_exclusive_highlight() {
        let mut f = fixture("/src/page.html?id=A", true);
        let ClickOutcome::Navigating(t1) = f.nav.on_click(f.ref_a) else {
            panic!("click should navigate");
        };
        assert_eq!(f.nav.on_scroll_complete(t1), Completion::Highlighted(f.a));
        let ClickOutcome::Navigating(t2) = f.nav.on_click(f.ref_b) else {
            panic!("click should navigate");
        };
        assert_eq!(f.nav.on_scroll_complete(t2), Completion::Highlighted(f.b));

        assert_eq!(f.nav.highlights().highlighted(), vec![f.b]);
        assert_eq!(f.nav.location().href(), "/src/page.html?id=A");
        assert_eq!(f.nav.export_snippet(), None);
    }

    #[test]
    fn superseded_navigation_never_wins_in_either_order() {
        for stale_first in [true, false] {
            let mut f = fixture("/src/page.html?id=A", true);
            let first = f.nav.navigate_to(f.a).unwrap();
            let second = f.nav.navigate_to(f.b).unwrap();
            assert!(second > first);
            assert_eq!(f.nav.scroller().cancelled, vec![first]);

            if stale_first {
                assert_eq!(f.nav.on_scroll_complete(first), Completion::Superseded);
                assert_eq!(f.nav.on_scroll_complete(second), Completion::Highlighted(f.b));
            } else {
                assert_eq!(f.nav.on_scroll_complete(second), Completion::Highlighted(f.b));
                assert_eq!(f.nav.on_scroll_complete(first), Completion::Superseded);
            }
            assert_eq!(f.nav.highlights().exclusive(), Some(f.b));
            assert_eq!(f.nav.highlights().highlighted(), vec![f.b]);
            assert_eq!(f.nav.pending(), None);
        }
    }

    #[test]
    fn unresolved_click_changes_nothing() {
        let mut f = fixture("/src/page.html?id=A", true);
        let pending = f.nav.navigate_to(f.a).unwrap();

        assert_eq!(f.nav.on_click(f.ghost), ClickOutcome::Ignored);
        assert_eq!(f.nav.pending(), Some(pending));
        assert!(f.nav.scroller().cancelled.is_empty());
        assert_eq!(f.nav.scroller().requests.len(), 1);
        assert!(f.nav.highlights().highlighted().is_empty());
        assert_eq!(f.nav.highlights().surface().0, 0);
    }

    #[test]
    fn clicking_bare_definition_scrolls_to_itself() {
        let mut f = fixture("/src/page.html", false);
        let ClickOutcome::Navigating(ticket) = f.nav.on_click(f.b) else {
            panic!("click should navigate");
        };
        assert_eq!(f.nav.on_scroll_complete(ticket), Completion::FragmentSet(f.b));
        assert_eq!(f.nav.location().href(), "/src/page.html#B");
    }

    #[test]
    fn hover_moves_between_targets_without_residue() {
        let mut f = fixture("/src/page.html", false);
        f.nav.on_pointer_enter(f.ref_a);
        f.nav.on_pointer_enter(f.ref_b);
        assert_eq!(f.nav.highlights().highlighted(), vec![f.b, f.ref_b]);
        assert_eq!(f.nav.on_pointer_leave(f.ref_a), 0);
        f.nav.on_pointer_leave(f.ref_b);
        assert!(f.nav.highlights().highlighted().is_empty());
    }

    #[test]
    fn hover_inside_nested_reference_lights_both_levels() {
        // <span id=Outer><a href=#Inner>Inner</a></span> <span id=Inner> <a href=#Outer>
        let mut doc = Document::new("/src/page.html");
        let outer = doc.append_element(doc.root(), "span", &[("id", "Outer")]);
        let link = doc.append_element(outer, "a", &[("href", "#Inner")]);
        let text = doc.append_text(link, "Inner");
        let inner = doc.append_element(doc.root(), "span", &[("id", "Inner")]);
        let ref_outer = doc.append_element(doc.root(), "a", &[("href", "#Outer")]);
        let config = Config::default();
        let index = Index::build(&doc, &config).unwrap();
        let mut nav = Navigator::new(
            doc,
            index,
            &config,
            DocumentUri::parse("/src/page.html"),
            false,
            Paint::default(),
            Anim::default(),
        );

        assert_eq!(nav.on_pointer_enter(text), 4);
        assert_eq!(nav.highlights().highlighted(), vec![outer, link, inner, ref_outer]);

        assert_eq!(nav.on_pointer_leave(text), 4);
        assert!(nav.highlights().highlighted().is_empty());
        assert_eq!(nav.highlights().surface().0, 8);
    }

    #[test]
    fn load_in_frame_navigates_and_top_level_redirects() {
        let mut framed = fixture("/src/page.html?id=B", true);
        let LoadOutcome::Navigating(ticket) = framed.nav.on_load() else {
            panic!("framed load should navigate");
        };
        assert_eq!(framed.nav.on_scroll_complete(ticket), Completion::Highlighted(framed.b));

        let mut top = fixture("/src/page.html?id=B", false);
        assert_eq!(top.nav.on_load(), LoadOutcome::Redirected(top.b));
        assert_eq!(top.nav.location().href(), "/src/page.html#B");
        assert!(top.nav.scroller().requests.is_empty());

        let mut missing = fixture("/src/page.html?id=nope", true);
        assert_eq!(missing.nav.on_load(), LoadOutcome::Unresolved);
        assert_eq!(fixture("/src/page.html", true).nav.on_load(), LoadOutcome::Idle);
    }

    #[test]
    fn export_snippet_tracks_viewport_and_fragment() {
        let mut f = fixture("/src/page.html#A", false);
        assert_eq!(f.nav.on_load(), LoadOutcome::Idle);
        let snippet = f.nav.export_snippet().unwrap();
        assert_eq!((snippet.width, snippet.height), (700, 500));
        assert_eq!(snippet.src, "/src/page.html?id=A");

        f.nav.on_resize(Viewport { height: 600, width: 1024 });
        let snippet = f.nav.export_snippet().unwrap();
        assert_eq!((snippet.width, snippet.height), (1024, 600));
    }
}
