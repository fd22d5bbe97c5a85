//! Scripted sessions: drive a [`Navigator`] with headless collaborators from
//! a TOML script and report where highlight and navigation state ended up.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::document::Document;
use crate::error::Error;
use crate::headless::{CountingSurface, QueuedScroll, QueuedScroller};
use crate::index::Index;
use crate::navigation::{Axis, ClickOutcome, Completion, LoadOutcome, Navigator, Ticket};
use crate::types::{NodeId, Role};
use crate::uri::{DocumentUri, Viewport};

/// A replay script as written in TOML.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Whether the view sits inside an embedding frame.
    #[serde(default)]
    pub framed: bool,
    /// Initial location; defaults to the document path.
    pub location: Option<String>,
    /// Events in order.
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
    /// Initial viewport.
    pub viewport: Option<Viewport>,
}

/// One scripted event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Click the selected node.
    Click(String),
    /// Pointer enters the selected node.
    Enter(String),
    /// Deliver queued scroll completions.
    Finish(FinishOrder),
    /// Pointer leaves the selected node.
    Leave(String),
    /// Viewport changes size.
    Resize(Viewport),
}

/// Which queued animations a `finish` step completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishOrder {
    /// Every queued animation, oldest first.
    All,
    /// Only the most recently started one.
    Latest,
    /// Only the earliest started one.
    Oldest,
}

/// How a script names a node.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    /// `#id`: the definition of `id`.
    Definition(String),
    /// `%N`: arena node `N`.
    Node(usize),
    /// `@id` or `@id:N`: the Nth reference to `id`.
    Reference {
        /// Referenced identifier.
        identifier: String,
        /// Zero-based position among its references.
        nth: usize,
    },
}

/// One element in a report.
#[derive(Debug, Serialize)]
pub struct ElementReport {
    /// Human-readable description.
    pub label: String,
    /// Arena position.
    pub node: NodeId,
}

/// An animation still queued when the script ended.
#[derive(Debug, Serialize)]
pub struct PendingScroll {
    /// Axis it animates.
    pub axis: Axis,
    /// Whether a newer navigation abandoned it.
    pub cancelled: bool,
    /// Requested animation length.
    pub duration_ms: u64,
    /// Element it scrolls to.
    pub target: NodeId,
    /// Ticket its completion carries.
    pub ticket: Ticket,
}

impl From<&QueuedScroll> for PendingScroll {
    fn from(queued: &QueuedScroll) -> Self {
        return Self {
            axis: queued.request.axis,
            cancelled: queued.cancelled,
            duration_ms: u64::try_from(queued.request.duration.as_millis()).unwrap_or(u64::MAX),
            target: queued.request.target,
            ticket: queued.request.ticket,
        };
    }
}

/// Final state after a replay.
#[derive(Debug, Serialize)]
pub struct Report {
    /// One line per handled event.
    pub events: Vec<String>,
    /// Exclusive navigation target.
    pub exclusive: Option<ElementReport>,
    /// Export iframe snippet, absent when framed.
    pub export: Option<String>,
    /// Elements visibly highlighted.
    pub highlighted: Vec<ElementReport>,
    /// Ticket of the navigation still waiting on its animation.
    pub in_flight: Option<Ticket>,
    /// Final location.
    pub location: String,
    /// Animations never finished, oldest first.
    pub pending: Vec<PendingScroll>,
    /// Pop-out URI.
    pub pop_out: String,
    /// Shareable URI.
    pub share: String,
    /// Transitions the surface painted.
    pub surface_writes: usize,
}

/// Read a replay script from disk.
///
/// # Errors
///
/// Returns `Error::FileNotFound`, `Error::Io`, or `Error::TomlDe`.
pub fn load_script(path: &Path) -> Result<Script, Error> {
    let content = match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        },
        Err(e) => return Err(Error::Io(e)),
        Ok(c) => c,
    };
    return Ok(toml::from_str(&content)?);
}

/// Index the document, load the script's location, then play every step.
///
/// # Errors
///
/// Returns `Error::DuplicateIdentifier` under the `reject` policy, and
/// `Error::InvalidSelector` or `Error::UnknownSelector` for bad steps.
pub fn run(document: Document, script: &Script, config: &Config) -> Result<Report, Error> {
    let index = Index::build(&document, config)?;
    let location = DocumentUri::parse(script.location.as_deref().unwrap_or(document.path()));
    let mut nav = Navigator::new(
        document,
        index,
        config,
        location,
        script.framed,
        CountingSurface::default(),
        QueuedScroller::default(),
    );

    let mut events = Vec::new();
    if let Some(viewport) = script.viewport {
        nav.on_resize(viewport);
    }
    let loaded = nav.on_load();
    events.push(format!("load: {}", describe_load(&nav, loaded)));

    for step in &script.steps {
        play(&mut nav, step, &mut events)?;
    }

    return Ok(build_report(&nav, events));
}

/// Apply one step and log what it did.
///
/// # Errors
///
/// Returns selector errors.
fn play(
    nav: &mut Navigator<CountingSurface, QueuedScroller>,
    step: &Step,
    events: &mut Vec<String>,
) -> Result<(), Error> {
    match step {
        Step::Click(raw) => {
            let node = resolve_selector(nav, raw)?;
            let outcome = match nav.on_click(node) {
                ClickOutcome::Ignored => "ignored".to_string(),
                ClickOutcome::Navigating(ticket) => format!("navigating (ticket {})", ticket.0),
            };
            events.push(format!("click {raw}: {outcome}"));
        },
        Step::Enter(raw) => {
            let node = resolve_selector(nav, raw)?;
            let count = nav.on_pointer_enter(node);
            events.push(format!("enter {raw}: {count} highlighted"));
        },
        Step::Finish(order) => {
            let tickets = match order {
                FinishOrder::All => nav.scroller_mut().finish_all(),
                FinishOrder::Latest => nav.scroller_mut().finish_latest().into_iter().collect(),
                FinishOrder::Oldest => nav.scroller_mut().finish_oldest().into_iter().collect(),
            };
            if tickets.is_empty() {
                events.push("finish: nothing pending".to_string());
            }
            for ticket in tickets {
                let completion = nav.on_scroll_complete(ticket);
                events.push(format!("finish ticket {}: {}", ticket.0, describe_completion(nav, completion)));
            }
        },
        Step::Leave(raw) => {
            let node = resolve_selector(nav, raw)?;
            let count = nav.on_pointer_leave(node);
            events.push(format!("leave {raw}: {count} released"));
        },
        Step::Resize(viewport) => {
            nav.on_resize(*viewport);
            events.push(format!("resize: {}x{}", viewport.width, viewport.height));
        },
    }
    return Ok(());
}

/// Parse selector syntax.
///
/// # Errors
///
/// Returns `Error::InvalidSelector` for anything but `#id`, `@id[:N]`, or `%N`.
fn parse_selector(raw: &str) -> Result<Selector, Error> {
    let invalid = |reason| {
        return Error::InvalidSelector {
            reason,
            selector: raw.to_string(),
        };
    };

    if let Some(identifier) = raw.strip_prefix('#') {
        if identifier.is_empty() {
            return Err(invalid("empty identifier"));
        }
        return Ok(Selector::Definition(identifier.to_string()));
    }
    if let Some(rest) = raw.strip_prefix('@') {
        let (identifier, nth) = match rest.rsplit_once(':') {
            Some((id, n)) => match n.parse::<usize>() {
                Ok(n) => (id, n),
                Err(_) => (rest, 0),
            },
            None => (rest, 0),
        };
        if identifier.is_empty() {
            return Err(invalid("empty identifier"));
        }
        return Ok(Selector::Reference {
            identifier: identifier.to_string(),
            nth,
        });
    }
    if let Some(number) = raw.strip_prefix('%') {
        return number
            .parse::<usize>()
            .map(Selector::Node)
            .map_err(|_| return invalid("node number expected after %"));
    }
    return Err(invalid("expected #id, @id[:N], or %N"));
}

/// Resolve selector text against the navigator's document and index.
///
/// # Errors
///
/// Returns `Error::InvalidSelector` or `Error::UnknownSelector`.
fn resolve_selector(
    nav: &Navigator<CountingSurface, QueuedScroller>,
    raw: &str,
) -> Result<NodeId, Error> {
    let found = match parse_selector(raw)? {
        Selector::Definition(identifier) => nav.index().definition_of(&identifier),
        Selector::Node(n) => Some(NodeId(n)).filter(|id| return nav.document().node(*id).is_some()),
        Selector::Reference { identifier, nth } => {
            nav.index().references_of(&identifier).get(nth).copied()
        },
    };
    return found.ok_or_else(|| {
        return Error::UnknownSelector {
            selector: raw.to_string(),
        };
    });
}

/// Short label for an element: its role, or its tag for plain nodes.
fn describe(nav: &Navigator<CountingSurface, QueuedScroller>, node: NodeId) -> String {
    let tag = nav.document().tag(node).unwrap_or("#text");
    return match nav.index().role_of(node) {
        Role::Both { identifier, target } => format!("{node} <{tag}> #{identifier} -> #{target}"),
        Role::Definition(identifier) => format!("{node} <{tag}> #{identifier}"),
        Role::Plain => format!("{node} <{tag}>"),
        Role::Reference(target) => format!("{node} <{tag}> -> #{target}"),
    };
}

/// Log text for a load outcome.
fn describe_load(nav: &Navigator<CountingSurface, QueuedScroller>, outcome: LoadOutcome) -> String {
    return match outcome {
        LoadOutcome::Idle => "no navigation parameter".to_string(),
        LoadOutcome::Navigating(ticket) => format!("navigating (ticket {})", ticket.0),
        LoadOutcome::Redirected(node) => format!("redirected to {}", describe(nav, node)),
        LoadOutcome::Unresolved => "navigation parameter names no definition".to_string(),
    };
}

/// Log text for a scroll completion.
fn describe_completion(nav: &Navigator<CountingSurface, QueuedScroller>, completion: Completion) -> String {
    return match completion {
        Completion::FragmentSet(node) => format!("location now {} ({})", nav.location(), describe(nav, node)),
        Completion::Highlighted(node) => format!("exclusive {}", describe(nav, node)),
        Completion::Superseded => "superseded".to_string(),
    };
}

/// Snapshot the navigator into a report.
fn build_report(nav: &Navigator<CountingSurface, QueuedScroller>, events: Vec<String>) -> Report {
    let element = |node| {
        return ElementReport {
            label: describe(nav, node),
            node,
        };
    };
    return Report {
        events,
        exclusive: nav.highlights().exclusive().map(element),
        export: nav.export_snippet().map(|s| return s.to_string()),
        highlighted: nav.highlights().highlighted().into_iter().map(element).collect(),
        in_flight: nav.pending(),
        location: nav.location().href(),
        pending: nav.scroller().pending().map(PendingScroll::from).collect(),
        pop_out: nav.pop_out_uri(),
        share: nav.share_uri(),
        surface_writes: nav.highlights().surface().writes(),
    };
}

/// Render a report as plain text.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    for event in &report.events {
        let _ = writeln!(out, "{event}");
    }
    out.push('\n');
    if report.highlighted.is_empty() {
        out.push_str("highlighted: (none)\n");
    } else {
        out.push_str("highlighted:\n");
        for element in &report.highlighted {
            let _ = writeln!(out, "  {}", element.label);
        }
    }
    match &report.exclusive {
        Some(element) => {
            let _ = writeln!(out, "exclusive:   {}", element.label);
        },
        None => out.push_str("exclusive:   (none)\n"),
    }
    let _ = writeln!(out, "location:    {}", report.location);
    let _ = writeln!(out, "share:       {}", report.share);
    let _ = writeln!(out, "pop-out:     {}", report.pop_out);
    if let Some(export) = &report.export {
        let _ = writeln!(out, "export:      {export}");
    }
    if let Some(ticket) = report.in_flight {
        let _ = writeln!(out, "in flight:   ticket {}", ticket.0);
    }
    for pending in &report.pending {
        let state = if pending.cancelled { "cancelled" } else { "running" };
        let _ = writeln!(
            out,
            "pending:     ticket {} to {} ({state}, {}ms)",
            pending.ticket.0, pending.target, pending.duration_ms
        );
    }
    return out;
}
