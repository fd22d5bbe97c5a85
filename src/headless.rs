//! Headless collaborators: a surface that counts what it paints and a
//! scroller that queues animations until told to finish them.

use std::collections::VecDeque;

use crate::highlight::Surface;
use crate::navigation::{ScrollRequest, Scroller, Ticket};
use crate::types::NodeId;

/// Counts on/off transitions.
#[derive(Debug, Default)]
pub struct CountingSurface {
    /// Number of transitions received.
    writes: usize,
}

impl CountingSurface {
    /// Number of transitions painted so far.
    pub fn writes(&self) -> usize {
        return self.writes;
    }
}

impl Surface for CountingSurface {
    fn set_highlighted(&mut self, _node: NodeId, _highlighted: bool) {
        self.writes = self.writes.saturating_add(1);
    }
}

/// A queued animation. Cancelled ones stay queued: a completion may race the
/// cancellation, and the navigator has to cope with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedScroll {
    /// Whether the navigator asked to abandon it.
    pub cancelled: bool,
    /// The original request.
    pub request: ScrollRequest,
}

/// Holds animations until the driver finishes them.
#[derive(Debug, Default)]
pub struct QueuedScroller {
    /// Unfinished animations, oldest first.
    queue: VecDeque<QueuedScroll>,
}

impl QueuedScroller {
    /// Unfinished animations, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &QueuedScroll> {
        return self.queue.iter();
    }

    /// Finish the oldest animation.
    pub fn finish_oldest(&mut self) -> Option<Ticket> {
        return self.queue.pop_front().map(|q| return q.request.ticket);
    }

    /// Finish the newest animation.
    pub fn finish_latest(&mut self) -> Option<Ticket> {
        return self.queue.pop_back().map(|q| return q.request.ticket);
    }

    /// Finish everything, oldest first.
    pub fn finish_all(&mut self) -> Vec<Ticket> {
        return self.queue.drain(..).map(|q| return q.request.ticket).collect();
    }
}

impl Scroller for QueuedScroller {
    fn scroll_to(&mut self, request: ScrollRequest) {
        self.queue.push_back(QueuedScroll {
            cancelled: false,
            request,
        });
    }

    fn cancel(&mut self, ticket: Ticket) {
        for queued in &mut self.queue {
            if queued.request.ticket == ticket {
                queued.cancelled = true;
            }
        }
    }
}
