//! Single-slot render queue.
//!
//! At most one page render is in flight. A request made while one is in
//! flight waits in a single pending slot; a newer request replaces it.

use log::debug;

/// What happened to a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Nothing was in flight; this page starts rendering now.
    Started(u32),
    /// Parked behind the in-flight render, dropping `superseded` if any.
    Queued { page: u32, superseded: Option<u32> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderQueue {
    in_flight: Option<u32>,
    pending: Option<u32>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for `page` to be rendered.
    pub fn request(&mut self, page: u32) -> QueueOutcome {
        if self.in_flight.is_none() {
            self.in_flight = Some(page);
            return QueueOutcome::Started(page);
        }
        let superseded = self.pending.replace(page);
        if let Some(dropped) = superseded {
            debug!("pending render of page {} superseded by page {}", dropped, page);
        }
        QueueOutcome::Queued { page, superseded }
    }

    /// Mark the in-flight render finished and start the pending one, if any.
    pub fn complete(&mut self) -> Option<u32> {
        self.in_flight = self.pending.take();
        self.in_flight
    }

    pub fn in_flight(&self) -> Option<u32> {
        self.in_flight
    }

    pub fn pending(&self) -> Option<u32> {
        self.pending
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Forget everything, e.g. when the document is replaced.
    pub fn reset(&mut self) {
        self.in_flight = None;
        self.pending = None;
    }
}
