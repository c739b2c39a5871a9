//! Wall-clock latency measurement over protocol milestones.

use std::time::{Duration, Instant};

/// The two milestones a turn is timed between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    RequestSent,
    ResponseComplete,
}

/// Records at most one timestamp per milestone and reports the elapsed time
/// between them. `elapsed` is only meaningful once both are marked.
#[derive(Debug, Default)]
pub struct LatencyTracker {
    request_sent: Option<Instant>,
    response_complete: Option<Instant>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current time for a milestone. Repeated marks for the same
    /// milestone are ignored; the first one wins.
    pub fn mark(&mut self, milestone: Milestone) {
        let slot = match milestone {
            Milestone::RequestSent => &mut self.request_sent,
            Milestone::ResponseComplete => &mut self.response_complete,
        };
        if slot.is_none() {
            *slot = Some(Instant::now());
        }
    }

    /// Time between request sent and response complete, if both were marked.
    pub fn elapsed(&self) -> Option<Duration> {
        let start = self.request_sent?;
        let end = self.response_complete?;
        Some(end.duration_since(start))
    }

    /// Clears both milestones for the next turn.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
