//! Per-checkout submission locks.
//!
//! Payment confirmation and order placement are critical sections: at most
//! one attempt may be in flight per checkout. The lock is keyed by the
//! checkout's `flow_id` and held for the duration of the remote call; a
//! second request while the permit is out is refused instead of queued.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

/// Tracks which checkouts have a submission in flight.
#[derive(Debug, Default)]
pub struct SubmissionGuards {
    inflight: Mutex<HashSet<Uuid>>,
}

impl SubmissionGuards {
    /// Try to claim the submission lock for a checkout.
    ///
    /// Returns `None` if a submission for the same checkout is already in
    /// flight. The permit releases the lock on drop, including on error
    /// paths and panics.
    #[must_use]
    pub fn acquire(&self, flow_id: Uuid) -> Option<SubmissionPermit<'_>> {
        let mut inflight = self
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if inflight.insert(flow_id) {
            Some(SubmissionPermit {
                guards: self,
                flow_id,
            })
        } else {
            None
        }
    }
}

/// An exclusive right to run one submission for one checkout.
#[derive(Debug)]
pub struct SubmissionPermit<'a> {
    guards: &'a SubmissionGuards,
    flow_id: Uuid,
}

impl Drop for SubmissionPermit<'_> {
    fn drop(&mut self) {
        self.guards
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.flow_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_refused_while_held() {
        let guards = SubmissionGuards::default();
        let flow = Uuid::new_v4();

        let permit = guards.acquire(flow);
        assert!(permit.is_some());
        assert!(guards.acquire(flow).is_none());

        drop(permit);
        assert!(guards.acquire(flow).is_some());
    }

    #[test]
    fn test_distinct_checkouts_do_not_block_each_other() {
        let guards = SubmissionGuards::default();
        let _a = guards.acquire(Uuid::new_v4());
        assert!(guards.acquire(Uuid::new_v4()).is_some());
    }
}
