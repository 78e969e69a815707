//! Concurrent Fan-out Machinery
//!
//! Every coordinator issues one request per realm at the same time and
//! folds outcomes in arrival order. A bounded channel sized to the realm
//! count means no task ever blocks on send, and dropping the receiver
//! after an early decision simply discards the stragglers.

use std::future::Future;

use tokio::sync::mpsc;

/// Spawn one task per context and stream `(index, outcome)` pairs back in
/// completion order.
///
/// `make` must produce an owned future; each task holds its context for its
/// whole lifetime, so a coordinator that returns early never invalidates a
/// borrow.
pub(crate) fn fan_out<Ctx, O, F, Fut>(contexts: Vec<Ctx>, make: F) -> mpsc::Receiver<(usize, O)>
where
    Ctx: Send + 'static,
    O: Send + 'static,
    F: Fn(usize, Ctx) -> Fut,
    Fut: Future<Output = O> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(contexts.len().max(1));
    for (index, ctx) in contexts.into_iter().enumerate() {
        let tx = tx.clone();
        let fut = make(index, ctx);
        tokio::spawn(async move {
            let outcome = fut.await;
            // The receiver is dropped once the coordinator decides; a
            // straggler's send failure is expected, not an error.
            let _ = tx.send((index, outcome)).await;
        });
    }
    rx
}

/// Write-once record of which realm produced an outcome.
///
/// A misbehaving transport that reports twice for the same realm must not
/// be counted twice toward any quorum.
pub(crate) struct OutcomeSlots {
    seen: Vec<bool>,
    written: usize,
}

impl OutcomeSlots {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            seen: vec![false; count],
            written: 0,
        }
    }

    /// Record an outcome for one realm. Returns `false` when that realm
    /// already reported (the duplicate must be discarded).
    pub(crate) fn record(&mut self, index: usize) -> bool {
        if self.seen[index] {
            return false;
        }
        self.seen[index] = true;
        self.written += 1;
        true
    }

    /// How many realms have reported so far
    pub(crate) fn written(&self) -> usize {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_write_once() {
        let mut slots = OutcomeSlots::new(3);
        assert!(slots.record(1));
        assert!(!slots.record(1));
        assert!(slots.record(0));
        assert_eq!(slots.written(), 2);
    }

    #[tokio::test]
    async fn test_fan_out_delivers_every_outcome() {
        let mut rx = fan_out(vec![10u32, 20, 30], |index, value| async move {
            value + index as u32
        });

        let mut outcomes = Vec::new();
        while let Some(pair) = rx.recv().await {
            outcomes.push(pair);
        }
        outcomes.sort();
        assert_eq!(outcomes, vec![(0, 10), (1, 21), (2, 32)]);
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_panic_tasks() {
        let rx = fan_out(vec![(); 8], |_, _| async {});
        drop(rx);
        // Give the spawned tasks a chance to hit the closed channel.
        tokio::task::yield_now().await;
    }
}
