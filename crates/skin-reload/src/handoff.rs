//! # Hand-off Queue
//!
//! The only resource shared between the network runtime and the host thread.
//!
//! Built on `tokio::sync::mpsc::unbounded_channel`:
//! - [`HandoffSender`] is `Clone + Send + Sync`; every request task holds one.
//! - [`HandoffReceiver`] is not `Clone`, so there is exactly one consumer.
//!
//! Per-sender FIFO and no loss/no duplication come from the channel itself.
//! Neither side takes a caller-visible lock, and the receiver never waits:
//! [`HandoffReceiver::drain_pending`] only takes what is already queued.
//!
//! The queue is unbounded. Sustained overload grows memory; the sender logs a
//! warning every time the pending count reaches a multiple of the configured
//! threshold, but never drops or rejects work.

use crate::domain::error::RequestError;
use crate::domain::request::PendingRequest;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Counters shared by both ends of the queue.
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total requests accepted into the queue
    pub total_enqueued: AtomicU64,
    /// Total requests taken out by the dispatcher
    pub total_dequeued: AtomicU64,
}

impl QueueStats {
    /// Requests enqueued but not yet dequeued.
    ///
    /// Approximate under concurrent traffic; exact once producers are quiet.
    pub fn pending(&self) -> u64 {
        let enqueued = self.total_enqueued.load(Ordering::Acquire);
        let dequeued = self.total_dequeued.load(Ordering::Acquire);
        enqueued.saturating_sub(dequeued)
    }
}

/// Create a connected sender/receiver pair.
pub fn channel(warn_threshold: usize) -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stats = Arc::new(QueueStats::default());

    let sender = HandoffSender {
        tx,
        stats: Arc::clone(&stats),
        warn_threshold: warn_threshold.max(1) as u64,
    };
    let receiver = HandoffReceiver { rx, stats };

    (sender, receiver)
}

/// Producer half, cloned into every request task.
#[derive(Debug, Clone)]
pub struct HandoffSender {
    tx: mpsc::UnboundedSender<PendingRequest>,
    stats: Arc<QueueStats>,
    warn_threshold: u64,
}

impl HandoffSender {
    /// Append a request. Never blocks.
    ///
    /// Returns the pending count observed after the push. Fails only when the
    /// receiver has been dropped.
    pub fn enqueue(&self, request: PendingRequest) -> Result<u64, RequestError> {
        self.tx
            .send(request)
            .map_err(|_| RequestError::QueueClosed)?;

        self.stats.total_enqueued.fetch_add(1, Ordering::AcqRel);
        let pending = self.stats.pending();

        if pending >= self.warn_threshold && pending % self.warn_threshold == 0 {
            warn!(
                pending = pending,
                threshold = self.warn_threshold,
                "Reload queue is growing; host ticks are not keeping up"
            );
        }

        Ok(pending)
    }

    /// Requests enqueued but not yet dequeued.
    pub fn pending(&self) -> u64 {
        self.stats.pending()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// True once the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the tick dispatcher.
#[derive(Debug)]
pub struct HandoffReceiver {
    rx: mpsc::UnboundedReceiver<PendingRequest>,
    stats: Arc<QueueStats>,
}

impl HandoffReceiver {
    /// Take every request queued at the moment of the call, in FIFO order.
    ///
    /// Requests pushed while the returned iterator is consumed are left for
    /// the next call, so one tick's work is bounded by the snapshot length.
    pub fn drain_pending(&mut self) -> impl Iterator<Item = PendingRequest> + '_ {
        let snapshot = self.rx.len();
        let rx = &mut self.rx;
        let stats = &self.stats;

        if snapshot > 0 {
            debug!(count = snapshot, "Draining reload queue");
        }

        (0..snapshot).map_while(move |_| {
            let request = rx.try_recv().ok()?;
            stats.total_dequeued.fetch_add(1, Ordering::AcqRel);
            Some(request)
        })
    }

    /// Number of requests currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}
