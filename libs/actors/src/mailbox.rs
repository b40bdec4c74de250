//! Actor mailbox: ordered, concurrently-writable message holding area
//!
//! Each actor owns exactly one [`Mailbox`] (the consumer half); any number of
//! peers hold cloned [`MailboxSender`]s (the producer half). The mailbox is a
//! single FIFO queue shared across all producers: messages come out in enqueue
//! order, which also guarantees FIFO per sender. Dequeue never blocks — the
//! owning loop polls and gets `None` when the queue is empty.
//!
//! Built on an unbounded tokio MPSC channel, which provides the
//! multi-producer/single-consumer safety the substrate requires while keeping
//! the non-blocking-dequeue polling contract.

use crate::error::{ActorError, Result};
use crate::messages::Message;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Enqueue/dequeue counters shared by every handle to one mailbox
#[derive(Debug, Default)]
pub struct MailboxMetrics {
    pub messages_enqueued: AtomicU64,
    pub messages_dequeued: AtomicU64,
}

impl MailboxMetrics {
    /// Messages currently buffered (enqueued minus dequeued)
    pub fn depth(&self) -> u64 {
        let enqueued = self.messages_enqueued.load(Ordering::Acquire);
        let dequeued = self.messages_dequeued.load(Ordering::Acquire);
        enqueued.saturating_sub(dequeued)
    }

    /// Point-in-time snapshot for diagnostics
    pub fn snapshot(&self) -> MailboxStats {
        MailboxStats {
            messages_enqueued: self.messages_enqueued.load(Ordering::Acquire),
            messages_dequeued: self.messages_dequeued.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time mailbox counters
#[derive(Debug, Clone, Serialize)]
pub struct MailboxStats {
    pub messages_enqueued: u64,
    pub messages_dequeued: u64,
}

/// Producer half of a mailbox
///
/// Cheap to clone; any number of clones may enqueue concurrently while the
/// owner dequeues.
#[derive(Debug, Clone)]
pub struct MailboxSender {
    tx: mpsc::UnboundedSender<Message>,
    owner: Arc<str>,
    metrics: Arc<MailboxMetrics>,
}

impl MailboxSender {
    /// Append a message at the tail of the owner's queue.
    ///
    /// Succeeds whether or not the owner's loop is running (messages are
    /// buffered across stop/start); fails only if the owning actor has been
    /// dropped entirely.
    pub fn enqueue(&self, msg: Message) -> Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| ActorError::MailboxClosed {
                peer: self.owner.as_ref().to_owned(),
            })?;
        self.metrics.messages_enqueued.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Diagnostic name of the owning actor
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

/// Consumer half of a mailbox, owned by exactly one actor's processing loop
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::UnboundedReceiver<Message>,
    metrics: Arc<MailboxMetrics>,
}

impl Mailbox {
    /// Remove and return the oldest message, or `None` if the queue is
    /// empty. Never blocks; callers poll.
    pub fn dequeue(&mut self) -> Option<Message> {
        match self.rx.try_recv() {
            Ok(msg) => {
                self.metrics.messages_dequeued.fetch_add(1, Ordering::AcqRel);
                Some(msg)
            }
            Err(_) => None,
        }
    }

    /// Shared counters for this mailbox
    pub fn metrics(&self) -> Arc<MailboxMetrics> {
        Arc::clone(&self.metrics)
    }
}

/// Create a connected sender/mailbox pair for the named owner
pub fn channel(owner: &str) -> (MailboxSender, Mailbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    let metrics = Arc::new(MailboxMetrics::default());

    let sender = MailboxSender {
        tx,
        owner: Arc::from(owner),
        metrics: Arc::clone(&metrics),
    };
    let mailbox = Mailbox { rx, metrics };

    (sender, mailbox)
}
