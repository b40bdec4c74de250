//! Substrate-level errors for actor lifecycle and message delivery
//!
//! The modeled domain is a closed, local protocol, so the taxonomy is
//! deliberately narrow: lifecycle misuse, delivery to a dropped actor, and
//! abnormal worker shutdown. Unrecognized message tags are NOT errors — the
//! receiving role silently consumes them.

use thiserror::Error;

/// Errors surfaced by actor lifecycle calls and message delivery
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// `start()` was called while a worker is already running.
    ///
    /// The running worker is left untouched; no second worker is spawned.
    #[error("actor {actor} is already started; call stop() before starting it again")]
    AlreadyStarted { actor: String },

    /// `stop()` was called with no worker running
    #[error("actor {actor} is not running")]
    NotRunning { actor: String },

    /// The destination actor was dropped; its mailbox no longer accepts
    /// messages. A merely *stopped* actor still accepts them (buffered for
    /// a future restart).
    #[error("mailbox of {peer} is closed; the actor was dropped")]
    MailboxClosed { peer: String },

    /// The worker task did not shut down cleanly during `stop()`.
    ///
    /// The actor's role state travelled with the worker and is lost with it,
    /// so the actor cannot be restarted after this error.
    #[error("worker of {actor} failed to shut down cleanly: {reason}")]
    WorkerJoin { actor: String, reason: String },

    /// `start()` was called after the worker was lost to an abnormal
    /// shutdown (see [`ActorError::WorkerJoin`])
    #[error("actor {actor} lost its role state in an abnormal shutdown and cannot be restarted")]
    Defunct { actor: String },
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, ActorError>;
