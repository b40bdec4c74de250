//! Actor-Based Message Passing Substrate
//!
//! In-process actor runtime for Parley. Two role-typed actors — a server and
//! a client — each run a dedicated polling loop over their own mailbox and
//! exchange tagged messages to perform a multi-step registration handshake.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                  ┌──────────────────────┐
//! │   Actor<ServerRole>  │                  │   Actor<ClientRole>  │
//! │                      │ REGISTER_CLIENT  │                      │
//! │  ┌────────────────┐  │◀─────────────────┼──┤ registerToServer  │
//! │  │    Mailbox     │  │ REGISTERED_CLIENT│  ┌────────────────┐  │
//! │  │  (MPSC, FIFO)  ├──┼─────────────────▶│  │    Mailbox     │  │
//! │  └────────────────┘  │ REGISTRATION_    │  │  (MPSC, FIFO)  │  │
//! │   poll loop, 1 msg   │    CONFIRMED     │  └────────────────┘  │
//! │   per iteration      │◀─────────────────┼── poll loop, 1 msg   │
//! └──────────────────────┘                  │   per iteration      │
//!                                           └──────────────────────┘
//! ```
//!
//! # Properties
//!
//! - **FIFO delivery**: one queue per mailbox, shared across producers;
//!   per-sender order is preserved.
//! - **Non-blocking dequeue**: an empty mailbox never suspends the worker;
//!   the loop polls and yields (or sleeps, per [`IdleStrategy`]).
//! - **Restartable lifecycle**: `stop()` joins the worker and parks the role
//!   state; messages buffered while stopped survive into the next `start()`.
//! - **One message per iteration**: actors never multiplex protocol steps.
//!   Protocol variants whose handlers wait synchronously for replies
//!   deadlock by design — the substrate does not paper over it.

pub mod actor;
pub mod error;
pub mod mailbox;
pub mod messages;
pub mod protocol;

pub use actor::{
    Actor, ActorContext, ActorId, ActorMetrics, ActorRef, ActorStats, ActorStatus, IdleStrategy,
    Role,
};
pub use error::{ActorError, Result};
pub use mailbox::{Mailbox, MailboxMetrics, MailboxSender, MailboxStats};
pub use messages::{Message, MessageTag, Payload};
pub use protocol::{
    ClientRole, ClientStats, ClientStatsSnapshot, ServerRole, ServerStats, ServerStatsSnapshot,
};
