//! Protocol messages exchanged between actors
//!
//! A [`Message`] is a tagged unit of communication: a [`MessageTag`] saying
//! what the message is, an optional [`Payload`], and a reply address
//! identifying the sender. Messages are immutable once enqueued — the tag and
//! reply address are fixed at enqueue time, and ownership transfers to the
//! receiving mailbox.

use crate::actor::ActorRef;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol tag carried by every message (the "what" of the exchange)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageTag {
    /// Client asks the server to record its registration
    RegisterClient,
    /// Server tells the client its registration was recorded
    RegisteredClient,
    /// Client confirms it observed the registration
    RegistrationConfirmed,
    /// Client asks the server to drop its registration
    UnregisterClient,
    /// Server tells the client its registration was dropped
    UnregisteredClient,
    /// Server announces liveness to a client
    IsServerAlive,
    /// Generic acknowledgment for server announcements
    CallbackInvoked,
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageTag::RegisterClient => "REGISTER_CLIENT",
            MessageTag::RegisteredClient => "REGISTERED_CLIENT",
            MessageTag::RegistrationConfirmed => "REGISTRATION_CONFIRMED",
            MessageTag::UnregisterClient => "UNREGISTER_CLIENT",
            MessageTag::UnregisteredClient => "UNREGISTERED_CLIENT",
            MessageTag::IsServerAlive => "IS_SERVER_ALIVE",
            MessageTag::CallbackInvoked => "CALLBACK_INVOKED",
        };
        f.write_str(name)
    }
}

/// Payload carried alongside a tag
///
/// A closed sum type over the kinds the substrate actually moves, in place of
/// an untyped opaque reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw bytes, shared without copying
    Bytes(Bytes),
    /// Human-readable text
    Text(String),
}

impl Payload {
    /// Payload size in bytes, for diagnostics
    pub fn len(&self) -> usize {
        match self {
            Payload::Bytes(b) => b.len(),
            Payload::Text(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tagged unit of communication between actors
///
/// Created by the sender immediately before enqueueing. Not clonable:
/// ownership moves through the mailbox to the receiving actor, which holds it
/// exclusively until it is dropped.
#[derive(Debug)]
pub struct Message {
    tag: MessageTag,
    payload: Option<Payload>,
    reply_to: ActorRef,
}

impl Message {
    /// Create a message with no payload
    pub fn new(tag: MessageTag, reply_to: ActorRef) -> Self {
        Self {
            tag,
            payload: None,
            reply_to,
        }
    }

    /// Create a message carrying a payload
    pub fn with_payload(tag: MessageTag, payload: Payload, reply_to: ActorRef) -> Self {
        Self {
            tag,
            payload: Some(payload),
            reply_to,
        }
    }

    pub fn tag(&self) -> MessageTag {
        self.tag
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// The sender's handle, used by the receiver to address its response
    pub fn reply_to(&self) -> &ActorRef {
        &self.reply_to
    }

    /// Re-stamp the reply address, overwriting any prior value.
    ///
    /// Used by the relay form of `send` when forwarding a message constructed
    /// elsewhere. Consumes the message so a stamped tag/reply pair can never
    /// change after enqueue.
    pub(crate) fn stamped(mut self, reply_to: ActorRef) -> Self {
        self.reply_to = reply_to;
        self
    }
}
