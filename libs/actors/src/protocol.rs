//! Registration handshake protocol: server and client roles
//!
//! The handshake is a 3-tag exchange layered on the actor substrate:
//!
//! ```text
//! client ── REGISTER_CLIENT ──────────▶ server
//! client ◀─ REGISTERED_CLIENT ──────── server
//! client ── REGISTRATION_CONFIRMED ──▶ server   (terminal; no reply)
//! ```
//!
//! Two smaller exchanges ride on the same tags and roles: unregistration
//! (UNREGISTER_CLIENT / UNREGISTERED_CLIENT) and a liveness announcement
//! (IS_SERVER_ALIVE, acknowledged with CALLBACK_INVOKED).
//!
//! Protocol state lives in the tags exchanged, not in stored fields; the
//! roles keep only counters and the server's registered-client set. Tags a
//! role does not recognize are consumed silently.
//!
//! Because each actor processes strictly one inbound message per loop
//! iteration, any protocol variant whose handler waits synchronously for a
//! reply that only its own loop could dequeue will deadlock. The roles here
//! never wait inside a handler; the hazard itself is exercised by the
//! crate's deadlock tests.

use crate::actor::{Actor, ActorContext, ActorId, Role};
use crate::error::Result;
use crate::messages::{Message, MessageTag};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Counters kept by a server role, shared with the driver
#[derive(Debug, Default)]
pub struct ServerStats {
    pub registrations_received: AtomicU64,
    pub confirmations_received: AtomicU64,
    pub unregistrations_received: AtomicU64,
    pub liveness_acks_received: AtomicU64,
    pub unknown_ignored: AtomicU64,
    registered: Mutex<HashSet<ActorId>>,
}

impl ServerStats {
    /// Number of currently registered clients
    pub fn registered_clients(&self) -> usize {
        self.registered.lock().len()
    }

    /// Whether the given client is currently registered
    pub fn is_registered(&self, client: &ActorId) -> bool {
        self.registered.lock().contains(client)
    }

    pub fn snapshot(&self) -> ServerStatsSnapshot {
        ServerStatsSnapshot {
            registrations_received: self.registrations_received.load(Ordering::Acquire),
            confirmations_received: self.confirmations_received.load(Ordering::Acquire),
            unregistrations_received: self.unregistrations_received.load(Ordering::Acquire),
            liveness_acks_received: self.liveness_acks_received.load(Ordering::Acquire),
            unknown_ignored: self.unknown_ignored.load(Ordering::Acquire),
            registered_clients: self.registered_clients(),
        }
    }
}

/// Point-in-time server counters
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatsSnapshot {
    pub registrations_received: u64,
    pub confirmations_received: u64,
    pub unregistrations_received: u64,
    pub liveness_acks_received: u64,
    pub unknown_ignored: u64,
    pub registered_clients: usize,
}

/// Server side of the registration handshake
pub struct ServerRole {
    stats: Arc<ServerStats>,
}

impl ServerRole {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(ServerStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for ServerRole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Role for ServerRole {
    fn name(&self) -> &'static str {
        "server"
    }

    async fn process_message(&mut self, msg: Message, ctx: &ActorContext) -> Result<()> {
        match msg.tag() {
            MessageTag::RegisterClient => {
                self.stats
                    .registrations_received
                    .fetch_add(1, Ordering::AcqRel);
                self.stats
                    .registered
                    .lock()
                    .insert(msg.reply_to().id().clone());
                info!(server = %ctx.self_ref(), client = %msg.reply_to(), "registering client");
                ctx.send(msg.reply_to(), MessageTag::RegisteredClient)?;
            }
            MessageTag::RegistrationConfirmed => {
                self.stats
                    .confirmations_received
                    .fetch_add(1, Ordering::AcqRel);
                info!(server = %ctx.self_ref(), client = %msg.reply_to(), "client registration confirmed");
            }
            MessageTag::UnregisterClient => {
                self.stats
                    .unregistrations_received
                    .fetch_add(1, Ordering::AcqRel);
                self.stats.registered.lock().remove(msg.reply_to().id());
                info!(server = %ctx.self_ref(), client = %msg.reply_to(), "unregistering client");
                ctx.send(msg.reply_to(), MessageTag::UnregisteredClient)?;
            }
            MessageTag::CallbackInvoked => {
                self.stats
                    .liveness_acks_received
                    .fetch_add(1, Ordering::AcqRel);
                debug!(server = %ctx.self_ref(), client = %msg.reply_to(), "liveness acknowledged");
            }
            other => {
                self.stats.unknown_ignored.fetch_add(1, Ordering::AcqRel);
                trace!(server = %ctx.self_ref(), tag = %other, "ignoring unhandled tag");
            }
        }
        Ok(())
    }
}

/// Counters kept by a client role, shared with the driver
#[derive(Debug, Default)]
pub struct ClientStats {
    /// REGISTERED_CLIENT messages processed (one per successful handshake)
    pub registrations_acknowledged: AtomicU64,
    /// UNREGISTERED_CLIENT receipts processed
    pub unregistrations_acknowledged: AtomicU64,
    /// IS_SERVER_ALIVE announcements processed
    pub liveness_announcements: AtomicU64,
    pub unknown_ignored: AtomicU64,
}

impl ClientStats {
    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            registrations_acknowledged: self.registrations_acknowledged.load(Ordering::Acquire),
            unregistrations_acknowledged: self
                .unregistrations_acknowledged
                .load(Ordering::Acquire),
            liveness_announcements: self.liveness_announcements.load(Ordering::Acquire),
            unknown_ignored: self.unknown_ignored.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time client counters
#[derive(Debug, Clone, Serialize)]
pub struct ClientStatsSnapshot {
    pub registrations_acknowledged: u64,
    pub unregistrations_acknowledged: u64,
    pub liveness_announcements: u64,
    pub unknown_ignored: u64,
}

/// Client side of the registration handshake
pub struct ClientRole {
    stats: Arc<ClientStats>,
}

impl ClientRole {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(ClientStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<ClientStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for ClientRole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Role for ClientRole {
    fn name(&self) -> &'static str {
        "client"
    }

    async fn process_message(&mut self, msg: Message, ctx: &ActorContext) -> Result<()> {
        match msg.tag() {
            MessageTag::RegisteredClient => {
                self.stats
                    .registrations_acknowledged
                    .fetch_add(1, Ordering::AcqRel);
                info!(client = %ctx.self_ref(), server = %msg.reply_to(), "confirming registration");
                ctx.send(msg.reply_to(), MessageTag::RegistrationConfirmed)?;
            }
            MessageTag::UnregisteredClient => {
                self.stats
                    .unregistrations_acknowledged
                    .fetch_add(1, Ordering::AcqRel);
                info!(client = %ctx.self_ref(), server = %msg.reply_to(), "unregistered from server");
            }
            MessageTag::IsServerAlive => {
                self.stats
                    .liveness_announcements
                    .fetch_add(1, Ordering::AcqRel);
                info!(client = %ctx.self_ref(), server = %msg.reply_to(), "server is alive");
                ctx.send(msg.reply_to(), MessageTag::CallbackInvoked)?;
            }
            other => {
                self.stats.unknown_ignored.fetch_add(1, Ordering::AcqRel);
                trace!(client = %ctx.self_ref(), tag = %other, "ignoring unhandled tag");
            }
        }
        Ok(())
    }
}

impl Actor<ServerRole> {
    /// Construct a server actor; returns its shared stats alongside it
    pub fn server() -> (Self, Arc<ServerStats>) {
        let role = ServerRole::new();
        let stats = role.stats();
        (Actor::with_role(role), stats)
    }

    /// Announce liveness to a client; the client replies CALLBACK_INVOKED
    pub fn announce_alive(&self, client: &crate::actor::ActorRef) -> Result<()> {
        self.send(client, MessageTag::IsServerAlive)
    }
}

impl Actor<ClientRole> {
    /// Construct a client actor; returns its shared stats alongside it
    pub fn client() -> (Self, Arc<ClientStats>) {
        let role = ClientRole::new();
        let stats = role.stats();
        (Actor::with_role(role), stats)
    }

    /// Initiate the registration handshake: exactly
    /// `send(server, REGISTER_CLIENT)`
    pub fn register_to_server(&self, server: &crate::actor::ActorRef) -> Result<()> {
        self.send(server, MessageTag::RegisterClient)
    }

    /// Ask the server to drop this client's registration
    pub fn unregister_from_server(&self, server: &crate::actor::ActorRef) -> Result<()> {
        self.send(server, MessageTag::UnregisterClient)
    }
}
