//! Actor core: identity, lifecycle, and the per-actor processing loop
//!
//! An [`Actor`] owns a mailbox and a dedicated worker task running a tight
//! poll loop. The loop does no work until the lifecycle is observably
//! `Running`, then repeatedly dequeues one message and hands it to the
//! role's `process_message`; an empty poll yields (or sleeps, per
//! [`IdleStrategy`]) instead of suspending on the mailbox, so "no message
//! available" never blocks the worker.
//!
//! Lifecycle is an explicit state machine — NotStarted → Running → Stopping
//! → NotStarted — signalled through a watch channel. `stop()` takes effect
//! at iteration boundaries only: an in-flight `process_message` always
//! completes before shutdown, and after `stop()` returns the actor can be
//! started again with its buffered mailbox intact.

use crate::error::{ActorError, Result};
use crate::mailbox::{self, Mailbox, MailboxMetrics, MailboxSender, MailboxStats};
use crate::messages::{Message, MessageTag};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Unique actor identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId {
    id: Uuid,
}

impl ActorId {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self { id }
    }

    pub fn uuid(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.id.simple())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of an actor
///
/// At most one live worker exists per actor; `Running` and `Stopping` are
/// only observable while that worker is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorStatus {
    NotStarted,
    Running,
    Stopping,
}

/// What the processing loop does when a poll finds the mailbox empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleStrategy {
    /// Yield to the scheduler and poll again immediately
    #[default]
    Yield,
    /// Sleep for the given duration between polls
    Sleep(Duration),
}

/// Per-actor processing counters
#[derive(Debug, Default)]
pub struct ActorMetrics {
    /// Messages handed to `process_message`, recognized or not
    pub messages_processed: AtomicU64,
    /// Handler invocations that returned an error (logged, loop continues)
    pub handler_errors: AtomicU64,
}

impl ActorMetrics {
    pub fn snapshot(&self) -> ActorStats {
        ActorStats {
            messages_processed: self.messages_processed.load(Ordering::Acquire),
            handler_errors: self.handler_errors.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time actor counters
#[derive(Debug, Clone, Serialize)]
pub struct ActorStats {
    pub messages_processed: u64,
    pub handler_errors: u64,
}

/// Protocol behavior an actor runs
///
/// The two shipped roles are [`ServerRole`](crate::protocol::ServerRole) and
/// [`ClientRole`](crate::protocol::ClientRole); the trait is public so
/// protocol variants (including deliberately deadlocking ones) can be built
/// on the same substrate.
#[async_trait]
pub trait Role: Send + 'static {
    /// Role name used in diagnostics and handle names ("server", "client")
    fn name(&self) -> &'static str;

    /// Interpret one dequeued message.
    ///
    /// Tags the role does not recognize must be consumed silently. Errors
    /// are logged by the loop and do not stop the actor.
    async fn process_message(&mut self, msg: Message, ctx: &ActorContext) -> Result<()>;
}

/// Strongly typed reply-address handle for an actor
///
/// Cheap to clone; this is what a [`Message`] carries as its reply address,
/// and what peers use to enqueue into the actor's mailbox.
#[derive(Debug, Clone)]
pub struct ActorRef {
    id: ActorId,
    role: &'static str,
    sender: MailboxSender,
}

impl ActorRef {
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    /// Enqueue a message into this actor's mailbox.
    ///
    /// The message becomes visible to the actor's loop as soon as the append
    /// completes; no acknowledgment is returned. Succeeds while the actor
    /// value is alive, running or not.
    pub fn post(&self, msg: Message) -> Result<()> {
        self.sender.enqueue(msg)
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.role, self.id.uuid().simple())
    }
}

/// Handler-side view of the owning actor, passed to `process_message`
pub struct ActorContext {
    self_ref: ActorRef,
}

impl ActorContext {
    /// Context detached from any running loop, for handler-level tests
    #[cfg(test)]
    pub(crate) fn for_tests(self_ref: ActorRef) -> Self {
        Self { self_ref }
    }

    /// Handle of the actor this context belongs to
    pub fn self_ref(&self) -> &ActorRef {
        &self.self_ref
    }

    /// Construct a fresh message with this actor as the reply address and
    /// enqueue it into `peer`'s mailbox
    pub fn send(&self, peer: &ActorRef, tag: MessageTag) -> Result<()> {
        peer.post(Message::new(tag, self.self_ref.clone()))
    }

    /// Relay form: stamp `msg`'s reply address with this actor (overwriting
    /// any prior value) and enqueue it into `peer`'s mailbox
    pub fn send_message(&self, peer: &ActorRef, msg: Message) -> Result<()> {
        peer.post(msg.stamped(self.self_ref.clone()))
    }

    /// Enqueue into this actor's OWN mailbox
    pub fn post(&self, msg: Message) -> Result<()> {
        self.self_ref.post(msg)
    }
}

/// Role state and mailbox consumer; travels into the worker on `start()`
/// and back out on `stop()`
struct Worker<R: Role> {
    role: R,
    mailbox: Mailbox,
}

/// An actor: one mailbox, one lifecycle, at most one live worker
pub struct Actor<R: Role> {
    id: ActorId,
    role_name: &'static str,
    sender: MailboxSender,
    mailbox_metrics: Arc<MailboxMetrics>,
    metrics: Arc<ActorMetrics>,
    idle: IdleStrategy,
    status_tx: watch::Sender<ActorStatus>,
    worker: Option<JoinHandle<Worker<R>>>,
    parked: Option<Worker<R>>,
}

impl<R: Role> Actor<R> {
    /// Construct an actor in the NotStarted state
    pub fn with_role(role: R) -> Self {
        let id = ActorId::new();
        let role_name = role.name();
        let name = format!("{role_name}-{}", id.uuid().simple());
        let (sender, mailbox) = mailbox::channel(&name);
        let mailbox_metrics = mailbox.metrics();
        let (status_tx, _) = watch::channel(ActorStatus::NotStarted);

        Self {
            id,
            role_name,
            sender,
            mailbox_metrics,
            metrics: Arc::new(ActorMetrics::default()),
            idle: IdleStrategy::default(),
            status_tx,
            worker: None,
            parked: Some(Worker { role, mailbox }),
        }
    }

    /// Replace the idle strategy; takes effect at the next `start()`
    pub fn set_idle_strategy(&mut self, idle: IdleStrategy) {
        self.idle = idle;
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Reply-address handle for this actor
    pub fn handle(&self) -> ActorRef {
        ActorRef {
            id: self.id.clone(),
            role: self.role_name,
            sender: self.sender.clone(),
        }
    }

    pub fn status(&self) -> ActorStatus {
        *self.status_tx.borrow()
    }

    pub fn metrics(&self) -> Arc<ActorMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn mailbox_stats(&self) -> MailboxStats {
        self.mailbox_metrics.snapshot()
    }

    /// Enqueue a locally-originated stimulus into this actor's own mailbox
    pub fn post(&self, msg: Message) -> Result<()> {
        self.sender.enqueue(msg)
    }

    /// Construct a fresh message with this actor as the reply address and
    /// enqueue it into `peer`'s mailbox
    pub fn send(&self, peer: &ActorRef, tag: MessageTag) -> Result<()> {
        peer.post(Message::new(tag, self.handle()))
    }

    /// Relay form of `send`: stamp `msg`'s reply address with this actor and
    /// enqueue it into `peer`'s mailbox
    pub fn send_message(&self, peer: &ActorRef, msg: Message) -> Result<()> {
        peer.post(msg.stamped(self.handle()))
    }

    /// Spawn the processing loop and mark the actor Running.
    ///
    /// Rejects with [`ActorError::AlreadyStarted`] while a worker is live; a
    /// second worker is never spawned.
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(ActorError::AlreadyStarted {
                actor: self.handle().to_string(),
            });
        }
        let Some(core) = self.parked.take() else {
            return Err(ActorError::Defunct {
                actor: self.handle().to_string(),
            });
        };

        let ctx = ActorContext {
            self_ref: self.handle(),
        };
        let status_rx = self.status_tx.subscribe();
        let metrics = Arc::clone(&self.metrics);
        let idle = self.idle;

        self.worker = Some(tokio::spawn(run_loop(core, ctx, status_rx, metrics, idle)));
        // The loop waits for this signal before doing any work.
        self.status_tx.send_replace(ActorStatus::Running);

        info!(actor = %self.handle(), "actor started");
        Ok(())
    }

    /// Signal Stopping and wait for the worker to exit, then reset the
    /// lifecycle so the actor can be restarted.
    ///
    /// This is the only blocking join point in the substrate. Messages left
    /// in (or arriving at) the mailbox while stopped are preserved for the
    /// next `start()`.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Err(ActorError::NotRunning {
                actor: self.handle().to_string(),
            });
        };

        self.status_tx.send_replace(ActorStatus::Stopping);
        let joined = worker.await;
        self.status_tx.send_replace(ActorStatus::NotStarted);

        match joined {
            Ok(core) => {
                self.parked = Some(core);
                info!(actor = %self.handle(), "actor stopped");
                Ok(())
            }
            Err(e) => Err(ActorError::WorkerJoin {
                actor: self.handle().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// The per-actor processing loop.
///
/// Stop is observed once per iteration, never mid-processing. Returns the
/// worker state so `stop()` can park it for a later restart.
async fn run_loop<R: Role>(
    mut core: Worker<R>,
    ctx: ActorContext,
    mut status: watch::Receiver<ActorStatus>,
    metrics: Arc<ActorMetrics>,
    idle: IdleStrategy,
) -> Worker<R> {
    // Do no work until the lifecycle observably leaves NotStarted.
    if status
        .wait_for(|s| !matches!(s, ActorStatus::NotStarted))
        .await
        .is_err()
    {
        return core;
    }

    debug!(actor = %ctx.self_ref(), "worker entering message loop");

    loop {
        if matches!(*status.borrow(), ActorStatus::Stopping) {
            break;
        }
        // The owning Actor value was dropped; nothing can join us.
        if status.has_changed().is_err() {
            break;
        }

        match core.mailbox.dequeue() {
            Some(msg) => {
                let tag = msg.tag();
                debug!(actor = %ctx.self_ref(), %tag, from = %msg.reply_to(), "processing message");
                if let Err(e) = core.role.process_message(msg, &ctx).await {
                    metrics.handler_errors.fetch_add(1, Ordering::AcqRel);
                    error!(actor = %ctx.self_ref(), %tag, error = %e, "message handler failed");
                }
                metrics.messages_processed.fetch_add(1, Ordering::AcqRel);
                debug!(actor = %ctx.self_ref(), %tag, "message processed");
            }
            None => match idle {
                IdleStrategy::Yield => tokio::task::yield_now().await,
                IdleStrategy::Sleep(interval) => tokio::time::sleep(interval).await,
            },
        }
    }

    debug!(actor = %ctx.self_ref(), "worker exited message loop");
    core
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// An address-only handle: usable as a reply address, but nothing
    /// consumes its mailbox (posting to it reports a closed mailbox).
    pub(crate) fn detached_ref(role: &'static str) -> ActorRef {
        let id = ActorId::new();
        let (sender, _mailbox) = mailbox::channel(&format!("{role}-{}", id.uuid().simple()));
        ActorRef { id, role, sender }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    /// Records every tag it sees; replies to nothing.
    struct RecorderRole {
        seen: Arc<AtomicU64>,
    }

    #[async_trait]
    impl Role for RecorderRole {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn process_message(&mut self, _msg: Message, _ctx: &ActorContext) -> Result<()> {
            self.seen.fetch_add(1, Ordering::AcqRel);
            Ok(())
        }
    }

    fn recorder() -> (Actor<RecorderRole>, Arc<AtomicU64>) {
        let seen = Arc::new(AtomicU64::new(0));
        let actor = Actor::with_role(RecorderRole {
            seen: Arc::clone(&seen),
        });
        (actor, seen)
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time")
    }

    #[test]
    fn actor_id_display_is_stable() {
        let id = ActorId::new();
        assert!(id.to_string().starts_with("actor-"));
        assert_ne!(ActorId::new(), ActorId::new());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn lifecycle_transitions_not_started_running_stopping() {
        let (mut actor, _) = recorder();
        assert_eq!(actor.status(), ActorStatus::NotStarted);

        actor.start().unwrap();
        assert_eq!(actor.status(), ActorStatus::Running);

        actor.stop().await.unwrap();
        assert_eq!(actor.status(), ActorStatus::NotStarted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn second_start_is_rejected_without_spawning() {
        let (mut actor, _) = recorder();
        actor.start().unwrap();

        let err = actor.start().unwrap_err();
        assert!(matches!(err, ActorError::AlreadyStarted { .. }));
        assert_eq!(actor.status(), ActorStatus::Running);

        actor.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn stop_without_start_is_an_error() {
        let (mut actor, _) = recorder();
        let err = actor.stop().await.unwrap_err();
        assert!(matches!(err, ActorError::NotRunning { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn posted_messages_reach_the_handler() {
        let (mut actor, seen) = recorder();
        let peer = test_support::detached_ref("driver");
        actor.start().unwrap();

        for _ in 0..3 {
            actor
                .post(Message::new(MessageTag::CallbackInvoked, peer.clone()))
                .unwrap();
        }
        let metrics = actor.metrics();
        wait_until(|| metrics.snapshot().messages_processed == 3).await;

        assert_eq!(seen.load(Ordering::Acquire), 3);
        actor.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn restart_preserves_messages_buffered_while_stopped() {
        let (mut actor, seen) = recorder();
        let peer = test_support::detached_ref("driver");

        actor.start().unwrap();
        actor.stop().await.unwrap();

        // Enqueue into the stopped actor: buffered, not lost.
        for _ in 0..4 {
            actor
                .post(Message::new(MessageTag::CallbackInvoked, peer.clone()))
                .unwrap();
        }
        assert_eq!(seen.load(Ordering::Acquire), 0);
        assert_eq!(actor.mailbox_stats().messages_enqueued, 4);

        actor.start().unwrap();
        wait_until(|| seen.load(Ordering::Acquire) == 4).await;
        actor.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sleep_idle_strategy_still_processes_messages() {
        let (mut actor, seen) = recorder();
        actor.set_idle_strategy(IdleStrategy::Sleep(Duration::from_millis(1)));
        let peer = test_support::detached_ref("driver");

        actor.start().unwrap();
        actor
            .post(Message::new(MessageTag::CallbackInvoked, peer))
            .unwrap();
        wait_until(|| seen.load(Ordering::Acquire) == 1).await;
        actor.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn handlers_can_post_into_their_own_mailbox() {
        /// Reacts to the first registration by scheduling itself a follow-up.
        struct SelfPoster {
            seen: Arc<AtomicU64>,
        }

        #[async_trait]
        impl Role for SelfPoster {
            fn name(&self) -> &'static str {
                "self-poster"
            }

            async fn process_message(&mut self, msg: Message, ctx: &ActorContext) -> Result<()> {
                self.seen.fetch_add(1, Ordering::AcqRel);
                if msg.tag() == MessageTag::RegisterClient {
                    ctx.post(Message::new(
                        MessageTag::CallbackInvoked,
                        ctx.self_ref().clone(),
                    ))?;
                }
                Ok(())
            }
        }

        let seen = Arc::new(AtomicU64::new(0));
        let mut actor = Actor::with_role(SelfPoster {
            seen: Arc::clone(&seen),
        });
        actor.start().unwrap();

        actor
            .post(Message::new(
                MessageTag::RegisterClient,
                test_support::detached_ref("driver"),
            ))
            .unwrap();

        wait_until(|| seen.load(Ordering::Acquire) == 2).await;
        actor.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn send_stamps_the_senders_reply_address() {
        struct EchoCheck {
            from_role: Arc<parking_lot::Mutex<Option<&'static str>>>,
        }

        #[async_trait]
        impl Role for EchoCheck {
            fn name(&self) -> &'static str {
                "echo-check"
            }

            async fn process_message(&mut self, msg: Message, _ctx: &ActorContext) -> Result<()> {
                *self.from_role.lock() = Some(msg.reply_to().role());
                Ok(())
            }
        }

        let from_role = Arc::new(parking_lot::Mutex::new(None));
        let mut receiver = Actor::with_role(EchoCheck {
            from_role: Arc::clone(&from_role),
        });
        let (sender, _) = recorder();

        receiver.start().unwrap();
        sender
            .send(&receiver.handle(), MessageTag::RegisterClient)
            .unwrap();

        wait_until(|| from_role.lock().is_some()).await;
        assert_eq!(*from_role.lock(), Some("recorder"));
        receiver.stop().await.unwrap();
    }
}
