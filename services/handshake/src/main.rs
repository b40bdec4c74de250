//! Handshake demo driver
//!
//! Starts a server and a client actor, runs one registration handshake,
//! announces server liveness, unregisters the client, and shuts both actors
//! down. Everything between "register" and "stop" happens actor-to-actor
//! through the mailboxes; this driver only injects stimuli.

use anyhow::Result;
use parley_actors::Actor;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let (mut server, server_stats) = Actor::server();
    let (mut client, client_stats) = Actor::client();

    server.start()?;
    client.start()?;

    let server_ref = server.handle();
    let client_ref = client.handle();

    info!(server = %server_ref, client = %client_ref, "registering client");
    client.register_to_server(&server_ref)?;

    // Let the exchange settle before moving on.
    tokio::time::sleep(Duration::from_secs(2)).await;

    info!("announcing server liveness");
    server.announce_alive(&client_ref)?;

    info!("unregistering client");
    client.unregister_from_server(&server_ref)?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    client.stop().await?;
    server.stop().await?;

    let server_report = serde_json::to_string(&server_stats.snapshot())?;
    let client_report = serde_json::to_string(&client_stats.snapshot())?;
    info!(
        server_stats = %server_report,
        client_stats = %client_report,
        "handshake demo finished"
    );

    Ok(())
}
