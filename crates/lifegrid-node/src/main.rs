//! Compute node binary for the Lifegrid cluster.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `lifegrid-config.yaml` (or `LIFEGRID_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the node with an HTTP connector for its peers
//! 4. Bind the RPC listener
//! 5. Register the advertised address with the broker
//! 6. Serve until `CloseServer` or Ctrl-C

use std::sync::Arc;

use lifegrid_core::LifegridConfig;
use lifegrid_core::telemetry::init_tracing;
use lifegrid_node::rpc::http_client;
use lifegrid_node::{ComputeNode, Connector, register_with_broker};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = LifegridConfig::load()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        listen_addr = config.node.listen_addr,
        advertise_addr = config.node.advertise_addr(),
        broker_addr = config.node.broker_addr,
        "lifegrid-node starting"
    );

    // 3. Create the node.
    let http = http_client();
    let node = Arc::new(ComputeNode::new(Connector::Http(http.clone())));

    // 4. Bind before registering so the broker can reach us immediately.
    let listener = lifegrid_node::bind(&config.node.listen_addr).await?;
    let server = tokio::spawn(lifegrid_node::serve(listener, Arc::clone(&node)));

    // 5. Register with the broker.
    match register_with_broker(&http, &config.node.broker_addr, config.node.advertise_addr()).await
    {
        Ok(reply) => info!(node_id = %reply.node_id, message = reply.message, "Registered"),
        Err(e) => {
            error!(error = %e, "Registration failed");
            node.close();
            let _ = server.await;
            return Err(e.into());
        }
    }

    // 6. Serve until closed by the broker or interrupted.
    let ctrl_c_node = Arc::clone(&node);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            ctrl_c_node.close();
        }
    });

    server.await??;
    info!("lifegrid-node stopped");
    Ok(())
}
