//! Broker binary for the Lifegrid cluster.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `lifegrid-config.yaml` (or `LIFEGRID_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the coordinator with an HTTP connector for the nodes
//! 4. Serve until `CloseBroker` or Ctrl-C

use lifegrid_broker::Coordinator;
use lifegrid_core::LifegridConfig;
use lifegrid_core::telemetry::init_tracing;
use lifegrid_node::Connector;
use lifegrid_node::rpc::http_client;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = LifegridConfig::load()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(listen_addr = config.broker.listen_addr, "lifegrid-broker starting");

    // 3. Create the coordinator.
    let coordinator = Coordinator::new(Connector::Http(http_client()));

    // 4. Serve until closed or interrupted.
    let listener = lifegrid_broker::bind(&config.broker.listen_addr).await?;
    let ctrl_c = std::sync::Arc::clone(&coordinator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            ctrl_c.close_broker().await;
        }
    });

    lifegrid_broker::serve(listener, coordinator).await?;
    info!("lifegrid-broker stopped");
    Ok(())
}
