//! Session driver binary for the Lifegrid cluster.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `lifegrid-config.yaml` (or `LIFEGRID_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the broker client and the PGM image adapter
//! 4. Start the stdin key source and the event logger
//! 5. Run one session and report how it ended

use std::sync::Arc;
use std::time::Duration;

use lifegrid_core::LifegridConfig;
use lifegrid_core::telemetry::init_tracing;
use lifegrid_driver::keys::stdin_keys;
use lifegrid_driver::{BrokerClient, Driver, Event, PgmDirectory};
use lifegrid_node::rpc::http_client;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = LifegridConfig::load()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    let params = config.params.to_params();
    params.validate()?;
    info!(
        broker_addr = config.driver.broker_addr,
        image_dir = %config.driver.image_dir.display(),
        output_dir = %config.driver.output_dir.display(),
        "lifegrid-driver starting"
    );

    // 3. Broker client and images.
    let client = BrokerClient::new(http_client(), config.driver.broker_addr.clone());
    let images = Arc::new(PgmDirectory::new(
        config.driver.image_dir.clone(),
        config.driver.output_dir.clone(),
    ));

    // 4. Keys in, events out.
    let (key_tx, key_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        if let Err(e) = stdin_keys(&key_tx) {
            warn!(error = %e, "Key source failed");
        }
    });
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let logger = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                Event::CellsFlipped { .. } => debug!(%event),
                _ => info!(%event),
            }
        }
    });

    // 5. Run the session.
    let ticker = Duration::from_millis(config.driver.ticker_interval_ms);
    let driver = Driver::new(client, images, event_tx, ticker);
    let result = driver.run(params, key_rx).await;
    drop(driver);
    let _ = logger.await;

    let result = result?;
    info!(
        turn = result.turn,
        alive = result.alive_cells.len(),
        outcome = ?result.outcome,
        "lifegrid-driver stopped"
    );
    Ok(())
}
