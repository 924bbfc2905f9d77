//! Session orchestration on the client side.
//!
//! A [`Driver`] loads the starting grid, issues the long-lived `RunGol`
//! call, and while it is outstanding runs two tasks next to it:
//!
//! - the ticker, polling `ReportAliveCells` every `ticker_interval` and
//!   emitting the count plus the cells flipped since the previous poll;
//! - the key handler, turning keypresses into control-plane calls.
//!
//! Both stop on a `watch` signal once `RunGol` returns. The driver then
//! emits the final events and exports the last grid.
//!
//! A broker holding a resume snapshot ignores the loaded grid, so the
//! driver asks it first and starts its events and flip baseline from the
//! snapshot instead.

use std::sync::Arc;
use std::time::Duration;

use lifegrid_core::{engine, flipped_cells};
use lifegrid_types::{Cell, Params, RunGolRequest, RunGolResponse};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::BrokerClient;
use crate::error::DriverError;
use crate::events::{Event, EventSink, RunState};
use crate::io::{ImageLoader, ImageWriter};
use crate::keys::Key;

/// Runs sessions against one broker.
#[derive(Debug)]
pub struct Driver<I> {
    client: BrokerClient,
    images: Arc<I>,
    events: EventSink,
    ticker_interval: Duration,
}

impl<I> Driver<I>
where
    I: ImageLoader + ImageWriter + 'static,
{
    /// Driver talking to `client`, loading and exporting through `images`.
    pub const fn new(
        client: BrokerClient,
        images: Arc<I>,
        events: EventSink,
        ticker_interval: Duration,
    ) -> Self {
        Self {
            client,
            images,
            events,
            ticker_interval,
        }
    }

    /// Run one session to its end.
    ///
    /// Keys arriving on `keys` are forwarded until the session ends or `k`
    /// is pressed. When the broker reports a kill, it is closed too.
    pub async fn run(
        &self,
        params: Params,
        keys: mpsc::UnboundedReceiver<char>,
    ) -> Result<RunGolResponse, DriverError> {
        let world = self.images.load(params.image_width, params.image_height)?;
        let snapshot = self.client.report_alive_cells().await?;
        let (start_turn, initial) = if snapshot.resume {
            info!(turn = snapshot.turn, "Broker resumes from its snapshot");
            (snapshot.turn, snapshot.alive_cells)
        } else {
            (0, engine::alive_cells(&world, 0..world.height(), 0))
        };
        emit(&self.events, Event::CellsFlipped {
            completed_turns: start_turn,
            cells: initial.clone(),
        });
        emit(&self.events, Event::StateChange {
            completed_turns: start_turn,
            new_state: RunState::Executing,
        });

        let (stop, stopped) = watch::channel(false);
        let ticker = tokio::spawn(poll_alive_cells(
            self.client.clone(),
            self.events.clone(),
            self.ticker_interval,
            initial,
            stopped.clone(),
        ));
        let key_handler = tokio::spawn(handle_keys(
            self.client.clone(),
            Arc::clone(&self.images),
            self.events.clone(),
            keys,
            stopped,
        ));

        info!(
            broker = self.client.address(),
            turns = params.turns,
            width = params.image_width,
            height = params.image_height,
            threads = params.threads,
            "Session requested"
        );
        let result = self
            .client
            .run_gol(&RunGolRequest {
                world,
                params,
                turn: 0,
            })
            .await;

        stop.send_replace(true);
        for (task, name) in [(ticker, "ticker"), (key_handler, "key handler")] {
            if let Err(e) = task.await {
                warn!(task = name, error = %e, "Driver task failed");
            }
        }
        let result = result?;
        info!(turn = result.turn, outcome = ?result.outcome, "Session ended");

        if result.kill() {
            match self.client.close_broker().await {
                Ok(()) => info!("Broker closed"),
                Err(e) => warn!(error = %e, "Broker close failed"),
            }
        }

        emit(&self.events, Event::TurnComplete {
            completed_turns: result.turn,
        });
        emit(&self.events, Event::FinalTurnComplete {
            completed_turns: result.turn,
            alive: result.alive_cells.clone(),
        });
        let filename = self.images.write(&result.world, result.turn)?;
        emit(&self.events, Event::ImageOutputComplete {
            completed_turns: result.turn,
            filename,
        });
        emit(&self.events, Event::StateChange {
            completed_turns: result.turn,
            new_state: RunState::Quitting,
        });
        Ok(result)
    }
}

fn emit(events: &EventSink, event: Event) {
    // A closed stream only means nobody is listening any more.
    if events.send(event).is_err() {
        debug!("Event stream closed");
    }
}

async fn poll_alive_cells(
    client: BrokerClient,
    events: EventSink,
    period: Duration,
    mut previous: Vec<Cell>,
    mut stopped: watch::Receiver<bool>,
) {
    // `interval` rejects a zero period.
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = stopped.changed() => break,
            _ = interval.tick() => {}
        }
        match client.report_alive_cells().await {
            Ok(report) => {
                emit(&events, Event::AliveCellsCount {
                    completed_turns: report.turn,
                    cells_count: report.alive_cells.len(),
                });
                let flipped = flipped_cells(&previous, &report.alive_cells);
                if !flipped.is_empty() {
                    emit(&events, Event::CellsFlipped {
                        completed_turns: report.turn,
                        cells: flipped,
                    });
                }
                previous = report.alive_cells;
            }
            Err(e) => warn!(error = %e, "Alive cell poll failed"),
        }
    }
}

async fn handle_keys<I>(
    client: BrokerClient,
    images: Arc<I>,
    events: EventSink,
    mut keys: mpsc::UnboundedReceiver<char>,
    mut stopped: watch::Receiver<bool>,
) where
    I: ImageWriter,
{
    loop {
        let c = tokio::select! {
            _ = stopped.changed() => break,
            c = keys.recv() => match c {
                Some(c) => c,
                None => break,
            },
        };
        let Some(key) = Key::from_char(c) else {
            debug!(key = %c, "Ignoring key");
            continue;
        };
        if let Err(e) = handle_key(&client, images.as_ref(), &events, key).await {
            warn!(?key, error = %e, "Key action failed");
        }
        if key == Key::Kill {
            break;
        }
    }
}

async fn handle_key<I>(
    client: &BrokerClient,
    images: &I,
    events: &EventSink,
    key: Key,
) -> Result<(), DriverError>
where
    I: ImageWriter,
{
    match key {
        Key::Save => {
            let saved = client.save_world().await?;
            info!(turn = saved.turn, message = saved.message, "World saved");
            if let Some(world) = saved.world {
                let filename = images.write(&world, saved.turn)?;
                emit(events, Event::ImageOutputComplete {
                    completed_turns: saved.turn,
                    filename,
                });
            }
        }
        Key::Quit => {
            let reply = client.client_quit().await?;
            info!(turn = reply.turn, message = reply.message, "Quit sent");
        }
        Key::Pause => {
            let reply = client.pause_game().await?;
            info!(turn = reply.turn, message = reply.message, "Pause toggled");
            emit(events, Event::StateChange {
                completed_turns: reply.turn,
                new_state: if reply.paused {
                    RunState::Paused
                } else {
                    RunState::Executing
                },
            });
        }
        Key::Kill => {
            let reply = client.shut_down_service().await?;
            info!(turn = reply.turn, message = reply.message, "Shutdown sent");
        }
    }
    Ok(())
}
