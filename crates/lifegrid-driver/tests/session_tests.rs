//! Driver sessions against a broker served on a real socket.
//!
//! The broker reaches its nodes in-process; the driver talks to the broker
//! over HTTP exactly as the binary does.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use lifegrid_broker::{Coordinator, Phase, ServerError};
use lifegrid_core::engine;
use lifegrid_driver::{
    BrokerClient, Driver, DriverError, Event, ImageError, MemoryImages, RunState,
};
use lifegrid_node::rpc::http_client;
use lifegrid_node::{ComputeNode, Connector, LocalNetwork};
use lifegrid_types::{Cell, Grid, Params, RunOutcome};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Cluster {
    coordinator: Arc<Coordinator>,
    broker: JoinHandle<Result<(), ServerError>>,
    broker_addr: String,
    nodes: Vec<Arc<ComputeNode>>,
}

async fn cluster(count: usize) -> Cluster {
    let network = LocalNetwork::default();
    let coordinator = Coordinator::new(Connector::Local(network.clone()));
    let mut nodes = Vec::new();
    for i in 0..count {
        let address = format!("node-{i}");
        nodes.push(network.add_node(address.clone()));
        coordinator.register(address).await.unwrap();
    }

    let listener = lifegrid_broker::bind("127.0.0.1:0").await.unwrap();
    let broker_addr = lifegrid_broker::server::local_addr(&listener).unwrap().to_string();
    let broker = tokio::spawn(lifegrid_broker::serve(listener, Arc::clone(&coordinator)));
    Cluster {
        coordinator,
        broker,
        broker_addr,
        nodes,
    }
}

fn params(size: usize, turns: u64) -> Params {
    Params {
        turns,
        threads: 2,
        image_width: size,
        image_height: size,
    }
}

fn grid(size: usize, live: &[(usize, usize)]) -> Grid {
    let cells: Vec<Cell> = live.iter().map(|&(x, y)| Cell::new(x, y)).collect();
    Grid::from_live_cells(size, size, &cells).unwrap()
}

fn driver(
    cluster: &Cluster,
    images: &Arc<MemoryImages>,
) -> (Driver<MemoryImages>, mpsc::UnboundedReceiver<Event>) {
    let (events, rx) = mpsc::unbounded_channel();
    let client = BrokerClient::new(http_client(), cluster.broker_addr.clone());
    let driver = Driver::new(client, Arc::clone(images), events, Duration::from_millis(10));
    (driver, rx)
}

/// Receive events until one matches, failing after a few seconds.
async fn wait_for(
    events: &mut mpsc::UnboundedReceiver<Event>,
    mut pred: impl FnMut(&Event) -> bool,
) -> Event {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let event = events.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .unwrap()
}

async fn drain(mut events: mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut all = Vec::new();
    while let Some(event) = events.recv().await {
        all.push(event);
    }
    all
}

#[tokio::test]
async fn completed_session_emits_final_events_and_exports() {
    let cluster = cluster(3).await;
    let block = grid(8, &[(2, 2), (3, 2), (2, 3), (3, 3)]);
    let images = Arc::new(MemoryImages::default());
    images.insert(block.clone());

    let (driver, events) = driver(&cluster, &images);
    let (_keys, key_rx) = mpsc::unbounded_channel();
    let result = driver.run(params(8, 20), key_rx).await.unwrap();
    drop(driver);

    assert_eq!(result.outcome, RunOutcome::Completed);
    assert_eq!(result.turn, 20);
    assert_eq!(result.world, block);

    let events = drain(events).await;
    assert!(
        matches!(
            events.first(),
            Some(Event::CellsFlipped { completed_turns: 0, cells }) if cells.len() == 4
        ),
        "first event is the initial flip: {events:?}"
    );
    assert_eq!(
        events.get(1),
        Some(&Event::StateChange {
            completed_turns: 0,
            new_state: RunState::Executing,
        })
    );

    for event in &events {
        if let Event::AliveCellsCount { cells_count, .. } = event {
            assert_eq!(*cells_count, 4);
        }
    }

    let tail: Vec<&Event> = events.iter().rev().take(4).rev().collect();
    assert_eq!(
        tail,
        [
            &Event::TurnComplete {
                completed_turns: 20
            },
            &Event::FinalTurnComplete {
                completed_turns: 20,
                alive: result.alive_cells.clone(),
            },
            &Event::ImageOutputComplete {
                completed_turns: 20,
                filename: "8x8x20".to_owned(),
            },
            &Event::StateChange {
                completed_turns: 20,
                new_state: RunState::Quitting,
            },
        ]
    );

    let outputs = images.outputs();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs.first().unwrap(), &("8x8x20".to_owned(), block));
}

#[tokio::test]
async fn ticker_reports_flips_of_a_blinker() {
    let cluster = cluster(2).await;
    let blinker = grid(6, &[(1, 2), (2, 2), (3, 2)]);
    let images = Arc::new(MemoryImages::default());
    images.insert(blinker);

    let (driver, mut events) = driver(&cluster, &images);
    let (keys, key_rx) = mpsc::unbounded_channel();
    let session = tokio::spawn(async move { driver.run(params(6, u64::MAX), key_rx).await });

    // An odd turn shows the vertical phase: four cells differ.
    let event = wait_for(&mut events, |e| {
        matches!(e, Event::CellsFlipped { completed_turns, .. } if completed_turns % 2 == 1)
    })
    .await;
    if let Event::CellsFlipped { cells, .. } = event {
        assert_eq!(cells.len(), 4);
    }

    keys.send('q').unwrap();
    let result = session.await.unwrap().unwrap();
    assert_eq!(result.outcome, RunOutcome::Quit);
    assert_eq!(result.alive_cells.len(), 3);
}

fn blinker_phase(turn: u64) -> BTreeSet<Cell> {
    let points = if turn % 2 == 0 {
        [(1, 2), (2, 2), (3, 2)]
    } else {
        [(2, 1), (2, 2), (2, 3)]
    };
    points.iter().map(|&(x, y)| Cell::new(x, y)).collect()
}

#[tokio::test]
async fn resumed_session_starts_from_the_broker_snapshot() {
    let cluster = cluster(2).await;
    let images = Arc::new(MemoryImages::default());
    images.insert(grid(6, &[(1, 2), (2, 2), (3, 2)]));

    let (first, mut events) = driver(&cluster, &images);
    let (keys, key_rx) = mpsc::unbounded_channel();
    let session = tokio::spawn(async move { first.run(params(6, u64::MAX), key_rx).await });
    // Quit on an odd turn so the snapshot differs from the image.
    wait_for(&mut events, |e| {
        matches!(e, Event::AliveCellsCount { completed_turns, .. } if completed_turns % 2 == 1)
    })
    .await;
    keys.send('q').unwrap();
    let quit = session.await.unwrap().unwrap();
    assert_eq!(quit.outcome, RunOutcome::Quit);
    assert!(quit.turn > 0);

    let (second, mut events) = driver(&cluster, &images);
    let (keys, key_rx) = mpsc::unbounded_channel();
    let session = tokio::spawn(async move { second.run(params(6, u64::MAX), key_rx).await });

    let first_event = events.recv().await.unwrap();
    assert_eq!(
        first_event,
        Event::CellsFlipped {
            completed_turns: quit.turn,
            cells: quit.alive_cells.clone(),
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        Event::StateChange {
            completed_turns: quit.turn,
            new_state: RunState::Executing,
        }
    );

    // Replaying the flips must track the board the broker is turning.
    let mut board: BTreeSet<Cell> = quit.alive_cells.iter().copied().collect();
    wait_for(&mut events, |e| match e {
        Event::CellsFlipped { completed_turns, cells } => {
            for cell in cells {
                if !board.remove(cell) {
                    board.insert(*cell);
                }
            }
            assert_eq!(board, blinker_phase(*completed_turns));
            *completed_turns > quit.turn
        }
        _ => false,
    })
    .await;

    keys.send('q').unwrap();
    let result = session.await.unwrap().unwrap();
    assert_eq!(result.outcome, RunOutcome::Quit);
    assert!(result.turn > quit.turn);
}

#[tokio::test]
async fn keys_pause_save_resume_and_quit() {
    let cluster = cluster(3).await;
    let live = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];
    let images = Arc::new(MemoryImages::default());
    images.insert(grid(16, &live));

    let (driver, mut events) = driver(&cluster, &images);
    let (keys, key_rx) = mpsc::unbounded_channel();
    let session = tokio::spawn(async move { driver.run(params(16, u64::MAX), key_rx).await });

    wait_for(&mut events, |e| {
        matches!(e, Event::AliveCellsCount { completed_turns, .. } if *completed_turns > 0)
    })
    .await;

    keys.send('p').unwrap();
    let paused = wait_for(&mut events, |e| matches!(e, Event::StateChange { .. })).await;
    let frozen = paused.completed_turns();
    assert_eq!(
        paused,
        Event::StateChange {
            completed_turns: frozen,
            new_state: RunState::Paused,
        }
    );

    keys.send('s').unwrap();
    let saved = wait_for(&mut events, |e| matches!(e, Event::ImageOutputComplete { .. })).await;
    assert_eq!(saved.completed_turns(), frozen);

    let (name, exported) = images.outputs().first().cloned().unwrap();
    assert_eq!(name, format!("16x16x{frozen}"));
    let mut expected = grid(16, &live);
    for _ in 0..frozen {
        expected = engine::next_state(&expected, 0..16);
    }
    assert_eq!(exported, expected);

    // Unknown keys are ignored.
    keys.send('x').unwrap();
    keys.send('p').unwrap();
    let resumed = wait_for(&mut events, |e| matches!(e, Event::StateChange { .. })).await;
    assert_eq!(
        resumed,
        Event::StateChange {
            completed_turns: frozen,
            new_state: RunState::Executing,
        }
    );

    keys.send('q').unwrap();
    let result = session.await.unwrap().unwrap();
    assert_eq!(result.outcome, RunOutcome::Quit);
    assert!(result.turn >= frozen);

    let status = cluster.coordinator.status().await;
    assert_eq!(status.phase, Phase::Quitting);
    assert!(status.resume);
}

#[tokio::test]
async fn kill_key_shuts_down_nodes_and_broker() {
    let cluster = cluster(2).await;
    let images = Arc::new(MemoryImages::default());
    images.insert(grid(10, &[(4, 4), (5, 4), (6, 4)]));

    let (driver, mut events) = driver(&cluster, &images);
    let (keys, key_rx) = mpsc::unbounded_channel();
    let session = tokio::spawn(async move { driver.run(params(10, u64::MAX), key_rx).await });

    wait_for(&mut events, |e| {
        matches!(e, Event::AliveCellsCount { completed_turns, .. } if *completed_turns > 0)
    })
    .await;
    keys.send('k').unwrap();

    let result = session.await.unwrap().unwrap();
    assert_eq!(result.outcome, RunOutcome::Killed);
    assert!(cluster.nodes.iter().all(|node| node.is_closed()));
    assert!(cluster.coordinator.is_closed());

    tokio::time::timeout(Duration::from_secs(10), cluster.broker)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let events = drain(events).await;
    assert_eq!(
        events.last(),
        Some(&Event::StateChange {
            completed_turns: result.turn,
            new_state: RunState::Quitting,
        })
    );
}

#[tokio::test]
async fn missing_image_fails_before_the_session() {
    let cluster = cluster(1).await;
    let images = Arc::new(MemoryImages::default());

    let (driver, _events) = driver(&cluster, &images);
    let (_keys, key_rx) = mpsc::unbounded_channel();
    let err = driver.run(params(8, 5), key_rx).await;

    assert!(matches!(
        err,
        Err(DriverError::Image(ImageError::Missing {
            width: 8,
            height: 8
        }))
    ));
    assert_eq!(cluster.coordinator.status().await.phase, Phase::Idle);
}

#[tokio::test]
async fn broker_errors_surface_with_their_status() {
    let cluster = cluster(0).await;
    let images = Arc::new(MemoryImages::default());
    images.insert(grid(8, &[]));

    let (driver, _events) = driver(&cluster, &images);
    let (_keys, key_rx) = mpsc::unbounded_channel();
    let err = driver.run(params(8, 5), key_rx).await;

    assert!(
        matches!(&err, Err(DriverError::Rpc(e)) if e.status() == Some(503)),
        "expected a 503 from the broker, got {err:?}"
    );
}
