//! The coordinator: session state, node registry, and control plane.
//!
//! One [`Coordinator`] serves every broker operation. It owns:
//!
//! - the [`SessionState`] behind a read/write lock, read by control-plane
//!   calls and written by the session loop and by `PauseGame`;
//! - the [`NodeRegistry`] behind its own lock, so registration never waits
//!   on a running turn;
//! - the control queue. The receiving half sits behind a mutex that the
//!   running session holds for its whole lifetime, which is also how a
//!   second `RunGol` is detected;
//! - the turn gate, held for the whole of each turn and by `PauseGame`, so
//!   the turn `PauseGame` reports is the turn the loop stays frozen on.

use std::sync::Arc;

use chrono::Utc;
use lifegrid_core::engine;
use lifegrid_node::Connector;
use lifegrid_types::{
    AliveCellsResponse, ControlResponse, Grid, RegisterResponse, RunGolRequest,
    RunGolResponse, RunOutcome,
};
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tracing::{error, info};

use crate::control::{self, ControlCommand, Drained};
use crate::error::CoordinatorError;
use crate::registry::NodeRegistry;
use crate::runner::{SessionLoop, close_nodes};
use crate::session::{BrokerStatus, Phase, SessionState};

/// Shared state of the broker.
#[derive(Debug)]
pub struct Coordinator {
    state: RwLock<SessionState>,
    registry: RwLock<NodeRegistry>,
    control_tx: mpsc::UnboundedSender<ControlCommand>,
    control_rx: Mutex<mpsc::UnboundedReceiver<ControlCommand>>,
    turn_gate: Mutex<()>,
    connector: Connector,
    shutdown: watch::Sender<bool>,
}

impl Coordinator {
    /// Create a coordinator that reaches nodes through `connector`.
    pub fn new(connector: Connector) -> Arc<Self> {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            state: RwLock::new(SessionState::default()),
            registry: RwLock::new(NodeRegistry::default()),
            control_tx,
            control_rx: Mutex::new(control_rx),
            turn_gate: Mutex::new(()),
            connector,
            shutdown,
        })
    }

    /// Receiver that flips to `true` once `CloseBroker` has been called.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Whether `CloseBroker` has been called.
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn send(&self, command: ControlCommand) {
        // The receiver lives as long as `self`.
        let _ = self.control_tx.send(command);
    }

    // -----------------------------------------------------------------------
    // Register
    // -----------------------------------------------------------------------

    /// Append the node at `address` to the ring.
    ///
    /// Nodes registered while a session runs join the next session.
    pub async fn register(&self, address: String) -> Result<RegisterResponse, CoordinatorError> {
        let link = self
            .connector
            .link(&address)
            .map_err(|source| CoordinatorError::Unreachable {
                address: address.clone(),
                source,
            })?;
        let node_id = self.registry.write().await.register(address.clone(), link);
        info!(%node_id, address, "Node registered");
        Ok(RegisterResponse {
            node_id,
            message: "Registered Successfully".to_owned(),
        })
    }

    // -----------------------------------------------------------------------
    // RunGol
    // -----------------------------------------------------------------------

    /// Run a session until every turn has run, the client quits, or the
    /// cluster is killed.
    ///
    /// When a resume snapshot is held, the request's grid and turn are
    /// ignored and the session continues from the snapshot. Any node
    /// failure aborts the session, keeps the last committed turn, and sets
    /// the resume flag.
    ///
    /// The session runs on its own task. Dropping the returned future, as
    /// happens when the caller disconnects, leaves it running and still
    /// answering the control plane.
    pub async fn run_gol(
        self: &Arc<Self>,
        req: RunGolRequest,
    ) -> Result<RunGolResponse, CoordinatorError> {
        let coordinator = Arc::clone(self);
        let session = tokio::spawn(async move { coordinator.run_session(req).await });
        match session.await {
            Ok(result) => result,
            Err(e) => Err(self.fail(CoordinatorError::SessionTask(e.to_string())).await),
        }
    }

    async fn run_session(&self, req: RunGolRequest) -> Result<RunGolResponse, CoordinatorError> {
        let Ok(mut rx) = self.control_rx.try_lock() else {
            return Err(CoordinatorError::SessionActive);
        };
        // Commands aimed at an earlier session.
        let _ = control::drain(&mut rx);

        let params = req.params;
        params.validate()?;

        let (world, turn, resumed) = {
            let state = self.state.read().await;
            if state.resume {
                (state.world.clone(), state.turn, true)
            } else {
                (req.world, req.turn, false)
            }
        };
        if world.width() != params.image_width || world.height() != params.image_height {
            return Err(CoordinatorError::GridShape {
                width: params.image_width,
                height: params.image_height,
                actual_width: world.width(),
                actual_height: world.height(),
            });
        }

        let ring = self.registry.read().await.entries().to_vec();
        if ring.is_empty() {
            return Err(CoordinatorError::NoNodes);
        }
        if ring.len() > world.height() {
            return Err(CoordinatorError::TooManyNodes {
                nodes: ring.len(),
                height: world.height(),
            });
        }

        info!(
            nodes = ring.len(),
            turn,
            turns = params.turns,
            width = params.image_width,
            height = params.image_height,
            threads = params.threads,
            resumed,
            "Session starting"
        );

        {
            let mut state = self.state.write().await;
            state.alive_cells = engine::alive_cells(&world, 0..world.height(), 0);
            state.world = world.clone();
            state.turn = turn;
            state.paused = false;
            state.phase = Phase::Initialising;
            state.started_at = Some(Utc::now());
        }

        let mut session = SessionLoop::new(ring, params, world, turn);
        if let Err(e) = session.initialise().await {
            return Err(self.fail(e).await);
        }
        {
            let mut state = self.state.write().await;
            state.world = session.world().clone();
            state.alive_cells = session.alive_cells().to_vec();
            state.resume = false;
            state.phase = if state.paused { Phase::Paused } else { Phase::Running };
        }

        loop {
            let stop = match control::drain(&mut rx) {
                Drained::Stop(command) => Some(command),
                Drained::Continue if session.finished() => None,
                Drained::Continue => {
                    let gate = self.turn_gate.lock().await;
                    if self.state.read().await.paused {
                        drop(gate);
                        // Frozen: block until the control plane wakes us.
                        match rx.recv().await {
                            Some(ControlCommand::PauseToggled) => continue,
                            Some(command) => Some(command),
                            None => Some(ControlCommand::Quit),
                        }
                    } else {
                        if let Err(e) = session.run_turn().await {
                            drop(gate);
                            return Err(self.fail(e).await);
                        }
                        let mut state = self.state.write().await;
                        state.world = session.world().clone();
                        state.alive_cells = session.alive_cells().to_vec();
                        state.turn = session.turn();
                        continue;
                    }
                }
            };

            return Ok(match stop {
                None => self.finish(&session).await,
                Some(ControlCommand::Kill) => self.kill(&session).await,
                Some(_) => self.quit(&session).await,
            });
        }
    }

    async fn finish(&self, session: &SessionLoop) -> RunGolResponse {
        let mut state = self.state.write().await;
        state.phase = Phase::Finished;
        state.resume = false;
        info!(turn = session.turn(), alive = session.alive_cells().len(), "Session finished");
        response(session, RunOutcome::Completed)
    }

    async fn quit(&self, session: &SessionLoop) -> RunGolResponse {
        let mut state = self.state.write().await;
        state.phase = Phase::Quitting;
        state.resume = true;
        info!(turn = session.turn(), "Session quit; state kept for resume");
        response(session, RunOutcome::Quit)
    }

    async fn kill(&self, session: &SessionLoop) -> RunGolResponse {
        self.shut_down_nodes().await;
        let mut state = self.state.write().await;
        state.phase = Phase::Killed;
        state.resume = false;
        info!(turn = session.turn(), "Session killed; nodes shut down");
        response(session, RunOutcome::Killed)
    }

    async fn fail(&self, err: CoordinatorError) -> CoordinatorError {
        let mut state = self.state.write().await;
        state.phase = Phase::Failed;
        state.resume = true;
        error!(turn = state.turn, error = %err, "Session aborted; state kept for resume");
        err
    }

    async fn shut_down_nodes(&self) {
        let entries = self.registry.write().await.clear();
        close_nodes(&entries).await;
    }

    // -----------------------------------------------------------------------
    // Control plane
    // -----------------------------------------------------------------------

    /// Current grid, turn, and live cells.
    pub async fn save_world(&self) -> ControlResponse {
        let state = self.state.read().await;
        ControlResponse {
            world: Some(state.world.clone()),
            alive_cells: state.alive_cells.clone(),
            turn: state.turn,
            paused: state.paused,
            message: format!("Saved turn {}", state.turn),
        }
    }

    /// Ask the running session to stop and keep its state for resume.
    pub async fn client_quit(&self) -> Result<ControlResponse, CoordinatorError> {
        let state = self.state.read().await;
        if !state.phase.is_active() {
            return Err(CoordinatorError::NoActiveSession);
        }
        self.send(ControlCommand::Quit);
        info!(turn = state.turn, "Quit requested");
        Ok(ControlResponse {
            turn: state.turn,
            paused: state.paused,
            message: "Quitting".to_owned(),
            ..ControlResponse::default()
        })
    }

    /// Stop the running session and shut every node down.
    ///
    /// With no session running the nodes are shut down directly.
    pub async fn shut_down_service(&self) -> ControlResponse {
        let (active, turn, world, alive_cells) = {
            let state = self.state.read().await;
            (
                state.phase.is_active(),
                state.turn,
                state.world.clone(),
                state.alive_cells.clone(),
            )
        };
        if active {
            self.send(ControlCommand::Kill);
        } else {
            self.shut_down_nodes().await;
        }
        info!(turn, active, "Shutdown requested");
        ControlResponse {
            world: Some(world),
            alive_cells,
            turn,
            paused: false,
            message: "Shutting down".to_owned(),
        }
    }

    /// Toggle the paused flag.
    ///
    /// Waits for an in-flight turn to commit, so the reported turn is the
    /// one the session stays on while paused.
    pub async fn pause_game(&self) -> ControlResponse {
        let _gate = self.turn_gate.lock().await;
        let mut state = self.state.write().await;
        state.paused = !state.paused;
        if state.phase.is_active() && state.phase != Phase::Initialising {
            state.phase = if state.paused { Phase::Paused } else { Phase::Running };
        }
        let message = if state.paused {
            format!("Current Turn: {}", state.turn)
        } else {
            "Continuing".to_owned()
        };
        self.send(ControlCommand::PauseToggled);
        info!(turn = state.turn, paused = state.paused, "Pause toggled");
        ControlResponse {
            turn: state.turn,
            paused: state.paused,
            message,
            ..ControlResponse::default()
        }
    }

    /// Current live cells and turn, and whether the next session resumes
    /// from them.
    pub async fn report_alive_cells(&self) -> AliveCellsResponse {
        let state = self.state.read().await;
        AliveCellsResponse {
            alive_cells: state.alive_cells.clone(),
            turn: state.turn,
            resume: state.resume,
        }
    }

    /// Shut every node down, then stop the broker's server.
    pub async fn close_broker(&self) {
        if self.state.read().await.phase.is_active() {
            self.send(ControlCommand::Kill);
        } else {
            self.shut_down_nodes().await;
        }
        info!("Broker close requested");
        self.shutdown.send_replace(true);
    }

    /// Broker summary.
    pub async fn status(&self) -> BrokerStatus {
        let nodes = self.registry.read().await.len();
        let state = self.state.read().await;
        BrokerStatus {
            phase: state.phase,
            turn: state.turn,
            paused: state.paused,
            resume: state.resume,
            nodes,
            alive_cells: state.alive_cells.len(),
            width: state.world.width(),
            height: state.world.height(),
            started_at: state.started_at,
        }
    }

    /// Number of registered nodes.
    pub async fn node_count(&self) -> usize {
        self.registry.read().await.len()
    }
}

fn response(session: &SessionLoop, outcome: RunOutcome) -> RunGolResponse {
    RunGolResponse {
        world: Grid::clone(session.world()),
        turn: session.turn(),
        alive_cells: session.alive_cells().to_vec(),
        outcome,
    }
}
