//! Control commands delivered to the session loop.
//!
//! Control-plane handlers never touch the loop directly: they push a
//! [`ControlCommand`] onto the coordinator's queue, and the loop drains
//! the queue once per iteration (or blocks on it while paused).

use tokio::sync::mpsc;

/// A request from the control plane to the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Stop after the current turn and keep the state for resume.
    Quit,
    /// Stop after the current turn and shut every node down.
    Kill,
    /// The paused flag changed; wake the loop to re-check it.
    PauseToggled,
}

/// What the loop does after draining the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drained {
    /// Nothing terminal was queued.
    Continue,
    /// The session must end with this command.
    Stop(ControlCommand),
}

/// Drain every queued command without waiting.
///
/// The first `Quit` or `Kill` wins; `PauseToggled` wake-ups are dropped.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ControlCommand>) -> Drained {
    while let Ok(command) = rx.try_recv() {
        if command != ControlCommand::PauseToggled {
            return Drained::Stop(command);
        }
    }
    Drained::Continue
}
