//! Keypress mapping and the stdin key source.

use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::debug;

/// A control key understood by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// `s`: save the current grid and export it.
    Save,
    /// `q`: quit, keeping the broker's state for resume.
    Quit,
    /// `p`: toggle pause.
    Pause,
    /// `k`: shut the whole cluster down.
    Kill,
}

impl Key {
    /// Map a keypress; other characters are ignored.
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Self::Save),
            'q' => Some(Self::Quit),
            'p' => Some(Self::Pause),
            'k' => Some(Self::Kill),
            _ => None,
        }
    }
}

/// Forward the first character of each stdin line to `keys`.
///
/// Blocks, so it runs on its own thread; a detached reader never holds up
/// process exit. Returns at end of input or once the receiver is gone.
pub fn stdin_keys(keys: &mpsc::UnboundedSender<char>) -> std::io::Result<()> {
    for line in std::io::stdin().lock().lines() {
        let Some(c) = line?.trim().chars().next() else {
            continue;
        };
        debug!(key = %c, "Key read");
        if keys.send(c).is_err() {
            break;
        }
    }
    Ok(())
}
