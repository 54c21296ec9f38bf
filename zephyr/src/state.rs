use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::types::FlightCommand;

/// Command and the moment it was received, always read and written together
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CommandSnapshot {
    pub command: FlightCommand,
    /// `None` until the first command arrives
    pub last_update: Option<Instant>,
}

/// Command buffer shared between the ingestor and the control loop.
/// Only the latest command is kept.
#[derive(Clone, Default)]
pub struct SharedCommand {
    inner: Arc<Mutex<CommandSnapshot>>,
}

impl SharedCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, command: FlightCommand) {
        let mut snapshot = self.inner.lock();
        snapshot.command = command;
        snapshot.last_update = Some(Instant::now());
    }

    pub fn snapshot(&self) -> CommandSnapshot {
        *self.inner.lock()
    }

    /// Latest command, `None` if nothing was ever received
    pub fn latest(&self) -> Option<FlightCommand> {
        let snapshot = self.snapshot();
        snapshot.last_update.map(|_| snapshot.command)
    }
}
