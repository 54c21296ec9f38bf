use std::thread::{self, JoinHandle};

use anyhow::{bail, Context, Result};
use crossbeam::channel::{bounded, select, Receiver, Sender};
use message::ZephyrMessage;

use crate::state::SharedCommand;
use crate::types::FlightCommand;

/// Worker draining inbound command frames into the shared command
pub struct Ingestor {
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl Ingestor {
    pub fn spawn(frames: Receiver<Vec<u8>>, shared: SharedCommand) -> Result<Self> {
        let (stop, stop_rx) = bounded(1);
        let thread = thread::Builder::new()
            .name("ingestor".into())
            .spawn(move || ingest(frames, stop_rx, shared))
            .context("Cannot spawn ingestor thread")?;
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// The worker also ends on its own when the transport disconnects
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |thread| thread.is_finished())
    }

    /// Signal the worker and wait for it
    pub fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.stop.try_send(());
            if thread.join().is_err() {
                log::error!("Ingestor thread panicked");
            }
        }
    }
}

impl Drop for Ingestor {
    fn drop(&mut self) {
        self.stop()
    }
}

fn ingest(frames: Receiver<Vec<u8>>, stop: Receiver<()>, shared: SharedCommand) {
    log::info!("Command ingestor started");
    loop {
        select! {
            recv(stop) -> _ => break,
            recv(frames) -> frame => match frame {
                Ok(frame) => match decode_command(&frame) {
                    Ok(command) => shared.set(command),
                    Err(e) => log::warn!("Dropping command: {:#}", e),
                },
                Err(_) => {
                    log::info!("Command transport closed");
                    break;
                },
            },
        }
    }
    log::debug!("Command ingestor stopped");
}

pub fn decode_command(frame: &[u8]) -> Result<FlightCommand> {
    match ZephyrMessage::decode(frame)? {
        ZephyrMessage::Control(twist) => FlightCommand::try_from(twist),
        other => bail!("Unexpected message {:?}", other),
    }
}
