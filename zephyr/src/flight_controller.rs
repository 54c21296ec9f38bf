use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use parking_lot::Mutex;

use crate::config::ZephyrParameters;
use crate::control_loop::{ControlLoop, Phase};
use crate::host::{Host, PosePublisher, TickConnection, TickSource};
use crate::ingestor::Ingestor;
use crate::state::SharedCommand;

/// Wires the control loop on the host tick source and the ingestor on the command transport
pub struct FlightController {
    control: Arc<Mutex<ControlLoop>>,
    shared: SharedCommand,
    ingestor: Ingestor,
    ticks: Box<dyn TickSource>,
    connection: Option<TickConnection>,
}

impl FlightController {
    pub fn new(
        parameters: &ZephyrParameters,
        host: Box<dyn Host>,
        publisher: Box<dyn PosePublisher>,
        mut ticks: Box<dyn TickSource>,
        frames: Receiver<Vec<u8>>,
    ) -> Result<Self> {
        parameters.validate()?;
        let shared = SharedCommand::new();
        let mut control = ControlLoop::new(
            host,
            publisher,
            shared.clone(),
            Duration::from_millis(parameters.pose_update_rate),
        );
        control.load(&parameters.actuators).context("Cannot load actuators")?;

        let ingestor = Ingestor::spawn(frames, shared.clone())?;

        let control = Arc::new(Mutex::new(control));
        let connection = {
            let control = control.clone();
            ticks.connect(Box::new(move || control.lock().tick()))
        };
        log::info!(
            "Flight controller ready: {} actuators, commands on {}, pose on {}",
            parameters.actuators.len(),
            parameters.control_topic(),
            parameters.pose_topic()
        );

        Ok(Self {
            control,
            shared,
            ingestor,
            ticks,
            connection: Some(connection),
        })
    }

    pub fn phase(&self) -> Phase {
        self.control.lock().phase()
    }

    pub fn shared_command(&self) -> &SharedCommand {
        &self.shared
    }

    /// Run `f` on the control loop while no tick is in progress
    pub fn inspect<T>(&self, f: impl FnOnce(&ControlLoop) -> T) -> T {
        f(&self.control.lock())
    }

    /// Teardown order: stop ticking, leave the tick source, join the ingestor,
    /// then release the actuators.
    pub fn shutdown(&mut self) {
        if self.phase() == Phase::Stopped {
            return;
        }
        self.control.lock().begin_shutdown();
        if let Some(connection) = self.connection.take() {
            self.ticks.disconnect(connection);
        }
        self.ingestor.stop();
        self.control.lock().finish_shutdown();
        log::info!("Flight controller stopped");
    }
}

impl Drop for FlightController {
    fn drop(&mut self) {
        self.shutdown()
    }
}
