use std::time::Duration;

use anyhow::{bail, Result};

use crate::actuator::PidActuator;
use crate::config::ActuatorParameters;
use crate::host::{Host, PosePublisher};
use crate::mixer;
use crate::state::SharedCommand;
use crate::telemetry::PoseRateLimiter;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
    Running,
    ShuttingDown,
    Stopped,
}

/// Mixing and actuator control, run once per simulation step
pub struct ControlLoop {
    host: Box<dyn Host>,
    publisher: Box<dyn PosePublisher>,
    shared: SharedCommand,
    actuators: Vec<PidActuator>,
    limiter: PoseRateLimiter,
    last_sim_time: Option<Duration>,
    commanded: bool,
    attitude_lost: bool,
    phase: Phase,
}

impl ControlLoop {
    pub fn new(
        host: Box<dyn Host>,
        publisher: Box<dyn PosePublisher>,
        shared: SharedCommand,
        pose_update_rate: Duration,
    ) -> Self {
        Self {
            host,
            publisher,
            shared,
            actuators: Vec::new(),
            limiter: PoseRateLimiter::new(pose_update_rate),
            last_sim_time: None,
            commanded: false,
            attitude_lost: false,
            phase: Phase::Uninitialized,
        }
    }

    /// Build the actuators in control order. Missing host actuators are kept inert,
    /// a missing mixer role is an error.
    pub fn load(&mut self, parameters: &[ActuatorParameters]) -> Result<()> {
        if self.phase != Phase::Uninitialized {
            bail!("Actuators already loaded");
        }
        let actuators = parameters
            .iter()
            .map(|parameters| PidActuator::load(parameters, self.host.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        mixer::check_airframe(&actuators)?;
        self.actuators = actuators;
        self.phase = Phase::Ready;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn actuators(&self) -> &[PidActuator] {
        &self.actuators
    }

    pub fn tick(&mut self) {
        match self.phase {
            Phase::Ready => self.phase = Phase::Running,
            Phase::Running => (),
            _ => return,
        }

        let now = self.host.sim_time();
        self.publish_pose(now);

        let elapsed = self.last_sim_time.map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_sim_time = Some(now);

        let Some(command) = self.shared.latest() else {
            return;
        };
        if !self.commanded {
            log::info!("First command received: {:?}", command);
            self.actuators.iter_mut().for_each(PidActuator::reset);
            self.commanded = true;
        }

        // A non finite sample would poison the integral of every flap
        let attitude = self.host.attitude();
        if !attitude.is_finite() {
            if !self.attitude_lost {
                log::warn!("Skipping control, invalid attitude {:?}", attitude);
                self.attitude_lost = true;
            }
            return;
        }
        if self.attitude_lost {
            log::info!("Attitude recovered");
            self.attitude_lost = false;
        }
        let mix = mixer::mix(&command, &attitude);
        for actuator in self.actuators.iter_mut() {
            actuator.drive(mix.target(actuator.kind()), elapsed, self.host.as_mut());
        }
    }

    fn publish_pose(&mut self, now: Duration) {
        if !self.limiter.is_due(now, self.publisher.subscribers()) {
            return;
        }
        let pose = self.host.world_pose();
        if let Err(e) = self.publisher.publish(&pose) {
            log::warn!("Cannot publish pose: {:#}", e);
        }
        self.limiter.mark_published(now);
    }

    /// Stop accepting ticks
    pub fn begin_shutdown(&mut self) {
        if self.phase != Phase::Stopped {
            self.phase = Phase::ShuttingDown;
        }
    }

    /// Release the actuators. The host actuators themselves are left untouched.
    pub fn finish_shutdown(&mut self) {
        self.actuators.clear();
        self.phase = Phase::Stopped;
    }
}
