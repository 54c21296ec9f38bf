//! Capabilities the flight controller needs from the simulation host and the
//! message transport.

use std::time::Duration;

use anyhow::Result;

use crate::types::{Angles, Pose};

/// Host side reference to an actuator. The controller never owns the actuator itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActuatorHandle(pub usize);

pub trait Host: Send {
    /// Look up an actuator of the model by name
    fn actuator(&self, name: &str) -> Option<ActuatorHandle>;

    fn apply_effort(&mut self, actuator: ActuatorHandle, effort: f64) -> Result<()>;

    /// Current vehicle attitude
    fn attitude(&self) -> Angles;

    fn world_pose(&self) -> Pose;

    /// Monotonic simulation time
    fn sim_time(&self) -> Duration;
}

pub trait PosePublisher: Send {
    /// Number of consumers currently listening
    fn subscribers(&self) -> usize;

    fn publish(&mut self, pose: &Pose) -> Result<()>;
}

pub type TickCallback = Box<dyn FnMut() + Send>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TickConnection(pub u64);

/// Source of simulation steps. Callbacks are invoked once per step on the simulation thread.
pub trait TickSource: Send {
    fn connect(&mut self, callback: TickCallback) -> TickConnection;

    /// Once this returns the callback is never invoked again
    fn disconnect(&mut self, connection: TickConnection);
}
