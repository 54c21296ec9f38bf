//! In-process stand-ins for the simulation host and the transport

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use message::{Quaternion, Vector3};
use parking_lot::Mutex;

use crate::host::{ActuatorHandle, Host, PosePublisher, TickCallback, TickConnection, TickSource};
use crate::types::{Angles, Pose};

// Attitude change per unit of flap effort [rad/s]
const FLAP_AUTHORITY: f64 = 0.8;
// Forward speed per unit of throttle [m/s]
const PROPELLER_AUTHORITY: f64 = 20.0;

#[derive(Default)]
struct HostState {
    actuators: Vec<String>,
    efforts: HashMap<ActuatorHandle, f64>,
    applied: usize,
    failing: HashSet<ActuatorHandle>,
    attitude: Angles,
    position: Vector3,
    sim_time: Duration,
}

#[derive(Clone, Default)]
pub struct MockHost {
    inner: Arc<Mutex<HostState>>,
}

impl MockHost {
    pub fn new(actuators: &[&str]) -> Self {
        let state = HostState {
            actuators: actuators.iter().map(|name| name.to_string()).collect(),
            ..Default::default()
        };
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Host with the propeller and both flaps
    pub fn airframe() -> Self {
        Self::new(&["propeller_joint", "flap_left_joint", "flap_right_joint"])
    }

    fn handle(state: &HostState, name: &str) -> Option<ActuatorHandle> {
        state.actuators.iter().position(|actuator| actuator == name).map(ActuatorHandle)
    }

    /// Last effort applied on `name`
    pub fn effort(&self, name: &str) -> Option<f64> {
        let state = self.inner.lock();
        Self::handle(&state, name).and_then(|handle| state.efforts.get(&handle).copied())
    }

    /// Number of efforts applied since creation
    pub fn efforts_applied(&self) -> usize {
        self.inner.lock().applied
    }

    pub fn fail_actuator(&self, name: &str, failing: bool) {
        let mut state = self.inner.lock();
        if let Some(handle) = Self::handle(&state, name) {
            if failing {
                state.failing.insert(handle);
            } else {
                state.failing.remove(&handle);
            }
        }
    }

    pub fn set_attitude(&self, attitude: Angles) {
        self.inner.lock().attitude = attitude;
    }

    pub fn advance(&self, dt: Duration) {
        self.inner.lock().sim_time += dt;
    }

    /// Advance the clock and let the airframe respond to the applied efforts
    pub fn step(&self, dt: Duration) {
        let mut state = self.inner.lock();
        let seconds = dt.as_secs_f64();
        let effort = |state: &HostState, name: &str| {
            Self::handle(state, name).and_then(|handle| state.efforts.get(&handle).copied()).unwrap_or(0.0)
        };
        let propeller = effort(&*state, "propeller_joint");
        let left = effort(&*state, "flap_left_joint");
        let right = effort(&*state, "flap_right_joint");

        state.attitude.pitch -= FLAP_AUTHORITY * (left + right) / 2.0 * seconds;
        state.attitude.roll -= FLAP_AUTHORITY * (right - left) / 2.0 * seconds;
        let speed = PROPELLER_AUTHORITY * propeller;
        let yaw = state.attitude.yaw;
        state.position.x += speed * yaw.cos() * seconds;
        state.position.y += speed * yaw.sin() * seconds;
        state.sim_time += dt;
    }
}

fn orientation(attitude: &Angles) -> Quaternion {
    let (sr, cr) = (attitude.roll / 2.0).sin_cos();
    let (sp, cp) = (attitude.pitch / 2.0).sin_cos();
    let (sy, cy) = (attitude.yaw / 2.0).sin_cos();
    Quaternion {
        x: sr * cp * cy - cr * sp * sy,
        y: cr * sp * cy + sr * cp * sy,
        z: cr * cp * sy - sr * sp * cy,
        w: cr * cp * cy + sr * sp * sy,
    }
}

impl Host for MockHost {
    fn actuator(&self, name: &str) -> Option<ActuatorHandle> {
        Self::handle(&self.inner.lock(), name)
    }

    fn apply_effort(&mut self, actuator: ActuatorHandle, effort: f64) -> Result<()> {
        let mut state = self.inner.lock();
        if state.failing.contains(&actuator) || actuator.0 >= state.actuators.len() {
            bail!("Actuator {:?} unavailable", actuator);
        }
        state.efforts.insert(actuator, effort);
        state.applied += 1;
        Ok(())
    }

    fn attitude(&self) -> Angles {
        self.inner.lock().attitude
    }

    fn world_pose(&self) -> Pose {
        let state = self.inner.lock();
        Pose {
            position: state.position,
            orientation: orientation(&state.attitude),
        }
    }

    fn sim_time(&self) -> Duration {
        self.inner.lock().sim_time
    }
}

#[derive(Default)]
struct PublisherState {
    subscribers: usize,
    published: Vec<Pose>,
}

#[derive(Clone, Default)]
pub struct MockPublisher {
    inner: Arc<Mutex<PublisherState>>,
}

impl MockPublisher {
    pub fn new(subscribers: usize) -> Self {
        let publisher = Self::default();
        publisher.set_subscribers(subscribers);
        publisher
    }

    pub fn set_subscribers(&self, subscribers: usize) {
        self.inner.lock().subscribers = subscribers;
    }

    pub fn published(&self) -> Vec<Pose> {
        self.inner.lock().published.clone()
    }
}

impl PosePublisher for MockPublisher {
    fn subscribers(&self) -> usize {
        self.inner.lock().subscribers
    }

    fn publish(&mut self, pose: &Pose) -> Result<()> {
        self.inner.lock().published.push(*pose);
        Ok(())
    }
}

#[derive(Default)]
struct TicksState {
    next: u64,
    callbacks: Vec<(TickConnection, TickCallback)>,
}

/// Tick source fired by hand, one call of `fire` is one simulation step
#[derive(Clone, Default)]
pub struct ManualTicks {
    inner: Arc<Mutex<TicksState>>,
}

impl ManualTicks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        let mut state = self.inner.lock();
        for (_, callback) in state.callbacks.iter_mut() {
            callback();
        }
    }

    pub fn connections(&self) -> usize {
        self.inner.lock().callbacks.len()
    }
}

impl TickSource for ManualTicks {
    fn connect(&mut self, callback: TickCallback) -> TickConnection {
        let mut state = self.inner.lock();
        let connection = TickConnection(state.next);
        state.next += 1;
        state.callbacks.push((connection, callback));
        connection
    }

    fn disconnect(&mut self, connection: TickConnection) {
        self.inner.lock().callbacks.retain(|(id, _)| *id != connection);
    }
}
