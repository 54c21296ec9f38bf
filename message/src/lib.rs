use anyhow::{Context, Result};

pub use speedy::Readable;
pub use speedy::Writable;

#[derive(Readable, Writable, Default, Clone, Copy, Debug, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Velocity command as sent by the control transport.
/// `linear.x` carries throttle, `angular.y` pitch and `angular.x` roll.
#[derive(Readable, Writable, Default, Clone, Copy, Debug, PartialEq)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

#[derive(Readable, Writable, Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// World pose of the vehicle
#[derive(Readable, Writable, Default, Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vector3,
    pub orientation: Quaternion,
}

#[derive(Readable, Writable, Debug, PartialEq)]
pub enum ZephyrMessage {
    Control(Twist),
    Pose(Pose),
}

impl ZephyrMessage {
    pub fn decode(frame: &[u8]) -> Result<Self> {
        ZephyrMessage::read_from_buffer(frame).context("Cannot decode message")
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        self.write_to_vec().context("Cannot encode message")
    }
}
