use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub use message::Pose;
use message::Twist;

#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct Angles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Angles {
    pub fn is_finite(&self) -> bool {
        self.roll.is_finite() && self.pitch.is_finite() && self.yaw.is_finite()
    }
}

/// High level command: throttle plus the pitch and roll set points
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlightCommand {
    pub throttle: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl TryFrom<Twist> for FlightCommand {
    type Error = anyhow::Error;

    fn try_from(twist: Twist) -> Result<Self> {
        let command = FlightCommand {
            throttle: twist.linear.x,
            pitch: twist.angular.y,
            roll: twist.angular.x,
        };
        if !(command.throttle.is_finite() && command.pitch.is_finite() && command.roll.is_finite()) {
            bail!("Non finite flight command {:?}", command);
        }
        Ok(command)
    }
}

/// Role of an actuator in the airframe
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    Propeller,
    FlapLeft,
    FlapRight,
}

impl ActuatorKind {
    pub const ALL: [ActuatorKind; 3] = [ActuatorKind::Propeller, ActuatorKind::FlapLeft, ActuatorKind::FlapRight];
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorKind::Propeller => write!(f, "propeller"),
            ActuatorKind::FlapLeft => write!(f, "flap_left"),
            ActuatorKind::FlapRight => write!(f, "flap_right"),
        }
    }
}
