use anyhow::{bail, Result};

use crate::actuator::PidActuator;
use crate::types::{ActuatorKind, Angles, FlightCommand};

/// Actuator targets of the fixed wing airframe
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Mix {
    pub propeller: f64,
    pub flap_left: f64,
    pub flap_right: f64,
}

impl Mix {
    pub fn target(&self, kind: ActuatorKind) -> f64 {
        match kind {
            ActuatorKind::Propeller => self.propeller,
            ActuatorKind::FlapLeft => self.flap_left,
            ActuatorKind::FlapRight => self.flap_right,
        }
    }
}

/// Mix the flight command with the current attitude.
/// Flaps move together for pitch and oppositely for roll, throttle goes straight to the propeller.
pub fn mix(command: &FlightCommand, attitude: &Angles) -> Mix {
    let pitch_error = attitude.pitch - command.pitch;
    let roll_error = attitude.roll - command.roll;
    Mix {
        propeller: command.throttle,
        flap_left: pitch_error - roll_error,
        flap_right: pitch_error + roll_error,
    }
}

/// Check every role the mixer drives is present in the actuator list
pub fn check_airframe(actuators: &[PidActuator]) -> Result<()> {
    for kind in ActuatorKind::ALL {
        if !actuators.iter().any(|actuator| actuator.kind() == kind) {
            bail!("Airframe has no {} actuator", kind);
        }
    }
    Ok(())
}
