use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::ActuatorParameters;
use crate::host::{ActuatorHandle, Host};
use crate::pid::Pid;
use crate::types::ActuatorKind;

/// One controlled surface or propulsion unit
pub struct PidActuator {
    name: String,
    kind: ActuatorKind,
    pid: Option<Pid>,
    handle: Option<ActuatorHandle>,
    faulted: bool,
}

impl PidActuator {
    pub fn new(name: impl Into<String>, kind: ActuatorKind, pid: Option<Pid>, handle: Option<ActuatorHandle>) -> Self {
        Self {
            name: name.into(),
            kind,
            pid,
            handle,
            faulted: false,
        }
    }

    /// Build the actuator and resolve its handle on the host.
    /// An unresolved handle leaves the actuator inert, invalid PID limits are an error.
    pub fn load(parameters: &ActuatorParameters, host: &dyn Host) -> Result<Self> {
        let pid = match parameters.pid {
            Some(config) => {
                config.validate().with_context(|| format!("Invalid PID for actuator {}", parameters.name))?;
                Some(Pid::new(config))
            },
            None => {
                log::info!("No PID for actuator {}, target is applied as is", parameters.name);
                None
            },
        };
        let handle = host.actuator(&parameters.name);
        if handle.is_none() {
            log::error!("Cannot get actuator with name: {}", parameters.name);
        }
        Ok(Self::new(parameters.name.clone(), parameters.kind, pid, handle))
    }

    pub fn kind(&self) -> ActuatorKind {
        self.kind
    }

    pub fn pid(&self) -> Option<&Pid> {
        self.pid.as_ref()
    }

    pub fn is_inert(&self) -> bool {
        self.handle.is_none()
    }

    pub fn compute_command(&mut self, target: f64, elapsed: Duration) -> f64 {
        match self.pid.as_mut() {
            Some(pid) => pid.update(target, elapsed),
            None => target,
        }
    }

    /// Compute the command and apply it on the host.
    /// Returns the applied effort, `None` if the actuator is inert or the host refused it.
    pub fn drive(&mut self, target: f64, elapsed: Duration, host: &mut dyn Host) -> Option<f64> {
        let handle = self.handle?;
        let effort = self.compute_command(target, elapsed);
        match host.apply_effort(handle, effort) {
            Ok(()) => {
                if self.faulted {
                    log::info!("Actuator {} recovered", self.name);
                    self.faulted = false;
                }
                Some(effort)
            },
            Err(e) => {
                if !self.faulted {
                    log::warn!("Cannot apply effort on actuator {}: {:#}", self.name, e);
                    self.faulted = true;
                }
                None
            },
        }
    }

    pub fn reset(&mut self) {
        if let Some(pid) = self.pid.as_mut() {
            pid.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PidConfig;
    use crate::mock::MockHost;

    #[test]
    fn pass_through_without_pid() {
        let mut actuator = PidActuator::new("propeller_joint", ActuatorKind::Propeller, None, None);
        assert_eq!(actuator.compute_command(42.5, Duration::from_millis(1)), 42.5);
    }

    #[test]
    fn load_resolves_handle() {
        let host = MockHost::new(&["propeller_joint"]);
        let resolved = PidActuator::load(
            &ActuatorParameters {
                name: "propeller_joint".into(),
                kind: ActuatorKind::Propeller,
                pid: Some(PidConfig::proportional(1.0)),
            },
            &host,
        )
        .unwrap();
        assert!(!resolved.is_inert());
        assert!(resolved.pid().is_some());

        let missing = PidActuator::load(
            &ActuatorParameters {
                name: "rudder_joint".into(),
                kind: ActuatorKind::FlapLeft,
                pid: None,
            },
            &host,
        )
        .unwrap();
        assert!(missing.is_inert());
    }

    #[test]
    fn load_rejects_inverted_limits() {
        let host = MockHost::new(&["flap_left_joint"]);
        let mut parameters = ActuatorParameters {
            name: "flap_left_joint".into(),
            kind: ActuatorKind::FlapLeft,
            pid: Some(PidConfig {
                cmd_min: 1.0,
                cmd_max: -1.0,
                ..PidConfig::proportional(1.0)
            }),
        };
        assert!(PidActuator::load(&parameters, &host).is_err());

        parameters.pid = Some(PidConfig {
            i_min: 0.5,
            i_max: -0.5,
            ..PidConfig::proportional(1.0)
        });
        assert!(PidActuator::load(&parameters, &host).is_err());
    }

    #[test]
    fn inert_actuator_does_not_compute() {
        let mut host = MockHost::new(&[]);
        let mut actuator = PidActuator::new("flap_left_joint", ActuatorKind::FlapLeft, Some(Pid::new(PidConfig::proportional(1.0))), None);
        assert_eq!(actuator.drive(1.0, Duration::from_millis(10), &mut host), None);
        assert_eq!(host.efforts_applied(), 0);
    }

    #[test]
    fn host_failure_is_isolated() {
        let mut host = MockHost::new(&["flap_left_joint"]);
        let handle = host.actuator("flap_left_joint");
        let mut actuator = PidActuator::new("flap_left_joint", ActuatorKind::FlapLeft, None, handle);

        host.fail_actuator("flap_left_joint", true);
        assert_eq!(actuator.drive(0.3, Duration::ZERO, &mut host), None);
        assert_eq!(actuator.drive(0.3, Duration::ZERO, &mut host), None);

        host.fail_actuator("flap_left_joint", false);
        assert_eq!(actuator.drive(0.3, Duration::ZERO, &mut host), Some(0.3));
        assert_eq!(host.effort("flap_left_joint"), Some(0.3));
    }
}
