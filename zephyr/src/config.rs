use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::ActuatorKind;

pub const CONFIG_FILE: &str = "zephyr.toml";
const ENV_PREFIX: &str = "ZEPHYR";

fn unbounded_max() -> f64 {
    f64::INFINITY
}

fn unbounded_min() -> f64 {
    f64::NEG_INFINITY
}

/// Proportional Integral Derivative controller parameters
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
pub struct PidConfig {
    /// Proportional gain
    pub p: f64,
    /// Integral gain
    #[serde(default)]
    pub i: f64,
    /// Derivative gain
    #[serde(default)]
    pub d: f64,
    /// Upper limit of the integral accumulator
    #[serde(default = "unbounded_max")]
    pub i_max: f64,
    /// Lower limit of the integral accumulator
    #[serde(default = "unbounded_min")]
    pub i_min: f64,
    /// Upper limit of the output
    #[serde(default = "unbounded_max")]
    pub cmd_max: f64,
    /// Lower limit of the output
    #[serde(default = "unbounded_min")]
    pub cmd_min: f64,
}

impl PidConfig {
    /// Proportional only controller without any limit
    pub fn proportional(p: f64) -> Self {
        PidConfig {
            p,
            i: 0.0,
            d: 0.0,
            i_max: unbounded_max(),
            i_min: unbounded_min(),
            cmd_max: unbounded_max(),
            cmd_min: unbounded_min(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.p.is_finite() && self.i.is_finite() && self.d.is_finite(),
            "PID gains must be finite (p: {}, i: {}, d: {})",
            self.p,
            self.i,
            self.d
        );
        ensure!(self.i_min <= self.i_max, "i_min ({}) is above i_max ({})", self.i_min, self.i_max);
        ensure!(self.cmd_min <= self.cmd_max, "cmd_min ({}) is above cmd_max ({})", self.cmd_min, self.cmd_max);
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActuatorParameters {
    /// Name of the actuator in the host model
    pub name: String,
    pub kind: ActuatorKind,
    /// Without PID the target is applied as is
    #[serde(default)]
    pub pid: Option<PidConfig>,
}

fn default_model_name() -> String {
    String::from("zephyr")
}

fn default_pose_update_rate() -> u64 {
    100
}

fn default_command_queue_size() -> usize {
    100
}

/// Zephyr configuration parameters
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ZephyrParameters {
    /// Name of the controlled model, used to derive topic names
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Minimum interval between two pose publications [ms]
    #[serde(default = "default_pose_update_rate")]
    pub pose_update_rate: u64,
    /// Capacity of the inbound command queue
    #[serde(default = "default_command_queue_size")]
    pub command_queue_size: usize,
    /// Actuators in control order
    #[serde(default)]
    pub actuators: Vec<ActuatorParameters>,
}

impl Default for ZephyrParameters {
    fn default() -> Self {
        ZephyrParameters {
            model_name: default_model_name(),
            pose_update_rate: default_pose_update_rate(),
            command_queue_size: default_command_queue_size(),
            actuators: Vec::new(),
        }
    }
}

impl ZephyrParameters {
    /// Load the parameters from a TOML file, `ZEPHYR_*` environment variables take precedence
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("Cannot open configuration file {}", path.display()))?;
        let parameters: Self = settings.try_deserialize().context("Cannot parse configuration file")?;
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let parameters: Self = toml::from_str(content).context("Cannot parse configuration")?;
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config = toml::to_string_pretty(self).context("Cannot serialize configuration")?;
        std::fs::write(path, config).context("Cannot write configuration file")
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.model_name.is_empty(), "Model name cannot be empty");
        ensure!(self.command_queue_size > 0, "Command queue size cannot be zero");
        for actuator in self.actuators.iter() {
            if actuator.name.is_empty() {
                bail!("Actuator of kind {} has no name", actuator.kind);
            }
            if let Some(pid) = actuator.pid.as_ref() {
                pid.validate().with_context(|| format!("Invalid PID for actuator {}", actuator.name))?;
            }
        }
        Ok(())
    }

    pub fn control_topic(&self) -> String {
        format!("{}_control", self.model_name)
    }

    pub fn pose_topic(&self) -> String {
        format!("{}_pose", self.model_name)
    }
}
