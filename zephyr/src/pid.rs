use std::time::Duration;

use crate::config::PidConfig;

/// PID controller with a clamped integral and a clamped output
#[derive(Clone, Debug)]
pub struct Pid {
    config: PidConfig,
    integral: f64,
    previous_error: f64,
}

impl Pid {
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            integral: 0.0,
            previous_error: 0.0,
        }
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Compute the output for `error` after `elapsed` since the previous update.
    ///
    /// A zero `elapsed` gives a pure proportional output: the integral and derivative
    /// terms are left out as the interval is undefined.
    pub fn update(&mut self, error: f64, elapsed: Duration) -> f64 {
        let dt = elapsed.as_secs_f64();
        let PidConfig {
            p,
            i,
            d,
            i_max,
            i_min,
            cmd_max,
            cmd_min,
        } = self.config;

        self.integral = (self.integral + error * dt).clamp(i_min, i_max);
        let output = if dt > 0.0 {
            let derivative = (error - self.previous_error) / dt;
            p * error + i * self.integral + d * derivative
        } else {
            p * error
        };
        self.previous_error = error;

        output.clamp(cmd_min, cmd_max)
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
    }
}
