//! Controller configuration loaded from TOML.
//!
//! All fields are optional; missing values fall back to the baseline
//! behavior (1 kHz cycle, undamped pseudo-inverse, Kp=100 / Ki=1 / Kd=0).
//!
//! # TOML Example
//!
//! ```toml
//! cycle_time_us = 1000
//!
//! [shared]
//! log_level = "info"
//! service_name = "taskik-cu"
//!
//! [pinv]
//! policy = "undamped"
//! singular_epsilon = 1e-5
//! svd_max_iterations = 150
//!
//! [default_gains]
//! kp = 100.0
//! ki = 1.0
//! kd = 0.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use taskik_common::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
use taskik_common::consts::{
    CYCLE_TIME_US, CYCLE_TIME_US_MAX, CYCLE_TIME_US_MIN, DEFAULT_DAMPING,
    DEFAULT_DEGENERACY_LOG_INTERVAL, DEFAULT_KD, DEFAULT_KI, DEFAULT_KP, DEFAULT_SINGULAR_EPSILON,
    DEFAULT_SVD_MAX_ITERATIONS,
};
use tracing::info;

use crate::control::pid::PidGains;
use crate::control::pinv::PinvPolicy;

// ─── Pseudo-Inverse Section ─────────────────────────────────────────

/// Selects how small singular values are inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PinvPolicyKind {
    /// Exact inverse of every singular value above `singular_epsilon`.
    #[default]
    Undamped,
    /// Damped least squares with factor `damping`.
    Damped,
}

/// `[pinv]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinvConfig {
    #[serde(default)]
    pub policy: PinvPolicyKind,

    /// Truncation threshold for the undamped policy.
    #[serde(default = "default_singular_epsilon")]
    pub singular_epsilon: f64,

    /// Damping factor λ for the damped policy.
    #[serde(default = "default_damping")]
    pub damping: f64,

    /// Upper bound on SVD sweeps per cycle.
    #[serde(default = "default_svd_max_iterations")]
    pub svd_max_iterations: usize,
}

impl Default for PinvConfig {
    fn default() -> Self {
        Self {
            policy: PinvPolicyKind::default(),
            singular_epsilon: default_singular_epsilon(),
            damping: default_damping(),
            svd_max_iterations: default_svd_max_iterations(),
        }
    }
}

impl PinvConfig {
    /// Resolve the section into a solver policy.
    pub fn policy(&self) -> PinvPolicy {
        match self.policy {
            PinvPolicyKind::Undamped => PinvPolicy::Undamped {
                singular_epsilon: self.singular_epsilon,
            },
            PinvPolicyKind::Damped => PinvPolicy::Damped {
                lambda: self.damping,
            },
        }
    }
}

// ─── Gains Section ──────────────────────────────────────────────────

/// `[default_gains]` section: gains every joint receives at start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DefaultGainsConfig {
    #[serde(default = "default_kp")]
    pub kp: f64,
    #[serde(default = "default_ki")]
    pub ki: f64,
    #[serde(default = "default_kd")]
    pub kd: f64,
}

impl Default for DefaultGainsConfig {
    fn default() -> Self {
        Self {
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            kd: DEFAULT_KD,
        }
    }
}

impl DefaultGainsConfig {
    #[inline]
    pub fn gains(&self) -> PidGains {
        PidGains {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
        }
    }
}

// ─── Top-Level Config ───────────────────────────────────────────────

/// Top-level controller configuration.
///
/// Immutable once the controller has been created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_shared")]
    pub shared: SharedConfig,

    /// Target cycle time in microseconds (default: 1000 = 1ms).
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,

    #[serde(default)]
    pub pinv: PinvConfig,

    #[serde(default)]
    pub default_gains: DefaultGainsConfig,

    /// Log a degenerate cycle once, then every N occurrences.
    #[serde(default = "default_degeneracy_log_interval")]
    pub degeneracy_log_interval: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            shared: default_shared(),
            cycle_time_us: default_cycle_time_us(),
            pinv: PinvConfig::default(),
            default_gains: DefaultGainsConfig::default(),
            degeneracy_log_interval: default_degeneracy_log_interval(),
        }
    }
}

fn default_shared() -> SharedConfig {
    SharedConfig {
        log_level: LogLevel::Info,
        service_name: "taskik_control_unit".to_string(),
    }
}
fn default_cycle_time_us() -> u32 {
    CYCLE_TIME_US
}
fn default_singular_epsilon() -> f64 {
    DEFAULT_SINGULAR_EPSILON
}
fn default_damping() -> f64 {
    DEFAULT_DAMPING
}
fn default_svd_max_iterations() -> usize {
    DEFAULT_SVD_MAX_ITERATIONS
}
fn default_kp() -> f64 {
    DEFAULT_KP
}
fn default_ki() -> f64 {
    DEFAULT_KI
}
fn default_kd() -> f64 {
    DEFAULT_KD
}
fn default_degeneracy_log_interval() -> u64 {
    DEFAULT_DEGENERACY_LOG_INTERVAL
}

impl ControllerConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.cycle_time_us < CYCLE_TIME_US_MIN || self.cycle_time_us > CYCLE_TIME_US_MAX {
            return Err(invalid(format!(
                "cycle_time_us {} out of range [{}, {}]",
                self.cycle_time_us, CYCLE_TIME_US_MIN, CYCLE_TIME_US_MAX
            )));
        }

        let p = &self.pinv;
        if !(p.singular_epsilon.is_finite() && p.singular_epsilon >= 0.0) {
            return Err(invalid(format!(
                "pinv.singular_epsilon {} must be finite and >= 0",
                p.singular_epsilon
            )));
        }
        if !(p.damping.is_finite() && p.damping >= 0.0) {
            return Err(invalid(format!(
                "pinv.damping {} must be finite and >= 0",
                p.damping
            )));
        }
        if p.policy == PinvPolicyKind::Damped && p.damping == 0.0 {
            return Err(invalid(
                "pinv.damping must be > 0 for the damped policy".to_string(),
            ));
        }
        if p.svd_max_iterations == 0 {
            return Err(invalid("pinv.svd_max_iterations must be > 0".to_string()));
        }

        let g = &self.default_gains;
        for (name, value) in [("kp", g.kp), ("ki", g.ki), ("kd", g.kd)] {
            if !value.is_finite() {
                return Err(invalid(format!("default_gains.{name} is not finite")));
            }
        }

        if self.degeneracy_log_interval == 0 {
            return Err(invalid("degeneracy_log_interval must be > 0".to_string()));
        }
        Ok(())
    }

    /// Cycle period [s].
    #[inline]
    pub fn cycle_time_s(&self) -> f64 {
        self.cycle_time_us as f64 * 1e-6
    }

    /// `EnvFilter` directive for this process: `[shared] log_level`, raised
    /// to `debug` when `verbose` is set.
    pub fn log_directive(&self, verbose: bool) -> &'static str {
        if verbose && self.shared.log_level != LogLevel::Trace {
            LogLevel::Debug.as_directive()
        } else {
            self.shared.log_level.as_directive()
        }
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the controller configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ControllerConfig, ConfigError> {
    let config = ControllerConfig::load(path)?;
    config.validate()?;
    info!(
        "Loaded controller config from {}: cycle_time={}us, pinv={:?}",
        path.display(),
        config.cycle_time_us,
        config.pinv.policy
    );
    Ok(config)
}

/// Load and validate config from a TOML string (for testing).
pub fn load_config_from_str(content: &str) -> Result<ControllerConfig, ConfigError> {
    let config: ControllerConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

// ─── Tests ──────────────────────────────────────────────────────────
