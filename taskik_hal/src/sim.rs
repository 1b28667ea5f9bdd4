//! Simulated joint actuators.
//!
//! Each joint is an independent rigid body driven by the commanded torque:
//!
//! `I·q̈ = τ − b·q̇`
//!
//! integrated with semi-implicit Euler in [`SimulatedJoints::step`]. There
//! is no gravity and no inertial coupling between joints.

use serde::{Deserialize, Serialize};
use taskik_common::actuator::ActuatorInterface;
use thiserror::Error;
use tracing::{debug, trace};

/// Inertia used when `[simulation]` gives none [kg·m²].
pub const DEFAULT_INERTIA: f64 = 1.0;
/// Viscous damping used when `[simulation]` gives none [Nm·s/rad].
pub const DEFAULT_DAMPING: f64 = 20.0;

/// Errors while building [`SimulatedJoints`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A per-joint list has the wrong length.
    #[error("simulation.{field} has {got} entries, chain has {expected} joints")]
    LengthMismatch {
        /// Offending field.
        field: &'static str,
        /// Joint count.
        expected: usize,
        /// Entries given.
        got: usize,
    },
    /// Inertia must be strictly positive and finite.
    #[error("simulation.inertia[{0}] must be positive and finite")]
    InvalidInertia(usize),
    /// Damping must be non-negative and finite.
    #[error("simulation.damping[{0}] must be non-negative and finite")]
    InvalidDamping(usize),
}

/// `[simulation]` section of the chain description.
///
/// Empty lists select the defaults for every joint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Per-joint inertia [kg·m²].
    #[serde(default)]
    pub inertia: Vec<f64>,
    /// Per-joint viscous damping [Nm·s/rad].
    #[serde(default)]
    pub damping: Vec<f64>,
    /// Per-joint initial position [rad].
    #[serde(default)]
    pub initial_positions: Vec<f64>,
}

fn per_joint(
    field: &'static str,
    values: &[f64],
    joints: usize,
    default: f64,
) -> Result<Vec<f64>, SimError> {
    match values.len() {
        0 => Ok(vec![default; joints]),
        n if n == joints => Ok(values.to_vec()),
        got => Err(SimError::LengthMismatch {
            field,
            expected: joints,
            got,
        }),
    }
}

/// Decoupled per-joint dynamics implementing [`ActuatorInterface`].
#[derive(Debug, Clone)]
pub struct SimulatedJoints {
    q: Vec<f64>,
    qdot: Vec<f64>,
    torque: Vec<f64>,
    inertia: Vec<f64>,
    damping: Vec<f64>,
}

impl SimulatedJoints {
    /// Build `joints` simulated joints from `config`.
    ///
    /// # Errors
    /// [`SimError`] on list length mismatch or invalid physical parameters.
    pub fn from_config(joints: usize, config: &SimulationConfig) -> Result<Self, SimError> {
        let inertia = per_joint("inertia", &config.inertia, joints, DEFAULT_INERTIA)?;
        let damping = per_joint("damping", &config.damping, joints, DEFAULT_DAMPING)?;
        let q = per_joint("initial_positions", &config.initial_positions, joints, 0.0)?;

        if let Some(i) = inertia.iter().position(|&m| !(m.is_finite() && m > 0.0)) {
            return Err(SimError::InvalidInertia(i));
        }
        if let Some(i) = damping.iter().position(|&b| !(b.is_finite() && b >= 0.0)) {
            return Err(SimError::InvalidDamping(i));
        }

        debug!("simulated joints: inertia {:?}, damping {:?}", inertia, damping);
        Ok(Self {
            q,
            qdot: vec![0.0; joints],
            torque: vec![0.0; joints],
            inertia,
            damping,
        })
    }

    /// Joints at rest at `positions`, default inertia and damping.
    pub fn at_rest(positions: &[f64]) -> Self {
        let n = positions.len();
        Self {
            q: positions.to_vec(),
            qdot: vec![0.0; n],
            torque: vec![0.0; n],
            inertia: vec![DEFAULT_INERTIA; n],
            damping: vec![DEFAULT_DAMPING; n],
        }
    }

    /// Advance the dynamics by `dt` seconds under the last commanded torques.
    pub fn step(&mut self, dt: f64) {
        for i in 0..self.q.len() {
            let accel = (self.torque[i] - self.damping[i] * self.qdot[i]) / self.inertia[i];
            self.qdot[i] += accel * dt;
            self.q[i] += self.qdot[i] * dt;
        }
        trace!("sim step: q = {:?}", self.q);
    }

    /// Current joint positions.
    pub fn positions(&self) -> &[f64] {
        &self.q
    }

    /// Last commanded torques.
    pub fn torques(&self) -> &[f64] {
        &self.torque
    }
}

impl ActuatorInterface for SimulatedJoints {
    fn joint_count(&self) -> usize {
        self.q.len()
    }

    fn position(&self, i: usize) -> f64 {
        self.q[i]
    }

    fn velocity(&self, i: usize) -> f64 {
        self.qdot[i]
    }

    fn set_command(&mut self, i: usize, torque: f64) {
        self.torque[i] = torque;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
