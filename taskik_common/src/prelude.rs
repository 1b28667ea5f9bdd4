//! Prelude module for common re-exports.
//!
//! ```rust
//! use taskik_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CYCLE_TIME_US, MAX_JOINTS, TASK_DIM};

// ─── Capabilities ───────────────────────────────────────────────────
pub use crate::actuator::ActuatorInterface;
pub use crate::kinematics::KinematicModel;

// ─── Data Model ─────────────────────────────────────────────────────
pub use crate::error::{ControlError, DegeneracyKind};
pub use crate::types::{CartesianPose, Jacobian, JointState, PseudoInverse, TaskVector, TorqueCommand};
