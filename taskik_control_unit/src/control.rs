//! Control engine root.
//!
//! Differential IK pipeline: pseudo-inverse → task error → reference
//! integration → per-joint PID.

pub mod integrator;
pub mod pid;
pub mod pinv;
pub mod task_error;
