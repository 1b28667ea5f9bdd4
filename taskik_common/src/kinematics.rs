//! Kinematic model capability.
//!
//! The controller treats the kinematic chain as an opaque capability bound
//! once at initialization. Building the chain (robot description parsing,
//! root/tip extraction) is the implementor's concern.

use nalgebra::DVector;

use crate::types::{CartesianPose, Jacobian};

/// Jacobian and forward-kinematics provider for a fixed serial chain.
///
/// # Timing Contracts
///
/// Both methods are called once per control cycle and must complete in
/// bounded time with no blocking I/O.
pub trait KinematicModel: Send {
    /// Number of actuated joints N. Fixed for the lifetime of the model.
    fn joint_count(&self) -> usize;

    /// Write the 6×N task Jacobian at configuration `q` into `jacobian`.
    ///
    /// `jacobian` is pre-sized to 6×N by the caller.
    fn jacobian(&self, q: &DVector<f64>, jacobian: &mut Jacobian);

    /// Pose of the chain tip at configuration `q`.
    fn forward_kinematics(&self, q: &DVector<f64>) -> CartesianPose;
}
