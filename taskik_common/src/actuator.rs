//! Actuator interface capability.
//!
//! Per-joint read of position/velocity and write of the torque command.
//! Implemented by hardware backends and by the simulation HAL.

/// Joint-level access to the actuated chain.
///
/// Joint indices run `0..joint_count()` in chain order (root to tip).
pub trait ActuatorInterface {
    /// Number of joints exposed by this interface.
    fn joint_count(&self) -> usize;

    /// Measured position of joint `i`.
    fn position(&self, i: usize) -> f64;

    /// Measured velocity of joint `i`.
    fn velocity(&self, i: usize) -> f64;

    /// Command torque for joint `i` [Nm].
    fn set_command(&mut self, i: usize, torque: f64);
}
