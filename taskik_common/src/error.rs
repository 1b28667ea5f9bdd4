//! Controller error taxonomy.
//!
//! - Configuration errors (bad gain payloads) are rejected at the update
//!   surface and never reach the control cycle.
//! - Numerical degeneracy is recovered per cycle by holding the previous
//!   torque command.
//! - Setup failures are fatal and surface before the first cycle runs.

use thiserror::Error;

/// What made a cycle numerically degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegeneracyKind {
    /// The Jacobian contained a NaN or infinite entry.
    NonFiniteJacobian,
    /// The SVD did not converge within its iteration bound.
    SvdNotConverged,
    /// The computed pseudo-inverse contained a NaN or infinite entry.
    NonFinitePseudoInverse,
    /// Measured joint state or measured pose was not finite.
    NonFiniteMeasurement,
    /// The synthesized torque vector was not finite.
    NonFiniteTorque,
}

impl std::fmt::Display for DegeneracyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NonFiniteJacobian => "non-finite Jacobian",
            Self::SvdNotConverged => "SVD did not converge",
            Self::NonFinitePseudoInverse => "non-finite pseudo-inverse",
            Self::NonFiniteMeasurement => "non-finite measurement",
            Self::NonFiniteTorque => "non-finite torque",
        };
        f.write_str(s)
    }
}

/// Errors raised by the controller and its update surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    /// Gain payload has the wrong number of values.
    #[error("number of PID gains must be 2 x {joints} = {expected}, got {got}")]
    Configuration {
        /// Joint count N.
        joints: usize,
        /// Required payload length (2N).
        expected: usize,
        /// Received payload length.
        got: usize,
    },

    /// Gain payload contains a NaN or infinite value.
    #[error("gain value at index {index} is not finite")]
    NonFiniteGain {
        /// Position of the offending value in the payload.
        index: usize,
    },

    /// Desired position contains a NaN or infinite component.
    #[error("desired position is not finite")]
    NonFiniteSetpoint,

    /// Jacobian or pseudo-inverse is unusable this cycle.
    #[error("numerical degeneracy: {0}")]
    NumericalDegeneracy(DegeneracyKind),

    /// Controller could not be set up (fatal).
    #[error("setup failure: {0}")]
    Setup(String),

    /// `update()` called before `start()`.
    #[error("controller not started")]
    NotStarted,

    /// Cycle period is not a positive finite number.
    #[error("invalid cycle period: {0} s")]
    InvalidPeriod(f64),
}
