//! Core data types shared between the controller and its collaborators.
//!
//! All vectors are sized once at controller initialization to the chain's
//! joint count N and never resized afterwards.

use nalgebra::{DMatrix, DVector, UnitQuaternion, Vector3, Vector6};

/// 6×N task Jacobian (rows: vx, vy, vz, wx, wy, wz).
pub type Jacobian = DMatrix<f64>;

/// N×6 generalized inverse of a [`Jacobian`].
pub type PseudoInverse = DMatrix<f64>;

/// 6-vector in task space: 3 linear components followed by 3 angular.
pub type TaskVector = Vector6<f64>;

// ─── Cartesian Pose ─────────────────────────────────────────────────

/// Position and orientation of the chain tip in the chain root frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianPose {
    /// Tip position [m].
    pub position: Vector3<f64>,
    /// Tip orientation. Carried through, never used for error computation.
    pub orientation: UnitQuaternion<f64>,
}

impl CartesianPose {
    /// Pose at `position` with identity orientation.
    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Same orientation, new position.
    #[inline]
    pub fn with_position(mut self, position: Vector3<f64>) -> Self {
        self.position = position;
        self
    }

    /// True when every position and orientation component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.orientation.coords.iter().all(|v| v.is_finite())
    }
}

impl Default for CartesianPose {
    fn default() -> Self {
        Self::from_position(0.0, 0.0, 0.0)
    }
}

// ─── Joint State ────────────────────────────────────────────────────

/// Measured (or reference) joint positions and velocities.
#[derive(Debug, Clone, PartialEq)]
pub struct JointState {
    /// Joint positions [rad or m].
    pub q: DVector<f64>,
    /// Joint velocities [rad/s or m/s].
    pub qdot: DVector<f64>,
}

impl JointState {
    /// Zeroed state for `n` joints.
    pub fn zeros(n: usize) -> Self {
        Self {
            q: DVector::zeros(n),
            qdot: DVector::zeros(n),
        }
    }

    /// Number of joints.
    #[inline]
    pub fn len(&self) -> usize {
        self.q.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// True when every joint position is finite.
    ///
    /// Velocities are carried for diagnostics only and are not checked.
    pub fn positions_finite(&self) -> bool {
        self.q.iter().all(|v| v.is_finite())
    }
}

// ─── Torque Command ─────────────────────────────────────────────────

/// Per-joint torque command, the controller's only output artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct TorqueCommand {
    values: DVector<f64>,
}

impl TorqueCommand {
    /// Zero torque for `n` joints.
    pub fn zeros(n: usize) -> Self {
        Self {
            values: DVector::zeros(n),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Torque for joint `i` [Nm].
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.values[i]
    }

    #[inline]
    pub fn set(&mut self, i: usize, torque: f64) {
        self.values[i] = torque;
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice()
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Copy all values from `other` (lengths must match).
    #[inline]
    pub fn copy_from(&mut self, other: &TorqueCommand) {
        self.values.copy_from(&other.values);
    }
}
