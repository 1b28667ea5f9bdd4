//! Velocity-to-position reference integrator.
//!
//! Maps the task error through `J⁺` to a joint-velocity reference and
//! integrates it with explicit Euler into the joint-position reference:
//!
//! ```text
//! qdot_ref = J⁺ · error
//! q_ref   += qdot_ref · dt
//! ```
//!
//! The reference is open-loop with respect to the measured joint position;
//! only the PID stage closes the loop.

use nalgebra::DVector;
use taskik_common::consts::TASK_DIM;
use taskik_common::types::{PseudoInverse, TaskVector};

/// Joint-position and joint-velocity reference for N joints.
#[derive(Debug, Clone, PartialEq)]
pub struct JointReference {
    q_ref: DVector<f64>,
    qdot_ref: DVector<f64>,
}

impl JointReference {
    /// Zero reference for `n` joints.
    pub fn zeros(n: usize) -> Self {
        Self {
            q_ref: DVector::zeros(n),
            qdot_ref: DVector::zeros(n),
        }
    }

    /// Re-anchor the position reference at `q` and clear the velocity reference.
    pub fn reset(&mut self, q: &DVector<f64>) {
        self.q_ref.copy_from(q);
        self.qdot_ref.fill(0.0);
    }

    /// `qdot_ref = J⁺ · error`.
    #[inline]
    pub fn map_velocity(&mut self, pinv: &PseudoInverse, error: &TaskVector) {
        for i in 0..self.qdot_ref.len() {
            let mut acc = 0.0;
            for k in 0..TASK_DIM {
                acc += pinv[(i, k)] * error[k];
            }
            self.qdot_ref[i] = acc;
        }
    }

    /// `q_ref += qdot_ref · dt`.
    #[inline]
    pub fn integrate(&mut self, dt: f64) {
        self.q_ref.axpy(dt, &self.qdot_ref, 1.0);
    }

    #[inline]
    pub fn position(&self) -> &DVector<f64> {
        &self.q_ref
    }

    #[inline]
    pub fn velocity(&self) -> &DVector<f64> {
        &self.qdot_ref
    }
}
