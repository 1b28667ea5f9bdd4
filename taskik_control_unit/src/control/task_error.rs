//! Cartesian task-space error.
//!
//! `error = [desired.p − measured.p ; 0, 0, 0]`
//!
//! Orientation error is not computed: the angular half is always zero and
//! orientation values on either pose never influence the result.

use taskik_common::types::{CartesianPose, TaskVector};

/// Task error between the desired and measured tip pose.
#[inline]
pub fn task_error(desired: &CartesianPose, measured: &CartesianPose) -> TaskVector {
    let dp = desired.position - measured.position;
    TaskVector::new(dp.x, dp.y, dp.z, 0.0, 0.0, 0.0)
}
