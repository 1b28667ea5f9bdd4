//! Asynchronous desired-pose / gain update surface.
//!
//! A [`ControllerHandle`] is a cheap, cloneable, `Send + Sync` handle that
//! any thread (transport listener, RPC handler, CLI) uses to change the
//! controller's setpoint or gain block while the control cycle runs.
//!
//! - `set_desired_pose` replaces the position part of the desired pose. No
//!   interpolation or rate limiting: the very next cycle sees the jump.
//! - `set_gains` validates the flat `[Kp.., Ki..]` payload and publishes a
//!   complete new [`GainSet`], or rejects it and leaves the old one in place.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::Vector3;
use taskik_common::error::ControlError;
use taskik_common::types::CartesianPose;
use tracing::{debug, warn};

use super::snapshot::SharedSnapshot;
use crate::control::pid::GainSet;

/// State shared between the control cycle and the update surface.
#[derive(Debug)]
pub(crate) struct SharedCommands {
    pub(crate) desired: SharedSnapshot<CartesianPose>,
    pub(crate) gains: SharedSnapshot<GainSet>,
    joints: usize,
    rejected: AtomicU64,
}

impl SharedCommands {
    pub(crate) fn new(joints: usize, gains: GainSet) -> Self {
        Self {
            desired: SharedSnapshot::new(CartesianPose::default()),
            gains: SharedSnapshot::new(gains),
            joints,
            rejected: AtomicU64::new(0),
        }
    }

    fn reject(&self, err: ControlError) -> ControlError {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        warn!("update rejected, previous value kept: {err}");
        err
    }
}

/// Cloneable handle for asynchronous setpoint and gain updates.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    inner: Arc<SharedCommands>,
}

impl ControllerHandle {
    pub(crate) fn new(inner: Arc<SharedCommands>) -> Self {
        Self { inner }
    }

    /// Number of joints N the gain payload must cover.
    #[inline]
    pub fn joint_count(&self) -> usize {
        self.inner.joints
    }

    /// Set the desired tip position; orientation is left untouched.
    ///
    /// # Errors
    /// `ControlError::NonFiniteSetpoint` if any coordinate is NaN or infinite.
    pub fn set_desired_pose(&self, x: f64, y: f64, z: f64) -> Result<(), ControlError> {
        let position = Vector3::new(x, y, z);
        if !position.iter().all(|v| v.is_finite()) {
            return Err(self.inner.reject(ControlError::NonFiniteSetpoint));
        }
        self.inner.desired.modify(|pose| pose.position = position);
        debug!("desired position set to ({x:.4}, {y:.4}, {z:.4})");
        Ok(())
    }

    /// Replace all gains from a `2N` payload: `N` Kp values then `N` Ki values.
    ///
    /// Kd is always 0. Integral and derivative history are not reset.
    ///
    /// # Errors
    /// - `ControlError::Configuration` if `values.len() != 2N`.
    /// - `ControlError::NonFiniteGain` if any value is NaN or infinite.
    pub fn set_gains(&self, values: &[f64]) -> Result<(), ControlError> {
        let set = GainSet::from_payload(self.inner.joints, values)
            .map_err(|e| self.inner.reject(e))?;
        self.inner.gains.publish(set);
        debug!("gain block replaced for {} joints", self.inner.joints);
        Ok(())
    }

    /// Current desired pose.
    pub fn desired_pose(&self) -> CartesianPose {
        self.inner.desired.load()
    }

    /// Current gain block.
    pub fn gains(&self) -> GainSet {
        self.inner.gains.load()
    }

    /// Count of rejected updates since creation.
    pub fn rejected_updates(&self) -> u64 {
        self.inner.rejected.load(Ordering::Relaxed)
    }
}
