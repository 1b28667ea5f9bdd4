//! Shared mocks for the integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use nalgebra::DVector;
use taskik_common::actuator::ActuatorInterface;
use taskik_common::kinematics::KinematicModel;
use taskik_common::types::{CartesianPose, Jacobian};

pub const JACOBIAN_OK: u8 = 0;
pub const JACOBIAN_NAN: u8 = 1;
pub const JACOBIAN_INF: u8 = 2;

/// Pure translational mapping: the first three rows of J are the first three
/// rows of the identity, the rest is zero. The tip pose is a fixed value
/// independent of `q`.
pub struct Translational {
    pub joints: usize,
    pub tip: CartesianPose,
    pub fault: Arc<AtomicU8>,
}

impl Translational {
    pub fn new(joints: usize) -> Self {
        Self {
            joints,
            tip: CartesianPose::default(),
            fault: Arc::new(AtomicU8::new(JACOBIAN_OK)),
        }
    }
}

impl KinematicModel for Translational {
    fn joint_count(&self) -> usize {
        self.joints
    }

    fn jacobian(&self, _q: &DVector<f64>, jacobian: &mut Jacobian) {
        jacobian.fill(0.0);
        for i in 0..3.min(self.joints) {
            jacobian[(i, i)] = 1.0;
        }
        match self.fault.load(Ordering::Relaxed) {
            JACOBIAN_NAN => jacobian[(0, 0)] = f64::NAN,
            JACOBIAN_INF => jacobian[(2, 1)] = f64::INFINITY,
            _ => {}
        }
    }

    fn forward_kinematics(&self, _q: &DVector<f64>) -> CartesianPose {
        self.tip
    }
}

/// Joints that never move; records the last command per joint.
pub struct FrozenJoints {
    pub q: Vec<f64>,
    pub tau: Vec<f64>,
    pub writes: usize,
}

impl FrozenJoints {
    pub fn new(joints: usize) -> Self {
        Self {
            q: vec![0.0; joints],
            tau: vec![0.0; joints],
            writes: 0,
        }
    }
}

impl ActuatorInterface for FrozenJoints {
    fn joint_count(&self) -> usize {
        self.q.len()
    }

    fn position(&self, i: usize) -> f64 {
        self.q[i]
    }

    fn velocity(&self, _i: usize) -> f64 {
        0.0
    }

    fn set_command(&mut self, i: usize, torque: f64) {
        self.tau[i] = torque;
        self.writes += 1;
    }
}
