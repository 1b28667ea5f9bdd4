//! Task-space IK torque controller.
//!
//! ## Lifecycle
//!
//! 1. [`TaskController::new`] binds a [`KinematicModel`] and validated config
//!    (setup failures surface here).
//! 2. [`TaskController::start`] anchors the joint reference and the desired
//!    pose at the measured configuration and loads the default gains.
//! 3. [`TaskController::update`] runs one cycle per call.
//!
//! ## Cycle Body
//!
//! ```text
//! read q, qdot → J(q) → J⁺ → FK(q) → e = [p_des − p ; 0]
//!   → qdot_ref = J⁺·e → q_ref += qdot_ref·dt → τ_i = PID_i(q_ref_i − q_i)
//! ```
//!
//! When the Jacobian, its pseudo-inverse, the measurement or the resulting
//! torque is not usable, the previous torque command is re-emitted and the
//! joint reference and PID history are left as they were.
//!
//! All per-cycle buffers are allocated in `new()` and the cycle itself never
//! allocates; the desired pose and gains are read once per cycle from their
//! shared snapshots.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use taskik_common::actuator::ActuatorInterface;
use taskik_common::consts::{MAX_JOINTS, TASK_DIM};
use taskik_common::error::{ControlError, DegeneracyKind};
use taskik_common::kinematics::KinematicModel;
use taskik_common::types::{
    CartesianPose, Jacobian, JointState, PseudoInverse, TaskVector, TorqueCommand,
};
use tracing::{debug, info, warn};

use crate::command::snapshot::SnapshotReader;
use crate::command::surface::{ControllerHandle, SharedCommands};
use crate::config::ControllerConfig;
use crate::control::integrator::JointReference;
use crate::control::pid::{GainSet, PidBank, PidGains, PidState};
use crate::control::pinv::PseudoInverseSolver;
use crate::control::task_error::task_error;
use crate::state::machine::{ControllerEvent, ControllerState, ControllerStateMachine};

/// Outcome of one `update()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// New torque computed and written.
    Applied,
    /// Previous torque re-emitted.
    Held(DegeneracyKind),
}

/// Differential-IK controller for one kinematic chain.
pub struct TaskController<K: KinematicModel> {
    model: K,
    joints: usize,
    solver: PseudoInverseSolver,
    default_gains: PidGains,
    degeneracy_log_interval: u64,
    lifecycle: ControllerStateMachine,

    // ── Shared with the update surface ──
    shared: Arc<SharedCommands>,
    desired: SnapshotReader<CartesianPose>,
    gains: SnapshotReader<GainSet>,

    // ── Cycle-owned state ──
    measured: JointState,
    measured_pose: CartesianPose,
    jacobian: Jacobian,
    pinv: PseudoInverse,
    error: TaskVector,
    reference: JointReference,
    pids: PidBank,
    torque: TorqueCommand,
    candidate: TorqueCommand,

    cycles: u64,
    degenerate_cycles: u64,
}

impl<K: KinematicModel> TaskController<K> {
    /// Bind the controller to `model`.
    ///
    /// # Errors
    /// `ControlError::Setup` if the joint count is 0 or above [`MAX_JOINTS`],
    /// or if `config` fails validation.
    pub fn new(model: K, config: &ControllerConfig) -> Result<Self, ControlError> {
        config
            .validate()
            .map_err(|e| ControlError::Setup(e.to_string()))?;

        let joints = model.joint_count();
        if joints == 0 || joints > MAX_JOINTS {
            return Err(ControlError::Setup(format!(
                "kinematic model has {joints} joints, supported range is [1, {MAX_JOINTS}]"
            )));
        }

        let default_gains = config.default_gains.gains();
        let shared = Arc::new(SharedCommands::new(
            joints,
            GainSet::uniform(joints, default_gains),
        ));
        let desired = SnapshotReader::new(&shared.desired);
        let gains = SnapshotReader::new(&shared.gains);

        info!(
            "TaskController created: {} joints, pinv={:?}",
            joints,
            config.pinv.policy()
        );

        Ok(Self {
            model,
            joints,
            solver: PseudoInverseSolver::new(config.pinv.policy(), config.pinv.svd_max_iterations),
            default_gains,
            degeneracy_log_interval: config.degeneracy_log_interval,
            lifecycle: ControllerStateMachine::new(),
            shared,
            desired,
            gains,
            measured: JointState::zeros(joints),
            measured_pose: CartesianPose::default(),
            jacobian: DMatrix::zeros(TASK_DIM, joints),
            pinv: DMatrix::zeros(joints, TASK_DIM),
            error: TaskVector::zeros(),
            reference: JointReference::zeros(joints),
            pids: PidBank::new(joints)?,
            torque: TorqueCommand::zeros(joints),
            candidate: TorqueCommand::zeros(joints),
            cycles: 0,
            degenerate_cycles: 0,
        })
    }

    /// Handle for asynchronous setpoint / gain updates.
    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle::new(Arc::clone(&self.shared))
    }

    /// Initialize the cycle from the current measured configuration.
    ///
    /// Sets `q_ref := q`, clears PID history, loads the default gains and
    /// sets the desired pose to the measured tip pose so activation causes
    /// no jump. May be called again to re-initialize.
    ///
    /// # Errors
    /// - `ControlError::Setup` if `actuators` exposes a different joint count.
    /// - `ControlError::NumericalDegeneracy` if a measured joint position or
    ///   the measured pose is not finite; the controller state is left
    ///   unchanged. Velocities are not checked.
    pub fn start<A: ActuatorInterface>(&mut self, actuators: &A) -> Result<(), ControlError> {
        if actuators.joint_count() != self.joints {
            return Err(ControlError::Setup(format!(
                "actuator interface has {} joints, kinematic model has {}",
                actuators.joint_count(),
                self.joints
            )));
        }

        self.read_joint_state(actuators);
        if !self.measured.positions_finite() {
            return Err(ControlError::NumericalDegeneracy(
                DegeneracyKind::NonFiniteMeasurement,
            ));
        }
        let pose = self.model.forward_kinematics(&self.measured.q);
        if !pose.is_finite() {
            return Err(ControlError::NumericalDegeneracy(
                DegeneracyKind::NonFiniteMeasurement,
            ));
        }

        self.reference.reset(&self.measured.q);
        self.pids.reset();
        self.shared
            .gains
            .publish(GainSet::uniform(self.joints, self.default_gains));
        self.shared.desired.publish(pose);
        self.desired.refresh(&self.shared.desired);
        self.gains.refresh(&self.shared.gains);

        self.measured_pose = pose;
        self.error = TaskVector::zeros();
        self.torque = TorqueCommand::zeros(self.joints);
        self.cycles = 0;
        self.degenerate_cycles = 0;
        self.lifecycle.handle_event(ControllerEvent::Start);

        info!(
            "TaskController started at tip position ({:.4}, {:.4}, {:.4})",
            pose.position.x, pose.position.y, pose.position.z
        );
        debug!("initial joint positions: {:?}", self.measured.q.as_slice());
        Ok(())
    }

    /// Execute one control cycle with period `dt` [s].
    ///
    /// # Errors
    /// - `ControlError::NotStarted` before `start()`; nothing is written.
    /// - `ControlError::Setup` if `actuators` exposes a different joint
    ///   count than the model; nothing is read or written.
    /// - `ControlError::InvalidPeriod` if `dt` is not a positive finite
    ///   number; the previous torque is re-emitted.
    pub fn update<A: ActuatorInterface>(
        &mut self,
        dt: f64,
        actuators: &mut A,
    ) -> Result<CycleOutcome, ControlError> {
        if !self.lifecycle.is_started() {
            return Err(ControlError::NotStarted);
        }
        if actuators.joint_count() != self.joints {
            return Err(ControlError::Setup(format!(
                "actuator interface has {} joints, kinematic model has {}",
                actuators.joint_count(),
                self.joints
            )));
        }

        self.read_joint_state(actuators);

        if !(dt.is_finite() && dt > 0.0) {
            self.emit(actuators);
            return Err(ControlError::InvalidPeriod(dt));
        }

        self.desired.refresh(&self.shared.desired);
        self.gains.refresh(&self.shared.gains);
        self.lifecycle.handle_event(ControllerEvent::Cycle);
        self.cycles += 1;

        let outcome = match self.compute(dt) {
            Ok(()) => {
                self.torque.copy_from(&self.candidate);
                CycleOutcome::Applied
            }
            Err(kind) => {
                self.degenerate_cycles += 1;
                if self.degenerate_cycles == 1
                    || self.degenerate_cycles % self.degeneracy_log_interval == 0
                {
                    warn!(
                        "cycle {}: {kind}, holding previous torque ({} degenerate cycles so far)",
                        self.cycles, self.degenerate_cycles
                    );
                }
                CycleOutcome::Held(kind)
            }
        };

        self.emit(actuators);
        Ok(outcome)
    }

    /// Numeric body of the cycle. Commits reference and PID history only
    /// when every step produced finite values.
    fn compute(&mut self, dt: f64) -> Result<(), DegeneracyKind> {
        if !self.measured.positions_finite() {
            return Err(DegeneracyKind::NonFiniteMeasurement);
        }

        self.model.jacobian(&self.measured.q, &mut self.jacobian);
        self.solver.solve(&self.jacobian, &mut self.pinv)?;

        let pose = self.model.forward_kinematics(&self.measured.q);
        if !pose.is_finite() {
            return Err(DegeneracyKind::NonFiniteMeasurement);
        }
        self.measured_pose = pose;
        self.error = task_error(self.desired.get(), &pose);

        self.reference.map_velocity(&self.pinv, &self.error);
        if !self.reference.velocity().iter().all(|v| v.is_finite()) {
            return Err(DegeneracyKind::NonFinitePseudoInverse);
        }
        self.reference.integrate(dt);

        let gains = self.gains.get();
        let mut pids = self.pids.clone();
        for i in 0..self.joints {
            let e = self.reference.position()[i] - self.measured.q[i];
            self.candidate.set(i, pids.compute(i, gains, e, dt));
        }
        if !self.candidate.is_finite() {
            return Err(DegeneracyKind::NonFiniteTorque);
        }
        self.pids = pids;
        Ok(())
    }

    fn read_joint_state<A: ActuatorInterface>(&mut self, actuators: &A) {
        for i in 0..self.joints {
            self.measured.q[i] = actuators.position(i);
            self.measured.qdot[i] = actuators.velocity(i);
        }
    }

    fn emit<A: ActuatorInterface>(&self, actuators: &mut A) {
        for i in 0..self.joints {
            actuators.set_command(i, self.torque.get(i));
        }
    }

    // ─── Accessors ──────────────────────────────────────────────

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joints
    }

    #[inline]
    pub fn state(&self) -> ControllerState {
        self.lifecycle.state()
    }

    #[inline]
    pub fn model(&self) -> &K {
        &self.model
    }

    /// Last torque command written.
    #[inline]
    pub fn torque(&self) -> &TorqueCommand {
        &self.torque
    }

    /// Joint-position reference `q_ref`.
    #[inline]
    pub fn joint_reference(&self) -> &DVector<f64> {
        self.reference.position()
    }

    /// Joint-velocity reference `qdot_ref` from the last computed cycle.
    #[inline]
    pub fn joint_velocity_reference(&self) -> &DVector<f64> {
        self.reference.velocity()
    }

    /// Task error from the last computed cycle.
    #[inline]
    pub fn task_error(&self) -> &TaskVector {
        &self.error
    }

    /// Joint state read at the start of the last cycle.
    #[inline]
    pub fn measured_joints(&self) -> &JointState {
        &self.measured
    }

    /// Tip pose from the last computed cycle.
    #[inline]
    pub fn measured_pose(&self) -> &CartesianPose {
        &self.measured_pose
    }

    /// Desired pose as seen by the last cycle.
    #[inline]
    pub fn active_desired_pose(&self) -> &CartesianPose {
        self.desired.get()
    }

    /// Gain block as seen by the last cycle.
    #[inline]
    pub fn active_gains(&self) -> &GainSet {
        self.gains.get()
    }

    #[inline]
    pub fn pid_state(&self, i: usize) -> &PidState {
        self.pids.state(i)
    }

    /// Cycles executed since the last `start()`.
    #[inline]
    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }

    /// Cycles that held the previous torque since the last `start()`.
    #[inline]
    pub fn degenerate_cycles(&self) -> u64 {
        self.degenerate_cycles
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
