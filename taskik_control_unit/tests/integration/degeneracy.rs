//! Non-finite Jacobians never reach the actuators.

use std::sync::atomic::Ordering;

use taskik_common::error::DegeneracyKind;
use taskik_control_unit::config::ControllerConfig;
use taskik_control_unit::controller::{CycleOutcome, TaskController};

use super::common::{FrozenJoints, JACOBIAN_INF, JACOBIAN_NAN, JACOBIAN_OK, Translational};

const DT: f64 = 0.001;

#[test]
fn non_finite_jacobian_re_emits_previous_torque() {
    let model = Translational::new(7);
    let fault = model.fault.clone();
    let mut ctrl = TaskController::new(model, &ControllerConfig::default()).unwrap();
    let mut hw = FrozenJoints::new(7);
    ctrl.start(&hw).unwrap();
    ctrl.handle().set_desired_pose(0.4, -0.3, 0.2).unwrap();

    for _ in 0..5 {
        ctrl.update(DT, &mut hw).unwrap();
    }
    let held = hw.tau.clone();
    let q_ref = ctrl.joint_reference().clone();
    let integral = ctrl.pid_state(0).integral();
    assert!(held[0] != 0.0);

    for kind in [JACOBIAN_NAN, JACOBIAN_INF] {
        fault.store(kind, Ordering::Relaxed);
        for _ in 0..3 {
            hw.tau.fill(f64::NAN);
            assert_eq!(
                ctrl.update(DT, &mut hw),
                Ok(CycleOutcome::Held(DegeneracyKind::NonFiniteJacobian))
            );
            assert!(hw.tau.iter().all(|t| t.is_finite()));
            assert_eq!(hw.tau, held);
        }
    }

    // Nothing advanced while degenerate.
    assert_eq!(ctrl.joint_reference(), &q_ref);
    assert_eq!(ctrl.pid_state(0).integral(), integral);
    assert_eq!(ctrl.degenerate_cycles(), 6);
    assert_eq!(ctrl.cycle_count(), 11);

    fault.store(JACOBIAN_OK, Ordering::Relaxed);
    assert_eq!(ctrl.update(DT, &mut hw), Ok(CycleOutcome::Applied));
    assert!(ctrl.joint_reference()[0] > q_ref[0]);
    assert!(hw.tau[0] > held[0]);
}

#[test]
fn degenerate_first_cycle_emits_zero_torque() {
    let model = Translational::new(3);
    model.fault.store(JACOBIAN_NAN, Ordering::Relaxed);
    let mut ctrl = TaskController::new(model, &ControllerConfig::default()).unwrap();
    let mut hw = FrozenJoints::new(3);
    hw.tau.fill(7.0);
    ctrl.start(&hw).unwrap();

    assert!(matches!(ctrl.update(DT, &mut hw), Ok(CycleOutcome::Held(_))));
    assert_eq!(hw.tau, vec![0.0; 3]);
}

#[test]
fn damped_policy_stays_finite_on_rank_deficient_jacobian() {
    let mut config = ControllerConfig::default();
    config.pinv.policy = taskik_control_unit::config::PinvPolicyKind::Damped;
    config.pinv.damping = 0.1;

    // Only three of six task directions are reachable: rank 3.
    let mut ctrl = TaskController::new(Translational::new(7), &config).unwrap();
    let mut hw = FrozenJoints::new(7);
    ctrl.start(&hw).unwrap();
    ctrl.handle().set_desired_pose(1.0, 1.0, 1.0).unwrap();

    for _ in 0..100 {
        assert_eq!(ctrl.update(DT, &mut hw), Ok(CycleOutcome::Applied));
        assert!(hw.tau.iter().all(|t| t.is_finite()));
    }
    // σ = 1, λ = 0.1: qdot = 1 / 1.01 per axis.
    assert!((ctrl.joint_velocity_reference()[0] - 1.0 / 1.01).abs() < 1e-9);
}
