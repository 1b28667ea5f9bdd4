//! Cycle-level properties: stability at zero error, Euler law, orientation
//! invariance and gain update semantics.
use nalgebra::{UnitQuaternion, Vector3};
use taskik_common::error::ControlError;
use taskik_common::types::CartesianPose;
use taskik_control_unit::config::ControllerConfig;
use taskik_control_unit::controller::{CycleOutcome, TaskController};

use super::common::{FrozenJoints, Translational};

const DT: f64 = 0.001;
const N: usize = 7;

fn started(tip: CartesianPose, q: &[f64]) -> (TaskController<Translational>, FrozenJoints) {
    let mut model = Translational::new(N);
    model.tip = tip;
    let mut ctrl = TaskController::new(model, &ControllerConfig::default()).unwrap();
    let mut hw = FrozenJoints::new(N);
    hw.q.copy_from_slice(q);
    ctrl.start(&hw).unwrap();
    (ctrl, hw)
}

fn run(ctrl: &mut TaskController<Translational>, hw: &mut FrozenJoints, cycles: usize) -> Vec<Vec<f64>> {
    (0..cycles)
        .map(|_| {
            assert_eq!(ctrl.update(DT, hw), Ok(CycleOutcome::Applied));
            hw.tau.clone()
        })
        .collect()
}

#[test]
fn zero_error_keeps_reference_and_torque_at_rest() {
    let q = [0.1, -0.2, 0.3, -0.4, 0.5, -0.6, 0.7];
    let (mut ctrl, mut hw) = started(CartesianPose::from_position(0.3, -0.1, 0.2), &q);

    for tau in run(&mut ctrl, &mut hw, 500) {
        assert!(tau.iter().all(|&t| t == 0.0));
    }
    assert_eq!(ctrl.joint_reference().as_slice(), &q);
    assert!(ctrl.joint_velocity_reference().iter().all(|&v| v == 0.0));
}

#[test]
fn reference_advances_by_k_dt_qdot_regardless_of_measurement() {
    let (mut ctrl, mut hw) = started(CartesianPose::default(), &[0.0; N]);
    ctrl.handle().set_desired_pose(0.2, -0.4, 0.6).unwrap();

    ctrl.update(DT, &mut hw).unwrap();
    let q_ref0 = ctrl.joint_reference().clone();
    let qdot = ctrl.joint_velocity_reference().clone();

    // Measured joints wander; the reference must not care.
    let k = 50;
    for step in 0..k {
        for (i, q) in hw.q.iter_mut().enumerate() {
            *q = 0.01 * (step as f64) * (i as f64 - 3.0);
        }
        ctrl.update(DT, &mut hw).unwrap();
    }

    let advanced = ctrl.joint_reference() - &q_ref0;
    for i in 0..N {
        assert!((advanced[i] - k as f64 * DT * qdot[i]).abs() < 1e-12);
    }
    assert!((qdot[0] - 0.2).abs() < 1e-9);
    assert!((qdot[1] + 0.4).abs() < 1e-9);
    assert!((qdot[2] - 0.6).abs() < 1e-9);
}

#[test]
fn angular_error_is_always_zero() {
    let tip = CartesianPose {
        position: Vector3::new(0.0, 0.0, 0.0),
        orientation: UnitQuaternion::from_euler_angles(0.9, -0.4, 2.1),
    };
    let (mut ctrl, mut hw) = started(tip, &[0.0; N]);
    ctrl.handle().set_desired_pose(0.5, 0.5, 0.5).unwrap();

    for _ in 0..20 {
        ctrl.update(DT, &mut hw).unwrap();
        let e = ctrl.task_error();
        assert_eq!([e[3], e[4], e[5]], [0.0; 3]);
    }
}

#[test]
fn repeated_identical_gain_update_is_idempotent() {
    let gains: Vec<f64> = (0..2 * N).map(|i| 10.0 + i as f64).collect();

    let (mut once, mut hw_once) = started(CartesianPose::default(), &[0.0; N]);
    let (mut twice, mut hw_twice) = started(CartesianPose::default(), &[0.0; N]);
    for c in [&once, &twice] {
        c.handle().set_desired_pose(0.3, 0.2, 0.1).unwrap();
    }

    once.handle().set_gains(&gains).unwrap();
    twice.handle().set_gains(&gains).unwrap();
    twice.handle().set_gains(&gains).unwrap();

    assert_eq!(run(&mut once, &mut hw_once, 30), run(&mut twice, &mut hw_twice, 30));
}

#[test]
fn rejected_gain_update_leaves_behavior_unchanged() {
    let (mut plain, mut hw_plain) = started(CartesianPose::default(), &[0.0; N]);
    let (mut poked, mut hw_poked) = started(CartesianPose::default(), &[0.0; N]);
    for c in [&plain, &poked] {
        c.handle().set_desired_pose(-0.2, 0.1, 0.4).unwrap();
    }

    let err = poked.handle().set_gains(&[1.0; 2 * N - 1]).unwrap_err();
    assert_eq!(
        err,
        ControlError::Configuration {
            joints: N,
            expected: 2 * N,
            got: 2 * N - 1
        }
    );
    assert!(err.to_string().contains("2 x 7 = 14"));

    let mut bad = vec![5.0; 2 * N];
    bad[9] = f64::NAN;
    assert_eq!(
        poked.handle().set_gains(&bad).unwrap_err(),
        ControlError::NonFiniteGain { index: 9 }
    );

    assert_eq!(run(&mut plain, &mut hw_plain, 30), run(&mut poked, &mut hw_poked, 30));
    assert_eq!(poked.handle().rejected_updates(), 2);
}

#[test]
fn gain_update_keeps_integral_and_applies_next_cycle() {
    let (mut ctrl, mut hw) = started(CartesianPose::default(), &[0.0; N]);
    ctrl.handle().set_desired_pose(1.0, 0.0, 0.0).unwrap();
    run(&mut ctrl, &mut hw, 10);

    let integral = ctrl.pid_state(0).integral();
    let mut gains = vec![0.0; 2 * N];
    gains[0] = 50.0;
    ctrl.handle().set_gains(&gains).unwrap();
    assert_eq!(ctrl.pid_state(0).integral(), integral);
    assert_eq!(ctrl.active_gains().get(0).kp, 100.0);

    ctrl.update(DT, &mut hw).unwrap();
    assert_eq!(ctrl.active_gains().get(0).kp, 50.0);
    assert_eq!(ctrl.active_gains().get(0).ki, 0.0);
    // Ki = 0: integral frozen, not reset.
    assert_eq!(ctrl.pid_state(0).integral(), integral);
    let q_ref0 = ctrl.joint_reference()[0];
    assert!((hw.tau[0] - (50.0 * q_ref0 + integral)).abs() < 1e-12);
}

#[test]
fn pose_update_is_seen_by_the_next_cycle_without_ramping() {
    let (mut ctrl, mut hw) = started(CartesianPose::default(), &[0.0; N]);
    run(&mut ctrl, &mut hw, 5);

    ctrl.handle().set_desired_pose(0.0, 2.0, 0.0).unwrap();
    ctrl.update(DT, &mut hw).unwrap();
    assert_eq!(ctrl.active_desired_pose().position, Vector3::new(0.0, 2.0, 0.0));
    assert_eq!(ctrl.task_error()[1], 2.0);
}
