//! One full cycle on a 7-joint chain with a pure translational Jacobian.
use taskik_control_unit::config::ControllerConfig;
use taskik_control_unit::controller::{CycleOutcome, TaskController};

use super::common::{FrozenJoints, Translational};

const DT: f64 = 0.001;

#[test]
fn single_cycle_matches_hand_computation() {
    let mut ctrl = TaskController::new(Translational::new(7), &ControllerConfig::default()).unwrap();
    let mut hw = FrozenJoints::new(7);
    ctrl.start(&hw).unwrap();
    ctrl.handle().set_desired_pose(1.0, 0.0, 0.0).unwrap();

    assert_eq!(ctrl.update(DT, &mut hw), Ok(CycleOutcome::Applied));

    // Task error (1, 0, 0, 0, 0, 0).
    let e = ctrl.task_error();
    assert_eq!(e[0], 1.0);
    assert!(e.iter().skip(1).all(|&v| v == 0.0));

    // J⁺ = Jᵀ for this Jacobian: only joint 0 moves.
    let qdot = ctrl.joint_velocity_reference();
    assert!((qdot[0] - 1.0).abs() < 1e-9);
    assert!(qdot.iter().skip(1).all(|v| v.abs() < 1e-9));

    let q_ref = ctrl.joint_reference();
    assert!((q_ref[0] - DT * qdot[0]).abs() < 1e-15);

    // τ0 = Kp·q_ref0 + Ki·q_ref0·dt with zero measured displacement.
    let expected = 100.0 * q_ref[0] + 1.0 * q_ref[0] * DT;
    assert!((hw.tau[0] - expected).abs() < 1e-12);
    assert!((hw.tau[0] - 0.100001).abs() < 1e-9);
    assert!(hw.tau.iter().skip(1).all(|v| v.abs() < 1e-9));
}

#[test]
fn torque_tracks_growing_reference() {
    let mut ctrl = TaskController::new(Translational::new(7), &ControllerConfig::default()).unwrap();
    let mut hw = FrozenJoints::new(7);
    ctrl.start(&hw).unwrap();
    ctrl.handle().set_desired_pose(1.0, 0.0, 0.0).unwrap();

    let mut integral = 0.0;
    for k in 1..=10 {
        ctrl.update(DT, &mut hw).unwrap();
        let q_ref0 = k as f64 * DT;
        integral += 1.0 * q_ref0 * DT;
        assert!((ctrl.joint_reference()[0] - q_ref0).abs() < 1e-12);
        assert!((hw.tau[0] - (100.0 * q_ref0 + integral)).abs() < 1e-12);
    }
    assert!((ctrl.pid_state(0).integral() - integral).abs() < 1e-14);
}
