//! Closed loop against the simulated DH chain from `taskik_hal`.

use taskik_common::config::ConfigLoader;
use taskik_common::kinematics::KinematicModel;
use taskik_control_unit::config::ControllerConfig;
use taskik_control_unit::controller::{CycleOutcome, TaskController};
use taskik_hal::{ChainConfig, SerialChain, SimulatedJoints};

const PLANAR_ARM: &str = r#"
root_name = "base"
tip_name = "link3"

[[segments]]
name = "link1"
a = 0.4

[[segments]]
name = "link2"
a = 0.3

[[segments]]
name = "link3"
a = 0.2

[simulation]
inertia = [1.0, 1.0, 1.0]
damping = [20.0, 20.0, 20.0]
initial_positions = [0.3, 0.6, 0.4]
"#;

const DT: f64 = 0.001;

fn setup() -> (TaskController<SerialChain>, SimulatedJoints) {
    let cfg = ChainConfig::load_str(PLANAR_ARM).unwrap();
    let chain = SerialChain::from_config(&cfg).unwrap();
    let sim = SimulatedJoints::from_config(chain.joint_count(), &cfg.simulation).unwrap();
    let ctrl = TaskController::new(chain, &ControllerConfig::default()).unwrap();
    (ctrl, sim)
}

#[test]
fn tip_converges_to_reachable_target() {
    let (mut ctrl, mut sim) = setup();
    ctrl.start(&sim).unwrap();

    let start = ctrl.handle().desired_pose().position;
    let target = start + nalgebra::Vector3::new(0.05, -0.05, 0.0);
    ctrl.handle()
        .set_desired_pose(target.x, target.y, target.z)
        .unwrap();

    for _ in 0..15_000 {
        assert_eq!(ctrl.update(DT, &mut sim), Ok(CycleOutcome::Applied));
        sim.step(DT);
    }

    let reached = ctrl
        .model()
        .forward_kinematics(&nalgebra::DVector::from_column_slice(sim.positions()))
        .position;
    assert!(
        (reached - target).norm() < 1e-3,
        "tip at {reached:?}, target {target:?}"
    );
    assert!(sim.torques().iter().all(|t| t.is_finite()));
}

#[test]
fn idle_controller_holds_initial_pose() {
    let (mut ctrl, mut sim) = setup();
    ctrl.start(&sim).unwrap();
    let start: Vec<f64> = sim.positions().to_vec();

    for _ in 0..2_000 {
        ctrl.update(DT, &mut sim).unwrap();
        sim.step(DT);
    }
    for (q, q0) in sim.positions().iter().zip(&start) {
        assert!((q - q0).abs() < 1e-12);
    }
}
