//! Updates from another thread while the cycle runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use taskik_control_unit::config::ControllerConfig;
use taskik_control_unit::controller::TaskController;

use super::common::{FrozenJoints, Translational};

const N: usize = 7;

#[test]
fn cycle_never_sees_a_torn_pose_or_gain_block() {
    let mut ctrl = TaskController::new(Translational::new(N), &ControllerConfig::default()).unwrap();
    let mut hw = FrozenJoints::new(N);
    ctrl.start(&hw).unwrap();

    let handle = ctrl.handle();
    handle.set_gains(&[0.0; 2 * N]).unwrap();
    let done = Arc::new(AtomicBool::new(false));
    let writer_done = done.clone();
    let writer = thread::spawn(move || {
        let mut k = 1u32;
        while !writer_done.load(Ordering::Acquire) {
            let v = f64::from(k) * 1e-3;
            handle.set_desired_pose(v, 2.0 * v, 3.0 * v).unwrap();

            let mut gains = [0.0; 2 * N];
            gains[..N].fill(v);
            gains[N..].fill(v * 0.01);
            handle.set_gains(&gains).unwrap();
            k = k.wrapping_add(1);
        }
    });

    for _ in 0..20_000 {
        ctrl.update(0.001, &mut hw).unwrap();

        let p = ctrl.active_desired_pose().position;
        assert_eq!(p.y, 2.0 * p.x);
        assert_eq!(p.z, 3.0 * p.x);

        let g = ctrl.active_gains();
        let kp = g.get(0).kp;
        for i in 0..N {
            assert_eq!(g.get(i).kp, kp);
            assert_eq!(g.get(i).ki, kp * 0.01);
        }
        assert!(hw.tau.iter().all(|t| t.is_finite()));
    }

    done.store(true, Ordering::Release);
    writer.join().unwrap();
}

#[test]
fn handle_outlives_updates_from_many_threads() {
    let mut ctrl = TaskController::new(Translational::new(N), &ControllerConfig::default()).unwrap();
    let mut hw = FrozenJoints::new(N);
    ctrl.start(&hw).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let h = ctrl.handle();
            thread::spawn(move || {
                for i in 0..500 {
                    let x = f64::from(t * 1000 + i);
                    h.set_desired_pose(x, x, x).unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    ctrl.update(0.001, &mut hw).unwrap();
    let p = ctrl.active_desired_pose().position;
    assert_eq!(p.x, p.y);
    assert_eq!(p.x, p.z);
    assert_eq!(p.x % 1000.0, 499.0);
}
