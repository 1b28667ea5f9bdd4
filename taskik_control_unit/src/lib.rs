//! # taskik Control Unit Library
//!
//! Task-space differential inverse-kinematics torque controller for a
//! serial kinematic chain. Every cycle maps the Cartesian position error of
//! the chain tip into joint space through the SVD pseudo-inverse of the
//! Jacobian, integrates the resulting joint-velocity reference into a
//! joint-position reference, and tracks that reference with one PID loop
//! per joint.
//!
//! ## Layers
//!
//! 1. **control** - Pure numeric pieces: pseudo-inverse, task error,
//!    joint-reference integrator, PID bank
//! 2. **command** - Snapshot sharing and the asynchronous
//!    [`command::surface::ControllerHandle`]
//! 3. **controller** - [`controller::TaskController`] lifecycle and cycle body
//! 4. **cycle** - RT setup and the periodic [`cycle::CycleRunner`]
//!
//! ## Allocation
//!
//! Jacobian, pseudo-inverse, reference and torque buffers are sized when the
//! controller is created and reused every cycle. PID state lives in
//! fixed-capacity storage and the pseudo-inverse factors a fixed-size 6×6
//! Gram matrix, so `update()` performs no heap allocation as long as the
//! kinematic model and actuator interface do not allocate either.

pub mod command;
pub mod config;
pub mod control;
pub mod controller;
pub mod cycle;
pub mod state;
