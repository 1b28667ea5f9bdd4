//! # taskik HAL Library
//!
//! Simulation backend for the task-space controller.
//!
//! # Module Structure
//!
//! - [`chain`] - Chain description (TOML), root→tip extraction and the
//!   DH [`chain::SerialChain`] kinematic model
//! - [`sim`] - [`sim::SimulatedJoints`], a decoupled per-joint rigid-body
//!   actuator model
//!
//! # Architecture
//!
//! ```text
//! chain.toml ──► ChainConfig ──► SerialChain      (KinematicModel)
//!                     │
//!                     └─[simulation]──► SimulatedJoints (ActuatorInterface)
//! ```

#![deny(missing_docs)]

pub mod chain;
pub mod sim;

pub use crate::chain::{ChainConfig, ChainError, SerialChain, load_chain_config};
pub use crate::sim::{SimError, SimulatedJoints};
