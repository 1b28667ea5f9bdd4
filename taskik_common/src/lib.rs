//! taskik Common Library
//!
//! Shared constants, data types and capability traits used by every crate
//! in the taskik workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Joint limits, task dimension and controller defaults
//! - [`types`] - Joint state, Cartesian pose and torque command types
//! - [`kinematics`] - The [`kinematics::KinematicModel`] capability
//! - [`actuator`] - The [`actuator::ActuatorInterface`] capability
//! - [`error`] - Controller error taxonomy
//! - [`config`] - TOML configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use taskik_common::prelude::*;
//! ```

pub mod actuator;
pub mod config;
pub mod consts;
pub mod error;
pub mod kinematics;
pub mod prelude;
pub mod types;
