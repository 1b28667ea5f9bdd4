//! System-wide constants for the taskik workspace.
//!
//! Single source of truth for numeric limits and controller defaults.

use static_assertions::const_assert;

/// Maximum number of actuated joints in a controlled chain.
///
/// Per-joint controller state is stored in fixed-capacity arrays of this size.
pub const MAX_JOINTS: usize = 16;

/// Task-space dimension: 3 linear + 3 angular components.
pub const TASK_DIM: usize = 6;

/// Default control cycle time in microseconds (1 kHz = 1000 µs).
pub const CYCLE_TIME_US: u32 = 1000;

/// Lower bound for a configurable cycle time [µs].
pub const CYCLE_TIME_US_MIN: u32 = 100;

/// Upper bound for a configurable cycle time [µs].
pub const CYCLE_TIME_US_MAX: u32 = 100_000;

/// Proportional gain applied to every joint at start.
pub const DEFAULT_KP: f64 = 100.0;

/// Integral gain applied to every joint at start.
pub const DEFAULT_KI: f64 = 1.0;

/// Derivative gain applied to every joint at start.
pub const DEFAULT_KD: f64 = 0.0;

/// Singular values at or below this are treated as zero by the undamped solver.
pub const DEFAULT_SINGULAR_EPSILON: f64 = 1e-5;

/// Default damping factor for the damped least-squares solver.
pub const DEFAULT_DAMPING: f64 = 0.2;

/// Iteration bound for the SVD inside the pseudo-inverse solver.
pub const DEFAULT_SVD_MAX_ITERATIONS: usize = 150;

/// Degenerate cycles are logged once, then once every this many occurrences.
pub const DEFAULT_DEGENERACY_LOG_INTERVAL: u64 = 1000;

const_assert!(MAX_JOINTS >= TASK_DIM);
const_assert!(CYCLE_TIME_US >= CYCLE_TIME_US_MIN && CYCLE_TIME_US <= CYCLE_TIME_US_MAX);
