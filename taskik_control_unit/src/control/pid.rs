//! Per-joint PID bank with backward Euler integration.
//!
//! `u = Kp·e + Σ(Ki·e·dt) + Kd·(e − e_prev)/dt`
//!
//! There is no output saturation, integral clamp or anti-windup: a large
//! persistent error winds the integral up without limit. Gains are applied
//! from a [`GainSet`] snapshot each cycle; replacing gains never touches the
//! accumulated integral or the previous error.

use heapless::Vec as FixedVec;
use taskik_common::consts::MAX_JOINTS;
use taskik_common::error::ControlError;

/// Internal state of one joint's PID loop.
///
/// Persists across cycles; cleared only by [`PidBank::reset`] at start.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidState {
    /// Integral accumulator (already scaled by Ki).
    integral: f64,
    /// Previous error (for derivative).
    prev_error: f64,
}

impl PidState {
    /// Reset all internal state to zero.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn integral(&self) -> f64 {
        self.integral
    }

    #[inline]
    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }
}

/// PID gains for a single joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (0 = no further accumulation).
    pub ki: f64,
    /// Derivative gain (0 = disabled).
    pub kd: f64,
}

/// Compute one PID cycle.
///
/// # Arguments
/// - `state`: Mutable PID internal state.
/// - `gains`: Gains for this joint.
/// - `error`: Position error (reference − measured).
/// - `dt`: Cycle period [s].
///
/// # Returns
/// Torque command [Nm], unsaturated.
#[inline]
pub fn pid_compute(state: &mut PidState, gains: &PidGains, error: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }

    // ── P term ──────────────────────────────────────────────
    let p_term = gains.kp * error;

    // ── I term (backward Euler) ─────────────────────────────
    state.integral += gains.ki * error * dt;
    let i_term = state.integral;

    // ── D term (unfiltered) ─────────────────────────────────
    let d_term = if gains.kd != 0.0 {
        gains.kd * (error - state.prev_error) / dt
    } else {
        0.0
    };

    state.prev_error = error;

    p_term + i_term + d_term
}

// ─── Gain Snapshot ──────────────────────────────────────────────────

/// Complete gain block for all joints, replaced as a unit.
///
/// Plain `Copy` data so it can be published and read as one value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainSet {
    joints: usize,
    kp: [f64; MAX_JOINTS],
    ki: [f64; MAX_JOINTS],
    kd: [f64; MAX_JOINTS],
}

impl GainSet {
    /// Same gains on every one of `joints` joints.
    pub fn uniform(joints: usize, gains: PidGains) -> Self {
        let n = joints.min(MAX_JOINTS);
        let mut set = Self {
            joints: n,
            kp: [0.0; MAX_JOINTS],
            ki: [0.0; MAX_JOINTS],
            kd: [0.0; MAX_JOINTS],
        };
        set.kp[..n].fill(gains.kp);
        set.ki[..n].fill(gains.ki);
        set.kd[..n].fill(gains.kd);
        set
    }

    /// Build from a flat `[Kp_0..Kp_{N-1}, Ki_0..Ki_{N-1}]` payload. Kd is 0.
    ///
    /// # Errors
    /// - `ControlError::Configuration` if `values.len() != 2 * joints`.
    /// - `ControlError::NonFiniteGain` if any value is NaN or infinite.
    pub fn from_payload(joints: usize, values: &[f64]) -> Result<Self, ControlError> {
        let expected = 2 * joints;
        if joints > MAX_JOINTS || values.len() != expected {
            return Err(ControlError::Configuration {
                joints,
                expected,
                got: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ControlError::NonFiniteGain { index });
        }

        let mut set = Self::uniform(
            joints,
            PidGains {
                kp: 0.0,
                ki: 0.0,
                kd: 0.0,
            },
        );
        set.kp[..joints].copy_from_slice(&values[..joints]);
        set.ki[..joints].copy_from_slice(&values[joints..]);
        Ok(set)
    }

    #[inline]
    pub fn joints(&self) -> usize {
        self.joints
    }

    /// Gains for joint `i`.
    #[inline]
    pub fn get(&self, i: usize) -> PidGains {
        PidGains {
            kp: self.kp[i],
            ki: self.ki[i],
            kd: self.kd[i],
        }
    }
}

// ─── PID Bank ───────────────────────────────────────────────────────

/// N independent PID loops, one per joint, in fixed-capacity storage.
#[derive(Debug, Clone)]
pub struct PidBank {
    states: FixedVec<PidState, MAX_JOINTS>,
}

impl PidBank {
    /// Create `joints` zeroed PID loops.
    ///
    /// # Errors
    /// `ControlError::Setup` if `joints` is 0 or exceeds [`MAX_JOINTS`].
    pub fn new(joints: usize) -> Result<Self, ControlError> {
        if joints == 0 {
            return Err(ControlError::Setup("PID bank needs at least one joint".to_string()));
        }
        let mut states = FixedVec::new();
        states
            .resize(joints, PidState::default())
            .map_err(|_| {
                ControlError::Setup(format!(
                    "{joints} joints exceed the supported maximum of {MAX_JOINTS}"
                ))
            })?;
        Ok(Self { states })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Clear integral and derivative history on every joint.
    pub fn reset(&mut self) {
        for s in self.states.iter_mut() {
            s.reset();
        }
    }

    /// Run joint `i`'s loop with its gains from `gains`.
    #[inline]
    pub fn compute(&mut self, i: usize, gains: &GainSet, error: f64, dt: f64) -> f64 {
        pid_compute(&mut self.states[i], &gains.get(i), error, dt)
    }

    #[inline]
    pub fn state(&self, i: usize) -> &PidState {
        &self.states[i]
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
