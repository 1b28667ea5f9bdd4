//! SVD-based pseudo-inverse of the 6×N task Jacobian.
//!
//! The solve works on the 6×6 Gram matrix `G = J·Jᵀ`, whose SVD is
//! `G = U · diag(σ²) · Uᵀ` for the singular values σ of `J`:
//!
//! ```text
//! J⁺ = Jᵀ · G⁺ = V · Σ⁺ · Uᵀ
//! ```
//!
//! `Σ⁺` inverts each singular value according to the configured
//! [`PinvPolicy`]:
//!
//! - `Undamped`: `1/σ` for `σ > singular_epsilon`, `0` otherwise. Exact
//!   Moore–Penrose inverse on the retained subspace; magnitude grows without
//!   bound as the chain approaches a singularity (known limitation).
//! - `Damped`: `σ / (σ² + λ²)` for every σ (damped least squares).
//!
//! `G` and its factors are fixed-size, so a solve never touches the heap;
//! the result is written into the caller's N×6 buffer. The SVD runs with a
//! fixed sweep limit, so solve time is bounded. A non-finite Jacobian, a
//! non-converged SVD or a non-finite result is reported as a
//! [`DegeneracyKind`] and the caller holds its last command.

use nalgebra::{Matrix6, SVD};
use taskik_common::consts::{DEFAULT_SINGULAR_EPSILON, DEFAULT_SVD_MAX_ITERATIONS, TASK_DIM};
use taskik_common::error::DegeneracyKind;
use taskik_common::types::{Jacobian, PseudoInverse};

/// Singular-value inversion policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinvPolicy {
    /// Truncated Moore–Penrose inverse.
    Undamped {
        /// Singular values at or below this are dropped.
        singular_epsilon: f64,
    },
    /// Damped least squares.
    Damped {
        /// Damping factor λ.
        lambda: f64,
    },
}

impl Default for PinvPolicy {
    fn default() -> Self {
        Self::Undamped {
            singular_epsilon: DEFAULT_SINGULAR_EPSILON,
        }
    }
}

impl PinvPolicy {
    /// Weight applied to a Gram eigenvalue `μ = σ²`, so that
    /// `σ · weight(σ²)` is the inverted singular value.
    #[inline]
    fn gram_weight(&self, mu: f64) -> f64 {
        match *self {
            Self::Undamped { singular_epsilon } => {
                if mu > singular_epsilon * singular_epsilon {
                    1.0 / mu
                } else {
                    0.0
                }
            }
            Self::Damped { lambda } => 1.0 / (mu + lambda * lambda),
        }
    }
}

/// Stateless pseudo-inverse solver bound to a policy and an iteration limit.
#[derive(Debug, Clone, Copy)]
pub struct PseudoInverseSolver {
    policy: PinvPolicy,
    max_iterations: usize,
}

impl Default for PseudoInverseSolver {
    fn default() -> Self {
        Self::new(PinvPolicy::default(), DEFAULT_SVD_MAX_ITERATIONS)
    }
}

impl PseudoInverseSolver {
    /// `max_iterations` must be non-zero (zero would mean "unbounded" to the SVD).
    pub fn new(policy: PinvPolicy, max_iterations: usize) -> Self {
        Self {
            policy,
            max_iterations: max_iterations.max(1),
        }
    }

    #[inline]
    pub fn policy(&self) -> PinvPolicy {
        self.policy
    }

    /// Compute `J⁺` into `out` (pre-sized N×6). No heap allocation.
    ///
    /// On error `out` is left in an unspecified state and must not be used.
    pub fn solve(&self, jacobian: &Jacobian, out: &mut PseudoInverse) -> Result<(), DegeneracyKind> {
        debug_assert_eq!(jacobian.nrows(), TASK_DIM);
        debug_assert_eq!(out.nrows(), jacobian.ncols());
        debug_assert_eq!(out.ncols(), jacobian.nrows());

        if !jacobian.iter().all(|v| v.is_finite()) {
            return Err(DegeneracyKind::NonFiniteJacobian);
        }

        let joints = jacobian.ncols();
        let mut gram = Matrix6::<f64>::zeros();
        for r in 0..TASK_DIM {
            for c in r..TASK_DIM {
                let mut acc = 0.0;
                for j in 0..joints {
                    acc += jacobian[(r, j)] * jacobian[(c, j)];
                }
                gram[(r, c)] = acc;
                gram[(c, r)] = acc;
            }
        }

        let svd = SVD::try_new(gram, true, false, f64::EPSILON, self.max_iterations)
            .ok_or(DegeneracyKind::SvdNotConverged)?;
        let Some(u) = svd.u.as_ref() else {
            return Err(DegeneracyKind::SvdNotConverged);
        };

        // G⁺ = Σ_k  w(μ_k) · u_k · u_kᵀ
        let mut gram_pinv = Matrix6::<f64>::zeros();
        for (k, &mu) in svd.singular_values.iter().enumerate() {
            let w = self.policy.gram_weight(mu);
            if w == 0.0 {
                continue;
            }
            let u_k = u.column(k);
            gram_pinv.ger(w, &u_k, &u_k, 1.0);
        }

        // J⁺ = Jᵀ · G⁺
        for i in 0..joints {
            for c in 0..TASK_DIM {
                let mut acc = 0.0;
                for r in 0..TASK_DIM {
                    acc += jacobian[(r, i)] * gram_pinv[(r, c)];
                }
                out[(i, c)] = acc;
            }
        }

        if !out.iter().all(|v| v.is_finite()) {
            return Err(DegeneracyKind::NonFinitePseudoInverse);
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
