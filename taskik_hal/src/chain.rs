//! Serial kinematic chain from a TOML description.
//!
//! Segments are listed base to tip. Each segment carries standard
//! Denavit–Hartenberg parameters and is either a revolute joint or a fixed
//! link:
//!
//! `T_i = Rz(θ_i) · Tz(d_i) · Tx(a_i) · Rx(α_i)`, `θ_i = q_j + θ_offset_i`
//! for revolute segments, `θ_i = θ_offset_i` for fixed ones.
//!
//! The controlled chain is the run of segments strictly after `root_name`
//! up to and including `tip_name`. `root_name` may also be `base_name`,
//! in which case the chain starts at the first segment. Poses and Jacobians
//! are expressed in the root frame.
//!
//! # TOML Example
//!
//! ```toml
//! root_name = "base"
//! tip_name = "flange"
//!
//! [[segments]]
//! name = "shoulder"
//! joint = "revolute"
//! a = 0.4
//!
//! [[segments]]
//! name = "flange"
//! joint = "fixed"
//! d = 0.05
//! ```

use std::path::Path;

use nalgebra::{DVector, Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use taskik_common::config::{ConfigError, ConfigLoader};
use taskik_common::consts::MAX_JOINTS;
use taskik_common::kinematics::KinematicModel;
use taskik_common::types::{CartesianPose, Jacobian};
use thiserror::Error;
use tracing::{debug, info};

use crate::sim::SimulationConfig;

/// Errors while building a [`SerialChain`].
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// Chain file could not be read or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No segments in the description.
    #[error("chain description contains no segments")]
    Empty,

    /// `root_name` or `tip_name` does not name a segment.
    #[error("unknown segment '{name}'; available segments: {available}")]
    UnknownSegment {
        /// The name that was looked up.
        name: String,
        /// Comma-separated list of every known segment name.
        available: String,
    },

    /// The tip does not come after the root.
    #[error("tip '{tip}' is not after root '{root}' in the chain")]
    InvalidRange {
        /// Root segment name.
        root: String,
        /// Tip segment name.
        tip: String,
    },

    /// Two segments share the same name.
    #[error("duplicate segment name '{0}'")]
    DuplicateSegment(String),

    /// Extracted chain has no revolute joints.
    #[error("chain from '{root}' to '{tip}' has no revolute joints")]
    NoJoints {
        /// Root segment name.
        root: String,
        /// Tip segment name.
        tip: String,
    },

    /// Extracted chain exceeds the controller's joint limit.
    #[error("chain has {got} joints, maximum is {max}")]
    TooManyJoints {
        /// Joint count of the extracted chain.
        got: usize,
        /// Supported maximum.
        max: usize,
    },

    /// A DH parameter is NaN or infinite.
    #[error("segment '{0}' has a non-finite DH parameter")]
    NonFiniteParameter(String),
}

// ─── Configuration ──────────────────────────────────────────────────

/// Segment joint type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    /// Rotation about the segment's z axis.
    #[default]
    Revolute,
    /// Rigid link.
    Fixed,
}

/// One segment of the description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Unique segment name.
    pub name: String,
    /// Joint type.
    #[serde(default)]
    pub joint: JointKind,
    /// Link length along x [m].
    #[serde(default)]
    pub a: f64,
    /// Link twist about x [rad].
    #[serde(default)]
    pub alpha: f64,
    /// Link offset along z [m].
    #[serde(default)]
    pub d: f64,
    /// Constant added to the joint angle [rad].
    #[serde(default)]
    pub theta_offset: f64,
}

/// Complete chain description file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Name of the frame before the first segment.
    #[serde(default = "default_base_name")]
    pub base_name: String,
    /// Segment (or base) whose frame is the chain root.
    pub root_name: String,
    /// Last segment of the controlled chain.
    pub tip_name: String,
    /// Segments, base to tip.
    pub segments: Vec<SegmentConfig>,
    /// Simulated actuator parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_base_name() -> String {
    "base".to_string()
}

impl ChainConfig {
    /// Comma-separated list of all frame names, base first.
    pub fn segment_names(&self) -> String {
        std::iter::once(self.base_name.as_str())
            .chain(self.segments.iter().map(|s| s.name.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Slice of segments strictly after `root_name` through `tip_name`.
    ///
    /// # Errors
    /// `Empty`, `DuplicateSegment`, `UnknownSegment` (with the full segment
    /// list) or `InvalidRange`.
    pub fn extract(&self) -> Result<&[SegmentConfig], ChainError> {
        if self.segments.is_empty() {
            return Err(ChainError::Empty);
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if seg.name == self.base_name || self.segments[..i].iter().any(|s| s.name == seg.name) {
                return Err(ChainError::DuplicateSegment(seg.name.clone()));
            }
        }

        // Frame index: 0 = base, k = after segment k-1.
        let frame = |name: &str| -> Result<usize, ChainError> {
            if name == self.base_name {
                return Ok(0);
            }
            self.segments
                .iter()
                .position(|s| s.name == name)
                .map(|i| i + 1)
                .ok_or_else(|| ChainError::UnknownSegment {
                    name: name.to_string(),
                    available: self.segment_names(),
                })
        };

        let root = frame(&self.root_name)?;
        let tip = frame(&self.tip_name)?;
        if tip <= root {
            return Err(ChainError::InvalidRange {
                root: self.root_name.clone(),
                tip: self.tip_name.clone(),
            });
        }
        Ok(&self.segments[root..tip])
    }
}

/// Load and parse a chain description file.
pub fn load_chain_config(path: &Path) -> Result<ChainConfig, ChainError> {
    info!("Loading chain description from {:?}", path);
    let config = ChainConfig::load(path)?;
    debug!("chain frames: {}", config.segment_names());
    Ok(config)
}

// ─── Kinematic Model ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Segment {
    revolute: bool,
    a: f64,
    alpha: f64,
    d: f64,
    theta_offset: f64,
}

impl Segment {
    fn transform(&self, q: f64) -> Isometry3<f64> {
        let theta = if self.revolute {
            q + self.theta_offset
        } else {
            self.theta_offset
        };
        let about_z = Isometry3::from_parts(
            Translation3::new(0.0, 0.0, self.d),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), theta),
        );
        let about_x = Isometry3::from_parts(
            Translation3::new(self.a, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.alpha),
        );
        about_z * about_x
    }
}

/// DH serial chain implementing [`KinematicModel`].
#[derive(Debug, Clone)]
pub struct SerialChain {
    segments: Vec<Segment>,
    joints: usize,
}

impl SerialChain {
    /// Build the root→tip chain described by `config`.
    ///
    /// # Errors
    /// Any [`ChainError`] from extraction, plus `NoJoints`, `TooManyJoints`
    /// and `NonFiniteParameter`.
    pub fn from_config(config: &ChainConfig) -> Result<Self, ChainError> {
        let extracted = config.extract()?;

        let mut segments = Vec::with_capacity(extracted.len());
        for seg in extracted {
            if ![seg.a, seg.alpha, seg.d, seg.theta_offset]
                .iter()
                .all(|v| v.is_finite())
            {
                return Err(ChainError::NonFiniteParameter(seg.name.clone()));
            }
            segments.push(Segment {
                revolute: seg.joint == JointKind::Revolute,
                a: seg.a,
                alpha: seg.alpha,
                d: seg.d,
                theta_offset: seg.theta_offset,
            });
        }

        let joints = segments.iter().filter(|s| s.revolute).count();
        if joints == 0 {
            return Err(ChainError::NoJoints {
                root: config.root_name.clone(),
                tip: config.tip_name.clone(),
            });
        }
        if joints > MAX_JOINTS {
            return Err(ChainError::TooManyJoints {
                got: joints,
                max: MAX_JOINTS,
            });
        }

        info!(
            "Serial chain '{}' → '{}': {} segments, {} joints",
            config.root_name,
            config.tip_name,
            segments.len(),
            joints
        );
        Ok(Self { segments, joints })
    }

    /// Tip frame at configuration `q`.
    fn tip_frame(&self, q: &DVector<f64>) -> Isometry3<f64> {
        let mut frame = Isometry3::identity();
        let mut j = 0;
        for seg in &self.segments {
            let qj = if seg.revolute {
                j += 1;
                q[j - 1]
            } else {
                0.0
            };
            frame *= seg.transform(qj);
        }
        frame
    }
}

impl KinematicModel for SerialChain {
    fn joint_count(&self) -> usize {
        self.joints
    }

    fn jacobian(&self, q: &DVector<f64>, jacobian: &mut Jacobian) {
        jacobian.fill(0.0);
        let tip = self.tip_frame(q).translation.vector;

        let mut frame = Isometry3::identity();
        let mut j = 0;
        for seg in &self.segments {
            if seg.revolute {
                let axis = frame.rotation * Vector3::z();
                let origin = frame * Point3::origin();
                let linear = axis.cross(&(tip - origin.coords));
                for r in 0..3 {
                    jacobian[(r, j)] = linear[r];
                    jacobian[(r + 3, j)] = axis[r];
                }
                frame *= seg.transform(q[j]);
                j += 1;
            } else {
                frame *= seg.transform(0.0);
            }
        }
    }

    fn forward_kinematics(&self, q: &DVector<f64>) -> CartesianPose {
        let frame = self.tip_frame(q);
        CartesianPose {
            position: frame.translation.vector,
            orientation: frame.rotation,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
