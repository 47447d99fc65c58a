use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_timestep() -> f64 {
    1.0 / 500.0
}
const fn default_substeps() -> u32 {
    20
}
const fn default_gravity() -> [f32; 3] {
    [0.0, 0.0, -9.81]
}
const fn default_distance_threshold() -> f32 {
    0.05
}
const fn default_max_reset_attempts() -> u32 {
    1000
}
const fn default_camera_target() -> [f32; 3] {
    [0.5, 0.4, -0.8]
}
const fn default_camera_distance() -> f32 {
    2.0
}
const fn default_camera_pitch() -> f32 {
    -50.0
}
fn default_control_joint_ids() -> Vec<usize> {
    vec![0, 1, 2, 3, 4, 5, 6, 9, 10]
}
fn default_neutral_angles() -> Vec<f32> {
    vec![0.00, 0.41, 0.00, -1.85, 0.00, 2.26, 0.79, 0.00, 0.00]
}
const fn default_effector_joint_ids() -> [usize; 2] {
    [9, 10]
}
const fn default_effector_link_id() -> usize {
    11
}
const fn default_effector_displacement_limit() -> f32 {
    0.2
}
const fn default_ik_displacement_limit() -> f32 {
    0.05
}
const fn default_lateral_friction() -> f32 {
    1.0
}
const fn default_spinning_friction() -> f32 {
    0.001
}
const fn default_goal_range_low() -> [f32; 3] {
    [0.4, -0.1, 0.0]
}
const fn default_goal_range_high() -> [f32; 3] {
    [0.8, 0.1, 0.3]
}
const fn default_object_size() -> f32 {
    0.04
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Backend stepping parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Backend timestep in seconds (default: 1/500).
    #[serde(default = "default_timestep")]
    pub timestep: f64,

    /// Backend advances per control step (default: 20).
    #[serde(default = "default_substeps")]
    pub substeps: u32,

    /// Gravity vector [x, y, z] in m/s^2.
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timestep: default_timestep(),
            substeps: default_substeps(),
            gravity: default_gravity(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timestep <= 0.0 || !self.timestep.is_finite() {
            return Err(ConfigError::InvalidTimestep(self.timestep));
        }
        if self.substeps == 0 {
            return Err(ConfigError::ZeroSubsteps);
        }
        Ok(())
    }

    /// Simulated seconds per control step.
    pub fn control_dt(&self) -> f64 {
        self.timestep * f64::from(self.substeps)
    }

    /// Control rate in Hz.
    pub fn control_hz(&self) -> f64 {
        1.0 / self.control_dt()
    }
}

// ---------------------------------------------------------------------------
// EpisodeConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeConfig {
    /// Success radius around the desired goal, in meters.
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f32,

    /// Upper bound on goal resamples while the initial state is already solved.
    #[serde(default = "default_max_reset_attempts")]
    pub max_reset_attempts: u32,

    /// Step budget enforced by the time-limit wrapper. `None` disables it.
    #[serde(default)]
    pub max_episode_steps: Option<u32>,

    /// Seed used when the caller does not provide one.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            distance_threshold: default_distance_threshold(),
            max_reset_attempts: default_max_reset_attempts(),
            max_episode_steps: None,
            seed: None,
        }
    }
}

impl EpisodeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.distance_threshold <= 0.0 || !self.distance_threshold.is_finite() {
            return Err(invalid(
                "episode.distance_threshold",
                format!("must be > 0, got {}", self.distance_threshold),
            ));
        }
        if self.max_reset_attempts == 0 {
            return Err(invalid("episode.max_reset_attempts", "must be >= 1"));
        }
        if self.max_episode_steps == Some(0) {
            return Err(invalid("episode.max_episode_steps", "must be >= 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CameraConfig
// ---------------------------------------------------------------------------

/// Debug visualizer camera placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_target")]
    pub target: [f32; 3],
    #[serde(default = "default_camera_distance")]
    pub distance: f32,
    /// Degrees.
    #[serde(default)]
    pub yaw: f32,
    /// Degrees.
    #[serde(default = "default_camera_pitch")]
    pub pitch: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            target: default_camera_target(),
            distance: default_camera_distance(),
            yaw: 0.0,
            pitch: default_camera_pitch(),
        }
    }
}

// ---------------------------------------------------------------------------
// RobotConfig
// ---------------------------------------------------------------------------

/// Resolved robot description. Joint and link ids follow the backend's
/// index convention: joint `i` drives link `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    pub description: PathBuf,
    #[serde(default)]
    pub init_position: [f32; 3],
    #[serde(default = "default_control_joint_ids")]
    pub control_joint_ids: Vec<usize>,
    #[serde(default = "default_neutral_angles")]
    pub control_joint_neutral_angles: Vec<f32>,
    /// The two finger joints. Must be the last two control joints.
    #[serde(default = "default_effector_joint_ids")]
    pub effector_joint_ids: [usize; 2],
    #[serde(default = "default_effector_link_id")]
    pub effector_link_id: usize,
    /// Max gripper width change per unit action, in meters.
    #[serde(default = "default_effector_displacement_limit")]
    pub effector_displacement_limit: f32,
    /// Max effector translation per unit action, in meters.
    #[serde(default = "default_ik_displacement_limit")]
    pub ik_displacement_limit: f32,
    #[serde(default = "default_lateral_friction")]
    pub lateral_friction: f32,
    #[serde(default = "default_spinning_friction")]
    pub spinning_friction: f32,
}

impl RobotConfig {
    /// Robot config with Panda defaults for everything but the description.
    pub fn panda(description: impl Into<PathBuf>) -> Self {
        Self {
            description: description.into(),
            init_position: [0.0; 3],
            control_joint_ids: default_control_joint_ids(),
            control_joint_neutral_angles: default_neutral_angles(),
            effector_joint_ids: default_effector_joint_ids(),
            effector_link_id: default_effector_link_id(),
            effector_displacement_limit: default_effector_displacement_limit(),
            ik_displacement_limit: default_ik_displacement_limit(),
            lateral_friction: default_lateral_friction(),
            spinning_friction: default_spinning_friction(),
        }
    }

    /// Control joints driven by IK (everything but the two fingers).
    pub fn arm_joint_count(&self) -> usize {
        self.control_joint_ids.len().saturating_sub(2)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ids = self.control_joint_ids.len();
        let neutral = self.control_joint_neutral_angles.len();
        if ids != neutral {
            return Err(ConfigError::JointCountMismatch { ids, neutral });
        }
        if ids < 2 || self.control_joint_ids[ids - 2..] != self.effector_joint_ids {
            return Err(ConfigError::FingersNotLast {
                fingers: self.effector_joint_ids,
            });
        }
        if self.effector_displacement_limit < 0.0 {
            return Err(invalid(
                "robot.effector_displacement_limit",
                "must be >= 0",
            ));
        }
        if self.ik_displacement_limit < 0.0 {
            return Err(invalid("robot.ik_displacement_limit", "must be >= 0"));
        }
        if self.lateral_friction < 0.0 || self.spinning_friction < 0.0 {
            return Err(invalid("robot.friction", "coefficients must be >= 0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GoalConfig
// ---------------------------------------------------------------------------

/// Goal body and sampling ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalConfig {
    pub description: PathBuf,
    #[serde(default)]
    pub init_position: [f32; 3],
    #[serde(default = "default_goal_range_low")]
    pub goal_range_low: [f32; 3],
    #[serde(default = "default_goal_range_high")]
    pub goal_range_high: [f32; 3],
    /// Edge length of the goal object, in meters.
    #[serde(default = "default_object_size")]
    pub object_size: f32,
}

impl GoalConfig {
    pub fn new(description: impl Into<PathBuf>, init_position: [f32; 3]) -> Self {
        Self {
            description: description.into(),
            init_position,
            goal_range_low: default_goal_range_low(),
            goal_range_high: default_goal_range_high(),
            object_size: default_object_size(),
        }
    }

    pub const fn target_range_low(&self) -> [f32; 3] {
        self.goal_range_low
    }

    /// Target positions stay on the ground plane: z collapses to the low bound.
    pub const fn target_range_high(&self) -> [f32; 3] {
        [
            self.goal_range_high[0],
            self.goal_range_high[1],
            self.goal_range_low[2],
        ]
    }

    pub fn half_size(&self) -> f32 {
        self.object_size / 2.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for axis in 0..3 {
            let (low, high) = (self.goal_range_low[axis], self.goal_range_high[axis]);
            if !low.is_finite() || !high.is_finite() || low > high {
                return Err(ConfigError::InvalidRange { axis, low, high });
            }
        }
        if self.object_size < 0.0 {
            return Err(invalid("goal.object_size", "must be >= 0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StaticBodyConfig
// ---------------------------------------------------------------------------

/// A body loaded once at build time and never moved: plane, table, tray.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticBodyConfig {
    pub description: PathBuf,
    #[serde(default)]
    pub init_position: [f32; 3],
}

impl StaticBodyConfig {
    pub fn new(description: impl Into<PathBuf>, init_position: [f32; 3]) -> Self {
        Self {
            description: description.into(),
            init_position,
        }
    }
}

// ---------------------------------------------------------------------------
// SceneConfig
// ---------------------------------------------------------------------------

/// Complete scene configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub sim: SimConfig,
    #[serde(default)]
    pub episode: EpisodeConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    pub robot: RobotConfig,
    pub goal: GoalConfig,
    pub plane: StaticBodyConfig,
    pub table: StaticBodyConfig,
    #[serde(default)]
    pub tray: Option<StaticBodyConfig>,
}

impl SceneConfig {
    /// Validate every section. Returns the first error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sim.validate()?;
        self.episode.validate()?;
        if self.camera.distance <= 0.0 {
            return Err(invalid("camera.distance", "must be > 0"));
        }
        self.robot.validate()?;
        self.goal.validate()?;
        Ok(())
    }

    /// Parse TOML, resolve relative description paths against `base_dir`, validate.
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.resolve_paths(base_dir);
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file. Relative paths resolve against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&content, base_dir)
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        let descriptions = [
            Some(&mut self.robot.description),
            Some(&mut self.goal.description),
            Some(&mut self.plane.description),
            Some(&mut self.table.description),
            self.tray.as_mut().map(|t| &mut t.description),
        ];
        for description in descriptions.into_iter().flatten() {
            if description.is_relative() {
                *description = base_dir.join(&*description);
            }
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
