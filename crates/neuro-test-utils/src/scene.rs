//! Scene fixtures built from the bundled assets.

use std::path::PathBuf;

use neuro_core::config::{GoalConfig, RobotConfig, SceneConfig};

const ASSETS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets");

/// Absolute path of a file under `assets/`.
pub fn asset(relative: &str) -> PathBuf {
    PathBuf::from(ASSETS).join(relative)
}

/// The bundled Panda scene file.
pub fn panda_scene_path() -> PathBuf {
    asset("panda.toml")
}

/// Parsed and validated Panda scene.
///
/// # Panics
///
/// Panics if the bundled scene file is missing or invalid.
pub fn panda_scene() -> SceneConfig {
    SceneConfig::from_file(panda_scene_path()).expect("bundled panda.toml must load")
}

pub fn panda_robot_config() -> RobotConfig {
    RobotConfig::panda(asset("urdf/panda.urdf"))
}

pub fn panda_goal_config() -> GoalConfig {
    GoalConfig::new(asset("urdf/goal.urdf"), [0.6, 0.0, 0.02])
}
