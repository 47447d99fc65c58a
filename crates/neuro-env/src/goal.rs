//! Goal body and desired-goal sampling.

use nalgebra::Vector3;
use neuro_core::config::GoalConfig;
use neuro_core::error::EntityError;
use neuro_core::types::BodyId;
use neuro_sim::backend::SimulationBackend;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use tracing::debug;

use crate::entity::{SimEntity, load_description};

/// Orientation given to the goal body on every reset, as `[x, y, z, w]`.
pub const GOAL_ORIENTATION: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

/// Chance that a sampled goal lies on the table surface.
pub const FLOOR_GOAL_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct Goal {
    config: GoalConfig,
    body: Option<BodyId>,
    rng: Option<ChaCha8Rng>,
    desired_goal: Option<Vector3<f32>>,
    target_position: Option<Vector3<f32>>,
}

impl Goal {
    pub const fn new(config: GoalConfig) -> Self {
        Self {
            config,
            body: None,
            rng: None,
            desired_goal: None,
            target_position: None,
        }
    }

    pub const fn config(&self) -> &GoalConfig {
        &self.config
    }

    /// Inject the random source used by every sampler.
    pub fn set_rng(&mut self, rng: ChaCha8Rng) {
        self.rng = Some(rng);
    }

    pub const fn has_rng(&self) -> bool {
        self.rng.is_some()
    }

    /// Place the goal body, then draw a fresh desired goal.
    ///
    /// With `sample == false` the body returns to its configured start.
    pub fn reset<B: SimulationBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        sample: bool,
    ) -> Result<(), EntityError> {
        let position = if sample {
            self.sample_target()?
        } else {
            Vector3::from(self.config.init_position)
        };
        self.set_pose(backend, position, GOAL_ORIENTATION)?;
        self.sample_goal()?;
        self.target_position = Some(self.position(backend)?);
        Ok(())
    }

    /// Draw a new desired goal inside the goal range, lifted by half the
    /// object size.
    pub fn sample_goal(&mut self) -> Result<Vector3<f32>, EntityError> {
        let low = self.config.goal_range_low;
        let high = self.config.goal_range_high;
        let lift = self.config.half_size();
        let rng = self.rng.as_mut().ok_or(EntityError::RandomSourceMissing)?;

        let mut noise = sample_box(rng, low, high);
        if rng.gen_bool(FLOOR_GOAL_PROBABILITY) {
            noise.z = 0.0;
        }
        let goal = Vector3::new(0.0, 0.0, lift) + noise;
        debug!(goal = ?goal.as_slice(), "sampled desired goal");
        self.desired_goal = Some(goal);
        Ok(goal)
    }

    /// Draw a start position for the goal body on the table plane.
    pub fn sample_target(&mut self) -> Result<Vector3<f32>, EntityError> {
        let low = self.config.target_range_low();
        let high = self.config.target_range_high();
        let lift = self.config.half_size();
        let rng = self.rng.as_mut().ok_or(EntityError::RandomSourceMissing)?;
        Ok(Vector3::new(0.0, 0.0, lift) + sample_box(rng, low, high))
    }

    /// Current goal-body position.
    pub fn observation<B: SimulationBackend + ?Sized>(&self, backend: &B) -> Result<[f32; 3], EntityError> {
        let p = self.position(backend)?;
        Ok([p.x, p.y, p.z])
    }

    /// Last sampled desired goal.
    pub const fn desired_goal(&self) -> Option<Vector3<f32>> {
        self.desired_goal
    }

    /// Goal-body position recorded at the end of the last reset.
    pub const fn target_position(&self) -> Option<Vector3<f32>> {
        self.target_position
    }
}

impl SimEntity for Goal {
    fn name(&self) -> &'static str {
        "Goal"
    }

    fn body_id(&self) -> Option<BodyId> {
        self.body
    }

    fn load<B: SimulationBackend + ?Sized>(&mut self, backend: &mut B) -> Result<BodyId, EntityError> {
        let id = load_description(
            backend,
            self.name(),
            &self.config.description,
            self.config.init_position,
            false,
        )?;
        self.body = Some(id);
        Ok(id)
    }
}

/// Uniform sample in the closed box `[low, high]`.
fn sample_box(rng: &mut ChaCha8Rng, low: [f32; 3], high: [f32; 3]) -> Vector3<f32> {
    Vector3::from_fn(|axis, _| Uniform::new_inclusive(low[axis], high[axis]).sample(rng))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use neuro_test_utils::{RecordingBackend, scene, seeded_rng};

    fn seeded_goal(seed: u64) -> Goal {
        let mut goal = Goal::new(scene::panda_goal_config());
        goal.set_rng(seeded_rng(seed));
        goal
    }

    fn in_range(value: Vector3<f32>, low: [f32; 3], high: [f32; 3], lift: f32) -> bool {
        (0..3).all(|i| {
            let offset = if i == 2 { lift } else { 0.0 };
            value[i] >= low[i] + offset - 1e-6 && value[i] <= high[i] + offset + 1e-6
        })
    }

    // -- Sampling --

    #[test]
    fn sampling_without_rng_fails() {
        let mut goal = Goal::new(scene::panda_goal_config());
        assert!(matches!(
            goal.sample_goal().unwrap_err(),
            EntityError::RandomSourceMissing
        ));
        assert!(goal.sample_target().is_err());
        assert!(goal.desired_goal().is_none());
    }

    #[test]
    fn sampled_goal_stays_in_range() {
        let mut goal = seeded_goal(7);
        let config = goal.config().clone();
        for _ in 0..200 {
            let g = goal.sample_goal().unwrap();
            assert!(in_range(g, config.goal_range_low, config.goal_range_high, 0.02));
            assert_eq!(goal.desired_goal(), Some(g));
        }
    }

    #[test]
    fn sampled_target_lies_on_surface() {
        let mut goal = seeded_goal(11);
        for _ in 0..50 {
            let t = goal.sample_target().unwrap();
            assert_relative_eq!(t.z, 0.02);
            assert!((0.4..=0.8).contains(&t.x));
            assert!((-0.1..=0.1).contains(&t.y));
        }
    }

    #[test]
    fn floor_goal_bias_is_about_thirty_percent() {
        let mut goal = seeded_goal(2024);
        let n = 5000;
        let on_floor = (0..n)
            .filter(|_| {
                let g = goal.sample_goal().unwrap();
                (g.z - 0.02).abs() < f32::EPSILON
            })
            .count();
        #[allow(clippy::cast_precision_loss)]
        let fraction = on_floor as f64 / f64::from(n);
        assert!((0.27..0.33).contains(&fraction), "fraction = {fraction}");
    }

    #[test]
    fn same_seed_same_goals() {
        let mut a = seeded_goal(5);
        let mut b = seeded_goal(5);
        for _ in 0..10 {
            assert_eq!(a.sample_goal().unwrap(), b.sample_goal().unwrap());
        }
    }

    // -- Reset --

    #[test]
    fn reset_without_sampling_restores_init_pose() {
        let mut backend = RecordingBackend::new();
        let mut goal = seeded_goal(1);
        goal.load(&mut backend).unwrap();
        goal.set_pose(&mut backend, Vector3::new(1.0, 1.0, 1.0), [0.0, 0.0, 0.0])
            .unwrap();

        goal.reset(&mut backend, false).unwrap();
        let pose = goal.pose(&backend).unwrap();
        assert_relative_eq!(pose.position, Vector3::new(0.6, 0.0, 0.02));
        assert_relative_eq!(pose.orientation.angle(), std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
        assert_eq!(goal.target_position(), Some(pose.position));
        assert!(goal.desired_goal().is_some());
        assert_eq!(goal.observation(&backend).unwrap(), [0.6, 0.0, 0.02]);
    }

    #[test]
    fn reset_with_sampling_moves_body_on_surface() {
        let mut backend = RecordingBackend::new();
        let mut goal = seeded_goal(3);
        goal.load(&mut backend).unwrap();
        goal.reset(&mut backend, true).unwrap();
        let position = goal.pose(&backend).unwrap().position;
        assert_relative_eq!(position.z, 0.02);
        assert_eq!(goal.target_position(), Some(position));
    }

    #[test]
    fn reset_before_load_fails() {
        let mut backend = RecordingBackend::new();
        let mut goal = seeded_goal(1);
        assert!(matches!(
            goal.reset(&mut backend, false).unwrap_err(),
            EntityError::NotLoaded { entity: "Goal" }
        ));
    }
}
