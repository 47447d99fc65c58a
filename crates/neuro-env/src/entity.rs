//! Lifecycle shared by every body placed in the simulator.

use std::path::Path;

use nalgebra::Vector3;
use neuro_core::error::EntityError;
use neuro_core::types::BodyId;
use neuro_sim::backend::SimulationBackend;
use neuro_sim::pose::{Orientation, Pose};

/// A body owned by the world. Pose operations need a loaded body.
pub trait SimEntity {
    /// Name used in error messages and logs.
    fn name(&self) -> &'static str;

    /// Backend handle, once loaded.
    fn body_id(&self) -> Option<BodyId>;

    /// Place the body in the simulator and remember its handle.
    fn load<B: SimulationBackend + ?Sized>(&mut self, backend: &mut B) -> Result<BodyId, EntityError>;

    fn loaded_id(&self) -> Result<BodyId, EntityError> {
        self.body_id()
            .ok_or(EntityError::NotLoaded { entity: self.name() })
    }

    fn pose<B: SimulationBackend + ?Sized>(&self, backend: &B) -> Result<Pose, EntityError> {
        Ok(backend.body_pose(self.loaded_id()?)?)
    }

    fn position<B: SimulationBackend + ?Sized>(&self, backend: &B) -> Result<Vector3<f32>, EntityError> {
        Ok(self.pose(backend)?.position)
    }

    /// Teleport the body. `orientation` is Euler `[r, p, y]` or `[x, y, z, w]`.
    fn set_pose<B: SimulationBackend + ?Sized>(
        &self,
        backend: &mut B,
        position: Vector3<f32>,
        orientation: impl Into<Orientation>,
    ) -> Result<(), EntityError> {
        let id = self.loaded_id()?;
        backend.set_body_pose(id, Pose::new(position, orientation))?;
        Ok(())
    }
}

/// Load `description` at `position` and log the handle.
pub(crate) fn load_description<B: SimulationBackend + ?Sized>(
    backend: &mut B,
    entity: &'static str,
    description: &Path,
    position: [f32; 3],
    fixed_base: bool,
) -> Result<BodyId, EntityError> {
    let id = backend.load_body(description, Vector3::from(position), fixed_base)?;
    tracing::debug!(entity, body = %id, path = %description.display(), "entity loaded");
    Ok(id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use neuro_test_utils::{RecordingBackend, scene};

    struct Crate {
        id: Option<BodyId>,
    }

    impl SimEntity for Crate {
        fn name(&self) -> &'static str {
            "Crate"
        }

        fn body_id(&self) -> Option<BodyId> {
            self.id
        }

        fn load<B: SimulationBackend + ?Sized>(&mut self, backend: &mut B) -> Result<BodyId, EntityError> {
            let id = load_description(backend, "Crate", &scene::asset("urdf/goal.urdf"), [0.1, 0.2, 0.3], false)?;
            self.id = Some(id);
            Ok(id)
        }
    }

    #[test]
    fn pose_before_load_fails() {
        let mut backend = RecordingBackend::new();
        let entity = Crate { id: None };
        let err = entity
            .set_pose(&mut backend, Vector3::zeros(), [0.0, 0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, EntityError::NotLoaded { entity: "Crate" }));
        assert!(entity.pose(&backend).is_err());
    }

    #[test]
    fn load_then_read_pose() {
        let mut backend = RecordingBackend::new();
        let mut entity = Crate { id: None };
        entity.load(&mut backend).unwrap();
        assert_relative_eq!(
            entity.position(&backend).unwrap(),
            Vector3::new(0.1, 0.2, 0.3)
        );
    }

    #[test]
    fn set_pose_accepts_euler_and_quaternion() {
        let mut backend = RecordingBackend::new();
        let mut entity = Crate { id: None };
        entity.load(&mut backend).unwrap();

        let target = Vector3::new(0.5, 0.0, 0.02);
        entity
            .set_pose(&mut backend, target, [0.0, 0.0, std::f32::consts::FRAC_PI_2])
            .unwrap();
        let from_euler = entity.pose(&backend).unwrap();

        entity.set_pose(&mut backend, target, [0.0, 0.0, 1.0, 1.0]).unwrap();
        let from_quat = entity.pose(&backend).unwrap();

        assert_relative_eq!(from_quat.position, target);
        assert!(from_euler.orientation.angle_to(&from_quat.orientation) < 1e-5);
    }
}
