//! Static scenery: ground plane, table and tray.

use neuro_core::config::StaticBodyConfig;
use neuro_core::error::EntityError;
use neuro_core::types::BodyId;
use neuro_sim::backend::SimulationBackend;

use crate::entity::{SimEntity, load_description};

/// Which piece of scenery a [`StaticBody`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticKind {
    Plane,
    Table,
    Tray,
}

impl StaticKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Plane => "Plane",
            Self::Table => "Table",
            Self::Tray => "Tray",
        }
    }
}

/// A body loaded once and never driven.
#[derive(Debug, Clone)]
pub struct StaticBody {
    kind: StaticKind,
    config: StaticBodyConfig,
    body: Option<BodyId>,
}

impl StaticBody {
    pub const fn new(kind: StaticKind, config: StaticBodyConfig) -> Self {
        Self {
            kind,
            config,
            body: None,
        }
    }

    pub const fn plane(config: StaticBodyConfig) -> Self {
        Self::new(StaticKind::Plane, config)
    }

    pub const fn table(config: StaticBodyConfig) -> Self {
        Self::new(StaticKind::Table, config)
    }

    pub const fn tray(config: StaticBodyConfig) -> Self {
        Self::new(StaticKind::Tray, config)
    }

    pub const fn kind(&self) -> StaticKind {
        self.kind
    }
}

impl SimEntity for StaticBody {
    fn name(&self) -> &'static str {
        self.kind.label()
    }

    fn body_id(&self) -> Option<BodyId> {
        self.body
    }

    fn load<B: SimulationBackend + ?Sized>(&mut self, backend: &mut B) -> Result<BodyId, EntityError> {
        // Only the plane is anchored.
        let fixed_base = self.kind == StaticKind::Plane;
        let id = load_description(
            backend,
            self.name(),
            &self.config.description,
            self.config.init_position,
            fixed_base,
        )?;
        self.body = Some(id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuro_test_utils::{BackendCall, RecordingBackend, scene};

    #[test]
    fn loads_at_configured_position() {
        let mut backend = RecordingBackend::new();
        let mut table = StaticBody::table(StaticBodyConfig::new(
            scene::asset("urdf/table.urdf"),
            [0.5, 0.0, -0.4],
        ));
        assert_eq!(table.name(), "Table");
        let id = table.load(&mut backend).unwrap();
        assert_eq!(table.body_id(), Some(id));
        assert!(matches!(
            &backend.calls()[0],
            BackendCall::LoadBody { fixed_base: false, .. }
        ));
    }

    #[test]
    fn plane_is_fixed() {
        let mut backend = RecordingBackend::new();
        let mut plane = StaticBody::plane(StaticBodyConfig::new(
            scene::asset("urdf/plane.urdf"),
            [0.0, 0.0, -0.4],
        ));
        plane.load(&mut backend).unwrap();
        assert!(matches!(
            &backend.calls()[0],
            BackendCall::LoadBody { fixed_base: true, .. }
        ));
        assert_eq!(plane.kind(), StaticKind::Plane);
    }
}
