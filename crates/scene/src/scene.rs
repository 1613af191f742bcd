use crate::geometry::{AxesHelper, Geometry, GridHelper};
use cubescene_common::{Color, EntityId, Transform};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Surface shading for mesh entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Material {
    /// Unlit flat color.
    Basic { color: Color, double_sided: bool },
    /// Color derived from the surface normal.
    Normal,
}

/// What an entity draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Mesh {
        geometry: Geometry,
        material: Material,
    },
    Grid(GridHelper),
    Axes(AxesHelper),
}

impl EntityKind {
    /// Short label used in debug output.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Mesh {
                geometry: Geometry::Plane { .. },
                ..
            } => "plane",
            EntityKind::Mesh {
                geometry: Geometry::Box { .. },
                ..
            } => "box",
            EntityKind::Grid(_) => "grid",
            EntityKind::Axes(_) => "axes",
        }
    }

    /// Whether back faces are drawn. Lines have no faces to cull.
    pub fn double_sided(&self) -> bool {
        match self {
            EntityKind::Mesh {
                material: Material::Basic { double_sided, .. },
                ..
            } => *double_sided,
            EntityKind::Mesh {
                material: Material::Normal,
                ..
            } => false,
            EntityKind::Grid(_) | EntityKind::Axes(_) => true,
        }
    }
}

/// A named, placed renderable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub transform: Transform,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// A container of renderable entities plus the clear color behind them.
///
/// Entities are addressed by the `EntityId` returned from [`Scene::add`]; the id
/// stays valid for as long as the scene lives, so callers that animate an entity
/// hold on to its id rather than searching for it every frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    background: Color,
    entities: BTreeMap<EntityId, Entity>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Color::from_hex(0x000000))
    }
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            entities: BTreeMap::new(),
        }
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Insert an entity and return its id.
    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = EntityId::new();
        tracing::trace!(id = %id.short(), name = %entity.name, kind = entity.kind.label(), "entity added");
        self.entities.insert(id, entity);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Read-only access to all entities (BTreeMap for deterministic iteration).
    pub fn entities(&self) -> &BTreeMap<EntityId, Entity> {
        &self.entities
    }

    /// First entity with the given name.
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, e)| e.name == name)
            .map(|(id, _)| *id)
    }

    /// Number of entities whose kind carries the given label.
    pub fn count_kind(&self, label: &str) -> usize {
        self.entities
            .values()
            .filter(|e| e.kind.label() == label)
            .count()
    }

    /// Add `delta` to an entity's Euler rotation. Returns false if the id is unknown.
    pub fn rotate(&mut self, id: EntityId, delta: Vec3) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.transform.rotation += delta;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> Entity {
        Entity::new(
            "cube",
            EntityKind::Mesh {
                geometry: Geometry::unit_box(),
                material: Material::Normal,
            },
        )
    }

    #[test]
    fn scene_starts_empty() {
        let scene = Scene::new(Color::from_hex(0x1a1a1a));
        assert!(scene.is_empty());
        assert_eq!(scene.background().to_hex(), 0x1a1a1a);
    }

    #[test]
    fn add_returns_stable_id() {
        let mut scene = Scene::default();
        let id = scene.add(cube());
        scene.add(Entity::new("axes", EntityKind::Axes(AxesHelper { size: 2.0 })));
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.get(id).map(|e| e.name.as_str()), Some("cube"));
        assert_eq!(scene.find("cube"), Some(id));
        assert_eq!(scene.find("missing"), None);
    }

    #[test]
    fn rotate_accumulates_on_the_same_entity() {
        let mut scene = Scene::default();
        let id = scene.add(cube());
        for _ in 0..10 {
            assert!(scene.rotate(id, Vec3::new(0.01, 0.01, 0.0)));
        }
        let rotation = scene.get(id).unwrap().transform.rotation;
        assert!((rotation.x - 0.1).abs() < 1e-5);
        assert!((rotation.y - 0.1).abs() < 1e-5);
        assert_eq!(rotation.z, 0.0);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn rotate_unknown_id_is_rejected() {
        let mut scene = Scene::default();
        assert!(!scene.rotate(EntityId::new(), Vec3::X));
    }

    #[test]
    fn kind_labels_and_counts() {
        let mut scene = Scene::default();
        scene.add(cube());
        scene.add(Entity::new(
            "ground",
            EntityKind::Mesh {
                geometry: Geometry::Plane {
                    width: 10.0,
                    height: 10.0,
                },
                material: Material::Basic {
                    color: Color::WHITE,
                    double_sided: true,
                },
            },
        ));
        scene.add(Entity::new("grid", EntityKind::Grid(GridHelper::default())));
        assert_eq!(scene.count_kind("box"), 1);
        assert_eq!(scene.count_kind("plane"), 1);
        assert_eq!(scene.count_kind("grid"), 1);
        assert_eq!(scene.count_kind("axes"), 0);
        let ground = scene.get(scene.find("ground").unwrap()).unwrap();
        assert!(ground.kind.double_sided());
        assert!(!cube().kind.double_sided());
    }

    #[test]
    fn btreemap_gives_deterministic_iteration() {
        let mut scene = Scene::default();
        for _ in 0..50 {
            scene.add(cube());
        }
        let keys: Vec<EntityId> = scene.entities().keys().copied().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
