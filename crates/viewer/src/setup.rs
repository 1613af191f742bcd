use crate::config::ViewerConfig;
use cubescene_common::{Color, EntityId, Transform, Viewport};
use cubescene_scene::{
    AxesHelper, Entity, EntityKind, Geometry, GridHelper, Material, PerspectiveCamera, Scene,
};
use glam::Vec3;

/// The populated scene plus the id of the one entity that animates.
#[derive(Debug, Clone)]
pub struct DemoScene {
    pub scene: Scene,
    pub cube: EntityId,
}

/// Ground plane, raised cube, grid and axes.
pub fn build_scene(config: &ViewerConfig) -> DemoScene {
    let mut scene = Scene::new(Color::from_hex(config.background));

    // Plane geometry faces +Z; lay it flat.
    scene.add(
        Entity::new(
            "ground",
            EntityKind::Mesh {
                geometry: Geometry::Plane {
                    width: config.ground.size,
                    height: config.ground.size,
                },
                material: Material::Basic {
                    color: Color::from_hex(config.ground.color),
                    double_sided: true,
                },
            },
        )
        .with_transform(Transform {
            rotation: Vec3::new(-std::f32::consts::FRAC_PI_2, 0.0, 0.0),
            ..Transform::default()
        }),
    );

    let size = config.cube.size;
    let cube = scene.add(
        Entity::new(
            "cube",
            EntityKind::Mesh {
                geometry: Geometry::Box {
                    width: size,
                    height: size,
                    depth: size,
                },
                material: Material::Normal,
            },
        )
        .with_transform(Transform::at(Vec3::new(0.0, config.cube.elevation, 0.0))),
    );

    scene.add(Entity::new(
        "grid",
        EntityKind::Grid(GridHelper {
            size: config.grid.size,
            divisions: config.grid.divisions,
            ..GridHelper::default()
        }),
    ));
    scene.add(Entity::new(
        "axes",
        EntityKind::Axes(AxesHelper {
            size: config.axes_size,
        }),
    ));

    DemoScene { scene, cube }
}

/// Camera sized to `viewport`, placed off-axis and aimed at the configured target.
pub fn build_camera(config: &ViewerConfig, viewport: Viewport) -> PerspectiveCamera {
    let c = &config.camera;
    let mut camera = PerspectiveCamera::new(c.fov, viewport.aspect(), c.near, c.far);
    camera.set_position(Vec3::from(c.position));
    camera.look_at(Vec3::from(c.target));
    camera
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_scene_has_one_of_each() {
        let demo = build_scene(&ViewerConfig::default());
        let scene = &demo.scene;
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.count_kind("plane"), 1);
        assert_eq!(scene.count_kind("box"), 1);
        assert_eq!(scene.count_kind("grid"), 1);
        assert_eq!(scene.count_kind("axes"), 1);
        assert_eq!(scene.find("cube"), Some(demo.cube));
        assert_eq!(scene.background().to_hex(), 0x1a1a1a);
    }

    #[test]
    fn cube_sits_on_the_ground() {
        let demo = build_scene(&ViewerConfig::default());
        let cube = demo.scene.get(demo.cube).unwrap();
        assert_eq!(cube.transform.position, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(cube.transform.rotation, Vec3::ZERO);
        assert!(matches!(
            cube.kind,
            EntityKind::Mesh {
                material: Material::Normal,
                ..
            }
        ));
    }

    #[test]
    fn ground_lies_horizontal() {
        let demo = build_scene(&ViewerConfig::default());
        let ground = demo.scene.get(demo.scene.find("ground").unwrap()).unwrap();
        let normal = ground.transform.model_matrix().transform_vector3(Vec3::Z);
        assert!(normal.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn camera_matches_viewport_and_config() {
        let camera = build_camera(&ViewerConfig::default(), Viewport::new(1280, 720));
        assert!((camera.aspect - 1280.0 / 720.0).abs() < 1e-6);
        assert_eq!(camera.fov, 75.0);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
        assert_eq!(camera.position, Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(camera.target, Vec3::ZERO);
    }
}
