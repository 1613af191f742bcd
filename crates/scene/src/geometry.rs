use cubescene_common::Color;
use serde::{Deserialize, Serialize};

/// A triangle-mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// A line-list vertex with its own color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

/// Procedural surface geometry, centered on the local origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Flat rectangle in the local XY plane, facing +Z.
    Plane { width: f32, height: f32 },
    /// Axis-aligned box.
    Box { width: f32, height: f32, depth: f32 },
}

impl Geometry {
    pub fn unit_box() -> Self {
        Geometry::Box {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        }
    }

    pub fn mesh_data(&self) -> MeshData {
        match *self {
            Geometry::Plane { width, height } => plane_mesh(width, height),
            Geometry::Box {
                width,
                height,
                depth,
            } => box_mesh(width, height, depth),
        }
    }
}

fn plane_mesh(width: f32, height: f32) -> MeshData {
    let (w, h) = (width / 2.0, height / 2.0);
    let n = [0.0, 0.0, 1.0];
    MeshData {
        vertices: vec![
            MeshVertex { position: [-w, -h, 0.0], normal: n },
            MeshVertex { position: [w, -h, 0.0], normal: n },
            MeshVertex { position: [w, h, 0.0], normal: n },
            MeshVertex { position: [-w, h, 0.0], normal: n },
        ],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

fn box_mesh(width: f32, height: f32, depth: f32) -> MeshData {
    let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
    let v = |position: [f32; 3], normal: [f32; 3]| MeshVertex { position, normal };
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        v([-x, -y,  z], [0.0, 0.0, 1.0]),
        v([ x, -y,  z], [0.0, 0.0, 1.0]),
        v([ x,  y,  z], [0.0, 0.0, 1.0]),
        v([-x,  y,  z], [0.0, 0.0, 1.0]),
        // -Z face
        v([ x, -y, -z], [0.0, 0.0, -1.0]),
        v([-x, -y, -z], [0.0, 0.0, -1.0]),
        v([-x,  y, -z], [0.0, 0.0, -1.0]),
        v([ x,  y, -z], [0.0, 0.0, -1.0]),
        // +X face
        v([ x, -y,  z], [1.0, 0.0, 0.0]),
        v([ x, -y, -z], [1.0, 0.0, 0.0]),
        v([ x,  y, -z], [1.0, 0.0, 0.0]),
        v([ x,  y,  z], [1.0, 0.0, 0.0]),
        // -X face
        v([-x, -y, -z], [-1.0, 0.0, 0.0]),
        v([-x, -y,  z], [-1.0, 0.0, 0.0]),
        v([-x,  y,  z], [-1.0, 0.0, 0.0]),
        v([-x,  y, -z], [-1.0, 0.0, 0.0]),
        // +Y face
        v([-x,  y,  z], [0.0, 1.0, 0.0]),
        v([ x,  y,  z], [0.0, 1.0, 0.0]),
        v([ x,  y, -z], [0.0, 1.0, 0.0]),
        v([-x,  y, -z], [0.0, 1.0, 0.0]),
        // -Y face
        v([-x, -y, -z], [0.0, -1.0, 0.0]),
        v([ x, -y, -z], [0.0, -1.0, 0.0]),
        v([ x, -y,  z], [0.0, -1.0, 0.0]),
        v([-x, -y,  z], [0.0, -1.0, 0.0]),
    ];
    let indices = (0..6u16)
        .flat_map(|face| {
            let b = face * 4;
            [b, b + 1, b + 2, b + 2, b + 3, b]
        })
        .collect();
    MeshData { vertices, indices }
}

/// Square grid on the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridHelper {
    pub size: f32,
    pub divisions: u32,
    pub center_color: Color,
    pub line_color: Color,
}

impl Default for GridHelper {
    fn default() -> Self {
        Self {
            size: 10.0,
            divisions: 10,
            center_color: Color::from_hex(0x444444),
            line_color: Color::from_hex(0x888888),
        }
    }
}

impl GridHelper {
    /// Line-list vertices: one X-parallel and one Z-parallel line per division step.
    pub fn lines(&self) -> Vec<LineVertex> {
        let divisions = self.divisions.max(1);
        let half = self.size / 2.0;
        let step = self.size / divisions as f32;
        let center = divisions / 2;
        let mut verts = Vec::with_capacity((divisions as usize + 1) * 4);

        for i in 0..=divisions {
            let k = -half + i as f32 * step;
            let color = if i == center {
                self.center_color
            } else {
                self.line_color
            };
            let c = [color.r, color.g, color.b];
            // Lines along X
            verts.push(LineVertex { position: [-half, 0.0, k], color: c });
            verts.push(LineVertex { position: [half, 0.0, k], color: c });
            // Lines along Z
            verts.push(LineVertex { position: [k, 0.0, -half], color: c });
            verts.push(LineVertex { position: [k, 0.0, half], color: c });
        }
        verts
    }
}

/// Three colored segments from the origin: X red, Y green, Z blue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxesHelper {
    pub size: f32,
}

impl Default for AxesHelper {
    fn default() -> Self {
        Self { size: 1.0 }
    }
}

impl AxesHelper {
    pub fn lines(&self) -> Vec<LineVertex> {
        let s = self.size;
        let segment = |end: [f32; 3], color: [f32; 3]| {
            [
                LineVertex { position: [0.0; 3], color },
                LineVertex { position: end, color },
            ]
        };
        let mut verts = Vec::with_capacity(6);
        verts.extend(segment([s, 0.0, 0.0], [1.0, 0.0, 0.0]));
        verts.extend(segment([0.0, s, 0.0], [0.0, 1.0, 0.0]));
        verts.extend(segment([0.0, 0.0, s], [0.0, 0.0, 1.0]));
        verts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_box_has_six_quads() {
        let mesh = Geometry::unit_box().mesh_data();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        for v in &mesh.vertices {
            assert!(v.position.iter().all(|c| c.abs() == 0.5));
        }
    }

    #[test]
    fn box_faces_wind_outward() {
        let mesh = Geometry::Box {
            width: 2.0,
            height: 4.0,
            depth: 6.0,
        }
        .mesh_data();
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| glam::Vec3::from(mesh.vertices[tri[k] as usize].position));
            let face_normal = (b - a).cross(c - a).normalize();
            let declared = glam::Vec3::from(mesh.vertices[tri[0] as usize].normal);
            assert!(face_normal.abs_diff_eq(declared, 1e-5));
        }
    }

    #[test]
    fn plane_is_flat_and_faces_z() {
        let mesh = Geometry::Plane {
            width: 10.0,
            height: 10.0,
        }
        .mesh_data();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.vertices.iter().all(|v| v.position[2] == 0.0));
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert_eq!(mesh.vertices[2].position, [5.0, 5.0, 0.0]);
    }

    #[test]
    fn default_grid_line_count_and_extent() {
        let grid = GridHelper::default();
        let lines = grid.lines();
        // 11 steps, two lines each, two vertices per line.
        assert_eq!(lines.len(), 44);
        assert!(lines.iter().all(|v| v.position[1] == 0.0));
        assert!(
            lines
                .iter()
                .all(|v| v.position[0].abs() <= 5.0 && v.position[2].abs() <= 5.0)
        );
    }

    #[test]
    fn grid_center_lines_use_center_color() {
        let grid = GridHelper::default();
        let center = grid.center_color;
        let centered: Vec<_> = grid
            .lines()
            .into_iter()
            .filter(|v| v.color == [center.r, center.g, center.b])
            .collect();
        assert_eq!(centered.len(), 4);
        assert!(
            centered
                .iter()
                .all(|v| v.position[0] == 0.0 || v.position[2] == 0.0)
        );
    }

    #[test]
    fn axes_are_colored_by_axis() {
        let lines = AxesHelper { size: 2.0 }.lines();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1].position, [2.0, 0.0, 0.0]);
        assert_eq!(lines[1].color, [1.0, 0.0, 0.0]);
        assert_eq!(lines[3].position, [0.0, 2.0, 0.0]);
        assert_eq!(lines[3].color, [0.0, 1.0, 0.0]);
        assert_eq!(lines[5].position, [0.0, 0.0, 2.0]);
        assert_eq!(lines[5].color, [0.0, 0.0, 1.0]);
    }
}
