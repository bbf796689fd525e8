use approx::assert_relative_eq;
use isosurf::{
    Error, IsoSurface, Mesh, NormalMode, ObjectProperties, Settings,
    TriangleFlags,
};
use nalgebra::Vector3;
use strum::IntoEnumIterator;

const RADIUS: f32 = 0.5;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds a surface holding the distance field of a sphere at the origin
fn sphere(n: usize, settings: Settings) -> IsoSurface {
    init_logger();
    let mut iso = IsoSurface::new(Settings {
        iso_value: RADIUS,
        ..settings
    });
    iso.initialize(n, n, n, Vector3::new(2.0, 2.0, 2.0)).unwrap();
    let (start, spacing) = (iso.start(), iso.spacing());
    let grid = iso.grid_mut().unwrap();
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let p = start
                    + Vector3::new(i as f32, j as f32, k as f32)
                        .component_mul(&spacing);
                *grid.get_mut(i, j, k) = p.norm();
            }
        }
    }
    iso
}

fn check_mesh(iso: &IsoSurface) {
    assert!(iso.triangle_count() > 0);
    assert_eq!(iso.indices().len() % 3, 0);
    for &i in iso.indices() {
        assert!(i < iso.vertex_count(), "index {i} out of range");
    }
    for v in iso.vertices() {
        assert_relative_eq!(v.normal.norm(), 1.0, epsilon = 1e-4);
    }
}

#[test]
fn sphere_vertices_lie_on_sphere() {
    let mut iso = sphere(20, Settings::default());
    iso.triangulate().unwrap();
    check_mesh(&iso);
    for v in iso.vertices() {
        let r = v.pos.norm();
        let p = v.pos;
        assert!((r - RADIUS).abs() < 0.02, "invalid vertex at {p:?}: {r}");
        // Normals follow the gradient downhill, i.e. towards the center
        assert!(v.normal.dot(&v.pos) < 0.0);
    }
}

#[test]
fn triangulation_is_deterministic() {
    let mut a = sphere(16, Settings::default());
    let mut b = sphere(16, Settings::default());
    a.triangulate().unwrap();
    b.triangulate().unwrap();
    assert_eq!(a.vertices(), b.vertices());
    assert_eq!(a.indices(), b.indices());

    // Re-running on the same field rebuilds the same mesh
    let (verts, indices) = (a.vertices().to_vec(), a.indices().to_vec());
    a.triangulate().unwrap();
    assert_eq!(a.vertices(), verts.as_slice());
    assert_eq!(a.indices(), indices.as_slice());
}

#[test]
fn changing_the_field_rebuilds_the_mesh() {
    let mut iso = sphere(16, Settings::default());
    iso.triangulate().unwrap();
    let before = iso.triangle_count();

    iso.grid_mut().unwrap().fill(1.0);
    iso.triangulate().unwrap();
    assert_eq!(iso.triangle_count(), 0);
    assert_eq!(iso.vertex_count(), 0);
    assert!(before > 0);
}

#[test]
fn subdivision_quadruples_triangles() {
    let mut base = sphere(12, Settings::default());
    base.triangulate().unwrap();

    let mut iso = sphere(
        12,
        Settings {
            loop_subdivs: 2,
            ..Default::default()
        },
    );
    iso.triangulate().unwrap();
    check_mesh(&iso);
    assert_eq!(iso.triangle_count(), base.triangle_count() * 16);
    assert!(iso.vertex_count() > base.vertex_count());
    for v in iso.vertices() {
        assert!((v.pos.norm() - RADIUS).abs() < 0.05);
    }
}

#[test]
fn normal_modes() {
    for mode in NormalMode::iter() {
        let mut iso = sphere(
            12,
            Settings {
                loop_subdivs: 1,
                normal_mode: mode,
                ..Default::default()
            },
        );
        iso.triangulate().unwrap();
        check_mesh(&iso);

        // Whichever way they face, normals agree with each other
        let signs: Vec<bool> = iso
            .vertices()
            .iter()
            .map(|v| v.normal.dot(&v.pos) > 0.0)
            .collect();
        assert!(
            signs.iter().all(|&s| s == signs[0]),
            "inconsistent normals with {mode:?}"
        );
    }
}

#[test]
fn smoothing() {
    let mut base = sphere(16, Settings::default());
    base.triangulate().unwrap();

    let settings = Settings {
        smooth_surface: 1.0,
        smooth_normals: 2.0,
        ..Default::default()
    }
    .scaled(0.05);
    let mut iso = sphere(16, settings);
    iso.triangulate().unwrap();
    check_mesh(&iso);

    // Smoothing moves vertices but keeps the topology
    assert_eq!(iso.indices(), base.indices());
    assert_ne!(iso.vertices(), base.vertices());
    for v in iso.vertices() {
        assert!((v.pos.norm() - RADIUS).abs() < 0.05);
        assert!(v.normal.dot(&v.pos) < 0.0);
    }
}

#[test]
fn output_parity_and_offsets() {
    let mut iso = sphere(12, Settings::default());
    let mut mesh = Mesh::new();
    // Something else already in the buffers
    mesh.vertices.extend([Vector3::zeros(); 5]);
    mesh.normals.extend([Vector3::z(); 5]);

    iso.append_to(&mut mesh, &ObjectProperties::default()).unwrap();
    assert_eq!(mesh.vertices.len(), mesh.normals.len());
    assert_eq!(mesh.vertices.len(), 5 + iso.vertex_count());
    assert_eq!(mesh.triangles.len(), iso.triangle_count());
    for (t, local) in mesh.triangles.iter().zip(iso.indices().chunks_exact(3)) {
        assert_eq!(t.points, [local[0] + 5, local[1] + 5, local[2] + 5]);
        assert!(t.flags.contains(TriangleFlags::GEOMETRY));
        assert!(t.flags.contains(TriangleFlags::NO_CAUSTICS));
    }
}

#[test]
fn output_requires_matching_buffers() {
    let mut iso = sphere(8, Settings::default());
    let mut mesh = Mesh::new();
    mesh.normals.push(Vector3::z());
    let err = iso
        .append_to(&mut mesh, &ObjectProperties::default())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MismatchedOutput {
            vertices: 0,
            normals: 1
        }
    ));
    assert!(mesh.triangles.is_empty());
}

#[test]
fn output_before_initialize() {
    init_logger();
    let mut iso = IsoSurface::new(Settings::default());
    let mut mesh = Mesh::new();
    iso.append_to(&mut mesh, &ObjectProperties::default()).unwrap();
    assert!(mesh.vertices.is_empty());
    assert!(mesh.triangles.is_empty());
    assert!(matches!(iso.triangulate(), Err(Error::NotInitialized)));
}

#[test]
fn flat_simulation_is_promoted() {
    init_logger();
    let mut iso = IsoSurface::new(Settings::default());
    iso.initialize(10, 10, 1, Vector3::new(1.0, 1.0, 0.5)).unwrap();
    assert_eq!(iso.grid().unwrap().size(), [10, 10, 5]);

    // Fluid fills the lower half in X
    let grid = iso.grid_mut().unwrap();
    for k in 0..5 {
        for j in 0..10 {
            for i in 0..10 {
                *grid.get_mut(i, j, k) = if i < 5 { 0.0 } else { 1.0 };
            }
        }
    }
    iso.triangulate().unwrap();
    check_mesh(&iso);

    let x = iso.start().x + 4.5 * iso.spacing().x;
    for v in iso.vertices() {
        assert_relative_eq!(v.pos.x, x, epsilon = 1e-5);
        assert_relative_eq!(v.normal, -Vector3::x(), epsilon = 1e-5);
    }
}

#[test]
fn stl_export() {
    let mut iso = sphere(10, Settings::default());
    let mut mesh = Mesh::new();
    iso.append_to(&mut mesh, &ObjectProperties::default()).unwrap();

    let mut out = vec![];
    mesh.write_stl(&mut out).unwrap();
    assert_eq!(out.len(), 84 + 50 * mesh.triangles.len());
}
