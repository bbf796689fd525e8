use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion,
};
use isosurf::{IsoSurface, Mesh, ObjectProperties, Settings};
use nalgebra::Vector3;

/// Fills the surface's grid with a wobbly sphere
fn blob(n: usize, settings: Settings) -> IsoSurface {
    let mut iso = IsoSurface::new(settings);
    iso.initialize(n, n, n, Vector3::new(2.0, 2.0, 2.0)).unwrap();
    let (start, spacing) = (iso.start(), iso.spacing());
    let grid = iso.grid_mut().unwrap();
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let p = start
                    + Vector3::new(i as f32, j as f32, k as f32)
                        .component_mul(&spacing);
                let wobble = (p.x * 7.0).sin() * (p.y * 5.0).cos() * 0.05;
                *grid.get_mut(i, j, k) = p.norm() + wobble;
            }
        }
    }
    iso
}

pub fn triangulate_size_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("speed vs grid size (marching cubes)");
    for n in [16, 32, 64, 96] {
        let iso = &blob(n, Settings::default());
        group.bench_function(BenchmarkId::new("triangulate", n), move |b| {
            b.iter(|| {
                let mut iso = iso.clone();
                iso.triangulate().unwrap();
                black_box(iso.triangle_count())
            })
        });
    }
}

pub fn post_process(c: &mut Criterion) {
    let mut group =
        c.benchmark_group("speed vs post-processing (blob) (grid 48)");
    let configs = [
        ("none", Settings::default()),
        (
            "subdiv1",
            Settings {
                loop_subdivs: 1,
                ..Default::default()
            },
        ),
        (
            "smooth_surface",
            Settings {
                smooth_surface: 0.05,
                ..Default::default()
            },
        ),
        (
            "smooth_normals",
            Settings {
                smooth_normals: 0.05,
                ..Default::default()
            },
        ),
    ];
    for (name, settings) in configs {
        let iso = &blob(48, settings);
        group.bench_function(BenchmarkId::new("get_triangles", name), move |b| {
            b.iter(|| {
                let mut iso = iso.clone();
                let mut mesh = Mesh::new();
                iso.append_to(&mut mesh, &ObjectProperties::default())
                    .unwrap();
                black_box(mesh)
            })
        });
    }
}

criterion_group!(benches, triangulate_size_sweep, post_process);
criterion_main!(benches);
