use proptest::prelude::*;

use wss_tsvi::algs::gradient::{GradientOperator, GradientWeighting};
use wss_tsvi::algs::normalize::normalize;
use wss_tsvi::algs::reduction::{TemporalAccumulator, reduce_samples};
use wss_tsvi::config::CycleParameters;
use wss_tsvi::data::field::{ScalarField, VectorField};
use wss_tsvi::topology::surface::TriangleMesh;

fn coord() -> impl Strategy<Value = f64> {
    -10.0f64..10.0
}

fn point() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(coord())
}

fn matrix() -> impl Strategy<Value = [[f64; 3]; 3]> {
    prop::array::uniform3(prop::array::uniform3(-5.0f64..5.0))
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm2(a: [f64; 3]) -> f64 {
    a[0] * a[0] + a[1] * a[1] + a[2] * a[2]
}

fn apply(a: &[[f64; 3]; 3], b: [f64; 3], x: [f64; 3]) -> [f64; 3] {
    let mut out = b;
    for i in 0..3 {
        for j in 0..3 {
            out[i] += a[i][j] * x[j];
        }
    }
    out
}

/// Well-shaped triangle: area bounded below relative to its longest edge.
fn shapely(p: &[[f64; 3]; 3]) -> bool {
    let n = cross(sub(p[1], p[0]), sub(p[2], p[0]));
    let longest = [sub(p[1], p[0]), sub(p[2], p[1]), sub(p[0], p[2])]
        .into_iter()
        .map(norm2)
        .fold(0.0, f64::max);
    longest > 1e-2 && norm2(n).sqrt() > 0.2 * longest
}

/// Hexagonal fan in z = 0: centre vertex 0 and a jittered ring 1..=6.
fn fan(jitter: &[(f64, f64)]) -> TriangleMesh {
    let mut positions = vec![[0.0, 0.0, 0.0]];
    for (k, &(dr, da)) in jitter.iter().enumerate() {
        let angle = std::f64::consts::FRAC_PI_3 * k as f64 + da;
        let r = 1.0 + dr;
        positions.push([r * angle.cos(), r * angle.sin(), 0.0]);
    }
    let faces = (0..6).map(|k| [0, 1 + k, 1 + (k + 1) % 6]).collect();
    TriangleMesh::try_new(positions, faces).unwrap()
}

fn per_cycle(samples: usize) -> CycleParameters {
    CycleParameters::try_new(samples as f64, 1.0, 1.0).unwrap()
}

proptest! {
    #[test]
    fn prop_normalized_rows_have_unit_norm(
        rows in prop::collection::vec(prop::array::uniform3(-1e3f64..1e3), 1..32),
    ) {
        prop_assume!(rows.iter().all(|r| norm2(*r) > 1e-6));
        let field = VectorField::new(rows.clone());
        let out = normalize(&field);
        prop_assert!(out.degenerate.is_empty());
        for (v, u) in out.unit.as_slice().iter().enumerate() {
            prop_assert!((norm2(*u).sqrt() - 1.0).abs() < 1e-9);
            prop_assert!((out.magnitude[v] - norm2(rows[v]).sqrt()).abs() <= 1e-12 * out.magnitude[v].max(1.0));
        }
    }

    #[test]
    fn prop_repeated_sample_has_zero_tsvi(
        values in prop::collection::vec(-1e3f64..1e3, 1..16),
        n in 1usize..8,
    ) {
        let samples = vec![ScalarField::new(values); n];
        let stats = reduce_samples(&samples, &per_cycle(n)).unwrap();
        prop_assert!(stats.tsvi.as_slice().iter().all(|&t| t == 0.0));
    }

    #[test]
    fn prop_constant_offset_leaves_tsvi_unchanged(
        series in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 4), 2..8),
        offset in -100.0f64..100.0,
    ) {
        let n = series.len();
        let base: Vec<_> = series.iter().cloned().map(ScalarField::new).collect();
        let shifted: Vec<_> = series
            .iter()
            .map(|s| ScalarField::new(s.iter().map(|x| x + offset).collect()))
            .collect();
        let a = reduce_samples(&base, &per_cycle(n)).unwrap();
        let b = reduce_samples(&shifted, &per_cycle(n)).unwrap();
        for v in 0..4 {
            let (ta, tb) = (a.tsvi[v], b.tsvi[v]);
            prop_assert!((ta * ta - tb * tb).abs() < 1e-9 * (1.0 + ta * ta));
            prop_assert!((b.mean[v] - a.mean[v] - offset).abs() < 1e-9 * (1.0 + offset.abs()));
        }
    }

    #[test]
    fn prop_merged_accumulators_match_serial(
        series in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 3), 2..10),
        split in 0usize..10,
    ) {
        let n = series.len();
        let split = split.min(n);
        let fields: Vec<_> = series.into_iter().map(ScalarField::new).collect();

        let serial = reduce_samples(&fields, &per_cycle(n)).unwrap();

        let mut left = TemporalAccumulator::new(3);
        let mut right = TemporalAccumulator::new(3);
        for f in &fields[..split] {
            left.push(f).unwrap();
        }
        for f in &fields[split..] {
            right.push(f).unwrap();
        }
        let merged = left.merge(right).unwrap().finish(&per_cycle(n)).unwrap();
        for v in 0..3 {
            prop_assert!((merged.mean[v] - serial.mean[v]).abs() < 1e-9);
            prop_assert!((merged.tsvi[v] - serial.tsvi[v]).abs() < 1e-7);
        }
    }

    #[test]
    fn prop_linear_field_gradient_is_exact_in_plane(
        p in prop::array::uniform3(point()),
        a in matrix(),
        b in point(),
    ) {
        prop_assume!(shapely(&p));
        let mesh = TriangleMesh::try_new(p.to_vec(), vec![[0, 1, 2]]).unwrap();
        let field = VectorField::new(p.iter().map(|&x| apply(&a, b, x)).collect());

        // J = A (I - n n^T): the surface gradient drops the normal derivative
        let n = cross(sub(p[1], p[0]), sub(p[2], p[0]));
        let nn = norm2(n);
        let projected = |i: usize, j: usize| {
            (0..3)
                .map(|k| {
                    let delta = if k == j { 1.0 } else { 0.0 };
                    a[i][k] * (delta - n[k] * n[j] / nn)
                })
                .sum::<f64>()
        };

        for weighting in [GradientWeighting::Uniform, GradientWeighting::Area] {
            let gradient = GradientOperator::new(&mesh, weighting).apply(&field).unwrap();
            for jac in &gradient.jacobians {
                for i in 0..3 {
                    for j in 0..3 {
                        prop_assert!((jac.get(i, j) - projected(i, j)).abs() < 1e-8);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_weightings_agree_on_planar_linear_field(
        jitter in prop::collection::vec((-0.3f64..0.3, -0.3f64..0.3), 6),
        a in matrix(),
        b in point(),
    ) {
        let mesh = fan(&jitter);
        let field = VectorField::new(mesh.positions().iter().map(|&x| apply(&a, b, x)).collect());

        let uniform = GradientOperator::new(&mesh, GradientWeighting::Uniform).divergence(&field).unwrap();
        let area = GradientOperator::new(&mesh, GradientWeighting::Area).divergence(&field).unwrap();
        for v in 0..mesh.vertex_count() {
            prop_assert!((uniform[v] - (a[0][0] + a[1][1])).abs() < 1e-9);
            prop_assert!((uniform[v] - area[v]).abs() < 1e-9);
        }
    }
}
