//! Geometry metrics for triangles embedded in 3D.
//!
//! Triangles use the vertex ordering `[v0, v1, v2]` with edge vectors
//! `e1 = v1 - v0` and `e2 = v2 - v0`. The (unnormalized) normal is
//! `n = e1 x e2`, so `|n| = 2 * area`.
//!
//! [`TriangleFrame`] carries the two in-plane basis vectors that turn vertex
//! differences into a gradient: for an affine scalar `f` with
//! `df1 = f(v1) - f(v0)` and `df2 = f(v2) - f(v0)`,
//!
//! ```text
//! grad f = df1 * (e2 x n) / |n|^2 + df2 * (n x e1) / |n|^2
//! ```
//!
//! which satisfies `grad f . e1 = df1`, `grad f . e2 = df2` and
//! `grad f . n = 0`.

/// Relative tolerance below which a triangle counts as zero-area.
pub const EPS: f64 = 1e-12;

/// Precomputed per-triangle quantities used by gradient reconstruction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleFrame {
    /// Triangle area.
    pub area: f64,
    /// Unit normal, oriented by the vertex winding.
    pub normal: [f64; 3],
    /// `(e2 x n) / |n|^2`: gradient contribution of `f(v1) - f(v0)`.
    pub grad_e1: [f64; 3],
    /// `(n x e1) / |n|^2`: gradient contribution of `f(v2) - f(v0)`.
    pub grad_e2: [f64; 3],
}

impl TriangleFrame {
    /// Build the frame for a triangle, or `None` if it is degenerate.
    ///
    /// A triangle is degenerate when `|e1 x e2| <= EPS * max_edge^2` or when
    /// any coordinate is non-finite.
    pub fn try_new(vertices: &[[f64; 3]; 3]) -> Option<Self> {
        let e1 = sub(vertices[1], vertices[0]);
        let e2 = sub(vertices[2], vertices[0]);
        let e3 = sub(vertices[2], vertices[1]);
        let n = cross(e1, e2);
        let n2 = dot(n, n);
        let longest = dot(e1, e1).max(dot(e2, e2)).max(dot(e3, e3));
        if !n2.is_finite() || !longest.is_finite() || n2.sqrt() <= EPS * longest {
            return None;
        }
        let len = n2.sqrt();
        Some(Self {
            area: 0.5 * len,
            normal: scale(n, 1.0 / len),
            grad_e1: scale(cross(e2, n), 1.0 / n2),
            grad_e2: scale(cross(n, e1), 1.0 / n2),
        })
    }

    /// Gradient of the affine interpolant of `values` over the triangle.
    #[inline]
    pub fn gradient(&self, values: [f64; 3]) -> [f64; 3] {
        let df1 = values[1] - values[0];
        let df2 = values[2] - values[0];
        [
            df1 * self.grad_e1[0] + df2 * self.grad_e2[0],
            df1 * self.grad_e1[1] + df2 * self.grad_e2[1],
            df1 * self.grad_e1[2] + df2 * self.grad_e2[2],
        ]
    }
}

/// Unsigned area of a triangle.
pub fn triangle_area(vertices: &[[f64; 3]; 3]) -> f64 {
    0.5 * norm(cross(
        sub(vertices[1], vertices[0]),
        sub(vertices[2], vertices[0]),
    ))
}

#[inline]
pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn triangle_metrics() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert!(approx(triangle_area(&vertices), 0.5));
        let frame = TriangleFrame::try_new(&vertices).unwrap();
        assert!(approx(frame.area, 0.5));
        assert!(approx(frame.normal[2], 1.0));
    }

    #[test]
    fn gradient_reproduces_tilted_linear_field() {
        // plane x + y + z = 1, f = 2x - y + 3z
        let vertices = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let f = |p: [f64; 3]| 2.0 * p[0] - p[1] + 3.0 * p[2];
        let frame = TriangleFrame::try_new(&vertices).unwrap();
        let g = frame.gradient([f(vertices[0]), f(vertices[1]), f(vertices[2])]);
        // only the tangential part of (2, -1, 3) is recoverable
        let full = [2.0, -1.0, 3.0];
        let normal_part = dot(full, frame.normal);
        for k in 0..3 {
            assert!(approx(g[k], full[k] - normal_part * frame.normal[k]));
        }
        assert!(approx(dot(g, frame.normal), 0.0));
    }

    #[test]
    fn collinear_triangle_is_degenerate() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        assert!(TriangleFrame::try_new(&vertices).is_none());
        assert_eq!(triangle_area(&vertices), 0.0);
    }

    #[test]
    fn nan_vertex_is_degenerate() {
        let vertices = [[0.0, 0.0, 0.0], [f64::NAN, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert!(TriangleFrame::try_new(&vertices).is_none());
    }
}
