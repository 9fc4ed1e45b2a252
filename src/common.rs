use crate::vec::{Num, Vec, Vec2, Vec4};

/// Runs the block and, with the `performance-counters` feature, adds the elapsed TSC cycles to
/// the given counter.
macro_rules! count_cycles {
    (
        #[counter($counter:expr $(, increment = $increment:expr)?)]
        $($code:tt)*
    ) => {
        {
            #[cfg(feature = "performance-counters")]
            let start = unsafe { core::arch::x86_64::_rdtsc() };

            let res = {
                $($code)*
            };

            #[cfg(feature = "performance-counters")]
            let cycles = unsafe { core::arch::x86_64::_rdtsc() - start };

            #[cfg(feature = "performance-counters")]
            {
                $counter.cycles += cycles;
                $($counter.hits += $increment - 1;)?
                $counter.hits += 1;
            }

            res
        }
    };
}

pub(crate) use count_cycles;

/// Maps normalized device coordinates to pixel coordinates, with `y` pointing down.
pub fn ndc_to_screen(ndc: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::from([
        (ndc.x + 1.) / 2. * width,
        (1. - ndc.y) / 2. * height,
    ])
}

/// Returns the oriented area of the paralelogram formed by the points `from`, `to`, `p`, `from + (p - to)`. The sign
/// is positive if the points in the paralelogram wind counterclockwise (according to the order given prior) and
/// negative otherwise. In other words, if you were at `from` looking towards `to`, when `p` is to your left, the
/// value would be positive, and if it is to your right the value is negative.
///
/// Screen space has `y` pointing down, so "counterclockwise" here is clockwise as seen on the display.
///
/// ## Relationship with barycentric coordinates
///
/// For any triangle ABC, the barycentric weights of a point P are
///
/// - `w0 = orient_2d(B, C, P) / orient_2d(A, B, C)`
/// - `w1 = orient_2d(C, A, P) / orient_2d(A, B, C)`
/// - `w2 = orient_2d(A, B, P) / orient_2d(A, B, C)`
///
/// It's also worth noting that `orient_2d(A, B, C)` is twice the area of the triangle ABC.
pub fn orient_2d<T: Num>(from: Vec<T, 2>, to: Vec<T, 2>, p: Vec<T, 2>) -> T {
    (to - from).cross(p - from)
}

/// Whether every vertex projects inside the `[-1, 1]` square of the image plane. Depth is not
/// considered here, it is checked per pixel. Triangles that are only partially inside are
/// rejected as a whole since there is no clipping.
pub fn is_inside_frustum(p0_clip: Vec4, p1_clip: Vec4, p2_clip: Vec4) -> bool {
    [p0_clip, p1_clip, p2_clip].iter().all(|p| {
        let x = p.x / p.w;
        let y = p.y / p.w;
        (-1.0..=1.0).contains(&x) && (-1.0..=1.0).contains(&y)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_corners_map_to_screen_corners() {
        let top_left = ndc_to_screen(Vec2::from([-1., 1.]), 640., 480.);
        let bottom_right = ndc_to_screen(Vec2::from([1., -1.]), 640., 480.);
        let center = ndc_to_screen(Vec2::from([0., 0.]), 640., 480.);
        assert_eq!(top_left.to_array(), [0., 0.]);
        assert_eq!(bottom_right.to_array(), [640., 480.]);
        assert_eq!(center.to_array(), [320., 240.]);
    }

    #[test]
    fn orient_2d_sign_depends_on_winding() {
        let a = Vec2::from([0., 0.]);
        let b = Vec2::from([1., 0.]);
        let c = Vec2::from([0., 1.]);
        assert_eq!(orient_2d(a, b, c), 1.);
        assert_eq!(orient_2d(a, c, b), -1.);
    }

    #[test]
    fn barycentric_weights_sum_to_one() {
        let a = Vec2::from([3., 1.]);
        let b = Vec2::from([17., 4.5]);
        let c = Vec2::from([6., 12.]);
        let area = orient_2d(a, b, c);
        for p in [[5., 5.], [10., 6.], [0., 0.], [20., 20.]] {
            let p = Vec2::from(p);
            let sum = (orient_2d(b, c, p) + orient_2d(c, a, p) + orient_2d(a, b, p)) / area;
            assert!((sum - 1.).abs() < 1e-5, "{sum}");
        }
    }

    #[test]
    fn frustum_test_requires_every_vertex_inside() {
        let inside = Vec4::from([0.5, 0.5, 1., 2.]);
        let edge = Vec4::from([2., -2., 1., 2.]);
        let outside = Vec4::from([2.5, 0., 1., 2.]);
        assert!(is_inside_frustum(inside, edge, inside));
        assert!(!is_inside_frustum(inside, inside, outside));
    }
}
