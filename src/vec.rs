use std::ops::{
    Add, AddAssign, Deref, DerefMut, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub,
    SubAssign,
};

pub type Mat4x4 = Mat<f32, 4, 4>;

/// Row-major `M x N` matrix. Vectors are column matrices, so transforms compose right to left:
/// `projection * view * world * position`.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat<T, const M: usize, const N: usize>([[T; N]; M]);

impl<T: Num, const M: usize, const N: usize> Mat<T, M, N> {
    pub fn zero() -> Self {
        Mat([[T::zero(); N]; M])
    }

    pub fn one() -> Self {
        Mat([[T::one(); N]; M])
    }

    pub fn repeat(value: T) -> Self {
        Mat([[value; N]; M])
    }

    pub fn map<U: Num>(self, mut f: impl FnMut(T) -> U) -> Mat<U, M, N> {
        let mut ret = Mat::zero();
        for i in 0..M {
            for j in 0..N {
                ret[(i, j)] = f(self[(i, j)]);
            }
        }
        ret
    }

    pub fn zip_with(self, rhs: Self, mut f: impl FnMut(T, T) -> T) -> Self {
        let mut ret = self;
        for i in 0..M {
            for j in 0..N {
                ret[(i, j)] = f(self[(i, j)], rhs[(i, j)]);
            }
        }
        ret
    }
}

impl<T: Num, const N: usize> Mat<T, N, N> {
    pub fn identity() -> Self {
        let mut ret = Self::zero();
        for i in 0..N {
            ret[(i, i)] = T::one();
        }
        ret
    }

    /// Gauss-Jordan elimination with partial pivoting. Returns `None` for singular matrices.
    pub fn inverse(self) -> Option<Self> {
        let mut a = self;
        let mut inv = Self::identity();

        for col in 0..N {
            let pivot = (col..N).fold(col, |best, row| {
                if a[(row, col)].abs() > a[(best, col)].abs() {
                    row
                } else {
                    best
                }
            });
            if a[(pivot, col)] == T::zero() {
                return None;
            }
            a.0.swap(pivot, col);
            inv.0.swap(pivot, col);

            let p = a[(col, col)];
            for j in 0..N {
                a[(col, j)] /= p;
                inv[(col, j)] /= p;
            }

            for row in 0..N {
                if row == col {
                    continue;
                }
                let factor = a[(row, col)];
                for j in 0..N {
                    let a_cj = a[(col, j)];
                    let inv_cj = inv[(col, j)];
                    a[(row, j)] -= factor * a_cj;
                    inv[(row, j)] -= factor * inv_cj;
                }
            }
        }
        Some(inv)
    }
}

impl<T: Num> Mat<T, 4, 4> {
    #[rustfmt::skip]
    pub fn rotation_x(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[   o,   z,   z,   z],
             [   z, cos,-sin,   z],
             [   z, sin, cos,   z],
             [   z,   z,   z,   o]])
    }

    #[rustfmt::skip]
    pub fn rotation_y(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[ cos,   z, sin,   z],
             [   z,   o,   z,   z],
             [-sin,   z, cos,   z],
             [   z,   z,   z,   o]])
    }

    #[rustfmt::skip]
    pub fn rotation_z(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[ cos, -sin,   z,   z],
             [ sin,  cos,   z,   z],
             [   z,    z,   o,   z],
             [   z,    z,   z,   o]])
    }

    /// Builds the matrix whose columns are the given basis vectors and origin, i.e. the transform
    /// from the local frame into the parent frame.
    #[rustfmt::skip]
    pub fn from_basis(right: Vec<T, 3>, up: Vec<T, 3>, forward: Vec<T, 3>, origin: Vec<T, 3>) -> Self {
        let o = T::one();
        let z = T::zero();
        Mat([[right.x, up.x, forward.x, origin.x],
             [right.y, up.y, forward.y, origin.y],
             [right.z, up.z, forward.z, origin.z],
             [      z,    z,         z,        o]])
    }

    pub fn transform_point(&self, p: Vec<T, 3>) -> Vec<T, 3> {
        (*self * p.to_hom()).xyz()
    }

    /// Transforms a direction, ignoring the translation part.
    pub fn transform_vector(&self, v: Vec<T, 3>) -> Vec<T, 3> {
        (*self * v.to_hom_vector()).xyz()
    }

    pub fn translate(self, translation: Vec<T, 3>) -> Self {
        translation.to_translation() * self
    }

    pub fn rotate(self, rotation: Vec<T, 3>) -> Self {
        rotation.to_rotation() * self
    }

    pub fn scale(self, scale: Vec<T, 3>) -> Self {
        scale.to_scale() * self
    }
}

impl Mat4x4 {
    /// Left-handed perspective projection mapping view-space depth `near..far` to NDC `0..1`.
    /// The clip-space `w` is the view-space depth. `fovy` is measured in degrees.
    #[rustfmt::skip]
    pub fn perspective(ratio: f32, fovy: f32, near: f32, far: f32) -> Self {
        let fov = (fovy.to_radians() / 2.).tan();
        let range = far - near;
        Mat([[1. / (ratio * fov),       0.,          0.,                 0.],
             [                0., 1. / fov,          0.,                 0.],
             [                0.,       0., far / range, -far * near / range],
             [                0.,       0.,          1.,                 0.]])
    }
}

impl<T, const M: usize, const N: usize> From<[[T; N]; M]> for Mat<T, M, N> {
    fn from(value: [[T; N]; M]) -> Self {
        Mat(value)
    }
}

pub type Vec<T, const N: usize> = Mat<T, N, 1>;
pub type Vec2 = Vec<f32, 2>;
pub type Vec3 = Vec<f32, 3>;
pub type Vec4 = Vec<f32, 4>;

impl<T: Num, const N: usize> Vec<T, N> {
    pub fn dot(&self, rhs: Self) -> T {
        let mut acc = T::zero();
        for i in 0..N {
            acc += self[(i, 0)] * rhs[(i, 0)];
        }
        acc
    }

    pub fn mag_sq(&self) -> T {
        self.dot(*self)
    }

    pub fn mag(&self) -> T {
        self.mag_sq().sqrt()
    }

    pub fn normalized(self) -> Self {
        self / self.mag()
    }

    pub fn to_array(self) -> [T; N] {
        self.0.map(|[coord]| coord)
    }

    pub fn max_element(&self) -> T
    where
        T: PartialOrd,
    {
        let mut ret = self[(0, 0)];
        for i in 1..N {
            if self[(i, 0)] > ret {
                ret = self[(i, 0)];
            }
        }
        ret
    }
}

impl<T: Num> Vec<T, 2> {
    /// The z component of the 3D cross product of two vectors lying in the xy plane.
    pub fn cross(self, rhs: Self) -> T {
        self.x * rhs.y - self.y * rhs.x
    }
}

impl<T: Num> Vec<T, 3> {
    pub fn cross(self, rhs: Self) -> Self {
        Self::from([
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        ])
    }

    /// Reflects `self` about the plane with the given unit `normal`.
    pub fn reflect(self, normal: Self) -> Self {
        let two = T::one() + T::one();
        self - normal * (two * self.dot(normal))
    }

    /// Homogeneous point, `w = 1`.
    pub fn to_hom(self) -> Vec<T, 4> {
        Vec::from([self.x, self.y, self.z, T::one()])
    }

    /// Homogeneous direction, `w = 0`.
    pub fn to_hom_vector(self) -> Vec<T, 4> {
        Vec::from([self.x, self.y, self.z, T::zero()])
    }

    pub fn to_rotation(self) -> Mat<T, 4, 4> {
        Mat::rotation_x(self.x) * Mat::rotation_y(self.y) * Mat::rotation_z(self.z)
    }

    pub fn to_translation(self) -> Mat<T, 4, 4> {
        let mut ret = Mat::identity();
        ret[(0, 3)] = self.x;
        ret[(1, 3)] = self.y;
        ret[(2, 3)] = self.z;
        ret
    }

    pub fn to_scale(self) -> Mat<T, 4, 4> {
        let mut ret = Mat::zero();
        ret[(0, 0)] = self.x;
        ret[(1, 1)] = self.y;
        ret[(2, 2)] = self.z;
        ret[(3, 3)] = T::one();
        ret
    }
}

impl<T: Copy, const N: usize> From<[T; N]> for Vec<T, N> {
    fn from(value: [T; N]) -> Self {
        Mat(value.map(|coord| [coord]))
    }
}

impl<T, const M: usize, const N: usize> Index<(usize, usize)> for Mat<T, M, N> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.0[i][j]
    }
}

impl<T, const M: usize, const N: usize> IndexMut<(usize, usize)> for Mat<T, M, N> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        &mut self.0[i][j]
    }
}

impl<T: Num, const M: usize, const N: usize> Add for Mat<T, M, N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<T: Num, const M: usize, const N: usize> AddAssign for Mat<T, M, N> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<T: Num, const M: usize, const N: usize> Sub for Mat<T, M, N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl<T: Num, const M: usize, const N: usize> SubAssign for Mat<T, M, N> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<T: Num, const M: usize, const N: usize> Neg for Mat<T, M, N> {
    type Output = Self;

    fn neg(self) -> Self {
        self.map(|el| -el)
    }
}

impl<T: Num, const M: usize, const N: usize> Mul<T> for Mat<T, M, N> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        self.map(|el| el * rhs)
    }
}

impl<T: Num, const M: usize, const N: usize> MulAssign<T> for Mat<T, M, N> {
    fn mul_assign(&mut self, rhs: T) {
        *self = *self * rhs;
    }
}

macro_rules! impl_mul_lhs {
    ($($ty:ty),+) => {
        $(impl<const M: usize, const N: usize> Mul<Mat<$ty, M, N>> for $ty {
            type Output = Mat<$ty, M, N>;

            fn mul(self, rhs: Mat<$ty, M, N>) -> Mat<$ty, M, N> {
                rhs * self
            }
        })+
    };
}

impl_mul_lhs!(f32, f64);

impl<T: Num, const M: usize, const K: usize, const N: usize> Mul<Mat<T, K, N>> for Mat<T, M, K> {
    type Output = Mat<T, M, N>;

    fn mul(self, rhs: Mat<T, K, N>) -> Self::Output {
        let mut ret = Mat::zero();
        for i in 0..M {
            for j in 0..N {
                for k in 0..K {
                    ret[(i, j)] += self[(i, k)] * rhs[(k, j)];
                }
            }
        }
        ret
    }
}

impl<T: Num, const M: usize, const N: usize> Div<T> for Mat<T, M, N> {
    type Output = Self;

    fn div(self, rhs: T) -> Self {
        self.map(|el| el / rhs)
    }
}

impl<T: Num, const M: usize, const N: usize> DivAssign<T> for Mat<T, M, N> {
    fn div_assign(&mut self, rhs: T) {
        *self = *self / rhs;
    }
}

// SAFETY (all `Deref` impls below): `Mat<T, N, 1>` is `repr(transparent)` over `[[T; 1]; N]`,
// which has the same layout as a `repr(C)` struct of `N` fields of type `T`.

impl<T: Num> Deref for Vec<T, 2> {
    type Target = XY<T>;

    fn deref(&self) -> &XY<T> {
        unsafe { &*(self as *const Self).cast::<XY<T>>() }
    }
}

impl<T: Num> DerefMut for Vec<T, 2> {
    fn deref_mut(&mut self) -> &mut XY<T> {
        unsafe { &mut *(self as *mut Self).cast::<XY<T>>() }
    }
}

impl<T: Num> Deref for Vec<T, 3> {
    type Target = XYZ<T>;

    fn deref(&self) -> &XYZ<T> {
        unsafe { &*(self as *const Self).cast::<XYZ<T>>() }
    }
}

impl<T: Num> DerefMut for Vec<T, 3> {
    fn deref_mut(&mut self) -> &mut XYZ<T> {
        unsafe { &mut *(self as *mut Self).cast::<XYZ<T>>() }
    }
}

impl<T: Num> Deref for Vec<T, 4> {
    type Target = XYZW<T>;

    fn deref(&self) -> &XYZW<T> {
        unsafe { &*(self as *const Self).cast::<XYZW<T>>() }
    }
}

impl<T: Num> DerefMut for Vec<T, 4> {
    fn deref_mut(&mut self) -> &mut XYZW<T> {
        unsafe { &mut *(self as *mut Self).cast::<XYZW<T>>() }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XY<T> {
    pub x: T,
    pub y: T,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XYZ<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Copy> XYZ<T> {
    pub fn xy(&self) -> Vec<T, 2> {
        Vec::from([self.x, self.y])
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XYZW<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub w: T,
}

impl<T: Copy> XYZW<T> {
    pub fn xy(&self) -> Vec<T, 2> {
        Vec::from([self.x, self.y])
    }

    pub fn xyz(&self) -> Vec<T, 3> {
        Vec::from([self.x, self.y, self.z])
    }
}

pub trait Num:
    Copy
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + SubAssign
    + Mul<Output = Self>
    + MulAssign
    + Div<Output = Self>
    + DivAssign
    + Neg<Output = Self>
{
    fn zero() -> Self;
    fn one() -> Self;
    fn abs(self) -> Self;
    fn sqrt(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
}

macro_rules! impl_num_float {
    ($($ty:ty),+) => {
        $(impl Num for $ty {
            fn zero() -> Self {
                0.0
            }

            fn one() -> Self {
                1.0
            }

            fn abs(self) -> Self {
                <$ty>::abs(self)
            }

            fn sqrt(self) -> Self {
                <$ty>::sqrt(self)
            }

            fn sin(self) -> Self {
                <$ty>::sin(self)
            }

            fn cos(self) -> Self {
                <$ty>::cos(self)
            }
        })+
    };
}

impl_num_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn cross_follows_right_hand_rule() {
        let x = Vec3::from([1., 0., 0.]);
        let y = Vec3::from([0., 1., 0.]);
        let z = x.cross(y);
        assert_eq!(z.to_array(), [0., 0., 1.]);
        assert_eq!(y.cross(z).to_array(), [1., 0., 0.]);
        assert_eq!(z.cross(x).to_array(), [0., 1., 0.]);
    }

    #[test]
    fn cross_2d_is_signed_parallelogram_area() {
        let a = Vec2::from([2., 0.]);
        let b = Vec2::from([0., 3.]);
        assert_eq!(a.cross(b), 6.);
        assert_eq!(b.cross(a), -6.);
    }

    #[test]
    fn reflect_mirrors_about_normal() {
        let light = Vec3::from([1., -1., 0.]).normalized();
        let up = Vec3::from([0., 1., 0.]);
        let r = light.reflect(up);
        assert!(approx_eq(r.x, light.x));
        assert!(approx_eq(r.y, -light.y));
        assert!(approx_eq(r.z, 0.));
    }

    #[test]
    fn inverse_undoes_transform() {
        let m = Vec3::from([1., 2., 3.]).to_translation()
            * Mat4x4::rotation_y(0.7)
            * Vec3::from([2., 2., 2.]).to_scale();
        let inv = m.inverse().expect("matrix is invertible");
        let p = Vec3::from([0.5, -4., 9.]);
        let back = inv.transform_point(m.transform_point(p));
        for (a, b) in back.to_array().into_iter().zip(p.to_array()) {
            assert!(approx_eq(a, b), "{a} != {b}");
        }
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Mat4x4::zero().inverse().is_none());
    }

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth() {
        let proj = Mat4x4::perspective(1., 90., 0.1, 100.);
        let near = proj * Vec4::from([0., 0., 0.1, 1.]);
        let far = proj * Vec4::from([0., 0., 100., 1.]);
        assert!(approx_eq(near.z / near.w, 0.));
        assert!(approx_eq(far.z / far.w, 1.));
        assert!(approx_eq(far.w, 100.));
    }

    #[test]
    fn transform_vector_ignores_translation() {
        let m = Vec3::from([5., 5., 5.]).to_translation();
        let v = Vec3::from([0., 1., 0.]);
        assert_eq!(m.transform_vector(v).to_array(), [0., 1., 0.]);
        assert_eq!(m.transform_point(v).to_array(), [5., 6., 5.]);
    }
}
