// Released under MIT License.
// Copyright (c) 2023-2024 Ladislav Bartos

//! Implementation of methods for three-dimensional vector.

use std::ops::{Add, AddAssign, Deref, DerefMut, Div, Mul, Neg, Sub};

use crate::structures::simbox::SimBox;
use nalgebra::base::Vector3;

/// Describes a displacement in space or a position of a point in space.
/// Implemented using `nalgebra`'s Vector3 with double precision.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Vector3D(pub(crate) Vector3<f64>);

impl From<[f64; 3]> for Vector3D {
    #[inline]
    fn from(arr: [f64; 3]) -> Self {
        Vector3D(Vector3::new(arr[0], arr[1], arr[2]))
    }
}

impl From<Vector3<f64>> for Vector3D {
    #[inline]
    fn from(vec: Vector3<f64>) -> Self {
        Vector3D(vec)
    }
}

/// Allows accessing fields of `Vector3D` as `.x`, `.y`, and `.z`.
pub struct Vector3Raw {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Deref for Vector3D {
    type Target = Vector3Raw;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // `Vector3<f64>` is stored as three contiguous f64 values
        unsafe { &*(self.0.as_ptr() as *const Vector3Raw) }
    }
}

impl DerefMut for Vector3D {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *(self.0.as_mut_ptr() as *mut Vector3Raw) }
    }
}

impl Vector3D {
    /// Create a new `Vector3D` structure.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D(Vector3::new(x, y, z))
    }

    /// Calculate length of the vector.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let vector = Vector3D::new(1.0, 2.0, 3.0);
    /// assert_approx_eq!(f64, vector.len(), 3.7416573867739413);
    /// ```
    #[inline]
    pub fn len(&self) -> f64 {
        self.0.magnitude()
    }

    /// Squared length of the vector.
    #[inline]
    pub fn len_squared(&self) -> f64 {
        self.0.magnitude_squared()
    }

    /// Calculate the dot product of two vectors.
    #[inline]
    pub fn dot(&self, vector: &Vector3D) -> f64 {
        self.0.dot(&vector.0)
    }

    /// Calculate the cross product of two vectors.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let vector1 = Vector3D::new(1.0, 0.0, 0.0);
    /// let vector2 = Vector3D::new(0.0, 1.0, 0.0);
    /// let cross = vector1.cross(&vector2);
    ///
    /// assert_approx_eq!(f64, cross.x, 0.0);
    /// assert_approx_eq!(f64, cross.y, 0.0);
    /// assert_approx_eq!(f64, cross.z, 1.0);
    /// ```
    #[inline]
    pub fn cross(&self, vector: &Vector3D) -> Vector3D {
        Vector3D(self.0.cross(&vector.0))
    }

    /// Calculate the shortest vector connecting `self` with `point`
    /// taking periodic boundary conditions of `sbox` into consideration.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let point1 = Vector3D::new(0.5, 2.0, 3.0);
    /// let point2 = Vector3D::new(19.5, 2.0, 3.0);
    /// let simbox = SimBox::orthogonal([20.0, 20.0, 20.0].into());
    ///
    /// let vector = point1.vector_to(&point2, &simbox);
    /// assert_approx_eq!(f64, vector.x, -1.0);
    /// assert_approx_eq!(f64, vector.y, 0.0);
    /// ```
    #[inline]
    pub fn vector_to(&self, point: &Vector3D, sbox: &SimBox) -> Vector3D {
        sbox.image_vector(*point - *self)
    }

    /// Calculate the minimum-image distance between two points.
    ///
    /// ## Example
    /// ```
    /// # use trajan_rs::prelude::*;
    /// # use float_cmp::assert_approx_eq;
    /// #
    /// let point1 = Vector3D::new(1.0, 2.0, 3.0);
    /// let point2 = Vector3D::new(3.5, 1.0, 2.0);
    /// let simbox = SimBox::orthogonal([4.0, 4.0, 4.0].into());
    ///
    /// assert_approx_eq!(f64, point1.distance(&point2, &simbox), 2.0615528128088303);
    /// ```
    #[inline]
    pub fn distance(&self, point: &Vector3D, sbox: &SimBox) -> f64 {
        self.vector_to(point, sbox).len()
    }

    /// Calculate distance between two points ignoring periodic boundary conditions.
    #[inline]
    pub fn distance_naive(&self, point: &Vector3D) -> f64 {
        (self.0 - point.0).magnitude()
    }

    /// Check whether all components of the vector are zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.x == 0.0 && self.0.y == 0.0 && self.0.z == 0.0
    }
}

impl Default for Vector3D {
    /// Create a zero vector.
    fn default() -> Self {
        Vector3D(Vector3::new(0.0, 0.0, 0.0))
    }
}

impl Add for Vector3D {
    type Output = Vector3D;

    #[inline]
    fn add(self, other: Vector3D) -> Vector3D {
        Vector3D(self.0 + other.0)
    }
}

impl AddAssign for Vector3D {
    #[inline]
    fn add_assign(&mut self, other: Vector3D) {
        self.0 += other.0;
    }
}

impl Sub for Vector3D {
    type Output = Vector3D;

    #[inline]
    fn sub(self, other: Vector3D) -> Vector3D {
        Vector3D(self.0 - other.0)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Vector3D;

    #[inline]
    fn mul(self, scalar: f64) -> Vector3D {
        Vector3D(self.0 * scalar)
    }
}

impl Div<f64> for Vector3D {
    type Output = Vector3D;

    #[inline]
    fn div(self, scalar: f64) -> Vector3D {
        Vector3D(self.0 / scalar)
    }
}

impl Neg for Vector3D {
    type Output = Vector3D;

    #[inline]
    fn neg(self) -> Vector3D {
        Vector3D(-self.0)
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
