//! Primitive shapes attached to frames.

use arbor_types::{ArborError, FrameId, Result};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum norm threshold for geometric operations.
pub const GEOM_EPSILON: f64 = 1e-10;

/// Discriminant of a [`Geometry`], used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeKind {
    /// Ball.
    Sphere,
    /// Single point.
    Point,
    /// Infinite plane.
    Plane,
    /// Rectangular box.
    Box,
    /// Cylinder (no proximity solver).
    Cylinder,
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sphere => "sphere",
            Self::Point => "point",
            Self::Plane => "plane",
            Self::Box => "box",
            Self::Cylinder => "cylinder",
        };
        f.write_str(name)
    }
}

/// Shape parameters, expressed in the frame the shape is attached to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Geometry {
    /// Ball centered on the frame origin.
    Sphere {
        /// Radius.
        radius: f64,
    },
    /// The frame origin.
    Point,
    /// Plane of points `x` with `normal · x == offset`.
    Plane {
        /// Unit normal.
        normal: Vector3<f64>,
        /// Signed offset along the normal.
        offset: f64,
    },
    /// Box centered on the frame origin, aligned with its axes.
    Box {
        /// Half lengths along x, y, z.
        half_extents: Vector3<f64>,
    },
    /// Cylinder centered on the frame origin, axis along z.
    Cylinder {
        /// Length along z.
        length: f64,
        /// Radius.
        radius: f64,
    },
}

impl Geometry {
    /// Ball of the given radius.
    pub fn sphere(radius: f64) -> Result<Self> {
        check_length("sphere radius", radius)?;
        Ok(Self::Sphere { radius })
    }

    /// Box with the given half extents.
    pub fn cuboid(half_extents: Vector3<f64>) -> Result<Self> {
        for v in half_extents.iter() {
            check_length("box half extent", *v)?;
        }
        Ok(Self::Box { half_extents })
    }

    /// Plane from the coefficients `(a, b, c, d)`, normalized so that
    /// `(a, b, c)` is a unit vector.
    pub fn plane(coeffs: [f64; 4]) -> Result<Self> {
        let n = Vector3::new(coeffs[0], coeffs[1], coeffs[2]);
        let norm = n.norm();
        if !norm.is_finite() || norm < GEOM_EPSILON || !coeffs[3].is_finite() {
            return Err(ArborError::invalid_shape(format!(
                "plane coefficients {coeffs:?} have no usable normal"
            )));
        }
        Ok(Self::Plane {
            normal: n / norm,
            offset: coeffs[3] / norm,
        })
    }

    /// Cylinder with the given length and radius.
    pub fn cylinder(length: f64, radius: f64) -> Result<Self> {
        check_length("cylinder length", length)?;
        check_length("cylinder radius", radius)?;
        Ok(Self::Cylinder { length, radius })
    }

    /// Dispatch key.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Sphere { .. } => ShapeKind::Sphere,
            Self::Point => ShapeKind::Point,
            Self::Plane { .. } => ShapeKind::Plane,
            Self::Box { .. } => ShapeKind::Box,
            Self::Cylinder { .. } => ShapeKind::Cylinder,
        }
    }
}

fn check_length(what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ArborError::invalid_shape(format!(
            "{what} must be finite and non-negative, got {value}"
        )))
    }
}

/// A geometry attached to a frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shape {
    /// Frame the geometry is expressed in.
    pub frame: FrameId,
    /// Geometry.
    pub geometry: Geometry,
}

impl Shape {
    /// Attach a geometry to a frame.
    #[must_use]
    pub fn new(frame: impl Into<FrameId>, geometry: Geometry) -> Self {
        Self {
            frame: frame.into(),
            geometry,
        }
    }

    /// Dispatch key of the geometry.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }
}
