//! Pairwise proximity solvers.
//!
//! Each solver takes global poses and returns a [`Proximity`] whose witness
//! frames are expressed in the ground frame.

use std::sync::Once;

use arbor_spatial::transform::{Transform, inv, pdot, rotation, translation, z_aligned};
use arbor_types::Result;
use nalgebra::Vector3;
use tracing::warn;

/// Signed distance and witness frames for a pair of shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Proximity {
    /// Signed distance, negative on interpenetration.
    pub distance: f64,
    /// Witness frames on the first and second shape (in solver order).
    ///
    /// Both share the contact normal as z axis, pointing from the first
    /// shape toward the second.
    pub frames: [Transform; 2],
    /// Whether solver order is the reverse of the caller's order.
    pub swapped: bool,
}

impl Proximity {
    fn new(distance: f64, frame0: Transform, frame1: Transform) -> Self {
        Self {
            distance,
            frames: [frame0, frame1],
            swapped: false,
        }
    }

    /// Contact normal, in ground coordinates.
    #[must_use]
    pub fn normal(&self) -> Vector3<f64> {
        self.frames[0].fixed_view::<3, 1>(0, 2).into_owned()
    }

    /// Whether the shapes overlap.
    #[must_use]
    pub fn is_penetrating(&self) -> bool {
        self.distance < 0.0
    }
}

/// Sign with `sign(0) == 0`.
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn with_origin(mut h: Transform, origin: &Vector3<f64>) -> Transform {
    h.fixed_view_mut::<3, 1>(0, 3).copy_from(origin);
    h
}

/// Sphere against sphere.
///
/// The normal joins the centers and does not flip when the spheres overlap.
/// Coincident centers have no normal and fail with
/// [`arbor_types::ArborError::DegenerateNormal`].
pub fn sphere_sphere(
    center0: &Vector3<f64>,
    radius0: f64,
    center1: &Vector3<f64>,
    radius1: f64,
) -> Result<Proximity> {
    let vec = center1 - center0;
    let length = vec.norm();
    let distance = length - radius0 - radius1;
    let normal = vec / length;
    let frame = z_aligned(&normal)?;
    let origin0 = center0 + normal * radius0;
    let origin1 = origin0 + normal * distance;
    Ok(Proximity::new(
        distance,
        with_origin(frame, &origin0),
        with_origin(frame, &origin1),
    ))
}

/// Sphere against point.
pub fn sphere_point(
    center: &Vector3<f64>,
    radius: f64,
    point: &Vector3<f64>,
) -> Result<Proximity> {
    sphere_sphere(center, radius, point, 0.0)
}

/// Plane against sphere.
///
/// The plane is `normal · x == offset` in the frame `plane_pose`.
pub fn plane_sphere(
    plane_pose: &Transform,
    normal: &Vector3<f64>,
    offset: f64,
    center: &Vector3<f64>,
    radius: f64,
) -> Result<Proximity> {
    let p = pdot(&inv(plane_pose), center);
    let center_distance = normal.dot(&p) - offset;
    let distance = center_distance - radius;
    let frame = z_aligned(normal)?;
    let origin0 = p - normal * center_distance;
    let origin1 = p - normal * (sign(distance) * radius);
    Ok(Proximity::new(
        distance,
        plane_pose * with_origin(frame, &origin0),
        plane_pose * with_origin(frame, &origin1),
    ))
}

/// Plane against point.
pub fn plane_point(
    plane_pose: &Transform,
    normal: &Vector3<f64>,
    offset: f64,
    point: &Vector3<f64>,
) -> Result<Proximity> {
    plane_sphere(plane_pose, normal, offset, point, 0.0)
}

/// Box against sphere.
///
/// Outside the box the witness on the box is the clamped center. Inside,
/// the nearest face (first one on ties) gives the witness and the normal.
pub fn box_sphere(
    box_pose: &Transform,
    half_extents: &Vector3<f64>,
    center: &Vector3<f64>,
    radius: f64,
) -> Result<Proximity> {
    let p = pdot(&inv(box_pose), center);
    let inside = (0..3).all(|i| p[i].abs() <= half_extents[i]);

    let (distance, normal, witness) = if inside {
        let gaps = [
            half_extents.x - p.x,
            half_extents.y - p.y,
            half_extents.z - p.z,
            half_extents.x + p.x,
            half_extents.y + p.y,
            half_extents.z + p.z,
        ];
        let mut face = 0;
        for (i, gap) in gaps.iter().enumerate() {
            if *gap < gaps[face] {
                face = i;
            }
        }
        let axis = face % 3;
        let outward = if face < 3 { 1.0 } else { -1.0 };
        let mut local_normal = Vector3::zeros();
        local_normal[axis] = outward;
        let mut face_point = p;
        face_point[axis] = outward * half_extents[axis];
        let witness = pdot(box_pose, &face_point);
        let distance = -(witness - center).norm() - radius;
        (distance, rotation(box_pose) * local_normal, witness)
    } else {
        let clamped = Vector3::from_fn(|i, _| p[i].clamp(-half_extents[i], half_extents[i]));
        let witness = pdot(box_pose, &clamped);
        let vec = center - witness;
        let length = vec.norm();
        (length - radius, vec / length, witness)
    };

    let frame = z_aligned(&normal)?;
    let origin1 = center - normal * radius;
    Ok(Proximity::new(
        distance,
        with_origin(frame, &witness),
        with_origin(frame, &origin1),
    ))
}

static BOX_POINT_CAVEAT: Once = Once::new();

/// Box against point.
///
/// Same algorithm as [`box_sphere`] with a zero radius. Near an edge or a
/// corner the chosen face, hence the normal, jumps discontinuously.
pub fn box_point(
    box_pose: &Transform,
    half_extents: &Vector3<f64>,
    point: &Vector3<f64>,
) -> Result<Proximity> {
    BOX_POINT_CAVEAT.call_once(|| {
        warn!(
            origin = ?translation(box_pose),
            "box/point proximity is unreliable near box edges and corners"
        );
    });
    box_sphere(box_pose, half_extents, point, 0.0)
}
