//! Shape-pair dispatch.

use arbor_spatial::transform::{Transform, translation};
use arbor_types::{ArborError, Result};

use crate::proximity::{
    Proximity, box_point, box_sphere, plane_point, plane_sphere, sphere_point, sphere_sphere,
};
use crate::shape::{Geometry, ShapeKind};

/// Proximity algorithm for an ordered pair of shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairSolver {
    /// [`sphere_sphere`](crate::proximity::sphere_sphere).
    SphereSphere,
    /// [`sphere_point`](crate::proximity::sphere_point).
    SpherePoint,
    /// [`plane_sphere`](crate::proximity::plane_sphere).
    PlaneSphere,
    /// [`plane_point`](crate::proximity::plane_point).
    PlanePoint,
    /// [`box_sphere`](crate::proximity::box_sphere).
    BoxSphere,
    /// [`box_point`](crate::proximity::box_point).
    BoxPoint,
}

/// Solver selected for a pair, with the argument order it expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverChoice {
    /// Algorithm.
    pub solver: PairSolver,
    /// The solver takes the second shape first.
    pub swapped: bool,
}

/// Pick the solver and canonical argument order for a pair of kinds.
pub fn choose_solver(first: ShapeKind, second: ShapeKind) -> Result<SolverChoice> {
    use PairSolver::{BoxPoint, BoxSphere, PlanePoint, PlaneSphere, SpherePoint, SphereSphere};
    use ShapeKind::{Box, Plane, Point, Sphere};

    let (solver, swapped) = match (first, second) {
        (Sphere, Sphere) => (SphereSphere, false),
        (Sphere, Point) => (SpherePoint, false),
        (Sphere, Plane) => (PlaneSphere, true),
        (Sphere, Box) => (BoxSphere, true),
        (Point, Sphere) => (SpherePoint, true),
        (Point, Plane) => (PlanePoint, true),
        (Point, Box) => (BoxPoint, true),
        (Plane, Sphere) => (PlaneSphere, false),
        (Plane, Point) => (PlanePoint, false),
        (Box, Sphere) => (BoxSphere, false),
        (Box, Point) => (BoxPoint, false),
        _ => {
            return Err(ArborError::UnsupportedShapePair {
                first: first.to_string(),
                second: second.to_string(),
            });
        }
    };
    Ok(SolverChoice { solver, swapped })
}

/// Run `solver` on shapes already in canonical order.
pub fn solve(
    solver: PairSolver,
    first: &Geometry,
    first_pose: &Transform,
    second: &Geometry,
    second_pose: &Transform,
) -> Result<Proximity> {
    let second_origin = translation(second_pose);
    match (solver, first, second) {
        (PairSolver::SphereSphere, Geometry::Sphere { radius: r0 }, Geometry::Sphere { radius: r1 }) => {
            sphere_sphere(&translation(first_pose), *r0, &second_origin, *r1)
        }
        (PairSolver::SpherePoint, Geometry::Sphere { radius }, Geometry::Point) => {
            sphere_point(&translation(first_pose), *radius, &second_origin)
        }
        (PairSolver::PlaneSphere, Geometry::Plane { normal, offset }, Geometry::Sphere { radius }) => {
            plane_sphere(first_pose, normal, *offset, &second_origin, *radius)
        }
        (PairSolver::PlanePoint, Geometry::Plane { normal, offset }, Geometry::Point) => {
            plane_point(first_pose, normal, *offset, &second_origin)
        }
        (PairSolver::BoxSphere, Geometry::Box { half_extents }, Geometry::Sphere { radius }) => {
            box_sphere(first_pose, half_extents, &second_origin, *radius)
        }
        (PairSolver::BoxPoint, Geometry::Box { half_extents }, Geometry::Point) => {
            box_point(first_pose, half_extents, &second_origin)
        }
        _ => Err(ArborError::UnsupportedShapePair {
            first: first.kind().to_string(),
            second: second.kind().to_string(),
        }),
    }
}

/// Proximity of two posed geometries.
///
/// The returned frames follow the solver's canonical order; `swapped`
/// tells whether that order is `(b, a)`.
pub fn collide(
    a: &Geometry,
    a_pose: &Transform,
    b: &Geometry,
    b_pose: &Transform,
) -> Result<Proximity> {
    let choice = choose_solver(a.kind(), b.kind())?;
    let mut proximity = if choice.swapped {
        solve(choice.solver, b, b_pose, a, a_pose)?
    } else {
        solve(choice.solver, a, a_pose, b, b_pose)?
    };
    proximity.swapped = choice.swapped;
    Ok(proximity)
}
