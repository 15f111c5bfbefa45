//! Frames: bodies and subframes.
//!
//! Every frame is rigidly (or, for moving subframes, kinematically) attached
//! to exactly one body. Its pose, twist and jacobians are those of the body
//! transported through the constant offset [`Frame::bpose`].

use arbor_spatial::transform::{Transform, ensure_homogeneous};
use arbor_types::{BodyId, Result};

/// Capability shared by bodies and subframes.
pub trait Frame {
    /// Body the frame is attached to.
    fn body(&self) -> BodyId;

    /// Pose of the frame relative to its body.
    fn bpose(&self) -> Transform;
}

/// A frame at an offset from a body.
///
/// Fixed subframes keep the offset they were built with. Moving subframes
/// accept a new offset at runtime through
/// [`World::set_subframe_bpose`](crate::World::set_subframe_bpose); the
/// offset is treated as constant within a step.
#[derive(Debug, Clone, PartialEq)]
pub struct SubFrame {
    body: BodyId,
    bpose: Transform,
    moving: bool,
}

impl SubFrame {
    /// Fixed subframe. Fails when `bpose` is not a rigid transform.
    pub fn new(body: BodyId, bpose: Transform) -> Result<Self> {
        ensure_homogeneous(&bpose)?;
        Ok(Self {
            body,
            bpose,
            moving: false,
        })
    }

    /// Subframe whose offset may be changed later.
    pub fn moving(body: BodyId, bpose: Transform) -> Result<Self> {
        ensure_homogeneous(&bpose)?;
        Ok(Self {
            body,
            bpose,
            moving: true,
        })
    }

    /// Whether the offset can change.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub(crate) fn set_bpose(&mut self, bpose: Transform) -> Result<()> {
        ensure_homogeneous(&bpose)?;
        self.bpose = bpose;
        Ok(())
    }
}

impl Frame for SubFrame {
    fn body(&self) -> BodyId {
        self.body
    }

    fn bpose(&self) -> Transform {
        self.bpose
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use arbor_spatial::transform::{rotx, transl};
    use arbor_types::ArborError;

    #[test]
    fn test_subframe_validates_offset() {
        let ok = SubFrame::new(BodyId(1), transl(0.0, 1.0, 0.0) * rotx(0.3)).unwrap();
        assert_eq!(ok.body(), BodyId(1));
        assert!(!ok.is_moving());

        let mut bad = Transform::identity();
        bad[(0, 0)] = 3.0;
        assert!(matches!(
            SubFrame::new(BodyId(1), bad),
            Err(ArborError::InvalidTransform { .. })
        ));
    }

    #[test]
    fn test_moving_subframe_set_bpose() {
        let mut frame = SubFrame::moving(BodyId(2), Transform::identity()).unwrap();
        frame.set_bpose(transl(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(frame.bpose(), transl(1.0, 2.0, 3.0));

        let mut bad = Transform::identity();
        bad[(3, 3)] = 2.0;
        assert!(frame.set_bpose(bad).is_err());
        assert_eq!(frame.bpose(), transl(1.0, 2.0, 3.0));
    }
}
