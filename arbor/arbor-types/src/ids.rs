//! Arena handles.
//!
//! Every entity a world owns is addressed by a typed index. The world hands
//! these out when an entity is added and never reuses them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub usize);

        impl $name {
            /// Create a handle from a raw arena index.
            #[must_use]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Raw arena index.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

arena_id!(
    /// Handle on a rigid body.
    BodyId,
    "Body"
);
arena_id!(
    /// Handle on a joint.
    JointId,
    "Joint"
);
arena_id!(
    /// Handle on a subframe rigidly (or movably) attached to a body.
    SubFrameId,
    "SubFrame"
);
arena_id!(
    /// Handle on a collision shape.
    ShapeId,
    "Shape"
);
arena_id!(
    /// Handle on a constraint.
    ConstraintId,
    "Constraint"
);
arena_id!(
    /// Handle on a controller.
    ControllerId,
    "Controller"
);

impl BodyId {
    /// The ground body, created with every world.
    pub const GROUND: Self = Self(0);

    /// Whether this handle designates the ground.
    #[must_use]
    pub const fn is_ground(self) -> bool {
        self.0 == 0
    }
}

/// Anything that can act as a reference frame.
///
/// A body is its own frame. A subframe is a frame at a constant (or
/// runtime-settable) offset from a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameId {
    /// The frame of a body.
    Body(BodyId),
    /// A frame attached to a body.
    SubFrame(SubFrameId),
}

impl FrameId {
    /// The body when the frame is a body frame; subframes need the world to
    /// resolve their body.
    #[must_use]
    pub const fn body_hint(self) -> Option<BodyId> {
        match self {
            Self::Body(id) => Some(id),
            Self::SubFrame(_) => None,
        }
    }
}

impl From<BodyId> for FrameId {
    fn from(id: BodyId) -> Self {
        Self::Body(id)
    }
}

impl From<SubFrameId> for FrameId {
    fn from(id: SubFrameId) -> Self {
        Self::SubFrame(id)
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Body(id) => id.fmt(f),
            Self::SubFrame(id) => id.fmt(f),
        }
    }
}

/// Tagged handle on any world entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Entity {
    /// A body.
    Body(BodyId),
    /// A joint.
    Joint(JointId),
    /// A subframe.
    SubFrame(SubFrameId),
    /// A shape.
    Shape(ShapeId),
    /// A constraint.
    Constraint(ConstraintId),
    /// A controller.
    Controller(ControllerId),
}

impl Entity {
    /// Short lowercase kind name, used when generating default names.
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Body(_) => "body",
            Self::Joint(_) => "joint",
            Self::SubFrame(_) => "subframe",
            Self::Shape(_) => "shape",
            Self::Constraint(_) => "constraint",
            Self::Controller(_) => "controller",
        }
    }

    /// Raw arena index of the wrapped handle.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Body(id) => id.0,
            Self::Joint(id) => id.0,
            Self::SubFrame(id) => id.0,
            Self::Shape(id) => id.0,
            Self::Constraint(id) => id.0,
            Self::Controller(id) => id.0,
        }
    }
}

impl From<FrameId> for Entity {
    fn from(frame: FrameId) -> Self {
        match frame {
            FrameId::Body(id) => Self::Body(id),
            FrameId::SubFrame(id) => Self::SubFrame(id),
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Body(id) => id.fmt(f),
            Self::Joint(id) => id.fmt(f),
            Self::SubFrame(id) => id.fmt(f),
            Self::Shape(id) => id.fmt(f),
            Self::Constraint(id) => id.fmt(f),
            Self::Controller(id) => id.fmt(f),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_handle() {
        assert!(BodyId::GROUND.is_ground());
        assert!(!BodyId::new(3).is_ground());
        assert_eq!(BodyId::from(3).index(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(JointId(2).to_string(), "Joint(2)");
        assert_eq!(FrameId::SubFrame(SubFrameId(1)).to_string(), "SubFrame(1)");
        assert_eq!(Entity::Shape(ShapeId(4)).to_string(), "Shape(4)");
    }

    #[test]
    fn test_frame_to_entity() {
        assert_eq!(
            Entity::from(FrameId::Body(BodyId(5))),
            Entity::Body(BodyId(5))
        );
        assert_eq!(
            Entity::from(FrameId::SubFrame(SubFrameId(7))),
            Entity::SubFrame(SubFrameId(7))
        );
        assert_eq!(FrameId::SubFrame(SubFrameId(7)).body_hint(), None);
    }

    #[test]
    fn test_entity_kind() {
        assert_eq!(Entity::Controller(ControllerId(0)).kind(), "controller");
        assert_eq!(Entity::Constraint(ConstraintId(9)).index(), 9);
    }
}
