//! Error types for multibody operations.

use thiserror::Error;

use crate::ids::{BodyId, Entity, FrameId, JointId, SubFrameId};

/// Errors that can occur while building or stepping a multibody world.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArborError {
    /// A 4×4 matrix is not a rigid homogeneous transform.
    #[error("invalid homogeneous transform: {reason}")]
    InvalidTransform {
        /// What check failed.
        reason: String,
    },

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// A 6×6 matrix is not a valid mass matrix.
    #[error("invalid mass matrix: {reason}")]
    InvalidMassMatrix {
        /// What check failed.
        reason: String,
    },

    /// Shape parameters out of range.
    #[error("invalid shape: {reason}")]
    InvalidShape {
        /// Description of the offending parameter.
        reason: String,
    },

    /// A contact normal could not be built from a vector.
    #[error("degenerate normal: vector norm {norm} is not 1")]
    DegenerateNormal {
        /// Norm of the offending vector.
        norm: f64,
    },

    /// No proximity solver exists for this pair of shape kinds.
    #[error("no proximity solver for the pair ({first}, {second})")]
    UnsupportedShapePair {
        /// Kind of the first shape.
        first: String,
        /// Kind of the second shape.
        second: String,
    },

    /// The child body of a new link already has a parent joint.
    #[error("{body} already has a parent joint")]
    AlreadyHasParent {
        /// The body that would get a second parent.
        body: BodyId,
    },

    /// A frame is not connected to the ground through the body tree.
    #[error("{frame} is not attached to the world tree")]
    DetachedFrame {
        /// The detached frame.
        frame: FrameId,
    },

    /// Joints can only enter a world through `add_link`.
    #[error("{joint} cannot be registered directly, use add_link")]
    JointRegistration {
        /// The rejected joint.
        joint: JointId,
    },

    /// A handle does not designate anything in this world.
    #[error("unknown entity: {entity}")]
    UnknownEntity {
        /// The dangling handle.
        entity: Entity,
    },

    /// Something was read before `World::init` set it up.
    #[error("{what} is not initialized (call World::init first)")]
    NotInitialized {
        /// What was read.
        what: String,
    },

    /// A transient quantity was read before the pass that computes it.
    #[error("{what} is not up to date (run the corresponding update pass first)")]
    NotUpdated {
        /// What was read.
        what: String,
    },

    /// Array sizes do not agree.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which quantity.
        what: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// The impedance matrix could not be inverted.
    #[error("impedance matrix is singular")]
    SingularImpedance,

    /// A constraint admittance block could not be inverted.
    #[error("admittance of constraint {constraint} is singular")]
    SingularAdmittance {
        /// Name or handle of the constraint.
        constraint: String,
    },

    /// A controller needs a joint with a vector configuration space.
    #[error("{joint} does not have a linear configuration space")]
    NotLinearJoint {
        /// The offending joint.
        joint: JointId,
    },

    /// The offset of a fixed subframe cannot change.
    #[error("{subframe} is not a moving subframe")]
    ImmutableSubFrame {
        /// The fixed subframe.
        subframe: SubFrameId,
    },

    /// Bulk naming found names used more than once.
    #[error("duplicate names: {}", .names.join(", "))]
    DuplicateNames {
        /// Every name that appeared more than once.
        names: Vec<String>,
    },

    /// No entity carries the requested name.
    #[error("no entity named {name}")]
    NameNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// A link (or a chain of links) cannot be added to the tree.
    #[error("invalid link: {reason}")]
    InvalidLink {
        /// What is wrong with the link.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl ArborError {
    /// Create an invalid transform error.
    #[must_use]
    pub fn invalid_transform(reason: impl Into<String>) -> Self {
        Self::InvalidTransform {
            reason: reason.into(),
        }
    }

    /// Create an invalid mass matrix error.
    #[must_use]
    pub fn invalid_mass(reason: impl Into<String>) -> Self {
        Self::InvalidMassMatrix {
            reason: reason.into(),
        }
    }

    /// Create an invalid shape error.
    #[must_use]
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            reason: reason.into(),
        }
    }

    /// Create an invalid link error.
    #[must_use]
    pub fn invalid_link(reason: impl Into<String>) -> Self {
        Self::InvalidLink {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a not-initialized error.
    #[must_use]
    pub fn not_initialized(what: impl Into<String>) -> Self {
        Self::NotInitialized { what: what.into() }
    }

    /// Create a not-updated error.
    #[must_use]
    pub fn not_updated(what: impl Into<String>) -> Self {
        Self::NotUpdated { what: what.into() }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this error comes from reading state out of order.
    #[must_use]
    pub fn is_stale_state(&self) -> bool {
        matches!(self, Self::NotInitialized { .. } | Self::NotUpdated { .. })
    }
}
