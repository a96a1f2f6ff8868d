use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The source tree or joint set is malformed. The pass that found it was aborted.
    Structural,
    /// A fixed-size slot or buffer would overflow.
    Capacity,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown node {node} (scene has {node_count} nodes)")]
    UnknownNode { node: usize, node_count: usize },

    #[error("node {node} is part of a cycle in the node graph")]
    NodeCycle { node: usize },

    #[error("node {node} is claimed as a child by both node {first} and node {second}")]
    MultipleParents {
        node: usize,
        first: usize,
        second: usize,
    },

    #[error("node {node} is listed more than once in the skin joint list")]
    DuplicateJoint { node: usize },

    #[error("joint {joint} (node {node}) has child node {child} which is not a skin joint")]
    JointChildNotInSkin {
        joint: usize,
        node: usize,
        child: usize,
    },

    #[error("joint {child} already has parent joint {existing}, cannot also be a child of {parent}")]
    JointParentConflict {
        child: usize,
        existing: usize,
        parent: usize,
    },

    #[error("joint {joint} (node {node}) has {count} joint children, the limit is {limit}")]
    JointChildCapacity {
        joint: usize,
        node: usize,
        count: usize,
        limit: usize,
    },

    #[error("joint {child} is listed under joint {listed_parent} but its parent is {recorded_parent}")]
    LayerParentMismatch {
        child: usize,
        listed_parent: usize,
        recorded_parent: i32,
    },

    #[error("layer scheduling emitted more than {joint_count} joints")]
    LayerOverflow { joint_count: usize },

    #[error("joint {joint} was scheduled into more than one layer")]
    DuplicateLayerEntry { joint: usize },

    #[error("only {scheduled} of {joint_count} joints are reachable from the roots")]
    LayerIncomplete {
        scheduled: usize,
        joint_count: usize,
    },

    #[error("joint {joint} was evaluated before its parent joint {parent}")]
    ParentNotEvaluated { joint: usize, parent: usize },

    #[error("instance count mismatch: {placements} placements but {names} names")]
    InstanceCountMismatch { placements: usize, names: usize },

    #[error("joint count mismatch: expected {expected} joint records, got {actual}")]
    JointCountMismatch { expected: usize, actual: usize },

    #[error("instance {index} out of range (instance count {count})")]
    InstanceOutOfRange { index: usize, count: usize },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownNode { .. }
            | Error::NodeCycle { .. }
            | Error::MultipleParents { .. }
            | Error::DuplicateJoint { .. }
            | Error::JointChildNotInSkin { .. }
            | Error::JointParentConflict { .. }
            | Error::LayerParentMismatch { .. }
            | Error::LayerOverflow { .. }
            | Error::DuplicateLayerEntry { .. }
            | Error::LayerIncomplete { .. }
            | Error::ParentNotEvaluated { .. } => ErrorKind::Structural,
            Error::JointChildCapacity { .. }
            | Error::InstanceCountMismatch { .. }
            | Error::JointCountMismatch { .. }
            | Error::InstanceOutOfRange { .. } => ErrorKind::Capacity,
        }
    }
}
