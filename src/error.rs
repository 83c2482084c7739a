use crate::ecs::NodeId;

/// Errors returned by [`SceneGraph`](crate::SceneGraph) operations.
///
/// Local operations on a [`TransformNode`](crate::TransformNode) never fail.
/// Only resolving handles can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    /// The handle does not name a live node in this graph.
    NoSuchNode(NodeId),
    /// A node still points at a parent that is no longer in the graph.
    DanglingParent { node: NodeId, parent: NodeId },
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformError::NoSuchNode(id) => write!(f, "No such transform node: {}", id),
            TransformError::DanglingParent { node, parent } => {
                write!(f, "{} refers to missing parent {}", node, parent)
            }
        }
    }
}

impl std::error::Error for TransformError {}
