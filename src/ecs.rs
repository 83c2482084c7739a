//! Entity handles for transform nodes.
//!
//! Nodes live in a `hecs` world owned by [`SceneGraph`](crate::SceneGraph).
//! A [`NodeId`] names one of them without owning it, which is how a child
//! refers to its parent: dropping or removing either side never frees the
//! other.
//!
//! Because every node is an entity, callers can hang their own components off
//! it:
//!
//! ```
//! use pivot::SceneGraph;
//!
//! struct Label(&'static str);
//!
//! let mut graph = SceneGraph::new();
//! let id = graph.spawn();
//! graph.world_mut().insert_one(id.entity(), Label("camera")).unwrap();
//!
//! let label = graph.world().get::<&Label>(id.entity()).unwrap();
//! assert_eq!(label.0, "camera");
//! ```

use hecs::Entity;

/// Type-safe, non-owning handle to a node in a [`SceneGraph`](crate::SceneGraph).
///
/// Obtained from [`SceneGraph::spawn`](crate::SceneGraph::spawn) and friends.
/// A handle outlives the node it names; using it afterwards yields
/// [`TransformError::NoSuchNode`](crate::TransformError::NoSuchNode).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) Entity);

impl NodeId {
    /// The underlying entity, for attaching extra components.
    pub fn entity(self) -> Entity {
        self.0
    }
}

impl From<NodeId> for Entity {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node {:?}", self.0)
    }
}
