//! # Pivot
//!
//! **Hierarchical 3D transform nodes with world-space queries.**
//!
//! Each node holds a local position, orientation, and scale and may be
//! parented to another node. Ask for world-space values, set them, aim nodes
//! with look-at, or swing them around a point, and the parent chain is
//! resolved for you.
//!
//! ## Quick Start
//!
//! ```
//! use pivot::*;
//!
//! let mut graph = SceneGraph::new();
//!
//! let sun = graph.spawn();
//! let planet = graph.spawn_child(sun, Trs::from_position(Vec3::new(10.0, 0.0, 0.0))).unwrap();
//! let camera = graph.spawn();
//!
//! // Spin the sun; the planet follows.
//! graph.node_mut(sun).unwrap().pan(90.0);
//! let p = graph.global_position(planet).unwrap();
//! assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -10.0), 1e-4));
//!
//! // Park the camera on a sphere around the planet, facing it.
//! graph.orbit_node(camera, 45.0, 30.0, 5.0, planet).unwrap();
//!
//! // Draw every node's debug marker.
//! let mut queue = DrawQueue::new();
//! for id in [sun, planet, camera] {
//!     graph.draw(id, &mut queue).unwrap();
//! }
//! assert_eq!(queue.commands().len(), 6);
//! ```
//!
//! ## Philosophy
//!
//! - **Handles, not pointers**: A child names its parent by [`NodeId`]. Nodes never own each other.
//! - **No hidden caches**: World matrices are recomputed on every query.
//! - **Explicit renderer**: Drawing takes a [`Renderer`] argument; there is no global current renderer.
//! - **Hooks, not subclasses**: Change notifications and custom drawing are plain closures.

mod config;
mod ecs;
mod error;
mod graph;
mod node;
mod render;
mod trs;

pub use config::GraphConfig;
pub use ecs::NodeId;
pub use error::TransformError;
pub use graph::{ORBIT_LATITUDE_LIMIT, SceneGraph};
pub use node::{NodeHooks, TransformNode};
pub use render::{
    DrawCommand, DrawInstance, DrawMode, DrawQueue, Primitive, RenderScope, Renderer,
};
pub use trs::Trs;

// Re-export glam math types for convenience
pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec3, Vec4};

// Node storage
pub use hecs::{Entity, Ref, RefMut, World};
