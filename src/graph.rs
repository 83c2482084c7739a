//! Node storage, parenting, and everything that needs the parent chain.
//!
//! A [`SceneGraph`] owns every [`TransformNode`] in an entity arena. Nodes
//! refer to their parent by [`NodeId`] only; the graph resolves the chain on
//! demand, every time, with no cached world matrices.
//!
//! # Conventions
//!
//! Matrices follow glam's column-vector convention. A node's world matrix is
//! `parent_world * local`, applied right to left up the chain. Angles are in
//! degrees. Nodes face down their local −Z axis.
//!
//! # Example
//!
//! ```
//! use pivot::{SceneGraph, Vec3};
//!
//! let mut graph = SceneGraph::new();
//! let arm = graph.spawn();
//! let hand = graph.spawn();
//! graph.set_parent(hand, arm, false).unwrap();
//! graph.node_mut(hand).unwrap().set_position(Vec3::X);
//!
//! graph.node_mut(arm).unwrap().move_by(Vec3::new(5.0, 0.0, 0.0));
//! assert_eq!(graph.global_position(hand).unwrap(), Vec3::new(6.0, 0.0, 0.0));
//! ```
//!
//! # Hazards
//!
//! - Parent chains must not loop. Debug builds assert this in
//!   [`set_parent`](SceneGraph::set_parent); release builds spin forever when
//!   walking a cycle.
//! - [`global_scale`](SceneGraph::global_scale) multiplies local scales and
//!   ignores shear introduced by rotated, non-uniformly scaled ancestors.

use glam::{Mat3, Mat4, Quat, Vec3};
use hecs::{Ref, RefMut, World};
use log::{debug, trace, warn};

use crate::config::GraphConfig;
use crate::ecs::NodeId;
use crate::error::TransformError;
use crate::node::TransformNode;
use crate::render::{DrawMode, RenderScope, Renderer};
use crate::trs::Trs;

/// Orbit latitude is clamped to this many degrees either side of the equator.
pub const ORBIT_LATITUDE_LIMIT: f32 = 89.0;

type Result<T> = std::result::Result<T, TransformError>;

/// Arena of transform nodes plus the operations that walk parent chains.
pub struct SceneGraph {
    world: World,
    config: GraphConfig,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            world: World::new(),
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// The backing world, for querying extra components attached to nodes.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the backing world.
    ///
    /// Despawning a node's entity through this bypasses
    /// [`remove`](Self::remove); its children then report
    /// [`TransformError::DanglingParent`].
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Adds an identity root node.
    pub fn spawn(&mut self) -> NodeId {
        self.insert(TransformNode::new())
    }

    /// Adds a root node with the given local transform.
    pub fn spawn_with(&mut self, trs: Trs) -> NodeId {
        self.insert(TransformNode::from_trs(trs))
    }

    /// Adds a node whose local transform is expressed against `parent`.
    pub fn spawn_child(&mut self, parent: NodeId, trs: Trs) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.spawn_with(trs);
        self.set_parent(id, parent, false)?;
        Ok(id)
    }

    /// Adds a prepared node (hooks, draw mode) as a root.
    pub fn insert(&mut self, mut node: TransformNode) -> NodeId {
        node.parent = None;
        NodeId(self.world.spawn((node,)))
    }

    /// Removes a node and despawns its entity.
    ///
    /// Children are detached first with their world pose preserved, so no
    /// node is ever left pointing at the removed one.
    ///
    /// If `id` itself hangs off a dangling parent, its world pose cannot be
    /// resolved and the children keep their local values instead.
    pub fn remove(&mut self, id: NodeId) -> Result<TransformNode> {
        self.node(id)?;
        let maintain_global = match self.global_transform_matrix(id) {
            Ok(_) => true,
            Err(err) => {
                warn!("{}: children of {} detached without keeping world pose", err, id);
                false
            }
        };
        for child in self.children(id)? {
            self.clear_parent(child, maintain_global)?;
            debug!("{} detached from removed parent {}", child, id);
        }
        let node = self
            .world
            .remove_one::<TransformNode>(id.0)
            .map_err(|_| TransformError::NoSuchNode(id))?;
        // The entity may carry caller components; they go with it.
        self.world
            .despawn(id.0)
            .map_err(|_| TransformError::NoSuchNode(id))?;
        debug!("{} removed", id);
        Ok(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.world.get::<&TransformNode>(id.0).is_ok()
    }

    /// Number of transform nodes.
    pub fn len(&self) -> usize {
        self.world.query::<&TransformNode>().iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Result<Ref<'_, TransformNode>> {
        self.world
            .get::<&TransformNode>(id.0)
            .map_err(|_| TransformError::NoSuchNode(id))
    }

    /// Borrows a node for local mutation.
    ///
    /// The borrow must be dropped before calling any other graph method that
    /// reads nodes.
    pub fn node_mut(&self, id: NodeId) -> Result<RefMut<'_, TransformNode>> {
        self.world
            .get::<&mut TransformNode>(id.0)
            .map_err(|_| TransformError::NoSuchNode(id))
    }

    // ------------------------------------------------------------------
    // Parenting
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Direct children of `id`, in no particular order.
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.node(id)?;
        Ok(self
            .world
            .query::<&TransformNode>()
            .iter()
            .filter(|(_, node)| node.parent == Some(id))
            .map(|(entity, _)| NodeId(entity))
            .collect())
    }

    /// Parent, grandparent, and so on up to the root.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut child = id;
        let mut next = self.parent(id)?;
        while let Some(parent) = next {
            chain.push(parent);
            next = self
                .parent(parent)
                .map_err(|_| TransformError::DanglingParent {
                    node: child,
                    parent,
                })?;
            child = parent;
        }
        Ok(chain)
    }

    /// Expresses `child` against `parent` from now on.
    ///
    /// With `maintain_global`, the child's local matrix is rewritten so its
    /// world pose does not change. Without it, the old local values are kept
    /// and reinterpreted in the new parent's space.
    ///
    /// `parent` must not be `child` or one of its descendants.
    pub fn set_parent(
        &mut self,
        child: NodeId,
        parent: NodeId,
        maintain_global: bool,
    ) -> Result<()> {
        self.node(child)?;
        self.node(parent)?;
        debug_assert!(
            parent != child
                && self
                    .ancestors(parent)
                    .map(|chain| !chain.contains(&child))
                    .unwrap_or(true),
            "{} cannot be parented to its own descendant {}",
            child,
            parent
        );

        if maintain_global {
            let global = self.global_transform_matrix(child)?;
            let parent_global = self.global_transform_matrix(parent)?;
            let mut node = self.node_mut(child)?;
            node.parent = Some(parent);
            node.set_transform_matrix(parent_global.inverse() * global);
        } else {
            self.node_mut(child)?.parent = Some(parent);
        }
        debug!("{} parented to {} (maintain_global: {})", child, parent, maintain_global);
        Ok(())
    }

    /// Makes `id` a root.
    ///
    /// With `maintain_global`, the current world matrix becomes the local
    /// matrix. Without it, the local values are kept and now read as world
    /// values.
    pub fn clear_parent(&mut self, id: NodeId, maintain_global: bool) -> Result<()> {
        if maintain_global {
            let global = self.global_transform_matrix(id)?;
            let mut node = self.node_mut(id)?;
            node.parent = None;
            node.set_transform_matrix(global);
        } else {
            self.node_mut(id)?.parent = None;
        }
        debug!("{} parent cleared (maintain_global: {})", id, maintain_global);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Global queries
    // ------------------------------------------------------------------

    /// Local matrix composed with every ancestor's, recomputed on each call.
    pub fn global_transform_matrix(&self, id: NodeId) -> Result<Mat4> {
        let (mut matrix, mut next) = {
            let node = self.node(id)?;
            (node.local_transform_matrix(), node.parent)
        };
        let mut child = id;
        let mut depth = 0usize;
        while let Some(parent) = next {
            let node = self
                .world
                .get::<&TransformNode>(parent.0)
                .map_err(|_| TransformError::DanglingParent {
                    node: child,
                    parent,
                })?;
            matrix = node.local_transform_matrix() * matrix;
            next = node.parent;
            child = parent;

            depth += 1;
            debug_assert!(
                depth <= self.world.len() as usize,
                "parent chain of {} loops",
                id
            );
        }
        Ok(matrix)
    }

    pub fn global_position(&self, id: NodeId) -> Result<Vec3> {
        Ok(self.global_transform_matrix(id)?.w_axis.truncate())
    }

    pub fn global_orientation(&self, id: NodeId) -> Result<Quat> {
        let (_, rotation, _) = self.global_transform_matrix(id)?.to_scale_rotation_translation();
        Ok(rotation)
    }

    /// Product of local scales up the chain.
    ///
    /// Exact for uniform or axis-aligned scales only: shear from a rotated,
    /// non-uniformly scaled ancestor is not represented.
    pub fn global_scale(&self, id: NodeId) -> Result<Vec3> {
        let (mut scale, mut next) = {
            let node = self.node(id)?;
            (node.scale(), node.parent)
        };
        let mut child = id;
        while let Some(parent) = next {
            let node = self
                .world
                .get::<&TransformNode>(parent.0)
                .map_err(|_| TransformError::DanglingParent {
                    node: child,
                    parent,
                })?;
            scale *= node.scale();
            next = node.parent;
            child = parent;
        }
        Ok(scale)
    }

    /// World matrix of the parent of `id`, if it has one.
    fn parent_global(&self, id: NodeId) -> Result<Option<Mat4>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(None);
        };
        match self.global_transform_matrix(parent) {
            Ok(matrix) => Ok(Some(matrix)),
            Err(TransformError::NoSuchNode(missing)) if missing == parent => {
                Err(TransformError::DanglingParent { node: id, parent })
            }
            Err(err) => Err(err),
        }
    }

    // ------------------------------------------------------------------
    // Global setters
    // ------------------------------------------------------------------

    /// Moves `id` so its world position is `position`.
    pub fn set_global_position(&mut self, id: NodeId, position: impl Into<Vec3>) -> Result<()> {
        let position = position.into();
        let local = match self.parent_global(id)? {
            Some(parent_global) => parent_global.inverse().transform_point3(position),
            None => position,
        };
        self.node_mut(id)?.set_position(local);
        Ok(())
    }

    /// Rotates `id` so its world orientation is `orientation`.
    pub fn set_global_orientation(&mut self, id: NodeId, orientation: Quat) -> Result<()> {
        let local = match self.parent_global(id)? {
            Some(parent_global) => {
                let (_, rotation, _) = (parent_global.inverse() * Mat4::from_quat(orientation))
                    .to_scale_rotation_translation();
                rotation
            }
            None => orientation,
        };
        self.node_mut(id)?.set_orientation(local);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Derived motion
    // ------------------------------------------------------------------

    /// Swings the world position of `id` about `point` by `rotation`.
    ///
    /// Orientation is not changed, but the orientation hook still fires,
    /// followed by a second position notification.
    pub fn rotate_around(
        &mut self,
        id: NodeId,
        rotation: Quat,
        point: impl Into<Vec3>,
    ) -> Result<()> {
        let point = point.into();
        let global = self.global_position(id)?;
        self.set_global_position(id, rotation * (global - point) + point)?;

        let mut node = self.node_mut(id)?;
        node.notify_orientation_changed();
        node.notify_position_changed();
        Ok(())
    }

    pub fn rotate_around_by_degrees(
        &mut self,
        id: NodeId,
        degrees: f32,
        axis: impl Into<Vec3>,
        point: impl Into<Vec3>,
    ) -> Result<()> {
        let rotation = Quat::from_axis_angle(axis.into().normalize_or_zero(), degrees.to_radians());
        self.rotate_around(id, rotation, point)
    }

    /// Turns `id` so its −Z axis points at `target`, with world +Y as up.
    pub fn look_at(&mut self, id: NodeId, target: impl Into<Vec3>) -> Result<()> {
        self.look_at_with_up(id, target, Vec3::Y)
    }

    /// Turns `id` so its −Z axis points at `target`.
    ///
    /// `up` is carried into the parent's space as a point, so a translated
    /// parent shifts it. When the node already sits on `target` nothing
    /// happens.
    pub fn look_at_with_up(
        &mut self,
        id: NodeId,
        target: impl Into<Vec3>,
        up: impl Into<Vec3>,
    ) -> Result<()> {
        let target = target.into();
        let mut up = up.into();
        if let Some(parent_global) = self.parent_global(id)? {
            up = parent_global.inverse().transform_point3(up);
        }

        let z_axis = (self.global_position(id)? - target).normalize_or_zero();
        if z_axis.length() > 0.0 {
            let x_axis = up.cross(z_axis).normalize_or_zero();
            let y_axis = z_axis.cross(x_axis);
            let rotation = Quat::from_mat3(&Mat3::from_cols(x_axis, y_axis, z_axis));
            self.set_global_orientation(id, rotation)?;
        } else {
            trace!("{} already at look-at target {}, orientation kept", id, target);
        }
        Ok(())
    }

    pub fn look_at_node(&mut self, id: NodeId, target: NodeId) -> Result<()> {
        self.look_at_node_with_up(id, target, Vec3::Y)
    }

    pub fn look_at_node_with_up(
        &mut self,
        id: NodeId,
        target: NodeId,
        up: impl Into<Vec3>,
    ) -> Result<()> {
        let target = self.global_position(target)?;
        self.look_at_with_up(id, target, up)
    }

    /// Places `id` on a sphere of `radius` around `center` and faces it
    /// inwards.
    ///
    /// Starting from `(0, 0, radius)`, the offset is rotated about X by
    /// `latitude` (clamped to ±[`ORBIT_LATITUDE_LIMIT`]), then about Y by
    /// `longitude`. The result is written as the local position.
    pub fn orbit(
        &mut self,
        id: NodeId,
        longitude: f32,
        latitude: f32,
        radius: f32,
        center: impl Into<Vec3>,
    ) -> Result<()> {
        let center = center.into();
        let latitude = latitude.clamp(-ORBIT_LATITUDE_LIMIT, ORBIT_LATITUDE_LIMIT);

        let offset = Vec3::new(0.0, 0.0, radius);
        let offset = Quat::from_rotation_x(latitude.to_radians()) * offset;
        let offset = Quat::from_rotation_y(longitude.to_radians()) * offset;
        self.node_mut(id)?.set_position(center + offset);

        self.look_at(id, center)
    }

    pub fn orbit_node(
        &mut self,
        id: NodeId,
        longitude: f32,
        latitude: f32,
        radius: f32,
        center: NodeId,
    ) -> Result<()> {
        let center = self.global_position(center)?;
        self.orbit(id, longitude, latitude, radius, center)
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Pushes a matrix scope on `renderer` and multiplies in the world matrix
    /// of `id`. The scope pops when dropped.
    pub fn apply_to_render_state<'r, R: Renderer + ?Sized>(
        &self,
        id: NodeId,
        renderer: &'r mut R,
    ) -> Result<RenderScope<'r, R>> {
        let matrix = self.global_transform_matrix(id)?;
        Ok(RenderScope::push(renderer, matrix))
    }

    /// Visualizes `id` according to its [`DrawMode`].
    ///
    /// The scope uses the world position and orientation only; world scale is
    /// not applied to the marker.
    pub fn draw(&self, id: NodeId, renderer: &mut dyn Renderer) -> Result<()> {
        let pose = Mat4::from_rotation_translation(
            self.global_orientation(id)?,
            self.global_position(id)?,
        );
        let node = self.node(id)?;
        let mut scope = RenderScope::push(renderer, pose);
        match node.draw_mode() {
            DrawMode::Marker => {
                scope.draw_box(self.config.marker_box_size);
                scope.draw_axis(self.config.marker_axis_size);
            }
            DrawMode::Custom(draw) => draw(&mut *scope),
            DrawMode::Hidden => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn spawn_and_remove() {
        let mut graph = SceneGraph::new();
        assert!(graph.is_empty());
        let a = graph.spawn();
        let b = graph.spawn_with(Trs::from_position(Vec3::Y));
        assert_eq!(graph.len(), 2);

        let removed = graph.remove(b).unwrap();
        assert_eq!(removed.position(), Vec3::Y);
        assert!(!graph.contains(b));
        assert!(graph.contains(a));
        assert_eq!(graph.remove(b).unwrap_err(), TransformError::NoSuchNode(b));
    }

    #[test]
    fn insert_drops_foreign_parent() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn();
        let b = graph.spawn();
        graph.set_parent(b, a, false).unwrap();
        let node = graph.remove(b).unwrap();
        assert_eq!(node.parent(), Some(a));

        let again = graph.insert(node);
        assert_eq!(graph.parent(again).unwrap(), None);
    }

    #[test]
    fn children_and_ancestors() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn();
        let mid = graph.spawn_child(root, Trs::new()).unwrap();
        let leaf = graph.spawn_child(mid, Trs::new()).unwrap();
        let other = graph.spawn_child(root, Trs::new()).unwrap();

        let mut kids = graph.children(root).unwrap();
        kids.sort();
        let mut expected = vec![mid, other];
        expected.sort();
        assert_eq!(kids, expected);
        assert_eq!(graph.ancestors(leaf).unwrap(), vec![mid, root]);
        assert!(graph.ancestors(root).unwrap().is_empty());
    }

    #[test]
    fn despawned_parent_is_reported() {
        let mut graph = SceneGraph::new();
        let parent = graph.spawn();
        let child = graph.spawn_child(parent, Trs::new()).unwrap();

        graph.world_mut().despawn(parent.entity()).unwrap();
        assert_eq!(
            graph.global_transform_matrix(child).unwrap_err(),
            TransformError::DanglingParent {
                node: child,
                parent
            }
        );
        assert_eq!(
            graph.set_global_position(child, Vec3::ONE).unwrap_err(),
            TransformError::DanglingParent {
                node: child,
                parent
            }
        );

        graph.clear_parent(child, false).unwrap();
        assert!(graph.global_transform_matrix(child).is_ok());
    }

    #[test]
    fn remove_under_dangling_parent_keeps_child_locals() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn();
        let mid = graph.spawn_child(root, Trs::new()).unwrap();
        let leaf = graph
            .spawn_child(mid, Trs::from_position(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();

        graph.world_mut().despawn(root.entity()).unwrap();
        graph.remove(mid).unwrap();

        assert!(!graph.contains(mid));
        assert_eq!(graph.parent(leaf).unwrap(), None);
        assert_eq!(graph.node(leaf).unwrap().position(), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn global_scale_multiplies_up_the_chain() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn_with(Trs::new().uniform_scale(2.0));
        let child = graph
            .spawn_child(root, Trs::new().scale(Vec3::new(1.0, 3.0, 0.5)))
            .unwrap();
        assert!(graph
            .global_scale(child)
            .unwrap()
            .abs_diff_eq(Vec3::new(2.0, 6.0, 1.0), EPS));
    }

    #[test]
    fn rotate_around_keeps_orientation() {
        let mut graph = SceneGraph::new();
        let id = graph.spawn_with(Trs::from_position(Vec3::new(2.0, 0.0, 0.0)));
        graph
            .rotate_around_by_degrees(id, 90.0, Vec3::Y, Vec3::new(1.0, 0.0, 0.0))
            .unwrap();

        assert!(graph
            .global_position(id)
            .unwrap()
            .abs_diff_eq(Vec3::new(1.0, 0.0, -1.0), EPS));
        assert_eq!(graph.node(id).unwrap().orientation(), Quat::IDENTITY);
    }

    #[test]
    fn orbit_clamps_latitude() {
        let mut graph = SceneGraph::new();
        let id = graph.spawn();
        graph.orbit(id, 0.0, 120.0, 1.0, Vec3::ZERO).unwrap();

        let p = graph.node(id).unwrap().position();
        let expected = Quat::from_rotation_x(89f32.to_radians()) * Vec3::Z;
        assert!(p.abs_diff_eq(expected, EPS));
    }

    #[test]
    fn draw_custom_runs_in_pose_scope() {
        use crate::render::{DrawQueue, Primitive};

        let mut graph = SceneGraph::new();
        let id = graph.insert(
            TransformNode::from_trs(Trs::from_position(Vec3::new(0.0, 3.0, 0.0)))
                .with_draw_mode(DrawMode::custom(|r| r.draw_box(0.25))),
        );
        let hidden = graph.insert(TransformNode::new().with_draw_mode(DrawMode::Hidden));

        let mut queue = DrawQueue::new();
        graph.draw(id, &mut queue).unwrap();
        graph.draw(hidden, &mut queue).unwrap();

        let cmds = queue.commands();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].primitive, Primitive::Box);
        assert_eq!(cmds[0].size, 0.25);
        assert!(cmds[0]
            .model
            .abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)), EPS));
        assert_eq!(queue.depth(), 0);
    }
}
