//! Local state of a single transform node.
//!
//! A [`TransformNode`] owns its position, orientation and scale, the local
//! matrix composed from them, and a cache of its X/Y/Z basis directions. It
//! knows the [`NodeId`] of its parent but never resolves it: anything that
//! needs the parent chain (world-space queries, look-at, orbit) lives on
//! [`SceneGraph`](crate::SceneGraph).
//!
//! # Example
//!
//! ```
//! use pivot::{TransformNode, Vec3};
//!
//! let mut node = TransformNode::new();
//! node.set_position(Vec3::new(0.0, 1.0, 0.0));
//! node.pan(90.0);
//! node.dolly(2.0);
//!
//! // Panning 90 degrees swings local +Z onto world +X.
//! assert!(node.position().abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-5));
//! ```

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::ecs::NodeId;
use crate::render::DrawMode;
use crate::trs::Trs;

type Hook<T> = Box<dyn FnMut(T) + Send + Sync>;

/// Optional change notifications for a node.
///
/// Each slot receives the new local value after the node's matrix has been
/// updated. Empty slots cost nothing.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use pivot::{NodeHooks, TransformNode, Vec3};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let mut node = TransformNode::new().with_hooks(
///     NodeHooks::new().on_position_changed(move |p| sink.lock().unwrap().push(p)),
/// );
///
/// node.move_by(Vec3::X);
/// assert_eq!(seen.lock().unwrap().as_slice(), &[Vec3::X]);
/// ```
#[derive(Default)]
pub struct NodeHooks {
    position: Option<Hook<Vec3>>,
    orientation: Option<Hook<Quat>>,
    scale: Option<Hook<Vec3>>,
}

impl NodeHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_position_changed(mut self, hook: impl FnMut(Vec3) + Send + Sync + 'static) -> Self {
        self.position = Some(Box::new(hook));
        self
    }

    pub fn on_orientation_changed(
        mut self,
        hook: impl FnMut(Quat) + Send + Sync + 'static,
    ) -> Self {
        self.orientation = Some(Box::new(hook));
        self
    }

    pub fn on_scale_changed(mut self, hook: impl FnMut(Vec3) + Send + Sync + 'static) -> Self {
        self.scale = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for NodeHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHooks")
            .field("position", &self.position.is_some())
            .field("orientation", &self.orientation.is_some())
            .field("scale", &self.scale.is_some())
            .finish()
    }
}

/// A node's local transform.
///
/// Invariant: outside of a running mutation, `local_transform_matrix()` equals
/// `Translate(position) * Rotate(orientation) * Scale(scale)`.
///
/// Angles taken by this API are in degrees.
#[derive(Debug)]
pub struct TransformNode {
    position: Vec3,
    orientation: Quat,
    scale: Vec3,
    local_matrix: Mat4,
    axis: [Vec3; 3],
    pub(crate) parent: Option<NodeId>,
    hooks: NodeHooks,
    draw_mode: DrawMode,
}

impl Default for TransformNode {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformNode {
    /// Origin, identity orientation, unit scale, no parent.
    pub fn new() -> Self {
        Self::from_trs(Trs::default())
    }

    /// Seeds a parentless node from a detached TRS value.
    pub fn from_trs(trs: Trs) -> Self {
        let mut node = Self {
            position: trs.position,
            orientation: trs.rotation,
            scale: trs.scale,
            local_matrix: Mat4::IDENTITY,
            axis: [Vec3::X, Vec3::Y, Vec3::Z],
            parent: None,
            hooks: NodeHooks::default(),
            draw_mode: DrawMode::default(),
        };
        node.create_matrix();
        node
    }

    pub fn with_hooks(mut self, hooks: NodeHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_draw_mode(mut self, mode: DrawMode) -> Self {
        self.draw_mode = mode;
        self
    }

    pub fn set_hooks(&mut self, hooks: NodeHooks) {
        self.hooks = hooks;
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.draw_mode = mode;
    }

    pub fn draw_mode(&self) -> &DrawMode {
        &self.draw_mode
    }

    /// The parent this node is expressed against, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Snapshot of the local position, orientation and scale.
    pub fn trs(&self) -> Trs {
        Trs {
            position: self.position,
            rotation: self.orientation,
            scale: self.scale,
        }
    }

    pub fn local_transform_matrix(&self) -> Mat4 {
        self.local_matrix
    }

    /// Replaces the local matrix and decomposes it back into position,
    /// orientation and scale. Shear is discarded.
    ///
    /// Fires all three change hooks.
    pub fn set_transform_matrix(&mut self, matrix: Mat4) {
        self.local_matrix = matrix;
        let (scale, orientation, position) = matrix.to_scale_rotation_translation();
        self.position = position;
        self.orientation = orientation;
        self.scale = scale;
        self.update_axis();

        self.notify_position_changed();
        self.notify_orientation_changed();
        self.notify_scale_changed();
    }

    // ------------------------------------------------------------------
    // Position
    // ------------------------------------------------------------------

    /// Sets the local translation. Only the translation column of the local
    /// matrix is touched.
    pub fn set_position(&mut self, position: impl Into<Vec3>) {
        self.position = position.into();
        self.local_matrix.w_axis = self.position.extend(1.0);
        self.notify_position_changed();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn z(&self) -> f32 {
        self.position.z
    }

    /// Offsets the local translation by `offset`.
    pub fn move_by(&mut self, offset: impl Into<Vec3>) {
        self.position += offset.into();
        self.local_matrix.w_axis = self.position.extend(1.0);
        self.notify_position_changed();
    }

    /// Moves along the cached X axis.
    pub fn truck(&mut self, amount: f32) {
        self.move_by(self.x_axis() * amount);
    }

    /// Moves along the cached Y axis.
    pub fn boom(&mut self, amount: f32) {
        self.move_by(self.y_axis() * amount);
    }

    /// Moves along the cached Z axis.
    pub fn dolly(&mut self, amount: f32) {
        self.move_by(self.z_axis() * amount);
    }

    // ------------------------------------------------------------------
    // Orientation
    // ------------------------------------------------------------------

    /// Sets the local rotation and rebuilds the local matrix.
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
        self.create_matrix();
        self.notify_orientation_changed();
    }

    /// Sets the local rotation from `(pitch, heading, roll)` in degrees.
    ///
    /// The rotation about X is applied first, then Z, then Y on top.
    pub fn set_orientation_euler(&mut self, euler_degrees: impl Into<Vec3>) {
        let e = euler_degrees.into();
        let q = Quat::from_rotation_y(e.y.to_radians())
            * Quat::from_rotation_z(e.z.to_radians())
            * Quat::from_rotation_x(e.x.to_radians());
        self.set_orientation(q);
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Local rotation as `(pitch, heading, roll)` in degrees, decoded in the
    /// same axis order [`set_orientation_euler`](Self::set_orientation_euler)
    /// builds it.
    pub fn orientation_euler(&self) -> Vec3 {
        let (heading, roll, pitch) = self.orientation.to_euler(EulerRot::YZX);
        Vec3::new(pitch.to_degrees(), heading.to_degrees(), roll.to_degrees())
    }

    pub fn pitch(&self) -> f32 {
        self.orientation_euler().x
    }

    pub fn heading(&self) -> f32 {
        self.orientation_euler().y
    }

    pub fn roll(&self) -> f32 {
        self.orientation_euler().z
    }

    /// Composes `delta` after the current orientation, in the node's own frame.
    pub fn rotate(&mut self, delta: Quat) {
        self.orientation *= delta;
        self.create_matrix();
        self.notify_orientation_changed();
    }

    /// Rotates by `degrees` about `axis` expressed in the node's own frame.
    pub fn rotate_by_degrees(&mut self, degrees: f32, axis: impl Into<Vec3>) {
        let axis = axis.into().normalize_or_zero();
        self.rotate(Quat::from_axis_angle(axis, degrees.to_radians()));
    }

    /// Rotates about the node's own X axis.
    ///
    /// The axis is the rotation's, not the cached [`x_axis`](Self::x_axis),
    /// so the turn is unaffected by a cache entry frozen by non-positive scale.
    pub fn tilt(&mut self, degrees: f32) {
        self.rotate_by_degrees(degrees, Vec3::X);
    }

    /// Rotates about the node's own Y axis.
    ///
    /// The axis is the rotation's, not the cached [`y_axis`](Self::y_axis),
    /// so the turn is unaffected by a cache entry frozen by non-positive scale.
    pub fn pan(&mut self, degrees: f32) {
        self.rotate_by_degrees(degrees, Vec3::Y);
    }

    /// Rotates about the node's own Z axis. Named after the camera move, so it
    /// reads as a verb; [`roll`](Self::roll) is the euler getter.
    ///
    /// Like [`tilt`](Self::tilt), this ignores a frozen cached
    /// [`z_axis`](Self::z_axis).
    pub fn roll_by(&mut self, degrees: f32) {
        self.rotate_by_degrees(degrees, Vec3::Z);
    }

    // ------------------------------------------------------------------
    // Scale
    // ------------------------------------------------------------------

    /// Sets the local scale and rebuilds the local matrix.
    ///
    /// Components at or below zero are accepted, but the cached axis for that
    /// component keeps its previous value.
    pub fn set_scale(&mut self, scale: impl Into<Vec3>) {
        self.scale = scale.into();
        self.create_matrix();
        self.notify_scale_changed();
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.set_scale(Vec3::splat(scale));
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Returns to the origin with identity orientation. Scale is kept.
    pub fn reset_transform(&mut self) {
        self.set_position(Vec3::ZERO);
        self.set_orientation_euler(Vec3::ZERO);
    }

    // ------------------------------------------------------------------
    // Axes
    // ------------------------------------------------------------------

    pub fn x_axis(&self) -> Vec3 {
        self.axis[0]
    }

    pub fn y_axis(&self) -> Vec3 {
        self.axis[1]
    }

    pub fn z_axis(&self) -> Vec3 {
        self.axis[2]
    }

    pub fn side_dir(&self) -> Vec3 {
        self.x_axis()
    }

    /// The node faces down its negative Z axis.
    pub fn look_at_dir(&self) -> Vec3 {
        -self.z_axis()
    }

    pub fn up_dir(&self) -> Vec3 {
        self.y_axis()
    }

    fn create_matrix(&mut self) {
        self.local_matrix =
            Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position);
        self.update_axis();
    }

    fn update_axis(&mut self) {
        let columns = [
            self.local_matrix.x_axis,
            self.local_matrix.y_axis,
            self.local_matrix.z_axis,
        ];
        for (i, column) in columns.iter().enumerate() {
            // Non-positive scale leaves the previous axis in place.
            if self.scale[i] > 0.0 {
                self.axis[i] = column.truncate() / self.scale[i];
            }
        }
    }

    pub(crate) fn notify_position_changed(&mut self) {
        let position = self.position;
        if let Some(hook) = self.hooks.position.as_mut() {
            hook(position);
        }
    }

    pub(crate) fn notify_orientation_changed(&mut self) {
        let orientation = self.orientation;
        if let Some(hook) = self.hooks.orientation.as_mut() {
            hook(orientation);
        }
    }

    pub(crate) fn notify_scale_changed(&mut self) {
        let scale = self.scale;
        if let Some(hook) = self.hooks.scale.as_mut() {
            hook(scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;
    use std::sync::{Arc, Mutex};

    const EPS: f32 = 1e-5;

    fn composed(node: &TransformNode) -> Mat4 {
        Mat4::from_scale_rotation_translation(node.scale(), node.orientation(), node.position())
    }

    #[test]
    fn new_node_is_identity() {
        let node = TransformNode::new();
        assert_eq!(node.position(), Vec3::ZERO);
        assert_eq!(node.orientation(), Quat::IDENTITY);
        assert_eq!(node.scale(), Vec3::ONE);
        assert_eq!(node.local_transform_matrix(), Mat4::IDENTITY);
        assert!(node.parent().is_none());
        assert_eq!(node.x_axis(), Vec3::X);
        assert_eq!(node.y_axis(), Vec3::Y);
        assert_eq!(node.z_axis(), Vec3::Z);
    }

    #[test]
    fn local_matrix_tracks_every_setter() {
        let mut node = TransformNode::new();
        node.set_scale(Vec3::new(2.0, 0.5, 3.0));
        node.set_orientation(Quat::from_rotation_y(0.4));
        node.set_position(Vec3::new(1.0, 2.0, 3.0));
        node.move_by(Vec3::new(-1.0, 0.0, 0.5));
        node.tilt(15.0);
        assert!(node
            .local_transform_matrix()
            .abs_diff_eq(composed(&node), EPS));
    }

    #[test]
    fn set_position_only_touches_translation() {
        let mut node = TransformNode::new();
        node.set_orientation(Quat::from_rotation_z(0.3));
        let before = node.local_transform_matrix();

        node.set_position(Vec3::new(7.0, 8.0, 9.0));
        let after = node.local_transform_matrix();
        assert_eq!(after.x_axis, before.x_axis);
        assert_eq!(after.y_axis, before.y_axis);
        assert_eq!(after.z_axis, before.z_axis);
        assert_eq!(after.w_axis, Vec3::new(7.0, 8.0, 9.0).extend(1.0));
    }

    #[test]
    fn transform_matrix_round_trip() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(1.5, 2.0, 0.75),
            Quat::from_euler(EulerRot::XYZ, 0.2, -0.6, 1.1),
            Vec3::new(-3.0, 4.0, 10.0),
        );
        let mut node = TransformNode::new();
        node.set_transform_matrix(m);

        assert!(composed(&node).abs_diff_eq(m, 1e-4));
        assert!(node.local_transform_matrix().abs_diff_eq(m, EPS));
    }

    #[test]
    fn euler_setter_applies_x_then_z_then_y() {
        let mut node = TransformNode::new();
        node.set_orientation_euler(Vec3::new(90.0, 90.0, 0.0));

        // +Y is pitched onto +Z, then headed onto +X.
        let up = node.orientation() * Vec3::Y;
        assert!(up.abs_diff_eq(Vec3::X, EPS));
    }

    #[test]
    fn euler_getter_inverts_setter() {
        let mut node = TransformNode::new();
        node.set_orientation_euler(Vec3::new(20.0, -35.0, 10.0));
        assert!(node
            .orientation_euler()
            .abs_diff_eq(Vec3::new(20.0, -35.0, 10.0), 1e-3));
        assert!((node.pitch() - 20.0).abs() < 1e-3);
        assert!((node.heading() + 35.0).abs() < 1e-3);
        assert!((node.roll() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn rotate_composes_in_local_frame() {
        let mut node = TransformNode::new();
        node.set_orientation(Quat::from_rotation_y(FRAC_PI_2));
        node.rotate(Quat::from_rotation_x(FRAC_PI_2));

        let expected = Quat::from_rotation_y(FRAC_PI_2) * Quat::from_rotation_x(FRAC_PI_2);
        assert!(node.orientation().abs_diff_eq(expected, EPS));
    }

    #[test]
    fn tilt_rotates_about_own_x_axis() {
        let mut node = TransformNode::new();
        node.pan(90.0);
        let side = node.x_axis();

        node.tilt(30.0);
        // The axis being rotated about does not move.
        assert!(node.x_axis().abs_diff_eq(side, EPS));
    }

    #[test]
    fn truck_boom_dolly_follow_cached_axes() {
        let mut node = TransformNode::new();
        node.roll_by(90.0);
        node.truck(1.0);
        assert!(node.position().abs_diff_eq(Vec3::Y, EPS));

        node.boom(1.0);
        assert!(node.position().abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0), EPS));

        node.dolly(2.0);
        assert!(node.position().abs_diff_eq(Vec3::new(-1.0, 1.0, 2.0), EPS));
    }

    #[test]
    fn axes_are_normalized_by_scale() {
        let mut node = TransformNode::new();
        node.set_scale(Vec3::new(4.0, 2.0, 0.5));
        assert!(node.x_axis().abs_diff_eq(Vec3::X, EPS));
        assert!(node.y_axis().abs_diff_eq(Vec3::Y, EPS));
        assert!(node.z_axis().abs_diff_eq(Vec3::Z, EPS));
    }

    #[test]
    fn zero_scale_freezes_cached_axis() {
        let mut node = TransformNode::new();
        node.pan(90.0);
        let frozen = node.x_axis();

        node.set_scale(Vec3::new(0.0, 1.0, 1.0));
        node.set_orientation(Quat::IDENTITY);
        node.move_by(Vec3::X);

        assert_eq!(node.x_axis(), frozen);
        assert!(node.z_axis().abs_diff_eq(Vec3::Z, EPS));
    }

    #[test]
    fn negative_scale_freezes_cached_axis() {
        let mut node = TransformNode::new();
        node.set_scale(Vec3::new(1.0, -2.0, 1.0));
        node.roll_by(90.0);
        assert_eq!(node.y_axis(), Vec3::Y);
        assert!(node.x_axis().abs_diff_eq(Vec3::Y, EPS));
    }

    #[test]
    fn pan_uses_rotation_axis_when_cache_is_frozen() {
        let mut node = TransformNode::new();
        node.roll_by(90.0);
        node.set_scale(Vec3::new(1.0, 0.0, 1.0));
        node.set_orientation(Quat::IDENTITY);
        // Cached Y still points where the roll left it.
        assert!(node.y_axis().abs_diff_eq(Vec3::NEG_X, EPS));

        node.pan(90.0);
        assert!(node
            .orientation()
            .abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), EPS));
    }

    #[test]
    fn reset_transform_keeps_scale() {
        let mut node = TransformNode::new();
        node.set_position(Vec3::splat(3.0));
        node.set_orientation_euler(Vec3::new(10.0, 20.0, 30.0));
        node.set_uniform_scale(5.0);

        node.reset_transform();
        assert_eq!(node.position(), Vec3::ZERO);
        assert!(node.orientation().abs_diff_eq(Quat::IDENTITY, EPS));
        assert_eq!(node.scale(), Vec3::splat(5.0));
    }

    #[test]
    fn direction_helpers_follow_axes() {
        let node = TransformNode::new();
        assert_eq!(node.side_dir(), Vec3::X);
        assert_eq!(node.up_dir(), Vec3::Y);
        assert_eq!(node.look_at_dir(), Vec3::NEG_Z);
    }

    #[test]
    fn set_transform_matrix_fires_every_hook() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (p, o, s) = (log.clone(), log.clone(), log.clone());
        let mut node = TransformNode::new().with_hooks(
            NodeHooks::new()
                .on_position_changed(move |_| p.lock().unwrap().push("position"))
                .on_orientation_changed(move |_| o.lock().unwrap().push("orientation"))
                .on_scale_changed(move |_| s.lock().unwrap().push("scale")),
        );

        node.set_transform_matrix(Mat4::from_translation(Vec3::X));
        assert_eq!(
            log.lock().unwrap().as_slice(),
            &["position", "orientation", "scale"]
        );
    }

    #[test]
    fn hooks_see_new_values() {
        let scales = Arc::new(Mutex::new(Vec::new()));
        let sink = scales.clone();
        let mut node = TransformNode::new()
            .with_hooks(NodeHooks::new().on_scale_changed(move |s| sink.lock().unwrap().push(s)));

        node.set_uniform_scale(3.0);
        node.set_scale(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            scales.lock().unwrap().as_slice(),
            &[Vec3::splat(3.0), Vec3::new(1.0, 2.0, 3.0)]
        );
    }
}
