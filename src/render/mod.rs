//! Boundary between transform nodes and whatever draws them.
//!
//! The scene graph never talks to a GPU. It only needs a [`Renderer`] that
//! keeps a matrix stack and can draw two debug primitives:
//!
//! ```text
//!   SceneGraph::draw(node, renderer)
//!        │
//!        ├── push_matrix()
//!        ├── mult_matrix(global pose)
//!        ├── DrawMode::Marker  → draw_box(..) + draw_axis(..)
//!        │   DrawMode::Custom  → callback(renderer)
//!        │   DrawMode::Hidden  → nothing
//!        └── pop_matrix()      (when the RenderScope drops)
//! ```
//!
//! [`DrawQueue`] is a recording renderer: it resolves the matrix stack on the
//! CPU and collects instances ready for upload.
//!
//! # Example
//!
//! ```
//! use pivot::{DrawQueue, SceneGraph, Vec3};
//!
//! let mut graph = SceneGraph::new();
//! let node = graph.spawn();
//! graph.set_global_position(node, Vec3::new(0.0, 0.0, -5.0)).unwrap();
//!
//! let mut queue = DrawQueue::new();
//! graph.draw(node, &mut queue).unwrap();
//!
//! assert_eq!(queue.commands().len(), 2); // box + axis
//! assert_eq!(queue.depth(), 0);
//! ```

mod draw_queue;

pub use draw_queue::{DrawCommand, DrawInstance, DrawQueue, Primitive};

use glam::Mat4;

/// Matrix-stack renderer consumed by [`SceneGraph::apply_to_render_state`]
/// and [`SceneGraph::draw`].
///
/// [`SceneGraph::apply_to_render_state`]: crate::SceneGraph::apply_to_render_state
/// [`SceneGraph::draw`]: crate::SceneGraph::draw
pub trait Renderer {
    /// Duplicates the current matrix onto the stack.
    fn push_matrix(&mut self);

    /// Post-multiplies the current matrix: `current = current * matrix`.
    fn mult_matrix(&mut self, matrix: Mat4);

    /// Restores the matrix saved by the matching [`push_matrix`](Self::push_matrix).
    fn pop_matrix(&mut self);

    /// Draws an axis-aligned cube of edge `size` at the current matrix.
    fn draw_box(&mut self, size: f32);

    /// Draws RGB coordinate axes of length `size` at the current matrix.
    fn draw_axis(&mut self, size: f32);
}

type DrawFn = Box<dyn Fn(&mut dyn Renderer) + Send + Sync>;

/// How [`SceneGraph::draw`](crate::SceneGraph::draw) visualizes a node.
#[derive(Default)]
pub enum DrawMode {
    /// Box and coordinate axes, sized by [`GraphConfig`](crate::GraphConfig).
    #[default]
    Marker,
    /// Replaces the marker. Runs with the node's pose already applied.
    Custom(DrawFn),
    /// Draws nothing.
    Hidden,
}

impl DrawMode {
    pub fn custom(draw: impl Fn(&mut dyn Renderer) + Send + Sync + 'static) -> Self {
        DrawMode::Custom(Box::new(draw))
    }

    /// True when the default marker has been replaced.
    pub fn is_overridden(&self) -> bool {
        !matches!(self, DrawMode::Marker)
    }
}

impl std::fmt::Debug for DrawMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawMode::Marker => f.write_str("Marker"),
            DrawMode::Custom(_) => f.write_str("Custom(..)"),
            DrawMode::Hidden => f.write_str("Hidden"),
        }
    }
}

/// A pushed matrix scope on a renderer.
///
/// Created by [`SceneGraph::apply_to_render_state`](crate::SceneGraph::apply_to_render_state).
/// The matching `pop_matrix` runs when the scope is dropped or
/// [`restore`](Self::restore)d, so early returns and `?` cannot leave the
/// stack unbalanced. Derefs to the renderer for drawing inside the scope.
pub struct RenderScope<'r, R: Renderer + ?Sized> {
    renderer: &'r mut R,
}

impl<'r, R: Renderer + ?Sized> RenderScope<'r, R> {
    pub(crate) fn push(renderer: &'r mut R, matrix: Mat4) -> Self {
        renderer.push_matrix();
        renderer.mult_matrix(matrix);
        Self { renderer }
    }

    /// Pops the scope now instead of at end of block.
    pub fn restore(self) {}
}

impl<R: Renderer + ?Sized> std::ops::Deref for RenderScope<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> std::ops::DerefMut for RenderScope<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> Drop for RenderScope<'_, R> {
    fn drop(&mut self) {
        self.renderer.pop_matrix();
    }
}
