//! Recording renderer with a CPU-side matrix stack.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use log::warn;

use super::Renderer;

/// Debug primitive kinds a [`DrawQueue`] can record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Primitive {
    Box = 0,
    Axis = 1,
}

/// A queued primitive with the matrix that was current when it was drawn.
///
/// # Fields
///
/// * `primitive` - What to draw
/// * `size` - Edge length for boxes, arm length for axes
/// * `model` - Fully resolved model matrix (every pushed scope multiplied in)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    pub primitive: Primitive,
    pub size: f32,
    pub model: Mat4,
}

/// GPU-ready instance record, 80 bytes.
///
/// | Field  | Format        | Offset |
/// |--------|---------------|--------|
/// | model  | 4 × Float32x4 | 0      |
/// | params | Float32x4     | 64     |
///
/// `params` is `[size, primitive as f32, 0.0, 0.0]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawInstance {
    pub model: [[f32; 4]; 4],
    pub params: [f32; 4],
}

impl From<&DrawCommand> for DrawInstance {
    fn from(cmd: &DrawCommand) -> Self {
        Self {
            model: cmd.model.to_cols_array_2d(),
            params: [cmd.size, cmd.primitive as u32 as f32, 0.0, 0.0],
        }
    }
}

/// Matrix stack plus per-frame draw list.
///
/// The bottom of the stack is the identity and can never be popped; an
/// unbalanced pop is ignored and logged.
///
/// # Usage Pattern
///
/// ```
/// use pivot::{DrawQueue, Mat4, Renderer, Vec3};
///
/// let mut queue = DrawQueue::new();
/// queue.push_matrix();
/// queue.mult_matrix(Mat4::from_translation(Vec3::X));
/// queue.draw_box(1.0);
/// queue.pop_matrix();
///
/// let instances = queue.instances();
/// let bytes: &[u8] = bytemuck::cast_slice(&instances);
/// assert_eq!(bytes.len(), 80);
///
/// // After the frame has been consumed:
/// queue.clear_queue();
/// assert!(queue.commands().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct DrawQueue {
    stack: Vec<Mat4>,
    commands: Vec<DrawCommand>,
}

impl DrawQueue {
    pub fn new() -> Self {
        Self {
            stack: vec![Mat4::IDENTITY],
            commands: Vec::new(),
        }
    }

    /// Number of scopes currently pushed.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// The matrix new primitives would be drawn with.
    pub fn current_matrix(&self) -> Mat4 {
        *self.stack.last().unwrap_or(&Mat4::IDENTITY)
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands converted to [`DrawInstance`] records, in draw order.
    pub fn instances(&self) -> Vec<DrawInstance> {
        self.commands.iter().map(DrawInstance::from).collect()
    }

    /// Clears recorded commands for the next frame. The matrix stack is left
    /// alone.
    pub fn clear_queue(&mut self) {
        self.commands.clear();
    }

    fn record(&mut self, primitive: Primitive, size: f32) {
        let model = self.current_matrix();
        self.commands.push(DrawCommand {
            primitive,
            size,
            model,
        });
    }
}

impl Default for DrawQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for DrawQueue {
    fn push_matrix(&mut self) {
        let top = self.current_matrix();
        self.stack.push(top);
    }

    fn mult_matrix(&mut self, matrix: Mat4) {
        if let Some(top) = self.stack.last_mut() {
            *top *= matrix;
        }
    }

    fn pop_matrix(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            warn!(target: "render", "pop_matrix without matching push_matrix, ignored");
        }
    }

    fn draw_box(&mut self, size: f32) {
        self.record(Primitive::Box, size);
    }

    fn draw_axis(&mut self, size: f32) {
        self.record(Primitive::Axis, size);
    }
}
