/// Scene-wide settings for a [`SceneGraph`](crate::SceneGraph).
///
/// # Example
/// ```
/// use pivot::{GraphConfig, SceneGraph};
///
/// let graph = SceneGraph::with_config(GraphConfig::new().marker_sizes(0.5, 1.0));
/// assert_eq!(graph.config().marker_box_size, 0.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphConfig {
    /// Edge length of the box drawn by [`DrawMode::Marker`](crate::DrawMode::Marker).
    pub marker_box_size: f32,
    /// Arm length of the axes drawn by [`DrawMode::Marker`](crate::DrawMode::Marker).
    pub marker_axis_size: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            marker_box_size: 10.0,
            marker_axis_size: 20.0,
        }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_sizes(mut self, box_size: f32, axis_size: f32) -> Self {
        self.marker_box_size = box_size;
        self.marker_axis_size = axis_size;
        self
    }
}
