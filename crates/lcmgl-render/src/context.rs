//! The interface a host implements to receive decoded commands.

use lcmgl_protocol::{
    Attribute, PrimitiveMode, Rgba, Shape, Text, TextureUpload, TexturedQuad, Transform, Vertex,
};

/// Failure reported by a render backend. Any error stops the current buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: usize, available: usize },
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("render context lost")]
    ContextLost,
}

/// Receives the commands of a buffer in stream order.
///
/// All calls for one buffer happen on the thread that called
/// [`Decoder::decode`](crate::Decoder::decode). The decoder pairs every
/// `begin`/`push_*` with its `end`/`pop_*` within a buffer unless decoding
/// fails first; a host that cannot tolerate a partially applied buffer should
/// reset its own state when decoding reports an error.
pub trait RenderContext {
    fn begin(&mut self, mode: PrimitiveMode) -> Result<(), BackendError>;
    fn end(&mut self) -> Result<(), BackendError>;

    fn vertex(&mut self, vertex: Vertex) -> Result<(), BackendError>;
    fn normal(&mut self, normal: [f32; 3]) -> Result<(), BackendError>;
    fn color(&mut self, color: Rgba) -> Result<(), BackendError>;
    fn set_attribute(&mut self, attribute: Attribute) -> Result<(), BackendError>;

    fn push_matrix(&mut self) -> Result<(), BackendError>;
    fn pop_matrix(&mut self) -> Result<(), BackendError>;
    fn push_attrib(&mut self, mask: u32) -> Result<(), BackendError>;
    fn pop_attrib(&mut self) -> Result<(), BackendError>;
    fn transform(&mut self, transform: Transform) -> Result<(), BackendError>;

    fn draw_shape(&mut self, shape: Shape) -> Result<(), BackendError>;
    fn draw_text(&mut self, text: &Text<'_>) -> Result<(), BackendError>;
    fn upload_texture(&mut self, texture: &TextureUpload<'_>) -> Result<(), BackendError>;
    fn draw_textured_quad(&mut self, quad: &TexturedQuad) -> Result<(), BackendError>;
}
