//! A [`RenderContext`] that records calls instead of drawing.
//!
//! Used as the test double for the decoder and by the replay tool to print
//! what a buffer would have drawn.

use std::fmt;

use lcmgl_protocol::{
    Attribute, PrimitiveMode, Rgba, Shape, Text, TextureCompression, TextureFormat, TextureUpload,
    TexturedQuad, Transform, Vertex,
};

use crate::context::{BackendError, RenderContext};

/// One accepted adapter call, with borrowed operands copied out.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Begin(PrimitiveMode),
    End,
    Vertex(Vertex),
    Normal([f32; 3]),
    Color(Rgba),
    Attribute(Attribute),
    PushMatrix,
    PopMatrix,
    PushAttrib(u32),
    PopAttrib,
    Transform(Transform),
    Shape(Shape),
    Text {
        font: u32,
        position: [f64; 3],
        flags: u32,
        text: String,
    },
    Texture {
        id: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        compression: TextureCompression,
        len: usize,
    },
    TexturedQuad(TexturedQuad),
}

impl fmt::Display for RecordedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin(mode) => write!(f, "begin {mode:?}"),
            Self::End => f.write_str("end"),
            Self::Vertex(Vertex::Xy([x, y])) => write!(f, "vertex ({x}, {y})"),
            Self::Vertex(Vertex::Xyz([x, y, z])) => write!(f, "vertex ({x}, {y}, {z})"),
            Self::Normal([x, y, z]) => write!(f, "normal ({x}, {y}, {z})"),
            Self::Color(c) => write!(f, "color ({}, {}, {}, {})", c.r, c.g, c.b, c.a),
            Self::Attribute(a) => write!(f, "attribute {a:?}"),
            Self::PushMatrix => f.write_str("push_matrix"),
            Self::PopMatrix => f.write_str("pop_matrix"),
            Self::PushAttrib(mask) => write!(f, "push_attrib {mask:#x}"),
            Self::PopAttrib => f.write_str("pop_attrib"),
            Self::Transform(t) => write!(f, "transform {t:?}"),
            Self::Shape(s) => write!(f, "shape {s:?}"),
            Self::Text { position, text, .. } => write!(
                f,
                "text {text:?} at ({}, {}, {})",
                position[0], position[1], position[2]
            ),
            Self::Texture {
                id,
                width,
                height,
                format,
                compression,
                len,
            } => write!(
                f,
                "texture {id} {width}x{height} {format:?} {compression:?} ({len} bytes)"
            ),
            Self::TexturedQuad(q) => write!(f, "textured_quad {}", q.id),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingContext {
    calls: Vec<RecordedCall>,
    texture_budget: Option<usize>,
    texture_bytes: usize,
    fail_at: Option<(usize, BackendError)>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject texture uploads once `bytes` of texture data have been accepted.
    pub fn with_texture_budget(mut self, bytes: usize) -> Self {
        self.texture_budget = Some(bytes);
        self
    }

    /// Reject the call that would become the `index`th recorded call
    /// (0-based) with `err`.
    pub fn fail_at(mut self, index: usize, err: BackendError) -> Self {
        self.fail_at = Some((index, err));
        self
    }

    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<RecordedCall> {
        std::mem::take(&mut self.calls)
    }

    /// Texture bytes accepted so far.
    pub fn texture_bytes(&self) -> usize {
        self.texture_bytes
    }

    /// Forget recorded calls and accepted texture bytes.
    pub fn clear(&mut self) {
        self.calls.clear();
        self.texture_bytes = 0;
    }

    fn record(&mut self, call: RecordedCall) -> Result<(), BackendError> {
        if let Some((index, err)) = &self.fail_at {
            if *index == self.calls.len() {
                return Err(err.clone());
            }
        }
        self.calls.push(call);
        Ok(())
    }
}

impl RenderContext for RecordingContext {
    fn begin(&mut self, mode: PrimitiveMode) -> Result<(), BackendError> {
        self.record(RecordedCall::Begin(mode))
    }

    fn end(&mut self) -> Result<(), BackendError> {
        self.record(RecordedCall::End)
    }

    fn vertex(&mut self, vertex: Vertex) -> Result<(), BackendError> {
        self.record(RecordedCall::Vertex(vertex))
    }

    fn normal(&mut self, normal: [f32; 3]) -> Result<(), BackendError> {
        self.record(RecordedCall::Normal(normal))
    }

    fn color(&mut self, color: Rgba) -> Result<(), BackendError> {
        self.record(RecordedCall::Color(color))
    }

    fn set_attribute(&mut self, attribute: Attribute) -> Result<(), BackendError> {
        self.record(RecordedCall::Attribute(attribute))
    }

    fn push_matrix(&mut self) -> Result<(), BackendError> {
        self.record(RecordedCall::PushMatrix)
    }

    fn pop_matrix(&mut self) -> Result<(), BackendError> {
        self.record(RecordedCall::PopMatrix)
    }

    fn push_attrib(&mut self, mask: u32) -> Result<(), BackendError> {
        self.record(RecordedCall::PushAttrib(mask))
    }

    fn pop_attrib(&mut self) -> Result<(), BackendError> {
        self.record(RecordedCall::PopAttrib)
    }

    fn transform(&mut self, transform: Transform) -> Result<(), BackendError> {
        self.record(RecordedCall::Transform(transform))
    }

    fn draw_shape(&mut self, shape: Shape) -> Result<(), BackendError> {
        self.record(RecordedCall::Shape(shape))
    }

    fn draw_text(&mut self, text: &Text<'_>) -> Result<(), BackendError> {
        self.record(RecordedCall::Text {
            font: text.font,
            position: text.position,
            flags: text.flags,
            text: text.text.clone().into_owned(),
        })
    }

    fn upload_texture(&mut self, texture: &TextureUpload<'_>) -> Result<(), BackendError> {
        let requested = texture.data.len();
        if let Some(budget) = self.texture_budget {
            let available = budget.saturating_sub(self.texture_bytes);
            if requested > available {
                return Err(BackendError::OutOfMemory {
                    requested,
                    available,
                });
            }
        }
        self.record(RecordedCall::Texture {
            id: texture.id,
            width: texture.width,
            height: texture.height,
            format: texture.format,
            compression: texture.compression,
            len: requested,
        })?;
        self.texture_bytes += requested;
        Ok(())
    }

    fn draw_textured_quad(&mut self, quad: &TexturedQuad) -> Result<(), BackendError> {
        self.record(RecordedCall::TexturedQuad(*quad))
    }
}
