//! Typed operands decoded from a single record.

use std::borrow::Cow;

use crate::opcode::Opcode;
use crate::reader::{ByteReader, ReadError, Record};

/// `glBegin` primitive modes (same numeric values as OpenGL).
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
    Quads = 7,
    QuadStrip = 8,
    Polygon = 9,
}

impl PrimitiveMode {
    pub const fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Points),
            1 => Some(Self::Lines),
            2 => Some(Self::LineLoop),
            3 => Some(Self::LineStrip),
            4 => Some(Self::Triangles),
            5 => Some(Self::TriangleStrip),
            6 => Some(Self::TriangleFan),
            7 => Some(Self::Quads),
            8 => Some(Self::QuadStrip),
            9 => Some(Self::Polygon),
            _ => None,
        }
    }
}

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Luminance8 = 1,
    Rgb8 = 2,
    Rgba8 = 3,
    Bgra8 = 4,
}

impl TextureFormat {
    pub const fn from_u32(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::Luminance8),
            2 => Some(Self::Rgb8),
            3 => Some(Self::Rgba8),
            4 => Some(Self::Bgra8),
            _ => None,
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Luminance8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }
}

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureCompression {
    None = 0,
    /// zlib stream; inflating it is left to the backend.
    Zlib = 1,
}

impl TextureCompression {
    pub const fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::None),
            1 => Some(Self::Zlib),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Vertex {
    Xy([f64; 2]),
    Xyz([f64; 3]),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Render state that is not a transform and not part of a primitive group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Attribute {
    PointSize(f32),
    LineWidth(f32),
    Enable(u32),
    Disable(u32),
    DepthFunc(u32),
    PolygonMode { face: u32, mode: u32 },
    BlendFunc { src: u32, dst: u32 },
    ColorMask([bool; 4]),
    Material { face: u32, pname: u32, params: [f32; 4] },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transform {
    LoadIdentity,
    Translate([f64; 3]),
    Rotate { angle_degrees: f64, axis: [f64; 3] },
    Scale([f32; 3]),
    /// Column-major 4x4 matrix.
    MultMatrix([f64; 16]),
    MatrixMode(u32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Box {
        center: [f64; 3],
        size: [f32; 3],
    },
    Circle {
        center: [f64; 3],
        radius: f32,
    },
    Disk {
        center: [f64; 3],
        inner_radius: f32,
        outer_radius: f32,
    },
    Rect {
        center: [f64; 3],
        size: [f32; 2],
        filled: bool,
    },
    Sphere {
        center: [f64; 3],
        radius: f64,
        slices: u32,
        stacks: u32,
    },
    Cylinder {
        base: [f64; 3],
        base_radius: f64,
        top_radius: f64,
        height: f64,
        slices: u32,
        stacks: u32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Text<'a> {
    pub font: u32,
    pub position: [f64; 3],
    pub flags: u32,
    pub text: Cow<'a, str>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureUpload<'a> {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub compression: TextureCompression,
    pub data: &'a [u8],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexturedQuad {
    pub id: u32,
    pub corners: [[f64; 3]; 4],
}

/// One decoded record.
#[derive(Clone, Debug, PartialEq)]
pub enum Command<'a> {
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
    Text(Text<'a>),
    Texture(TextureUpload<'a>),
    TexturedQuad(TexturedQuad),
    Nop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OperandError {
    #[error("invalid primitive mode {0}")]
    InvalidPrimitiveMode(u32),
    #[error("invalid texture format {0}")]
    InvalidTextureFormat(u32),
    #[error("invalid texture compression {0}")]
    InvalidTextureCompression(u32),
    #[error("texture {width}x{height} is too large to address")]
    TextureTooLarge { width: u32, height: u32 },
    #[error("texture data is {found} bytes, expected {expected}")]
    TextureSizeMismatch { expected: usize, found: usize },
    #[error("payload layout: {0}")]
    Layout(#[from] ReadError),
}

impl<'a> Command<'a> {
    /// Decode the operands of `record`.
    pub fn parse(record: &Record<'a>) -> Result<Self, OperandError> {
        let mut r = ByteReader::new(record.fixed);
        let cmd = match record.descriptor.opcode {
            Opcode::Begin => {
                let mode = r.read_u32()?;
                Self::Begin(
                    PrimitiveMode::from_u32(mode).ok_or(OperandError::InvalidPrimitiveMode(mode))?,
                )
            }
            Opcode::End => Self::End,
            Opcode::Vertex3f => {
                let [x, y, z] = r.read_vec3f()?;
                Self::Vertex(Vertex::Xyz([x.into(), y.into(), z.into()]))
            }
            Opcode::Vertex3d => Self::Vertex(Vertex::Xyz(r.read_vec3d()?)),
            Opcode::Vertex2f => {
                let x = r.read_f32()?;
                let y = r.read_f32()?;
                Self::Vertex(Vertex::Xy([x.into(), y.into()]))
            }
            Opcode::Vertex2d => Self::Vertex(Vertex::Xy([r.read_f64()?, r.read_f64()?])),
            Opcode::Normal3f => Self::Normal(r.read_vec3f()?),
            Opcode::Color3f => {
                let [red, green, blue] = r.read_vec3f()?;
                Self::Color(Rgba::opaque(red, green, blue))
            }
            Opcode::Color4f => Self::Color(Rgba::new(
                r.read_f32()?,
                r.read_f32()?,
                r.read_f32()?,
                r.read_f32()?,
            )),
            Opcode::PointSize => Self::Attribute(Attribute::PointSize(r.read_f32()?)),
            Opcode::LineWidth => Self::Attribute(Attribute::LineWidth(r.read_f32()?)),
            Opcode::Enable => Self::Attribute(Attribute::Enable(r.read_u32()?)),
            Opcode::Disable => Self::Attribute(Attribute::Disable(r.read_u32()?)),
            Opcode::DepthFunc => Self::Attribute(Attribute::DepthFunc(r.read_u32()?)),
            Opcode::PolygonMode => Self::Attribute(Attribute::PolygonMode {
                face: r.read_u32()?,
                mode: r.read_u32()?,
            }),
            Opcode::BlendFunc => Self::Attribute(Attribute::BlendFunc {
                src: r.read_u32()?,
                dst: r.read_u32()?,
            }),
            Opcode::ColorMask => {
                let mask = r.take(4)?;
                Self::Attribute(Attribute::ColorMask([
                    mask[0] != 0,
                    mask[1] != 0,
                    mask[2] != 0,
                    mask[3] != 0,
                ]))
            }
            Opcode::Materialf => Self::Attribute(Attribute::Material {
                face: r.read_u32()?,
                pname: r.read_u32()?,
                params: [r.read_f32()?, r.read_f32()?, r.read_f32()?, r.read_f32()?],
            }),
            Opcode::PushMatrix => Self::PushMatrix,
            Opcode::PopMatrix => Self::PopMatrix,
            Opcode::PushAttrib => Self::PushAttrib(r.read_u32()?),
            Opcode::PopAttrib => Self::PopAttrib,
            Opcode::LoadIdentity => Self::Transform(Transform::LoadIdentity),
            Opcode::Translated => Self::Transform(Transform::Translate(r.read_vec3d()?)),
            Opcode::Rotated => Self::Transform(Transform::Rotate {
                angle_degrees: r.read_f64()?,
                axis: r.read_vec3d()?,
            }),
            Opcode::Scalef => Self::Transform(Transform::Scale(r.read_vec3f()?)),
            Opcode::MultMatrixf => {
                let mut m = [0f64; 16];
                for v in &mut m {
                    *v = r.read_f32()?.into();
                }
                Self::Transform(Transform::MultMatrix(m))
            }
            Opcode::MultMatrixd => {
                let mut m = [0f64; 16];
                for v in &mut m {
                    *v = r.read_f64()?;
                }
                Self::Transform(Transform::MultMatrix(m))
            }
            Opcode::MatrixMode => Self::Transform(Transform::MatrixMode(r.read_u32()?)),
            Opcode::Box => Self::Shape(Shape::Box {
                center: r.read_vec3d()?,
                size: r.read_vec3f()?,
            }),
            Opcode::Circle => Self::Shape(Shape::Circle {
                center: r.read_vec3d()?,
                radius: r.read_f32()?,
            }),
            Opcode::Disk => Self::Shape(Shape::Disk {
                center: r.read_vec3d()?,
                inner_radius: r.read_f32()?,
                outer_radius: r.read_f32()?,
            }),
            Opcode::Rect => Self::Shape(Shape::Rect {
                center: r.read_vec3d()?,
                size: [r.read_f32()?, r.read_f32()?],
                filled: r.read_u8()? != 0,
            }),
            Opcode::Sphere => Self::Shape(Shape::Sphere {
                center: r.read_vec3d()?,
                radius: r.read_f64()?,
                slices: r.read_u32()?,
                stacks: r.read_u32()?,
            }),
            Opcode::Cylinder => Self::Shape(Shape::Cylinder {
                base: r.read_vec3d()?,
                base_radius: r.read_f64()?,
                top_radius: r.read_f64()?,
                height: r.read_f64()?,
                slices: r.read_u32()?,
                stacks: r.read_u32()?,
            }),
            Opcode::Text => Self::Text(Text {
                font: 0,
                position: r.read_vec3d()?,
                flags: 0,
                text: String::from_utf8_lossy(record.tail),
            }),
            Opcode::TextLong => Self::Text(Text {
                font: r.read_u32()?,
                position: r.read_vec3d()?,
                flags: r.read_u32()?,
                text: String::from_utf8_lossy(record.tail),
            }),
            Opcode::Tex2d => Self::Texture(parse_texture(&mut r, record.tail)?),
            Opcode::TexDrawQuad => Self::TexturedQuad(TexturedQuad {
                id: r.read_u32()?,
                corners: [
                    r.read_vec3d()?,
                    r.read_vec3d()?,
                    r.read_vec3d()?,
                    r.read_vec3d()?,
                ],
            }),
            Opcode::Nop => Self::Nop,
        };
        Ok(cmd)
    }
}

fn parse_texture<'a>(
    r: &mut ByteReader<'_>,
    data: &'a [u8],
) -> Result<TextureUpload<'a>, OperandError> {
    let id = r.read_u32()?;
    let width = r.read_u32()?;
    let height = r.read_u32()?;
    let format_raw = r.read_u32()?;
    let compression_raw = r.read_u32()?;

    let format =
        TextureFormat::from_u32(format_raw).ok_or(OperandError::InvalidTextureFormat(format_raw))?;
    let compression = TextureCompression::from_u32(compression_raw)
        .ok_or(OperandError::InvalidTextureCompression(compression_raw))?;

    if compression == TextureCompression::None {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(format.bytes_per_pixel()))
            .ok_or(OperandError::TextureTooLarge { width, height })?;
        if data.len() != expected {
            return Err(OperandError::TextureSizeMismatch {
                expected,
                found: data.len(),
            });
        }
    }

    Ok(TextureUpload {
        id,
        width,
        height,
        format,
        compression,
        data,
    })
}
