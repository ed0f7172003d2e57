//! The v1 opcode catalog.
//!
//! The catalog is closed: a decoder must reject any tag not listed here because
//! the payload length of a record is only known from its opcode.

/// Version of the opcode table below. Bumped whenever an opcode is added or a
/// payload layout changes.
pub const PROTOCOL_VERSION: u16 = 1;

/// Size of the opcode tag that starts every record.
pub const OPCODE_TAG_SIZE: usize = 2;

/// Size of the `u32` length prefix that follows the header of a
/// [`PayloadShape::LengthPrefixed`] record.
pub const BLOB_LEN_SIZE: usize = 4;

#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Begin = 4,
    End = 5,
    Vertex3f = 6,
    Vertex3d = 7,
    Color3f = 8,
    Color4f = 9,
    PointSize = 10,
    Enable = 11,
    Disable = 12,
    Box = 13,
    Circle = 14,
    LineWidth = 15,
    Nop = 16,
    Vertex2d = 17,
    Vertex2f = 18,
    Text = 19,
    Disk = 20,
    Translated = 21,
    Rotated = 22,
    LoadIdentity = 23,
    PushMatrix = 24,
    PopMatrix = 25,
    Rect = 26,
    TextLong = 27,
    Normal3f = 28,
    Scalef = 29,
    MultMatrixf = 30,
    MultMatrixd = 31,
    Materialf = 32,
    PushAttrib = 33,
    PopAttrib = 34,
    DepthFunc = 35,
    Tex2d = 36,
    TexDrawQuad = 37,
    Sphere = 38,
    PolygonMode = 39,
    MatrixMode = 40,
    ColorMask = 41,
    BlendFunc = 42,
    Cylinder = 43,
}

impl Opcode {
    pub const fn from_u16(v: u16) -> Option<Self> {
        match v {
            4 => Some(Self::Begin),
            5 => Some(Self::End),
            6 => Some(Self::Vertex3f),
            7 => Some(Self::Vertex3d),
            8 => Some(Self::Color3f),
            9 => Some(Self::Color4f),
            10 => Some(Self::PointSize),
            11 => Some(Self::Enable),
            12 => Some(Self::Disable),
            13 => Some(Self::Box),
            14 => Some(Self::Circle),
            15 => Some(Self::LineWidth),
            16 => Some(Self::Nop),
            17 => Some(Self::Vertex2d),
            18 => Some(Self::Vertex2f),
            19 => Some(Self::Text),
            20 => Some(Self::Disk),
            21 => Some(Self::Translated),
            22 => Some(Self::Rotated),
            23 => Some(Self::LoadIdentity),
            24 => Some(Self::PushMatrix),
            25 => Some(Self::PopMatrix),
            26 => Some(Self::Rect),
            27 => Some(Self::TextLong),
            28 => Some(Self::Normal3f),
            29 => Some(Self::Scalef),
            30 => Some(Self::MultMatrixf),
            31 => Some(Self::MultMatrixd),
            32 => Some(Self::Materialf),
            33 => Some(Self::PushAttrib),
            34 => Some(Self::PopAttrib),
            35 => Some(Self::DepthFunc),
            36 => Some(Self::Tex2d),
            37 => Some(Self::TexDrawQuad),
            38 => Some(Self::Sphere),
            39 => Some(Self::PolygonMode),
            40 => Some(Self::MatrixMode),
            41 => Some(Self::ColorMask),
            42 => Some(Self::BlendFunc),
            43 => Some(Self::Cylinder),
            _ => None,
        }
    }

    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Catalog entry for this opcode.
    pub fn descriptor(self) -> &'static OpcodeDescriptor {
        // Every variant has a catalog row (see tests).
        lookup(self.id()).unwrap_or(&CATALOG[0])
    }
}

/// Byte layout rule for the operands that follow an opcode tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadShape {
    /// Exactly `n` bytes.
    FixedSize(usize),
    /// `header` bytes, then a `u32` blob length, then the blob.
    LengthPrefixed { header: usize },
    /// `header` bytes, then a byte string terminated by (and including) a NUL.
    Terminated { header: usize },
}

impl PayloadShape {
    /// Size of the part of the payload that does not depend on the operands.
    pub const fn header_len(self) -> usize {
        match self {
            Self::FixedSize(n) => n,
            Self::LengthPrefixed { header } => header + BLOB_LEN_SIZE,
            Self::Terminated { header } => header + 1,
        }
    }
}

/// The state stack an opcode opens or closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// A `Begin`/`End` primitive group.
    Primitive,
    /// A `PushMatrix`/`PopMatrix` transform save.
    Matrix,
    /// A `PushAttrib`/`PopAttrib` attribute save.
    Attrib,
}

impl FrameKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Matrix => "matrix",
            Self::Attrib => "attrib",
        }
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpcodeRole {
    Leaf,
    Push(FrameKind),
    Pop(FrameKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    pub opcode: Opcode,
    pub name: &'static str,
    pub shape: PayloadShape,
    pub role: OpcodeRole,
}

impl OpcodeDescriptor {
    pub const fn id(&self) -> u16 {
        self.opcode.id()
    }
}

const fn leaf(opcode: Opcode, name: &'static str, shape: PayloadShape) -> OpcodeDescriptor {
    OpcodeDescriptor {
        opcode,
        name,
        shape,
        role: OpcodeRole::Leaf,
    }
}

const fn push(opcode: Opcode, name: &'static str, size: usize, kind: FrameKind) -> OpcodeDescriptor {
    OpcodeDescriptor {
        opcode,
        name,
        shape: PayloadShape::FixedSize(size),
        role: OpcodeRole::Push(kind),
    }
}

const fn pop(opcode: Opcode, name: &'static str, kind: FrameKind) -> OpcodeDescriptor {
    OpcodeDescriptor {
        opcode,
        name,
        shape: PayloadShape::FixedSize(0),
        role: OpcodeRole::Pop(kind),
    }
}

use PayloadShape::{FixedSize, LengthPrefixed, Terminated};

/// All v1 opcodes, sorted by id.
pub static CATALOG: &[OpcodeDescriptor] = &[
    push(Opcode::Begin, "BEGIN", 4, FrameKind::Primitive),
    pop(Opcode::End, "END", FrameKind::Primitive),
    leaf(Opcode::Vertex3f, "VERTEX3F", FixedSize(12)),
    leaf(Opcode::Vertex3d, "VERTEX3D", FixedSize(24)),
    leaf(Opcode::Color3f, "COLOR3F", FixedSize(12)),
    leaf(Opcode::Color4f, "COLOR4F", FixedSize(16)),
    leaf(Opcode::PointSize, "POINTSIZE", FixedSize(4)),
    leaf(Opcode::Enable, "ENABLE", FixedSize(4)),
    leaf(Opcode::Disable, "DISABLE", FixedSize(4)),
    leaf(Opcode::Box, "BOX", FixedSize(36)),
    leaf(Opcode::Circle, "CIRCLE", FixedSize(28)),
    leaf(Opcode::LineWidth, "LINE_WIDTH", FixedSize(4)),
    leaf(Opcode::Nop, "NOP", FixedSize(0)),
    leaf(Opcode::Vertex2d, "VERTEX2D", FixedSize(16)),
    leaf(Opcode::Vertex2f, "VERTEX2F", FixedSize(8)),
    leaf(Opcode::Text, "TEXT", Terminated { header: 24 }),
    leaf(Opcode::Disk, "DISK", FixedSize(32)),
    leaf(Opcode::Translated, "TRANSLATED", FixedSize(24)),
    leaf(Opcode::Rotated, "ROTATED", FixedSize(32)),
    leaf(Opcode::LoadIdentity, "LOAD_IDENTITY", FixedSize(0)),
    push(Opcode::PushMatrix, "PUSH_MATRIX", 0, FrameKind::Matrix),
    pop(Opcode::PopMatrix, "POP_MATRIX", FrameKind::Matrix),
    leaf(Opcode::Rect, "RECT", FixedSize(33)),
    leaf(Opcode::TextLong, "TEXT_LONG", LengthPrefixed { header: 32 }),
    leaf(Opcode::Normal3f, "NORMAL3F", FixedSize(12)),
    leaf(Opcode::Scalef, "SCALEF", FixedSize(12)),
    leaf(Opcode::MultMatrixf, "MULT_MATRIXF", FixedSize(64)),
    leaf(Opcode::MultMatrixd, "MULT_MATRIXD", FixedSize(128)),
    leaf(Opcode::Materialf, "MATERIALF", FixedSize(24)),
    push(Opcode::PushAttrib, "PUSH_ATTRIB", 4, FrameKind::Attrib),
    pop(Opcode::PopAttrib, "POP_ATTRIB", FrameKind::Attrib),
    leaf(Opcode::DepthFunc, "DEPTH_FUNC", FixedSize(4)),
    leaf(Opcode::Tex2d, "TEX_2D", LengthPrefixed { header: 20 }),
    leaf(Opcode::TexDrawQuad, "TEX_DRAW_QUAD", FixedSize(100)),
    leaf(Opcode::Sphere, "SPHERE", FixedSize(40)),
    leaf(Opcode::PolygonMode, "POLYGON_MODE", FixedSize(8)),
    leaf(Opcode::MatrixMode, "MATRIX_MODE", FixedSize(4)),
    leaf(Opcode::ColorMask, "COLOR_MASK", FixedSize(4)),
    leaf(Opcode::BlendFunc, "BLEND_FUNC", FixedSize(8)),
    leaf(Opcode::Cylinder, "CYLINDER", FixedSize(56)),
];

/// Look up the catalog entry for a raw opcode tag.
pub fn lookup(id: u16) -> Option<&'static OpcodeDescriptor> {
    CATALOG
        .binary_search_by_key(&id, OpcodeDescriptor::id)
        .ok()
        .map(|idx| &CATALOG[idx])
}
