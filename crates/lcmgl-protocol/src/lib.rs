//! LCMGL command stream layouts.
//!
//! An LCMGL buffer is a flat sequence of records. Each record is a big-endian
//! `u16` opcode tag followed by a payload whose layout is fixed by the opcode
//! (see [`opcode::CATALOG`]). There is no stream header and no per-record size
//! field, so a decoder that does not recognize an opcode cannot find the next
//! record.
//!
//! This crate provides:
//! - the v1 opcode catalog (payload shape and stack role per opcode)
//! - a bounds-checked [`ByteReader`]
//! - typed [`Command`] decoding from a single record
//! - [`CmdWriter`], a builder that emits canonical buffers

#![forbid(unsafe_code)]

pub mod cmd_writer;
pub mod command;
pub mod opcode;
pub mod reader;

pub use cmd_writer::CmdWriter;
pub use command::{
    Attribute, Command, OperandError, PrimitiveMode, Rgba, Shape, Text, TextureCompression,
    TextureFormat, TextureUpload, TexturedQuad, Transform, Vertex,
};
pub use opcode::{
    lookup, FrameKind, Opcode, OpcodeDescriptor, OpcodeRole, PayloadShape, CATALOG,
    PROTOCOL_VERSION,
};
pub use reader::{read_record, ByteReader, ReadError, Record};
