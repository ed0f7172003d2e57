//! Command buffer builder.
//!
//! This is the client side of the protocol: tests, fixtures and capture tooling
//! use it to emit canonical v1 buffers without hand-packing bytes.

use crate::command::{PrimitiveMode, TextureCompression, TextureFormat};
use crate::opcode::Opcode;

/// Builds a v1 command buffer, one method per opcode.
#[derive(Debug, Default, Clone)]
pub struct CmdWriter {
    buf: Vec<u8>,
}

impl CmdWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append an arbitrary tag followed by `payload`, unchecked.
    ///
    /// Useful for producing unknown opcodes and malformed records in tests.
    pub fn raw(&mut self, tag: u16, payload: &[u8]) {
        self.put_u16(tag);
        self.buf.extend_from_slice(payload);
    }

    fn op(&mut self, opcode: Opcode) {
        self.put_u16(opcode.id());
    }

    fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_f32(&mut self, v: f32) {
        self.put_u32(v.to_bits());
    }

    fn put_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_bits().to_be_bytes());
    }

    fn put_vec3d(&mut self, v: [f64; 3]) {
        v.into_iter().for_each(|c| self.put_f64(c));
    }

    fn put_vec3f(&mut self, v: [f32; 3]) {
        v.into_iter().for_each(|c| self.put_f32(c));
    }

    fn put_blob(&mut self, data: &[u8]) {
        assert!(
            data.len() <= u32::MAX as usize,
            "blob too large for u32 length prefix"
        );
        self.put_u32(data.len() as u32);
        self.buf.extend_from_slice(data);
    }

    pub fn begin(&mut self, mode: PrimitiveMode) {
        self.op(Opcode::Begin);
        self.put_u32(mode as u32);
    }

    pub fn end(&mut self) {
        self.op(Opcode::End);
    }

    pub fn vertex2f(&mut self, x: f32, y: f32) {
        self.op(Opcode::Vertex2f);
        self.put_f32(x);
        self.put_f32(y);
    }

    pub fn vertex2d(&mut self, x: f64, y: f64) {
        self.op(Opcode::Vertex2d);
        self.put_f64(x);
        self.put_f64(y);
    }

    pub fn vertex3f(&mut self, x: f32, y: f32, z: f32) {
        self.op(Opcode::Vertex3f);
        self.put_vec3f([x, y, z]);
    }

    pub fn vertex3d(&mut self, x: f64, y: f64, z: f64) {
        self.op(Opcode::Vertex3d);
        self.put_vec3d([x, y, z]);
    }

    pub fn normal3f(&mut self, x: f32, y: f32, z: f32) {
        self.op(Opcode::Normal3f);
        self.put_vec3f([x, y, z]);
    }

    pub fn color3f(&mut self, r: f32, g: f32, b: f32) {
        self.op(Opcode::Color3f);
        self.put_vec3f([r, g, b]);
    }

    pub fn color4f(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.op(Opcode::Color4f);
        for c in [r, g, b, a] {
            self.put_f32(c);
        }
    }

    pub fn point_size(&mut self, size: f32) {
        self.op(Opcode::PointSize);
        self.put_f32(size);
    }

    pub fn line_width(&mut self, width: f32) {
        self.op(Opcode::LineWidth);
        self.put_f32(width);
    }

    pub fn enable(&mut self, capability: u32) {
        self.op(Opcode::Enable);
        self.put_u32(capability);
    }

    pub fn disable(&mut self, capability: u32) {
        self.op(Opcode::Disable);
        self.put_u32(capability);
    }

    pub fn depth_func(&mut self, func: u32) {
        self.op(Opcode::DepthFunc);
        self.put_u32(func);
    }

    pub fn polygon_mode(&mut self, face: u32, mode: u32) {
        self.op(Opcode::PolygonMode);
        self.put_u32(face);
        self.put_u32(mode);
    }

    pub fn blend_func(&mut self, src: u32, dst: u32) {
        self.op(Opcode::BlendFunc);
        self.put_u32(src);
        self.put_u32(dst);
    }

    pub fn color_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        self.op(Opcode::ColorMask);
        for c in [r, g, b, a] {
            self.put_u8(c as u8);
        }
    }

    pub fn materialf(&mut self, face: u32, pname: u32, params: [f32; 4]) {
        self.op(Opcode::Materialf);
        self.put_u32(face);
        self.put_u32(pname);
        params.into_iter().for_each(|p| self.put_f32(p));
    }

    pub fn push_matrix(&mut self) {
        self.op(Opcode::PushMatrix);
    }

    pub fn pop_matrix(&mut self) {
        self.op(Opcode::PopMatrix);
    }

    pub fn push_attrib(&mut self, mask: u32) {
        self.op(Opcode::PushAttrib);
        self.put_u32(mask);
    }

    pub fn pop_attrib(&mut self) {
        self.op(Opcode::PopAttrib);
    }

    pub fn load_identity(&mut self) {
        self.op(Opcode::LoadIdentity);
    }

    pub fn translated(&mut self, x: f64, y: f64, z: f64) {
        self.op(Opcode::Translated);
        self.put_vec3d([x, y, z]);
    }

    pub fn rotated(&mut self, angle_degrees: f64, x: f64, y: f64, z: f64) {
        self.op(Opcode::Rotated);
        self.put_f64(angle_degrees);
        self.put_vec3d([x, y, z]);
    }

    pub fn scalef(&mut self, x: f32, y: f32, z: f32) {
        self.op(Opcode::Scalef);
        self.put_vec3f([x, y, z]);
    }

    /// `m` is column-major.
    pub fn mult_matrixf(&mut self, m: [f32; 16]) {
        self.op(Opcode::MultMatrixf);
        m.into_iter().for_each(|v| self.put_f32(v));
    }

    /// `m` is column-major.
    pub fn mult_matrixd(&mut self, m: [f64; 16]) {
        self.op(Opcode::MultMatrixd);
        m.into_iter().for_each(|v| self.put_f64(v));
    }

    pub fn matrix_mode(&mut self, mode: u32) {
        self.op(Opcode::MatrixMode);
        self.put_u32(mode);
    }

    pub fn box_(&mut self, center: [f64; 3], size: [f32; 3]) {
        self.op(Opcode::Box);
        self.put_vec3d(center);
        self.put_vec3f(size);
    }

    pub fn circle(&mut self, center: [f64; 3], radius: f32) {
        self.op(Opcode::Circle);
        self.put_vec3d(center);
        self.put_f32(radius);
    }

    pub fn disk(&mut self, center: [f64; 3], inner_radius: f32, outer_radius: f32) {
        self.op(Opcode::Disk);
        self.put_vec3d(center);
        self.put_f32(inner_radius);
        self.put_f32(outer_radius);
    }

    pub fn rect(&mut self, center: [f64; 3], width: f32, height: f32, filled: bool) {
        self.op(Opcode::Rect);
        self.put_vec3d(center);
        self.put_f32(width);
        self.put_f32(height);
        self.put_u8(filled as u8);
    }

    pub fn sphere(&mut self, center: [f64; 3], radius: f64, slices: u32, stacks: u32) {
        self.op(Opcode::Sphere);
        self.put_vec3d(center);
        self.put_f64(radius);
        self.put_u32(slices);
        self.put_u32(stacks);
    }

    pub fn cylinder(
        &mut self,
        base: [f64; 3],
        base_radius: f64,
        top_radius: f64,
        height: f64,
        slices: u32,
        stacks: u32,
    ) {
        self.op(Opcode::Cylinder);
        self.put_vec3d(base);
        self.put_f64(base_radius);
        self.put_f64(top_radius);
        self.put_f64(height);
        self.put_u32(slices);
        self.put_u32(stacks);
    }

    /// Short text. Anything from the first NUL in `text` onwards is dropped.
    pub fn text(&mut self, position: [f64; 3], text: &str) {
        let bytes = text.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        self.op(Opcode::Text);
        self.put_vec3d(position);
        self.buf.extend_from_slice(&bytes[..end]);
        self.put_u8(0);
    }

    pub fn text_long(&mut self, font: u32, position: [f64; 3], flags: u32, text: &str) {
        self.op(Opcode::TextLong);
        self.put_u32(font);
        self.put_vec3d(position);
        self.put_u32(flags);
        self.put_blob(text.as_bytes());
    }

    pub fn texture2d(
        &mut self,
        id: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        compression: TextureCompression,
        data: &[u8],
    ) {
        self.op(Opcode::Tex2d);
        self.put_u32(id);
        self.put_u32(width);
        self.put_u32(height);
        self.put_u32(format as u32);
        self.put_u32(compression as u32);
        self.put_blob(data);
    }

    pub fn tex_draw_quad(&mut self, id: u32, corners: [[f64; 3]; 4]) {
        self.op(Opcode::TexDrawQuad);
        self.put_u32(id);
        corners.into_iter().for_each(|c| self.put_vec3d(c));
    }

    pub fn nop(&mut self) {
        self.op(Opcode::Nop);
    }
}
