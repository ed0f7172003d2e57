use lcmgl_protocol::{
    lookup, read_record, Attribute, ByteReader, CmdWriter, Command, Opcode, PrimitiveMode, Rgba,
    Shape, TextureCompression, TextureFormat, Transform, Vertex, CATALOG,
};
use pretty_assertions::assert_eq;

/// Split a writer-produced buffer into commands, checking every record is
/// consumed exactly.
fn parse_all(bytes: &[u8]) -> Vec<(Opcode, Command<'_>)> {
    let mut r = ByteReader::new(bytes);
    let mut out = Vec::new();
    while !r.is_empty() {
        let offset = r.position();
        let tag = r.read_u16().unwrap();
        let desc = lookup(tag).unwrap_or_else(|| panic!("unknown tag {tag} at {offset}"));
        let record = read_record(&mut r, desc, offset).unwrap();
        out.push((desc.opcode, Command::parse(&record).unwrap()));
    }
    out
}

#[test]
fn every_writer_method_matches_catalog_layout() {
    let mut w = CmdWriter::new();
    w.begin(PrimitiveMode::Lines);
    w.end();
    w.vertex3f(1.0, 2.0, 3.0);
    w.vertex3d(1.0, 2.0, 3.0);
    w.color3f(1.0, 0.5, 0.0);
    w.color4f(1.0, 0.5, 0.0, 0.25);
    w.point_size(4.0);
    w.enable(0x0B71);
    w.disable(0x0BE2);
    w.box_([0.0, 0.0, 1.0], [1.0, 2.0, 3.0]);
    w.circle([1.0, 1.0, 0.0], 0.5);
    w.line_width(2.0);
    w.nop();
    w.vertex2d(-1.0, 1.0);
    w.vertex2f(-1.0, 1.0);
    w.text([0.0, 1.0, 2.0], "hello");
    w.disk([0.0; 3], 0.25, 1.0);
    w.translated(1.0, 2.0, 3.0);
    w.rotated(90.0, 0.0, 0.0, 1.0);
    w.load_identity();
    w.push_matrix();
    w.pop_matrix();
    w.rect([0.0; 3], 2.0, 1.0, true);
    w.text_long(3, [1.0; 3], 7, "long text");
    w.normal3f(0.0, 0.0, 1.0);
    w.scalef(2.0, 2.0, 2.0);
    w.mult_matrixf([0.0; 16]);
    w.mult_matrixd([0.0; 16]);
    w.materialf(0x0408, 0x1201, [0.1, 0.2, 0.3, 1.0]);
    w.push_attrib(0xFFFF_FFFF);
    w.pop_attrib();
    w.depth_func(0x0203);
    w.texture2d(9, 1, 2, TextureFormat::Luminance8, TextureCompression::None, &[1, 2]);
    w.tex_draw_quad(9, [[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]);
    w.sphere([0.0; 3], 1.0, 16, 8);
    w.polygon_mode(0x0408, 0x1B01);
    w.matrix_mode(0x1700);
    w.color_mask(true, false, true, false);
    w.blend_func(0x0302, 0x0303);
    w.cylinder([0.0; 3], 1.0, 0.5, 2.0, 12, 1);

    let parsed = parse_all(w.as_bytes());
    let opcodes: Vec<Opcode> = parsed.iter().map(|(op, _)| *op).collect();
    let catalog: Vec<Opcode> = CATALOG.iter().map(|d| d.opcode).collect();
    assert_eq!(opcodes, catalog);
}

#[test]
fn decodes_typed_operands() {
    let mut w = CmdWriter::new();
    w.vertex2d(-1.0, 1.0);
    w.color4f(1.0, 0.5, 0.0, 0.25);
    w.color_mask(true, false, true, false);
    w.rotated(90.0, 0.0, 0.0, 1.0);
    w.rect([0.0; 3], 2.0, 1.0, true);
    w.text_long(3, [1.0; 3], 7, "long text");

    let commands: Vec<Command<'_>> = parse_all(w.as_bytes()).into_iter().map(|(_, c)| c).collect();
    assert_eq!(
        commands,
        vec![
            Command::Vertex(Vertex::Xy([-1.0, 1.0])),
            Command::Color(Rgba::new(1.0, 0.5, 0.0, 0.25)),
            Command::Attribute(Attribute::ColorMask([true, false, true, false])),
            Command::Transform(Transform::Rotate {
                angle_degrees: 90.0,
                axis: [0.0, 0.0, 1.0]
            }),
            Command::Shape(Shape::Rect {
                center: [0.0; 3],
                size: [2.0, 1.0],
                filled: true
            }),
            Command::Text(lcmgl_protocol::Text {
                font: 3,
                position: [1.0; 3],
                flags: 7,
                text: "long text".into(),
            }),
        ]
    );
}

#[test]
fn mult_matrixf_widens_in_column_major_order() {
    let mut m = [0f32; 16];
    for (i, v) in m.iter_mut().enumerate() {
        *v = i as f32;
    }
    let mut w = CmdWriter::new();
    w.mult_matrixf(m);

    let parsed = parse_all(w.as_bytes());
    let Command::Transform(Transform::MultMatrix(got)) = &parsed[0].1 else {
        panic!("expected matrix, got {:?}", parsed[0].1);
    };
    for (i, v) in got.iter().enumerate() {
        assert_eq!(*v, i as f64);
    }
}

#[test]
fn raw_emits_unchecked_tag() {
    let mut w = CmdWriter::new();
    w.raw(0xFFFF, &[1, 2]);
    assert_eq!(w.finish(), vec![0xFF, 0xFF, 1, 2]);
    assert!(lookup(0xFFFF).is_none());
}
