//! Per-object decode: header fields, vertex block, and the primitive
//! decode/special-token dispatch loop. Ports `examples/original_source/
//! parser.c`'s `process_object`/`parse_vertices`/`parse_primitives`/
//! `mark_vertices`.

use log::warn;
use tracing::instrument;

use crate::cli::Options;
use crate::colour::{BLACK, DARK_GREY, ORANGE, PERIDOT, PERU, WHITE};
use crate::error::{ChocError, ChocResult};
use crate::generators::{
    make_special_dashed, make_special_hatch, make_special_points, make_special_quads,
    make_special_zigzags, thicken_line,
};
use crate::geometry::flip_backfacing;
use crate::primitive::{GroupId, Groups, Outline, Primitive, MAX_NUM_SIDES, MIN_NUM_SIDES};
use crate::reader::ByteReader;
use crate::vecmath::Vec3;
use crate::vertex::VertexArray;

const MAX_NUM_PRIMITIVES_FIELD: i32 = 255;
const MAX_NUM_VERTICES_FIELD: i32 = 200;
const PADDING_BEFORE_CLIP_DIST: i64 = 4;
const PADDING_BEFORE_PRIM_SIMPLE_DIST: i64 = 3;
const BYTES_PER_VERTEX: i64 = 12;
const BYTES_PER_PRIMITIVE: i64 = 16;

/// Third-side tokens that replace a 2-sided seed with a procedural line
/// (checked at side index 2).
mod dash_token {
    pub const DASH_8_THIN_WHITE: u8 = 0xfd;
    pub const DASH_16_THIN_WHITE: u8 = 0xfe;
    pub const DASH_32_THICK_WHITE: u8 = 0xff;
}

/// Fourth-side tokens that replace a 3-sided seed with procedural geometry
/// (checked at side index 3). `CheckZ` variants behave
/// identically to their plain counterparts; the name only documents that
/// the original reused the same token for both Z-aware and Z-agnostic
/// contexts.
mod tri_token {
    pub const ORANGE_POINTS_32: u8 = 0xf8;
    pub const DARK_GREY_QUADS_16: u8 = 0xf9;
    pub const THICK_PERU_LINES_64: u8 = 0xfa;
    pub const THIN_BLACK_ZIGZAGS_16: u8 = 0xfb;
    pub const PERIDOT_QUADS_8_CHECK_Z: u8 = 0xfc;
    pub const WHITE_QUADS_16_CHECK_Z: u8 = 0xfd;
    pub const PERIDOT_QUADS_8: u8 = 0xfe;
    pub const WHITE_QUADS_16: u8 = 0xff;
}

/// The fixed-size header record preceding an object's vertex/primitive
/// blocks.
#[derive(Debug, Clone, Copy)]
pub struct ObjectHeader {
    pub simple_dist: i32,
    pub nprimitives: i32,
    pub nvertices: i32,
    pub nsprimitives: i32,
    pub nsvertices: i32,
    pub clip_dist: i32,
    pub primitive_style: Outline,
}

fn read_counted(reader: &mut impl ByteReader, label: &str, max_exclusive: i32) -> ChocResult<i32> {
    let raw = reader.read_i32()?;
    if raw >= max_exclusive {
        return Err(ChocError::Format(format!(
            "bad {label}, {} (stored value before +1 offset)",
            raw as i64 + 1
        )));
    }
    Ok(raw + 1)
}

pub fn read_object_header(reader: &mut impl ByteReader, object_index: usize) -> ChocResult<ObjectHeader> {
    let simple_dist = reader.read_i32()?;
    if simple_dist < 0 {
        return Err(ChocError::Format(format!(
            "bad simplification distance {simple_dist} (object {object_index})"
        )));
    }

    let nprimitives = read_counted(reader, "number of primitives", MAX_NUM_PRIMITIVES_FIELD)?;
    let nvertices_raw = reader.read_i32()?;
    if !(0..MAX_NUM_VERTICES_FIELD).contains(&nvertices_raw) {
        return Err(ChocError::Format(format!(
            "bad number of vertices {} (object {object_index})",
            nvertices_raw as i64 + 1
        )));
    }
    let nvertices = nvertices_raw + 1;

    let nsprimitives_raw = reader.read_i32()?;
    if nsprimitives_raw >= nprimitives {
        return Err(ChocError::Format(format!(
            "bad simplified number of primitives {} (object {object_index})",
            nsprimitives_raw as i64 + 1
        )));
    }
    let nsprimitives = nsprimitives_raw + 1;

    let nsvertices_raw = reader.read_i32()?;
    if !(0..nvertices).contains(&nsvertices_raw) {
        return Err(ChocError::Format(format!(
            "bad simplified number of vertices {} (object {object_index})",
            nsvertices_raw as i64 + 1
        )));
    }
    let nsvertices = nsvertices_raw + 1;

    reader.skip(PADDING_BEFORE_CLIP_DIST)?;
    let clip_dist = reader.read_i32()?;
    if clip_dist < 0 {
        return Err(ChocError::Format(format!(
            "bad clip distance {clip_dist} (object {object_index})"
        )));
    }

    let primitive_style = match reader.read_i32()? {
        0 => Outline::None,
        1 => Outline::Black,
        2 => Outline::Blue,
        other => {
            return Err(ChocError::Format(format!(
                "bad primitive style {other} (object {object_index})"
            )))
        }
    };

    Ok(ObjectHeader {
        simple_dist,
        nprimitives,
        nvertices,
        nsprimitives,
        nsvertices,
        clip_dist,
        primitive_style,
    })
}

/// Reads the vertex block, flipping Z. Reads only the simplified count
/// in `--simple` mode, or none at all in `--list`/`--summary` mode, always
/// seeking past whatever was skipped.
pub fn parse_vertices(
    reader: &mut impl ByteReader,
    varray: &mut VertexArray,
    header: &ObjectHeader,
    opts: &Options,
) -> ChocResult<()> {
    let n = if opts.list || opts.summary {
        0
    } else if opts.simple {
        header.nsvertices
    } else {
        header.nvertices
    };

    for _ in 0..n {
        let x = reader.read_i32()? as f64;
        let y = reader.read_i32()? as f64;
        let z = reader.read_i32()? as f64;
        varray.push(Vec3::new(x, y, -z));
    }

    reader.skip(BYTES_PER_VERTEX * (header.nvertices - n) as i64)?;
    Ok(())
}

/// Decodes the primitive block for one object, dispatching special tokens
/// to the procedural generators and validating ordinary primitives
///.
#[instrument(skip(reader, varray, groups, opts), fields(object = object_index))]
pub fn parse_primitives(
    reader: &mut impl ByteReader,
    object_index: usize,
    varray: &mut VertexArray,
    groups: &mut Groups,
    header: &ObjectHeader,
    opts: &Options,
) -> ChocResult<()> {
    let n = if opts.list || opts.summary {
        0
    } else if opts.simple {
        header.nsprimitives
    } else {
        header.nprimitives
    };

    let mut all_z_0 = opts.flip_backfacing;

    for p in 0..n {
        let group = if p < header.nsprimitives {
            GroupId::Simple
        } else {
            GroupId::Complex
        };

        let primitive_start = reader.tell()?;
        let mut raw_sides = Vec::with_capacity(MAX_NUM_SIDES);
        for _ in 0..MAX_NUM_SIDES {
            let byte = reader
                .getc()?
                .ok_or_else(|| ChocError::Format(format!("failed to read side of primitive {p} of object {object_index}")))?;
            if byte == 0 {
                break;
            }
            raw_sides.push(byte);
        }

        reader.seek_to(crate::reader::SeekPos::Absolute(
            primitive_start + MAX_NUM_SIDES as u64,
        ))?;

        let colour = reader
            .getc()?
            .ok_or_else(|| ChocError::Format(format!("failed to read colour of primitive {p} of object {object_index}")))?;

        reader.skip(PADDING_BEFORE_PRIM_SIMPLE_DIST)?;
        let prim_simple_dist = reader.read_i32()?;
        if prim_simple_dist < 0 {
            return Err(ChocError::Format(format!(
                "bad polygon simplification distance {prim_simple_dist} (primitive {p} of object {object_index})"
            )));
        }

        let mut nsides = raw_sides.len();
        if opts.simple && prim_simple_dist <= header.simple_dist && nsides > 2 {
            nsides = 2;
        }

        // Placeholder seed: overwritten as soon as the first real side
        // decodes below, or the primitive is rejected for having too few
        // sides before anything meaningful reads it back.
        groups.get_mut(group).add(Primitive::new(vec![0], 0, colour, Outline::None));
        let seed_idx = groups.get(group).last_index().unwrap();
        let ordinal = groups.get(group).len() as i32;
        groups.get_mut(group).get_mut(seed_idx).set_id(ordinal);

        let nvertices_so_far = varray.len();
        let mut special = false;
        let mut decoded_sides: Vec<usize> = Vec::with_capacity(nsides);

        for s in 0..nsides {
            let raw = raw_sides[s];

            // Special-token dispatch reads the seed's already-decoded sides
            // (2 for a line context, 3 for a triangle context), committed
            // incrementally below as each preceding side validates.
            if s == 2 {
                match raw {
                    dash_token::DASH_8_THIN_WHITE => {
                        special = true;
                        make_special_dashed(varray, groups, group, 8, WHITE, opts.thick)?;
                    }
                    dash_token::DASH_16_THIN_WHITE => {
                        special = true;
                        make_special_dashed(varray, groups, group, 16, WHITE, opts.thick)?;
                    }
                    dash_token::DASH_32_THICK_WHITE => {
                        special = true;
                        make_special_dashed(varray, groups, group, 32, WHITE, opts.thick * 2.0)?;
                    }
                    _ => {}
                }
            } else if s == 3 {
                match raw {
                    tri_token::ORANGE_POINTS_32 => {
                        special = true;
                        make_special_points(varray, groups, group, 32, ORANGE)?;
                    }
                    tri_token::DARK_GREY_QUADS_16 => {
                        special = true;
                        make_special_quads(varray, groups, group, 16, DARK_GREY)?;
                    }
                    tri_token::THICK_PERU_LINES_64 => {
                        special = true;
                        make_special_hatch(varray, groups, group, 64, PERU, opts.thick * 2.0)?;
                    }
                    tri_token::THIN_BLACK_ZIGZAGS_16 => {
                        special = true;
                        make_special_zigzags(varray, groups, group, 16, BLACK)?;
                    }
                    tri_token::PERIDOT_QUADS_8_CHECK_Z | tri_token::PERIDOT_QUADS_8 => {
                        special = true;
                        make_special_quads(varray, groups, group, 8, PERIDOT)?;
                    }
                    tri_token::WHITE_QUADS_16_CHECK_Z | tri_token::WHITE_QUADS_16 => {
                        special = true;
                        make_special_quads(varray, groups, group, 16, WHITE)?;
                    }
                    _ => {}
                }
            }

            if special {
                break;
            }

            if raw < 1 || (raw as usize) > nvertices_so_far {
                return Err(ChocError::Format(format!(
                    "bad vertex {} (side {s} of primitive {p} of object {object_index})",
                    raw as i64 - 1
                )));
            }
            let v = raw as usize - 1;

            if all_z_0 {
                let coord = varray
                    .coord(v)
                    .ok_or_else(|| ChocError::Format("vertex index out of range".into()))?;
                if coord.z != 0.0 {
                    all_z_0 = false;
                }
            }

            decoded_sides.push(v);
            groups
                .get_mut(group)
                .get_mut(seed_idx)
                .set_sides(decoded_sides.clone());
        }

        if !special {
            // FLIP_Z compensation: inverting Z makes every primitive
            // back-facing unless the winding order is also reversed.
            if decoded_sides.len() < MIN_NUM_SIDES {
                return Err(ChocError::Format(format!(
                    "bad side count {} (primitive {p} of object {object_index})",
                    decoded_sides.len()
                )));
            }
            decoded_sides.reverse();
            groups.get_mut(group).get_mut(seed_idx).set_sides(decoded_sides.clone());

            let coords: Vec<Vec3> = decoded_sides
                .iter()
                .map(|&i| varray.coord(i).unwrap_or(Vec3::ZERO))
                .collect();
            let primitive = groups.get(group).get(seed_idx);
            if let Some(skew) = skew_side_if_any(primitive, &coords) {
                warn!("skew polygon detected (side {skew} of primitive {p} of object {object_index})");
            }

            if decoded_sides.len() == 2 && opts.thick > 0.0 {
                thicken_line(varray, groups, group, opts.thick)?;
            }
        }
    }

    reader.skip(BYTES_PER_PRIMITIVE * (header.nprimitives - n) as i64)?;

    if all_z_0 {
        flip_backfacing(varray, groups);
    }

    Ok(())
}

/// `primitive_get_skew_side` only warns (it never invalidates the
/// primitive), so this wraps [`Primitive::skew_side`] with the "no skew
/// found" sentinel the original represents as a negative return.
fn skew_side_if_any(primitive: &Primitive, coords: &[Vec3]) -> Option<usize> {
    if primitive.num_sides() < 3 {
        return None;
    }
    const SKEW_EPSILON: f64 = 1e-6;
    let side = primitive.skew_side(coords);
    let n = primitive.num_sides();
    let prev = coords[primitive.side((side + n - 1) % n)];
    let cur = coords[primitive.side(side)];
    let next = coords[primitive.side((side + 1) % n)];
    let edge = (next - prev).normalize();
    let to_cur = cur - prev;
    let proj = to_cur - edge * Vec3::dot(to_cur, edge);
    if proj.length() > SKEW_EPSILON {
        Some(side)
    } else {
        None
    }
}

/// Marks vertices referenced by any side in either group as used
/// (`mark_vertices`, minus the `--unused` short-circuit which the caller
/// handles by calling [`crate::vertex::VertexArray::mark_all_used`]
/// instead of this function).
pub fn mark_used_vertices(varray: &mut VertexArray, groups: &Groups) {
    for id in GroupId::ALL {
        let group = groups.get(id);
        for (_, primitive) in group.iter_used() {
            for &side in primitive.sides() {
                varray.mark_used(side);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, ColourMode, MeshStyleFlag, Selection};
    use byteorder::{LittleEndian, WriteBytesExt};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    use crate::reader::RawReader;

    fn default_opts() -> Options {
        Options {
            model_file: "model.dat".into(),
            index_file: None,
            output_file: None,
            selection: Selection { first: 0, last: None },
            name: None,
            offset: 0,
            raw: true,
            thick: 0.0,
            time: false,
            verbose: false,
            mtllib: "sf3k.mtl".into(),
            colour_mode: ColourMode::Riscos,
            extra_missions: false,
            list: false,
            summary: false,
            simple: false,
            unused: false,
            duplicate: false,
            negative_indices: false,
            clip_polygons: false,
            flip_backfacing: false,
            mesh_style: MeshStyleFlag::NoChange,
        }
    }

    fn encode_header(
        simple_dist: i32,
        nprimitives: i32,
        nvertices: i32,
        nsprimitives: i32,
        nsvertices: i32,
        clip_dist: i32,
        primitive_style: i32,
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_i32::<LittleEndian>(simple_dist).unwrap();
        buf.write_i32::<LittleEndian>(nprimitives - 1).unwrap();
        buf.write_i32::<LittleEndian>(nvertices - 1).unwrap();
        buf.write_i32::<LittleEndian>(nsprimitives - 1).unwrap();
        buf.write_i32::<LittleEndian>(nsvertices - 1).unwrap();
        buf.extend_from_slice(&[0u8; 4]); // padding before clip dist
        buf.write_i32::<LittleEndian>(clip_dist).unwrap();
        buf.write_i32::<LittleEndian>(primitive_style).unwrap();
        buf
    }

    #[test]
    fn test_read_object_header_roundtrip() {
        let bytes = encode_header(10, 3, 4, 2, 3, 0, 1);
        let mut r = RawReader::new(Cursor::new(bytes));
        let header = read_object_header(&mut r, 0).unwrap();
        assert_eq!(header.simple_dist, 10);
        assert_eq!(header.nprimitives, 3);
        assert_eq!(header.nvertices, 4);
        assert_eq!(header.nsprimitives, 2);
        assert_eq!(header.nsvertices, 3);
        assert_eq!(header.clip_dist, 0);
        assert_eq!(header.primitive_style, Outline::Black);
    }

    #[test]
    fn test_read_object_header_rejects_bad_style() {
        let bytes = encode_header(0, 1, 1, 0, 0, 0, 9);
        let mut r = RawReader::new(Cursor::new(bytes));
        assert!(read_object_header(&mut r, 0).is_err());
    }

    #[test]
    fn test_read_object_header_rejects_over_max_primitives() {
        let mut buf = Vec::new();
        buf.write_i32::<LittleEndian>(0).unwrap();
        buf.write_i32::<LittleEndian>(255).unwrap(); // >= 255 before +1: rejected
        let mut r = RawReader::new(Cursor::new(buf));
        assert!(read_object_header(&mut r, 0).is_err());
    }

    #[test]
    fn test_parse_vertices_flips_z() {
        let mut buf = Vec::new();
        buf.write_i32::<LittleEndian>(1).unwrap();
        buf.write_i32::<LittleEndian>(2).unwrap();
        buf.write_i32::<LittleEndian>(3).unwrap();
        let header = ObjectHeader {
            simple_dist: 0,
            nprimitives: 1,
            nvertices: 1,
            nsprimitives: 1,
            nsvertices: 1,
            clip_dist: 0,
            primitive_style: Outline::None,
        };
        let mut r = RawReader::new(Cursor::new(buf));
        let mut varray = VertexArray::new();
        parse_vertices(&mut r, &mut varray, &header, &default_opts()).unwrap();
        assert_eq!(varray.coord(0), Some(Vec3::new(1.0, 2.0, -3.0)));
    }

    #[test]
    fn test_parse_primitives_ordinary_triangle_reversed() {
        // Triangle with sides 1,2,3 (offset-1 encoded), colour 0xaa.
        let mut buf = vec![1u8, 2, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        buf[7] = 0xaa; // colour
        let mut tail = Vec::new();
        tail.write_i32::<LittleEndian>(0).unwrap(); // simplification distance
        buf.truncate(8);
        buf.extend(tail);
        let header = ObjectHeader {
            simple_dist: 0,
            nprimitives: 1,
            nvertices: 3,
            nsprimitives: 1,
            nsvertices: 3,
            clip_dist: 0,
            primitive_style: Outline::None,
        };
        let mut varray = VertexArray::new();
        varray.push(Vec3::new(0.0, 0.0, 0.0));
        varray.push(Vec3::new(1.0, 0.0, 0.0));
        varray.push(Vec3::new(0.0, 1.0, 0.0));

        let mut r = RawReader::new(Cursor::new(buf));
        let mut groups = Groups::new();
        parse_primitives(&mut r, 0, &mut varray, &mut groups, &header, &default_opts()).unwrap();

        let simple = groups.get(GroupId::Simple);
        assert_eq!(simple.len(), 1);
        assert_eq!(simple.get(0).sides(), &[2, 1, 0]);
        assert_eq!(simple.get(0).colour(), 0xaa);
    }

    #[test]
    fn test_mark_used_vertices() {
        let mut varray = VertexArray::new();
        varray.push(Vec3::ZERO);
        varray.push(Vec3::new(1.0, 0.0, 0.0));
        varray.push(Vec3::new(0.0, 1.0, 0.0));
        let mut groups = Groups::new();
        groups
            .get_mut(GroupId::Simple)
            .add(Primitive::new(vec![0, 1], 0, 0, Outline::None));

        mark_used_vertices(&mut varray, &groups);
        assert!(varray.is_used(0));
        assert!(varray.is_used(1));
        assert!(!varray.is_used(2));
    }
}
