//! Index walking and per-object dispatch. Ports
//! `examples/original_source/parser.c`'s `choc_to_obj` (index loop, address
//! validation, selection filters) and `process_object` (per-object decode →
//! post-process → emit sequencing).

use log::info;

use crate::cli::Options;
use crate::error::{ChocError, ChocResult};
use crate::names::{get_obj_name, get_obj_name_extra};
use crate::object::{parse_primitives, parse_vertices, read_object_header};
use crate::objwriter::ObjEmitter;
use crate::postprocess::{clip_coplanar_overlaps, cull_duplicates, mark_vertices, renumber_vertices};
use crate::primitive::Groups;
use crate::reader::{ByteReader, SeekPos};
use crate::vertex::VertexArray;
use crate::wavefront_obj_io::ObjWriter;

/// One row of `--list`/`--summary` output: object number, name, counts.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub object_index: usize,
    pub name: String,
    pub nvertices: i32,
    pub nprimitives: i32,
}

/// What the run produced, besides whatever was written to the OBJ output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub rows: Vec<ListRow>,
    pub objects_converted: usize,
}

/// Reads consecutive index addresses, enforcing monotonic non-decreasing
/// order, and dispatches each in-range object to decode and (unless in
/// list/summary mode) OBJ emission. Index addresses are absolute addresses
/// in the source RISC-OS image; the first address read becomes the `base`,
/// so each subsequent address `a` yields `offset = a - base`. `opts.offset`
/// is `data_start`, the byte offset of `model_reader`'s position zero within
/// the data the offsets are relative to, so each object's seek position is
/// `offset - opts.offset` (`choc_to_obj`/`first_address` in `parser.c`).
pub fn choc_to_obj<IR, MR, W>(
    index_reader: &mut IR,
    model_reader: &mut MR,
    opts: &Options,
    emitter: &mut ObjEmitter<W>,
) -> ChocResult<RunReport>
where
    IR: ByteReader,
    MR: ByteReader,
    W: ObjWriter<f64>,
{
    let mut report = RunReport::default();
    let mut object_index: usize = 0;
    let mut last_address: i64 = 0;
    let mut base: Option<i64> = None;
    let mut stop = false;

    if !opts.list && !opts.summary {
        emitter.write_prelude(&opts.mtllib)?;
    }

    while !stop && !index_reader.at_eof()? {
        let address = index_reader.read_i32()? as i64;
        if address < last_address {
            return Err(ChocError::Format(format!(
                "index address decreased at object {object_index} ({address} < {last_address})"
            )));
        }
        last_address = address;

        let base = *base.get_or_insert(address);
        let offset = address - base;

        let this_object = object_index;
        object_index += 1;

        if offset < opts.offset {
            info!("object {this_object} at offset {offset} precedes data start, skipped");
            continue;
        }
        if this_object < opts.selection.first {
            continue;
        }
        if let Some(last) = opts.selection.last {
            if this_object > last {
                continue;
            }
        }

        let name = if opts.extra_missions {
            get_obj_name_extra(this_object as i32)
        } else {
            get_obj_name(this_object as i32)
        };
        if let Some(wanted) = &opts.name {
            if &name != wanted {
                continue;
            }
            stop = true;
        }

        let file_pos = (offset - opts.offset) as u64;
        model_reader.seek_to(SeekPos::Absolute(file_pos))?;
        if model_reader.at_eof()? {
            break;
        }

        let row = process_object(model_reader, this_object, &name, opts, emitter)?;
        report.objects_converted += 1;
        if opts.list || opts.summary {
            report.rows.push(row);
        }
    }

    Ok(report)
}

/// Decodes, post-processes, and (unless in list/summary mode) emits one
/// object. Always returns the row data list-mode needs, even when nothing is
/// written.
fn process_object<MR, W>(
    reader: &mut MR,
    object_index: usize,
    name: &str,
    opts: &Options,
    emitter: &mut ObjEmitter<W>,
) -> ChocResult<ListRow>
where
    MR: ByteReader,
    W: ObjWriter<f64>,
{
    let header = read_object_header(reader, object_index)?;

    let mut varray = VertexArray::new();
    let mut groups = Groups::new();

    parse_vertices(reader, &mut varray, &header, opts)?;
    if header.nprimitives > 0 && header.nsprimitives > 0 {
        parse_primitives(reader, object_index, &mut varray, &mut groups, &header, opts)?;
    }

    let row = ListRow {
        object_index,
        name: name.to_string(),
        nvertices: header.nvertices,
        nprimitives: header.nprimitives,
    };

    if opts.list || opts.summary {
        return Ok(row);
    }

    if opts.clip_polygons {
        clip_coplanar_overlaps(&mut varray, &mut groups);
    }
    mark_vertices(&mut varray, &groups, opts.unused);
    if !opts.duplicate {
        cull_duplicates(&mut varray, &mut groups);
    }
    let coords = renumber_vertices(&mut varray, &mut groups);

    emitter.write_object(name, &header, &coords, &groups)?;

    Ok(row)
}
