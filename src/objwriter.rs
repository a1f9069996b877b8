//! OBJ emission: global/per-object prelude, vertex/primitive blocks, colour
//! material naming, and mesh-style splitting. The decoder-side naming
//! ("process_object's output half") was not itself retained in
//! `examples/original_source/parser.c` — only its printed effect survives —
//! so the callback wiring here is this crate's own construction atop
//! `wavefront_obj_io`'s generic OBJ traits.

use std::io;

use crate::cli::{ColourMode, MeshStyleFlag, Options};
use crate::colour::{human_material, riscos_material, FalseColourState};
use crate::object::ObjectHeader;
use crate::primitive::{GroupId, Groups, Outline, Primitive};
use crate::vecmath::Vec3;
use crate::wavefront_obj_io::ObjWriter;

fn style_to_string(style: Outline) -> &'static str {
    match style {
        Outline::None => "No polygon outlines, thin lines",
        Outline::Black => "Black polygon outlines, thick lines",
        Outline::Blue => "Blue polygon outlines, thick lines",
    }
}

/// Names the material for one primitive, resolving the `--false-colour`
/// override (it replaces the colour value fed to naming, not the naming
/// scheme itself) against the plain `--human`/riscos choice.
fn name_material(mode: ColourMode, colour: u8, false_colour: &mut FalseColourState) -> String {
    match mode {
        ColourMode::False => riscos_material(false_colour.next_colour()),
        ColourMode::Human => human_material(colour),
        ColourMode::Riscos => riscos_material(colour),
    }
}

/// Splits a convex polygon's local vertex indices `[0, n)` into triangles
/// radiating from the first vertex (`n - 2` triangles).
fn triangle_fan_indices(n: usize) -> Vec<(usize, usize, usize)> {
    (1..n - 1).map(|i| (0, i, i + 1)).collect()
}

/// Splits a convex polygon's local vertex indices `[0, n)` into a connected
/// strip of triangles, alternating the cut from each end inward (`n - 2`
/// triangles, same count as the fan but sharing edges zigzag-style).
fn triangle_strip_indices(n: usize) -> Vec<(usize, usize, usize)> {
    let mut tris = Vec::new();
    let mut lo = 0usize;
    let mut hi = n - 1;
    let mut take_low = true;
    while hi - lo > 1 {
        if take_low {
            tris.push((lo, lo + 1, hi));
            lo += 1;
        } else {
            tris.push((lo, hi - 1, hi));
            hi -= 1;
        }
        take_low = !take_low;
    }
    tris
}

/// Drives Wavefront OBJ emission across a run: the global prelude once, then
/// one call to [`ObjEmitter::write_object`] per decoded object, tracking the
/// running global vertex-index base (`vtotal`) across objects.
pub struct ObjEmitter<W> {
    writer: W,
    colour_mode: ColourMode,
    mesh_style: MeshStyleFlag,
    negative_indices: bool,
    false_colour: FalseColourState,
    vtotal: usize,
}

impl<W: ObjWriter<f64>> ObjEmitter<W> {
    pub fn new(writer: W, opts: &Options) -> Self {
        ObjEmitter {
            writer,
            colour_mode: opts.colour_mode,
            mesh_style: opts.mesh_style,
            negative_indices: opts.negative_indices,
            false_colour: FalseColourState::new(),
            vtotal: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write_prelude(&mut self, mtllib: &str) -> io::Result<()> {
        self.writer.write_comment("Chocks Away graphics")?;
        self.writer.write_comment(format!(
            "Converted by ChoctoObj {}",
            env!("CARGO_PKG_VERSION")
        ))?;
        self.writer.write_mtllib(mtllib)
    }

    /// Emits one object's metadata, vertex block, and primitive block, and
    /// advances `vtotal` by the number of vertices written.
    pub fn write_object(
        &mut self,
        name: &str,
        header: &ObjectHeader,
        coords: &[Vec3],
        groups: &Groups,
    ) -> io::Result<()> {
        self.writer.write_blank_line()?;
        self.writer.write_object_name(name)?;
        self.writer
            .write_comment(format!("Simplification distance: {}", header.simple_dist))?;
        self.writer
            .write_comment(format!("Clip distance: {}", header.clip_dist))?;
        self.writer.write_comment(format!(
            "Primitive style: {}",
            style_to_string(header.primitive_style)
        ))?;

        for &c in coords {
            self.writer.write_vertex(c.x, c.y, c.z, None)?;
        }

        let base = self.vtotal;
        let vertex_total_after = base + coords.len();
        let mut current_material: Option<String> = None;

        for group_id in GroupId::ALL {
            for (_, primitive) in groups.get(group_id).iter_used() {
                let material = name_material(self.colour_mode, primitive.colour(), &mut self.false_colour);
                if current_material.as_deref() != Some(material.as_str()) {
                    self.writer.write_usemtl(&material)?;
                    current_material = Some(material);
                }
                self.write_primitive(primitive, base, vertex_total_after)?;
            }
        }

        self.vtotal = vertex_total_after;
        Ok(())
    }

    fn resolve_index(&self, local: usize, base: usize, vertex_total_after: usize) -> isize {
        let absolute = (base + local + 1) as isize;
        if self.negative_indices {
            absolute - vertex_total_after as isize - 1
        } else {
            absolute
        }
    }

    fn write_primitive(&mut self, primitive: &Primitive, base: usize, vertex_total_after: usize) -> io::Result<()> {
        let n = primitive.num_sides();
        let indices: Vec<isize> = primitive
            .sides()
            .iter()
            .map(|&local| self.resolve_index(local, base, vertex_total_after))
            .collect();

        match n {
            1 => self.writer.write_point(&indices),
            2 => self.writer.write_line(&indices),
            3 => self.writer.write_face_signed(&indices),
            _ => {
                let tris = match self.mesh_style {
                    MeshStyleFlag::NoChange => return self.writer.write_face_signed(&indices),
                    MeshStyleFlag::TriangleFan => triangle_fan_indices(n),
                    MeshStyleFlag::TriangleStrip => triangle_strip_indices(n),
                };
                for (a, b, c) in tris {
                    self.writer
                        .write_face_signed(&[indices[a], indices[b], indices[c]])?;
                }
                Ok(())
            }
        }
    }
}
