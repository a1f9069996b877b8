//! The active object's vertex array: append-only during decode, cleared
//! between objects (`examples/original_source/parser.c::parse_vertices`).

use crate::vecmath::Vec3;

pub const MAX_NUM_VERTICES: usize = 200;

#[derive(Debug, Clone, Copy)]
struct VertexSlot {
    coord: Vec3,
    used: bool,
    /// Populated during renumbering; `None` until then.
    renumber: Option<usize>,
}

/// Ordered sequence of vertex coordinates for the object currently being
/// decoded, each carrying a `used` flag and a `renumber` slot populated
/// during culling.
#[derive(Debug, Default)]
pub struct VertexArray {
    slots: Vec<VertexSlot>,
}

impl VertexArray {
    pub fn new() -> Self {
        VertexArray { slots: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Appends a vertex, marking it unused by default. Returns its index.
    pub fn push(&mut self, coord: Vec3) -> usize {
        self.slots.push(VertexSlot {
            coord,
            used: false,
            renumber: None,
        });
        self.slots.len() - 1
    }

    pub fn coord(&self, index: usize) -> Option<Vec3> {
        self.slots.get(index).map(|s| s.coord)
    }

    pub fn is_used(&self, index: usize) -> bool {
        self.slots.get(index).map(|s| s.used).unwrap_or(false)
    }

    pub fn mark_used(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.used = true;
        }
    }

    pub fn mark_all_used(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.used = true;
        }
    }

    pub fn renumber_of(&self, index: usize) -> Option<usize> {
        self.slots.get(index).and_then(|s| s.renumber)
    }

    /// Merges vertices with identical coordinates: all but the first
    /// occurrence in each group are marked unused, and `renumber` on the
    /// discarded slots is set to point at the survivor's index. The
    /// survivor inherits `used` from its group, since sides that referenced
    /// a folded duplicate are redirected onto it. Idempotent: running this
    /// twice yields the same vertex array.
    pub fn merge_duplicates(&mut self) -> Vec<usize> {
        let mut redirect: Vec<usize> = (0..self.slots.len()).collect();
        for i in 0..self.slots.len() {
            if redirect[i] != i {
                continue; // already redirected to an earlier survivor
            }
            for j in (i + 1)..self.slots.len() {
                if redirect[j] == j && self.slots[j].coord == self.slots[i].coord {
                    redirect[j] = i;
                    if self.slots[j].used {
                        self.slots[i].used = true;
                    }
                    self.slots[j].used = false;
                }
            }
        }
        redirect
    }

    /// Builds a compact mapping from live (`used`) vertex indices to
    /// `[0, vobject)`, storing it in each slot's `renumber` field, and
    /// returns the list of surviving coordinates in output order.
    pub fn renumber(&mut self) -> Vec<Vec3> {
        let mut out = Vec::new();
        for slot in self.slots.iter_mut() {
            if slot.used {
                slot.renumber = Some(out.len());
                out.push(slot.coord);
            } else {
                slot.renumber = None;
            }
        }
        out
    }
}
