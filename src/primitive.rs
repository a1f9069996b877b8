//! Primitives (polygons, lines, points) and the two per-object groups that
//! hold them, modelled on the original tool's `Primitive`/`Group` opaque
//! types (`examples/original_source/parser.c`, `Group.h`, `Primitive.h`
//! are referenced but not themselves in the retained source — this module
//! reconstructs their contract from call-site usage: `group_add_primitive`,
//! `primitive_get_side`/`primitive_set_colour`/`primitive_set_id`/
//! `primitive_set_normal`, `group_get_num_primitives`, `group_set_used`).

use crate::vecmath::Vec3;

pub const MAX_NUM_PRIMITIVES: usize = 255;
/// Minimum side count of an *ordinary* (non-procedural) primitive once
/// validated. Procedural generators may construct
/// 1-sided points (dotted-line output), so [`Primitive::new`] itself only
/// enforces the wider `[1, MAX_NUM_SIDES]` range.
pub const MIN_NUM_SIDES: usize = 2;
pub const MAX_NUM_SIDES: usize = 8;

/// Outline style for polygon primitives (`Outline_None`/`Outline_Black`/
/// `Outline_Blue` in `parser.c`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outline {
    None,
    Black,
    Blue,
}

/// A decoded primitive: an ordered list of vertex indices into the current
/// object's [`crate::vertex::VertexArray`], plus colour, outline style, and
/// a computed normal once one has been found.
#[derive(Debug, Clone)]
pub struct Primitive {
    sides: Vec<usize>,
    id: i32,
    colour: u8,
    outline: Outline,
    normal: Option<Vec3>,
}

impl Primitive {
    pub fn new(sides: Vec<usize>, id: i32, colour: u8, outline: Outline) -> Self {
        debug_assert!(!sides.is_empty() && sides.len() <= MAX_NUM_SIDES);
        Primitive {
            sides,
            id,
            colour,
            outline,
            normal: None,
        }
    }

    pub fn num_sides(&self) -> usize {
        self.sides.len()
    }

    pub fn side(&self, index: usize) -> usize {
        self.sides[index]
    }

    pub fn sides(&self) -> &[usize] {
        &self.sides
    }

    /// Discards the current side list and replaces it, used by the
    /// procedural generators to overwrite a seed primitive in place
    /// (`primitive_delete_all` + repeated `primitive_add_side` in `parser.c`).
    pub fn set_sides(&mut self, sides: Vec<usize>) {
        debug_assert!(!sides.is_empty() && sides.len() <= MAX_NUM_SIDES);
        self.sides = sides;
        self.normal = None;
    }

    pub fn reverse_sides(&mut self) {
        self.sides.reverse();
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub fn colour(&self) -> u8 {
        self.colour
    }

    pub fn set_colour(&mut self, colour: u8) {
        self.colour = colour;
    }

    pub fn outline(&self) -> Outline {
        self.outline
    }

    pub fn normal(&self) -> Option<Vec3> {
        self.normal
    }

    /// Records a computed normal, flipping the side order to face it if the
    /// polygon winding disagrees. `resolve` maps a vertex index to its
    /// coordinate, mirroring `primitive_set_normal(primitive, varray, normal)`
    /// which is handed the object's vertex array. Returns whether a flip
    /// occurred, consumed by callers as the `reverse` flag for any vertices
    /// generated afterwards.
    pub fn set_normal(&mut self, normal: Vec3, resolve: impl Fn(usize) -> Vec3) -> bool {
        let reverse = if self.sides.len() >= 3 {
            let coords: Vec<Vec3> = self.sides.iter().map(|&s| resolve(s)).collect();
            Self::winding_normal(&coords)
                .map(|w| Vec3::dot(w, normal) < 0.0)
                .unwrap_or(false)
        } else {
            false
        };
        if reverse {
            self.sides.reverse();
        }
        self.normal = Some(normal);
        reverse
    }

    /// Computes a winding-order normal from the first three vertex
    /// coordinates of a polygon.
    fn winding_normal(coords: &[Vec3]) -> Option<Vec3> {
        if coords.len() < 3 {
            return None;
        }
        let a = coords[1] - coords[0];
        let b = coords[2] - coords[0];
        Some(Vec3::cross(a, b).normalize())
    }

    /// Identifies the "skew" side of an outlined polygon: the one furthest
    /// out of plane with its neighbours, used when thickening an outline
    /// into a quad strip (`primitive_get_skew_side`).
    pub fn skew_side(&self, coords: &[Vec3]) -> usize {
        let n = self.sides.len();
        let mut best = 0;
        let mut best_dist = -1.0;
        for s in 0..n {
            let prev = coords[self.sides[(s + n - 1) % n]];
            let cur = coords[self.sides[s]];
            let next = coords[self.sides[(s + 1) % n]];
            let edge = (next - prev).normalize();
            let to_cur = cur - prev;
            let proj = to_cur - edge * Vec3::dot(to_cur, edge);
            let dist = proj.length();
            if dist > best_dist {
                best_dist = dist;
                best = s;
            }
        }
        best
    }
}

/// One of the two rendering passes a decoded object's primitives are split
/// between (`Group_Simple`, `Group_Complex` in `parser.c`); complex-group
/// primitives are drawn after all simple-group ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupId {
    Simple,
    Complex,
}

impl GroupId {
    pub const ALL: [GroupId; 2] = [GroupId::Simple, GroupId::Complex];
}

/// An ordered collection of primitives sharing a [`GroupId`], with a
/// parallel `used` flag per primitive for post-processing passes that drop
/// primitives without renumbering the rest (`group_set_used`).
#[derive(Debug, Default)]
pub struct Group {
    primitives: Vec<Primitive>,
    used: Vec<bool>,
}

impl Group {
    pub fn new() -> Self {
        Group {
            primitives: Vec::new(),
            used: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
        self.used.clear();
    }

    pub fn add(&mut self, primitive: Primitive) -> usize {
        self.primitives.push(primitive);
        self.used.push(true);
        self.primitives.len() - 1
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Index of the most recently added primitive, the "seed" the
    /// procedural generators replace in place.
    pub fn last_index(&self) -> Option<usize> {
        self.primitives.len().checked_sub(1)
    }

    pub fn get(&self, index: usize) -> &Primitive {
        &self.primitives[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Primitive {
        &mut self.primitives[index]
    }

    pub fn is_used(&self, index: usize) -> bool {
        self.used[index]
    }

    pub fn set_used(&mut self, index: usize, used: bool) {
        self.used[index] = used;
    }

    /// Iterates over the primitives still marked used, in original order.
    pub fn iter_used(&self) -> impl Iterator<Item = (usize, &Primitive)> {
        self.primitives
            .iter()
            .enumerate()
            .filter(move |(i, _)| self.used[*i])
    }
}

/// The two per-object primitive groups, indexed by [`GroupId`].
#[derive(Debug, Default)]
pub struct Groups {
    simple: Group,
    complex: Group,
}

impl Groups {
    pub fn new() -> Self {
        Groups {
            simple: Group::new(),
            complex: Group::new(),
        }
    }

    pub fn clear(&mut self) {
        self.simple.clear();
        self.complex.clear();
    }

    pub fn get(&self, id: GroupId) -> &Group {
        match id {
            GroupId::Simple => &self.simple,
            GroupId::Complex => &self.complex,
        }
    }

    pub fn get_mut(&mut self, id: GroupId) -> &mut Group {
        match id {
            GroupId::Simple => &mut self.simple,
            GroupId::Complex => &mut self.complex,
        }
    }

    pub fn total_primitives(&self) -> usize {
        self.simple.len() + self.complex.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tri(a: usize, b: usize, c: usize) -> Primitive {
        Primitive::new(vec![a, b, c], 0, 0xff, Outline::None)
    }

    #[test]
    fn test_group_add_and_used() {
        let mut g = Group::new();
        let i = g.add(tri(0, 1, 2));
        assert_eq!(g.len(), 1);
        assert!(g.is_used(i));
        g.set_used(i, false);
        assert!(!g.is_used(i));
        assert_eq!(g.iter_used().count(), 0);
    }

    #[test]
    fn test_groups_total() {
        let mut groups = Groups::new();
        groups.get_mut(GroupId::Simple).add(tri(0, 1, 2));
        groups.get_mut(GroupId::Complex).add(tri(3, 4, 5));
        groups.get_mut(GroupId::Complex).add(tri(1, 2, 3));
        assert_eq!(groups.total_primitives(), 3);
    }

    #[test]
    fn test_set_normal_flips_on_disagreement() {
        let coords = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let resolve = |i: usize| coords[i];
        let winding = Primitive::winding_normal(&coords).unwrap();

        let mut p = Primitive::new(vec![0, 1, 2], 0, 0xff, Outline::None);
        let reversed = p.set_normal(-winding, resolve);
        assert!(reversed);
        assert_eq!(p.sides(), &[2, 1, 0]);
        assert_eq!(p.normal(), Some(-winding));
    }

    #[test]
    fn test_set_normal_keeps_order_on_agreement() {
        let coords = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let resolve = |i: usize| coords[i];
        let winding = Primitive::winding_normal(&coords).unwrap();

        let mut p = Primitive::new(vec![0, 1, 2], 0, 0xff, Outline::None);
        let reversed = p.set_normal(winding, resolve);
        assert!(!reversed);
        assert_eq!(p.sides(), &[0, 1, 2]);
    }

    #[test]
    fn test_clear_resets_groups() {
        let mut groups = Groups::new();
        groups.get_mut(GroupId::Simple).add(tri(0, 1, 2));
        groups.clear();
        assert_eq!(groups.total_primitives(), 0);
    }
}
