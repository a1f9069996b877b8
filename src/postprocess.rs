//! Post-decode cleanup: coplanar overlap clipping, vertex used/duplicate
//! marking, and renumbering. Ports `examples/original_source/parser.c`'s
//! `mark_vertices` and the `-clip`/`-unused`/`-duplicate` hooks driven from
//! `process_object`. No implementation of the original's coplanar clipper
//! survived in the retained source (only its effect is described); the
//! convex polygon difference below is this crate's own construction,
//! built on the plane/project primitives already in `geometry.rs`.

use crate::geometry::{coplanar, find_plane, polygon_coords, Plane};
use crate::object::mark_used_vertices;
use crate::primitive::{GroupId, Groups, Primitive};
use crate::vecmath::Vec3;
use crate::vertex::VertexArray;

const OVERLAP_EPSILON: f64 = 1e-9;

/// Clips every pair of coplanar overlapping polygons across `[Simple,
/// Complex]` in that order: whenever a later polygon overlaps part of an
/// earlier one, the earlier polygon is replaced by its area minus the
/// overlap, so no two polygons occupy the same area.
pub fn clip_coplanar_overlaps(varray: &mut VertexArray, groups: &mut Groups) {
    for group_id in GroupId::ALL {
        let mut i = 0;
        while i < groups.get(group_id).len() {
            clip_against_later(varray, groups, group_id, i);
            i += 1;
        }
    }
}

fn clip_against_later(varray: &mut VertexArray, groups: &mut Groups, group_id: GroupId, i: usize) {
    let n = groups.get(group_id).len();
    for j in (i + 1)..n {
        let Some((plane, level, poly_a, poly_b)) = coplanar_projection(varray, groups, group_id, i, j) else {
            continue;
        };
        if polygon_area(&convex_intersection(&poly_a, &poly_b)) <= OVERLAP_EPSILON {
            continue;
        }
        let pieces = convex_difference(&poly_a, &poly_b);
        replace_with_pieces(varray, groups, group_id, i, plane, level, pieces);
        return;
    }
}

fn coplanar_projection(
    varray: &VertexArray,
    groups: &Groups,
    group_id: GroupId,
    i: usize,
    j: usize,
) -> Option<(Plane, f64, Vec<(f64, f64)>, Vec<(f64, f64)>)> {
    let group = groups.get(group_id);
    let a = group.get(i);
    let b = group.get(j);
    if a.num_sides() < 3 || b.num_sides() < 3 {
        return None;
    }
    let plane = find_plane(a, varray)?;
    if !coplanar(a, b, varray, plane) {
        return None;
    }
    let a_coords = polygon_coords(a, varray);
    let level = plane.level(a_coords[0]);
    let poly_a = a_coords.iter().map(|&c| plane.project(c)).collect();
    let poly_b = polygon_coords(b, varray).iter().map(|&c| plane.project(c)).collect();
    Some((plane, level, poly_a, poly_b))
}

fn replace_with_pieces(
    varray: &mut VertexArray,
    groups: &mut Groups,
    group_id: GroupId,
    i: usize,
    plane: Plane,
    level: f64,
    pieces: Vec<Vec<(f64, f64)>>,
) {
    let (colour, id, outline) = {
        let original = groups.get(group_id).get(i);
        (original.colour(), original.id(), original.outline())
    };

    let mut piece_sides: Vec<Vec<usize>> = pieces
        .into_iter()
        .filter(|p| p.len() >= 3 && polygon_area(p) > OVERLAP_EPSILON)
        .map(|p| p.into_iter().map(|pt| varray.push(plane.unproject(level, pt))).collect())
        .collect();

    if piece_sides.is_empty() {
        // Fully covered by the overlapping polygon: nothing is left to draw.
        groups.get_mut(group_id).set_used(i, false);
        return;
    }

    let first = piece_sides.remove(0);
    groups.get_mut(group_id).get_mut(i).set_sides(first);

    for sides in piece_sides {
        groups.get_mut(group_id).add(Primitive::new(sides, id, colour, outline));
    }
}

fn cross2(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn polygon_area(poly: &[(f64, f64)]) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    let n = poly.len();
    let mut area = 0.0;
    for k in 0..n {
        let (x0, y0) = poly[k];
        let (x1, y1) = poly[(k + 1) % n];
        area += x0 * y1 - x1 * y0;
    }
    area.abs() / 2.0
}

fn ensure_ccw(poly: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let n = poly.len();
    let mut signed = 0.0;
    for k in 0..n {
        let (x0, y0) = poly[k];
        let (x1, y1) = poly[(k + 1) % n];
        signed += x0 * y1 - x1 * y0;
    }
    if signed < 0.0 {
        poly.iter().rev().copied().collect()
    } else {
        poly.to_vec()
    }
}

fn segment_intersection(prev: (f64, f64), cur: (f64, f64), p0: (f64, f64), p1: (f64, f64)) -> (f64, f64) {
    let (x1, y1) = prev;
    let (x2, y2) = cur;
    let (x3, y3) = p0;
    let (x4, y4) = p1;
    let d = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if d.abs() < 1e-12 {
        return cur;
    }
    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / d;
    (x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Sutherland-Hodgman clip of `poly` against one directed edge of a convex
/// CCW clip polygon. `keep_outside` selects which side of the edge survives.
fn clip_half_plane(poly: &[(f64, f64)], edge: ((f64, f64), (f64, f64)), keep_outside: bool) -> Vec<(f64, f64)> {
    if poly.is_empty() {
        return Vec::new();
    }
    let (p0, p1) = edge;
    let inside = |pt: (f64, f64)| {
        let side = cross2(p0, p1, pt);
        if keep_outside {
            side < -OVERLAP_EPSILON
        } else {
            side > OVERLAP_EPSILON
        }
    };

    let n = poly.len();
    let mut out = Vec::new();
    for k in 0..n {
        let cur = poly[k];
        let prev = poly[(k + n - 1) % n];
        let cur_in = inside(cur);
        let prev_in = inside(prev);
        if cur_in {
            if !prev_in {
                out.push(segment_intersection(prev, cur, p0, p1));
            }
            out.push(cur);
        } else if prev_in {
            out.push(segment_intersection(prev, cur, p0, p1));
        }
    }
    out
}

/// Intersection of two convex polygons (`hole` need not be CCW; it is
/// normalized first).
fn convex_intersection(poly: &[(f64, f64)], hole: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let hole = ensure_ccw(hole);
    let mut remainder = poly.to_vec();
    let n = hole.len();
    for k in 0..n {
        if remainder.is_empty() {
            break;
        }
        let edge = (hole[k], hole[(k + 1) % n]);
        remainder = clip_half_plane(&remainder, edge, false);
    }
    remainder
}

/// `poly` minus `hole`, both convex, as a list of convex pieces (at most one
/// per edge of `hole`).
fn convex_difference(poly: &[(f64, f64)], hole: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let hole = ensure_ccw(hole);
    let mut remainder = poly.to_vec();
    let mut pieces = Vec::new();
    let n = hole.len();
    for k in 0..n {
        if remainder.is_empty() {
            break;
        }
        let edge = (hole[k], hole[(k + 1) % n]);
        let outside = clip_half_plane(&remainder, edge, true);
        if polygon_area(&outside) > OVERLAP_EPSILON {
            pieces.push(outside);
        }
        remainder = clip_half_plane(&remainder, edge, false);
    }
    pieces
}

/// Marks vertices used, either all of them (`--unused`) or only those
/// referenced by a side in either group (`mark_vertices`).
pub fn mark_vertices(varray: &mut VertexArray, groups: &Groups, keep_unused: bool) {
    if keep_unused {
        varray.mark_all_used();
    } else {
        mark_used_vertices(varray, groups);
    }
}

/// Merges duplicate-coordinate vertices and redirects every side onto its
/// survivor (`--duplicate` off, the default).
pub fn cull_duplicates(varray: &mut VertexArray, groups: &mut Groups) {
    let redirect = varray.merge_duplicates();
    for group_id in GroupId::ALL {
        let group = groups.get_mut(group_id);
        for idx in 0..group.len() {
            let sides: Vec<usize> = group.get(idx).sides().iter().map(|&s| redirect[s]).collect();
            group.get_mut(idx).set_sides(sides);
        }
    }
}

/// Builds the compact `[0, vobject)` vertex numbering and rewrites every
/// side to match, returning the surviving coordinates in output order.
pub fn renumber_vertices(varray: &mut VertexArray, groups: &mut Groups) -> Vec<Vec3> {
    let coords = varray.renumber();
    for group_id in GroupId::ALL {
        let group = groups.get_mut(group_id);
        for idx in 0..group.len() {
            let sides: Vec<usize> = group
                .get(idx)
                .sides()
                .iter()
                .map(|&s| varray.renumber_of(s).expect("side references a vertex marked used"))
                .collect();
            group.get_mut(idx).set_sides(sides);
        }
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Outline;
    use pretty_assertions::assert_eq;

    fn square(varray: &mut VertexArray, x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<usize> {
        vec![
            varray.push(Vec3::new(x0, y0, 0.0)),
            varray.push(Vec3::new(x1, y0, 0.0)),
            varray.push(Vec3::new(x1, y1, 0.0)),
            varray.push(Vec3::new(x0, y1, 0.0)),
        ]
    }

    #[test]
    fn test_clip_splits_overlapping_squares() {
        let mut varray = VertexArray::new();
        let under = square(&mut varray, 0.0, 0.0, 4.0, 4.0);
        let over = square(&mut varray, 2.0, 2.0, 6.0, 6.0);
        let mut groups = Groups::new();
        groups.get_mut(GroupId::Simple).add(Primitive::new(under, 1, 0, Outline::None));
        groups.get_mut(GroupId::Simple).add(Primitive::new(over, 2, 0, Outline::None));

        clip_coplanar_overlaps(&mut varray, &mut groups);

        let simple = groups.get(GroupId::Simple);
        assert!(simple.len() > 2); // the underlying square was split into pieces
        let remaining_area: f64 = simple
            .iter_used()
            .map(|(_, p)| {
                let coords: Vec<(f64, f64)> = p.sides().iter().map(|&s| {
                    let c = varray.coord(s).unwrap();
                    (c.x, c.y)
                }).collect();
                polygon_area(&coords)
            })
            .sum();
        // total area should equal the union of the two squares (16 + 16 - 4 overlap)
        assert!((remaining_area - 28.0).abs() < 1e-6);
    }

    #[test]
    fn test_clip_leaves_disjoint_polygons_untouched() {
        let mut varray = VertexArray::new();
        let a = square(&mut varray, 0.0, 0.0, 1.0, 1.0);
        let b = square(&mut varray, 10.0, 10.0, 11.0, 11.0);
        let mut groups = Groups::new();
        groups.get_mut(GroupId::Simple).add(Primitive::new(a.clone(), 1, 0, Outline::None));
        groups.get_mut(GroupId::Simple).add(Primitive::new(b, 2, 0, Outline::None));

        clip_coplanar_overlaps(&mut varray, &mut groups);

        let simple = groups.get(GroupId::Simple);
        assert_eq!(simple.len(), 2);
        assert_eq!(simple.get(0).sides(), a.as_slice());
    }

    #[test]
    fn test_mark_vertices_unused_default() {
        let mut varray = VertexArray::new();
        varray.push(Vec3::ZERO);
        varray.push(Vec3::new(1.0, 0.0, 0.0));
        varray.push(Vec3::new(0.0, 1.0, 0.0));
        let mut groups = Groups::new();
        groups.get_mut(GroupId::Simple).add(Primitive::new(vec![0, 1], 0, 0, Outline::None));

        mark_vertices(&mut varray, &groups, false);
        assert!(varray.is_used(0));
        assert!(varray.is_used(1));
        assert!(!varray.is_used(2));
    }

    #[test]
    fn test_mark_vertices_keep_unused() {
        let mut varray = VertexArray::new();
        varray.push(Vec3::ZERO);
        varray.push(Vec3::new(1.0, 0.0, 0.0));
        let groups = Groups::new();

        mark_vertices(&mut varray, &groups, true);
        assert!(varray.is_used(0));
        assert!(varray.is_used(1));
    }

    #[test]
    fn test_cull_duplicates_redirects_sides() {
        let mut varray = VertexArray::new();
        varray.push(Vec3::new(0.0, 0.0, 0.0));
        varray.push(Vec3::new(1.0, 0.0, 0.0));
        varray.push(Vec3::new(0.0, 0.0, 0.0));
        varray.mark_all_used();
        let mut groups = Groups::new();
        groups.get_mut(GroupId::Simple).add(Primitive::new(vec![0, 1, 2], 0, 0, Outline::None));

        cull_duplicates(&mut varray, &mut groups);

        assert_eq!(groups.get(GroupId::Simple).get(0).sides(), &[0, 1, 0]);
        assert!(!varray.is_used(2));
    }

    #[test]
    fn test_renumber_rewrites_sides() {
        let mut varray = VertexArray::new();
        varray.push(Vec3::new(1.0, 1.0, 1.0));
        varray.push(Vec3::new(2.0, 2.0, 2.0));
        varray.push(Vec3::new(3.0, 3.0, 3.0));
        varray.mark_used(0);
        varray.mark_used(2);
        let mut groups = Groups::new();
        groups.get_mut(GroupId::Simple).add(Primitive::new(vec![0, 2], 0, 0, Outline::None));

        let coords = renumber_vertices(&mut varray, &mut groups);

        assert_eq!(coords, vec![Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0)]);
        assert_eq!(groups.get(GroupId::Simple).get(0).sides(), &[0, 1]);
    }
}
