//! Procedural "special" primitive generators, ported from
//! `examples/original_source/parser.c` (`make_special_dashed`,
//! `make_special_zigzags`, `make_special_points`, `make_special_quads`,
//! `make_special_hatch`, `thicken_line`, `get_thick_vec`).
//!
//! Every generator replaces the seed primitive the decoder already appended
//! at the tail of `group` with the first of `n` derived primitives, and
//! appends the rest as siblings inheriting the seed's `id`. None
//! of them touch any other group's contents, so they only need a mutable
//! borrow of the target group plus the shared vertex array.

use crate::error::{ChocError, ChocResult};
use crate::geometry::find_container_normal;
use crate::primitive::{Groups, GroupId, Outline, Primitive};
use crate::vecmath::{Coord, Vec3};
use crate::vertex::VertexArray;

fn resolve(varray: &VertexArray) -> impl Fn(usize) -> Vec3 + '_ {
    move |i: usize| varray.coord(i).unwrap_or(Vec3::ZERO)
}

/// Computes a vector perpendicular to `along`, in the plane with normal
/// `normal`, scaled to length `half_thick`. Returns `None` when `normal` and
/// `along` are parallel (degenerate cross product), matching `get_thick_vec`
/// returning `false` when `vector_norm` fails on a zero vector.
fn thick_vec(normal: Vec3, along: Vec3, half_thick: Coord) -> Option<Vec3> {
    let unit = Vec3::cross(normal, along).normalize();
    if unit == Vec3::ZERO {
        None
    } else {
        Some(unit * half_thick)
    }
}

fn seed_index(groups: &Groups, group: GroupId) -> ChocResult<usize> {
    groups
        .get(group)
        .last_index()
        .ok_or_else(|| ChocError::Resource("no seed primitive for procedural generator".into()))
}

/// Places `sides` onto the `d`-th output primitive: `d == 0` overwrites the
/// seed in place, later indices append a fresh sibling inheriting `id` and
/// `colour`. Returns the index of the primitive just written.
fn emit(
    groups: &mut Groups,
    group: GroupId,
    d: usize,
    seed_idx: usize,
    id: i32,
    colour: u8,
    sides: Vec<usize>,
) -> usize {
    if d == 0 {
        let g = groups.get_mut(group);
        g.get_mut(seed_idx).set_sides(sides);
        g.get_mut(seed_idx).set_colour(colour);
        seed_idx
    } else {
        let primitive = Primitive::new(sides, id, colour, Outline::None);
        groups.get_mut(group).add(primitive)
    }
}

fn ordered(sides: &[usize], reverse: bool) -> Vec<usize> {
    if reverse {
        sides.iter().rev().copied().collect()
    } else {
        sides.to_vec()
    }
}

/// Dashed line from a 2-vertex seed `(vs, ve)`.
pub fn make_special_dashed(
    varray: &mut VertexArray,
    groups: &mut Groups,
    group: GroupId,
    n: usize,
    colour: u8,
    thick: Coord,
) -> ChocResult<()> {
    let seed_idx = seed_index(groups, group)?;
    let seed = groups.get(group).get(seed_idx);
    debug_assert_eq!(seed.num_sides(), 2);
    let (vs, ve, id) = (seed.side(0), seed.side(1), seed.id());

    let cs = varray
        .coord(vs)
        .ok_or_else(|| ChocError::Format("dashed line seed vertex out of range".into()))?;
    let ce = varray
        .coord(ve)
        .ok_or_else(|| ChocError::Format("dashed line seed vertex out of range".into()))?;
    let vec = ce - cs;
    let dashl = vec * (1.0 / (n as Coord * 2.0));

    let norm = if thick > 0.0 {
        find_container_normal(varray, groups, group)
    } else {
        None
    };
    let thickening = norm.and_then(|n| thick_vec(n, vec, thick / 2.0));

    let mut reverse = false;
    for d in 0..n {
        let start = cs + vec * (d as Coord / n as Coord);
        let mut verts = Vec::with_capacity(4);
        if let Some(t) = thickening {
            verts.push(varray.push(start + t));
            verts.push(varray.push(start + t + dashl));
            verts.push(varray.push(start - t + dashl));
            verts.push(varray.push(start - t));
        } else {
            verts.push(if d == 0 { vs } else { varray.push(start) });
            verts.push(varray.push(start + dashl));
        }

        let sides = ordered(&verts, reverse);
        emit(groups, group, d, seed_idx, id, colour, sides);

        if d == 0 {
            if let Some(n) = norm {
                if thickening.is_some() {
                    let g = groups.get_mut(group);
                    reverse = g.get_mut(seed_idx).set_normal(n, resolve(varray));
                }
            }
        }
    }
    Ok(())
}

/// Zigzag line from a 3-vertex seed `(vw, vs, ve)`.
pub fn make_special_zigzags(
    varray: &mut VertexArray,
    groups: &mut Groups,
    group: GroupId,
    n: usize,
    colour: u8,
) -> ChocResult<()> {
    let seed_idx = seed_index(groups, group)?;
    let seed = groups.get(group).get(seed_idx);
    debug_assert_eq!(seed.num_sides(), 3);
    let (vw, vs, ve, id) = (seed.side(0), seed.side(1), seed.side(2), seed.id());

    let cw = varray
        .coord(vw)
        .ok_or_else(|| ChocError::Format("zigzag seed vertex out of range".into()))?;
    let cs = varray
        .coord(vs)
        .ok_or_else(|| ChocError::Format("zigzag seed vertex out of range".into()))?;
    let ce = varray
        .coord(ve)
        .ok_or_else(|| ChocError::Format("zigzag seed vertex out of range".into()))?;
    let vecl = ce - cs;
    let vecw = cw - cs;

    let mut vlast = vs;
    for d in 0..n {
        let mut coords = vecl * ((d + 1) as Coord / n as Coord);
        if d % 2 == 0 {
            coords = coords + vecw;
        }
        let p = cs + coords;
        let v = varray.push(p);
        emit(groups, group, d, seed_idx, id, colour, vec![vlast, v]);
        vlast = v;
    }
    Ok(())
}

/// Dotted points from a 3-vertex seed, only using `(vs, ve)`.
pub fn make_special_points(
    varray: &mut VertexArray,
    groups: &mut Groups,
    group: GroupId,
    n: usize,
    colour: u8,
) -> ChocResult<()> {
    let seed_idx = seed_index(groups, group)?;
    let seed = groups.get(group).get(seed_idx);
    debug_assert_eq!(seed.num_sides(), 3);
    let (vs, ve, id) = (seed.side(0), seed.side(1), seed.id());

    let cs = varray
        .coord(vs)
        .ok_or_else(|| ChocError::Format("dotted-points seed vertex out of range".into()))?;
    let ce = varray
        .coord(ve)
        .ok_or_else(|| ChocError::Format("dotted-points seed vertex out of range".into()))?;
    let vec = ce - cs;
    let twice_n = (n * 2) as Coord;

    for d in 0..n {
        let p = cs + vec * (((d * 2 + 1) as Coord) / twice_n);
        let v = varray.push(p);
        emit(groups, group, d, seed_idx, id, colour, vec![v]);
    }
    Ok(())
}

/// Repeating quad strip from a 3-vertex seed `(vs, ve, vw)`.
/// Emits `2n` primitives instead of `n` when no container normal is found
/// (each quad forward and reversed, since the game never back-face-culls
/// these).
pub fn make_special_quads(
    varray: &mut VertexArray,
    groups: &mut Groups,
    group: GroupId,
    n: usize,
    colour: u8,
) -> ChocResult<()> {
    let seed_idx = seed_index(groups, group)?;
    let seed = groups.get(group).get(seed_idx);
    debug_assert_eq!(seed.num_sides(), 3);
    let (vs, ve, vw, id) = (seed.side(0), seed.side(1), seed.side(2), seed.id());

    let cs = varray
        .coord(vs)
        .ok_or_else(|| ChocError::Format("quad strip seed vertex out of range".into()))?;
    let ce = varray
        .coord(ve)
        .ok_or_else(|| ChocError::Format("quad strip seed vertex out of range".into()))?;
    let cw = varray
        .coord(vw)
        .ok_or_else(|| ChocError::Format("quad strip seed vertex out of range".into()))?;
    let vecl = ce - cs;
    let vecw = cw - cs;
    let quadl = vecl * (1.0 / (n as Coord * 2.0));

    let mut norm = find_container_normal(varray, groups, group);
    let got_normal = if norm.is_some() {
        true
    } else {
        groups.get_mut(group).get_mut(seed_idx).reverse_sides();
        norm = find_container_normal(varray, groups, group);
        groups.get_mut(group).get_mut(seed_idx).reverse_sides();
        norm.is_some()
    };

    let mut reverse = false;
    for d in 0..n {
        let quad_start = cs + vecl * (d as Coord / n as Coord);
        let mut verts = Vec::with_capacity(4);
        verts.push(if d == 0 { vs } else { varray.push(quad_start) });

        let quad_end = quad_start + quadl;
        verts.push(varray.push(quad_end));
        verts.push(varray.push(quad_end + vecw));

        if d == 0 {
            verts.push(vw);
        } else {
            verts.push(varray.push(quad_start + vecw));
        }

        let sides = ordered(&verts, reverse);
        let idx = emit(groups, group, d, seed_idx, id, colour, sides);

        if d == 0 {
            if let Some(n) = norm {
                reverse = groups.get_mut(group).get_mut(idx).set_normal(n, resolve(varray));
            }
        }

        if !got_normal {
            let back_sides = ordered(&verts, !reverse);
            let back = Primitive::new(back_sides, id, colour, Outline::None);
            groups.get_mut(group).add(back);
        }
    }
    Ok(())
}

/// Hatched parallelograms ("railway sleepers") from a 3-vertex seed
/// `(vw, vs, ve)`. Reproduces the original's fencepost error:
/// exactly `n` elements are emitted, never `n + 1`.
pub fn make_special_hatch(
    varray: &mut VertexArray,
    groups: &mut Groups,
    group: GroupId,
    n: usize,
    colour: u8,
    thick: Coord,
) -> ChocResult<()> {
    let seed_idx = seed_index(groups, group)?;
    let seed = groups.get(group).get(seed_idx);
    debug_assert_eq!(seed.num_sides(), 3);
    let (vw, vs, ve, id) = (seed.side(0), seed.side(1), seed.side(2), seed.id());

    let cw = varray
        .coord(vw)
        .ok_or_else(|| ChocError::Format("hatch seed vertex out of range".into()))?;
    let cs = varray
        .coord(vs)
        .ok_or_else(|| ChocError::Format("hatch seed vertex out of range".into()))?;
    let ce = varray
        .coord(ve)
        .ok_or_else(|| ChocError::Format("hatch seed vertex out of range".into()))?;
    let vecl = ce - cs;
    let vecw = cw - cs;

    let norm = if thick > 0.0 {
        find_container_normal(varray, groups, group)
    } else {
        None
    };
    let thickening = norm.and_then(|n| thick_vec(n, vecw, thick / 2.0));

    let mut reverse = false;
    for d in 0..n {
        let a = cs + vecl * (d as Coord / n as Coord);
        let mut verts = Vec::with_capacity(4);
        if let Some(t) = thickening {
            verts.push(varray.push(a + t));
            verts.push(varray.push(a + t + vecw));
            verts.push(varray.push(a - t + vecw));
            verts.push(varray.push(a - t));
        } else {
            verts.push(if d == 0 { vs } else { varray.push(a) });
            verts.push(varray.push(a + vecw));
        }

        let sides = ordered(&verts, reverse);
        emit(groups, group, d, seed_idx, id, colour, sides);

        if d == 0 {
            if let Some(n) = norm {
                if thickening.is_some() {
                    let g = groups.get_mut(group);
                    reverse = g.get_mut(seed_idx).set_normal(n, resolve(varray));
                }
            }
        }
    }
    Ok(())
}

/// Thickens an ordinary 2-sided line into a planar quad aligned with a
/// container's plane, when one can be found. Leaves the line
/// untouched if no container exists. Not a procedural special: acts on the
/// primitive the decoder has already validated as an ordinary line.
pub fn thicken_line(
    varray: &mut VertexArray,
    groups: &mut Groups,
    group: GroupId,
    thick: Coord,
) -> ChocResult<()> {
    debug_assert!(thick > 0.0);
    let idx = seed_index(groups, group)?;
    let seed = groups.get(group).get(idx);
    debug_assert_eq!(seed.num_sides(), 2);
    let (vs, ve) = (seed.side(0), seed.side(1));

    let cs = varray
        .coord(vs)
        .ok_or_else(|| ChocError::Format("line seed vertex out of range".into()))?;
    let ce = varray
        .coord(ve)
        .ok_or_else(|| ChocError::Format("line seed vertex out of range".into()))?;
    let vec = ce - cs;

    let Some(norm) = find_container_normal(varray, groups, group) else {
        return Ok(());
    };
    let Some(t) = thick_vec(norm, vec, thick / 2.0) else {
        return Ok(());
    };

    let v0 = varray.push(cs + t);
    let v1 = varray.push(cs + t + vec);
    let v2 = varray.push(cs - t + vec);
    let v3 = varray.push(cs - t);

    let g = groups.get_mut(group);
    g.get_mut(idx).set_sides(vec![v0, v1, v2, v3]);
    g.get_mut(idx).set_normal(norm, resolve(varray));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded_line(groups: &mut Groups, varray: &mut VertexArray, a: Vec3, b: Vec3) {
        let va = varray.push(a);
        let vb = varray.push(b);
        groups
            .get_mut(GroupId::Simple)
            .add(Primitive::new(vec![va, vb], 1, 0xaa, Outline::None));
    }

    fn seeded_tri(groups: &mut Groups, varray: &mut VertexArray, w: Vec3, s: Vec3, e: Vec3) {
        let vw = varray.push(w);
        let vs = varray.push(s);
        let ve = varray.push(e);
        groups
            .get_mut(GroupId::Simple)
            .add(Primitive::new(vec![vw, vs, ve], 1, 0xaa, Outline::None));
    }

    #[test]
    fn test_dashed_line_count_and_colour_no_thick() {
        let mut varray = VertexArray::new();
        let mut groups = Groups::new();
        seeded_line(&mut groups, &mut varray, Vec3::new(0.0, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0));

        make_special_dashed(&mut varray, &mut groups, GroupId::Simple, 8, 0xff, 0.0).unwrap();

        let g = groups.get(GroupId::Simple);
        assert_eq!(g.len(), 8);
        for i in 0..8 {
            assert_eq!(g.get(i).num_sides(), 2);
            assert_eq!(g.get(i).colour(), 0xff);
            assert_eq!(g.get(i).id(), 1);
        }
        let first = g.get(0);
        let (c0, c1) = (
            varray.coord(first.side(0)).unwrap(),
            varray.coord(first.side(1)).unwrap(),
        );
        assert_eq!(c0, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(c1, Vec3::new(6.25, 0.0, 0.0));
    }

    #[test]
    fn test_zigzag_alternates_and_chains() {
        let mut varray = VertexArray::new();
        let mut groups = Groups::new();
        seeded_tri(
            &mut groups,
            &mut varray,
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
        );

        make_special_zigzags(&mut varray, &mut groups, GroupId::Simple, 16, 0x00).unwrap();

        let g = groups.get(GroupId::Simple);
        assert_eq!(g.len(), 16);
        // each segment's start equals the previous segment's end
        for i in 1..16 {
            let prev_end = g.get(i - 1).side(1);
            let cur_start = g.get(i).side(0);
            assert_eq!(prev_end, cur_start);
        }
    }

    #[test]
    fn test_dotted_points_single_sided() {
        let mut varray = VertexArray::new();
        let mut groups = Groups::new();
        seeded_tri(
            &mut groups,
            &mut varray,
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
        );

        make_special_points(&mut varray, &mut groups, GroupId::Simple, 32, 0x56).unwrap();

        let g = groups.get(GroupId::Simple);
        assert_eq!(g.len(), 32);
        assert_eq!(g.get(0).num_sides(), 1);
        assert_eq!(g.get(0).colour(), 0x56);
    }

    #[test]
    fn test_quad_strip_doubles_without_container() {
        let mut varray = VertexArray::new();
        let mut groups = Groups::new();
        seeded_tri(
            &mut groups,
            &mut varray,
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
        );

        make_special_quads(&mut varray, &mut groups, GroupId::Simple, 16, 0x03).unwrap();

        let g = groups.get(GroupId::Simple);
        assert_eq!(g.len(), 32); // no container: forward + back-facing pairs
        for i in 0..32 {
            assert_eq!(g.get(i).num_sides(), 4);
        }
    }

    #[test]
    fn test_quad_strip_single_when_container_present() {
        let mut varray = VertexArray::new();
        let mut groups = Groups::new();
        // A large containing square in the Simple group first.
        let a = varray.push(Vec3::new(-50.0, -50.0, 0.0));
        let b = varray.push(Vec3::new(150.0, -50.0, 0.0));
        let c = varray.push(Vec3::new(150.0, 50.0, 0.0));
        let d = varray.push(Vec3::new(-50.0, 50.0, 0.0));
        groups
            .get_mut(GroupId::Simple)
            .add(Primitive::new(vec![a, b, c, d], 0, 0xff, Outline::None));

        seeded_tri(
            &mut groups,
            &mut varray,
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
        );

        make_special_quads(&mut varray, &mut groups, GroupId::Simple, 16, 0x03).unwrap();

        // 1 container + 16 quads (no doubling since a container was found)
        let g = groups.get(GroupId::Simple);
        assert_eq!(g.len(), 1 + 16);
    }

    #[test]
    fn test_hatch_exact_fencepost_count() {
        let mut varray = VertexArray::new();
        let mut groups = Groups::new();
        seeded_tri(
            &mut groups,
            &mut varray,
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
        );

        make_special_hatch(&mut varray, &mut groups, GroupId::Simple, 64, 0x5c, 0.0).unwrap();

        // exactly 64, not 65 - the game's fencepost bug is reproduced, not fixed
        assert_eq!(groups.get(GroupId::Simple).len(), 64);
    }

    #[test]
    fn test_thicken_line_noop_without_container() {
        let mut varray = VertexArray::new();
        let mut groups = Groups::new();
        seeded_line(&mut groups, &mut varray, Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0));

        thicken_line(&mut varray, &mut groups, GroupId::Simple, 2.0).unwrap();

        assert_eq!(groups.get(GroupId::Simple).get(0).num_sides(), 2);
    }

    #[test]
    fn test_thicken_line_builds_quad_with_container() {
        let mut varray = VertexArray::new();
        let mut groups = Groups::new();
        let a = varray.push(Vec3::new(-50.0, -50.0, 0.0));
        let b = varray.push(Vec3::new(150.0, -50.0, 0.0));
        let c = varray.push(Vec3::new(150.0, 50.0, 0.0));
        let d = varray.push(Vec3::new(-50.0, 50.0, 0.0));
        groups
            .get_mut(GroupId::Simple)
            .add(Primitive::new(vec![a, b, c, d], 0, 0xff, Outline::None));
        seeded_line(&mut groups, &mut varray, Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0));

        thicken_line(&mut varray, &mut groups, GroupId::Simple, 2.0).unwrap();

        assert_eq!(groups.get(GroupId::Simple).get(1).num_sides(), 4);
    }
}
