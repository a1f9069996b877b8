//! Plane/container/normal finding, ported from
//! `examples/original_source/findnorm.c`.
//!
//! `Primitive.h`'s `primitive_find_plane`/`primitive_coplanar`/
//! `primitive_contains`/`primitive_get_normal` were never part of the
//! retained source (only declared and called from `findnorm.c`); their
//! contracts are reconstructed here as 2D-projection plane tests.

use crate::primitive::{Group, GroupId, Groups, Primitive};
use crate::vecmath::Vec3;
use crate::vertex::VertexArray;

/// One of the three axis-aligned 2D projections a planar polygon can be
/// tested in, chosen so the polygon is non-degenerate when projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Xy,
    Yz,
    Xz,
}

impl Plane {
    pub fn project(self, v: Vec3) -> (f64, f64) {
        match self {
            Plane::Xy => (v.x, v.y),
            Plane::Yz => (v.y, v.z),
            Plane::Xz => (v.x, v.z),
        }
    }

    /// Reconstructs a 3D point from a 2D projected point plus the constant
    /// coordinate the projection dropped, used to materialize new vertices
    /// produced by coplanar polygon clipping.
    pub fn unproject(self, level: f64, p: (f64, f64)) -> Vec3 {
        match self {
            Plane::Xy => Vec3::new(p.0, p.1, level),
            Plane::Yz => Vec3::new(level, p.0, p.1),
            Plane::Xz => Vec3::new(p.0, level, p.1),
        }
    }

    /// The coordinate a polygon in this plane holds constant.
    pub fn level(self, v: Vec3) -> f64 {
        match self {
            Plane::Xy => v.z,
            Plane::Yz => v.x,
            Plane::Xz => v.y,
        }
    }
}

pub fn polygon_coords(primitive: &Primitive, varray: &VertexArray) -> Vec<Vec3> {
    primitive
        .sides()
        .iter()
        .map(|&i| varray.coord(i).unwrap_or(Vec3::ZERO))
        .collect()
}

/// Finds a 2D projection in which `primitive`'s polygon is non-degenerate.
/// Fails for points and lines (fewer than 3 sides) and for degenerate
/// (zero-area in every projection) polygons.
pub fn find_plane(primitive: &Primitive, varray: &VertexArray) -> Option<Plane> {
    if primitive.num_sides() < 3 {
        return None;
    }
    let coords = polygon_coords(primitive, varray);
    for plane in [Plane::Xy, Plane::Yz, Plane::Xz] {
        if polygon_area_2d(&coords, plane) > f64::EPSILON {
            return Some(plane);
        }
    }
    None
}

fn polygon_area_2d(coords: &[Vec3], plane: Plane) -> f64 {
    let pts: Vec<(f64, f64)> = coords.iter().map(|&c| plane.project(c)).collect();
    let n = pts.len();
    let mut area = 0.0;
    for i in 0..n {
        let (x0, y0) = pts[i];
        let (x1, y1) = pts[(i + 1) % n];
        area += x0 * y1 - x1 * y0;
    }
    area.abs() / 2.0
}

/// True iff every vertex of `b` lies in `a`'s plane (all projected points of
/// `b` share `a`'s constant coordinate along the axis `plane` drops).
pub fn coplanar(a: &Primitive, b: &Primitive, varray: &VertexArray, plane: Plane) -> bool {
    let a_coords = polygon_coords(a, varray);
    let b_coords = polygon_coords(b, varray);
    if a_coords.is_empty() || b_coords.is_empty() {
        return false;
    }
    let normal_axis = |v: Vec3| match plane {
        Plane::Xy => v.z,
        Plane::Yz => v.x,
        Plane::Xz => v.y,
    };
    let level = normal_axis(a_coords[0]);
    a_coords
        .iter()
        .chain(b_coords.iter())
        .all(|&c| (normal_axis(c) - level).abs() < 1e-9)
}

/// 2D point-in-polygon test (ray casting): true iff every vertex of `b`,
/// projected onto `plane`, lies within or on the boundary of `a`'s
/// projected polygon.
pub fn contains(a: &Primitive, b: &Primitive, varray: &VertexArray, plane: Plane) -> bool {
    let a_pts: Vec<(f64, f64)> = polygon_coords(a, varray)
        .iter()
        .map(|&c| plane.project(c))
        .collect();
    let b_pts: Vec<(f64, f64)> = polygon_coords(b, varray)
        .iter()
        .map(|&c| plane.project(c))
        .collect();
    b_pts.iter().all(|&p| point_in_polygon(p, &a_pts))
}

fn point_in_polygon(p: (f64, f64), poly: &[(f64, f64)]) -> bool {
    let (px, py) = p;
    let n = poly.len();
    let mut inside = false;
    for i in 0..n {
        let (x0, y0) = poly[i];
        let (x1, y1) = poly[(i + 1) % n];
        if (x0 - px).abs() < 1e-9 && (y0 - py).abs() < 1e-9 {
            return true; // vertex coincides with a polygon corner
        }
        let crosses = (y0 > py) != (y1 > py);
        if crosses {
            let x_at_y = x0 + (py - y0) * (x1 - x0) / (y1 - y0);
            if (x_at_y - px).abs() < 1e-9 {
                return true; // point lies on an edge
            }
            if x_at_y > px {
                inside = !inside;
            }
        }
    }
    inside
}

/// Searches backwards within `group`'s primitives, starting from index
/// `back`, for one that is planar, coplanar with `front`, and contains it.
fn find_container_in_group<'g>(
    varray: &VertexArray,
    front: &Primitive,
    group: &'g Group,
    back: usize,
) -> Option<(usize, &'g Primitive, Plane)> {
    for b in (0..=back).rev() {
        let candidate = group.get(b);
        let Some(plane) = find_plane(candidate, varray) else {
            continue;
        };
        if !coplanar(candidate, front, varray, plane) {
            continue;
        }
        if contains(candidate, front, varray, plane) {
            return Some((b, candidate, plane));
        }
    }
    None
}

/// Finds the polygon that contains the most recently added primitive of
/// `group`: first searching earlier primitives in the same group (from
/// second-to-last backwards), then each preceding group (each scanned from
/// its last primitive backwards), matching `find_container` in
/// `findnorm.c`.
fn find_container<'g>(varray: &VertexArray, groups: &'g Groups, group: GroupId) -> Option<&'g Primitive> {
    let front_group = groups.get(group);
    let nprimitives = front_group.len();
    if nprimitives == 0 {
        return None;
    }
    let front = front_group.get(nprimitives - 1);

    if nprimitives > 1 {
        if let Some((_, container, _)) =
            find_container_in_group(varray, front, front_group, nprimitives - 2)
        {
            return Some(container);
        }
    }

    for earlier in GroupId::ALL {
        if earlier == group {
            break;
        }
        let back_group = groups.get(earlier);
        if back_group.is_empty() {
            continue;
        }
        if let Some((_, container, _)) =
            find_container_in_group(varray, front, back_group, back_group.len() - 1)
        {
            return Some(container);
        }
    }
    None
}

/// Returns the plane normal of the polygon that contains the most recently
/// added primitive in `group`, if one exists (`find_container_normal`).
pub fn find_container_normal(varray: &VertexArray, groups: &Groups, group: GroupId) -> Option<Vec3> {
    let container = find_container(varray, groups, group)?;
    find_plane(container, varray)?;
    let coords = polygon_coords(container, varray);
    let normal = Vec3::cross(coords[1] - coords[0], coords[2] - coords[0]).normalize();
    if normal == Vec3::ZERO {
        None
    } else {
        Some(normal)
    }
}

/// Flips every primitive in every group so its normal faces `+Z`, used by
/// the back-face heuristic for objects whose vertices are all z≡0
/// (`flip_backfacing`).
pub fn flip_backfacing(varray: &VertexArray, groups: &mut Groups) {
    for id in GroupId::ALL {
        let group = groups.get_mut(id);
        for i in 0..group.len() {
            let primitive = group.get_mut(i);
            if primitive.num_sides() < 3 {
                continue;
            }
            primitive.set_normal(Vec3::new(0.0, 0.0, 1.0), |idx| {
                varray.coord(idx).unwrap_or(Vec3::ZERO)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Outline;
    use pretty_assertions::assert_eq;

    fn square_varray() -> VertexArray {
        let mut va = VertexArray::new();
        va.push(Vec3::new(0.0, 0.0, 0.0));
        va.push(Vec3::new(2.0, 0.0, 0.0));
        va.push(Vec3::new(2.0, 2.0, 0.0));
        va.push(Vec3::new(0.0, 2.0, 0.0));
        va.push(Vec3::new(0.5, 0.5, 0.0));
        va.push(Vec3::new(1.5, 0.5, 0.0));
        va.push(Vec3::new(1.0, 1.0, 0.0));
        va
    }

    #[test]
    fn test_find_plane_for_xy_square() {
        let varray = square_varray();
        let square = Primitive::new(vec![0, 1, 2, 3], 0, 0xff, Outline::None);
        assert_eq!(find_plane(&square, &varray), Some(Plane::Xy));
    }

    #[test]
    fn test_find_plane_none_for_line() {
        let varray = square_varray();
        let line = Primitive::new(vec![0, 1], 0, 0xff, Outline::None);
        assert_eq!(find_plane(&line, &varray), None);
    }

    #[test]
    fn test_coplanar_and_contains() {
        let varray = square_varray();
        let square = Primitive::new(vec![0, 1, 2, 3], 0, 0xff, Outline::None);
        let inner = Primitive::new(vec![4, 5, 6], 0, 0xff, Outline::None);
        let plane = find_plane(&square, &varray).unwrap();
        assert!(coplanar(&square, &inner, &varray, plane));
        assert!(contains(&square, &inner, &varray, plane));
    }

    #[test]
    fn test_contains_false_when_outside() {
        let mut varray = square_varray();
        varray.push(Vec3::new(5.0, 5.0, 0.0));
        varray.push(Vec3::new(6.0, 5.0, 0.0));
        varray.push(Vec3::new(5.0, 6.0, 0.0));
        let square = Primitive::new(vec![0, 1, 2, 3], 0, 0xff, Outline::None);
        let outer = Primitive::new(vec![7, 8, 9], 0, 0xff, Outline::None);
        let plane = find_plane(&square, &varray).unwrap();
        assert!(!contains(&square, &outer, &varray, plane));
    }

    #[test]
    fn test_find_container_normal_same_group() {
        let varray = square_varray();
        let mut groups = Groups::new();
        groups
            .get_mut(GroupId::Simple)
            .add(Primitive::new(vec![0, 1, 2, 3], 0, 0xff, Outline::None));
        groups
            .get_mut(GroupId::Simple)
            .add(Primitive::new(vec![4, 5, 6], 0, 0xff, Outline::None));

        let normal = find_container_normal(&varray, &groups, GroupId::Simple);
        assert!(normal.is_some());
        let n = normal.unwrap();
        assert!((n.x.abs() < 1e-9) && (n.y.abs() < 1e-9) && (n.z.abs() > 0.9));
    }

    #[test]
    fn test_find_container_normal_none_when_alone() {
        let varray = square_varray();
        let mut groups = Groups::new();
        groups
            .get_mut(GroupId::Simple)
            .add(Primitive::new(vec![0, 1, 2, 3], 0, 0xff, Outline::None));
        assert_eq!(find_container_normal(&varray, &groups, GroupId::Simple), None);
    }

    #[test]
    fn test_flip_backfacing_aligns_to_plus_z() {
        let varray = square_varray();
        let mut groups = Groups::new();
        // wound to face -Z
        groups
            .get_mut(GroupId::Simple)
            .add(Primitive::new(vec![3, 2, 1, 0], 0, 0xff, Outline::None));

        flip_backfacing(&varray, &mut groups);
        let p = groups.get(GroupId::Simple).get(0);
        assert_eq!(p.sides(), &[0, 1, 2, 3]);
    }
}
