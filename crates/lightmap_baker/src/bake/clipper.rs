//! Sutherland-Hodgman polygon clipping in lightmap pixel space
//!
//! Used by the rasterizer to compute the exact overlap between a texel's
//! unit square and a triangle, which is what makes the rasterization
//! conservative: any texel with non-zero geometric overlap is found.

use crate::foundation::math::{cross2, Vec2};

/// Upper bound on the clipped polygon's vertex count.
///
/// A quad clipped by a triangle has at most 7 vertices; anything beyond this
/// bound means the input geometry was degenerate upstream.
pub const MAX_CLIP_VERTICES: usize = 16;

/// Reusable ping-pong buffers for [`clip_polygon`].
///
/// Allocated once per bake session and owned by the caller so the per-texel
/// hot path does not allocate.
#[derive(Debug, Clone)]
pub struct ClipScratch {
    front: Vec<Vec2>,
    back: Vec<Vec2>,
}

impl Default for ClipScratch {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipScratch {
    /// Create scratch buffers sized for [`MAX_CLIP_VERTICES`]
    pub fn new() -> Self {
        Self {
            front: Vec::with_capacity(MAX_CLIP_VERTICES),
            back: Vec::with_capacity(MAX_CLIP_VERTICES),
        }
    }
}

/// Winding of a polygon: `1` counter-clockwise, `-1` clockwise, `0` degenerate
pub fn winding(polygon: &[Vec2]) -> i32 {
    let area = signed_area(polygon);
    if area > 0.0 {
        1
    } else if area < 0.0 {
        -1
    } else {
        0
    }
}

/// Shoelace signed area (positive for counter-clockwise in a y-up frame)
pub fn signed_area(polygon: &[Vec2]) -> f32 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        twice_area += cross2(&a, &b);
    }
    twice_area * 0.5
}

/// Absolute polygon area
pub fn polygon_area(polygon: &[Vec2]) -> f32 {
    signed_area(polygon).abs()
}

/// Average of the polygon's vertices
pub fn polygon_centroid(polygon: &[Vec2]) -> Option<Vec2> {
    if polygon.is_empty() {
        return None;
    }
    let sum = polygon.iter().fold(Vec2::zeros(), |acc, v| acc + v);
    Some(sum / polygon.len() as f32)
}

/// Barycentric coordinates of `p` in triangle `(p0, p1, p2)`.
///
/// Returns the weights of `p0`, `p1` and `p2`. Degenerate triangles yield
/// non-finite weights, which callers treat as "not covered".
pub fn to_barycentric(p0: &Vec2, p1: &Vec2, p2: &Vec2, p: &Vec2) -> [f32; 3] {
    let v0 = p2 - p0;
    let v1 = p1 - p0;
    let v2 = p - p0;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let inv_denom = 1.0 / (dot00 * dot11 - dot01 * dot01);
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;

    [1.0 - u - v, v, u]
}

/// Which side of the directed edge `a -> b` the point lies on, relative to
/// the clip polygon's winding. Points on the edge count as inside.
#[inline]
fn is_inside(a: &Vec2, b: &Vec2, p: &Vec2, dir: i32) -> bool {
    let side = cross2(&(b - a), &(p - a));
    if dir > 0 {
        side >= 0.0
    } else {
        side <= 0.0
    }
}

/// Intersection of segment `p0 -> p1` with the infinite line through `a -> b`
#[inline]
fn intersect(a: &Vec2, b: &Vec2, p0: &Vec2, p1: &Vec2) -> Vec2 {
    let edge = b - a;
    let segment = p1 - p0;
    let denom = cross2(&edge, &segment);
    if denom == 0.0 {
        return *p0;
    }
    let t = cross2(&(a - p0), &edge) / -denom;
    p0 + segment * t.clamp(0.0, 1.0)
}

/// Clip `subject` against the convex polygon `clip`.
///
/// The result is left in `scratch` and returned as a slice. An empty slice
/// means the polygons do not overlap (or the clip polygon is degenerate).
pub fn clip_polygon<'a>(subject: &[Vec2], clip: &[Vec2], scratch: &'a mut ClipScratch) -> &'a [Vec2] {
    scratch.front.clear();
    scratch.back.clear();

    let dir = winding(clip);
    if dir == 0 || subject.is_empty() {
        return &scratch.front;
    }

    scratch.front.extend_from_slice(subject);

    let clip_count = clip.len();
    for i in 0..clip_count {
        let a = clip[i];
        let b = clip[(i + 1) % clip_count];

        std::mem::swap(&mut scratch.front, &mut scratch.back);
        scratch.front.clear();

        let input = &scratch.back;
        let Some(&last) = input.last() else {
            break;
        };

        let mut start = last;
        let mut start_inside = is_inside(&a, &b, &start, dir);
        for &end in input.iter() {
            let end_inside = is_inside(&a, &b, &end, dir);
            match (start_inside, end_inside) {
                (true, true) => scratch.front.push(end),
                (false, true) => {
                    scratch.front.push(intersect(&a, &b, &start, &end));
                    scratch.front.push(end);
                }
                (true, false) => scratch.front.push(intersect(&a, &b, &start, &end)),
                (false, false) => {}
            }
            start = end;
            start_inside = end_inside;
        }

        if scratch.front.len() > MAX_CLIP_VERTICES {
            debug_assert!(
                false,
                "clipped polygon grew to {} vertices; input geometry is degenerate",
                scratch.front.len()
            );
            scratch.front.clear();
        }

        if scratch.front.is_empty() {
            break;
        }
    }

    &scratch.front
}
