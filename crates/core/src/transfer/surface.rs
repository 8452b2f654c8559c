use glam::Vec3;

use super::bvh::{Aabb, Bvh};
use crate::mesh::Mesh;

const DEGENERATE_AREA: f32 = 1.0e-12;
const ON_VERTEX: f32 = 1.0e-6;

#[derive(Debug, Clone, Copy)]
struct FanTriangle {
    face: u32,
    corners: [u32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSample {
    pub face: usize,
    pub point: Vec3,
    pub distance_squared: f32,
    pub weights: Vec<(usize, f32)>,
}

pub struct SurfaceIndex<'a> {
    mesh: &'a Mesh,
    positions: Vec<Vec3>,
    triangles: Vec<FanTriangle>,
    bvh: Bvh,
}

impl<'a> SurfaceIndex<'a> {
    pub fn build(mesh: &'a Mesh) -> Option<Self> {
        let positions = mesh.world_positions();
        let mut triangles = Vec::new();
        for face in 0..mesh.face_count() {
            let corners = mesh.face_corners(face);
            if corners.len() < 3 {
                continue;
            }
            let first = corners.start as u32;
            for corner in corners.start + 1..corners.end - 1 {
                triangles.push(FanTriangle {
                    face: face as u32,
                    corners: [first, corner as u32, corner as u32 + 1],
                });
            }
        }
        let bounds: Vec<Aabb> = triangles
            .iter()
            .map(|tri| {
                Aabb::from_points(tri.corners.map(|corner| {
                    positions[mesh.corner_verts[corner as usize] as usize]
                }))
            })
            .collect();
        let bvh = Bvh::build(&bounds)?;
        Some(Self {
            mesh,
            positions,
            triangles,
            bvh,
        })
    }

    fn corner_position(&self, corner: usize) -> Vec3 {
        self.positions[self.mesh.corner_verts[corner] as usize]
    }

    fn triangle_points(&self, tri: &FanTriangle) -> [Vec3; 3] {
        tri.corners.map(|corner| self.corner_position(corner as usize))
    }

    pub fn sample(&self, point: Vec3) -> Option<SurfaceSample> {
        let (prim, distance_squared) = self.bvh.nearest(point, |prim| {
            let [a, b, c] = self.triangle_points(&self.triangles[prim]);
            let (closest, _) = closest_point_on_triangle(point, a, b, c);
            closest.distance_squared(point)
        })?;
        let tri = self.triangles[prim];
        let [a, b, c] = self.triangle_points(&tri);
        let (closest, bary) = closest_point_on_triangle(point, a, b, c);
        let face = tri.face as usize;
        let corners = self.mesh.face_corners(face);

        let weights: Option<Vec<(usize, f32)>> = if corners.len() == 3 {
            None
        } else {
            let polygon: Vec<Vec3> = corners.clone().map(|c| self.corner_position(c)).collect();
            polygon_weights(&polygon, closest).map(|weights| corners.clone().zip(weights).collect())
        };
        let weights = weights.unwrap_or_else(|| {
            tri.corners
                .iter()
                .zip(bary)
                .map(|(corner, weight)| (*corner as usize, weight))
                .collect()
        });

        Some(SurfaceSample {
            face,
            point: closest,
            distance_squared,
            weights,
        })
    }
}

pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> (Vec3, [f32; 3]) {
    let ab = b - a;
    let ac = c - a;
    if ab.cross(ac).length_squared() <= DEGENERATE_AREA {
        let candidates = [(a, [1.0, 0.0, 0.0]), (b, [0.0, 1.0, 0.0]), (c, [0.0, 0.0, 1.0])];
        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.0.distance_squared(p) < best.0.distance_squared(p) {
                best = *candidate;
            }
        }
        return best;
    }

    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, [1.0, 0.0, 0.0]);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, [0.0, 1.0, 0.0]);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, [1.0 - v, v, 0.0]);
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, [0.0, 0.0, 1.0]);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, [1.0 - w, 0.0, w]);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, [0.0, 1.0 - w, w]);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    (a + ab * v + ac * w, [1.0 - v - w, v, w])
}

// Mean value coordinates of `p` with respect to a polygon. Angles are signed
// against the polygon's Newell normal so concave polygons still sum to 1.
pub fn polygon_weights(polygon: &[Vec3], p: Vec3) -> Option<Vec<f32>> {
    let count = polygon.len();
    if count < 3 {
        return None;
    }
    let mut normal = Vec3::ZERO;
    for i in 0..count {
        normal += polygon[i].cross(polygon[(i + 1) % count]);
    }
    let normal = normal.try_normalize()?;

    let offsets: Vec<Vec3> = polygon.iter().map(|v| *v - p).collect();
    let lengths: Vec<f32> = offsets.iter().map(|d| d.length()).collect();

    if let Some(hit) = lengths.iter().position(|len| *len <= ON_VERTEX) {
        let mut weights = vec![0.0; count];
        weights[hit] = 1.0;
        return Some(weights);
    }

    // tan(angle / 2) between consecutive spokes.
    let mut half_tangents = Vec::with_capacity(count);
    for i in 0..count {
        let next = (i + 1) % count;
        let cross = offsets[i].cross(offsets[next]);
        let dot = offsets[i].dot(offsets[next]);
        let sine = cross.dot(normal);
        let denom = lengths[i] * lengths[next] + dot;
        if denom <= ON_VERTEX * lengths[i] * lengths[next] {
            // On the edge between i and next.
            let t = lengths[i] / (lengths[i] + lengths[next]);
            let mut weights = vec![0.0; count];
            weights[i] = 1.0 - t;
            weights[next] = t;
            return Some(weights);
        }
        half_tangents.push(sine / denom);
    }

    let mut weights: Vec<f32> = (0..count)
        .map(|i| {
            let prev = (i + count - 1) % count;
            (half_tangents[prev] + half_tangents[i]) / lengths[i]
        })
        .collect();
    let total: f32 = weights.iter().sum();
    if !total.is_finite() || total.abs() <= f32::EPSILON {
        return None;
    }
    for weight in &mut weights {
        *weight /= total;
    }
    Some(weights)
}
