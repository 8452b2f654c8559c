use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bounds = Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        };
        for point in points {
            bounds.min = bounds.min.min(point);
            bounds.max = bounds.max.max(point);
        }
        bounds
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn distance_squared_to(&self, point: Vec3) -> f32 {
        let outside = (self.min - point).max(point - self.max).max(Vec3::ZERO);
        outside.length_squared()
    }
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Aabb,
    left: u32,
    right: u32,
    start: u32,
    count: u32,
}

impl BvhNode {
    fn is_leaf(&self) -> bool {
        self.count != 0
    }
}

#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    prims: Vec<u32>,
}

impl Bvh {
    const LEAF_SIZE: usize = 4;

    pub fn build(bounds: &[Aabb]) -> Option<Self> {
        if bounds.is_empty() {
            return None;
        }
        let mut bvh = Self {
            nodes: Vec::with_capacity(bounds.len() * 2),
            prims: (0..bounds.len() as u32).collect(),
        };
        bvh.build_node(bounds, 0, bounds.len());
        Some(bvh)
    }

    fn build_node(&mut self, bounds: &[Aabb], start: usize, end: usize) -> u32 {
        let node_index = self.nodes.len() as u32;
        let node_bounds = self.prims[start..end]
            .iter()
            .map(|prim| bounds[*prim as usize])
            .reduce(Aabb::union)
            .unwrap_or(bounds[self.prims[start] as usize]);
        let count = end - start;
        self.nodes.push(BvhNode {
            bounds: node_bounds,
            left: 0,
            right: 0,
            start: start as u32,
            count: count as u32,
        });
        if count <= Self::LEAF_SIZE {
            return node_index;
        }

        let centers = Aabb::from_points(
            self.prims[start..end]
                .iter()
                .map(|prim| bounds[*prim as usize].center()),
        );
        let extent = centers.max - centers.min;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };
        let mid = start + count / 2;
        self.prims[start..end].select_nth_unstable_by(mid - start, |a, b| {
            let ca = bounds[*a as usize].center()[axis];
            let cb = bounds[*b as usize].center()[axis];
            ca.total_cmp(&cb)
        });

        let left = self.build_node(bounds, start, mid);
        let right = self.build_node(bounds, mid, end);
        let node = &mut self.nodes[node_index as usize];
        node.left = left;
        node.right = right;
        node.count = 0;
        node_index
    }

    pub fn nearest<F>(&self, point: Vec3, mut distance_to_prim: F) -> Option<(usize, f32)>
    where
        F: FnMut(usize) -> f32,
    {
        let mut best: Option<(usize, f32)> = None;
        let mut best_dist2 = f32::INFINITY;
        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry {
            dist2: self.nodes[0].bounds.distance_squared_to(point),
            node: 0,
        });

        while let Some(entry) = heap.pop() {
            if entry.dist2 > best_dist2 {
                break;
            }
            let node = self.nodes[entry.node as usize];
            if node.is_leaf() {
                let start = node.start as usize;
                for &prim in &self.prims[start..start + node.count as usize] {
                    let dist2 = distance_to_prim(prim as usize);
                    if dist2 < best_dist2 {
                        best_dist2 = dist2;
                        best = Some((prim as usize, dist2));
                    }
                }
                continue;
            }
            for child in [node.left, node.right] {
                let dist2 = self.nodes[child as usize].bounds.distance_squared_to(point);
                if dist2 <= best_dist2 {
                    heap.push(HeapEntry { dist2, node: child });
                }
            }
        }
        best
    }
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    dist2: f32,
    node: u32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    // Reversed so the max-heap pops the closest node first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist2
            .total_cmp(&self.dist2)
            .then_with(|| other.node.cmp(&self.node))
    }
}
