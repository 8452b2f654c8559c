use glam::Vec3;

#[derive(Debug, Clone, Copy)]
struct KdNode {
    point: Vec3,
    index: u32,
    axis: u8,
    left: u32,
    right: u32,
}

const NONE: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    root: u32,
}

impl KdTree {
    pub fn build(points: &[Vec3]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut order: Vec<u32> = (0..points.len() as u32).collect();
        let mut tree = Self {
            nodes: Vec::with_capacity(points.len()),
            root: NONE,
        };
        tree.root = tree.build_node(points, &mut order, 0);
        Some(tree)
    }

    fn build_node(&mut self, points: &[Vec3], order: &mut [u32], depth: usize) -> u32 {
        if order.is_empty() {
            return NONE;
        }
        let axis = (depth % 3) as u8;
        let mid = order.len() / 2;
        order.select_nth_unstable_by(mid, |a, b| {
            let pa = points[*a as usize][axis as usize];
            let pb = points[*b as usize][axis as usize];
            pa.total_cmp(&pb)
        });
        let index = order[mid];
        let node_index = self.nodes.len() as u32;
        self.nodes.push(KdNode {
            point: points[index as usize],
            index,
            axis,
            left: NONE,
            right: NONE,
        });
        let (left, rest) = order.split_at_mut(mid);
        let left = self.build_node(points, left, depth + 1);
        let right = self.build_node(points, &mut rest[1..], depth + 1);
        let node = &mut self.nodes[node_index as usize];
        node.left = left;
        node.right = right;
        node_index
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nearest(&self, query: Vec3) -> Option<(usize, f32)> {
        let mut best = (NONE, f32::INFINITY);
        self.search(self.root, query, &mut best);
        (best.0 != NONE).then(|| (best.0 as usize, best.1))
    }

    fn search(&self, node_index: u32, query: Vec3, best: &mut (u32, f32)) {
        if node_index == NONE {
            return;
        }
        let node = self.nodes[node_index as usize];
        let dist2 = node.point.distance_squared(query);
        if dist2 < best.1 || (dist2 == best.1 && node.index < best.0) {
            *best = (node.index, dist2);
        }
        let offset = query[node.axis as usize] - node.point[node.axis as usize];
        let (near, far) = if offset < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        self.search(near, query, best);
        if offset * offset <= best.1 {
            self.search(far, query, best);
        }
    }
}
