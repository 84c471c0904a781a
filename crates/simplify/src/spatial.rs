//! Spatial index over the triangles of a static mesh.
//!
//! Triangles are binned into an octree by centroid; every node also keeps
//! the union of its triangles' true bounds, so queries prune against what
//! the triangles actually cover rather than the cell that binned them.
//! The index is built once per object from the *initial* mesh and never
//! updated: contact queries always measure against the original surface.

use glam::Vec3;
use topology::TriMesh;

#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    fn of_triangle(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            min: a.min(b).min(c),
            max: a.max(b).max(c),
        }
    }

    fn union(&mut self, other: &Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Squared distance from `p` to the box, zero inside.
    fn distance_squared(&self, p: Vec3) -> f32 {
        let clamped = p.clamp(self.min, self.max);
        p.distance_squared(clamped)
    }

    fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    fn octant(&self, index: usize) -> Self {
        let c = self.center();
        let mut min = self.min;
        let mut max = c;
        if index & 1 != 0 {
            min.x = c.x;
            max.x = self.max.x;
        }
        if index & 2 != 0 {
            min.y = c.y;
            max.y = self.max.y;
        }
        if index & 4 != 0 {
            min.z = c.z;
            max.z = self.max.z;
        }
        Self { min, max }
    }

    fn octant_index(&self, p: Vec3) -> usize {
        let c = self.center();
        (usize::from(p.x >= c.x)) | (usize::from(p.y >= c.y) << 1) | (usize::from(p.z >= c.z) << 2)
    }
}

#[derive(Debug, Clone, Copy)]
struct Item {
    face: u32,
    a: Vec3,
    b: Vec3,
    c: Vec3,
}

#[derive(Debug)]
struct Node {
    /// Cell used for binning.
    cell: Aabb,
    /// Union of the bounds of every triangle below this node.
    item_bounds: Aabb,
    items: Vec<Item>,
    children: Option<Box<[Node; 8]>>,
    depth: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct OctreeConfig {
    pub max_depth: u32,
    pub max_items_per_node: usize,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_items_per_node: 16,
        }
    }
}

/// Octree over mesh triangles answering radius and nearest queries with
/// exact point-to-triangle distances.
#[derive(Debug)]
pub struct TriangleOctree {
    root: Node,
    config: OctreeConfig,
}

impl TriangleOctree {
    pub fn from_tri_mesh(tri: &TriMesh) -> Self {
        Self::with_config(tri, OctreeConfig::default())
    }

    pub fn with_config(tri: &TriMesh, config: OctreeConfig) -> Self {
        let mut bounds = Aabb::EMPTY;
        for p in &tri.positions {
            bounds.union(&Aabb { min: *p, max: *p });
        }
        if bounds.is_empty() {
            bounds = Aabb {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            };
        }
        let mut root = Node {
            cell: bounds,
            item_bounds: Aabb::EMPTY,
            items: Vec::new(),
            children: None,
            depth: 0,
        };
        for (i, t) in tri.triangles.iter().enumerate() {
            let [a, b, c] = t.map(|v| tri.positions[v as usize]);
            root.insert(
                Item {
                    face: i as u32,
                    a,
                    b,
                    c,
                },
                &config,
            );
        }
        Self { root, config }
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Every triangle within `radius` of `p`, with its exact distance.
    pub fn within_radius(&self, p: Vec3, radius: f32) -> Vec<(u32, f32)> {
        let mut out = Vec::new();
        self.root.collect_within(p, radius, &mut out);
        out
    }

    /// Nearest triangle to `p` and its distance, `None` on an empty mesh.
    pub fn nearest(&self, p: Vec3) -> Option<(u32, f32)> {
        let mut best: Option<(u32, f32)> = None;
        self.root.find_nearest(p, &mut best);
        best
    }
}

impl Node {
    fn insert(&mut self, item: Item, config: &OctreeConfig) {
        self.item_bounds
            .union(&Aabb::of_triangle(item.a, item.b, item.c));
        if let Some(children) = &mut self.children {
            let centroid = (item.a + item.b + item.c) / 3.0;
            children[self.cell.octant_index(centroid)].insert(item, config);
            return;
        }
        self.items.push(item);
        if self.items.len() > config.max_items_per_node && self.depth < config.max_depth {
            self.split(config);
        }
    }

    fn split(&mut self, config: &OctreeConfig) {
        let children: [Node; 8] = std::array::from_fn(|i| Node {
            cell: self.cell.octant(i),
            item_bounds: Aabb::EMPTY,
            items: Vec::new(),
            children: None,
            depth: self.depth + 1,
        });
        self.children = Some(Box::new(children));
        let items = std::mem::take(&mut self.items);
        if let Some(children) = &mut self.children {
            for item in items {
                let centroid = (item.a + item.b + item.c) / 3.0;
                children[self.cell.octant_index(centroid)].insert(item, config);
            }
        }
    }

    fn collect_within(&self, p: Vec3, radius: f32, out: &mut Vec<(u32, f32)>) {
        if self.item_bounds.is_empty() || self.item_bounds.distance_squared(p) > radius * radius {
            return;
        }
        for item in &self.items {
            let closest = closest_point_on_triangle(p, item.a, item.b, item.c);
            let d = p.distance(closest);
            if d <= radius {
                out.push((item.face, d));
            }
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.collect_within(p, radius, out);
            }
        }
    }

    fn find_nearest(&self, p: Vec3, best: &mut Option<(u32, f32)>) {
        if self.item_bounds.is_empty() {
            return;
        }
        if let Some((_, d)) = best {
            if self.item_bounds.distance_squared(p) > *d * *d {
                return;
            }
        }
        for item in &self.items {
            let d = p.distance(closest_point_on_triangle(p, item.a, item.b, item.c));
            if best.is_none_or(|(_, bd)| d < bd) {
                *best = Some((item.face, d));
            }
        }
        if let Some(children) = &self.children {
            // Visit nearer cells first so pruning bites sooner.
            let mut order: Vec<&Node> = children.iter().collect();
            order.sort_by(|x, y| {
                x.item_bounds
                    .distance_squared(p)
                    .total_cmp(&y.item_bounds.distance_squared(p))
            });
            for child in order {
                child.find_nearest(p, best);
            }
        }
    }
}

/// Closest point on a triangle to `p`, by Voronoi-region classification.
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3 as V;
    use topology::shapes;

    #[test]
    fn closest_point_regions() {
        let (a, b, c) = (V::ZERO, V::X, V::Y);
        // Interior projection.
        let q = closest_point_on_triangle(V::new(0.25, 0.25, 1.0), a, b, c);
        assert!(q.abs_diff_eq(V::new(0.25, 0.25, 0.0), 1e-6));
        // Vertex region.
        let q = closest_point_on_triangle(V::new(-1.0, -1.0, 0.0), a, b, c);
        assert!(q.abs_diff_eq(a, 1e-6));
        // Edge region.
        let q = closest_point_on_triangle(V::new(0.5, -2.0, 0.0), a, b, c);
        assert!(q.abs_diff_eq(V::new(0.5, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn nearest_on_a_cube() {
        let index = TriangleOctree::from_tri_mesh(&shapes::unit_cube());
        let (_, d) = index.nearest(V::new(0.5, 0.5, 2.0)).unwrap();
        assert!((d - 1.0).abs() < 1e-5);
        let (_, d) = index.nearest(V::new(0.5, 0.5, 1.0)).unwrap();
        assert!(d < 1e-6);
    }

    #[test]
    fn radius_query_matches_brute_force() {
        let sphere = shapes::uv_sphere(16, 12);
        let index = TriangleOctree::from_tri_mesh(&sphere);
        let p = V::new(1.3, 0.2, 0.1);
        let radius = 0.6;
        let mut expected: Vec<u32> = sphere
            .triangles
            .iter()
            .enumerate()
            .filter_map(|(i, t)| {
                let [a, b, c] = t.map(|v| sphere.positions[v as usize]);
                (p.distance(closest_point_on_triangle(p, a, b, c)) <= radius)
                    .then_some(i as u32)
            })
            .collect();
        let mut got: Vec<u32> = index.within_radius(p, radius).iter().map(|x| x.0).collect();
        expected.sort_unstable();
        got.sort_unstable();
        assert_eq!(got, expected);
        assert!(!got.is_empty());
    }

    #[test]
    fn deep_tree_still_answers() {
        let sphere = shapes::uv_sphere(25, 21);
        let index = TriangleOctree::with_config(
            &sphere,
            OctreeConfig {
                max_depth: 4,
                max_items_per_node: 4,
            },
        );
        let (_, d) = index.nearest(V::ZERO).unwrap();
        // Every triangle of the unit sphere is slightly inside radius 1.
        assert!(d < 1.0 && d > 0.8);
    }
}
