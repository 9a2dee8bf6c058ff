//! Nearest-neighbour query contract and an R-tree backed implementation.
//!
//! The estimator only depends on [`SpatialIndex`]; hosts with their own
//! octree or k-d tree can implement it directly.

use nalgebra::Vector3;
use rstar::primitives::GeomWithData;
use rstar::RTree;

/// One neighbour returned by a k-nearest query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Index of the point in the collection the index was built from.
    pub index: usize,
    pub position: Vector3<f64>,
    pub squared_distance: f64,
}

pub trait SpatialIndex {
    /// Up to `k` nearest points to `point`, ordered by increasing distance.
    fn nearest_neighbors(&self, point: &Vector3<f64>, k: usize) -> Vec<Neighbor>;

    fn nearest(&self, point: &Vector3<f64>) -> Option<Neighbor> {
        self.nearest_neighbors(point, 1).into_iter().next()
    }
}

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// [`SpatialIndex`] over a static point set, bulk-loaded into an R-tree.
pub struct RTreeIndex {
    tree: RTree<IndexedPoint>,
}

impl RTreeIndex {
    pub fn new(points: &[Vector3<f64>]) -> Self {
        Self::from_points(points.iter().copied())
    }

    pub fn from_points<I: IntoIterator<Item = Vector3<f64>>>(points: I) -> Self {
        let entries: Vec<IndexedPoint> = points
            .into_iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new([p.x, p.y, p.z], i))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl SpatialIndex for RTreeIndex {
    fn nearest_neighbors(&self, point: &Vector3<f64>, k: usize) -> Vec<Neighbor> {
        let query = [point.x, point.y, point.z];
        self.tree
            .nearest_neighbor_iter_with_distance_2(&query)
            .take(k)
            .map(|(entry, d2)| {
                let p = entry.geom();
                Neighbor {
                    index: entry.data,
                    position: Vector3::new(p[0], p[1], p[2]),
                    squared_distance: d2,
                }
            })
            .collect()
    }
}
