use geo::{BoundingRect, MultiPolygon};
use rstar::{RTree, AABB};

use crate::bbox::BoundingBox;

/// An R-tree-backed collection of polygons, queryable by bounding-box
/// overlap. Carries no zoning semantics — a shape is addressed only by its
/// position in the collection.
#[derive(Debug, Clone)]
pub struct Index {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
}

impl Index {
    pub fn new(shapes: Vec<MultiPolygon<f64>>) -> Self {
        let boxes = shapes
            .iter()
            .enumerate()
            .filter_map(|(i, shape)| shape.bounding_rect().map(|r| BoundingBox::new(i, r)))
            .collect();
        Self {
            rtree: RTree::bulk_load(boxes),
            shapes,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    #[inline]
    pub fn shapes(&self) -> &[MultiPolygon<f64>] {
        &self.shapes
    }

    #[inline]
    pub fn shape(&self, idx: usize) -> &MultiPolygon<f64> {
        &self.shapes[idx]
    }

    /// Indices of shapes whose bounding box intersects `envelope`.
    pub(crate) fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = usize> + '_ {
        self.rtree
            .locate_in_envelope_intersecting(envelope)
            .map(BoundingBox::idx)
    }
}
