use geo::{MultiPolygon, Polygon, LineString};
use zonexlate_geom::{overlay_pairs, Index};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![Polygon::new(
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
        vec![],
    )])
}

#[test]
fn disjoint_shapes_produce_no_tiles() {
    let left = Index::new(vec![rect(0.0, 0.0, 1.0, 1.0)]);
    let right = Index::new(vec![rect(5.0, 5.0, 6.0, 6.0)]);
    assert!(overlay_pairs(&left, &right).is_empty());
}

#[test]
fn overlapping_squares_yield_their_intersection_area() {
    let left = Index::new(vec![rect(0.0, 0.0, 2.0, 2.0)]);
    let right = Index::new(vec![rect(1.0, 1.0, 3.0, 3.0)]);
    let tiles = overlay_pairs(&left, &right);
    assert_eq!(tiles.len(), 1);
    assert_eq!(tiles[0].left, 0);
    assert_eq!(tiles[0].right, 0);
    assert!((tiles[0].area - 1.0).abs() < 1e-9);
}

#[test]
fn four_quadrant_partition_covers_whole_square() {
    // Left: one big square. Right: four quadrants. Every quadrant should
    // produce exactly one tile, and total tile area should equal the
    // left square's area.
    let left = Index::new(vec![rect(0.0, 0.0, 4.0, 4.0)]);
    let right = Index::new(vec![
        rect(0.0, 0.0, 2.0, 2.0),
        rect(2.0, 0.0, 4.0, 2.0),
        rect(0.0, 2.0, 2.0, 4.0),
        rect(2.0, 2.0, 4.0, 4.0),
    ]);
    let tiles = overlay_pairs(&left, &right);
    assert_eq!(tiles.len(), 4);
    let total: f64 = tiles.iter().map(|t| t.area).sum();
    assert!((total - 16.0).abs() < 1e-9);
}

#[test]
fn reducing_left_to_right_over_three_layers_matches_triple_intersection() {
    // A (0..4)x(0..4), B (2..6)x(0..4), L (0..6)x(2..6)
    // A ∩ B = (2..4)x(0..4) area 8; that ∩ L = (2..4)x(2..4) area 4.
    let a = Index::new(vec![rect(0.0, 0.0, 4.0, 4.0)]);
    let b = Index::new(vec![rect(2.0, 0.0, 6.0, 4.0)]);
    let l = Index::new(vec![rect(0.0, 2.0, 6.0, 6.0)]);

    let ab = overlay_pairs(&a, &b);
    assert_eq!(ab.len(), 1);
    assert!((ab[0].area - 8.0).abs() < 1e-9);

    let ab_index = Index::new(ab.iter().map(|t| t.geom.clone()).collect());
    let abl = overlay_pairs(&ab_index, &l);
    assert_eq!(abl.len(), 1);
    assert!((abl[0].area - 4.0).abs() < 1e-9);
}
