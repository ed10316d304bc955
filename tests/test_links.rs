//! Neighbor graph tests
//!
//! Links are built between labeled glyphs of synthetic images, with both stock
//! metrics, and checked against brute-force pairwise measurements.

use image::{GrayImage, Luma};
use omr_glyphs::glyph::{
    build_links, connected_sets, sub_graph, BoxDistance, ChamferDistance, Glyph, GlyphDistance,
    GlyphFactory, GlyphGraph, PartId,
};
use omr_glyphs::run::{Orientation, Run, RunTable, RunTableFactory};
use omr_glyphs::Error;
use proptest::prelude::*;

fn glyphs_of(rows: &[&str]) -> Vec<Glyph> {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |r| r.len()) as u32;
    let image = GrayImage::from_fn(width, height, |x, y| {
        match rows[y as usize].as_bytes()[x as usize] {
            b'X' => Luma([0]),
            _ => Luma([255]),
        }
    });
    let table = RunTableFactory::default().create_table(&image);
    GlyphFactory::new(&table).build_glyphs().unwrap()
}

fn edge_set(graph: &GlyphGraph) -> Vec<(usize, usize)> {
    let mut edges: Vec<(usize, usize)> = graph
        .edge_indices()
        .filter_map(|e| graph.edge_endpoints(e))
        .map(|(a, b)| (a.index().min(b.index()), a.index().max(b.index())))
        .collect();
    edges.sort_unstable();
    edges
}

struct FailingMetric;

impl GlyphDistance for FailingMetric {
    fn distance(&self, _one: &Glyph, _two: &Glyph) -> omr_glyphs::Result<f64> {
        Err(Error::Distance("metric unavailable".to_string()))
    }
}

#[test]
fn test_chamfer_measures_nearest_pixels() {
    // Boxes overlap but the ink is 2 pixels apart
    let glyphs = glyphs_of(&[
        "XXXXX---", //
        "X-------",
        "X--XXX--",
        "X-------",
    ]);
    assert_eq!(glyphs.len(), 2);

    let chamfer = ChamferDistance::new(5.0).distance(&glyphs[0], &glyphs[1]).unwrap();
    assert_eq!(chamfer, 2.0);
    assert_eq!(BoxDistance.distance(&glyphs[0], &glyphs[1]).unwrap(), 0.0);
}

#[test]
fn test_chamfer_exact_horizontal_gap() {
    let glyphs = glyphs_of(&["XX---XX"]);
    let d = ChamferDistance::new(4.0).distance(&glyphs[0], &glyphs[1]).unwrap();
    assert_eq!(d, 4.0);
    let d = ChamferDistance::new(4.0).distance(&glyphs[1], &glyphs[0]).unwrap();
    assert_eq!(d, 4.0);
}

#[test]
fn test_links_keep_input_order() {
    let glyphs = glyphs_of(&["X--X-------X--X"]);
    let mut reversed = glyphs.clone();
    reversed.reverse();

    let graph = build_links(reversed.clone(), 3.0, &ChamferDistance::new(3.0)).unwrap();
    for (i, glyph) in reversed.iter().enumerate() {
        assert_eq!(&graph[PartId::new(i)], glyph);
    }
    assert_eq!(edge_set(&graph), vec![(0, 1), (2, 3)]);
}

#[test]
fn test_metric_failure_propagates() {
    let glyphs = glyphs_of(&["X-X"]);
    let result = build_links(glyphs, 2.0, &FailingMetric);
    assert!(matches!(result, Err(Error::Distance(_))));
}

#[test]
fn test_far_pairs_are_never_measured() {
    // A failing metric is harmless when no pair is within reach
    let glyphs = glyphs_of(&["X--------X"]);
    let graph = build_links(glyphs, 2.0, &FailingMetric).unwrap();
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_connected_sets_then_sub_graphs() {
    let glyphs = glyphs_of(&[
        "X-X---------X-X", //
        "---------------",
        "X-------------X",
    ]);
    let graph = build_links(glyphs, 2.0, &BoxDistance).unwrap();
    let sets = connected_sets(&graph);

    let sizes: Vec<usize> = sets.iter().map(Vec::len).collect();
    assert_eq!(sizes.iter().sum::<usize>(), graph.node_count());
    assert_eq!(sets.len(), 2);

    for set in &sets {
        let sub = sub_graph(&graph, set);
        assert_eq!(sub.node_count(), set.len());
        assert_eq!(connected_sets(&sub).len(), 1);
    }
}

proptest! {
    #[test]
    fn prop_links_match_brute_force(
        cells in prop::collection::vec((0i32..30, 0i32..30, 1i32..4, 1i32..4), 1..12),
        gap in 0.0f64..5.0,
    ) {
        let glyphs: Vec<Glyph> = cells
            .iter()
            .map(|&(x, y, w, h)| {
                let table = RunTable::from_sequences(
                    Orientation::Horizontal,
                    w,
                    h,
                    vec![vec![Run::new(0, w)]; h as usize],
                )
                .unwrap();
                Glyph::new(x, y, table)
            })
            .collect();

        let graph = build_links(glyphs.clone(), gap, &BoxDistance).unwrap();

        let mut expected = Vec::new();
        for i in 0..glyphs.len() {
            for j in i + 1..glyphs.len() {
                if glyphs[i] == glyphs[j] {
                    continue;
                }
                let d = BoxDistance.distance(&glyphs[i], &glyphs[j]).unwrap();
                prop_assert_eq!(d, BoxDistance.distance(&glyphs[j], &glyphs[i]).unwrap());
                if d <= gap {
                    expected.push((i, j));
                }
            }
        }

        prop_assert_eq!(edge_set(&graph), expected);
    }
}
