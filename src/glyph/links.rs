//! Neighbor graph of glyph parts.
//!
//! Vertices are candidate parts, edges link parts whose measured gap does not
//! exceed a maximum. Pairs beyond the gap get no edge at all, which keeps the
//! graph sparse and the cluster search tractable.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};
use crate::glyph::{by_abscissa, Glyph};

/// Index of a part (vertex) in a [`GlyphGraph`].
pub type PartId = NodeIndex;

/// Edge label: the two parts are close to each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearby {
    /// Measured gap between the parts
    pub distance: f64,
}

/// Undirected graph of glyph parts linked by proximity.
pub type GlyphGraph = UnGraph<Glyph, Nearby>;

/// Largest gap accepted by [`build_links`] and [`ChamferDistance`], in pixels.
pub const MAX_LINK_GAP: f64 = 1024.0;

/// Check that `max_gap` is a finite value within `0..=MAX_LINK_GAP`.
pub(crate) fn check_gap(max_gap: f64) -> std::result::Result<(), String> {
    if max_gap.is_finite() && (0.0..=MAX_LINK_GAP).contains(&max_gap) {
        Ok(())
    } else {
        Err(format!(
            "maximum gap must lie within 0..={}, got {}",
            MAX_LINK_GAP, max_gap
        ))
    }
}

/// Symmetric, non-negative distance between two glyphs.
pub trait GlyphDistance {
    /// Measure the gap between `one` and `two`.
    ///
    /// May return `f64::INFINITY` when the glyphs are too far apart to be
    /// measured precisely.
    fn distance(&self, one: &Glyph, two: &Glyph) -> Result<f64>;

    /// Measure the gap between `one` and each of `others`, in order.
    ///
    /// Metrics with per-glyph preparation override this to prepare `one` once.
    fn distances(&self, one: &Glyph, others: &[&Glyph]) -> Result<Vec<f64>> {
        others.iter().map(|other| self.distance(one, other)).collect()
    }
}

/// Euclidean gap between bounding boxes, in pixel steps.
///
/// Overlapping boxes are at distance 0, adjacent boxes at distance 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxDistance;

impl GlyphDistance for BoxDistance {
    fn distance(&self, one: &Glyph, two: &Glyph) -> Result<f64> {
        let (a, b) = (one.bounds(), two.bounds());
        let dx = (b.left() - a.right() + 1).max(a.left() - b.right() + 1).max(0) as f64;
        let dy = (b.top() - a.bottom() + 1).max(a.top() - b.bottom() + 1).max(0) as f64;
        Ok((dx * dx + dy * dy).sqrt())
    }
}

/// Nearest-pixel gap, approximated with a 3-4 chamfer distance transform.
///
/// The transform covers the first glyph's box grown by `max_gap`; foreground
/// pixels of the second glyph outside that area are not measured, and a pair
/// with no pixel inside it is reported at infinite distance.
#[derive(Debug, Clone, Copy)]
pub struct ChamferDistance {
    max_gap: f64,
}

impl ChamferDistance {
    /// Create a metric measuring gaps up to `max_gap`.
    pub fn new(max_gap: f64) -> Self {
        Self { max_gap }
    }

    /// Largest measured gap.
    pub fn max_gap(&self) -> f64 {
        self.max_gap
    }

    /// Distance transform around `glyph`, reusable for any number of others.
    ///
    /// # Errors
    ///
    /// Fails when the maximum gap is negative, not finite or above
    /// [`MAX_LINK_GAP`].
    pub fn table_for(&self, glyph: &Glyph) -> Result<ChamferTable> {
        check_gap(self.max_gap).map_err(Error::Distance)?;

        let reach = self.max_gap.ceil() as i32 + 1;
        let area = glyph.bounds().grown(reach, reach);
        let (w, h) = (area.width.max(0) as usize, area.height.max(0) as usize);
        let mut values = vec![CHAMFER_FAR; w * h];

        for (line, run) in glyph.run_table().iter_runs() {
            for coord in run.start()..=run.stop() {
                let p = glyph.orientation().absolute(line as i32, coord);
                let x = (p.x + glyph.left() - area.x) as usize;
                let y = (p.y + glyph.top() - area.y) as usize;
                values[y * w + x] = 0;
            }
        }

        chamfer_transform(&mut values, w, h);
        Ok(ChamferTable { area, values })
    }
}

const CHAMFER_ORTHO: i32 = 3;
const CHAMFER_DIAG: i32 = 4;
const CHAMFER_FAR: i32 = i32::MAX / 2;

/// Chamfer distances to one glyph, over its box grown by the measured reach.
#[derive(Debug, Clone)]
pub struct ChamferTable {
    area: Rect,
    values: Vec<i32>,
}

impl ChamferTable {
    /// Area covered by the table, in image space.
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Gap from the table glyph to the nearest pixel of `other`.
    ///
    /// Returns `f64::INFINITY` when no pixel of `other` lies within reach.
    pub fn distance_to(&self, other: &Glyph) -> f64 {
        if !self.area.intersects(&other.bounds()) {
            return f64::INFINITY;
        }

        let w = self.area.width as usize;
        let mut best = CHAMFER_FAR;
        for (line, run) in other.run_table().iter_runs() {
            for coord in run.start()..=run.stop() {
                let p = other.orientation().absolute(line as i32, coord);
                let absolute = Point::new(p.x + other.left(), p.y + other.top());
                if self.area.contains(&absolute) {
                    let x = (absolute.x - self.area.x) as usize;
                    let y = (absolute.y - self.area.y) as usize;
                    best = best.min(self.values[y * w + x]);
                }
            }
        }

        if best >= CHAMFER_FAR {
            f64::INFINITY
        } else {
            best as f64 / CHAMFER_ORTHO as f64
        }
    }
}

impl GlyphDistance for ChamferDistance {
    fn distance(&self, one: &Glyph, two: &Glyph) -> Result<f64> {
        check_gap(self.max_gap).map_err(Error::Distance)?;

        let reach = self.max_gap.ceil() as i32 + 1;
        if !one.bounds().grown(reach, reach).intersects(&two.bounds()) {
            return Ok(f64::INFINITY);
        }
        Ok(self.table_for(one)?.distance_to(two))
    }

    fn distances(&self, one: &Glyph, others: &[&Glyph]) -> Result<Vec<f64>> {
        if others.is_empty() {
            return Ok(Vec::new());
        }
        let table = self.table_for(one)?;
        Ok(others.iter().map(|other| table.distance_to(other)).collect())
    }
}

/// Two-pass 3-4 chamfer transform, in place.
fn chamfer_transform(table: &mut [i32], w: usize, h: usize) {
    let at = |x: usize, y: usize| y * w + x;

    for y in 0..h {
        for x in 0..w {
            let mut v = table[at(x, y)];
            if x > 0 {
                v = v.min(table[at(x - 1, y)] + CHAMFER_ORTHO);
            }
            if y > 0 {
                v = v.min(table[at(x, y - 1)] + CHAMFER_ORTHO);
                if x > 0 {
                    v = v.min(table[at(x - 1, y - 1)] + CHAMFER_DIAG);
                }
                if x + 1 < w {
                    v = v.min(table[at(x + 1, y - 1)] + CHAMFER_DIAG);
                }
            }
            table[at(x, y)] = v;
        }
    }

    for y in (0..h).rev() {
        for x in (0..w).rev() {
            let mut v = table[at(x, y)];
            if x + 1 < w {
                v = v.min(table[at(x + 1, y)] + CHAMFER_ORTHO);
            }
            if y + 1 < h {
                v = v.min(table[at(x, y + 1)] + CHAMFER_ORTHO);
                if x + 1 < w {
                    v = v.min(table[at(x + 1, y + 1)] + CHAMFER_DIAG);
                }
                if x > 0 {
                    v = v.min(table[at(x - 1, y + 1)] + CHAMFER_DIAG);
                }
            }
            table[at(x, y)] = v;
        }
    }
}

/// Build the graph of acceptable links within `glyphs`.
///
/// Vertex `i` holds `glyphs[i]`. An edge labeled with the measured distance is
/// added for every pair whose distance is at most `max_gap`. Pairs whose boxes,
/// once grown by the gap, do not intersect are never measured. Each glyph is
/// measured against all its remaining candidates in a single
/// [`GlyphDistance::distances`] call.
///
/// # Errors
///
/// Fails on a gap that is negative, not finite or above [`MAX_LINK_GAP`], and
/// propagates metric failures.
pub fn build_links<D>(glyphs: Vec<Glyph>, max_gap: f64, metric: &D) -> Result<GlyphGraph>
where
    D: GlyphDistance + ?Sized,
{
    check_gap(max_gap).map_err(Error::InvalidInput)?;

    let gap = max_gap.ceil() as i32;
    let mut graph = GlyphGraph::with_capacity(glyphs.len(), glyphs.len());
    for glyph in glyphs {
        graph.add_node(glyph);
    }

    let mut sorted: Vec<PartId> = graph.node_indices().collect();
    sorted.sort_by(|&a, &b| by_abscissa(&graph[a], &graph[b]));

    let mut links = Vec::new();
    for (i, &one) in sorted.iter().enumerate() {
        let glyph = &graph[one];
        let fat = glyph.bounds().grown(gap, gap);

        let mut candidates = Vec::new();
        for &two in &sorted[i + 1..] {
            let other = &graph[two];
            let other_box = other.bounds();

            // Glyphs are sorted by abscissa
            if other_box.left() >= fat.right() {
                break;
            }
            if fat.intersects(&other_box) && glyph != other {
                candidates.push(two);
            }
        }
        if candidates.is_empty() {
            continue;
        }

        let others: Vec<&Glyph> = candidates.iter().map(|&two| &graph[two]).collect();
        let distances = metric.distances(glyph, &others)?;
        for (&two, distance) in candidates.iter().zip(distances) {
            if distance <= max_gap {
                links.push((one, two, Nearby { distance }));
            }
        }
    }

    for (one, two, link) in links {
        graph.add_edge(one, two, link);
    }

    log::debug!(
        "build_links: {} parts, {} links (max gap {})",
        graph.node_count(),
        graph.edge_count(),
        max_gap
    );

    Ok(graph)
}

/// Partition graph vertices into connected sets.
///
/// Sets are listed by their smallest vertex index, members in index order.
pub fn connected_sets(graph: &GlyphGraph) -> Vec<Vec<PartId>> {
    let mut uf = UnionFind::<usize>::new(graph.node_count());
    for edge in graph.edge_references() {
        uf.union(edge.source().index(), edge.target().index());
    }

    let mut slots: HashMap<usize, usize> = HashMap::new();
    let mut sets: Vec<Vec<PartId>> = Vec::new();
    for node in graph.node_indices() {
        let root = uf.find(node.index());
        let slot = *slots.entry(root).or_insert_with(|| {
            sets.push(Vec::new());
            sets.len() - 1
        });
        sets[slot].push(node);
    }

    sets
}

/// Extract the sub-graph induced by `set`.
///
/// Vertex `i` of the result holds the part `set[i]` of `graph`.
pub fn sub_graph(graph: &GlyphGraph, set: &[PartId]) -> GlyphGraph {
    let mut sub = GlyphGraph::with_capacity(set.len(), set.len());
    let mut mapping: HashMap<PartId, PartId> = HashMap::with_capacity(set.len());

    for &part in set {
        if let Some(glyph) = graph.node_weight(part) {
            mapping.entry(part).or_insert_with(|| sub.add_node(glyph.clone()));
        }
    }

    for edge in graph.edge_references() {
        if let (Some(&a), Some(&b)) = (mapping.get(&edge.source()), mapping.get(&edge.target())) {
            sub.add_edge(a, b, *edge.weight());
        }
    }

    sub
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{Orientation, Run, RunTable};

    fn block(x: i32, y: i32, w: i32, h: i32) -> Glyph {
        let table = RunTable::from_sequences(
            Orientation::Horizontal,
            w,
            h,
            vec![vec![Run::new(0, w)]; h as usize],
        )
        .unwrap();
        Glyph::new(x, y, table)
    }

    #[test]
    fn test_box_distance() {
        let a = block(0, 0, 3, 3);
        assert_eq!(BoxDistance.distance(&a, &block(3, 0, 2, 2)).unwrap(), 1.0);
        assert_eq!(BoxDistance.distance(&a, &block(5, 0, 2, 2)).unwrap(), 3.0);
        assert_eq!(BoxDistance.distance(&a, &block(1, 1, 2, 2)).unwrap(), 0.0);
        assert_eq!(BoxDistance.distance(&a, &block(5, 6, 1, 1)).unwrap(), 5.0);
    }

    #[test]
    fn test_chamfer_distance_is_symmetric() {
        let a = block(0, 0, 3, 3);
        let b = block(5, 0, 2, 3);
        let metric = ChamferDistance::new(4.0);
        let ab = metric.distance(&a, &b).unwrap();
        let ba = metric.distance(&b, &a).unwrap();
        assert_eq!(ab, 3.0);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_chamfer_distance_diagonal() {
        let a = block(0, 0, 1, 1);
        let b = block(1, 1, 1, 1);
        let d = ChamferDistance::new(2.0).distance(&a, &b).unwrap();
        assert!((d - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_chamfer_distance_out_of_reach() {
        let a = block(0, 0, 2, 2);
        let b = block(50, 50, 2, 2);
        assert!(ChamferDistance::new(3.0)
            .distance(&a, &b)
            .unwrap()
            .is_infinite());
    }

    #[test]
    fn test_build_links_respects_gap() {
        let glyphs = vec![block(0, 0, 2, 2), block(4, 0, 2, 2), block(20, 0, 2, 2)];
        let graph = build_links(glyphs, 3.0, &ChamferDistance::new(3.0)).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);

        let edge = graph.find_edge(NodeIndex::new(0), NodeIndex::new(1)).unwrap();
        assert_eq!(graph[edge].distance, 2.0);
    }

    #[test]
    fn test_build_links_rejects_negative_gap() {
        assert!(matches!(
            build_links(vec![block(0, 0, 1, 1)], -1.0, &BoxDistance),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_build_links_rejects_unbounded_gaps() {
        for gap in [1e10, f64::INFINITY, f64::NAN, MAX_LINK_GAP + 1.0] {
            let glyphs = vec![block(0, 0, 2, 1), block(5, 0, 2, 1)];
            assert!(matches!(
                build_links(glyphs, gap, &BoxDistance),
                Err(Error::InvalidInput(_))
            ));
        }

        let far = ChamferDistance::new(1e10).distance(&block(0, 0, 1, 1), &block(3, 0, 1, 1));
        assert!(matches!(far, Err(Error::Distance(_))));
    }

    #[test]
    fn test_build_links_at_largest_gap() {
        let glyphs = vec![block(0, 0, 2, 1), block(5, 0, 2, 1)];
        let graph = build_links(glyphs, MAX_LINK_GAP, &BoxDistance).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_chamfer_table_matches_pairwise_distance() {
        let metric = ChamferDistance::new(4.0);
        let one = block(0, 0, 3, 3);
        let others = [block(5, 0, 2, 3), block(1, 4, 1, 1), block(40, 0, 1, 1)];

        let table = metric.table_for(&one).unwrap();
        assert_eq!(table.area(), Rect::new(-5, -5, 13, 13));
        for other in &others {
            let pairwise = metric.distance(&one, other).unwrap();
            assert_eq!(table.distance_to(other), pairwise);
        }

        let refs: Vec<&Glyph> = others.iter().collect();
        let batch = metric.distances(&one, &refs).unwrap();
        assert_eq!(batch[0], 3.0);
        assert_eq!(batch[1], 2.0);
        assert!(batch[2].is_infinite());
    }

    struct Counting {
        batches: std::cell::Cell<usize>,
    }

    impl GlyphDistance for Counting {
        fn distance(&self, one: &Glyph, two: &Glyph) -> Result<f64> {
            BoxDistance.distance(one, two)
        }

        fn distances(&self, one: &Glyph, others: &[&Glyph]) -> Result<Vec<f64>> {
            self.batches.set(self.batches.get() + 1);
            others.iter().map(|other| self.distance(one, other)).collect()
        }
    }

    #[test]
    fn test_build_links_measures_each_glyph_once() {
        // A wide bar with three close neighbors, then a far loner
        let glyphs = vec![
            block(0, 0, 10, 1),
            block(1, 2, 1, 1),
            block(4, 2, 1, 1),
            block(8, 2, 1, 1),
            block(50, 0, 1, 1),
        ];
        let metric = Counting {
            batches: std::cell::Cell::new(0),
        };
        let graph = build_links(glyphs, 2.0, &metric).unwrap();

        assert_eq!(graph.edge_count(), 3);
        // Only the bar has candidates: the dots are too far from each other
        assert_eq!(metric.batches.get(), 1);
    }

    #[test]
    fn test_connected_sets_and_sub_graph() {
        let glyphs = vec![
            block(0, 0, 2, 2),
            block(30, 0, 2, 2),
            block(3, 0, 2, 2),
            block(33, 0, 2, 2),
            block(60, 0, 2, 2),
        ];
        let graph = build_links(glyphs, 2.0, &BoxDistance).unwrap();
        let sets = connected_sets(&graph);
        assert_eq!(
            sets,
            vec![
                vec![NodeIndex::new(0), NodeIndex::new(2)],
                vec![NodeIndex::new(1), NodeIndex::new(3)],
                vec![NodeIndex::new(4)],
            ]
        );

        let sub = sub_graph(&graph, &sets[1]);
        assert_eq!(sub.node_count(), 2);
        assert_eq!(sub.edge_count(), 1);
        assert_eq!(sub[NodeIndex::new(0)].left(), 30);
    }
}
