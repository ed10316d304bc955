//! Combinatorial discovery of compound glyphs.
//!
//! [`GlyphCluster`] walks the connected subsets of a [`GlyphGraph`], fuses each
//! acceptable subset into a compound and hands it to a [`ClusterAdapter`] for
//! evaluation.
//!
//! # Algorithm
//!
//! Parts are taken in turn as seeds, heaviest first by default. From a seed,
//! a subset grows one neighbor ("outlier") at a time. At each growth level all
//! outliers are recorded as seen, so sibling branches never offer each other's
//! outliers again, and a later seed never re-enters earlier seeds. Each subset
//! is therefore reached at most once per decomposition.
//!
//! Failing the weight test only suppresses the evaluation of the current
//! subset; growth from it continues. Failing the size test prunes the branch.
//!
//! Subsets are bitsets over the vertex indices, and growth uses an explicit
//! stack of frames rather than recursion.

use std::fmt;

use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::glyph::{build_glyph, Glyph, GlyphGraph, GlyphGroup, PartId};

/// Domain policy driving a [`GlyphCluster`].
pub trait ClusterAdapter {
    /// Neighbor graph searched.
    fn graph(&self) -> &GlyphGraph;

    /// Parts to use as seeds. Defaults to every vertex of the graph.
    fn parts(&self) -> Vec<PartId> {
        self.graph().node_indices().collect()
    }

    /// Neighbors of `part`. Defaults to graph adjacency.
    fn neighbors(&self, part: PartId) -> Vec<PartId> {
        self.graph().neighbors(part).collect()
    }

    /// Report whether a subset of total `weight` deserves evaluation.
    fn is_weight_acceptable(&self, _weight: u32) -> bool {
        true
    }

    /// Report whether a subset spanning `bounds` may still grow.
    fn is_size_acceptable(&self, _bounds: &Rect) -> bool {
        true
    }

    /// Evaluate the compound built from `parts` (sorted by index).
    ///
    /// Failures are propagated to the caller of [`GlyphCluster::decompose`].
    fn evaluate_glyph(&mut self, glyph: Glyph, parts: &[PartId]) -> Result<()>;
}

/// Order in which parts are used as seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeedOrder {
    /// Heaviest parts first
    #[default]
    DecreasingWeight,
    /// Lightest parts first
    IncreasingWeight,
    /// Order returned by [`ClusterAdapter::parts`]
    Given,
}

/// Counters of one decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClusterStats {
    /// Seeds processed
    pub seeds: usize,
    /// Subsets visited
    pub subsets: usize,
    /// Compounds handed to the adapter
    pub evaluations: usize,
    /// Subsets skipped on weight
    pub light_or_heavy: usize,
    /// Outliers rejected on size
    pub too_large: usize,
    /// The evaluation cap was hit before the search completed
    pub truncated: bool,
}

impl fmt::Display for ClusterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seeds:{} subsets:{} evaluations:{} light_or_heavy:{} too_large:{}",
            self.seeds, self.subsets, self.evaluations, self.light_or_heavy, self.too_large
        )?;
        if self.truncated {
            write!(f, " TRUNCATED")?;
        }
        Ok(())
    }
}

struct Frame {
    set: FixedBitSet,
    seen: FixedBitSet,
    bounds: Rect,
    size: usize,
}

/// Search of acceptable compounds among connected parts.
///
/// # Example
///
/// ```
/// use omr_glyphs::glyph::{build_links, BoxDistance, ClusterAdapter, Glyph, GlyphCluster, GlyphGraph, PartId};
/// use omr_glyphs::run::{Orientation, Run, RunTable};
///
/// struct Collect {
///     graph: GlyphGraph,
///     found: Vec<Vec<PartId>>,
/// }
///
/// impl ClusterAdapter for Collect {
///     fn graph(&self) -> &GlyphGraph {
///         &self.graph
///     }
///
///     fn evaluate_glyph(&mut self, _glyph: Glyph, parts: &[PartId]) -> omr_glyphs::Result<()> {
///         self.found.push(parts.to_vec());
///         Ok(())
///     }
/// }
///
/// let dot = RunTable::from_sequences(Orientation::Horizontal, 1, 1, vec![vec![Run::new(0, 1)]])?;
/// let glyphs = vec![Glyph::new(0, 0, dot.clone()), Glyph::new(2, 0, dot)];
/// let graph = build_links(glyphs, 2.0, &BoxDistance)?;
///
/// let mut adapter = Collect { graph, found: Vec::new() };
/// let stats = GlyphCluster::new(&mut adapter).decompose()?;
/// assert_eq!(stats.evaluations, 3);
/// # Ok::<(), omr_glyphs::Error>(())
/// ```
pub struct GlyphCluster<'a, A: ClusterAdapter + ?Sized> {
    adapter: &'a mut A,
    group: Option<GlyphGroup>,
    config: SearchConfig,
}

impl<'a, A: ClusterAdapter + ?Sized> GlyphCluster<'a, A> {
    /// Create a search driven by `adapter`.
    pub fn new(adapter: &'a mut A) -> Self {
        Self {
            adapter,
            group: None,
            config: SearchConfig::default(),
        }
    }

    /// Tag every compound with `group`.
    pub fn with_group(mut self, group: GlyphGroup) -> Self {
        self.group = Some(group);
        self
    }

    /// Set seed order and work caps.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the search over all seeds.
    ///
    /// # Errors
    ///
    /// Fails on parts unknown to the graph, on fusion failures, and propagates
    /// adapter evaluation failures.
    pub fn decompose(&mut self) -> Result<ClusterStats> {
        let capacity = self.adapter.graph().node_count();
        let mut seeds = self.adapter.parts();
        for &seed in &seeds {
            check_part(seed, capacity)?;
        }
        self.order_seeds(&mut seeds);

        let mut stats = ClusterStats::default();
        let mut considered = FixedBitSet::with_capacity(capacity);

        for seed in seeds {
            if considered.contains(seed.index()) {
                continue;
            }
            considered.insert(seed.index());
            stats.seeds += 1;

            let mut set = FixedBitSet::with_capacity(capacity);
            set.insert(seed.index());
            let root = Frame {
                set,
                seen: considered.clone(),
                bounds: self.adapter.graph()[seed].bounds(),
                size: 1,
            };

            if !self.process(root, &mut stats)? {
                break;
            }
        }

        log::debug!("{:?} cluster {}", self.group, stats);
        Ok(stats)
    }

    fn order_seeds(&self, seeds: &mut [PartId]) {
        let graph = self.adapter.graph();
        match self.config.seed_order {
            SeedOrder::DecreasingWeight => {
                seeds.sort_by(|&a, &b| graph[b].weight().cmp(&graph[a].weight()))
            }
            SeedOrder::IncreasingWeight => {
                seeds.sort_by(|&a, &b| graph[a].weight().cmp(&graph[b].weight()))
            }
            SeedOrder::Given => {}
        }
    }

    /// Grow every subset reachable from `root`. Returns false once truncated.
    fn process(&mut self, root: Frame, stats: &mut ClusterStats) -> Result<bool> {
        let capacity = root.set.len();
        let mut stack = vec![root];

        while let Some(frame) = stack.pop() {
            stats.subsets += 1;
            let parts: Vec<PartId> = frame.set.ones().map(PartId::new).collect();

            let weight: u32 = {
                let graph = self.adapter.graph();
                parts.iter().map(|&p| graph[p].weight()).sum()
            };

            if self.adapter.is_weight_acceptable(weight) {
                if let Some(max) = self.config.max_evaluations {
                    if stats.evaluations >= max {
                        stats.truncated = true;
                        log::warn!("Cluster search stopped after {} evaluations", max);
                        return Ok(false);
                    }
                }
                let compound = self.build_compound(&parts)?;
                stats.evaluations += 1;
                self.adapter.evaluate_glyph(compound, &parts)?;
            } else {
                stats.light_or_heavy += 1;
                log::trace!("Subset {:?} weight {} not acceptable", parts, weight);
            }

            if let Some(max) = self.config.max_parts {
                if frame.size >= max {
                    continue;
                }
            }

            let mut outliers = FixedBitSet::with_capacity(capacity);
            for &part in &parts {
                for neighbor in self.adapter.neighbors(part) {
                    check_part(neighbor, capacity)?;
                    let i = neighbor.index();
                    if !frame.set.contains(i) && !frame.seen.contains(i) {
                        outliers.insert(i);
                    }
                }
            }

            if outliers.count_ones(..) == 0 {
                continue;
            }

            let mut seen = frame.seen.clone();
            seen.union_with(&outliers);

            let mut children = Vec::new();
            for o in outliers.ones() {
                let bounds = frame.bounds.union(&self.adapter.graph()[PartId::new(o)].bounds());
                if self.adapter.is_size_acceptable(&bounds) {
                    let mut set = frame.set.clone();
                    set.insert(o);
                    children.push(Frame {
                        set,
                        seen: seen.clone(),
                        bounds,
                        size: frame.size + 1,
                    });
                } else {
                    stats.too_large += 1;
                }
            }

            // Depth-first, lowest outlier first
            stack.extend(children.into_iter().rev());
        }

        Ok(true)
    }

    fn build_compound(&self, parts: &[PartId]) -> Result<Glyph> {
        let graph = self.adapter.graph();
        let compound = match parts {
            [single] => graph[*single].clone(),
            _ => build_glyph(parts.iter().map(|&p| &graph[p]))?,
        };
        Ok(match self.group {
            Some(group) => compound.with_group(group),
            None => compound,
        })
    }
}

fn check_part(part: PartId, capacity: usize) -> Result<()> {
    if part.index() >= capacity {
        return Err(Error::InvalidInput(format!(
            "unknown part {} in graph of {} parts",
            part.index(),
            capacity
        )));
    }
    Ok(())
}
