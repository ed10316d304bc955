//! Glyphs and their assembly.
//!
//! A [`Glyph`] is a set of foreground runs treated as one symbol candidate.
//! This module provides:
//! - Run-length connected-component labeling ([`GlyphFactory`])
//! - Fusion of existing glyphs into a compound ([`build_glyph`])
//! - The neighbor graph of glyph parts ([`build_links`])
//! - Classifier-guided compound discovery ([`GlyphCluster`], [`CompoundBuilder`])
//! - A registry deduplicating structurally equal glyphs ([`GlyphIndex`])

pub mod adapters;
pub mod cluster;
pub mod compound;
pub mod factory;
pub mod index;
pub mod links;

pub use adapters::{PassthroughAdapter, ShapeCandidate, ShapeClusterAdapter, TopShapeAdapter};
pub use cluster::{ClusterAdapter, ClusterStats, GlyphCluster, SeedOrder};
pub use compound::{CompoundAdapter, CompoundBuilder};
pub use factory::{build_glyph, GlyphFactory, Labeling};
pub use index::GlyphIndex;
pub use links::{
    build_links, connected_sets, sub_graph, BoxDistance, ChamferDistance, ChamferTable,
    GlyphDistance, GlyphGraph, Nearby, PartId, MAX_LINK_GAP,
};

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, PointF, Rect};
use crate::run::{Orientation, RunTable};

/// Role a glyph plays in the recognition pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GlyphGroup {
    /// Vertical segment likely to be a stem seed
    VerticalSeed,
    /// Generic symbol candidate
    Symbol,
    /// Part of an alteration sign (sharp, flat, natural)
    AlterPart,
    /// Spot likely to belong to a beam
    BeamSpot,
    /// Part of a time signature
    TimePart,
    /// Part of a clef
    ClefPart,
    /// Part of a key signature
    KeyPart,
    /// Ledger line
    Ledger,
    /// Possible ledger line
    LedgerCandidate,
    /// Stem stump
    Stump,
    /// Glyph dropped from further processing
    Drop,
}

/// Identity handed out by a [`GlyphIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlyphId(pub u32);

impl fmt::Display for GlyphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A set of foreground runs located in image space.
///
/// Glyphs are immutable: tagging or registering one yields a new value. The run
/// table is shared, so clones are cheap. Equality and hashing only consider the
/// absolute pixel content, never the scan orientation, id or group.
#[derive(Debug, Clone)]
pub struct Glyph {
    id: Option<GlyphId>,
    left: i32,
    top: i32,
    table: Arc<RunTable>,
    group: Option<GlyphGroup>,
}

impl Glyph {
    /// Create a glyph whose run table origin lies at `(left, top)`.
    pub fn new(left: i32, top: i32, table: RunTable) -> Self {
        Self {
            id: None,
            left,
            top,
            table: Arc::new(table),
            group: None,
        }
    }

    /// Return a copy tagged with `group`.
    pub fn with_group(mut self, group: GlyphGroup) -> Self {
        self.group = Some(group);
        self
    }

    /// Return a copy carrying `id`.
    pub fn with_id(mut self, id: GlyphId) -> Self {
        self.id = Some(id);
        self
    }

    /// Identity, once registered in a [`GlyphIndex`].
    pub fn id(&self) -> Option<GlyphId> {
        self.id
    }

    /// Group tag, if any.
    pub fn group(&self) -> Option<GlyphGroup> {
        self.group
    }

    /// Abscissa of the table origin.
    pub fn left(&self) -> i32 {
        self.left
    }

    /// Ordinate of the table origin.
    pub fn top(&self) -> i32 {
        self.top
    }

    /// Top-left corner.
    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Width of the bounding box.
    pub fn width(&self) -> i32 {
        self.table.width()
    }

    /// Height of the bounding box.
    pub fn height(&self) -> i32 {
        self.table.height()
    }

    /// Member runs, relative to [`top_left`](Self::top_left).
    pub fn run_table(&self) -> &RunTable {
        &self.table
    }

    /// Scan orientation of the member runs.
    pub fn orientation(&self) -> Orientation {
        self.table.orientation()
    }

    /// Bounding box in image space.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.left, self.top, self.table.width(), self.table.height())
    }

    /// Number of foreground pixels.
    pub fn weight(&self) -> u32 {
        self.table.weight()
    }

    /// Mass center, falling back to the box center for an empty glyph.
    pub fn centroid(&self) -> PointF {
        self.table
            .centroid(self.left, self.top)
            .unwrap_or_else(|| self.bounds().center())
    }

    /// Report whether the absolute pixel `point` belongs to the glyph.
    pub fn contains(&self, point: &Point) -> bool {
        self.table.get(point.x - self.left, point.y - self.top)
    }

    /// ASCII rendering of the glyph box.
    pub fn dump_of(&self) -> String {
        self.table.dump_of()
    }
}

impl PartialEq for Glyph {
    fn eq(&self, other: &Self) -> bool {
        self.left == other.left
            && self.top == other.top
            && self.table.same_pixels(&other.table)
    }
}

impl Eq for Glyph {}

// Only orientation-independent features, consistent with `same_pixels`
impl Hash for Glyph {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.left.hash(state);
        self.top.hash(state);
        self.table.width().hash(state);
        self.table.height().hash(state);
        self.table.weight().hash(state);
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.bounds();
        match self.id {
            Some(id) => write!(f, "Glyph{}", id)?,
            None => write!(f, "Glyph")?,
        }
        write!(
            f,
            "[x:{} y:{} w:{} h:{} weight:{}]",
            b.x,
            b.y,
            b.width,
            b.height,
            self.weight()
        )
    }
}

/// Cumulated weight of a collection of glyphs.
pub fn weight_of<'a>(glyphs: impl IntoIterator<Item = &'a Glyph>) -> u32 {
    glyphs.into_iter().map(Glyph::weight).sum()
}

/// Union of glyph bounds, `None` for an empty collection.
pub fn bounds_of<'a>(glyphs: impl IntoIterator<Item = &'a Glyph>) -> Option<Rect> {
    glyphs
        .into_iter()
        .map(Glyph::bounds)
        .reduce(|acc, b| acc.union(&b))
}

/// Compare glyphs by decreasing weight.
pub fn by_reverse_weight(g1: &Glyph, g2: &Glyph) -> Ordering {
    g2.weight().cmp(&g1.weight())
}

/// Compare glyphs by increasing abscissa, then ordinate.
pub fn by_abscissa(g1: &Glyph, g2: &Glyph) -> Ordering {
    g1.left.cmp(&g2.left).then(g1.top.cmp(&g2.top))
}
