// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::needless_range_loop)]
#![allow(clippy::enum_variant_names)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # OMR Glyphs
//!
//! Glyph formation and compound discovery for optical music recognition.
//!
//! ## Core Features
//!
//! - **Run extraction**: binarize a grayscale image into per-line foreground runs
//! - **Labeling**: run-length connected-component labeling into glyphs
//! - **Fusion**: merge existing glyphs into one compound without re-scanning the image
//! - **Neighbor graph**: sparse proximity graph of glyph parts (chamfer or box distance)
//! - **Cluster search**: enumerate acceptable connected subsets of parts, each evaluated once
//! - **Compound builder**: grow a single compound around a seed glyph
//! - **Classification**: pluggable [`classifier::ShapeEvaluator`] injected into the search
//!
//! ## Architecture
//!
//! - **Pluggable design**: trait-based adapters carry the domain policy
//!   ([`glyph::ClusterAdapter`], [`glyph::CompoundAdapter`]), the algorithms stay generic
//! - **Immutable glyphs**: glyphs share their run table, tagging yields new values
//! - **Registry**: [`glyph::GlyphIndex`] deduplicates structurally equal glyphs
//!
//! ## Quick Start
//!
//! ```
//! use image::{GrayImage, Luma};
//! use omr_glyphs::glyph::GlyphFactory;
//! use omr_glyphs::run::{Orientation, RunTableFactory};
//!
//! let mut image = GrayImage::from_pixel(6, 3, Luma([255]));
//! for x in 0..2 {
//!     image.put_pixel(x, 1, Luma([0]));
//! }
//! image.put_pixel(4, 1, Luma([0]));
//!
//! let table = RunTableFactory::new(Orientation::Horizontal).create_table(&image);
//! let glyphs = GlyphFactory::new(&table).build_glyphs()?;
//! assert_eq!(glyphs.len(), 2);
//! # Ok::<(), omr_glyphs::Error>(())
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Geometry primitives
pub mod geometry;

// Runs and run tables
pub mod run;

// Glyphs: labeling, fusion, links, compound search
pub mod glyph;

// Shape classification
pub mod classifier;

// Configuration
pub mod config;

// Re-exports
pub use config::GlyphConfig;
pub use error::{Error, Result};
pub use glyph::{Glyph, GlyphFactory, GlyphIndex};
pub use run::{RunTable, RunTableFactory};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Safely compare two floating point numbers, handling NaN cases.
    ///
    /// NaN values are treated as equal to each other and greater than all other values.
    /// This ensures that sorting operations never panic due to NaN comparisons.
    pub fn safe_float_cmp(a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
