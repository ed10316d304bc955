//! Shape classification of glyphs.
//!
//! The glyph engine never classifies by itself: it consults an injected
//! [`ShapeEvaluator`]. Grades follow one convention throughout the crate,
//! higher is better.
//!
//! # Available Evaluators
//!
//! - [`PrototypeEvaluator`]: nearest prototype over [`BasicDescriptor`] features

mod descriptor;
mod prototype;
mod shape;

pub use descriptor::{BasicDescriptor, GlyphDescriptor};
pub use prototype::{Prototype, PrototypeEvaluator, PrototypeModel};
pub use shape::Shape;

use std::cmp::Ordering;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::glyph::Glyph;

/// A shape interpretation of a glyph, with its grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Interpreted shape
    pub shape: Shape,
    /// Confidence, higher is better
    pub grade: f64,
}

impl Evaluation {
    /// Create an evaluation.
    pub fn new(shape: Shape, grade: f64) -> Self {
        Self { shape, grade }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:.3})", self.shape, self.grade)
    }
}

/// Order evaluations by decreasing grade, then by shape.
pub fn by_decreasing_grade(e1: &Evaluation, e2: &Evaluation) -> Ordering {
    crate::utils::safe_float_cmp(e2.grade, e1.grade).then(e1.shape.cmp(&e2.shape))
}

bitflags! {
    /// Options passed along with an evaluation request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Conditions: u8 {
        /// Noise may appear among the results
        const ALLOW_NOISE = 0b0000_0001;
        /// Apply sanity checks on the glyph before classifying
        const CHECKED = 0b0000_0010;
    }
}

/// Classifier service consulted by the compound search.
///
/// Instances are built once by the host application and handed to the
/// adapters that need them. Implementations shared between concurrent searches
/// must tolerate concurrent reads.
pub trait ShapeEvaluator: Send + Sync {
    /// Return the name of this evaluator for debugging.
    fn name(&self) -> &'static str;

    /// Rank the plausible shapes for `glyph`.
    ///
    /// # Arguments
    ///
    /// * `count` - Maximum number of evaluations returned
    /// * `min_grade` - Evaluations below this grade are dropped
    /// * `conditions` - Request options
    ///
    /// # Returns
    ///
    /// Evaluations sorted by decreasing grade.
    fn evaluate(
        &self,
        glyph: &Glyph,
        count: usize,
        min_grade: f64,
        conditions: Conditions,
    ) -> Result<Vec<Evaluation>>;

    /// Best evaluation, if any reaches `min_grade`.
    fn vote(
        &self,
        glyph: &Glyph,
        min_grade: f64,
        conditions: Conditions,
    ) -> Result<Option<Evaluation>> {
        Ok(self
            .evaluate(glyph, 1, min_grade, conditions)?
            .into_iter()
            .next())
    }

    /// Report whether `glyph` is worth classifying at all.
    fn is_big_enough(&self, glyph: &Glyph) -> bool {
        glyph.weight() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_decreasing_grade() {
        let mut evals = vec![
            Evaluation::new(Shape::Flat, 0.2),
            Evaluation::new(Shape::Sharp, 0.9),
            Evaluation::new(Shape::Natural, 0.9),
        ];
        evals.sort_by(by_decreasing_grade);
        assert_eq!(evals[0].shape, Shape::Natural);
        assert_eq!(evals[1].shape, Shape::Sharp);
        assert_eq!(evals[2].shape, Shape::Flat);
    }

    #[test]
    fn test_conditions() {
        let c = Conditions::ALLOW_NOISE | Conditions::CHECKED;
        assert!(c.contains(Conditions::CHECKED));
        assert!(!Conditions::empty().contains(Conditions::ALLOW_NOISE));
    }

    #[test]
    fn test_display() {
        assert_eq!(Evaluation::new(Shape::FClef, 0.5).to_string(), "FClef(0.500)");
    }
}
