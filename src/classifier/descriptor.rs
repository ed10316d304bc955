//! Feature vectors describing a glyph.

use crate::glyph::Glyph;

/// Produces a fixed-length feature vector for a glyph.
pub trait GlyphDescriptor: Send + Sync {
    /// Descriptor name, for debugging.
    fn name(&self) -> &'static str;

    /// Labels of the features, one per vector component.
    fn feature_labels(&self) -> &'static [&'static str];

    /// Number of features.
    fn length(&self) -> usize {
        self.feature_labels().len()
    }

    /// Compute the features of `glyph`.
    fn features(&self, glyph: &Glyph) -> Vec<f64>;
}

/// Moments-free descriptor built on weight, box and mass center.
///
/// Sizes are normalized by the interline (staff line spacing) so that features
/// from scores scanned at different resolutions remain comparable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicDescriptor {
    interline: f64,
}

const BASIC_LABELS: &[&str] = &["weight", "width", "height", "aspect", "xbar", "ybar"];

impl BasicDescriptor {
    /// Create a descriptor for the given interline, in pixels.
    ///
    /// Non-positive values fall back to 1.
    pub fn new(interline: f64) -> Self {
        let interline = if interline > 0.0 { interline } else { 1.0 };
        Self { interline }
    }

    /// Normalization length, in pixels.
    pub fn interline(&self) -> f64 {
        self.interline
    }
}

impl Default for BasicDescriptor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl GlyphDescriptor for BasicDescriptor {
    fn name(&self) -> &'static str {
        "Basic"
    }

    fn feature_labels(&self) -> &'static [&'static str] {
        BASIC_LABELS
    }

    fn features(&self, glyph: &Glyph) -> Vec<f64> {
        let il = self.interline;
        let width = glyph.width().max(1) as f64;
        let height = glyph.height().max(1) as f64;
        let center = glyph.centroid();

        vec![
            glyph.weight() as f64 / (il * il),
            width / il,
            height / il,
            height / width,
            (center.x - glyph.left() as f64) / width,
            (center.y - glyph.top() as f64) / height,
        ]
    }
}
