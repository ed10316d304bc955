//! Nearest-prototype evaluator.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{by_decreasing_grade, BasicDescriptor, Conditions, Evaluation, GlyphDescriptor, Shape, ShapeEvaluator};
use crate::error::{Error, Result};
use crate::glyph::Glyph;

/// A reference feature vector for one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prototype {
    /// Shape represented
    pub shape: Shape,
    /// Features, as produced by [`BasicDescriptor`]
    pub features: Vec<f64>,
}

/// Serialized form of a [`PrototypeEvaluator`].
///
/// ```json
/// {
///   "interline": 20.0,
///   "min_weight": 12,
///   "prototypes": [{ "shape": "Sharp", "features": [0.5, 0.6, 1.4, 2.3, 0.5, 0.5] }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrototypeModel {
    /// Interline used to normalize features, in pixels
    pub interline: f64,
    /// Minimum weight of a checked glyph, in pixels
    pub min_weight: u32,
    /// Known prototypes
    pub prototypes: Vec<Prototype>,
}

impl Default for PrototypeModel {
    fn default() -> Self {
        Self {
            interline: 20.0,
            min_weight: 0,
            prototypes: Vec::new(),
        }
    }
}

/// Evaluator grading each shape by its closest prototype.
///
/// The grade of a shape is `exp(-d)`, `d` being the Euclidean distance between
/// the glyph features and the nearest prototype of that shape. Grades thus lie
/// in `(0, 1]`, 1 meaning an exact match.
#[derive(Debug, Clone)]
pub struct PrototypeEvaluator {
    descriptor: BasicDescriptor,
    min_weight: u32,
    prototypes: Vec<Prototype>,
}

impl PrototypeEvaluator {
    /// Create an evaluator without prototypes.
    pub fn new(interline: f64) -> Self {
        Self {
            descriptor: BasicDescriptor::new(interline),
            min_weight: 0,
            prototypes: Vec::new(),
        }
    }

    /// Set the minimum weight enforced on checked requests.
    pub fn with_min_weight(mut self, min_weight: u32) -> Self {
        self.min_weight = min_weight;
        self
    }

    /// Build an evaluator from a deserialized model.
    pub fn from_model(model: PrototypeModel) -> Result<Self> {
        let mut evaluator = Self::new(model.interline).with_min_weight(model.min_weight);
        for prototype in model.prototypes {
            evaluator.add_prototype(prototype)?;
        }
        Ok(evaluator)
    }

    /// Parse an evaluator model from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let model: PrototypeModel = serde_json::from_str(json)?;
        Self::from_model(model)
    }

    /// Load an evaluator model from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Current state as a serializable model.
    pub fn to_model(&self) -> PrototypeModel {
        PrototypeModel {
            interline: self.descriptor.interline(),
            min_weight: self.min_weight,
            prototypes: self.prototypes.clone(),
        }
    }

    /// Add a prototype, checking its feature count.
    pub fn add_prototype(&mut self, prototype: Prototype) -> Result<()> {
        if prototype.features.len() != self.descriptor.length() {
            return Err(Error::InvalidInput(format!(
                "prototype for {} has {} features, expected {}",
                prototype.shape,
                prototype.features.len(),
                self.descriptor.length()
            )));
        }
        self.prototypes.push(prototype);
        Ok(())
    }

    /// Record `glyph` as a sample of `shape`.
    pub fn learn(&mut self, glyph: &Glyph, shape: Shape) {
        self.prototypes.push(Prototype {
            shape,
            features: self.descriptor.features(glyph),
        });
    }

    /// Known prototypes.
    pub fn prototypes(&self) -> &[Prototype] {
        &self.prototypes
    }

    /// Minimum weight enforced on checked requests.
    pub fn min_weight(&self) -> u32 {
        self.min_weight
    }

    /// Descriptor used to compute glyph features.
    pub fn descriptor(&self) -> &BasicDescriptor {
        &self.descriptor
    }
}

fn feature_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

impl ShapeEvaluator for PrototypeEvaluator {
    fn name(&self) -> &'static str {
        "Prototype"
    }

    fn evaluate(
        &self,
        glyph: &Glyph,
        count: usize,
        min_grade: f64,
        conditions: Conditions,
    ) -> Result<Vec<Evaluation>> {
        let allow_noise = conditions.contains(Conditions::ALLOW_NOISE);

        if conditions.contains(Conditions::CHECKED) && glyph.weight() < self.min_weight {
            let mut evals = Vec::new();
            if allow_noise && count > 0 && min_grade <= 1.0 {
                evals.push(Evaluation::new(Shape::Noise, 1.0));
            }
            return Ok(evals);
        }

        let features = self.descriptor.features(glyph);
        let mut best: BTreeMap<Shape, f64> = BTreeMap::new();
        for prototype in &self.prototypes {
            if prototype.shape == Shape::Noise && !allow_noise {
                continue;
            }
            let d = feature_distance(&features, &prototype.features);
            best.entry(prototype.shape)
                .and_modify(|v| *v = v.min(d))
                .or_insert(d);
        }

        let mut evals: Vec<Evaluation> = best
            .into_iter()
            .map(|(shape, d)| Evaluation::new(shape, (-d).exp()))
            .filter(|e| e.grade >= min_grade)
            .collect();
        evals.sort_by(by_decreasing_grade);
        evals.truncate(count);

        log::trace!("{} evaluated {} as {:?}", self.name(), glyph, evals);
        Ok(evals)
    }

    fn is_big_enough(&self, glyph: &Glyph) -> bool {
        glyph.weight() >= self.min_weight.max(1)
    }
}
