//! Stock adapters for [`GlyphCluster`](super::GlyphCluster) and
//! [`CompoundBuilder`](super::CompoundBuilder).
//!
//! - [`ShapeClusterAdapter`]: keeps the best compound per target shape (clefs, keys)
//! - [`TopShapeAdapter`]: accepts a compound whose top evaluations contain a target
//! - [`PassthroughAdapter`]: accepts any compound without classification

use std::collections::BTreeMap;

use crate::classifier::{Conditions, Evaluation, Shape, ShapeEvaluator};
use crate::config::{ClassifierConfig, CompoundLimits};
use crate::error::Result;
use crate::geometry::Rect;
use crate::glyph::{ClusterAdapter, CompoundAdapter, Glyph, GlyphGraph, GlyphGroup, PartId};

/// Best compound found for a shape.
#[derive(Debug, Clone)]
pub struct ShapeCandidate {
    /// Fused compound
    pub glyph: Glyph,
    /// Graph parts making up the compound
    pub parts: Vec<PartId>,
    /// Evaluation of the compound for this shape
    pub evaluation: Evaluation,
}

/// Cluster adapter retaining the best evaluated compound per target shape.
pub struct ShapeClusterAdapter<'e, E: ShapeEvaluator + ?Sized> {
    graph: GlyphGraph,
    evaluator: &'e E,
    targets: Vec<Shape>,
    limits: CompoundLimits,
    classifier: ClassifierConfig,
    conditions: Conditions,
    best: BTreeMap<Shape, ShapeCandidate>,
    trials: usize,
}

impl<'e, E: ShapeEvaluator + ?Sized> ShapeClusterAdapter<'e, E> {
    /// Create an adapter searching `graph` for `targets`.
    pub fn new(graph: GlyphGraph, evaluator: &'e E, targets: impl IntoIterator<Item = Shape>) -> Self {
        Self {
            graph,
            evaluator,
            targets: targets.into_iter().collect(),
            limits: CompoundLimits::default(),
            classifier: ClassifierConfig::default(),
            conditions: Conditions::empty(),
            best: BTreeMap::new(),
            trials: 0,
        }
    }

    /// Set weight and size limits.
    pub fn with_limits(mut self, limits: CompoundLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set grade threshold and evaluation rank.
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the conditions passed to the evaluator.
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// Number of compounds evaluated so far.
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Best compound for `shape`, if any.
    pub fn best(&self, shape: Shape) -> Option<&ShapeCandidate> {
        self.best.get(&shape)
    }

    /// Best compound over all target shapes.
    pub fn best_overall(&self) -> Option<&ShapeCandidate> {
        self.best
            .values()
            .max_by(|a, b| crate::utils::safe_float_cmp(a.evaluation.grade, b.evaluation.grade))
    }

    /// Retained compounds, by decreasing grade.
    pub fn into_candidates(self) -> Vec<ShapeCandidate> {
        let mut candidates: Vec<ShapeCandidate> = self.best.into_values().collect();
        candidates.sort_by(|a, b| {
            crate::classifier::by_decreasing_grade(&a.evaluation, &b.evaluation)
        });
        candidates
    }
}

impl<E: ShapeEvaluator + ?Sized> ClusterAdapter for ShapeClusterAdapter<'_, E> {
    fn graph(&self) -> &GlyphGraph {
        &self.graph
    }

    fn is_weight_acceptable(&self, weight: u32) -> bool {
        self.limits.is_weight_acceptable(weight)
    }

    fn is_size_acceptable(&self, bounds: &Rect) -> bool {
        self.limits.is_size_acceptable(bounds)
    }

    fn evaluate_glyph(&mut self, glyph: Glyph, parts: &[PartId]) -> Result<()> {
        self.trials += 1;

        let evals = self.evaluator.evaluate(
            &glyph,
            self.classifier.max_eval_rank,
            self.classifier.min_grade,
            self.conditions,
        )?;

        for eval in evals {
            if !self.targets.contains(&eval.shape) {
                continue;
            }
            let better = self
                .best
                .get(&eval.shape)
                .map_or(true, |current| eval.grade > current.evaluation.grade);
            if better {
                log::trace!("{} best so far for {} with {:?}", glyph, eval, parts);
                self.best.insert(
                    eval.shape,
                    ShapeCandidate {
                        glyph: glyph.clone(),
                        parts: parts.to_vec(),
                        evaluation: eval,
                    },
                );
            }
        }

        Ok(())
    }
}

/// Compound adapter accepting the compound if one of its top evaluations is a
/// target shape.
pub struct TopShapeAdapter<'e, E: ShapeEvaluator + ?Sized> {
    evaluator: &'e E,
    targets: Vec<Shape>,
    conditions: Conditions,
    limits: CompoundLimits,
    classifier: ClassifierConfig,
    margin: (i32, i32),
    chosen: Option<Evaluation>,
}

impl<'e, E: ShapeEvaluator + ?Sized> TopShapeAdapter<'e, E> {
    fn for_conditions(
        evaluator: &'e E,
        targets: impl IntoIterator<Item = Shape>,
        conditions: Conditions,
    ) -> Self {
        Self {
            evaluator,
            targets: targets.into_iter().collect(),
            conditions,
            limits: CompoundLimits::default(),
            classifier: ClassifierConfig::default(),
            margin: (0, 0),
            chosen: None,
        }
    }

    /// Consider the raw evaluations of the compound.
    pub fn raw(evaluator: &'e E, targets: impl IntoIterator<Item = Shape>) -> Self {
        Self::for_conditions(evaluator, targets, Conditions::empty())
    }

    /// Consider the evaluations of the compound requested as checked.
    pub fn checked(evaluator: &'e E, targets: impl IntoIterator<Item = Shape>) -> Self {
        Self::for_conditions(evaluator, targets, Conditions::CHECKED)
    }

    /// Set weight and size limits of a valid compound.
    pub fn with_limits(mut self, limits: CompoundLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set grade threshold and evaluation rank.
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Grow the reference box around the seed.
    pub fn with_margin(mut self, dx: i32, dy: i32) -> Self {
        self.margin = (dx, dy);
        self
    }
}

impl<E: ShapeEvaluator + ?Sized> CompoundAdapter for TopShapeAdapter<'_, E> {
    fn set_seed(&mut self, seed: &Glyph) -> Rect {
        self.chosen = None;
        seed.bounds().grown(self.margin.0, self.margin.1)
    }

    fn is_candidate_suitable(&self, candidate: &Glyph) -> bool {
        candidate.group() != Some(GlyphGroup::Drop)
            && candidate.weight() <= self.limits.max_weight
    }

    fn is_compound_valid(&mut self, compound: &Glyph) -> Result<bool> {
        if !self.limits.is_weight_acceptable(compound.weight())
            || !self.limits.is_size_valid(&compound.bounds())
        {
            return Ok(false);
        }

        let evals = self.evaluator.evaluate(
            compound,
            self.classifier.max_eval_rank,
            self.classifier.min_grade,
            self.conditions,
        )?;

        self.chosen = evals
            .into_iter()
            .find(|eval| self.targets.contains(&eval.shape));
        Ok(self.chosen.is_some())
    }

    fn chosen_evaluation(&self) -> Option<Evaluation> {
        self.chosen
    }
}

/// Compound adapter accepting any compound, without classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAdapter {
    margin: (i32, i32),
}

impl PassthroughAdapter {
    /// Create an adapter using the bare seed box as reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the reference box around the seed.
    pub fn with_margin(mut self, dx: i32, dy: i32) -> Self {
        self.margin = (dx, dy);
        self
    }
}

impl CompoundAdapter for PassthroughAdapter {
    fn set_seed(&mut self, seed: &Glyph) -> Rect {
        seed.bounds().grown(self.margin.0, self.margin.1)
    }

    fn is_candidate_suitable(&self, _candidate: &Glyph) -> bool {
        true
    }

    fn is_compound_valid(&mut self, _compound: &Glyph) -> Result<bool> {
        Ok(true)
    }

    fn should_filter_candidates(&self) -> bool {
        false
    }

    fn chosen_evaluation(&self) -> Option<Evaluation> {
        None
    }
}
