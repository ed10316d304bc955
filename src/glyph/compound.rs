//! Single-seed compound assembly.

use crate::classifier::Evaluation;
use crate::error::Result;
use crate::geometry::Rect;
use crate::glyph::{build_glyph, Glyph, GlyphIndex};

/// Domain policy driving a [`CompoundBuilder`].
pub trait CompoundAdapter {
    /// Record the seed and return the reference box candidates must touch.
    fn set_seed(&mut self, seed: &Glyph) -> Rect;

    /// Domain predicate on a candidate (for instance, not already assigned).
    fn is_candidate_suitable(&self, candidate: &Glyph) -> bool;

    /// Report whether `candidate` is close enough to the seed.
    fn is_candidate_close(&self, reference: &Rect, candidate: &Glyph) -> bool {
        reference.intersects(&candidate.bounds())
    }

    /// Check the fused compound, recording the chosen evaluation when valid.
    fn is_compound_valid(&mut self, compound: &Glyph) -> Result<bool>;

    /// Report whether suitability is checked on candidates.
    ///
    /// When false, only closeness is checked.
    fn should_filter_candidates(&self) -> bool {
        true
    }

    /// Evaluation chosen by the last successful validation.
    fn chosen_evaluation(&self) -> Option<Evaluation>;
}

/// Builds at most one compound around a seed glyph.
pub struct CompoundBuilder;

impl CompoundBuilder {
    /// Fuse `seed` (if `include_seed`) with its close suitable candidates.
    ///
    /// At least one selected candidate is required, two parts overall when the
    /// seed is included. The compound is registered in `index` and returned
    /// only if the adapter validates it; otherwise nothing is built or
    /// registered and `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// Propagates adapter (classifier) failures.
    pub fn build_compound<A>(
        seed: &Glyph,
        include_seed: bool,
        candidates: &[Glyph],
        adapter: &mut A,
        index: &mut GlyphIndex,
    ) -> Result<Option<Glyph>>
    where
        A: CompoundAdapter + ?Sized,
    {
        let reference = adapter.set_seed(seed);
        let filter = adapter.should_filter_candidates();

        let mut parts: Vec<&Glyph> = Vec::new();
        if include_seed {
            parts.push(seed);
        }
        parts.extend(candidates.iter().filter(|&candidate| {
            candidate != seed
                && (!filter || adapter.is_candidate_suitable(candidate))
                && adapter.is_candidate_close(&reference, candidate)
        }));

        let min_count = if include_seed { 2 } else { 1 };
        if parts.len() < min_count {
            log::trace!(
                "No compound around {}: {} part(s), {} needed",
                seed,
                parts.len(),
                min_count
            );
            return Ok(None);
        }

        let compound = build_glyph(parts)?;
        if !adapter.is_compound_valid(&compound)? {
            log::trace!("Compound {} around {} rejected", compound, seed);
            return Ok(None);
        }

        let compound = index.register(compound);
        match adapter.chosen_evaluation() {
            Some(eval) => log::debug!("Compound {} around {} as {}", compound, seed, eval),
            None => log::debug!("Compound {} around {}", compound, seed),
        }
        Ok(Some(compound))
    }
}
