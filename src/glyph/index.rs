//! Registry of glyphs, deduplicated by pixel content.

use indexmap::IndexSet;

use crate::glyph::{Glyph, GlyphId};

/// Registry ("nest") of the glyphs of one system or sheet.
///
/// Registering a glyph structurally equal to an already registered one returns
/// the existing entry, so each distinct pixel set gets exactly one [`GlyphId`].
/// Ids are 1-based and follow registration order.
#[derive(Debug, Default)]
pub struct GlyphIndex {
    glyphs: IndexSet<Glyph>,
}

impl GlyphIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `glyph`, returning the registered instance with its id.
    ///
    /// # Examples
    ///
    /// ```
    /// use omr_glyphs::glyph::{Glyph, GlyphIndex};
    /// use omr_glyphs::run::{Orientation, Run, RunTable};
    ///
    /// let table = RunTable::from_sequences(Orientation::Horizontal, 2, 1, vec![vec![Run::new(0, 2)]])?;
    /// let mut index = GlyphIndex::new();
    ///
    /// let first = index.register(Glyph::new(5, 5, table.clone()));
    /// let again = index.register(Glyph::new(5, 5, table));
    /// assert_eq!(first.id(), again.id());
    /// assert_eq!(index.len(), 1);
    /// # Ok::<(), omr_glyphs::Error>(())
    /// ```
    pub fn register(&mut self, glyph: Glyph) -> Glyph {
        if let Some(existing) = self.glyphs.get(&glyph) {
            return existing.clone();
        }

        let id = GlyphId(self.glyphs.len() as u32 + 1);
        let registered = glyph.with_id(id);
        self.glyphs.insert(registered.clone());
        log::trace!("Registered {}", registered);
        registered
    }

    /// Look up a registered glyph by id.
    pub fn get(&self, id: GlyphId) -> Option<&Glyph> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|idx| self.glyphs.get_index(idx))
    }

    /// Registered instance structurally equal to `glyph`, if any.
    pub fn lookup(&self, glyph: &Glyph) -> Option<&Glyph> {
        self.glyphs.get(glyph)
    }

    /// Number of registered glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Report whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Iterate over registered glyphs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{Orientation, Run, RunTable};

    fn dot(x: i32, y: i32) -> Glyph {
        let table =
            RunTable::from_sequences(Orientation::Horizontal, 1, 1, vec![vec![Run::new(0, 1)]])
                .unwrap();
        Glyph::new(x, y, table)
    }

    #[test]
    fn test_ids_follow_registration_order() {
        let mut index = GlyphIndex::new();
        let a = index.register(dot(0, 0));
        let b = index.register(dot(5, 0));
        assert_eq!(a.id(), Some(GlyphId(1)));
        assert_eq!(b.id(), Some(GlyphId(2)));
        assert_eq!(index.get(GlyphId(2)), Some(&b));
        assert!(index.get(GlyphId(0)).is_none());
        assert!(index.get(GlyphId(3)).is_none());
    }

    #[test]
    fn test_duplicates_share_identity() {
        let mut index = GlyphIndex::new();
        let a = index.register(dot(1, 1));
        let b = index.register(dot(1, 1));
        assert_eq!(a.id(), b.id());
        assert_eq!(index.len(), 1);
        assert!(index.lookup(&dot(1, 1)).is_some());
        assert!(index.lookup(&dot(2, 1)).is_none());
    }
}
