//! Connected-component labeling over run tables.
//!
//! Two runs belong to the same glyph when they are linked by a chain of runs
//! overlapping each other on consecutive scan lines. Labeling needs no pixel
//! buffer: it sweeps the table once, comparing each line with the previous one,
//! and records provisional marks plus an equivalence map between marks.
//!
//! The equivalence map always redirects a larger mark to a smaller one. Once the
//! sweep is over, every mark is resolved to its canonical ancestor (the smallest
//! mark of its class) through a lookup table, and runs are gathered per
//! canonical mark into glyphs.

use std::collections::{BTreeMap, HashMap};

use image::{GrayImage, Luma};

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::glyph::{bounds_of, Glyph, GlyphGroup};
use crate::run::{Orientation, Run, RunTable, RunTableFactory};

/// Single-use labeler of one run table.
///
/// The factory is consumed by [`label`](Self::label) or
/// [`build_glyphs`](Self::build_glyphs), so a spent instance cannot be reused.
///
/// # Examples
///
/// ```
/// use omr_glyphs::glyph::GlyphFactory;
/// use omr_glyphs::run::{Orientation, Run, RunTable};
///
/// // XX--X
/// // -X--X
/// let table = RunTable::from_sequences(
///     Orientation::Horizontal,
///     5,
///     2,
///     vec![
///         vec![Run::new(0, 2), Run::new(4, 1)],
///         vec![Run::new(1, 1), Run::new(4, 1)],
///     ],
/// )?;
///
/// let glyphs = GlyphFactory::new(&table).build_glyphs()?;
/// assert_eq!(glyphs.len(), 2);
/// assert_eq!(glyphs[0].weight(), 3);
/// # Ok::<(), omr_glyphs::Error>(())
/// ```
#[derive(Debug)]
pub struct GlyphFactory<'t> {
    table: &'t RunTable,
    offset: Point,
    group: Option<GlyphGroup>,
}

impl<'t> GlyphFactory<'t> {
    /// Create a factory for `table`, located at the image origin.
    pub fn new(table: &'t RunTable) -> Self {
        Self {
            table,
            offset: Point::default(),
            group: None,
        }
    }

    /// Set the absolute location of the table origin.
    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = offset;
        self
    }

    /// Tag every produced glyph with `group`.
    pub fn with_group(mut self, group: GlyphGroup) -> Self {
        self.group = Some(group);
        self
    }

    /// Run the labeling sweep and resolve marks, without building glyphs.
    ///
    /// # Errors
    ///
    /// Fails fast when the table holds unsorted, overlapping or invalid runs.
    pub fn label(self) -> Result<Labeling<'t>> {
        let table = self.table;
        table.validate()?;

        let mut marks: Vec<Vec<u32>> = Vec::with_capacity(table.size());
        let mut merges: HashMap<u32, u32> = HashMap::new();
        let mut max_mark = 0u32;

        for (line, sequence) in table.lines().enumerate() {
            let mut line_marks = vec![0u32; sequence.len()];
            let (prev_runs, prev_marks) = match line {
                0 => (&[][..], &[][..]),
                _ => (table.sequence(line - 1), marks[line - 1].as_slice()),
            };

            // Runs of both lines are sorted: previous runs ending before the current
            // run can never touch any later run of this line.
            let mut first = 0usize;

            for (i, run) in sequence.iter().enumerate() {
                let mut j = first;

                while j < prev_runs.len() {
                    let prev = &prev_runs[j];

                    if prev.stop() < run.start() {
                        first = j + 1;
                    } else if prev.start() > run.stop() {
                        break;
                    } else {
                        let prev_mark = prev_marks[j];
                        let mark = line_marks[i];

                        if mark == 0 {
                            line_marks[i] = prev_mark;
                        } else if mark != prev_mark {
                            merge(&mut merges, mark.max(prev_mark), mark.min(prev_mark));
                        }
                    }

                    j += 1;
                }

                if line_marks[i] == 0 {
                    max_mark += 1;
                    line_marks[i] = max_mark;
                }
            }

            marks.push(line_marks);
        }

        // Ancestors are smaller, hence already resolved when reached in ascending order
        let mut lut: Vec<u32> = (0..=max_mark).collect();
        for mark in 1..=max_mark {
            if let Some(&parent) = merges.get(&mark) {
                lut[mark as usize] = lut[parent as usize];
            }
        }

        log::trace!(
            "Labeled {} lines: {} marks, {} merges",
            table.size(),
            max_mark,
            merges.len()
        );

        Ok(Labeling {
            table,
            offset: self.offset,
            group: self.group,
            marks,
            lut,
            merge_count: merges.len(),
        })
    }

    /// Label the table and build one glyph per connected component.
    ///
    /// Glyphs come in the scan order of their first run.
    pub fn build_glyphs(self) -> Result<Vec<Glyph>> {
        Ok(self.label()?.into_glyphs())
    }
}

/// Record that mark `max` belongs to the same glyph as mark `min`.
///
/// Keeps every redirection chain strictly decreasing, so chains have no cycle
/// and end at the smallest mark of the class.
fn merge(merges: &mut HashMap<u32, u32>, mut max: u32, mut min: u32) {
    loop {
        debug_assert!(max > min);

        match merges.get(&max).copied() {
            None => {
                merges.insert(max, min);
                return;
            },
            Some(old) if old == min => return,
            Some(old) if old < min => {
                // Keep max -> old, and send min to old as well
                max = min;
                min = old;
            },
            Some(old) => {
                merges.insert(max, min);
                max = old;
            },
        }
    }
}

/// Outcome of the labeling sweep: per-run marks and their resolution table.
#[derive(Debug)]
pub struct Labeling<'t> {
    table: &'t RunTable,
    offset: Point,
    group: Option<GlyphGroup>,
    marks: Vec<Vec<u32>>,
    lut: Vec<u32>,
    merge_count: usize,
}

impl Labeling<'_> {
    /// Lookup table from provisional mark to canonical mark (index 0 unused).
    pub fn lut(&self) -> &[u32] {
        &self.lut
    }

    /// Highest provisional mark assigned.
    pub fn max_mark(&self) -> u32 {
        self.lut.len() as u32 - 1
    }

    /// Number of recorded equivalences.
    pub fn merge_count(&self) -> usize {
        self.merge_count
    }

    /// Provisional mark of the `index`-th run of `line`.
    pub fn mark(&self, line: usize, index: usize) -> Option<u32> {
        self.marks.get(line)?.get(index).copied()
    }

    /// Canonical mark of the `index`-th run of `line`.
    pub fn canonical_mark(&self, line: usize, index: usize) -> Option<u32> {
        self.mark(line, index).map(|m| self.lut[m as usize])
    }

    /// Number of connected components.
    pub fn glyph_count(&self) -> usize {
        self.lut
            .iter()
            .enumerate()
            .skip(1)
            .filter(|&(i, &m)| i as u32 == m)
            .count()
    }

    /// Gather runs per canonical mark and build the glyphs.
    pub fn into_glyphs(self) -> Vec<Glyph> {
        let mut buffers: BTreeMap<u32, GlyphBuffer> = BTreeMap::new();

        for (line, sequence) in self.table.lines().enumerate() {
            for (run, &mark) in sequence.iter().zip(&self.marks[line]) {
                buffers
                    .entry(self.lut[mark as usize])
                    .or_insert_with(GlyphBuffer::new)
                    .push(line, *run);
            }
        }

        let glyphs: Vec<Glyph> = buffers
            .into_values()
            .map(|buffer| buffer.into_glyph(self.table, self.offset, self.group))
            .collect();

        log::debug!(
            "GlyphFactory: {} runs, {} marks, {} merges -> {} glyphs",
            self.table.run_count(),
            self.max_mark(),
            self.merge_count,
            glyphs.len()
        );

        glyphs
    }
}

/// Runs collected for one glyph, grouped per line.
struct GlyphBuffer {
    lines: Vec<(usize, Vec<Run>)>,
    min_coord: i32,
    max_coord: i32,
}

impl GlyphBuffer {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            min_coord: i32::MAX,
            max_coord: i32::MIN,
        }
    }

    fn push(&mut self, line: usize, run: Run) {
        self.min_coord = self.min_coord.min(run.start());
        self.max_coord = self.max_coord.max(run.stop());

        match self.lines.last_mut() {
            Some((last, runs)) if *last == line => runs.push(run),
            _ => self.lines.push((line, vec![run])),
        }
    }

    fn into_glyph(self, source: &RunTable, offset: Point, group: Option<GlyphGroup>) -> Glyph {
        let orientation = source.orientation();
        let first_line = self.lines.first().map_or(0, |(l, _)| *l);
        let last_line = self.lines.last().map_or(0, |(l, _)| *l);
        let line_count = (last_line - first_line + 1) as i32;
        let line_length = self.max_coord - self.min_coord + 1;

        let mut sequences = vec![Vec::new(); line_count as usize];
        for (line, runs) in self.lines {
            sequences[line - first_line] = runs
                .into_iter()
                .map(|run| run.translated(-self.min_coord))
                .collect();
        }

        let origin = orientation.absolute(first_line as i32, self.min_coord);
        let (width, height) = match orientation {
            Orientation::Horizontal => (line_length, line_count),
            Orientation::Vertical => (line_count, line_length),
        };

        let table = RunTable::from_raw_parts(orientation, width, height, sequences);
        let glyph = Glyph::new(offset.x + origin.x, offset.y + origin.y, table);

        match group {
            Some(group) => glyph.with_group(group),
            None => glyph,
        }
    }
}

/// Fuse existing glyphs into one compound glyph.
///
/// Parts are painted into a raster covering their union box, from which runs are
/// extracted again. A single part is returned unchanged.
///
/// # Errors
///
/// Fails on an empty collection.
pub fn build_glyph<'a, I>(parts: I) -> Result<Glyph>
where
    I: IntoIterator<Item = &'a Glyph>,
{
    let parts: Vec<&Glyph> = parts.into_iter().collect();

    match parts.as_slice() {
        [] => Err(Error::InvalidInput(
            "cannot fuse an empty collection of glyphs".to_string(),
        )),
        [single] => Ok((*single).clone()),
        [first, ..] => {
            let bounds = bounds_of(parts.iter().copied()).unwrap_or_else(|| first.bounds());
            let mut buffer = GrayImage::from_pixel(
                bounds.width.max(0) as u32,
                bounds.height.max(0) as u32,
                Luma([255]),
            );

            for part in &parts {
                let at = Point::new(part.left() - bounds.x, part.top() - bounds.y);
                part.run_table().fill_buffer(&mut buffer, at);
            }

            let table = RunTableFactory::new(first.orientation()).create_table(&buffer);
            log::trace!("Fused {} parts into {:?}", parts.len(), bounds);

            Ok(Glyph::new(bounds.x, bounds.y, table))
        },
    }
}
