//! Runs and run tables.
//!
//! A [`RunTable`] stores a binary image as one ordered sequence of foreground
//! runs per scan line. Lines are rows for a horizontal table and columns for a
//! vertical one. `width` and `height` are always expressed in image space,
//! whatever the orientation.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{Point, PointF};

/// Direction of the scan lines of a run table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Lines are rows, runs extend along x
    #[default]
    Horizontal,
    /// Lines are columns, runs extend along y
    Vertical,
}

impl Orientation {
    /// Convert an oriented `(line, coord)` pair into image coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use omr_glyphs::geometry::Point;
    /// use omr_glyphs::run::Orientation;
    ///
    /// assert_eq!(Orientation::Horizontal.absolute(2, 7), Point::new(7, 2));
    /// assert_eq!(Orientation::Vertical.absolute(2, 7), Point::new(2, 7));
    /// ```
    pub fn absolute(&self, line: i32, coord: i32) -> Point {
        match self {
            Self::Horizontal => Point::new(coord, line),
            Self::Vertical => Point::new(line, coord),
        }
    }

    /// Convert an image point into an oriented `(line, coord)` pair.
    pub fn oriented(&self, point: Point) -> (i32, i32) {
        match self {
            Self::Horizontal => (point.y, point.x),
            Self::Vertical => (point.x, point.y),
        }
    }

    /// Number of scan lines of an image of the given dimensions.
    pub fn line_count(&self, width: i32, height: i32) -> i32 {
        match self {
            Self::Horizontal => height,
            Self::Vertical => width,
        }
    }

    /// Length of one scan line of an image of the given dimensions.
    pub fn line_length(&self, width: i32, height: i32) -> i32 {
        match self {
            Self::Horizontal => width,
            Self::Vertical => height,
        }
    }
}

/// A maximal span of foreground pixels along one scan line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Run {
    start: i32,
    length: i32,
}

impl Run {
    /// Create a run. Validity is checked when the run enters a [`RunTable`].
    pub fn new(start: i32, length: i32) -> Self {
        Self { start, length }
    }

    /// Offset of the first pixel along the line.
    pub fn start(&self) -> i32 {
        self.start
    }

    /// Number of pixels.
    pub fn length(&self) -> i32 {
        self.length
    }

    /// Offset of the last pixel along the line (inclusive).
    ///
    /// Saturates at `i32::MAX`, so a run overflowing the offset range always
    /// reads as out of bounds.
    pub fn stop(&self) -> i32 {
        self.start.saturating_add(self.length.saturating_sub(1))
    }

    /// Report whether the two runs share at least one offset.
    ///
    /// Applied to runs of consecutive lines, this is the connectivity test of
    /// glyph labeling.
    ///
    /// # Examples
    ///
    /// ```
    /// use omr_glyphs::run::Run;
    ///
    /// let run = Run::new(3, 4); // 3..=6
    /// assert!(run.overlaps(&Run::new(6, 2)));
    /// assert!(!run.overlaps(&Run::new(7, 2)));
    /// ```
    pub fn overlaps(&self, other: &Run) -> bool {
        other.stop() >= self.start && other.start <= self.stop()
    }

    /// Return a copy shifted along the line.
    pub fn translated(&self, delta: i32) -> Run {
        Run::new(self.start + delta, self.length)
    }
}

/// Binary image stored as run sequences, one per scan line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunTable {
    orientation: Orientation,
    width: i32,
    height: i32,
    sequences: Vec<Vec<Run>>,
}

impl RunTable {
    /// Create an empty table of the given image dimensions.
    pub fn new(orientation: Orientation, width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let lines = orientation.line_count(width, height) as usize;
        Self {
            orientation,
            width,
            height,
            sequences: vec![Vec::new(); lines],
        }
    }

    /// Create a table from prepared sequences, validating every run.
    ///
    /// # Errors
    ///
    /// Fails when the number of sequences does not match the line count, or when
    /// any line holds an invalid, out-of-bounds, unsorted or overlapping run.
    pub fn from_sequences(
        orientation: Orientation,
        width: i32,
        height: i32,
        sequences: Vec<Vec<Run>>,
    ) -> Result<Self> {
        let expected = orientation.line_count(width.max(0), height.max(0)) as usize;
        if sequences.len() != expected {
            return Err(Error::InvalidInput(format!(
                "{:?} table of {}x{} needs {} sequences, got {}",
                orientation,
                width,
                height,
                expected,
                sequences.len()
            )));
        }

        let table = Self {
            orientation,
            width: width.max(0),
            height: height.max(0),
            sequences,
        };
        table.validate()?;
        Ok(table)
    }

    /// Assemble a table whose runs are valid by construction.
    pub(crate) fn from_raw_parts(
        orientation: Orientation,
        width: i32,
        height: i32,
        sequences: Vec<Vec<Run>>,
    ) -> Self {
        debug_assert_eq!(
            sequences.len(),
            orientation.line_count(width, height) as usize
        );
        Self {
            orientation,
            width,
            height,
            sequences,
        }
    }

    /// Append a run at the end of a line.
    ///
    /// # Errors
    ///
    /// Fails when the line does not exist, the run is invalid or out of bounds,
    /// or it does not start strictly after the line's last run (with at least one
    /// background pixel in between).
    pub fn add_run(&mut self, line: usize, run: Run) -> Result<()> {
        let line_length = self.line_length();
        let line_count = self.sequences.len();
        let sequence = self.sequences.get_mut(line).ok_or(Error::RunOutOfBounds {
            line,
            start: run.start(),
            stop: run.stop(),
            limit: line_count as i32,
        })?;

        check_run(line, &run, sequence.last(), line_length)?;
        sequence.push(run);
        Ok(())
    }

    /// Check that every line holds sorted, separated, in-bounds runs.
    pub fn validate(&self) -> Result<()> {
        let line_length = self.line_length();

        for (line, sequence) in self.sequences.iter().enumerate() {
            let mut previous: Option<&Run> = None;
            for run in sequence {
                check_run(line, run, previous, line_length)?;
                previous = Some(run);
            }
        }

        Ok(())
    }

    /// Scan-line direction.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Image width.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Image height.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of scan lines.
    pub fn size(&self) -> usize {
        self.sequences.len()
    }

    /// Length of each scan line.
    pub fn line_length(&self) -> i32 {
        self.orientation.line_length(self.width, self.height)
    }

    /// Runs of one line, empty when the line does not exist.
    pub fn sequence(&self, line: usize) -> &[Run] {
        self.sequences.get(line).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over all lines in order.
    pub fn lines(&self) -> impl Iterator<Item = &[Run]> {
        self.sequences.iter().map(Vec::as_slice)
    }

    /// Iterate over `(line, run)` pairs in scan order.
    pub fn iter_runs(&self) -> impl Iterator<Item = (usize, Run)> + '_ {
        self.sequences
            .iter()
            .enumerate()
            .flat_map(|(line, seq)| seq.iter().map(move |run| (line, *run)))
    }

    /// Total number of runs.
    pub fn run_count(&self) -> usize {
        self.sequences.iter().map(Vec::len).sum()
    }

    /// Report whether the table holds no foreground pixel.
    pub fn is_empty(&self) -> bool {
        self.sequences.iter().all(Vec::is_empty)
    }

    /// Number of foreground pixels.
    pub fn weight(&self) -> u32 {
        self.sequences
            .iter()
            .flatten()
            .map(|run| run.length().max(0) as u32)
            .sum()
    }

    /// Report whether the pixel at `(x, y)` (table-local) is foreground.
    pub fn get(&self, x: i32, y: i32) -> bool {
        let (line, coord) = self.orientation.oriented(Point::new(x, y));
        if line < 0 {
            return false;
        }

        let sequence = self.sequence(line as usize);
        let idx = sequence.partition_point(|run| run.stop() < coord);
        sequence
            .get(idx)
            .is_some_and(|run| run.start() <= coord && coord <= run.stop())
    }

    /// Report whether both tables hold the same pixels, whatever their
    /// orientation.
    ///
    /// # Examples
    ///
    /// ```
    /// use omr_glyphs::run::{Orientation, Run, RunTable};
    ///
    /// let rows = RunTable::from_sequences(
    ///     Orientation::Horizontal, 2, 2, vec![vec![Run::new(0, 2)], vec![Run::new(0, 1)]],
    /// )?;
    /// let columns = RunTable::from_sequences(
    ///     Orientation::Vertical, 2, 2, vec![vec![Run::new(0, 2)], vec![Run::new(0, 1)]],
    /// )?;
    /// assert!(rows.same_pixels(&columns));
    /// assert_ne!(rows, columns);
    /// # Ok::<(), omr_glyphs::Error>(())
    /// ```
    pub fn same_pixels(&self, other: &RunTable) -> bool {
        if self.width != other.width || self.height != other.height {
            return false;
        }
        if self.orientation == other.orientation {
            return self.sequences == other.sequences;
        }

        // Equal weights plus inclusion
        self.weight() == other.weight()
            && self.iter_runs().all(|(line, run)| {
                (run.start()..=run.stop()).all(|coord| {
                    let p = self.orientation.absolute(line as i32, coord);
                    other.get(p.x, p.y)
                })
            })
    }

    /// Centroid of foreground pixels, for a table placed at `(left, top)`.
    ///
    /// Returns `None` for an empty table.
    pub fn centroid(&self, left: i32, top: i32) -> Option<PointF> {
        let mut weight = 0f64;
        let mut line_sum = 0f64;
        let mut coord_sum = 0f64;

        for (line, run) in self.iter_runs() {
            let n = run.length() as f64;
            weight += n;
            line_sum += n * line as f64;
            // Sum of start..=stop
            coord_sum += n * run.start() as f64 + n * (n - 1.0) / 2.0;
        }

        if weight == 0.0 {
            return None;
        }

        let (line_mean, coord_mean) = (line_sum / weight, coord_sum / weight);
        Some(match self.orientation {
            Orientation::Horizontal => PointF::new(left as f64 + coord_mean, top as f64 + line_mean),
            Orientation::Vertical => PointF::new(left as f64 + line_mean, top as f64 + coord_mean),
        })
    }

    /// Paint foreground pixels (as 0) into `buffer`, table origin at `offset`.
    ///
    /// Pixels falling outside the buffer are ignored.
    pub fn fill_buffer(&self, buffer: &mut GrayImage, offset: Point) {
        let (bw, bh) = (buffer.width() as i32, buffer.height() as i32);

        for (line, run) in self.iter_runs() {
            for coord in run.start()..=run.stop() {
                let p = self.orientation.absolute(line as i32, coord);
                let (x, y) = (p.x + offset.x, p.y + offset.y);
                if x >= 0 && y >= 0 && x < bw && y < bh {
                    buffer.put_pixel(x as u32, y as u32, Luma([0]));
                }
            }
        }
    }

    /// ASCII rendering, one text row per image row (`X` foreground, `-` background).
    pub fn dump_of(&self) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(if self.get(x, y) { 'X' } else { '-' });
            }
            out.push('\n');
        }
        out
    }
}

fn check_run(line: usize, run: &Run, previous: Option<&Run>, line_length: i32) -> Result<()> {
    if run.start() < 0 || run.length() <= 0 {
        return Err(Error::InvalidRun {
            line,
            start: run.start(),
            length: run.length(),
        });
    }

    if run.stop() >= line_length {
        return Err(Error::RunOutOfBounds {
            line,
            start: run.start(),
            stop: run.stop(),
            limit: line_length,
        });
    }

    if let Some(prev) = previous {
        // Runs are maximal: at least one background pixel must separate them
        if run.start() <= prev.stop() + 1 {
            return Err(Error::UnsortedRuns {
                line,
                start: run.start(),
                previous_stop: prev.stop(),
            });
        }
    }

    Ok(())
}
