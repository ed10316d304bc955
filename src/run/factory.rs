//! Run extraction from a raster.

use image::GrayImage;

use crate::run::{Orientation, Run, RunTable};

/// Default luminance threshold: darker pixels are foreground.
pub const DEFAULT_FOREGROUND_THRESHOLD: u8 = 127;

/// Builds a [`RunTable`] out of a gray image.
///
/// A pixel is foreground when its luminance is at most the threshold, which
/// matches black ink on white paper.
#[derive(Debug, Clone, Copy)]
pub struct RunTableFactory {
    orientation: Orientation,
    foreground_threshold: u8,
}

impl RunTableFactory {
    /// Create a factory scanning along the given orientation.
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            foreground_threshold: DEFAULT_FOREGROUND_THRESHOLD,
        }
    }

    /// Set the foreground luminance threshold.
    pub fn with_threshold(mut self, foreground_threshold: u8) -> Self {
        self.foreground_threshold = foreground_threshold;
        self
    }

    /// Scan orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Extract maximal foreground runs from `image`.
    ///
    /// # Examples
    ///
    /// ```
    /// use image::{GrayImage, Luma};
    /// use omr_glyphs::run::{Orientation, RunTableFactory};
    ///
    /// let mut img = GrayImage::from_pixel(4, 1, Luma([255]));
    /// img.put_pixel(1, 0, Luma([0]));
    /// img.put_pixel(2, 0, Luma([0]));
    ///
    /// let table = RunTableFactory::new(Orientation::Horizontal).create_table(&img);
    /// assert_eq!(table.dump_of(), "-XX-\n");
    /// ```
    pub fn create_table(&self, image: &GrayImage) -> RunTable {
        let (width, height) = (image.width() as i32, image.height() as i32);
        let line_count = self.orientation.line_count(width, height);
        let line_length = self.orientation.line_length(width, height);
        let mut sequences = Vec::with_capacity(line_count as usize);

        for line in 0..line_count {
            let mut runs = Vec::new();
            let mut start: Option<i32> = None;

            for coord in 0..line_length {
                let p = self.orientation.absolute(line, coord);
                let fore = image.get_pixel(p.x as u32, p.y as u32).0[0] <= self.foreground_threshold;

                match (fore, start) {
                    (true, None) => start = Some(coord),
                    (false, Some(s)) => {
                        runs.push(Run::new(s, coord - s));
                        start = None;
                    },
                    _ => {},
                }
            }

            if let Some(s) = start {
                runs.push(Run::new(s, line_length - s));
            }

            sequences.push(runs);
        }

        log::trace!(
            "Extracted {:?} run table {}x{} ({} lines)",
            self.orientation,
            width,
            height,
            line_count
        );

        // Runs produced above are maximal, sorted and in bounds by construction
        RunTable::from_raw_parts(self.orientation, width, height, sequences)
    }
}

impl Default for RunTableFactory {
    fn default() -> Self {
        Self::new(Orientation::Horizontal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn image_from_rows(rows: &[&str]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        GrayImage::from_fn(width, height, |x, y| {
            if rows[y as usize].as_bytes()[x as usize] == b'X' {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn test_horizontal_extraction() {
        let img = image_from_rows(&["XX-XX", "-----", "XXXXX"]);
        let table = RunTableFactory::new(Orientation::Horizontal).create_table(&img);
        assert_eq!(table.sequence(0), &[Run::new(0, 2), Run::new(3, 2)]);
        assert!(table.sequence(1).is_empty());
        assert_eq!(table.sequence(2), &[Run::new(0, 5)]);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_vertical_extraction() {
        let img = image_from_rows(&["X-", "X-", "-X"]);
        let table = RunTableFactory::new(Orientation::Vertical).create_table(&img);
        assert_eq!(table.size(), 2);
        assert_eq!(table.sequence(0), &[Run::new(0, 2)]);
        assert_eq!(table.sequence(1), &[Run::new(2, 1)]);
        assert_eq!(table.dump_of(), "X-\nX-\n-X\n");
    }

    #[test]
    fn test_threshold() {
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([(x * 100) as u8]));
        let strict = RunTableFactory::new(Orientation::Horizontal)
            .with_threshold(50)
            .create_table(&img);
        assert_eq!(strict.weight(), 1);
        let loose = RunTableFactory::new(Orientation::Horizontal)
            .with_threshold(150)
            .create_table(&img);
        assert_eq!(loose.weight(), 2);
    }

    #[test]
    fn test_empty_image() {
        let img = GrayImage::new(0, 0);
        let table = RunTableFactory::default().create_table(&img);
        assert!(table.is_empty());
        assert_eq!(table.size(), 0);
    }
}
