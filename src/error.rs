//! Error types for glyph formation and compound assembly.
//!
//! Only precondition violations and collaborator failures are errors. Business-rule
//! non-matches (no neighbor, weight out of range, classifier rejection) are reported
//! by the absence of a result, never through this type.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while labeling or assembling glyphs.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)] // "Invalid" prefix is intentional for clarity
pub enum Error {
    /// Run with a negative start or a non-positive length
    #[error("Invalid run on line {line}: start {start}, length {length}")]
    InvalidRun {
        /// Index of the scan line
        line: usize,
        /// Start offset of the offending run
        start: i32,
        /// Length of the offending run
        length: i32,
    },

    /// Runs of one line are not sorted, overlap, or touch each other
    #[error("Unsorted runs on line {line}: run at {start} does not follow previous stop {previous_stop}")]
    UnsortedRuns {
        /// Index of the scan line
        line: usize,
        /// Start offset of the offending run
        start: i32,
        /// Stop offset (inclusive) of the preceding run
        previous_stop: i32,
    },

    /// Run or line lying outside the table dimensions
    #[error("Run out of bounds on line {line}: [{start}, {stop}] exceeds line length {limit}")]
    RunOutOfBounds {
        /// Index of the scan line
        line: usize,
        /// Start offset of the offending run
        start: i32,
        /// Stop offset (inclusive) of the offending run
        stop: i32,
        /// Line length, or line count when the line index itself is out of range
        limit: i32,
    },

    /// Generic precondition violation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Shape evaluator failure, propagated untouched
    #[error("Shape evaluator error: {0}")]
    Evaluator(String),

    /// Distance metric failure, propagated untouched
    #[error("Distance metric error: {0}")]
    Distance(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Configuration (JSON) error
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
