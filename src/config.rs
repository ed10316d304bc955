//! Configuration for glyph formation and compound search.
//!
//! Every section has sensible defaults, so a JSON file only needs the values
//! it overrides:
//!
//! ```json
//! { "links": { "max_gap": 3.0 }, "log_level": "Debug" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::glyph::links::check_gap;
use crate::glyph::{BoxDistance, ChamferDistance, GlyphDistance, SeedOrder};
use crate::run::{Orientation, RunTableFactory, DEFAULT_FOREGROUND_THRESHOLD};

/// Logging detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    /// Only critical errors are logged
    Error,
    /// Warnings and errors are logged
    Warn,
    /// General information (default level)
    #[default]
    Info,
    /// Per-stage summaries (labeling, links, cluster searches)
    Debug,
    /// Very detailed trace information (each subset, each registration)
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Image binarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizationConfig {
    /// Pixels with luminance at or below this value are foreground
    pub foreground_threshold: u8,
    /// Scan direction of extracted runs
    pub orientation: Orientation,
}

impl Default for BinarizationConfig {
    fn default() -> Self {
        Self {
            foreground_threshold: DEFAULT_FOREGROUND_THRESHOLD,
            orientation: Orientation::Horizontal,
        }
    }
}

impl BinarizationConfig {
    /// Run extractor for these settings.
    pub fn factory(&self) -> RunTableFactory {
        RunTableFactory::new(self.orientation).with_threshold(self.foreground_threshold)
    }
}

/// Distance metric between glyph parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Metric {
    /// Nearest foreground pixels (chamfer approximation)
    #[default]
    Chamfer,
    /// Gap between bounding boxes
    Box,
}

/// Neighbor graph construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Maximum gap between linked parts, in pixels
    pub max_gap: f64,
    /// Distance metric
    pub metric: Metric,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            max_gap: 2.0,
            metric: Metric::Chamfer,
        }
    }
}

impl LinksConfig {
    /// Instantiate the configured metric.
    pub fn distance(&self) -> Box<dyn GlyphDistance> {
        match self.metric {
            Metric::Chamfer => Box::new(ChamferDistance::new(self.max_gap)),
            Metric::Box => Box::new(BoxDistance),
        }
    }
}

/// Weight and size range of acceptable compounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompoundLimits {
    /// Minimum weight, in pixels
    pub min_weight: u32,
    /// Maximum weight, in pixels
    pub max_weight: u32,
    /// Minimum box width
    pub min_width: i32,
    /// Maximum box width
    pub max_width: i32,
    /// Minimum box height
    pub min_height: i32,
    /// Maximum box height
    pub max_height: i32,
}

impl Default for CompoundLimits {
    fn default() -> Self {
        Self {
            min_weight: 0,
            max_weight: u32::MAX,
            min_width: 0,
            max_width: i32::MAX,
            min_height: 0,
            max_height: i32::MAX,
        }
    }
}

impl CompoundLimits {
    /// Set the weight range.
    pub fn with_weight(mut self, min: u32, max: u32) -> Self {
        self.min_weight = min;
        self.max_weight = max;
        self
    }

    /// Set the width range.
    pub fn with_width(mut self, min: i32, max: i32) -> Self {
        self.min_width = min;
        self.max_width = max;
        self
    }

    /// Set the height range.
    pub fn with_height(mut self, min: i32, max: i32) -> Self {
        self.min_height = min;
        self.max_height = max;
        self
    }

    /// Report whether `weight` lies in the weight range.
    pub fn is_weight_acceptable(&self, weight: u32) -> bool {
        (self.min_weight..=self.max_weight).contains(&weight)
    }

    /// Report whether `bounds` does not exceed the maximum size.
    ///
    /// Minimum sizes are not checked, a growing compound may still reach them.
    pub fn is_size_acceptable(&self, bounds: &Rect) -> bool {
        bounds.width <= self.max_width && bounds.height <= self.max_height
    }

    /// Report whether `bounds` lies within both size ranges.
    pub fn is_size_valid(&self, bounds: &Rect) -> bool {
        self.is_size_acceptable(bounds)
            && bounds.width >= self.min_width
            && bounds.height >= self.min_height
    }

    /// Check that no range is inverted.
    pub fn validate(&self) -> Result<()> {
        if self.min_weight > self.max_weight {
            return Err(Error::InvalidInput(format!(
                "weight range {}..={} is inverted",
                self.min_weight, self.max_weight
            )));
        }
        if self.min_width > self.max_width || self.min_height > self.max_height {
            return Err(Error::InvalidInput(format!(
                "size range {}x{}..={}x{} is inverted",
                self.min_width, self.min_height, self.max_width, self.max_height
            )));
        }
        Ok(())
    }
}

/// Cluster search settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Order of seeds
    pub seed_order: SeedOrder,
    /// Maximum number of parts in one compound (None = unbounded)
    pub max_parts: Option<usize>,
    /// Maximum number of evaluations per decomposition (None = unbounded)
    pub max_evaluations: Option<usize>,
}

impl SearchConfig {
    /// Set the seed order.
    pub fn with_seed_order(mut self, seed_order: SeedOrder) -> Self {
        self.seed_order = seed_order;
        self
    }

    /// Cap the number of parts per compound.
    pub fn with_max_parts(mut self, max_parts: Option<usize>) -> Self {
        self.max_parts = max_parts;
        self
    }

    /// Cap the number of evaluations per decomposition.
    pub fn with_max_evaluations(mut self, max_evaluations: Option<usize>) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }
}

/// Shape classification settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum grade of a retained evaluation
    pub min_grade: f64,
    /// Number of top evaluations examined
    pub max_eval_rank: usize,
    /// Staff interline, in pixels
    pub interline: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_grade: 0.5,
            max_eval_rank: 3,
            interline: 20.0,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphConfig {
    /// Image binarization
    pub binarization: BinarizationConfig,
    /// Neighbor graph
    pub links: LinksConfig,
    /// Compound limits
    pub limits: CompoundLimits,
    /// Cluster search
    pub search: SearchConfig,
    /// Shape classification
    pub classifier: ClassifierConfig,
    /// Logging level
    pub log_level: LogLevel,
}

impl GlyphConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the foreground threshold.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.binarization.foreground_threshold = threshold;
        self
    }

    /// Set the scan orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.binarization.orientation = orientation;
        self
    }

    /// Set the maximum link gap.
    pub fn with_max_gap(mut self, max_gap: f64) -> Self {
        self.links.max_gap = max_gap;
        self
    }

    /// Set the link metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.links.metric = metric;
        self
    }

    /// Set the compound limits.
    pub fn with_limits(mut self, limits: CompoundLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the search settings.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Set the classifier settings.
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the logging level.
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: GlyphConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value consistency.
    pub fn validate(&self) -> Result<()> {
        check_gap(self.links.max_gap).map_err(Error::InvalidInput)?;
        if !(self.classifier.interline > 0.0) {
            return Err(Error::InvalidInput(format!(
                "interline must be positive, got {}",
                self.classifier.interline
            )));
        }
        if self.search.max_parts == Some(0) {
            return Err(Error::InvalidInput("max_parts must be at least 1".to_string()));
        }
        self.limits.validate()
    }
}
