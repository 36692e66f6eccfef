// THEORY:
// Every heuristic in the analysis engine is driven by a small set of fixed
// constants (scan strides, brightness cut-offs, distance tolerances). They are
// gathered here as named, serializable fields so they can be tested and tuned
// independently of the algorithms that consume them. The `Default` of each
// group holds the values the heuristics were tuned with.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core_modules::subject_detector::DetectionCategory;
use crate::error::{CompositionError, CompositionResult};

/// Complete configuration for the composition analysis engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub lines: LineScanConfig,
    pub brightness: BrightnessConfig,
    pub symmetry: SymmetryConfig,
    pub detection: DetectionConfig,
    pub recommender: RecommenderConfig,
    pub lightweight: LightweightConfig,
    pub throttle: ThrottleConfig,
    pub batch: BatchConfig,
}

impl AnalysisConfig {
    /// Rejects values that would make an analyzer loop forever or divide by zero.
    pub fn validate(&self) -> CompositionResult<()> {
        if self.lines.stride == 0 {
            return Err(CompositionError::invalid_config("lines.stride must be > 0"));
        }
        if self.brightness.stride == 0 {
            return Err(CompositionError::invalid_config("brightness.stride must be > 0"));
        }
        if self.lines.dark_threshold >= self.lines.bright_threshold {
            return Err(CompositionError::invalid_config(
                "lines.dark_threshold must be below lines.bright_threshold",
            ));
        }
        if self.brightness.left_bound >= self.brightness.right_bound {
            return Err(CompositionError::invalid_config(
                "brightness.left_bound must be below brightness.right_bound",
            ));
        }
        for (name, value) in [
            ("detection.animal_threshold", self.detection.animal_threshold),
            ("detection.object_threshold", self.detection.object_threshold),
            ("detection.text_threshold", self.detection.text_threshold),
            ("detection.overlap_threshold", self.detection.overlap_threshold),
            ("lightweight.fallback_score", self.lightweight.fallback_score),
            ("lightweight.diagonal_score", self.lightweight.diagonal_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CompositionError::invalid_config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.recommender.max_recommendations == 0 {
            return Err(CompositionError::invalid_config(
                "recommender.max_recommendations must be > 0",
            ));
        }
        if self.throttle.interval.is_zero() {
            return Err(CompositionError::invalid_config("throttle.interval must be > 0"));
        }
        if self.batch.max_concurrency == Some(0) {
            return Err(CompositionError::invalid_config("batch.max_concurrency must be > 0"));
        }
        Ok(())
    }
}

/// Parameters of the thresholded brightness line scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineScanConfig {
    /// Sampling step in pixels for both rows and columns.
    pub stride: u32,
    /// A sample brighter than this opens a segment.
    pub bright_threshold: f64,
    /// A sample darker than this closes an open segment.
    pub dark_threshold: f64,
    /// Max start-point distance (per axis) for pairing a horizontal and a vertical line.
    pub diagonal_pair_tolerance: f64,
    /// A synthesized diagonal must be longer than this.
    pub min_diagonal_length: f64,
    /// Every returned line must be longer than this.
    pub min_line_length: f64,
}

impl Default for LineScanConfig {
    fn default() -> Self {
        Self {
            stride: 10,
            bright_threshold: 200.0,
            dark_threshold: 50.0,
            diagonal_pair_tolerance: 0.15,
            min_diagonal_length: 0.2,
            min_line_length: 0.1,
        }
    }
}

/// Parameters of the regional brightness classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessConfig {
    pub stride: u32,
    /// Normalized x at or below which a sample belongs to the left bucket.
    pub left_bound: f64,
    /// Normalized x at or above which a sample belongs to the right bucket.
    pub right_bound: f64,
    /// Minimum mean-brightness gap between buckets.
    pub threshold: f64,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            stride: 20,
            left_bound: 0.3,
            right_bound: 0.7,
            threshold: 30.0,
        }
    }
}

/// Parameters of the left/right mirror comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymmetryConfig {
    /// Rows compared, counted from the top.
    pub max_rows: u32,
    /// Columns compared per half, counted from the outer edge.
    pub max_columns: u32,
    /// Mean absolute brightness difference below which the image is symmetric.
    pub max_mean_difference: f64,
}

impl Default for SymmetryConfig {
    fn default() -> Self {
        Self {
            max_rows: 500,
            max_columns: 250,
            max_mean_difference: 20.0,
        }
    }
}

/// Parameters of the subject detector adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Categories queried for full (still image) analysis, in priority order.
    pub categories: Vec<DetectionCategory>,
    /// Categories queried for lightweight (live frame) analysis.
    pub live_categories: Vec<DetectionCategory>,
    pub animal_threshold: f64,
    pub object_threshold: f64,
    pub text_threshold: f64,
    /// Overlap ratio above which two subjects are considered duplicates.
    pub overlap_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            categories: DetectionCategory::ALL.to_vec(),
            live_categories: vec![DetectionCategory::Face, DetectionCategory::Object],
            animal_threshold: 0.6,
            object_threshold: 0.7,
            text_threshold: 0.8,
            overlap_threshold: 0.3,
        }
    }
}

/// Parameters of the full composition recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Per-axis distance from a thirds grid line for a "thirds" subject.
    pub thirds_tolerance: f64,
    /// Per-axis distance from the frame center for a "centered" subject.
    pub center_tolerance: f64,
    /// Angle tolerance in radians for classifying a line's orientation.
    pub angle_tolerance: f64,
    pub max_recommendations: usize,
    /// Number of detected lines above which an image has strong leading lines.
    pub strong_leading_lines_count: usize,
    /// Reported colour harmony; no colour analysis backs this value yet.
    pub color_harmony: f64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            thirds_tolerance: 0.15,
            center_tolerance: 0.1,
            angle_tolerance: 0.2,
            max_recommendations: 5,
            strong_leading_lines_count: 3,
            color_harmony: 0.7,
        }
    }
}

/// Parameters of the lightweight live-frame recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightweightConfig {
    pub center_threshold: f64,
    pub thirds_threshold: f64,
    pub diagonal_threshold: f64,
    pub diagonal_score: f64,
    /// Score used when no candidate beats it; also the floor for any winner.
    pub fallback_score: f64,
    /// Confidence reported when no subject is visible.
    pub empty_score: f64,
    /// Per-axis offset below which no movement hint is produced.
    pub hint_tolerance: f64,
    /// Also consider FillFrame / NegativeSpace from the main subject's size.
    pub area_candidates: bool,
    pub fill_frame_area: f64,
    pub negative_space_area: f64,
}

impl Default for LightweightConfig {
    fn default() -> Self {
        Self {
            center_threshold: 0.12,
            thirds_threshold: 0.15,
            diagonal_threshold: 0.1,
            diagonal_score: 0.7,
            fallback_score: 0.3,
            empty_score: 0.5,
            hint_tolerance: 0.03,
            area_candidates: false,
            fill_frame_area: 0.6,
            negative_space_area: 0.15,
        }
    }
}

/// Caller-side rate limit for live frame analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2500),
        }
    }
}

/// Concurrency limit for batch still-image analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// `None` uses one worker per logical CPU.
    pub max_concurrency: Option<usize>,
}

impl BatchConfig {
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(num_cpus::get).max(1)
    }
}
