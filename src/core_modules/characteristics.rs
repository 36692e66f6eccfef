// THEORY:
// The characteristics analyzer summarizes whole-image properties that the full
// recommender uses as weak evidence. It has two pixel passes and one derivation:
//
// 1.  **Brightness distribution**: a sparse grid (`stride` px on both axes) is
//     bucketed by normalized x into left / center / right thirds-ish regions and
//     the mean brightness per bucket decides where the light "weight" sits.
// 2.  **Symmetry**: the top rows are compared against their horizontal mirror.
//     Rows and columns are capped so the cost stays bounded on 24 MP stills;
//     the trade-off is that symmetry in the lower part of a very tall image is
//     not observed.
// 3.  **Characterize**: the two pixel results are combined with the subject and
//     line evidence into one `ImageCharacteristics` value.
//
// The pixel passes only depend on the frame, so the pipeline runs them off the
// async executor while subject detection is in flight.

use serde::{Deserialize, Serialize};

use crate::config::{BrightnessConfig, RecommenderConfig, SymmetryConfig};
use crate::core_modules::frame::frame::Frame;
use crate::core_modules::geometry::NormalizedPoint;
use crate::core_modules::line_detector::Line;
use crate::core_modules::subject_detector::DetectedSubject;

/// Where the brightness of an image is concentrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrightnessDistribution {
    CenterWeighted,
    Balanced,
    LeftWeighted,
    RightWeighted,
    /// Never produced by `analyze_brightness`; callers may construct it.
    CornerWeighted,
}

/// Whole-image evidence consumed by the full recommender.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageCharacteristics {
    pub has_strong_leading_lines: bool,
    pub has_symmetry: bool,
    /// Center of the highest-priority subject, or the frame center.
    pub main_subject_position: NormalizedPoint,
    pub brightness_distribution: BrightnessDistribution,
    pub color_harmony: f64,
}

impl Default for ImageCharacteristics {
    fn default() -> Self {
        Self {
            has_strong_leading_lines: false,
            has_symmetry: false,
            main_subject_position: NormalizedPoint::CENTER,
            brightness_distribution: BrightnessDistribution::Balanced,
            color_harmony: 0.0,
        }
    }
}

/// Results of the pixel-level passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelStatistics {
    pub brightness_distribution: BrightnessDistribution,
    pub has_symmetry: bool,
}

/// Runs both pixel passes over a frame.
pub fn analyze_pixels(
    frame: &Frame,
    brightness: &BrightnessConfig,
    symmetry: &SymmetryConfig,
) -> PixelStatistics {
    PixelStatistics {
        brightness_distribution: analyze_brightness(frame, brightness),
        has_symmetry: detect_symmetry(frame, symmetry),
    }
}

#[derive(Default)]
struct Bucket {
    sum: f64,
    count: u32,
}

impl Bucket {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Classifies where the brightness of the frame is concentrated.
pub fn analyze_brightness(frame: &Frame, config: &BrightnessConfig) -> BrightnessDistribution {
    let step = config.stride.max(1) as usize;
    let width = frame.width() as f64;
    let (mut left, mut center, mut right) = (Bucket::default(), Bucket::default(), Bucket::default());

    for y in (0..frame.height()).step_by(step) {
        for x in (0..frame.width()).step_by(step) {
            let nx = x as f64 / width;
            let value = frame.brightness_at(x, y);
            if nx <= config.left_bound {
                left.add(value);
            } else if nx < config.right_bound {
                center.add(value);
            } else {
                right.add(value);
            }
        }
    }

    let (Some(left), Some(center), Some(right)) = (left.mean(), center.mean(), right.mean())
    else {
        return BrightnessDistribution::Balanced;
    };
    classify_brightness(left, center, right, config.threshold)
}

fn classify_brightness(left: f64, center: f64, right: f64, threshold: f64) -> BrightnessDistribution {
    if center > left + threshold && center > right + threshold {
        BrightnessDistribution::CenterWeighted
    } else if (left - right).abs() < threshold {
        BrightnessDistribution::Balanced
    } else if left > right + threshold {
        BrightnessDistribution::LeftWeighted
    } else {
        BrightnessDistribution::RightWeighted
    }
}

/// Whether the frame is (approximately) left-right mirror symmetric.
///
/// A frame too narrow to compare any column pair is not symmetric.
pub fn detect_symmetry(frame: &Frame, config: &SymmetryConfig) -> bool {
    let width = frame.width();
    let rows = frame.height().min(config.max_rows);
    let columns = (width / 2).min(config.max_columns);

    let mut total = 0.0;
    let mut compared = 0u64;
    for y in 0..rows {
        for x in 0..columns {
            let left = frame.brightness_at(x, y);
            let right = frame.brightness_at(width - 1 - x, y);
            total += (left - right).abs();
            compared += 1;
        }
    }

    compared > 0 && total / (compared as f64) < config.max_mean_difference
}

/// Combines pixel statistics with subject and line evidence.
pub fn characterize(
    stats: PixelStatistics,
    subjects: &[DetectedSubject],
    lines: &[Line],
    config: &RecommenderConfig,
) -> ImageCharacteristics {
    ImageCharacteristics {
        has_strong_leading_lines: lines.len() > config.strong_leading_lines_count,
        has_symmetry: stats.has_symmetry,
        main_subject_position: subjects
            .first()
            .map(|s| s.bounding_box.center())
            .unwrap_or(NormalizedPoint::CENTER),
        brightness_distribution: stats.brightness_distribution,
        color_harmony: config.color_harmony,
    }
}
