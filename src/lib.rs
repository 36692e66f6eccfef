// THEORY:
// This file is the main entry point for the `composition_guide` library crate.
// It exposes the `CompositionPipeline` (full still-image analysis and lightweight
// live-frame analysis), the batch and live execution policies built on top of
// it, and the data structures they return.
//
// The engine never renders anything and never detects subjects itself. A host
// app injects a `SubjectDetector`, hands over frames, and draws whichever
// composition overlay the ranked recommendations suggest. The analysis layers in
// `core_modules` are public so each heuristic can be used and tested on its own.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::AnalysisConfig;
pub use core_modules::characteristics::{BrightnessDistribution, ImageCharacteristics};
pub use core_modules::composition::{CompositionCategory, CompositionType, FALLBACK_COMPOSITIONS};
pub use core_modules::frame::frame::Frame;
pub use core_modules::frame_recommender::{Direction, FrameAnalysisResult};
pub use core_modules::geometry::{NormalizedPoint, NormalizedRect};
pub use core_modules::line_detector::Line;
pub use core_modules::recommender::CompositionRecommendation;
pub use core_modules::subject_detector::{
    DetectedSubject, DetectionCategory, NullDetector, RawDetection, SubjectDetector, SubjectType,
};
pub use error::{CompositionError, CompositionResult};
pub use parallel_pipeline::{BatchPipeline, FrameThrottle, LiveFramePipeline};
pub use pipeline::{CompositionAnalysis, CompositionPipeline};
