// THEORY:
// The `pipeline` module is the top-level API of the composition engine. It wires
// the analysis layers into the two entry points a camera app needs:
//
// 1.  **Full analysis** (`analyze`): for a still image. Subject detection, line
//     detection and the pixel statistics run concurrently over the same
//     read-only `Arc<Frame>`; the two pixel passes are CPU bound and go to the
//     blocking pool. Once all three have joined, the characteristics are derived
//     and the full recommender ranks the composition types.
// 2.  **Lightweight analysis** (`analyze_frame`): for one live preview frame.
//     Only the cheap detector categories are queried and only subject position
//     is scored.
//
// Analysis is all-or-nothing per call: either a complete `CompositionAnalysis`
// is returned or an error is. `analyze_or_fallback` turns any error into the
// fixed fallback recommendation set so a UI always has something to show.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::core_modules::characteristics::{ImageCharacteristics, analyze_pixels, characterize};
use crate::core_modules::composition::{CompositionType, FALLBACK_COMPOSITIONS};
use crate::core_modules::frame::frame::Frame;
use crate::core_modules::frame_recommender::{FrameAnalysisResult, recommend_for_frame};
use crate::core_modules::line_detector::{Line, detect_lines};
use crate::core_modules::recommender::{CompositionRecommendation, recommend_compositions};
use crate::core_modules::subject_detector::{
    DetectedSubject, SubjectDetector, SubjectDetectorAdapter,
};
use crate::error::{CompositionError, CompositionResult};

/// The result of a full still-image analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionAnalysis {
    /// Best first.
    pub recommended_compositions: Vec<CompositionType>,
    pub confidence_scores: HashMap<CompositionType, f64>,
    pub detected_subjects: Vec<DetectedSubject>,
    pub detected_lines: Vec<Line>,
    pub image_characteristics: ImageCharacteristics,
}

impl CompositionAnalysis {
    fn from_recommendations(
        recommendations: &[CompositionRecommendation],
        detected_subjects: Vec<DetectedSubject>,
        detected_lines: Vec<Line>,
        image_characteristics: ImageCharacteristics,
    ) -> Self {
        Self {
            recommended_compositions: recommendations.iter().map(|r| r.composition).collect(),
            confidence_scores: recommendations
                .iter()
                .map(|r| (r.composition, r.score))
                .collect(),
            detected_subjects,
            detected_lines,
            image_characteristics,
        }
    }

    /// The fixed recommendation set shown when analysis fails outright.
    pub fn fallback() -> Self {
        Self {
            recommended_compositions: FALLBACK_COMPOSITIONS.to_vec(),
            confidence_scores: HashMap::new(),
            detected_subjects: Vec::new(),
            detected_lines: Vec::new(),
            image_characteristics: ImageCharacteristics::default(),
        }
    }

    /// The composition a UI should select first.
    pub fn primary(&self) -> CompositionType {
        self.recommended_compositions
            .first()
            .copied()
            .unwrap_or(CompositionType::RuleOfThirds)
    }

    /// Recommendations with their scores, best first. Types without a score report 0.
    pub fn ranked(&self) -> Vec<CompositionRecommendation> {
        self.recommended_compositions
            .iter()
            .map(|&composition| {
                let score = self.confidence_scores.get(&composition).copied().unwrap_or(0.0);
                CompositionRecommendation::new(composition, score)
            })
            .collect()
    }
}

/// The main entry point of the composition engine.
///
/// Cheap to clone; the detector is shared.
#[derive(Clone)]
pub struct CompositionPipeline {
    detector: Arc<dyn SubjectDetector>,
    config: AnalysisConfig,
}

impl CompositionPipeline {
    pub fn new(detector: Arc<dyn SubjectDetector>, config: AnalysisConfig) -> CompositionResult<Self> {
        config.validate()?;
        info!(detector = detector.name(), "Composition pipeline ready");
        Ok(Self { detector, config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Full analysis of a still image.
    pub async fn analyze(&self, frame: impl Into<Arc<Frame>>) -> CompositionResult<CompositionAnalysis> {
        let frame: Arc<Frame> = frame.into();
        let started = Instant::now();
        let adapter = SubjectDetectorAdapter::new(self.detector.as_ref(), &self.config.detection);

        let line_task = {
            let frame = Arc::clone(&frame);
            let config = self.config.lines.clone();
            tokio::task::spawn_blocking(move || detect_lines(&frame, &config))
        };
        let pixel_task = {
            let frame = Arc::clone(&frame);
            let brightness = self.config.brightness.clone();
            let symmetry = self.config.symmetry.clone();
            tokio::task::spawn_blocking(move || analyze_pixels(&frame, &brightness, &symmetry))
        };

        let (subjects, lines, stats) =
            tokio::join!(adapter.detect_subjects(&frame), line_task, pixel_task);
        let lines = lines
            .map_err(|e| CompositionError::internal(format!("line detection task failed: {e}")))?;
        let stats = stats
            .map_err(|e| CompositionError::internal(format!("pixel statistics task failed: {e}")))?;

        let characteristics = characterize(stats, &subjects, &lines, &self.config.recommender);
        let recommendations =
            recommend_compositions(&subjects, &lines, &characteristics, &self.config.recommender);

        debug!(
            width = frame.width(),
            height = frame.height(),
            subjects = subjects.len(),
            lines = lines.len(),
            recommendations = recommendations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Full analysis completed"
        );

        Ok(CompositionAnalysis::from_recommendations(
            &recommendations,
            subjects,
            lines,
            characteristics,
        ))
    }

    pub async fn analyze_image(&self, image: &DynamicImage) -> CompositionResult<CompositionAnalysis> {
        let frame = Frame::from_image(image)?;
        self.analyze(frame).await
    }

    /// Decodes and analyzes an encoded image; fails with `InvalidImage` before any analysis.
    pub async fn analyze_bytes(&self, bytes: &[u8]) -> CompositionResult<CompositionAnalysis> {
        let frame = Frame::decode(bytes)?;
        self.analyze(frame).await
    }

    /// Like `analyze_bytes`, but any failure yields `CompositionAnalysis::fallback()`.
    pub async fn analyze_or_fallback(&self, bytes: &[u8]) -> CompositionAnalysis {
        match self.analyze_bytes(bytes).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "Composition analysis failed, using fallback recommendations");
                CompositionAnalysis::fallback()
            }
        }
    }

    /// Lightweight analysis of one live frame.
    pub async fn analyze_frame(&self, frame: &Frame) -> FrameAnalysisResult {
        let adapter = SubjectDetectorAdapter::new(self.detector.as_ref(), &self.config.detection);
        let subjects = adapter.detect_live_subjects(frame).await;
        let result = recommend_for_frame(&subjects, &self.config.lightweight);
        debug!(
            subjects = subjects.len(),
            recommended = %result.recommended_type,
            confidence = result.confidence,
            "Frame analysis completed"
        );
        result
    }
}
