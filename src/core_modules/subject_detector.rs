// THEORY:
// The subject detector adapter is the boundary between this engine and whatever
// face / object / animal / text detector the host platform provides. The engine
// never detects anything itself. It asks an injected `SubjectDetector` for raw
// candidates per category, and turns them into the common `DetectedSubject` model:
//
// 1.  **Fan-out**: every configured category is queried concurrently. Results are
//     re-assembled in category order so the output is deterministic.
// 2.  **Graceful degradation**: a failing category is logged and treated as "no
//     candidates". The other categories, and the pixel analyzers, carry on.
// 3.  **Filtering**: candidates at or below their category's confidence threshold
//     are dropped. Faces always count as confidence 1.0 since face detectors only
//     report positives.
// 4.  **Deduplication**: a greedy overlap filter keeps at most one subject per
//     overlapping region, preferring the higher confidence.
//
// The detector is an explicitly owned resource. The caller builds it once and
// shares it through an `Arc`; nothing in this module caches a global client.

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::DetectionConfig;
use crate::core_modules::frame::frame::Frame;
use crate::core_modules::geometry::{NormalizedRect, overlap_ratio};
use crate::error::CompositionResult;

/// A detector query category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionCategory {
    Face,
    Animal,
    Object,
    Text,
}

impl DetectionCategory {
    /// All categories in the order they are queried by default (people first).
    pub const ALL: [DetectionCategory; 4] = [Self::Face, Self::Animal, Self::Object, Self::Text];

    pub fn subject_type(&self) -> SubjectType {
        match self {
            Self::Face => SubjectType::Person,
            Self::Animal => SubjectType::Animal,
            Self::Object => SubjectType::Object,
            Self::Text => SubjectType::Text,
        }
    }
}

/// What kind of thing a subject is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectType {
    Person,
    Animal,
    Object,
    Text,
    Landmark,
    Unknown,
}

/// A visual subject in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedSubject {
    pub bounding_box: NormalizedRect,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
    pub subject_type: SubjectType,
}

impl DetectedSubject {
    pub fn new(bounding_box: NormalizedRect, confidence: f64, subject_type: SubjectType) -> Self {
        Self {
            bounding_box,
            confidence,
            subject_type,
        }
    }
}

/// A raw candidate as reported by an external detector.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub bounding_box: NormalizedRect,
    pub confidence: f64,
    /// Classifier label, when the detector provides one.
    pub label: Option<String>,
}

impl RawDetection {
    pub fn new(bounding_box: NormalizedRect, confidence: f64) -> Self {
        Self {
            bounding_box,
            confidence,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// External subject detection capability.
///
/// Implementations wrap a platform detector (a face detector, an object
/// detection model, an OCR engine) and report normalized bounding boxes.
#[async_trait]
pub trait SubjectDetector: Send + Sync {
    /// Detect candidates of one category in a frame.
    async fn detect(
        &self,
        frame: &Frame,
        category: DetectionCategory,
    ) -> CompositionResult<Vec<RawDetection>>;

    /// Detector name for logging.
    fn name(&self) -> &'static str;
}

/// Detector used when no detection capability is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDetector;

#[async_trait]
impl SubjectDetector for NullDetector {
    async fn detect(
        &self,
        _frame: &Frame,
        _category: DetectionCategory,
    ) -> CompositionResult<Vec<RawDetection>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Normalizes, filters and deduplicates detector output.
pub struct SubjectDetectorAdapter<'a> {
    detector: &'a dyn SubjectDetector,
    config: &'a DetectionConfig,
}

impl<'a> SubjectDetectorAdapter<'a> {
    pub fn new(detector: &'a dyn SubjectDetector, config: &'a DetectionConfig) -> Self {
        Self { detector, config }
    }

    /// Detect subjects using the full (still image) category set.
    pub async fn detect_subjects(&self, frame: &Frame) -> Vec<DetectedSubject> {
        self.detect_categories(frame, &self.config.categories).await
    }

    /// Detect subjects using the cheaper live-frame category set.
    pub async fn detect_live_subjects(&self, frame: &Frame) -> Vec<DetectedSubject> {
        self.detect_categories(frame, &self.config.live_categories)
            .await
    }

    /// Query `categories` concurrently and merge the results in category order.
    pub async fn detect_categories(
        &self,
        frame: &Frame,
        categories: &[DetectionCategory],
    ) -> Vec<DetectedSubject> {
        let queries: Vec<_> = categories
            .iter()
            .map(|&category| async move { (category, self.detector.detect(frame, category).await) })
            .collect();

        let mut subjects = Vec::new();
        for (category, result) in join_all(queries).await {
            match result {
                Ok(raw) => {
                    let before = subjects.len();
                    subjects.extend(self.normalize(category, raw));
                    debug!(
                        detector = self.detector.name(),
                        ?category,
                        accepted = subjects.len() - before,
                        "Detector category completed"
                    );
                }
                Err(e) => {
                    warn!(
                        detector = self.detector.name(),
                        ?category,
                        error = %e,
                        "Detector category failed, treating as no subjects"
                    );
                }
            }
        }

        deduplicate_subjects(subjects, self.config.overlap_threshold)
    }

    /// Apply the category threshold and map raw candidates to subjects.
    pub fn normalize(
        &self,
        category: DetectionCategory,
        raw: Vec<RawDetection>,
    ) -> impl Iterator<Item = DetectedSubject> + '_ {
        raw.into_iter().filter_map(move |candidate| {
            let confidence = match category {
                DetectionCategory::Face => 1.0,
                DetectionCategory::Animal
                    if candidate.confidence > self.config.animal_threshold =>
                {
                    candidate.confidence
                }
                DetectionCategory::Object
                    if candidate.confidence > self.config.object_threshold =>
                {
                    candidate.confidence
                }
                DetectionCategory::Text if candidate.confidence > self.config.text_threshold => {
                    candidate.confidence
                }
                _ => {
                    trace!(
                        ?category,
                        label = ?candidate.label,
                        confidence = candidate.confidence,
                        "Candidate below category threshold"
                    );
                    return None;
                }
            };
            trace!(?category, label = ?candidate.label, confidence, "Candidate accepted");
            Some(DetectedSubject::new(
                candidate.bounding_box,
                confidence,
                category.subject_type(),
            ))
        })
    }
}

/// Greedy overlap filter over subjects in detection order.
///
/// A subject overlapping (ratio above `overlap_threshold`) one or more accepted
/// subjects replaces them only when its confidence is strictly higher than all of
/// them; otherwise it is dropped. Non-overlapping subjects are appended. No two
/// surviving subjects overlap above the threshold.
pub fn deduplicate_subjects(
    subjects: Vec<DetectedSubject>,
    overlap_threshold: f64,
) -> Vec<DetectedSubject> {
    let mut accepted: Vec<DetectedSubject> = Vec::with_capacity(subjects.len());

    for subject in subjects {
        let overlapping: Vec<usize> = accepted
            .iter()
            .enumerate()
            .filter(|(_, existing)| {
                overlap_ratio(&subject.bounding_box, &existing.bounding_box) > overlap_threshold
            })
            .map(|(i, _)| i)
            .collect();

        let Some(&first) = overlapping.first() else {
            accepted.push(subject);
            continue;
        };

        let beats_all = overlapping
            .iter()
            .all(|&i| subject.confidence > accepted[i].confidence);
        if beats_all {
            accepted[first] = subject;
            // Indices are ascending; remove from the back so earlier ones stay valid.
            for &i in overlapping[1..].iter().rev() {
                accepted.remove(i);
            }
        }
    }

    accepted
}
