// THEORY:
// The frame recommender is the live-preview counterpart of the full recommender.
// It is called on a throttled camera stream, so it ignores lines, brightness and
// symmetry and works from the position of a single "main subject" (the largest
// detected box):
//
// 1.  **Candidates**: Center, RuleOfThirds and Diagonal are scored from the main
//     subject's center, in that priority order. The single best score wins; ties
//     go to the earlier candidate.
// 2.  **Floor**: when no candidate qualifies, or the winner scores below the
//     fallback score, the answer becomes RuleOfThirds at the fallback score.
// 3.  **Guidance**: a short hint tells the user which way to move the subject
//     toward the winning anchor. Offsets within a small tolerance produce no hint.
//
// The recommender holds no state. Rate limiting and "one frame in flight" are
// enforced by the caller's throttle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::LightweightConfig;
use crate::core_modules::composition::{CompositionType, THIRDS_POINTS};
use crate::core_modules::geometry::{NormalizedPoint, distance, nearest_key_point};
use crate::core_modules::subject_detector::DetectedSubject;

pub const NO_SUBJECT_HINT: &str = "no subject detected";

const ONE_THIRD: f64 = 1.0 / 3.0;
const TWO_THIRDS: f64 = 2.0 / 3.0;

/// A screen-relative movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Left => "move left",
            Self::Right => "move right",
            Self::Up => "move up",
            Self::Down => "move down",
        };
        f.write_str(text)
    }
}

/// The lightweight answer for one live frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysisResult {
    pub recommended_type: CompositionType,
    pub confidence: f64,
    pub detected_subjects: Vec<DetectedSubject>,
    pub guidance_hint: Option<String>,
}

/// Directions that move `from` toward `to`, horizontal first.
pub fn guidance(from: NormalizedPoint, to: NormalizedPoint, tolerance: f64) -> Vec<Direction> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let mut directions = Vec::with_capacity(2);
    if dx.abs() > tolerance {
        directions.push(if dx > 0.0 { Direction::Right } else { Direction::Left });
    }
    if dy.abs() > tolerance {
        directions.push(if dy > 0.0 { Direction::Down } else { Direction::Up });
    }
    directions
}

/// Renders directions as `"move right, move down"`; `None` when already in place.
pub fn render_hint(directions: &[Direction]) -> Option<String> {
    if directions.is_empty() {
        return None;
    }
    let parts: Vec<String> = directions.iter().map(Direction::to_string).collect();
    Some(parts.join(", "))
}

struct Candidate {
    composition: CompositionType,
    score: f64,
    /// Where the subject should move to; `None` means anywhere is fine.
    target: Option<NormalizedPoint>,
}

/// Picks one composition for a live frame from subject positions only.
pub fn recommend_for_frame(
    subjects: &[DetectedSubject],
    config: &LightweightConfig,
) -> FrameAnalysisResult {
    let Some(main) = main_subject(subjects) else {
        return FrameAnalysisResult {
            recommended_type: CompositionType::RuleOfThirds,
            confidence: config.empty_score,
            detected_subjects: Vec::new(),
            guidance_hint: Some(NO_SUBJECT_HINT.to_string()),
        };
    };

    let center = main.bounding_box.center();
    let (nearest_third, third_distance) = nearest_key_point(center, &THIRDS_POINTS)
        .unwrap_or((THIRDS_POINTS[0], distance(center, THIRDS_POINTS[0])));

    let mut best: Option<Candidate> = None;
    let mut offer = |candidate: Candidate| {
        if best.as_ref().is_none_or(|current| candidate.score > current.score) {
            best = Some(candidate);
        }
    };

    let center_distance = distance(center, NormalizedPoint::CENTER);
    if center_distance < config.center_threshold {
        offer(Candidate {
            composition: CompositionType::Center,
            score: (1.0 - center_distance / config.center_threshold).clamp(0.0, 1.0),
            target: Some(NormalizedPoint::CENTER),
        });
    }

    if third_distance < config.thirds_threshold {
        offer(Candidate {
            composition: CompositionType::RuleOfThirds,
            score: (1.0 - third_distance / config.thirds_threshold).clamp(0.0, 1.0),
            target: Some(nearest_third),
        });
    }

    if let Some(projection) = diagonal_projection(center, config.diagonal_threshold) {
        offer(Candidate {
            composition: CompositionType::Diagonal,
            score: config.diagonal_score,
            target: Some(projection),
        });
    }

    if config.area_candidates {
        let area = main.bounding_box.area();
        if area > config.fill_frame_area {
            offer(Candidate {
                composition: CompositionType::FillFrame,
                score: (area / 0.85).min(1.0) * 0.85,
                target: None,
            });
        }
        if area < config.negative_space_area {
            offer(Candidate {
                composition: CompositionType::NegativeSpace,
                score: 0.7,
                target: None,
            });
        }
    }

    let winner = match best {
        Some(candidate) if candidate.score >= config.fallback_score => candidate,
        _ => Candidate {
            composition: CompositionType::RuleOfThirds,
            score: config.fallback_score,
            target: Some(nearest_third),
        },
    };

    let guidance_hint = winner
        .target
        .and_then(|target| render_hint(&guidance(center, target, config.hint_tolerance)));

    FrameAnalysisResult {
        recommended_type: winner.composition,
        confidence: winner.score,
        detected_subjects: subjects.to_vec(),
        guidance_hint,
    }
}

/// The largest subject by box area; the first one wins ties.
fn main_subject(subjects: &[DetectedSubject]) -> Option<&DetectedSubject> {
    subjects.iter().fold(None, |best, s| match best {
        Some(b) if s.bounding_box.area() <= b.bounding_box.area() => Some(b),
        _ => Some(s),
    })
}

/// The nearest point on either frame diagonal, when `p` is close enough to it.
///
/// A subject inside a corner cell of the thirds grid is not treated as a
/// diagonal placement: moving it to the nearest thirds point is the better
/// suggestion there.
fn diagonal_projection(p: NormalizedPoint, threshold: f64) -> Option<NormalizedPoint> {
    let in_outer_column = p.x < ONE_THIRD || p.x > TWO_THIRDS;
    let in_outer_row = p.y < ONE_THIRD || p.y > TWO_THIRDS;
    // Corner points such as (0.2, 0.2) lie on a diagonal but must still be steered to a thirds point.
    if in_outer_column && in_outer_row {
        return None;
    }

    let main = (p.x - p.y).abs();
    let anti = (p.x - (1.0 - p.y)).abs();
    if main.min(anti) >= threshold {
        return None;
    }
    if main <= anti {
        let t = (p.x + p.y) / 2.0;
        Some(NormalizedPoint::new(t, t))
    } else {
        let t = (p.x - p.y + 1.0) / 2.0;
        Some(NormalizedPoint::new(t, 1.0 - t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::geometry::NormalizedRect;
    use crate::core_modules::subject_detector::SubjectType;

    fn centered_at(x: f64, y: f64, half: f64) -> DetectedSubject {
        DetectedSubject::new(
            NormalizedRect::new(x - half, y - half, x + half, y + half),
            0.9,
            SubjectType::Person,
        )
    }

    fn config() -> LightweightConfig {
        LightweightConfig::default()
    }

    #[test]
    fn no_subject_recommends_thirds_with_hint() {
        let result = recommend_for_frame(&[], &config());
        assert_eq!(result.recommended_type, CompositionType::RuleOfThirds);
        assert_eq!(result.confidence, 0.5);
        assert!(result.detected_subjects.is_empty());
        assert_eq!(result.guidance_hint.as_deref(), Some(NO_SUBJECT_HINT));
    }

    #[test]
    fn centered_subject_recommends_center_without_hint() {
        let result = recommend_for_frame(&[centered_at(0.5, 0.5, 0.05)], &config());
        assert_eq!(result.recommended_type, CompositionType::Center);
        assert!((result.confidence - 1.0).abs() < 1e-9);
        assert_eq!(result.guidance_hint, None);
    }

    #[test]
    fn subject_near_top_left_corner_falls_back_to_thirds() {
        let result = recommend_for_frame(&[centered_at(0.2, 0.2, 0.05)], &config());
        assert_eq!(result.recommended_type, CompositionType::RuleOfThirds);
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.guidance_hint.as_deref(), Some("move right, move down"));
    }

    #[test]
    fn subject_on_anti_diagonal_in_corner_cell_falls_back_to_thirds() {
        // Exactly on the anti-diagonal, inside the bottom-left corner cell.
        let result = recommend_for_frame(&[centered_at(0.25, 0.75, 0.05)], &config());
        assert_eq!(result.recommended_type, CompositionType::RuleOfThirds);
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.guidance_hint.as_deref(), Some("move right, move up"));
    }

    #[test]
    fn subject_near_thirds_point_gets_small_correction() {
        // 0.05 right and 0.05 below the bottom-right thirds point.
        let result = recommend_for_frame(&[centered_at(0.7167, 0.7167, 0.05)], &config());
        assert_eq!(result.recommended_type, CompositionType::RuleOfThirds);
        assert!(result.confidence > 0.3 && result.confidence < 1.0);
        assert_eq!(result.guidance_hint.as_deref(), Some("move left, move up"));
    }

    #[test]
    fn subject_on_diagonal_in_middle_band() {
        // On the anti-diagonal, inside the middle row of the thirds grid, far
        // enough from both the center and the thirds points.
        let result = recommend_for_frame(&[centered_at(0.6, 0.42, 0.02)], &config());
        assert_eq!(result.recommended_type, CompositionType::Diagonal);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn largest_subject_drives_the_result() {
        let small = centered_at(0.5, 0.5, 0.02);
        let large = centered_at(0.2, 0.8, 0.1);
        let result = recommend_for_frame(&[small, large], &config());
        assert_eq!(result.recommended_type, CompositionType::RuleOfThirds);
        assert_eq!(result.detected_subjects.len(), 2);
        assert_eq!(result.guidance_hint.as_deref(), Some("move right, move up"));
    }

    #[test]
    fn area_candidates_are_opt_in() {
        let huge = centered_at(0.2, 0.2, 0.45);
        let tiny = centered_at(0.9, 0.1, 0.01);

        let off = recommend_for_frame(&[huge], &config());
        assert_eq!(off.recommended_type, CompositionType::RuleOfThirds);

        let mut on = config();
        on.area_candidates = true;
        let fill = recommend_for_frame(&[huge], &on);
        assert_eq!(fill.recommended_type, CompositionType::FillFrame);
        assert!((fill.confidence - 0.81 / 0.85 * 0.85).abs() < 1e-9);
        assert_eq!(fill.guidance_hint, None);

        let space = recommend_for_frame(&[tiny], &on);
        assert_eq!(space.recommended_type, CompositionType::NegativeSpace);
        assert_eq!(space.confidence, 0.7);
    }

    #[test]
    fn guidance_respects_tolerance() {
        let here = NormalizedPoint::new(0.5, 0.5);
        assert!(guidance(here, NormalizedPoint::new(0.52, 0.48), 0.03).is_empty());
        assert_eq!(
            guidance(here, NormalizedPoint::new(0.4, 0.6), 0.03),
            vec![Direction::Left, Direction::Down]
        );
        assert_eq!(render_hint(&[]), None);
        assert_eq!(render_hint(&[Direction::Up]).as_deref(), Some("move up"));
    }

    #[test]
    fn projection_lands_on_the_nearest_diagonal() {
        let p = diagonal_projection(NormalizedPoint::new(0.45, 0.5), 0.1).unwrap();
        assert!((p.x - 0.475).abs() < 1e-9 && (p.y - 0.475).abs() < 1e-9);
        assert!(diagonal_projection(NormalizedPoint::new(0.9, 0.9), 0.1).is_none());
        assert!(diagonal_projection(NormalizedPoint::new(0.5, 0.2), 0.1).is_none());
    }
}
