// THEORY:
// The full recommender is a pure aggregation step. It never looks at pixels; it
// turns the evidence gathered by the analyzers (subjects, lines, image
// characteristics) into a short ranked list of composition types.
//
// Every rule is independent and names a (type, score) pair. Rules that name the
// same type are merged by keeping the maximum score, never by summing, so a type
// cannot be boosted past its strongest single piece of evidence. The scoreboard
// keeps first-insertion order, which makes the final stable sort deterministic
// when two types tie.
//
// Brightness classification always fires, so it is treated as background
// evidence: when no subject, line or symmetry rule fires, a default seed
// (RuleOfThirds 0.6, Center 0.5) is placed first and the brightness rule merges
// on top of it.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::RecommenderConfig;
use crate::core_modules::characteristics::{BrightnessDistribution, ImageCharacteristics};
use crate::core_modules::composition::{CompositionType, THIRDS_LINES};
use crate::core_modules::geometry::NormalizedPoint;
use crate::core_modules::line_detector::Line;
use crate::core_modules::subject_detector::{DetectedSubject, SubjectType};

const DEFAULT_SEED: [(CompositionType, f64); 2] = [
    (CompositionType::RuleOfThirds, 0.6),
    (CompositionType::Center, 0.5),
];

/// One ranked composition suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositionRecommendation {
    pub composition: CompositionType,
    /// Heuristic strength of evidence in `[0, 1]`.
    pub score: f64,
}

impl CompositionRecommendation {
    pub fn new(composition: CompositionType, score: f64) -> Self {
        Self { composition, score }
    }

    /// Score as a whole percentage for display.
    pub fn percentage(&self) -> u32 {
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// Insertion-ordered max-merge map keyed by composition type.
#[derive(Debug, Default)]
struct ScoreBoard {
    entries: Vec<CompositionRecommendation>,
}

impl ScoreBoard {
    fn merge(&mut self, composition: CompositionType, score: f64) {
        trace!(%composition, score, "Rule fired");
        match self.entries.iter_mut().find(|e| e.composition == composition) {
            Some(existing) => existing.score = existing.score.max(score),
            None => self
                .entries
                .push(CompositionRecommendation::new(composition, score)),
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn into_ranked(mut self, limit: usize) -> Vec<CompositionRecommendation> {
        // `sort_by` is stable, so ties keep insertion order.
        self.entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.entries.truncate(limit);
        self.entries
    }
}

/// Ranks composition types from the gathered evidence, best first.
///
/// Returns at most `config.max_recommendations` entries with unique types.
pub fn recommend_compositions(
    subjects: &[DetectedSubject],
    lines: &[Line],
    characteristics: &ImageCharacteristics,
    config: &RecommenderConfig,
) -> Vec<CompositionRecommendation> {
    let mut board = ScoreBoard::default();

    score_subjects(&mut board, subjects, config);
    score_lines(&mut board, lines, config);
    if characteristics.has_symmetry {
        board.merge(CompositionType::Center, 0.9);
    }

    if board.is_empty() && !characteristics.has_strong_leading_lines {
        for (composition, score) in DEFAULT_SEED {
            board.merge(composition, score);
        }
    }

    match characteristics.brightness_distribution {
        BrightnessDistribution::CenterWeighted => board.merge(CompositionType::Center, 0.7),
        BrightnessDistribution::Balanced => board.merge(CompositionType::RuleOfThirds, 0.75),
        BrightnessDistribution::LeftWeighted | BrightnessDistribution::RightWeighted => {
            board.merge(CompositionType::SCurve, 0.65)
        }
        BrightnessDistribution::CornerWeighted => board.merge(CompositionType::Frame, 0.7),
    }
    if characteristics.has_strong_leading_lines {
        board.merge(CompositionType::LeadingLines, 0.85);
    }

    board.into_ranked(config.max_recommendations)
}

fn score_subjects(board: &mut ScoreBoard, subjects: &[DetectedSubject], config: &RecommenderConfig) {
    for subject in subjects {
        let center = subject.bounding_box.center();

        if is_near_thirds_line(center, config.thirds_tolerance) {
            board.merge(CompositionType::RuleOfThirds, 0.9);
        }
        if is_centered(center, config.center_tolerance) {
            board.merge(CompositionType::Center, 0.85);
        }
        match subject.subject_type {
            SubjectType::Person | SubjectType::Animal => {
                board.merge(CompositionType::RuleOfThirds, 0.8)
            }
            SubjectType::Object => board.merge(CompositionType::Center, 0.75),
            _ => {}
        }
    }
}

/// True when either coordinate lies within `tolerance` of a thirds grid line.
fn is_near_thirds_line(p: NormalizedPoint, tolerance: f64) -> bool {
    THIRDS_LINES
        .iter()
        .any(|&line| (p.x - line).abs() < tolerance || (p.y - line).abs() < tolerance)
}

fn is_centered(p: NormalizedPoint, tolerance: f64) -> bool {
    (p.x - 0.5).abs() < tolerance && (p.y - 0.5).abs() < tolerance
}

fn score_lines(board: &mut ScoreBoard, lines: &[Line], config: &RecommenderConfig) {
    let tolerance = config.angle_tolerance;
    let count = |targets: &[f64]| lines.iter().filter(|l| l.is_oriented(targets, tolerance)).count();

    let horizontal = count(&[0.0, PI]);
    let vertical = count(&[FRAC_PI_2, -FRAC_PI_2]);
    let diagonal = count(&[FRAC_PI_4, -FRAC_PI_4]);

    if horizontal > 2 || vertical > 2 {
        board.merge(CompositionType::LeadingLines, 0.8);
    }
    if diagonal > 1 {
        board.merge(CompositionType::Diagonal, 0.75);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::geometry::NormalizedRect;
    use std::collections::HashSet;

    fn config() -> RecommenderConfig {
        RecommenderConfig::default()
    }

    fn balanced() -> ImageCharacteristics {
        ImageCharacteristics {
            color_harmony: 0.7,
            ..ImageCharacteristics::default()
        }
    }

    fn subject(rect: NormalizedRect, subject_type: SubjectType) -> DetectedSubject {
        DetectedSubject::new(rect, 0.9, subject_type)
    }

    fn line(angle: f64) -> Line {
        Line::new(NormalizedPoint::new(0.0, 0.0), NormalizedPoint::new(0.5, 0.5), angle, 0.5)
    }

    fn pairs(recs: &[CompositionRecommendation]) -> Vec<(CompositionType, f64)> {
        recs.iter().map(|r| (r.composition, r.score)).collect()
    }

    #[test]
    fn no_evidence_keeps_default_seed_under_brightness() {
        let recs = recommend_compositions(&[], &[], &balanced(), &config());
        assert_eq!(
            pairs(&recs),
            vec![
                (CompositionType::RuleOfThirds, 0.75),
                (CompositionType::Center, 0.5)
            ]
        );
    }

    #[test]
    fn subject_on_one_thirds_line_recommends_thirds() {
        // x = 0.2 is within 0.15 of the left grid line; y = 0.5 is on no line.
        let s = subject(NormalizedRect::new(0.15, 0.45, 0.25, 0.55), SubjectType::Unknown);
        let recs = recommend_compositions(&[s], &[], &balanced(), &config());
        assert_eq!(pairs(&recs), vec![(CompositionType::RuleOfThirds, 0.9)]);
    }

    #[test]
    fn subject_away_from_every_thirds_line_gets_no_thirds_boost() {
        let s = subject(NormalizedRect::new(0.45, 0.0, 0.55, 0.1), SubjectType::Unknown);
        let recs = recommend_compositions(&[s], &[], &balanced(), &config());
        // No subject rule fired, so the default seed is still applied.
        assert_eq!(
            pairs(&recs),
            vec![
                (CompositionType::RuleOfThirds, 0.75),
                (CompositionType::Center, 0.5)
            ]
        );
    }

    #[test]
    fn centered_subject_recommends_center() {
        let s = subject(NormalizedRect::new(0.45, 0.45, 0.55, 0.55), SubjectType::Unknown);
        let recs = recommend_compositions(&[s], &[], &balanced(), &config());
        let center = recs
            .iter()
            .find(|r| r.composition == CompositionType::Center)
            .unwrap();
        assert!(center.score >= 0.85);
    }

    #[test]
    fn merge_keeps_maximum_not_sum() {
        // Person on a thirds point (0.9), person type (0.8), balanced (0.75).
        let s = subject(NormalizedRect::new(0.28, 0.28, 0.38, 0.38), SubjectType::Person);
        let recs = recommend_compositions(&[s, s], &[], &balanced(), &config());
        assert_eq!(pairs(&recs), vec![(CompositionType::RuleOfThirds, 0.9)]);
    }

    #[test]
    fn object_and_symmetry_favor_center() {
        let s = subject(NormalizedRect::new(0.0, 0.0, 0.1, 0.1), SubjectType::Object);
        let characteristics = ImageCharacteristics {
            has_symmetry: true,
            brightness_distribution: BrightnessDistribution::RightWeighted,
            ..balanced()
        };
        let recs = recommend_compositions(&[s], &[], &characteristics, &config());
        assert_eq!(
            pairs(&recs),
            vec![(CompositionType::Center, 0.9), (CompositionType::SCurve, 0.65)]
        );
    }

    #[test]
    fn line_orientation_rules() {
        let lines = [line(0.0), line(0.05), line(PI), line(FRAC_PI_4), line(-FRAC_PI_4)];
        let recs = recommend_compositions(&[], &lines, &balanced(), &config());
        assert_eq!(
            pairs(&recs),
            vec![
                (CompositionType::LeadingLines, 0.8),
                (CompositionType::Diagonal, 0.75),
                (CompositionType::RuleOfThirds, 0.75),
            ]
        );
    }

    #[test]
    fn two_horizontal_lines_are_not_enough() {
        let lines = [line(0.0), line(0.0), line(FRAC_PI_2)];
        let recs = recommend_compositions(&[], &lines, &balanced(), &config());
        assert!(recs.iter().all(|r| r.composition != CompositionType::LeadingLines));
    }

    #[test]
    fn strong_leading_lines_and_corner_weighting() {
        let characteristics = ImageCharacteristics {
            has_strong_leading_lines: true,
            brightness_distribution: BrightnessDistribution::CornerWeighted,
            ..balanced()
        };
        let recs = recommend_compositions(&[], &[], &characteristics, &config());
        assert_eq!(
            pairs(&recs),
            vec![(CompositionType::LeadingLines, 0.85), (CompositionType::Frame, 0.7)]
        );
    }

    #[test]
    fn output_is_capped_sorted_bounded_and_unique() {
        let subjects = [
            subject(NormalizedRect::new(0.28, 0.28, 0.38, 0.38), SubjectType::Person),
            subject(NormalizedRect::new(0.45, 0.45, 0.55, 0.55), SubjectType::Object),
        ];
        let lines = [line(0.0), line(0.0), line(0.0), line(FRAC_PI_4), line(FRAC_PI_4)];
        let characteristics = ImageCharacteristics {
            has_strong_leading_lines: true,
            has_symmetry: true,
            brightness_distribution: BrightnessDistribution::LeftWeighted,
            ..balanced()
        };
        let mut config = config();
        config.max_recommendations = 3;

        let recs = recommend_compositions(&subjects, &lines, &characteristics, &config);
        assert_eq!(recs.len(), 3);
        assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(recs.iter().all(|r| (0.0..=1.0).contains(&r.score)));
        let unique: HashSet<_> = recs.iter().map(|r| r.composition).collect();
        assert_eq!(unique.len(), recs.len());
    }

    #[test]
    fn recommendation_is_deterministic() {
        let subjects = [subject(NormalizedRect::new(0.6, 0.2, 0.7, 0.4), SubjectType::Animal)];
        let lines = [line(FRAC_PI_2); 4];
        let first = recommend_compositions(&subjects, &lines, &balanced(), &config());
        for _ in 0..10 {
            assert_eq!(recommend_compositions(&subjects, &lines, &balanced(), &config()), first);
        }
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(CompositionRecommendation::new(CompositionType::Center, 0.856).percentage(), 86);
        assert_eq!(CompositionRecommendation::new(CompositionType::Center, 0.654).percentage(), 65);
        assert_eq!(CompositionRecommendation::new(CompositionType::Center, 1.0).percentage(), 100);
    }
}
