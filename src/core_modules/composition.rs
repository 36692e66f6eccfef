// THEORY:
// Static reference data: the closed catalogue of composition types the engine can
// recommend, their category, and the canonical anchor points ("key points") each
// type aligns subjects with. Nothing here changes at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core_modules::geometry::NormalizedPoint;

const ONE_THIRD: f64 = 1.0 / 3.0;
const TWO_THIRDS: f64 = 2.0 / 3.0;
/// 1 - 1/phi, the short side of a golden section.
const PHI_MINOR: f64 = 0.381_966_011_250_105;
/// 1/phi, the long side of a golden section.
const PHI_MAJOR: f64 = 0.618_033_988_749_895;

/// Positions of the rule-of-thirds grid lines, on either axis.
pub const THIRDS_LINES: [f64; 2] = [ONE_THIRD, TWO_THIRDS];

/// Rule-of-thirds grid intersections: top-left, top-right, bottom-left, bottom-right.
pub const THIRDS_POINTS: [NormalizedPoint; 4] = [
    NormalizedPoint::new(ONE_THIRD, ONE_THIRD),
    NormalizedPoint::new(TWO_THIRDS, ONE_THIRD),
    NormalizedPoint::new(ONE_THIRD, TWO_THIRDS),
    NormalizedPoint::new(TWO_THIRDS, TWO_THIRDS),
];

/// Golden-section grid intersections, same ordering as `THIRDS_POINTS`.
pub const GOLDEN_POINTS: [NormalizedPoint; 4] = [
    NormalizedPoint::new(PHI_MINOR, PHI_MINOR),
    NormalizedPoint::new(PHI_MAJOR, PHI_MINOR),
    NormalizedPoint::new(PHI_MINOR, PHI_MAJOR),
    NormalizedPoint::new(PHI_MAJOR, PHI_MAJOR),
];

const CENTER_POINT: [NormalizedPoint; 1] = [NormalizedPoint::CENTER];

/// Recommendations shown when a full analysis fails outright.
pub const FALLBACK_COMPOSITIONS: [CompositionType; 3] = [
    CompositionType::RuleOfThirds,
    CompositionType::Center,
    CompositionType::LeadingLines,
];

/// Grouping used by the guide picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositionCategory {
    Classic,
    Modern,
    Perspective,
}

/// A named visual arrangement heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompositionType {
    // Classic
    RuleOfThirds,
    Center,
    Diagonal,
    Frame,
    LeadingLines,
    SCurve,
    GoldenSpiral,
    // Modern
    GoldenTriangle,
    Symmetry,
    NegativeSpace,
    PatternRepeat,
    Tunnel,
    Split,
    Perspective,
    // Perspective
    InvisibleLine,
    FillFrame,
    LowAngle,
    HighAngle,
    DepthLayer,
}

impl CompositionType {
    /// Every composition type in declaration order.
    pub const ALL: [CompositionType; 19] = [
        Self::RuleOfThirds,
        Self::Center,
        Self::Diagonal,
        Self::Frame,
        Self::LeadingLines,
        Self::SCurve,
        Self::GoldenSpiral,
        Self::GoldenTriangle,
        Self::Symmetry,
        Self::NegativeSpace,
        Self::PatternRepeat,
        Self::Tunnel,
        Self::Split,
        Self::Perspective,
        Self::InvisibleLine,
        Self::FillFrame,
        Self::LowAngle,
        Self::HighAngle,
        Self::DepthLayer,
    ];

    pub fn category(&self) -> CompositionCategory {
        match self {
            Self::RuleOfThirds
            | Self::Center
            | Self::Diagonal
            | Self::Frame
            | Self::LeadingLines
            | Self::SCurve
            | Self::GoldenSpiral => CompositionCategory::Classic,
            Self::GoldenTriangle
            | Self::Symmetry
            | Self::NegativeSpace
            | Self::PatternRepeat
            | Self::Tunnel
            | Self::Split
            | Self::Perspective => CompositionCategory::Modern,
            Self::InvisibleLine
            | Self::FillFrame
            | Self::LowAngle
            | Self::HighAngle
            | Self::DepthLayer => CompositionCategory::Perspective,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::RuleOfThirds => "Rule of Thirds",
            Self::Center => "Center",
            Self::Diagonal => "Diagonal",
            Self::Frame => "Frame",
            Self::LeadingLines => "Leading Lines",
            Self::SCurve => "S-Curve",
            Self::GoldenSpiral => "Golden Spiral",
            Self::GoldenTriangle => "Golden Triangle",
            Self::Symmetry => "Symmetry",
            Self::NegativeSpace => "Negative Space",
            Self::PatternRepeat => "Pattern Repeat",
            Self::Tunnel => "Tunnel",
            Self::Split => "Split",
            Self::Perspective => "Perspective",
            Self::InvisibleLine => "Invisible Line",
            Self::FillFrame => "Fill the Frame",
            Self::LowAngle => "Low Angle",
            Self::HighAngle => "High Angle",
            Self::DepthLayer => "Depth Layers",
        }
    }

    /// Anchor points subjects are aligned with, in fixed order.
    ///
    /// Types that are defined by lines or framing rather than points have none.
    pub fn key_points(&self) -> &'static [NormalizedPoint] {
        match self {
            Self::RuleOfThirds => &THIRDS_POINTS,
            Self::GoldenSpiral | Self::GoldenTriangle => &GOLDEN_POINTS,
            Self::Center | Self::Symmetry => &CENTER_POINT,
            _ => &[],
        }
    }
}

impl fmt::Display for CompositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalogue_has_nineteen_unique_types() {
        let unique: HashSet<_> = CompositionType::ALL.iter().collect();
        assert_eq!(unique.len(), 19);
    }

    #[test]
    fn category_split_is_seven_seven_five() {
        let count = |c| {
            CompositionType::ALL
                .iter()
                .filter(|t| t.category() == c)
                .count()
        };
        assert_eq!(count(CompositionCategory::Classic), 7);
        assert_eq!(count(CompositionCategory::Modern), 7);
        assert_eq!(count(CompositionCategory::Perspective), 5);
    }

    #[test]
    fn thirds_key_points_are_ordered() {
        let points = CompositionType::RuleOfThirds.key_points();
        assert_eq!(points.len(), 4);
        assert!(points[0].x < points[1].x && points[0].y == points[1].y);
        assert!(points[0].y < points[2].y);
    }

    #[test]
    fn line_based_types_have_no_key_points() {
        assert!(CompositionType::LeadingLines.key_points().is_empty());
        assert!(CompositionType::Diagonal.key_points().is_empty());
        assert_eq!(CompositionType::Center.key_points(), &[NormalizedPoint::CENTER]);
    }
}
