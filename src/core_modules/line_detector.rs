// THEORY:
// The `LineDetector` is a cheap proxy for edge/line detection. Instead of a full
// gradient-based edge detector, it walks a sparse sampling grid and looks for
// bright-to-dark transitions along rows and columns:
//
// 1.  **Horizontal scan**: on every `stride`-th row, sample every `stride`-th
//     column. A sample brighter than `bright_threshold` opens a segment; while
//     open, the first sample darker than `dark_threshold` closes it and emits a
//     horizontal line. Scanning then continues for further segments on the row.
// 2.  **Vertical scan**: the same procedure over columns.
// 3.  **Diagonal synthesis**: once both scans are complete, every horizontal line
//     is paired with every vertical line whose start point is close on both
//     axes; the segment between the two start points becomes a diagonal if it is
//     long enough.
// 4.  **Length filter**: short lines are discarded.
//
// A frame with no sharp transitions yields an empty list. That is a legitimate
// "no leading-line evidence" result, not an error.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::config::LineScanConfig;
use crate::core_modules::frame::frame::Frame;
use crate::core_modules::geometry::{NormalizedPoint, distance};

/// A detected line segment in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: NormalizedPoint,
    pub end: NormalizedPoint,
    /// Radians; 0 is horizontal, pi/2 is vertical.
    pub angle: f64,
    /// Normalized length.
    pub length: f64,
}

impl Line {
    pub fn new(start: NormalizedPoint, end: NormalizedPoint, angle: f64, length: f64) -> Self {
        Self {
            start,
            end,
            angle,
            length,
        }
    }

    /// Whether the line's angle is within `tolerance` of any of `targets`.
    pub fn is_oriented(&self, targets: &[f64], tolerance: f64) -> bool {
        targets.iter().any(|t| (self.angle - t).abs() < tolerance)
    }
}

/// Detects horizontal, vertical and synthesized diagonal lines in a frame.
pub fn detect_lines(frame: &Frame, config: &LineScanConfig) -> Vec<Line> {
    let mut lines = scan_horizontal(frame, config);
    lines.extend(scan_vertical(frame, config));

    let diagonals = synthesize_diagonals(&lines, config);
    lines.extend(diagonals);

    lines.retain(|line| line.length > config.min_line_length);
    lines
}

/// Tracks one open bright segment along a scan line.
struct SegmentScanner {
    bright: f64,
    dark: f64,
    start: Option<u32>,
}

impl SegmentScanner {
    fn new(config: &LineScanConfig) -> Self {
        Self {
            bright: config.bright_threshold,
            dark: config.dark_threshold,
            start: None,
        }
    }

    /// Feeds one sample; returns `(start, end)` when a segment closes.
    fn feed(&mut self, position: u32, brightness: f64) -> Option<(u32, u32)> {
        match self.start {
            None if brightness > self.bright => {
                self.start = Some(position);
                None
            }
            Some(start) if brightness < self.dark => {
                self.start = None;
                Some((start, position))
            }
            _ => None,
        }
    }
}

fn scan_horizontal(frame: &Frame, config: &LineScanConfig) -> Vec<Line> {
    let (width, height) = (frame.width(), frame.height());
    let step = config.stride.max(1) as usize;
    let (w, h) = (width as f64, height as f64);
    let mut lines = Vec::new();

    for row in (0..height).step_by(step) {
        let mut scanner = SegmentScanner::new(config);
        for col in (0..width).step_by(step) {
            if let Some((start, end)) = scanner.feed(col, frame.brightness_at(col, row)) {
                let y = row as f64 / h;
                lines.push(Line::new(
                    NormalizedPoint::new(start as f64 / w, y),
                    NormalizedPoint::new(end as f64 / w, y),
                    0.0,
                    (end - start) as f64 / w,
                ));
            }
        }
    }

    lines
}

fn scan_vertical(frame: &Frame, config: &LineScanConfig) -> Vec<Line> {
    let (width, height) = (frame.width(), frame.height());
    let step = config.stride.max(1) as usize;
    let (w, h) = (width as f64, height as f64);
    let mut lines = Vec::new();

    for col in (0..width).step_by(step) {
        let mut scanner = SegmentScanner::new(config);
        for row in (0..height).step_by(step) {
            if let Some((start, end)) = scanner.feed(row, frame.brightness_at(col, row)) {
                let x = col as f64 / w;
                lines.push(Line::new(
                    NormalizedPoint::new(x, start as f64 / h),
                    NormalizedPoint::new(x, end as f64 / h),
                    FRAC_PI_2,
                    (end - start) as f64 / h,
                ));
            }
        }
    }

    lines
}

/// Pairs horizontal and vertical lines with nearby start points into diagonals.
///
/// Must run on the complete horizontal + vertical set.
pub fn synthesize_diagonals(lines: &[Line], config: &LineScanConfig) -> Vec<Line> {
    const AXIS_TOLERANCE: f64 = 0.2;
    let horizontal: Vec<&Line> = lines
        .iter()
        .filter(|l| l.is_oriented(&[0.0], AXIS_TOLERANCE))
        .collect();
    let vertical: Vec<&Line> = lines
        .iter()
        .filter(|l| l.is_oriented(&[FRAC_PI_2], AXIS_TOLERANCE))
        .collect();

    let mut diagonals = Vec::new();
    for h in &horizontal {
        for v in &vertical {
            let dx = (h.start.x - v.start.x).abs();
            let dy = (h.start.y - v.start.y).abs();
            if dx >= config.diagonal_pair_tolerance || dy >= config.diagonal_pair_tolerance {
                continue;
            }
            let length = distance(h.start, v.start);
            if length > config.min_diagonal_length {
                diagonals.push(Line::new(h.start, v.start, dy.atan2(dx), length));
            }
        }
    }
    diagonals
}
