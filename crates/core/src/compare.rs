//! Pixel comparison between a snapshot and its baseline

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::baseline::Baseline;
use crate::snapshot::Snapshot;

/// Per-channel difference below this is treated as rendering noise
/// (anti-aliasing, PNG compression) rather than a real pixel change.
pub const DEFAULT_CHANNEL_TOLERANCE: u8 = 5;

/// How many differing pixels a comparison may contain and still pass
///
/// An exact integer count, never a percentage. The boundary is inclusive:
/// a diff of exactly `max_diff_pixels` passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceSpec {
    pub max_diff_pixels: u64,
}

impl ToleranceSpec {
    pub fn new(max_diff_pixels: u64) -> Self {
        Self { max_diff_pixels }
    }
}

impl Default for ToleranceSpec {
    fn default() -> Self {
        Self { max_diff_pixels: 0 }
    }
}

/// Width/height disagreement between baseline and snapshot
///
/// An immediate failure; no pixel comparison is attempted. A baseline
/// captured under a different viewport lands here as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionMismatch {
    pub baseline: (u32, u32),
    pub snapshot: (u32, u32),
}

/// Outcome of comparing a snapshot against a baseline
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub passed: bool,
    pub diff_pixel_count: u64,
    pub total_pixels: u64,
    /// Differing pixels marked red on a dimmed copy of the snapshot.
    /// Present only when the comparison failed on pixel content.
    pub diff_image: Option<RgbaImage>,
    pub dimension_mismatch: Option<DimensionMismatch>,
}

impl ComparisonResult {
    /// Human-readable reason when the comparison did not pass
    pub fn failure_reason(&self, tolerance: ToleranceSpec) -> Option<String> {
        if self.passed {
            return None;
        }
        match self.dimension_mismatch {
            Some(m) => Some(format!(
                "dimension mismatch: baseline {}x{} vs snapshot {}x{}",
                m.baseline.0, m.baseline.1, m.snapshot.0, m.snapshot.1
            )),
            None => Some(format!(
                "{} pixels differ (max allowed: {})",
                self.diff_pixel_count, tolerance.max_diff_pixels
            )),
        }
    }
}

/// Compares snapshots to baselines pixel by pixel
#[derive(Debug, Clone, Copy)]
pub struct Comparator {
    channel_tolerance: u8,
}

impl Default for Comparator {
    fn default() -> Self {
        Self {
            channel_tolerance: DEFAULT_CHANNEL_TOLERANCE,
        }
    }
}

impl Comparator {
    pub fn new(channel_tolerance: u8) -> Self {
        Self { channel_tolerance }
    }

    /// Compare a fresh snapshot against an accepted baseline
    pub fn compare(
        &self,
        baseline: &Baseline,
        snapshot: &Snapshot,
        tolerance: ToleranceSpec,
    ) -> ComparisonResult {
        self.compare_images(baseline.image(), snapshot.image(), tolerance)
    }

    pub fn compare_images(
        &self,
        baseline: &RgbaImage,
        snapshot: &RgbaImage,
        tolerance: ToleranceSpec,
    ) -> ComparisonResult {
        if baseline.dimensions() != snapshot.dimensions() {
            return ComparisonResult {
                passed: false,
                diff_pixel_count: 0,
                total_pixels: 0,
                diff_image: None,
                dimension_mismatch: Some(DimensionMismatch {
                    baseline: baseline.dimensions(),
                    snapshot: snapshot.dimensions(),
                }),
            };
        }

        let (width, height) = snapshot.dimensions();
        let total_pixels = u64::from(width) * u64::from(height);

        // Identical buffers need no per-pixel walk
        if baseline.as_raw() == snapshot.as_raw() {
            debug!("buffers identical, skipping pixel walk");
            return ComparisonResult {
                passed: true,
                diff_pixel_count: 0,
                total_pixels,
                diff_image: None,
                dimension_mismatch: None,
            };
        }

        let mut diff_image = RgbaImage::new(width, height);
        let mut diff_pixel_count = 0u64;

        for y in 0..height {
            for x in 0..width {
                let actual = snapshot.get_pixel(x, y);
                let expected = baseline.get_pixel(x, y);

                if self.pixels_differ(actual, expected) {
                    diff_pixel_count += 1;
                    diff_image.put_pixel(x, y, Rgba([255, 0, 0, 255]));
                } else {
                    // Keep the original but dim it so the red stands out
                    let c = actual.0;
                    diff_image.put_pixel(x, y, Rgba([c[0] / 2, c[1] / 2, c[2] / 2, 128]));
                }
            }
        }

        let passed = diff_pixel_count <= tolerance.max_diff_pixels;

        ComparisonResult {
            passed,
            diff_pixel_count,
            total_pixels,
            diff_image: if passed { None } else { Some(diff_image) },
            dimension_mismatch: None,
        }
    }

    fn pixels_differ(&self, a: &Rgba<u8>, b: &Rgba<u8>) -> bool {
        let tolerance = i32::from(self.channel_tolerance);
        for i in 0..4 {
            let diff = (i32::from(a.0[i]) - i32::from(b.0[i])).abs();
            if diff > tolerance {
                return true;
            }
        }
        false
    }
}
