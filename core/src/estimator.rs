//! Online estimate of the sender's unit length.
//!
//! Each observed gap or tone is first banded against the current reference
//! unit to decide which canonical multiple it represents. Samples outside
//! every band are discarded; the rest are reduced to a single-unit estimate
//! and folded in with exponential smoothing, then clamped around the
//! caller's nominal unit.

use crate::types::{is_duration, Millis};
use tracing::trace;

// Gap bands, as ratios of the reference unit
const GAP_INTRA_MIN_RATIO: f64 = 0.5;
const GAP_INTRA_MAX_RATIO: f64 = 2.2;
const GAP_CHAR_MAX_RATIO: f64 = 4.5;
const GAP_WORD_MAX_RATIO: f64 = 14.0;

// Tone bands
const TONE_DOT_MAX_RATIO: f64 = 2.0;
const TONE_DASH_MAX_RATIO: f64 = 4.0;
const DASH_UNITS: f64 = 3.0;

pub const GAP_ALPHA: f64 = 0.25;
pub const TONE_ALPHA: f64 = 0.2;

// Clamp window relative to the nominal unit
const CLAMP_FLOOR_MS: f64 = 20.0;
const CLAMP_MIN_FACTOR: f64 = 0.6;
const CLAMP_MAX_FACTOR: f64 = 2.4;

#[derive(Debug, Clone, PartialEq)]
pub struct UnitEstimator {
    /// 0.0 until the first sample is accepted
    unit_estimate_ms: Millis,
    char_gap_units: u32,
    word_gap_units: u32,
}

impl Default for UnitEstimator {
    fn default() -> Self {
        Self::new(3, 10)
    }
}

impl UnitEstimator {
    pub fn new(char_gap_units: u32, word_gap_units: u32) -> Self {
        Self {
            unit_estimate_ms: 0.0,
            char_gap_units,
            word_gap_units,
        }
    }

    pub fn reset(&mut self) {
        self.unit_estimate_ms = 0.0;
    }

    pub fn is_set(&self) -> bool {
        self.unit_estimate_ms > 0.0
    }

    /// Raw estimate, 0.0 when nothing has been observed yet
    pub fn raw_ms(&self) -> Millis {
        self.unit_estimate_ms
    }

    /// Current estimate, or `fallback_unit_ms` when none has been formed
    pub fn get(&self, fallback_unit_ms: Millis) -> Millis {
        if self.is_set() {
            self.unit_estimate_ms
        } else {
            fallback_unit_ms
        }
    }

    pub fn char_gap_ms(&self, fallback_unit_ms: Millis) -> Millis {
        self.get(fallback_unit_ms) * self.char_gap_units as f64
    }

    pub fn word_gap_ms(&self, fallback_unit_ms: Millis) -> Millis {
        self.get(fallback_unit_ms) * self.word_gap_units as f64
    }

    fn base(&self, fallback_unit_ms: Millis) -> Option<Millis> {
        let base = self.get(fallback_unit_ms);
        is_duration(base).then_some(base)
    }

    /// Fold in an observed silence. Returns the updated estimate, or `None`
    /// when the gap fell outside every band and was ignored.
    pub fn update_from_gap(
        &mut self,
        gap_ms: Millis,
        fallback_unit_ms: Millis,
    ) -> Option<Millis> {
        if !is_duration(gap_ms) {
            return None;
        }
        let base = self.base(fallback_unit_ms)?;
        let ratio = gap_ms / base;
        let estimate = if (GAP_INTRA_MIN_RATIO..=GAP_INTRA_MAX_RATIO).contains(&ratio) {
            gap_ms
        } else if ratio > GAP_INTRA_MAX_RATIO && ratio <= GAP_CHAR_MAX_RATIO {
            gap_ms / self.char_gap_units as f64
        } else if ratio > GAP_CHAR_MAX_RATIO && ratio <= GAP_WORD_MAX_RATIO {
            gap_ms / self.word_gap_units as f64
        } else {
            trace!(gap_ms, ratio, "gap outside estimation bands");
            return None;
        };
        Some(self.apply(estimate, GAP_ALPHA, fallback_unit_ms))
    }

    /// Fold in an observed tone. Returns the updated estimate, or `None`
    /// when the tone was too long to be a dot or a dash.
    pub fn update_from_tone(
        &mut self,
        tone_ms: Millis,
        fallback_unit_ms: Millis,
    ) -> Option<Millis> {
        if !is_duration(tone_ms) {
            return None;
        }
        let base = self.base(fallback_unit_ms)?;
        let ratio = tone_ms / base;
        let estimate = if ratio <= TONE_DOT_MAX_RATIO {
            tone_ms
        } else if ratio <= TONE_DASH_MAX_RATIO {
            tone_ms / DASH_UNITS
        } else {
            trace!(tone_ms, ratio, "tone outside estimation bands");
            return None;
        };
        Some(self.apply(estimate, TONE_ALPHA, fallback_unit_ms))
    }

    /// Smooth a single-unit estimate into the running value and clamp it to
    /// `[max(20, 0.6 * fallback), 2.4 * fallback]` when a fallback is known.
    pub fn apply(&mut self, estimate_ms: Millis, alpha: f64, fallback_unit_ms: Millis) -> Millis {
        if !is_duration(estimate_ms) {
            return self.unit_estimate_ms;
        }
        let mut next = if self.is_set() {
            self.unit_estimate_ms * (1.0 - alpha) + estimate_ms * alpha
        } else {
            estimate_ms
        };
        if is_duration(fallback_unit_ms) {
            let min_unit = CLAMP_FLOOR_MS.max(fallback_unit_ms * CLAMP_MIN_FACTOR);
            let max_unit = fallback_unit_ms * CLAMP_MAX_FACTOR;
            // max-then-min rather than clamp(): min_unit can exceed max_unit
            // for nominal units below ~8 ms
            next = next.max(min_unit).min(max_unit);
        }
        trace!(estimate_ms, alpha, next, "unit estimate updated");
        self.unit_estimate_ms = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_non_finite_samples_are_ignored() {
        let mut estimator = UnitEstimator::default();
        assert_eq!(estimator.update_from_gap(f64::NAN, 60.0), None);
        assert_eq!(estimator.update_from_tone(f64::INFINITY, 60.0), None);
        assert_eq!(estimator.apply(f64::NAN, GAP_ALPHA, 60.0), 0.0);
        assert!(!estimator.is_set());

        // No usable reference unit either
        assert_eq!(estimator.update_from_gap(60.0, f64::NAN), None);
        assert!(!estimator.is_set());

        assert_eq!(estimator.update_from_gap(60.0, 60.0), Some(60.0));
        assert_eq!(estimator.update_from_tone(f64::NAN, 60.0), None);
        assert_close(estimator.raw_ms(), 60.0);
    }

    #[test]
    fn test_first_gap_sets_estimate_directly() {
        let mut estimator = UnitEstimator::default();
        assert!(!estimator.is_set());
        assert_eq!(estimator.get(60.0), 60.0);

        assert_eq!(estimator.update_from_gap(66.0, 60.0), Some(66.0));
        assert_eq!(estimator.get(60.0), 66.0);
    }

    #[test]
    fn test_gap_bands() {
        let mut estimator = UnitEstimator::default();
        // Character gap: 180 / 3
        assert_eq!(estimator.update_from_gap(180.0, 60.0), Some(60.0));

        let mut estimator = UnitEstimator::default();
        // Word gap: 600 / 10
        assert_eq!(estimator.update_from_gap(600.0, 60.0), Some(60.0));

        let mut estimator = UnitEstimator::default();
        // Exactly 2.2x stays in the intra-character band
        assert_eq!(estimator.update_from_gap(132.0, 60.0), Some(132.0));

        let mut estimator = UnitEstimator::default();
        // Exactly 4.5x is still a character gap
        assert_eq!(estimator.update_from_gap(270.0, 60.0), Some(90.0));
    }

    #[test]
    fn test_out_of_band_gaps_are_ignored() {
        let mut estimator = UnitEstimator::default();
        assert_eq!(estimator.update_from_gap(29.0, 60.0), None);
        assert_eq!(estimator.update_from_gap(841.0, 60.0), None);
        assert_eq!(estimator.update_from_gap(0.0, 60.0), None);
        assert_eq!(estimator.update_from_gap(-5.0, 60.0), None);
        assert!(!estimator.is_set());
    }

    #[test]
    fn test_no_reference_means_no_update() {
        let mut estimator = UnitEstimator::default();
        assert_eq!(estimator.update_from_gap(60.0, 0.0), None);
        assert_eq!(estimator.update_from_tone(60.0, 0.0), None);
    }

    #[test]
    fn test_smoothing_weights() {
        let mut estimator = UnitEstimator::default();
        estimator.update_from_gap(60.0, 60.0);
        // 60 * 0.75 + 80 * 0.25
        assert_close(estimator.update_from_gap(80.0, 60.0).unwrap(), 65.0);
        // 65 * 0.8 + 75 * 0.2
        assert_close(estimator.update_from_tone(75.0, 60.0).unwrap(), 67.0);
    }

    #[test]
    fn test_tone_bands() {
        let mut estimator = UnitEstimator::default();
        assert_eq!(estimator.update_from_tone(120.0, 60.0), Some(120.0));

        let mut estimator = UnitEstimator::default();
        assert_eq!(estimator.update_from_tone(180.0, 60.0), Some(60.0));

        let mut estimator = UnitEstimator::default();
        assert_eq!(estimator.update_from_tone(241.0, 60.0), None);
    }

    #[test]
    fn test_clamping() {
        let mut estimator = UnitEstimator::default();
        // First sample lands below 0.6 * 60
        estimator.apply(10.0, GAP_ALPHA, 60.0);
        assert_eq!(estimator.raw_ms(), 36.0);

        estimator.apply(1_000.0, GAP_ALPHA, 60.0);
        assert_eq!(estimator.raw_ms(), 144.0);

        // 20 ms floor dominates for very fast nominal units
        let mut estimator = UnitEstimator::default();
        estimator.apply(5.0, GAP_ALPHA, 25.0);
        assert_eq!(estimator.raw_ms(), 20.0);
    }

    #[test]
    fn test_no_clamp_without_fallback() {
        let mut estimator = UnitEstimator::default();
        estimator.apply(5.0, GAP_ALPHA, 0.0);
        assert_eq!(estimator.raw_ms(), 5.0);
    }

    #[test]
    fn test_gap_multiples() {
        let mut estimator = UnitEstimator::default();
        assert_eq!(estimator.char_gap_ms(50.0), 150.0);
        assert_eq!(estimator.word_gap_ms(50.0), 500.0);
        estimator.update_from_gap(80.0, 60.0);
        assert_eq!(estimator.char_gap_ms(50.0), 240.0);
        assert_eq!(estimator.word_gap_ms(50.0), 800.0);
    }
}
