//! Unsupervised dot/dash classification for raw tone lengths.
//!
//! Recent tones are split into two clusters with a deterministic 1-D
//! two-means pass; the midpoint of the centroids separates dots from dashes.
//! With too few samples the threshold falls back to twice the nominal unit.

use std::collections::VecDeque;

use crate::estimator::{UnitEstimator, GAP_ALPHA};
use crate::types::{is_duration, Mark, MarkClassification, Millis};
use tracing::trace;

pub const TONE_HISTORY_LIMIT: usize = 20;
pub const MIN_CLUSTER_SAMPLES: usize = 6;
const KMEANS_ITERATIONS: usize = 8;
const FALLBACK_THRESHOLD_UNITS: f64 = 2.0;
const DASH_UNITS: f64 = 3.0;

/// Bounded FIFO of recent raw tone lengths
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToneHistory {
    tones: VecDeque<Millis>,
}

impl ToneHistory {
    pub fn push(&mut self, tone_ms: Millis) {
        if !is_duration(tone_ms) {
            return;
        }
        self.tones.push_back(tone_ms);
        while self.tones.len() > TONE_HISTORY_LIMIT {
            self.tones.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }

    pub fn clear(&mut self) {
        self.tones.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Millis> {
        self.tones.iter()
    }
}

/// Two-means split of `samples`, returning the ordered centroids.
///
/// Centroids are seeded at the minimum and maximum; ties go to the lower
/// cluster. An empty cluster keeps its previous centroid.
pub fn two_means(samples: &[Millis]) -> Option<(Millis, Millis)> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut low = sorted[0];
    let mut high = sorted[sorted.len() - 1];

    for _ in 0..KMEANS_ITERATIONS {
        let (mut low_sum, mut low_count) = (0.0, 0usize);
        let (mut high_sum, mut high_count) = (0.0, 0usize);
        for &value in &sorted {
            if (value - low).abs() <= (value - high).abs() {
                low_sum += value;
                low_count += 1;
            } else {
                high_sum += value;
                high_count += 1;
            }
        }
        if low_count > 0 {
            low = low_sum / low_count as f64;
        }
        if high_count > 0 {
            high = high_sum / high_count as f64;
        }
    }

    if low > high {
        std::mem::swap(&mut low, &mut high);
    }
    Some((low, high))
}

/// Dot/dash threshold for `tone_ms` given the recent history.
/// Returns 0.0 when neither clustering nor a fallback unit is available.
pub fn dash_threshold(history: &ToneHistory, tone_ms: Millis, fallback_unit_ms: Millis) -> Millis {
    let mut samples: Vec<Millis> = history.iter().copied().collect();
    if is_duration(tone_ms) {
        samples.push(tone_ms);
    }
    if samples.len() < MIN_CLUSTER_SAMPLES {
        return if is_duration(fallback_unit_ms) {
            fallback_unit_ms * FALLBACK_THRESHOLD_UNITS
        } else {
            0.0
        };
    }
    match two_means(&samples) {
        Some((low, high)) => (low + high) / 2.0,
        None => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkClassifier {
    history: ToneHistory,
}

impl MarkClassifier {
    pub fn history(&self) -> &ToneHistory {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Classify a raw tone, then feed the implied unit back into `estimator`
    /// and remember the tone for later clustering.
    ///
    /// Without any reference unit (no estimate, no fallback) or with a
    /// non-positive or non-finite tone, the result is a Dot and nothing is
    /// updated.
    pub fn classify(
        &mut self,
        tone_ms: Millis,
        estimator: &mut UnitEstimator,
        fallback_unit_ms: Millis,
    ) -> MarkClassification {
        if !is_duration(estimator.get(fallback_unit_ms)) || !is_duration(tone_ms) {
            let unit_ms = if fallback_unit_ms > 0.0 {
                fallback_unit_ms
            } else {
                tone_ms.max(0.0)
            };
            return MarkClassification {
                mark: Mark::Dot,
                unit_ms,
            };
        }

        let threshold = dash_threshold(&self.history, tone_ms, fallback_unit_ms);
        let mark = if threshold > 0.0 && tone_ms > threshold {
            Mark::Dash
        } else {
            Mark::Dot
        };
        let estimate = match mark {
            Mark::Dash => tone_ms / DASH_UNITS,
            Mark::Dot => tone_ms,
        };
        estimator.apply(estimate, GAP_ALPHA, fallback_unit_ms);
        self.history.push(tone_ms);

        trace!(tone_ms, threshold, ?mark, "tone classified");
        MarkClassification {
            mark,
            unit_ms: estimator.get(fallback_unit_ms),
        }
    }
}
