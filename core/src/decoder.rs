//! Recording session state machine.
//!
//! `CwDecoder` is driven one event at a time, in chronological order, by a
//! single caller. It never schedules anything itself: the caller decides
//! when a character or a transmission is over (see
//! [`crate::timing::boundary_deadlines`]) and calls [`CwDecoder::flush_char`]
//! or [`CwDecoder::stop_recording_and_decode`].
//!
//! ```text
//! Idle --record_mark--> Recording --stop_recording_and_decode--> Idle
//! ```

use crate::classify::{MarkClassifier, ToneHistory};
use crate::display::append_chunk;
use crate::error::DecoderError;
use crate::estimator::UnitEstimator;
use crate::patterns::{decode_marks, marks_to_key};
use crate::timing::{quantize_gap_ms, wpm_from_unit_ms};
use crate::types::{
    is_duration, DecodeResult, DecodedChunk, DecoderEvent, DecoderParams, Mark,
    MarkClassification, Millis,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct CwDecoder {
    params: DecoderParams,
    recording: bool,
    /// End of the most recent mark, advanced by explicit silences
    last_event_end_at: Option<Millis>,
    estimator: UnitEstimator,
    classifier: MarkClassifier,
    pending_marks: Vec<Mark>,
    word_boundary_pending: bool,
    speed_wpm: Option<i32>,
}

impl Default for CwDecoder {
    fn default() -> Self {
        Self::from_valid_params(DecoderParams::default())
    }
}

impl CwDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: DecoderParams) -> Result<Self, DecoderError> {
        params.validate()?;
        Ok(Self::from_valid_params(params))
    }

    fn from_valid_params(params: DecoderParams) -> Self {
        let estimator = UnitEstimator::new(params.char_gap_units, params.word_gap_units);
        Self {
            params,
            recording: false,
            last_event_end_at: None,
            estimator,
            classifier: MarkClassifier::default(),
            pending_marks: Vec::new(),
            word_boundary_pending: false,
            speed_wpm: None,
        }
    }

    /// Discard all session state. Safe at any time, including mid-character.
    pub fn reset(&mut self) {
        self.recording = false;
        self.last_event_end_at = None;
        self.estimator.reset();
        self.classifier.reset();
        self.pending_marks.clear();
        self.word_boundary_pending = false;
        self.speed_wpm = None;
    }

    pub fn params(&self) -> &DecoderParams {
        &self.params
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn last_event_end_at(&self) -> Option<Millis> {
        self.last_event_end_at
    }

    pub fn word_boundary_pending(&self) -> bool {
        self.word_boundary_pending
    }

    pub fn pending_marks(&self) -> &[Mark] {
        &self.pending_marks
    }

    /// Symbol key of the character being keyed, e.g. `".-"`
    pub fn pending_key(&self) -> String {
        marks_to_key(&self.pending_marks)
    }

    pub fn tone_history(&self) -> &ToneHistory {
        self.classifier.history()
    }

    pub fn speed_wpm(&self) -> Option<i32> {
        self.speed_wpm
    }

    /// Record the caller's current speed setting. Bookkeeping only.
    pub fn set_speed_wpm(&mut self, wpm: i32) {
        self.speed_wpm = Some(wpm);
    }

    // --- Unit estimation ---

    pub fn update_unit_estimate(&mut self, observed_gap_ms: Millis, fallback_unit_ms: Millis) {
        self.estimator.update_from_gap(observed_gap_ms, fallback_unit_ms);
    }

    pub fn update_unit_estimate_from_tone(
        &mut self,
        observed_tone_ms: Millis,
        fallback_unit_ms: Millis,
    ) {
        self.estimator
            .update_from_tone(observed_tone_ms, fallback_unit_ms);
    }

    pub fn get_unit_estimate_ms(&self, fallback_unit_ms: Millis) -> Millis {
        self.estimator.get(fallback_unit_ms)
    }

    pub fn char_gap_ms(&self, fallback_unit_ms: Millis) -> Millis {
        self.estimator.char_gap_ms(fallback_unit_ms)
    }

    pub fn word_gap_ms(&self, fallback_unit_ms: Millis) -> Millis {
        self.estimator.word_gap_ms(fallback_unit_ms)
    }

    pub fn estimated_wpm(&self, fallback_unit_ms: Millis) -> f64 {
        wpm_from_unit_ms(self.get_unit_estimate_ms(fallback_unit_ms))
    }

    /// Classify a raw tone as dot or dash without recording it as a mark.
    /// Updates the unit estimate and tone history.
    pub fn classify_mark_from_tone(
        &mut self,
        tone_ms: Millis,
        fallback_unit_ms: Millis,
    ) -> MarkClassification {
        self.classifier
            .classify(tone_ms, &mut self.estimator, fallback_unit_ms)
    }

    // --- Segmentation ---

    fn ensure_recording_session(&mut self) {
        if self.recording {
            return;
        }
        debug!("decode session opened");
        self.recording = true;
        self.last_event_end_at = None;
        self.pending_marks.clear();
    }

    /// Apply quantization, feed the estimator, and flag word boundaries.
    /// Returns the gap as it should be accounted on the timeline.
    fn observe_gap(&mut self, gap_ms: Millis, unit_ms: Millis, estimate: bool) -> Millis {
        let gap_ms = if self.params.gap_quantize_enabled {
            quantize_gap_ms(
                gap_ms,
                unit_ms,
                self.params.char_gap_units,
                self.params.word_gap_units,
            )
        } else {
            gap_ms
        };
        if estimate {
            self.estimator.update_from_gap(gap_ms, unit_ms);
        }
        if unit_ms > 0.0 && gap_ms >= unit_ms * self.params.word_gap_units as f64 {
            if !self.word_boundary_pending {
                debug!(gap_ms, unit_ms, "word boundary detected");
            }
            self.word_boundary_pending = true;
        }
        gap_ms
    }

    /// Record a mark of nominal length (`unit_ms` for a dot, three for a dash)
    /// starting at `start_at`. Opens a session if none is active.
    pub fn record_mark(&mut self, mark: Mark, start_at: Millis, unit_ms: Millis) {
        self.record_mark_with_tone(mark, start_at, unit_ms, unit_ms * mark.units() as f64);
    }

    /// Like [`record_mark`](Self::record_mark) with a measured tone length.
    /// A non-finite `start_at` is ignored; a non-finite tone counts as zero.
    pub fn record_mark_with_tone(
        &mut self,
        mark: Mark,
        start_at: Millis,
        unit_ms: Millis,
        tone_ms: Millis,
    ) {
        if !start_at.is_finite() {
            return;
        }
        let tone_ms = if is_duration(tone_ms) { tone_ms } else { 0.0 };
        self.ensure_recording_session();
        if let Some(last_end) = self.last_event_end_at {
            let gap_ms = (start_at - last_end).max(0.0);
            if gap_ms > 0.0 {
                self.observe_gap(gap_ms, unit_ms, true);
            }
        }
        self.pending_marks.push(mark);
        self.last_event_end_at = Some(start_at + tone_ms);
    }

    /// Classify a raw key-down duration and record it.
    /// Non-positive or non-finite tones are classified but not recorded.
    pub fn record_tone(
        &mut self,
        start_at: Millis,
        tone_ms: Millis,
        unit_ms: Millis,
    ) -> MarkClassification {
        let classification = self.classify_mark_from_tone(tone_ms, unit_ms);
        if is_duration(tone_ms) {
            self.record_mark_with_tone(classification.mark, start_at, unit_ms, tone_ms);
        }
        classification
    }

    /// Account for a pause with no mark in it (e.g. key released).
    /// No-op when idle or when `gap_ms` is not positive.
    pub fn add_silence(&mut self, gap_ms: Millis, unit_ms: Millis) {
        if !self.recording || !is_duration(gap_ms) {
            return;
        }
        let gap_ms = self.observe_gap(gap_ms, unit_ms, self.params.gap_estimate_enabled);
        if let Some(last_end) = self.last_event_end_at.as_mut() {
            *last_end += gap_ms;
        }
    }

    /// Decode the buffered marks as one character.
    ///
    /// An empty buffer yields an empty chunk and leaves any pending word
    /// boundary for the next character, so `word_boundary_pending` is only
    /// cleared when a character is actually emitted.
    pub fn flush_char(&mut self, force_word_boundary: bool) -> DecodedChunk {
        if self.pending_marks.is_empty() {
            return DecodedChunk::empty();
        }
        let text = decode_marks(&self.pending_marks);
        let with_space = force_word_boundary || self.word_boundary_pending;
        debug!(key = %self.pending_key(), %text, with_space, "character decoded");
        self.pending_marks.clear();
        self.word_boundary_pending = false;
        DecodedChunk { text, with_space }
    }

    /// Close the session, flushing the tail character with a word boundary.
    pub fn stop_recording_and_decode(&mut self) -> DecodedChunk {
        if !self.recording {
            return DecodedChunk::empty();
        }
        self.recording = false;
        self.last_event_end_at = None;
        let chunk = self.flush_char(true);
        self.word_boundary_pending = false;
        debug!(tail = %chunk.text, "decode session closed");
        chunk
    }

    /// Apply one input event. Returns a chunk only when a flush or stop
    /// produced text.
    pub fn process(&mut self, event: &DecoderEvent) -> Option<DecodedChunk> {
        let chunk = match *event {
            DecoderEvent::Mark {
                symbol,
                start_at_ms,
                unit_ms,
                speed_wpm,
                tone_ms,
            } => {
                self.note_speed(speed_wpm);
                match tone_ms {
                    Some(tone_ms) => {
                        self.record_mark_with_tone(symbol, start_at_ms, unit_ms, tone_ms)
                    }
                    None => self.record_mark(symbol, start_at_ms, unit_ms),
                }
                return None;
            }
            DecoderEvent::Tone {
                start_at_ms,
                duration_ms,
                unit_ms,
                speed_wpm,
            } => {
                self.note_speed(speed_wpm);
                self.record_tone(start_at_ms, duration_ms, unit_ms);
                return None;
            }
            DecoderEvent::Silence {
                duration_ms,
                unit_ms,
                speed_wpm,
            } => {
                self.note_speed(speed_wpm);
                self.add_silence(duration_ms, unit_ms);
                return None;
            }
            DecoderEvent::Flush {
                force_word_boundary,
            } => self.flush_char(force_word_boundary),
            DecoderEvent::Stop => self.stop_recording_and_decode(),
            DecoderEvent::Reset => {
                self.reset();
                return None;
            }
        };
        (!chunk.is_empty()).then_some(chunk)
    }

    fn note_speed(&mut self, speed_wpm: Option<i32>) {
        if let Some(wpm) = speed_wpm {
            self.speed_wpm = Some(wpm);
        }
    }
}

/// Run a fresh decoder over `events`, then stop it, and collect the text.
pub fn decode_events(
    events: &[DecoderEvent],
    params: &DecoderParams,
) -> Result<DecodeResult, DecoderError> {
    let mut decoder = CwDecoder::with_params(params.clone())?;
    let mut chunks = Vec::new();

    for event in events {
        if let Some(chunk) = decoder.process(event) {
            chunks.push(chunk);
        }
    }
    if let Some(chunk) = decoder.process(&DecoderEvent::Stop) {
        chunks.push(chunk);
    }

    let mut text = String::new();
    for chunk in &chunks {
        append_chunk(&mut text, chunk);
    }

    let fallback_unit_ms = params.unit_ms();
    Ok(DecodeResult {
        text,
        chunks,
        unit_estimate_ms: decoder.get_unit_estimate_ms(fallback_unit_ms),
        estimated_wpm: decoder.estimated_wpm(fallback_unit_ms),
    })
}
