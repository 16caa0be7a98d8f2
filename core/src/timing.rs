use crate::patterns::marks_for_char;
use crate::types::{DecoderEvent, DecoderParams, Mark, Millis, UNIT_MS_AT_ONE_WPM};

// Gap quantization thresholds, in units of the nominal unit
const QUANTIZE_INTRA_MAX_RATIO: f64 = 1.8;
const QUANTIZE_CHAR_MAX_RATIO: f64 = 6.0;

// Canonical keying lengths, in units
const INTRA_CHAR_GAP_UNITS: f64 = 1.0;
const JITTER_MAX_VARIANCE: f64 = 0.3; // Maximum timing variation as fraction of base duration

/// Nominal unit length for a speed: `1200 / wpm` ms
pub fn unit_ms_from_wpm(wpm: i32) -> Millis {
    if wpm <= 0 {
        return 0.0;
    }
    UNIT_MS_AT_ONE_WPM / wpm as f64
}

/// Speed implied by a unit length
pub fn wpm_from_unit_ms(unit_ms: Millis) -> f64 {
    if unit_ms <= 0.0 {
        return 0.0;
    }
    UNIT_MS_AT_ONE_WPM / unit_ms
}

/// Snap a gap to the nearest canonical multiple of `unit_ms`:
/// 1 unit, `char_gap_units`, or `word_gap_units`.
pub fn quantize_gap_ms(
    gap_ms: Millis,
    unit_ms: Millis,
    char_gap_units: u32,
    word_gap_units: u32,
) -> Millis {
    if gap_ms <= 0.0 || unit_ms <= 0.0 {
        return gap_ms;
    }
    let ratio = gap_ms / unit_ms;
    let target_units = if ratio < QUANTIZE_INTRA_MAX_RATIO {
        INTRA_CHAR_GAP_UNITS
    } else if ratio < QUANTIZE_CHAR_MAX_RATIO {
        char_gap_units as f64
    } else {
        word_gap_units as f64
    };
    target_units * unit_ms
}

/// Wall-clock instants at which the caller should poll the decoder after a
/// mark ends, assuming no further mark arrives first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryDeadlines {
    /// Call `flush_char(false)` at this time
    pub char_flush_at: Millis,
    /// Call `stop_recording_and_decode()` at this time
    pub stop_at: Millis,
}

pub fn boundary_deadlines(
    mark_end_at: Millis,
    unit_ms: Millis,
    params: &DecoderParams,
) -> BoundaryDeadlines {
    BoundaryDeadlines {
        char_flush_at: mark_end_at + unit_ms * params.char_gap_units as f64,
        stop_at: mark_end_at + unit_ms * params.word_gap_units as f64,
    }
}

/// Options for [`keying_events`]
#[derive(Debug, Clone)]
pub struct KeyingOptions {
    pub unit_ms: Millis,
    pub start_at_ms: Millis,
    pub char_gap_units: u32,
    pub word_gap_units: u32,
    /// 0.0 keys perfectly; 1.0 varies each element by up to 30%
    pub jitter: f64,
    pub seed: u32,
    /// Emit raw `Tone` events instead of pre-classified `Mark` events
    pub raw_tones: bool,
}

impl Default for KeyingOptions {
    fn default() -> Self {
        Self {
            unit_ms: 60.0,
            start_at_ms: 1_000.0,
            char_gap_units: 3,
            word_gap_units: 10,
            jitter: 0.0,
            seed: 1,
            raw_tones: false,
        }
    }
}

// Deterministic LCG so jittered sequences are reproducible
struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    fn new(seed: u32) -> Self {
        Self {
            state: seed.wrapping_add(1), // Ensure non-zero
        }
    }

    fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        (self.state >> 16) as f64 / 65536.0
    }
}

fn jittered(base: Millis, jitter: f64, rng: &mut SimpleRng) -> Millis {
    if jitter <= 0.0 {
        return base;
    }
    let max_variation = base * jitter * JITTER_MAX_VARIANCE;
    let result = base + (rng.next_f64() - 0.5) * 2.0 * max_variation;
    result.clamp(base * 0.1, base * (1.0 + JITTER_MAX_VARIANCE))
}

/// Key `text` into the event stream a caller would produce: one mark event
/// per element, a `Flush` wherever the character-gap timer would fire, and a
/// trailing `Stop`. Spaces become word gaps; unknown characters are skipped.
pub fn keying_events(text: &str, options: &KeyingOptions) -> Vec<DecoderEvent> {
    let mut rng = SimpleRng::new(options.seed);
    let unit = options.unit_ms;
    let mut events = Vec::new();
    let mut cursor = options.start_at_ms;
    let mut pending_gap_units: Option<f64> = None;

    for ch in text.chars() {
        if ch == ' ' {
            if pending_gap_units.is_some() {
                pending_gap_units = Some(options.word_gap_units as f64);
            }
            continue;
        }
        let Some(marks) = marks_for_char(ch) else {
            continue;
        };

        if let Some(gap_units) = pending_gap_units.take() {
            cursor += jittered(unit * gap_units, options.jitter, &mut rng);
        }

        for (i, mark) in marks.iter().enumerate() {
            if i > 0 {
                cursor += jittered(unit * INTRA_CHAR_GAP_UNITS, options.jitter, &mut rng);
            }
            let tone_ms = jittered(unit * mark.units() as f64, options.jitter, &mut rng);
            events.push(mark_event(*mark, cursor, tone_ms, options));
            cursor += tone_ms;
        }

        events.push(DecoderEvent::Flush {
            force_word_boundary: false,
        });
        pending_gap_units = Some(options.char_gap_units as f64);
    }

    events.push(DecoderEvent::Stop);
    events
}

fn mark_event(
    mark: Mark,
    start_at_ms: Millis,
    tone_ms: Millis,
    options: &KeyingOptions,
) -> DecoderEvent {
    if options.raw_tones {
        DecoderEvent::Tone {
            start_at_ms,
            duration_ms: tone_ms,
            unit_ms: options.unit_ms,
            speed_wpm: None,
        }
    } else {
        DecoderEvent::Mark {
            symbol: mark,
            start_at_ms,
            unit_ms: options.unit_ms,
            speed_wpm: None,
            tone_ms: (options.jitter > 0.0).then_some(tone_ms),
        }
    }
}
