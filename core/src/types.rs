use serde::{Deserialize, Serialize};

use crate::error::DecoderError;

/// Durations and timestamps are carried as floating point milliseconds.
/// Timestamps come from the caller's clock (e.g. `Date.now()`), so `f64` is
/// needed to keep sub-millisecond precision at epoch magnitudes.
pub type Millis = f64;

/// Milliseconds per unit at 1 WPM ("PARIS" standard: 50 units per word)
pub const UNIT_MS_AT_ONE_WPM: f64 = 1200.0;

/// A usable duration: finite and strictly positive. NaN and infinities from
/// caller clocks fail this check and are ignored.
pub(crate) fn is_duration(ms: Millis) -> bool {
    ms.is_finite() && ms > 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    #[serde(rename = "dot", alias = ".")]
    Dot = 0,
    #[serde(rename = "dash", alias = "-")]
    Dash = 1,
}

impl Mark {
    /// Nominal length in units
    pub fn units(self) -> u32 {
        match self {
            Mark::Dot => 1,
            Mark::Dash => 3,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Mark::Dot => '.',
            Mark::Dash => '-',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Mark::Dot),
            '-' => Some(Mark::Dash),
            _ => None,
        }
    }
}

/// Text produced by a character flush or a stop.
///
/// `with_space` asks the consumer to insert a word separator *before* `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedChunk {
    pub text: String,
    pub with_space: bool,
}

impl DecodedChunk {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Outcome of classifying a raw tone length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkClassification {
    pub mark: Mark,
    pub unit_ms: Millis,
}

/// Timing events fed to the decoder in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DecoderEvent {
    /// A keyed mark whose dot/dash identity the caller already knows
    #[serde(rename_all = "camelCase")]
    Mark {
        symbol: Mark,
        start_at_ms: Millis,
        unit_ms: Millis,
        #[serde(default)]
        speed_wpm: Option<i32>,
        #[serde(default)]
        tone_ms: Option<Millis>,
    },
    /// A raw key-down duration that still needs dot/dash classification
    #[serde(rename_all = "camelCase")]
    Tone {
        start_at_ms: Millis,
        duration_ms: Millis,
        unit_ms: Millis,
        #[serde(default)]
        speed_wpm: Option<i32>,
    },
    #[serde(rename_all = "camelCase")]
    Silence {
        duration_ms: Millis,
        unit_ms: Millis,
        #[serde(default)]
        speed_wpm: Option<i32>,
    },
    #[serde(rename_all = "camelCase")]
    Flush {
        #[serde(default)]
        force_word_boundary: bool,
    },
    Stop,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecoderParams {
    pub wpm: i32,
    pub min_wpm: i32,
    pub max_wpm: i32,
    pub min_unit_ms: Millis,
    pub char_gap_units: u32,
    pub word_gap_units: u32,
    pub gap_estimate_enabled: bool,
    pub gap_quantize_enabled: bool,
    pub display_width: usize,
}

impl Default for DecoderParams {
    fn default() -> Self {
        Self {
            wpm: 20,
            min_wpm: 5,
            max_wpm: 30,
            min_unit_ms: 40.0,
            char_gap_units: 3,
            word_gap_units: 10,
            gap_estimate_enabled: true,
            gap_quantize_enabled: false,
            display_width: 20,
        }
    }
}

impl DecoderParams {
    pub fn validate(&self) -> Result<(), DecoderError> {
        if self.wpm <= 0 {
            return Err(DecoderError::InvalidSpeed(self.wpm));
        }
        if self.min_wpm <= 0 || self.min_wpm > self.max_wpm {
            return Err(DecoderError::InvalidSpeedRange {
                min: self.min_wpm,
                max: self.max_wpm,
            });
        }
        if self.char_gap_units == 0 || self.word_gap_units <= self.char_gap_units {
            return Err(DecoderError::InvalidGapUnits {
                char_gap: self.char_gap_units,
                word_gap: self.word_gap_units,
            });
        }
        if self.display_width == 0 {
            return Err(DecoderError::InvalidDisplayWidth);
        }
        Ok(())
    }

    /// Configured speed clamped to `[min_wpm, max_wpm]`
    pub fn clamped_wpm(&self) -> i32 {
        self.wpm.clamp(self.min_wpm, self.max_wpm.max(self.min_wpm))
    }

    /// Nominal unit for the configured speed, never below `min_unit_ms`
    pub fn unit_ms(&self) -> Millis {
        crate::timing::unit_ms_from_wpm(self.clamped_wpm())
            .round()
            .max(self.min_unit_ms)
    }
}

/// Result of a one-shot batch decode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeResult {
    pub text: String,
    pub chunks: Vec<DecodedChunk>,
    pub unit_estimate_ms: Millis,
    pub estimated_wpm: f64,
}
