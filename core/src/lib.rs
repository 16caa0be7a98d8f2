// Adaptive Morse (CW) timing decoder
// Turns live mark/gap timings into text while tracking the sender's speed

pub mod classify;
pub mod decoder;
pub mod display;
pub mod error;
pub mod estimator;
pub mod patterns;
pub mod timing;
pub mod types;

// Re-export main public API
pub use decoder::{decode_events, CwDecoder};
pub use display::{append_chunk, TextWindow};
pub use error::DecoderError;
pub use timing::{boundary_deadlines, keying_events, BoundaryDeadlines, KeyingOptions};
pub use types::*;

/// Decode a JSON array of [`DecoderEvent`]s in one shot
pub fn decode_events_json(
    events_json: &str,
    params: &DecoderParams,
) -> Result<DecodeResult, DecoderError> {
    let events: Vec<DecoderEvent> = serde_json::from_str(events_json)?;
    decode_events(&events, params)
}

/// Decode `text` keyed with perfect timing at the configured speed
pub fn round_trip_text(text: &str, params: &DecoderParams) -> Result<String, DecoderError> {
    params.validate()?;
    let options = KeyingOptions {
        unit_ms: params.unit_ms(),
        char_gap_units: params.char_gap_units,
        word_gap_units: params.word_gap_units,
        ..Default::default()
    };
    let events = keying_events(text, &options);
    decode_events(&events, params).map(|result| result.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_events_json() {
        let json = r#"[
            {"type": "mark", "symbol": ".", "startAtMs": 0, "unitMs": 60},
            {"type": "mark", "symbol": "dash", "startAtMs": 120, "unitMs": 60, "speedWpm": 20},
            {"type": "flush"},
            {"type": "silence", "durationMs": 600, "unitMs": 60},
            {"type": "tone", "startAtMs": 1000, "durationMs": 180, "unitMs": 60},
            {"type": "stop"}
        ]"#;
        let result = decode_events_json(json, &DecoderParams::default()).unwrap();
        assert_eq!(result.text, "A T");
        assert_eq!(result.chunks.len(), 2);
        assert!(!result.chunks[0].with_space);
        assert!(result.chunks[1].with_space);
    }

    #[test]
    fn test_decode_events_json_rejects_garbage() {
        let err = decode_events_json(r#"[{"type": "beep"}]"#, &DecoderParams::default())
            .unwrap_err();
        assert!(matches!(err, DecoderError::InvalidEvents(_)));
    }

    #[test]
    fn test_params_json_deserialization() {
        // Empty JSON - should use defaults
        let params: DecoderParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, DecoderParams::default());
        assert_eq!(params.unit_ms(), 60.0);

        // Partial JSON - should merge with defaults
        let json = r#"{"wpm": 12, "gapQuantizeEnabled": true}"#;
        let params: DecoderParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.wpm, 12);
        assert!(params.gap_quantize_enabled);
        assert_eq!(params.word_gap_units, 10);
        assert_eq!(params.unit_ms(), 100.0);
    }

    #[test]
    fn test_params_validation() {
        let bad_range = DecoderParams {
            min_wpm: 40,
            ..Default::default()
        };
        assert!(matches!(
            bad_range.validate(),
            Err(DecoderError::InvalidSpeedRange { min: 40, max: 30 })
        ));

        let bad_gaps = DecoderParams {
            word_gap_units: 3,
            ..Default::default()
        };
        assert!(matches!(
            bad_gaps.validate(),
            Err(DecoderError::InvalidGapUnits { .. })
        ));

        let bad_width = DecoderParams {
            display_width: 0,
            ..Default::default()
        };
        assert_eq!(bad_width.validate(), Err(DecoderError::InvalidDisplayWidth));
    }

    #[test]
    fn test_round_trip_text() {
        let params = DecoderParams {
            wpm: 25,
            ..Default::default()
        };
        assert_eq!(
            round_trip_text("hello world", &params).unwrap(),
            "HELLO WORLD"
        );
        assert_eq!(round_trip_text("", &params).unwrap(), "");
    }

    #[test]
    fn test_chunk_serializes_camel_case() {
        let chunk = DecodedChunk {
            text: "K".to_string(),
            with_space: true,
        };
        assert_eq!(
            serde_json::to_string(&chunk).unwrap(),
            r#"{"text":"K","withSpace":true}"#
        );
    }
}
