// Support utilities for WASM bindings
use cw_decoder_core::Mark;
use serde::de::DeserializeOwned;

/// Parse JSON config with defaults
/// Returns the deserialized config (or the default if parsing fails or config is empty)
/// plus a warning to surface when the JSON was rejected
pub fn parse_with_defaults<T: DeserializeOwned + Default>(
    config_json: &str,
) -> (T, Option<String>) {
    if config_json.trim().is_empty() || config_json.trim() == "{}" {
        return (T::default(), None);
    }
    match serde_json::from_str::<T>(config_json) {
        Ok(config) => (config, None),
        Err(e) => (
            T::default(),
            Some(format!("Invalid config JSON, using defaults: {}", e)),
        ),
    }
}

/// Accepts "." / "-" as well as "dot" / "dash"
pub fn parse_mark(symbol: &str) -> Option<Mark> {
    match symbol.trim() {
        "." | "dot" => Some(Mark::Dot),
        "-" | "dash" => Some(Mark::Dash),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_decoder_core::DecoderParams;

    #[test]
    fn test_parse_with_defaults() {
        let (params, warning) = parse_with_defaults::<DecoderParams>("");
        assert_eq!(params, DecoderParams::default());
        assert!(warning.is_none());

        let (params, warning) = parse_with_defaults::<DecoderParams>(r#"{"wpm": 15}"#);
        assert_eq!(params.wpm, 15);
        assert!(warning.is_none());

        let (params, warning) = parse_with_defaults::<DecoderParams>("{not json");
        assert_eq!(params, DecoderParams::default());
        assert!(warning.is_some());
    }

    #[test]
    fn test_parse_mark() {
        assert_eq!(parse_mark("."), Some(Mark::Dot));
        assert_eq!(parse_mark(" dash "), Some(Mark::Dash));
        assert_eq!(parse_mark("x"), None);
    }
}
