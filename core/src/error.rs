#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecoderError {
    #[error("invalid WPM: {0}")]
    InvalidSpeed(i32),

    #[error("invalid speed range: {min}..={max} WPM")]
    InvalidSpeedRange { min: i32, max: i32 },

    #[error("invalid gap units: char gap {char_gap}, word gap {word_gap}")]
    InvalidGapUnits { char_gap: u32, word_gap: u32 },

    #[error("display width must be non-zero")]
    InvalidDisplayWidth,

    #[error("invalid events: {0}")]
    InvalidEvents(String),
}

impl From<serde_json::Error> for DecoderError {
    fn from(err: serde_json::Error) -> Self {
        DecoderError::InvalidEvents(err.to_string())
    }
}
