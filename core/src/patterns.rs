// International Morse table, keyed by dot/dash strings ("." = dot, "-" = dash)
use crate::types::Mark;

/// Placeholder emitted for symbol keys missing from the table
pub const UNKNOWN_CHAR: &str = "?";

static MORSE_TABLE: &[(char, &str)] = &[
    // Letters
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    // Digits
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    // Punctuation
    ('.', ".-.-.-"),
    (',', "--..--"),
    ('?', "..--.."),
    ('\'', ".----."),
    ('!', "-.-.--"),
    ('/', "-..-."),
    ('(', "-.--."),
    (')', "-.--.-"),
    ('&', ".-..."),
    (':', "---..."),
    (';', "-.-.-."),
    ('=', "-...-"),
    ('+', ".-.-."),
    ('-', "-....-"),
    ('_', "..--.-"),
    ('"', ".-..-."),
    ('$', "...-..-"),
    ('@', ".--.-."),
];

/// Symbol key for a character (letters are case-insensitive)
pub fn key_for_char(ch: char) -> Option<&'static str> {
    let ch = ch.to_ascii_uppercase();
    MORSE_TABLE
        .iter()
        .find(|(table_ch, _)| *table_ch == ch)
        .map(|(_, key)| *key)
}

/// Marks for a character, in keying order
pub fn marks_for_char(ch: char) -> Option<Vec<Mark>> {
    key_for_char(ch).map(|key| key.chars().filter_map(Mark::from_symbol).collect())
}

/// Character for a symbol key such as `".-"`
pub fn char_for_key(key: &str) -> Option<char> {
    MORSE_TABLE
        .iter()
        .find(|(_, table_key)| *table_key == key)
        .map(|(ch, _)| *ch)
}

pub fn marks_to_key(marks: &[Mark]) -> String {
    marks.iter().map(|mark| mark.symbol()).collect()
}

/// Decode one buffered character.
///
/// An empty buffer decodes to empty text; a key missing from the table
/// decodes to [`UNKNOWN_CHAR`].
pub fn decode_marks(marks: &[Mark]) -> String {
    if marks.is_empty() {
        return String::new();
    }
    match char_for_key(&marks_to_key(marks)) {
        Some(ch) => ch.to_string(),
        None => UNKNOWN_CHAR.to_string(),
    }
}
