//! Consumer-side helpers for turning [`DecodedChunk`]s into visible text.

use std::collections::VecDeque;

use crate::types::{DecodedChunk, DecoderParams};

/// Append a chunk to a running transcript. A word separator is only
/// inserted between words, never at the start.
pub fn append_chunk(transcript: &mut String, chunk: &DecodedChunk) {
    let text = chunk.text.trim();
    if text.is_empty() {
        return;
    }
    if chunk.with_space && !transcript.is_empty() {
        transcript.push(' ');
    }
    transcript.push_str(text);
}

/// Fixed-width ticker: new characters enter on the right and push the
/// oldest ones out on the left.
#[derive(Debug, Clone, PartialEq)]
pub struct TextWindow {
    cells: VecDeque<char>,
}

impl TextWindow {
    pub fn new(width: usize) -> Self {
        Self {
            cells: std::iter::repeat(' ').take(width).collect(),
        }
    }

    pub fn for_params(params: &DecoderParams) -> Self {
        Self::new(params.display_width)
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    fn shift_in(&mut self, ch: char) {
        if self.cells.is_empty() {
            return;
        }
        self.cells.pop_front();
        self.cells.push_back(ch);
    }

    pub fn push_chunk(&mut self, chunk: &DecodedChunk) {
        let text = chunk.text.trim();
        if text.is_empty() {
            return;
        }
        if chunk.with_space {
            self.shift_in(' ');
        }
        for ch in text.chars() {
            self.shift_in(ch);
        }
    }

    /// Scroll one blank in, so idle text drifts off the display
    pub fn tick(&mut self) {
        self.shift_in(' ');
    }

    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = ' ';
        }
    }

    pub fn as_string(&self) -> String {
        self.cells.iter().collect()
    }
}
