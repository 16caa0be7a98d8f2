// WebAssembly bindings for the CW decoder
use cw_decoder_core::types::*;
use cw_decoder_core::{timing, CwDecoder, TextWindow};
use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;

mod support;

// Console warnings for rejected config
macro_rules! console_warn {
    ($($t:tt)*) => (web_sys::console::warn_1(&JsValue::from_str(&format_args!($($t)*).to_string())))
}

// Macro to generate wasm_bindgen wrapper enums that mirror core enums
macro_rules! wasm_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident = $value:expr),* $(,)?
        }
        from $core_type:ty
    ) => {
        #[wasm_bindgen]
        $(#[$meta])*
        $vis enum $name {
            $($variant = $value),*
        }

        impl From<$core_type> for $name {
            fn from(value: $core_type) -> Self {
                match value {
                    $(<$core_type>::$variant => $name::$variant),*
                }
            }
        }

        impl From<$name> for $core_type {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => <$core_type>::$variant),*
                }
            }
        }
    };
}

wasm_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MarkJs {
        Dot = 0,
        Dash = 1,
    }
    from cw_decoder_core::types::Mark
}

fn parse_params(config_json: &str) -> DecoderParams {
    let (params, warning) = support::parse_with_defaults::<DecoderParams>(config_json);
    if let Some(warning) = warning {
        console_warn!("{}", warning);
    }
    params
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct DecodedChunkJs {
    text: String,
    with_space: bool,
}

impl From<DecodedChunk> for DecodedChunkJs {
    fn from(chunk: DecodedChunk) -> Self {
        Self {
            text: chunk.text,
            with_space: chunk.with_space,
        }
    }
}

#[wasm_bindgen]
impl DecodedChunkJs {
    #[wasm_bindgen(getter)]
    pub fn text(&self) -> String {
        self.text.clone()
    }

    #[wasm_bindgen(getter, js_name = withSpace)]
    pub fn with_space(&self) -> bool {
        self.with_space
    }
}

#[wasm_bindgen]
pub struct MarkClassificationJs {
    mark: MarkJs,
    unit_ms: f64,
}

#[wasm_bindgen]
impl MarkClassificationJs {
    #[wasm_bindgen(getter)]
    pub fn mark(&self) -> MarkJs {
        self.mark
    }

    /// "." or "-"
    #[wasm_bindgen(getter)]
    pub fn symbol(&self) -> String {
        Mark::from(self.mark).symbol().to_string()
    }

    #[wasm_bindgen(getter, js_name = unitMs)]
    pub fn unit_ms(&self) -> f64 {
        self.unit_ms
    }
}

/// Stateful decoder, one per keying session
#[wasm_bindgen(js_name = CwDecoder)]
pub struct CwDecoderJs {
    inner: CwDecoder,
}

#[wasm_bindgen(js_class = CwDecoder)]
impl CwDecoderJs {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<CwDecoderJs, JsValue> {
        let inner = CwDecoder::with_params(parse_params(config_json)).map_err(to_js_error)?;
        Ok(Self { inner })
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    #[wasm_bindgen(getter, js_name = isRecording)]
    pub fn is_recording(&self) -> bool {
        self.inner.is_recording()
    }

    #[wasm_bindgen(getter, js_name = pendingKey)]
    pub fn pending_key(&self) -> String {
        self.inner.pending_key()
    }

    #[wasm_bindgen(js_name = recordMark)]
    pub fn record_mark(
        &mut self,
        symbol: &str,
        start_at: f64,
        unit_ms: f64,
        wpm: Option<i32>,
    ) -> Result<(), JsValue> {
        let mark = support::parse_mark(symbol)
            .ok_or_else(|| JsValue::from_str(&format!("Invalid mark symbol: {}", symbol)))?;
        if let Some(wpm) = wpm {
            self.inner.set_speed_wpm(wpm);
        }
        self.inner.record_mark(mark, start_at, unit_ms);
        Ok(())
    }

    /// Record a mark starting now, by the page clock
    #[wasm_bindgen(js_name = recordMarkNow)]
    pub fn record_mark_now(&mut self, symbol: &str, unit_ms: f64) -> Result<(), JsValue> {
        self.record_mark(symbol, js_sys::Date::now(), unit_ms, None)
    }

    #[wasm_bindgen(js_name = recordTone)]
    pub fn record_tone(
        &mut self,
        start_at: f64,
        tone_ms: f64,
        unit_ms: f64,
    ) -> MarkClassificationJs {
        let result = self.inner.record_tone(start_at, tone_ms, unit_ms);
        MarkClassificationJs {
            mark: result.mark.into(),
            unit_ms: result.unit_ms,
        }
    }

    #[wasm_bindgen(js_name = addSilence)]
    pub fn add_silence(&mut self, gap_ms: f64, unit_ms: f64) {
        self.inner.add_silence(gap_ms, unit_ms);
    }

    #[wasm_bindgen(js_name = flushChar)]
    pub fn flush_char(&mut self, force_word_boundary: bool) -> DecodedChunkJs {
        self.inner.flush_char(force_word_boundary).into()
    }

    #[wasm_bindgen(js_name = stopRecordingAndDecode)]
    pub fn stop_recording_and_decode(&mut self) -> DecodedChunkJs {
        self.inner.stop_recording_and_decode().into()
    }

    /// Apply one JSON-encoded event; returns a chunk when text was produced
    #[wasm_bindgen(js_name = processEvent)]
    pub fn process_event(&mut self, event_json: &str) -> Result<Option<DecodedChunkJs>, JsValue> {
        let event: DecoderEvent = serde_json::from_str(event_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid event JSON: {}", e)))?;
        Ok(self.inner.process(&event).map(DecodedChunkJs::from))
    }

    #[wasm_bindgen(js_name = unitEstimateMs)]
    pub fn unit_estimate_ms(&self, fallback_unit_ms: f64) -> f64 {
        self.inner.get_unit_estimate_ms(fallback_unit_ms)
    }

    #[wasm_bindgen(js_name = charGapMs)]
    pub fn char_gap_ms(&self, fallback_unit_ms: f64) -> f64 {
        self.inner.char_gap_ms(fallback_unit_ms)
    }

    #[wasm_bindgen(js_name = wordGapMs)]
    pub fn word_gap_ms(&self, fallback_unit_ms: f64) -> f64 {
        self.inner.word_gap_ms(fallback_unit_ms)
    }

    #[wasm_bindgen(js_name = estimatedWpm)]
    pub fn estimated_wpm(&self, fallback_unit_ms: f64) -> f64 {
        self.inner.estimated_wpm(fallback_unit_ms)
    }

    /// `{ charFlushAt, stopAt }` for scheduling the page's timers
    #[wasm_bindgen(js_name = boundaryDeadlines)]
    pub fn boundary_deadlines(&self, mark_end_at: f64, unit_ms: f64) -> Result<Object, JsValue> {
        let deadlines = timing::boundary_deadlines(mark_end_at, unit_ms, self.inner.params());
        let obj = Object::new();
        Reflect::set(&obj, &"charFlushAt".into(), &deadlines.char_flush_at.into())?;
        Reflect::set(&obj, &"stopAt".into(), &deadlines.stop_at.into())?;
        Ok(obj)
    }
}

/// Scrolling text display fed by decoded chunks
#[wasm_bindgen(js_name = TextWindow)]
pub struct TextWindowJs {
    inner: TextWindow,
}

#[wasm_bindgen(js_class = TextWindow)]
impl TextWindowJs {
    #[wasm_bindgen(constructor)]
    pub fn new(width: usize) -> TextWindowJs {
        Self {
            inner: TextWindow::new(width),
        }
    }

    /// Window sized by `displayWidth` in `config_json`
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(config_json: &str) -> TextWindowJs {
        Self {
            inner: TextWindow::for_params(&parse_params(config_json)),
        }
    }

    #[wasm_bindgen(js_name = pushChunk)]
    pub fn push_chunk(&mut self, chunk: &DecodedChunkJs) {
        self.inner.push_chunk(&DecodedChunk {
            text: chunk.text.clone(),
            with_space: chunk.with_space,
        });
    }

    pub fn tick(&mut self) {
        self.inner.tick();
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[wasm_bindgen(getter)]
    pub fn text(&self) -> String {
        self.inner.as_string()
    }
}

// Main JavaScript API functions

/// Nominal unit in ms for the speed in `config_json`
#[wasm_bindgen(js_name = nominalUnitMs)]
pub fn nominal_unit_ms(config_json: &str) -> f64 {
    parse_params(config_json).unit_ms()
}

/// Decode a JSON array of events in one shot. Resolves to
/// `{ text, chunks, unitEstimateMs, estimatedWpm }`.
#[wasm_bindgen(js_name = decodeCwEvents)]
pub fn decode_cw_events(events_json: &str, config_json: &str) -> Result<JsValue, JsValue> {
    let params = parse_params(config_json);
    let result =
        cw_decoder_core::decode_events_json(events_json, &params).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&result).map_err(to_js_error)
}
