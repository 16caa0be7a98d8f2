use proptest::prelude::*;

use cw_decoder_core::classify::{dash_threshold, ToneHistory};
use cw_decoder_core::estimator::UnitEstimator;
use cw_decoder_core::{
    decode_events, keying_events, CwDecoder, DecoderParams, KeyingOptions, Mark,
};

// --- Unit estimator ---

proptest! {
    #[test]
    fn estimate_stays_clamped_under_outliers(
        fallback in 20.0f64..240.0,
        gaps in prop::collection::vec(0.1f64..1_000.0, 1..40),
        scale in prop_oneof![Just(1.0f64), Just(100.0), Just(1_000.0)],
    ) {
        let mut estimator = UnitEstimator::default();
        for gap in gaps {
            estimator.update_from_gap(gap * scale, fallback);
            estimator.update_from_tone(gap, fallback);
            if estimator.is_set() {
                let estimate = estimator.raw_ms();
                prop_assert!(estimate >= (0.6 * fallback).max(20.0) - 1e-9);
                prop_assert!(estimate <= 2.4 * fallback + 1e-9);
            }
        }
    }

    #[test]
    fn classification_is_monotonic_in_duration(
        fallback in 30.0f64..200.0,
        history in prop::collection::vec(10.0f64..800.0, 0..5),
        t1 in 1.0f64..1_000.0,
        t2 in 1.0f64..1_000.0,
    ) {
        // Below the clustering minimum the threshold is fixed by the unit
        let (short, long) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        let mut base = CwDecoder::new();
        for tone in &history {
            base.classify_mark_from_tone(*tone, fallback);
        }
        let short_mark = base.clone().classify_mark_from_tone(short, fallback).mark;
        let long_mark = base.clone().classify_mark_from_tone(long, fallback).mark;
        prop_assert!(!(short_mark == Mark::Dash && long_mark == Mark::Dot));
    }

    #[test]
    fn reset_is_idempotent(
        tones in prop::collection::vec(20.0f64..400.0, 0..30),
        silences in prop::collection::vec(-50.0f64..900.0, 0..10),
    ) {
        let mut decoder = CwDecoder::new();
        let mut cursor = 0.0;
        for tone in &tones {
            decoder.record_tone(cursor, *tone, 60.0);
            cursor += tone + 60.0;
        }
        for silence in &silences {
            decoder.add_silence(*silence, 60.0);
        }
        decoder.reset();
        let once = decoder.clone();
        decoder.reset();
        prop_assert_eq!(&decoder, &once);
        prop_assert_eq!(decoder, CwDecoder::new());
    }

    #[test]
    fn tone_history_is_bounded(tones in prop::collection::vec(1.0f64..500.0, 0..100)) {
        let mut decoder = CwDecoder::new();
        for (i, tone) in tones.iter().enumerate() {
            decoder.record_tone(i as f64 * 1_000.0, *tone, 60.0);
            prop_assert!(decoder.tone_history().len() <= 20);
        }
    }

    #[test]
    fn clean_timing_round_trips(
        words in prop::collection::vec("[A-Z0-9]{1,6}", 1..5),
        wpm in 5i32..=30,
    ) {
        let text = words.join(" ");
        let params = DecoderParams { wpm, ..Default::default() };
        let options = KeyingOptions {
            unit_ms: params.unit_ms(),
            ..Default::default()
        };
        let result = decode_events(&keying_events(&text, &options), &params).unwrap();
        prop_assert_eq!(result.text, text);
    }
}

// --- Clustering threshold ---

#[test]
fn clustered_classification_is_monotonic() {
    let mut history = ToneHistory::default();
    for _ in 0..10 {
        history.push(60.0);
        history.push(180.0);
    }

    let mut seen_dash = false;
    for tone in 1..=600 {
        let tone = tone as f64;
        let is_dash = tone > dash_threshold(&history, tone, 60.0);
        if seen_dash {
            assert!(is_dash, "{tone} ms classified as dot after a shorter dash");
        }
        seen_dash |= is_dash;
    }
    assert!(seen_dash);
}

#[test]
fn pending_marks_empty_when_idle() {
    let mut decoder = CwDecoder::new();
    decoder.record_mark(Mark::Dash, 0.0, 60.0);
    decoder.record_mark(Mark::Dot, 240.0, 60.0);
    decoder.stop_recording_and_decode();
    assert!(!decoder.is_recording());
    assert!(decoder.pending_marks().is_empty());
}
