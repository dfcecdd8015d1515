//! Round trips through every embedding strategy, and detection fall-through
//! between them, across carrier waveshapes and voice types.

use warbler_codec::analysis::{dominant_frequency_hz, interior, normalized_cross_correlation};
use warbler_codec::testsignal::{harmonic_glide, linear_sweep, noise_burst};
use warbler_codec::{
    CodecConfig, DecodeOutcome, Decoder, Encoder, SampleBuffer, StrategyKind, Waveshape,
};

const RATE: u32 = 44100;

const SHAPES: [Waveshape; 3] = [
    Waveshape::Sine,
    Waveshape::SineHarmonics {
        second: 0.12,
        third: 0.06,
    },
    Waveshape::SineSawBlend { saw_mix: 0.5 },
];

fn config(strategy: StrategyKind, waveshape: Waveshape) -> CodecConfig {
    CodecConfig {
        strategy,
        waveshape,
        ..Default::default()
    }
}

fn sweep() -> Vec<f64> {
    linear_sweep(200.0, 800.0, 1.0, RATE, 0.8)
}

/// Named test voices: a pure glide, a vowel-like harmonic glide and a
/// breathy noise burst.
fn voices() -> Vec<(&'static str, Vec<f64>)> {
    vec![
        ("sweep", sweep()),
        ("harmonic", harmonic_glide(150.0, 250.0, 1.0, RATE, 5, 0.8)),
        ("noise", noise_burst(5, 1.0, RATE, 1000.0, 0.8).unwrap()),
    ]
}

fn encode(strategy: StrategyKind, waveshape: Waveshape, voice: &[f64]) -> SampleBuffer {
    let encoded = Encoder::new(config(strategy, waveshape))
        .unwrap()
        .encode(&SampleBuffer::mono(voice.to_vec(), RATE))
        .unwrap();
    assert_eq!(encoded.strategy, strategy);
    encoded.buffer
}

fn decoder() -> Decoder {
    Decoder::new(config(StrategyKind::None, Waveshape::default())).unwrap()
}

fn recovered(outcome: DecodeOutcome) -> (StrategyKind, Vec<f64>) {
    match outcome {
        DecodeOutcome::Recovered { strategy, voice } => (strategy, voice.primary().to_vec()),
        DecodeOutcome::NoRecoverableVoice { attempted } => {
            panic!("nothing recovered after {:?}", attempted)
        }
    }
}

fn interior_correlation(a: &[f64], b: &[f64]) -> f64 {
    let span = interior(a.len().min(b.len()), 4096);
    normalized_cross_correlation(&a[span.clone()], &b[span])
}

/// Encodes every voice under every waveshape and checks that auto-detecting
/// decode picks `strategy` and recovers the voice.
fn assert_round_trips(strategy: StrategyKind, min_correlation: f64) {
    let decoder = decoder();
    for (name, voice) in voices() {
        for shape in SHAPES {
            let encoded = encode(strategy, shape, &voice);
            let (detected, out) = recovered(decoder.decode(&encoded).unwrap());
            assert_eq!(detected, strategy, "{} voice on {:?}", name, shape);

            let corr = interior_correlation(&out, &voice);
            assert!(
                corr >= min_correlation,
                "{} voice on {:?}: correlation {}",
                name,
                shape,
                corr
            );
        }
    }
}

#[test]
fn test_secondary_channel_round_trip() {
    assert_round_trips(StrategyKind::SecondaryChannel, 0.999);
}

#[test]
fn test_ultrasonic_round_trip() {
    let encoded = encode(StrategyKind::Ultrasonic, Waveshape::default(), &sweep());
    assert!(!encoded.is_stereo());
    assert_round_trips(StrategyKind::Ultrasonic, 0.95);
}

#[test]
fn test_phase_channel_round_trip() {
    let encoded = encode(StrategyKind::PhaseChannel, Waveshape::default(), &sweep());
    assert!(!encoded.is_stereo());
    assert_round_trips(StrategyKind::PhaseChannel, 0.9);
}

#[test]
fn test_plain_carrier_falls_back_to_inversion() {
    let decoder = decoder();
    for (name, voice) in voices() {
        for shape in SHAPES {
            let plain = encode(StrategyKind::None, shape, &voice);
            assert_eq!(
                decoder.detect(&plain).unwrap(),
                None,
                "{} voice on {:?} looked embedded",
                name,
                shape
            );
        }
    }

    let voice = sweep();
    let (strategy, out) = recovered(
        decoder
            .decode(&encode(StrategyKind::None, Waveshape::Sine, &voice))
            .unwrap(),
    );
    assert_eq!(strategy, StrategyKind::None);
    assert_eq!(out.len(), voice.len());

    // The inversion is best effort: it restores the pitch track, not the
    // waveform. Halfway through, the voice is at 500 Hz.
    let mid = dominant_frequency_hz(&out[19845..24255], RATE);
    assert!((mid - 500.0).abs() < 25.0, "recovered {} Hz", mid);
}

#[test]
fn test_forced_strategies_reject_foreign_payloads() {
    let decoder = decoder();
    let voice = harmonic_glide(150.0, 250.0, 1.0, RATE, 5, 0.8);

    for shape in SHAPES {
        let ultrasonic = encode(StrategyKind::Ultrasonic, shape, &voice);
        let phase = encode(StrategyKind::PhaseChannel, shape, &voice);
        let plain = encode(StrategyKind::None, shape, &voice);

        for (input, foreign) in [
            (&ultrasonic, StrategyKind::PhaseChannel),
            (&ultrasonic, StrategyKind::SecondaryChannel),
            (&phase, StrategyKind::Ultrasonic),
            (&plain, StrategyKind::Ultrasonic),
            (&plain, StrategyKind::PhaseChannel),
        ] {
            let outcome = decoder.decode_with(foreign, input).unwrap();
            assert!(
                !outcome.is_recovered(),
                "{} gate passed on a foreign payload over {:?}",
                foreign,
                shape
            );
        }
    }
}

#[test]
fn test_detection_follows_fixed_order() {
    let voice = sweep();
    let decoder = decoder();
    let shape = Waveshape::SineSawBlend { saw_mix: 0.5 };

    for strategy in [
        StrategyKind::SecondaryChannel,
        StrategyKind::Ultrasonic,
        StrategyKind::PhaseChannel,
    ] {
        assert_eq!(
            decoder.detect(&encode(strategy, shape, &voice)).unwrap(),
            Some(strategy)
        );
    }
    assert_eq!(
        decoder.detect(&encode(StrategyKind::None, shape, &voice)).unwrap(),
        None
    );
}
