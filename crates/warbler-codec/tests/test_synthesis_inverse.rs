//! The carrier's pitch and loudness track the voice by a fixed ratio.

use warbler_codec::analytic::analytic;
use warbler_codec::demod::{am, fm, rad_per_sample_to_hz};
use warbler_codec::filter::FirKernel;
use warbler_codec::testsignal::tone;
use warbler_codec::{CodecConfig, Encoder, Waveshape};

const RATE: u32 = 44100;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sine_config(harmonic_multiplier: f64) -> CodecConfig {
    CodecConfig {
        waveshape: Waveshape::Sine,
        harmonic_multiplier,
        ..Default::default()
    }
}

/// Mean pitch in Hz of `signal` over `range`.
fn measured_pitch(signal: &[f64], range: std::ops::Range<usize>) -> f64 {
    let iq = analytic(signal, &FirKernel::hilbert(255).unwrap());
    rad_per_sample_to_hz(mean(&fm(&iq)[range]), RATE as f64)
}

#[test]
fn test_voice_contour_is_measured_in_band() {
    let encoder = Encoder::new(sine_config(1.0)).unwrap();
    let voice = tone(400.0, 0.5, RATE, 0.6);
    let (freq, envelope) = encoder.contours(&voice);

    let interior = 2000..voice.len() - 2000;
    let hz = rad_per_sample_to_hz(mean(&freq[interior.clone()]), RATE as f64);
    assert!((hz - 400.0).abs() < 4.0, "contour {} Hz", hz);
    assert!((mean(&envelope[interior]) - 0.6).abs() < 0.03);
}

#[test]
fn test_carrier_pitch_divides_back_to_voice() {
    let encoder = Encoder::new(sine_config(1.0)).unwrap();
    let voice = tone(400.0, 0.5, RATE, 0.6);
    let carrier = encoder.carrier(&voice).unwrap();

    let bird = measured_pitch(&carrier, 2000..carrier.len() - 2000);
    let expected = 400.0 * encoder.pitch_ratio();
    assert!((bird - expected).abs() / expected < 0.01, "{} vs {}", bird, expected);
    assert!((bird / encoder.pitch_ratio() - 400.0).abs() < 4.0);

    // Steady voice, steady carrier. The peak sits on the band filter's onset
    // ripple, a few percent above the steady level.
    let iq = analytic(&carrier, &FirKernel::hilbert(255).unwrap());
    let envelope = &am(&iq)[2000..carrier.len() - 2000];
    let level = mean(envelope);
    assert!(level > 0.8 && level <= 0.9, "carrier level {}", level);
    assert!(envelope.iter().all(|e| (e - level).abs() < 0.01));
}

#[test]
fn test_harmonic_multiplier_doubles_carrier_pitch() {
    let voice = tone(300.0, 0.5, RATE, 0.6);
    let single = Encoder::new(sine_config(1.0)).unwrap();
    let double = Encoder::new(sine_config(2.0)).unwrap();
    assert!((double.pitch_ratio() - 2.0 * single.pitch_ratio()).abs() < 1e-12);

    let range = 2000..voice.len() - 2000;
    let low = measured_pitch(&single.carrier(&voice).unwrap(), range.clone());
    let high = measured_pitch(&double.carrier(&voice).unwrap(), range);
    assert!((high / low - 2.0).abs() < 0.02, "{} / {}", high, low);
}
