//! Streaming encoder against the offline pipeline.

use warbler_codec::testsignal::linear_sweep;
use warbler_codec::{CodecConfig, Encoder, StrategyKind, StreamEncoder};

const RATE: u32 = 44100;

/// Half a second of sweep under a decaying envelope, so the loudest moment
/// comes early and the running peak settles quickly.
fn decaying_voice() -> Vec<f64> {
    linear_sweep(200.0, 800.0, 0.5, RATE, 0.8)
        .into_iter()
        .enumerate()
        .map(|(n, s)| s * (-(n as f64) / RATE as f64 / 0.15).exp())
        .collect()
}

fn with_block(block: usize) -> CodecConfig {
    CodecConfig {
        block_size: block,
        ..Default::default()
    }
}

fn stream_mono(config: CodecConfig, input: &[f64]) -> Vec<f64> {
    let block = config.block_size;
    let mut stream = StreamEncoder::new(config).unwrap();
    let mut output = vec![0.0; input.len()];
    for (inp, out) in input.chunks(block).zip(output.chunks_mut(block)) {
        stream.process_block(inp, out).unwrap();
    }
    output
}

#[test]
fn test_stream_matches_offline_carrier() {
    let voice = decaying_voice();
    let config = CodecConfig::default();
    let offline = Encoder::new(config.clone()).unwrap().carrier(&voice).unwrap();

    let latency = StreamEncoder::new(config.clone()).unwrap().latency();
    let streamed = stream_mono(config, &voice);

    for m in 3000..voice.len() - latency {
        let diff = (streamed[m + latency] - offline[m]).abs();
        assert!(
            diff < 1e-6,
            "sample {}: streamed {} offline {}",
            m,
            streamed[m + latency],
            offline[m]
        );
    }
}

#[test]
fn test_block_size_does_not_change_output() {
    let voice = decaying_voice();
    let large = stream_mono(with_block(512), &voice);
    let odd = stream_mono(with_block(37), &voice);
    assert_eq!(large, odd);
}

#[test]
fn test_pre_roll_is_silent_and_output_is_bounded() {
    let voice = decaying_voice();
    let config = with_block(256);
    let latency = StreamEncoder::new(config.clone()).unwrap().latency();
    let streamed = stream_mono(config, &voice);

    assert!(streamed[..latency].iter().all(|&s| s == 0.0));
    assert!(streamed[latency..].iter().any(|&s| s != 0.0));
    assert!(streamed.iter().all(|s| s.abs() <= 0.9 + 1e-12));
}

#[test]
fn test_stereo_stream_carries_delayed_voice() {
    let voice = decaying_voice();
    let config = with_block(128);
    assert_eq!(config.strategy, StrategyKind::SecondaryChannel);

    let mut stream = StreamEncoder::new(config.clone()).unwrap();
    let latency = stream.latency();
    let mut left = vec![0.0; voice.len()];
    let mut right = vec![0.0; voice.len()];
    for ((inp, l), r) in voice
        .chunks(128)
        .zip(left.chunks_mut(128))
        .zip(right.chunks_mut(128))
    {
        stream.process_block_stereo(inp, l, r).unwrap();
    }

    assert!(right[..latency].iter().all(|&s| s == 0.0));
    for t in latency..voice.len() {
        assert_eq!(right[t], voice[t - latency] * 0.001);
    }

    // The left channel is the same carrier the mono path produces.
    assert_eq!(left, stream_mono(config, &voice));
}

#[test]
fn test_reset_replays_identically() {
    let voice = decaying_voice();
    let mut stream = StreamEncoder::new(with_block(300)).unwrap();

    let mut first = vec![0.0; 3000];
    for (inp, out) in voice[..3000].chunks(300).zip(first.chunks_mut(300)) {
        stream.process_block(inp, out).unwrap();
    }
    stream.reset();
    let mut second = vec![0.0; 3000];
    for (inp, out) in voice[..3000].chunks(300).zip(second.chunks_mut(300)) {
        stream.process_block(inp, out).unwrap();
    }
    assert_eq!(first, second);
}
