// Test intent: verifies the Rayon STFT paths against per-frame serial computation.
#![cfg(feature = "parallel")]

use fft_analysis::signal::a4_chord;
use fft_analysis::stft::{parallel_frame_threshold, set_parallel_frame_threshold};
use fft_analysis::{StftConfig, StftProcessor, WindowType};

/// Length of the window applied to each STFT frame.
const WIN_LEN: usize = 256;
/// Hop size determining frame spacing during STFT.
const HOP_LEN: usize = 64;

fn processor() -> StftProcessor<f64> {
    StftProcessor::new(StftConfig::new(WIN_LEN, HOP_LEN, WindowType::Hann)).unwrap()
}

/// Each parallel column equals the serially transformed frame.
#[test]
fn stft_parallel_matches_frames() {
    let _ = env_logger::builder().is_test(true).try_init();
    let signal: Vec<f64> = a4_chord(0.1, 44100.0);
    let p = processor();
    let spectrum = p.stft_parallel(&signal).unwrap();
    assert_eq!(spectrum.cols(), p.frame_count(signal.len()).unwrap());
    for (i, frame) in p.frames(&signal).unwrap().enumerate() {
        assert_eq!(spectrum.column(i), p.transform_frame(frame).unwrap().as_slice());
    }
}

/// Parallel overlap-add equals a serial overlap-add of the same inverse frames.
#[test]
fn istft_parallel_matches_serial_overlap_add() {
    let signal: Vec<f64> = a4_chord(0.1, 44100.0);
    let p = processor();
    let spectrum = p.stft_parallel(&signal).unwrap();
    let restored = p.istft_parallel(&spectrum).unwrap();

    let envelope = p.weight_envelope(spectrum.cols());
    let mut expected = vec![0.0f64; envelope.len()];
    for (i, column) in spectrum.columns().enumerate() {
        let frame = p.inverse_frame(column).unwrap();
        for (e, x) in expected[i * HOP_LEN..].iter_mut().zip(frame) {
            *e += x;
        }
    }
    for (e, w) in expected.iter_mut().zip(&envelope) {
        if *w >= fft_analysis::WEIGHT_FLOOR {
            *e /= *w;
        }
    }
    assert_eq!(restored.len(), expected.len());
    for (a, b) in restored.iter().zip(&expected) {
        assert!((a - b).abs() < 1e-12);
    }
    for i in WIN_LEN..signal.len() - WIN_LEN {
        assert!((restored[i] - signal[i]).abs() < 1e-9);
    }
}

/// Override takes precedence and dispatch through `stft`/`istft` stays consistent.
#[test]
fn threshold_override_and_dispatch() {
    set_parallel_frame_threshold(1);
    assert_eq!(parallel_frame_threshold(), 1);
    let signal: Vec<f64> = a4_chord(0.05, 44100.0);
    let p = processor();
    let dispatched = p.istft(&p.stft(&signal).unwrap()).unwrap();
    set_parallel_frame_threshold(usize::MAX);
    let serial = p.istft(&p.stft(&signal).unwrap()).unwrap();
    set_parallel_frame_threshold(0);
    assert!(parallel_frame_threshold() >= 1);
    assert_eq!(dispatched.len(), serial.len());
    for (a, b) in dispatched.iter().zip(&serial) {
        assert!((a - b).abs() < 1e-12);
    }
}
