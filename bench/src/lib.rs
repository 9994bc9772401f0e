//! Shared inputs for the criterion benches.

use fft_analysis::signal::a4_chord;

/// Sample rate of the benchmark signal.
pub const SAMPLE_RATE: f64 = 44100.0;

/// Window/hop pairs exercised by the STFT benches.
pub const STFT_SHAPES: [(usize, usize); 3] = [(512, 128), (2048, 512), (1500, 375)];

/// A4/A5/A6 chord of `seconds` length at [`SAMPLE_RATE`].
pub fn chord(seconds: f64) -> Vec<f64> {
    a4_chord(seconds, SAMPLE_RATE)
}
