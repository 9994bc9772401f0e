// Test intent: verifies the whole-signal spectrum on the harmonic test signal.

use fft_analysis::metrics::mean_absolute_error;
use fft_analysis::signal::harmonic_series;
use fft_analysis::spectrum::{fft_frequencies, forward, inverse_real, magnitude_spectrum};

/// Sample rate for the harmonic test signal.
const RATE: f64 = 1000.0;

#[test]
fn harmonic_series_peaks() {
    let sig = harmonic_series(5.0f64, 1.0, RATE);
    let spectrum = magnitude_spectrum(&sig.samples, RATE).unwrap();
    assert_eq!(spectrum.len(), 500);
    let expected = [1.0, 0.5, 0.25];
    for (&f, &amp) in sig.frequencies.iter().zip(&expected) {
        let m = spectrum.magnitude_at(f).unwrap();
        assert!((m - amp).abs() < 1e-9, "{} Hz: {}", f, m);
    }
    assert_eq!(spectrum.peak().unwrap().0, 5.0);
    let quiet = spectrum
        .frequencies
        .iter()
        .zip(&spectrum.magnitudes)
        .filter(|(f, _)| !sig.frequencies.contains(f))
        .all(|(_, &m)| m < 1e-9);
    assert!(quiet);
}

#[test]
fn inverse_reconstructs_harmonic_series() {
    let sig = harmonic_series(5.0f64, 1.0, RATE);
    let restored = inverse_real(&forward(&sig.samples).unwrap()).unwrap();
    assert!(mean_absolute_error(&sig.samples, &restored) < 1e-12);
}

#[test]
fn frequency_axis_matches_sample_rate() {
    let f: Vec<f64> = fft_frequencies(8, 8000.0);
    assert_eq!(f, vec![0.0, 1000.0, 2000.0, 3000.0, -4000.0, -3000.0, -2000.0, -1000.0]);
}
