//! Synthetic test signals.

use alloc::vec::Vec;

use crate::num::Float;

/// `round(sample_rate · duration)` evenly spaced instants in `[0, duration)`.
pub fn linspace<T: Float>(duration: T, sample_rate: T) -> Vec<T> {
    let n = libm::round((sample_rate * duration).to_f64()).max(0.0) as usize;
    let step = T::one() / sample_rate;
    (0..n).map(|i| T::from_usize(i) * step).collect()
}

/// `Σ amplitude·sin(2π·freq·t)` over the given `(freq, amplitude)` partials.
pub fn tone_mix<T: Float>(partials: &[(T, T)], duration: T, sample_rate: T) -> Vec<T> {
    let two_pi = T::from_f64(2.0) * T::pi();
    linspace(duration, sample_rate)
        .into_iter()
        .map(|t| {
            partials
                .iter()
                .fold(T::zero(), |acc, &(f, a)| acc + a * (two_pi * f * t).sin())
        })
        .collect()
}

pub fn sine<T: Float>(freq: T, duration: T, sample_rate: T) -> Vec<T> {
    tone_mix(&[(freq, T::one())], duration, sample_rate)
}

/// A generated signal together with its time axis and the frequencies it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSignal<T: Float> {
    pub time: Vec<T>,
    pub samples: Vec<T>,
    pub frequencies: Vec<T>,
}

/// Fundamental plus two harmonics at amplitudes `1`, `0.5` and `0.25`.
pub fn harmonic_series<T: Float>(freq: T, duration: T, sample_rate: T) -> TestSignal<T> {
    let partials = [
        (freq, T::one()),
        (T::from_f64(2.0) * freq, T::from_f64(0.5)),
        (T::from_f64(3.0) * freq, T::from_f64(0.25)),
    ];
    TestSignal {
        time: linspace(duration, sample_rate),
        samples: tone_mix(&partials, duration, sample_rate),
        frequencies: partials.iter().map(|&(f, _)| f).collect(),
    }
}

/// The A4/A5/A6 mixture (440, 880, 1760 Hz at 1.0, 0.5, 0.3).
pub fn a4_chord<T: Float>(duration: T, sample_rate: T) -> Vec<T> {
    let partials = [
        (T::from_f64(440.0), T::one()),
        (T::from_f64(880.0), T::from_f64(0.5)),
        (T::from_f64(1760.0), T::from_f64(0.3)),
    ];
    tone_mix(&partials, duration, sample_rate)
}
