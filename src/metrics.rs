//! Reconstruction fidelity metrics.
//!
//! Every metric compares the common prefix of its two inputs, so a
//! reconstruction that is shorter or longer than the original is still
//! measurable.

use core::ops::Range;

use crate::num::Float;

fn common<'a, T>(a: &'a [T], b: &'a [T]) -> (&'a [T], &'a [T]) {
    let n = a.len().min(b.len());
    (&a[..n], &b[..n])
}

/// Signal-to-noise ratio in decibels: `10·log10(Σ original² / Σ (original - reconstructed)²)`.
///
/// Perfect reconstruction yields `+∞`. Two all-zero signals yield `NaN`.
pub fn snr_db<T: Float>(original: &[T], reconstructed: &[T]) -> T {
    let (x, y) = common(original, reconstructed);
    let mut signal = T::zero();
    let mut noise = T::zero();
    for (&a, &b) in x.iter().zip(y) {
        let d = a - b;
        signal += a * a;
        noise += d * d;
    }
    if noise == T::zero() {
        return if signal == T::zero() {
            T::nan()
        } else {
            T::infinity()
        };
    }
    T::from_f64(10.0) * (signal / noise).log10()
}

/// Root-mean-square error over the common prefix. Zero for empty input.
pub fn rmse<T: Float>(a: &[T], b: &[T]) -> T {
    let (x, y) = common(a, b);
    if x.is_empty() {
        return T::zero();
    }
    let sum = x.iter().zip(y).fold(T::zero(), |acc, (&p, &q)| {
        let d = p - q;
        acc + d * d
    });
    (sum / T::from_usize(x.len())).sqrt()
}

/// [`rmse`] restricted to `range`, clamped to the common prefix.
pub fn rmse_range<T: Float>(a: &[T], b: &[T], range: Range<usize>) -> T {
    let (x, y) = common(a, b);
    let end = range.end.min(x.len());
    let start = range.start.min(end);
    rmse(&x[start..end], &y[start..end])
}

/// Mean absolute difference over the common prefix. Zero for empty input.
pub fn mean_absolute_error<T: Float>(a: &[T], b: &[T]) -> T {
    let (x, y) = common(a, b);
    if x.is_empty() {
        return T::zero();
    }
    let sum = x
        .iter()
        .zip(y)
        .fold(T::zero(), |acc, (&p, &q)| acc + (p - q).abs());
    sum / T::from_usize(x.len())
}
