//! Whole-signal spectrum helpers: bin frequencies, one-sided magnitude
//! spectrum and real-valued inverse.

use alloc::vec::Vec;

use crate::fft::{FftError, FftPlan};
use crate::num::{Complex, Float};

/// Centre frequency of each FFT bin, in the usual two-sided order:
/// `0, 1, …, ⌈n/2⌉-1, -⌊n/2⌋, …, -1`, scaled by `sample_rate / n`.
pub fn fft_frequencies<T: Float>(n: usize, sample_rate: T) -> Vec<T> {
    if n == 0 {
        return Vec::new();
    }
    let step = sample_rate / T::from_usize(n);
    let positive = n.div_ceil(2);
    (0..n)
        .map(|k| {
            if k < positive {
                T::from_usize(k) * step
            } else {
                -(T::from_usize(n - k) * step)
            }
        })
        .collect()
}

/// One-sided magnitude spectrum of a real signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum<T: Float> {
    pub frequencies: Vec<T>,
    pub magnitudes: Vec<T>,
}

impl<T: Float> Spectrum<T> {
    /// `(frequency, magnitude)` of the strongest bin.
    pub fn peak(&self) -> Option<(T, T)> {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .fold(None, |best: Option<(T, T)>, (&f, &m)| match best {
                Some((_, bm)) if bm >= m => best,
                _ => Some((f, m)),
            })
    }

    /// Magnitude of the bin closest to `frequency`.
    pub fn magnitude_at(&self, frequency: T) -> Option<T> {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .fold(None, |best: Option<(T, T)>, (&f, &m)| {
                let d = (f - frequency).abs();
                match best {
                    Some((bd, _)) if bd <= d => best,
                    _ => Some((d, m)),
                }
            })
            .map(|(_, m)| m)
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

/// Full complex FFT of a real signal.
pub fn forward<T: Float>(signal: &[T]) -> Result<Vec<Complex<T>>, FftError> {
    let plan = FftPlan::new(signal.len())?;
    let mut data: Vec<Complex<T>> = signal.iter().map(|&x| Complex::from_real(x)).collect();
    let mut scratch = alloc::vec![Complex::zero(); plan.scratch_len()];
    plan.forward_with_scratch(&mut data, &mut scratch)?;
    Ok(data)
}

/// Real part of the inverse FFT.
pub fn inverse_real<T: Float>(spectrum: &[Complex<T>]) -> Result<Vec<T>, FftError> {
    let plan = FftPlan::new(spectrum.len())?;
    let mut data = spectrum.to_vec();
    let mut scratch = alloc::vec![Complex::zero(); plan.scratch_len()];
    plan.inverse_with_scratch(&mut data, &mut scratch)?;
    Ok(data.into_iter().map(|c| c.re).collect())
}

/// Magnitudes `|X[k]|·2/n` of the non-negative frequency bins.
pub fn magnitude_spectrum<T: Float>(signal: &[T], sample_rate: T) -> Result<Spectrum<T>, FftError> {
    let n = signal.len();
    let bins = forward(signal)?;
    let scale = T::from_f64(2.0) / T::from_usize(n);
    let (frequencies, magnitudes) = fft_frequencies(n, sample_rate)
        .into_iter()
        .zip(bins)
        .filter(|(f, _)| *f >= T::zero())
        .map(|(f, c)| (f, c.norm() * scale))
        .unzip();
    Ok(Spectrum {
        frequencies,
        magnitudes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_frequencies_layout() {
        assert_eq!(
            fft_frequencies(4, 4.0f64),
            vec![0.0, 1.0, -2.0, -1.0]
        );
        assert_eq!(
            fft_frequencies(5, 10.0f64),
            vec![0.0, 2.0, 4.0, -4.0, -2.0]
        );
        assert!(fft_frequencies::<f64>(0, 1.0).is_empty());
    }

    #[test]
    fn test_magnitude_of_pure_tone() {
        let rate = 64.0f64;
        let signal: Vec<f64> = (0..64)
            .map(|i| 0.5 * libm::sin(2.0 * core::f64::consts::PI * 8.0 * i as f64 / rate))
            .collect();
        let spectrum = magnitude_spectrum(&signal, rate).unwrap();
        assert_eq!(spectrum.len(), 32);
        let (f, m) = spectrum.peak().unwrap();
        assert_eq!(f, 8.0);
        assert!((m - 0.5).abs() < 1e-9);
        assert!(spectrum.magnitude_at(20.2).unwrap() < 1e-9);
    }

    #[test]
    fn test_inverse_real_recovers_signal() {
        let signal = vec![0.25f64, -1.0, 3.0, 0.5, 2.0];
        let back = inverse_real(&forward(&signal).unwrap()).unwrap();
        for (a, b) in signal.iter().zip(&back) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(forward::<f64>(&[]), Err(FftError::EmptyInput));
        assert_eq!(
            magnitude_spectrum::<f64>(&[], 1.0).err(),
            Some(FftError::EmptyInput)
        );
    }
}
