//! Fast Fourier Transform (FFT) primitive.
//!
//! Power-of-two lengths run a Stockham auto-sort radix-2 transform over a
//! precomputed twiddle table. Every other length goes through Bluestein's
//! chirp-z algorithm, which re-expresses the DFT as a power-of-two circular
//! convolution. An [`FftPlan`] holds everything precomputed for one length and
//! is immutable, so a single plan can be shared across threads; the
//! [`FftPlanner`] caches plans by length.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;

pub use crate::num::{Complex, Complex32, Complex64, Float};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftError {
    EmptyInput,
    MismatchedLengths,
}

impl fmt::Display for FftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FftError::EmptyInput => f.write_str("FFT input is empty"),
            FftError::MismatchedLengths => f.write_str("FFT buffer length does not match the plan"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FftError {}

/// Forward/inverse complex transform over a fixed-length buffer.
///
/// The forward transform is unnormalized; the inverse scales by `1/n`.
pub trait FftImpl<T: Float> {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn fft(&self, input: &mut [Complex<T>]) -> Result<(), FftError>;
    fn ifft(&self, input: &mut [Complex<T>]) -> Result<(), FftError>;
    fn fft_out_of_place(
        &self,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        if input.len() != output.len() {
            return Err(FftError::MismatchedLengths);
        }
        output.copy_from_slice(input);
        self.fft(output)
    }
    fn ifft_out_of_place(
        &self,
        input: &[Complex<T>],
        output: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        if input.len() != output.len() {
            return Err(FftError::MismatchedLengths);
        }
        output.copy_from_slice(input);
        self.ifft(output)
    }
}

enum Algorithm<T: Float> {
    Identity,
    Stockham {
        /// `exp(-2πi k / n)` for `k = 0..n/2`.
        twiddles: Vec<Complex<T>>,
    },
    Bluestein {
        /// `exp(-πi k² / n)` for `k = 0..n`.
        chirp: Vec<Complex<T>>,
        /// Forward transform of the conjugate chirp, wrapped to length `m`.
        kernel: Vec<Complex<T>>,
        inner: Arc<FftPlan<T>>,
    },
}

/// Precomputed transform for a single length.
pub struct FftPlan<T: Float> {
    n: usize,
    algorithm: Algorithm<T>,
}

/// `exp(-2πi num / den)` evaluated in `f64` before narrowing to `T`.
fn unit_root<T: Float>(num: usize, den: usize) -> Complex<T> {
    let angle = -2.0 * core::f64::consts::PI * (num as f64) / (den as f64);
    let (sin, cos) = libm::sincos(angle);
    Complex::new(T::from_f64(cos), T::from_f64(sin))
}

impl<T: Float> FftPlan<T> {
    pub fn new(n: usize) -> Result<Self, FftError> {
        if n == 0 {
            return Err(FftError::EmptyInput);
        }
        if n == 1 {
            return Ok(Self {
                n,
                algorithm: Algorithm::Identity,
            });
        }
        if n.is_power_of_two() {
            let twiddles = (0..n / 2).map(|k| unit_root(k, n)).collect();
            return Ok(Self {
                n,
                algorithm: Algorithm::Stockham { twiddles },
            });
        }
        let m = (2 * n - 1).next_power_of_two();
        let inner = Arc::new(FftPlan::new(m)?);
        let chirp: Vec<Complex<T>> = chirp_indices(n)
            .map(|idx| unit_root(idx, 2 * n))
            .collect();
        let mut kernel = vec![Complex::zero(); m];
        kernel[0] = chirp[0].conj();
        for k in 1..n {
            let c = chirp[k].conj();
            kernel[k] = c;
            kernel[m - k] = c;
        }
        let mut scratch = vec![Complex::zero(); inner.scratch_len()];
        inner.forward_with_scratch(&mut kernel, &mut scratch)?;
        Ok(Self {
            n,
            algorithm: Algorithm::Bluestein {
                chirp,
                kernel,
                inner,
            },
        })
    }

    /// Length of the scratch buffer required by [`forward_with_scratch`](Self::forward_with_scratch).
    pub fn scratch_len(&self) -> usize {
        match &self.algorithm {
            Algorithm::Identity => 0,
            Algorithm::Stockham { .. } => self.n,
            Algorithm::Bluestein { inner, .. } => inner.len() + inner.scratch_len(),
        }
    }

    /// Whether this plan runs the chirp-z path.
    pub fn is_bluestein(&self) -> bool {
        matches!(self.algorithm, Algorithm::Bluestein { .. })
    }

    /// Forward transform using a caller-provided scratch buffer so hot loops
    /// can avoid per-call allocation.
    pub fn forward_with_scratch(
        &self,
        data: &mut [Complex<T>],
        scratch: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        if data.len() != self.n {
            return Err(FftError::MismatchedLengths);
        }
        if scratch.len() < self.scratch_len() {
            return Err(FftError::MismatchedLengths);
        }
        match &self.algorithm {
            Algorithm::Identity => Ok(()),
            Algorithm::Stockham { twiddles } => {
                stockham(data, twiddles, &mut scratch[..self.n]);
                Ok(())
            }
            Algorithm::Bluestein {
                chirp,
                kernel,
                inner,
            } => {
                let m = inner.len();
                let (work, rest) = scratch.split_at_mut(m);
                for (w, (&x, &c)) in work.iter_mut().zip(data.iter().zip(chirp.iter())) {
                    *w = x * c;
                }
                for w in work[self.n..].iter_mut() {
                    *w = Complex::zero();
                }
                inner.forward_with_scratch(work, rest)?;
                for (w, &k) in work.iter_mut().zip(kernel.iter()) {
                    *w = *w * k;
                }
                inner.inverse_with_scratch(work, rest)?;
                for (out, (&w, &c)) in data.iter_mut().zip(work.iter().zip(chirp.iter())) {
                    *out = w * c;
                }
                Ok(())
            }
        }
    }

    /// Inverse transform (scaled by `1/n`) using a caller-provided scratch buffer.
    pub fn inverse_with_scratch(
        &self,
        data: &mut [Complex<T>],
        scratch: &mut [Complex<T>],
    ) -> Result<(), FftError> {
        for c in data.iter_mut() {
            c.im = -c.im;
        }
        self.forward_with_scratch(data, scratch)?;
        let scale = T::one() / T::from_usize(self.n);
        for c in data.iter_mut() {
            *c = c.conj().scale(scale);
        }
        Ok(())
    }
}

impl<T: Float> FftImpl<T> for FftPlan<T> {
    fn len(&self) -> usize {
        self.n
    }
    fn fft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let mut scratch = vec![Complex::zero(); self.scratch_len()];
        self.forward_with_scratch(input, &mut scratch)
    }
    fn ifft(&self, input: &mut [Complex<T>]) -> Result<(), FftError> {
        let mut scratch = vec![Complex::zero(); self.scratch_len()];
        self.inverse_with_scratch(input, &mut scratch)
    }
}

/// `k² mod 2n` for `k = 0..n`, stepped by `(k+1)² - k² = 2k + 1` so no
/// intermediate exceeds `4n`.
fn chirp_indices(n: usize) -> impl Iterator<Item = usize> {
    let period = 2 * n;
    (0..n).scan(0usize, move |idx, k| {
        let current = *idx;
        *idx = (*idx + (2 * k + 1) % period) % period;
        Some(current)
    })
}

/// Stockham auto-sort radix-2 FFT, ping-ponging between `data` and `scratch`.
fn stockham<T: Float>(data: &mut [Complex<T>], twiddles: &[Complex<T>], scratch: &mut [Complex<T>]) {
    let n = data.len();
    // n1 = number of groups, n2 = size of each group in this pass.
    let mut n1 = 1usize;
    let mut n2 = n;
    let mut result_in_data = true;
    while n1 < n {
        n2 >>= 1;
        if result_in_data {
            stockham_pass(data, scratch, twiddles, n1, n2);
        } else {
            stockham_pass(scratch, data, twiddles, n1, n2);
        }
        result_in_data = !result_in_data;
        n1 <<= 1;
    }
    if !result_in_data {
        data.copy_from_slice(scratch);
    }
}

#[inline]
fn stockham_pass<T: Float>(
    src: &[Complex<T>],
    dst: &mut [Complex<T>],
    twiddles: &[Complex<T>],
    n1: usize,
    n2: usize,
) {
    for k in 0..n1 {
        // exp(-2πi k / (2 n1)) = table[k * n2]
        let w = twiddles[k * n2];
        let even = &src[2 * k * n2..(2 * k + 1) * n2];
        let odd = &src[(2 * k + 1) * n2..(2 * k + 2) * n2];
        let (lo, hi) = dst.split_at_mut((k + n1) * n2);
        let lo = &mut lo[k * n2..(k + 1) * n2];
        let hi = &mut hi[..n2];
        for j in 0..n2 {
            let u = even[j];
            let v = odd[j] * w;
            lo[j] = u + v;
            hi[j] = u - v;
        }
    }
}

/// Caches [`FftPlan`]s by length.
pub struct FftPlanner<T: Float> {
    cache: HashMap<usize, Arc<FftPlan<T>>>,
}

impl<T: Float> Default for FftPlanner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> FftPlanner<T> {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Fetch (or build and cache) the plan for length `n`.
    pub fn plan(&mut self, n: usize) -> Result<Arc<FftPlan<T>>, FftError> {
        if let Some(plan) = self.cache.get(&n) {
            return Ok(Arc::clone(plan));
        }
        let plan = Arc::new(FftPlan::new(n)?);
        self.cache.insert(n, Arc::clone(&plan));
        Ok(plan)
    }

    pub fn cached_lengths(&self) -> usize {
        self.cache.len()
    }
}

/// One-shot forward FFT of an arbitrary-length buffer.
pub fn fft<T: Float>(input: &mut [Complex<T>]) -> Result<(), FftError> {
    FftPlan::new(input.len())?.fft(input)
}

/// One-shot inverse FFT of an arbitrary-length buffer.
pub fn ifft<T: Float>(input: &mut [Complex<T>]) -> Result<(), FftError> {
    FftPlan::new(input.len())?.ifft(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dft(input: &[Complex64]) -> Vec<Complex64> {
        let n = input.len();
        (0..n)
            .map(|k| {
                input
                    .iter()
                    .enumerate()
                    .fold(Complex64::zero(), |acc, (j, &x)| acc + x * unit_root((j * k) % n, n))
            })
            .collect()
    }

    fn ramp(n: usize) -> Vec<Complex64> {
        (0..n)
            .map(|i| Complex64::new(i as f64 * 0.5 - 1.0, (i % 3) as f64))
            .collect()
    }

    #[test]
    fn test_fft_impulse_is_flat() {
        let mut data = vec![Complex64::zero(); 8];
        data[0] = Complex64::new(1.0, 0.0);
        fft(&mut data).unwrap();
        for c in &data {
            assert!((c.re - 1.0).abs() < 1e-12, "re = {}", c.re);
            assert!(c.im.abs() < 1e-12, "im = {}", c.im);
        }
    }

    #[test]
    fn test_power_of_two_matches_dft() {
        for &n in &[2usize, 4, 8, 16, 64] {
            let input = ramp(n);
            let expected = naive_dft(&input);
            let mut data = input.clone();
            fft(&mut data).unwrap();
            for (a, b) in data.iter().zip(expected.iter()) {
                assert!((*a - *b).norm() < 1e-9, "n = {}: {:?} vs {:?}", n, a, b);
            }
        }
    }

    #[test]
    fn test_bluestein_matches_dft() {
        for &n in &[3usize, 5, 6, 12, 200] {
            let plan = FftPlan::<f64>::new(n).unwrap();
            assert!(plan.is_bluestein());
            let input = ramp(n);
            let expected = naive_dft(&input);
            let mut data = input.clone();
            plan.fft(&mut data).unwrap();
            for (a, b) in data.iter().zip(expected.iter()) {
                assert!((*a - *b).norm() < 1e-8, "n = {}: {:?} vs {:?}", n, a, b);
            }
        }
    }

    #[test]
    fn test_roundtrip_f32() {
        let plan = FftPlan::<f32>::new(12).unwrap();
        let orig: Vec<Complex32> = (0..12)
            .map(|i| Complex32::new(i as f32, -(i as f32) * 0.25))
            .collect();
        let mut data = orig.clone();
        plan.fft(&mut data).unwrap();
        plan.ifft(&mut data).unwrap();
        for (a, b) in data.iter().zip(orig.iter()) {
            assert!((a.re - b.re).abs() < 1e-4, "re: {} vs {}", a.re, b.re);
            assert!((a.im - b.im).abs() < 1e-4, "im: {} vs {}", a.im, b.im);
        }
    }

    #[test]
    fn test_single_element_is_identity() {
        let mut data = vec![Complex64::new(42.0, -1.0)];
        fft(&mut data).unwrap();
        ifft(&mut data).unwrap();
        assert_eq!(data[0], Complex64::new(42.0, -1.0));
    }

    #[test]
    fn test_empty_and_mismatched() {
        let mut empty: Vec<Complex64> = Vec::new();
        assert_eq!(fft(&mut empty), Err(FftError::EmptyInput));
        let plan = FftPlan::<f64>::new(4).unwrap();
        let mut short = vec![Complex64::zero(); 3];
        assert_eq!(plan.fft(&mut short), Err(FftError::MismatchedLengths));
        let input = vec![Complex64::zero(); 4];
        let mut output = vec![Complex64::zero(); 5];
        assert_eq!(
            plan.fft_out_of_place(&input, &mut output),
            Err(FftError::MismatchedLengths)
        );
    }

    #[test]
    fn test_scratch_too_small() {
        let plan = FftPlan::<f64>::new(6).unwrap();
        let mut data = vec![Complex64::zero(); 6];
        let mut scratch = vec![Complex64::zero(); 2];
        assert_eq!(
            plan.forward_with_scratch(&mut data, &mut scratch),
            Err(FftError::MismatchedLengths)
        );
    }

    #[test]
    fn test_chirp_indices_match_square_mod() {
        let n = 70_001usize;
        let period = 2 * n as u128;
        for (k, idx) in chirp_indices(n).enumerate() {
            assert_eq!(idx as u128, (k as u128 * k as u128) % period, "k = {}", k);
        }
        assert_eq!(chirp_indices(5).collect::<Vec<_>>(), vec![0, 1, 4, 9, 6]);
    }

    #[test]
    fn test_planner_caches_by_length() {
        let mut planner = FftPlanner::<f64>::new();
        let a = planner.plan(16).unwrap();
        let b = planner.plan(16).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        planner.plan(10).unwrap();
        assert_eq!(planner.cached_lengths(), 2);
        assert_eq!(planner.plan(0).err(), Some(FftError::EmptyInput));
    }
}
