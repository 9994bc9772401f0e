//! Short-Time Fourier Transform (STFT) with overlap-add reconstruction.
//!
//! A [`StftProcessor`] owns a validated [`StftConfig`], the window generated
//! from it and an FFT plan for the window length. It is immutable after
//! construction, so one processor can serve any number of signals, from any
//! number of threads.
//!
//! Forward path: `signal → frames → window → FFT → SpectralMatrix` (one column
//! per frame, full two-sided spectrum, no normalization).
//!
//! Inverse path: `SpectralMatrix → iFFT → real part → window → overlap-add`,
//! followed by division by the accumulated per-sample window weight.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::fft::{FftError, FftPlan, FftPlanner};
use crate::num::{Complex, Float};
use crate::window::WindowType;

/// Accumulated window weight below which the overlap-add divisor is treated as 1.
pub const WEIGHT_FLOOR: f64 = 1e-6;

/// Weight deposited by every frame into the overlap-add normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Normalization {
    /// `w[n]²`: analysis and synthesis windows are both applied, so dividing by
    /// the squared-window sum restores unit gain for any window/hop pair.
    #[default]
    WindowEnergy,
    /// `w[n]`: divides by the plain window sum. Leaves an overlap-dependent gain.
    WindowSum,
}

/// Reason a configuration was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedWindow(String),
    ZeroWindowSize,
    ZeroHopLength,
    HopExceedsWindow { hop_length: usize, window_size: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedWindow(name) => write!(
                f,
                "unsupported window type `{}` (supported: hann, hamming, blackman, bartlett)",
                name
            ),
            ConfigError::ZeroWindowSize => f.write_str("window size must be positive"),
            ConfigError::ZeroHopLength => f.write_str("hop length must be positive"),
            ConfigError::HopExceedsWindow {
                hop_length,
                window_size,
            } => write!(
                f,
                "hop length {} exceeds window size {}",
                hop_length, window_size
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StftError {
    InvalidConfiguration(ConfigError),
    InputTooShort { signal_len: usize, window_size: usize },
    DimensionMismatch { expected: usize, found: usize },
    /// A spectral matrix needs at least one column.
    EmptySpectrum,
    Fft(FftError),
}

impl fmt::Display for StftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StftError::InvalidConfiguration(e) => write!(f, "invalid STFT configuration: {}", e),
            StftError::InputTooShort {
                signal_len,
                window_size,
            } => write!(
                f,
                "signal of {} samples is shorter than the {}-sample window",
                signal_len, window_size
            ),
            StftError::DimensionMismatch { expected, found } => write!(
                f,
                "spectral matrix has {} rows, expected {}",
                found, expected
            ),
            StftError::EmptySpectrum => f.write_str("spectral matrix has no frames"),
            StftError::Fft(e) => write!(f, "FFT failed: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StftError::Fft(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FftError> for StftError {
    fn from(e: FftError) -> Self {
        StftError::Fft(e)
    }
}

impl From<ConfigError> for StftError {
    fn from(e: ConfigError) -> Self {
        StftError::InvalidConfiguration(e)
    }
}

/// Framing and windowing parameters. Validated by [`StftProcessor::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StftConfig {
    pub window_size: usize,
    pub hop_length: usize,
    pub window_type: WindowType,
    pub normalization: Normalization,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            hop_length: 512,
            window_type: WindowType::Hann,
            normalization: Normalization::WindowEnergy,
        }
    }
}

impl StftConfig {
    pub fn new(window_size: usize, hop_length: usize, window_type: WindowType) -> Self {
        Self {
            window_size,
            hop_length,
            window_type,
            normalization: Normalization::default(),
        }
    }

    /// Build and validate a configuration from a window name such as `"hann"`.
    pub fn from_names(
        window_size: usize,
        hop_length: usize,
        window: &str,
    ) -> Result<Self, StftError> {
        let window_type = window
            .parse::<WindowType>()
            .map_err(|e| ConfigError::UnsupportedWindow(e.0))?;
        let config = Self::new(window_size, hop_length, window_type);
        config.validate()?;
        Ok(config)
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn validate(&self) -> Result<(), StftError> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindowSize.into());
        }
        if self.hop_length == 0 {
            return Err(ConfigError::ZeroHopLength.into());
        }
        if self.hop_length > self.window_size {
            return Err(ConfigError::HopExceedsWindow {
                hop_length: self.hop_length,
                window_size: self.window_size,
            }
            .into());
        }
        Ok(())
    }

    /// `1 + floor((signal_len - window_size) / hop_length)`.
    pub fn frame_count(&self, signal_len: usize) -> Result<usize, StftError> {
        if signal_len < self.window_size {
            return Err(StftError::InputTooShort {
                signal_len,
                window_size: self.window_size,
            });
        }
        Ok(1 + (signal_len - self.window_size) / self.hop_length)
    }

    /// Length of the signal reconstructed from `frame_count` frames.
    pub fn output_len(&self, frame_count: usize) -> usize {
        match frame_count {
            0 => 0,
            n => (n - 1) * self.hop_length + self.window_size,
        }
    }
}

/// Complex spectra of successive frames, shape `bins × frames`.
///
/// Stored column-contiguous: column `i` is the spectrum of frame `i`, row `k`
/// is frequency bin `k` of the full two-sided spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralMatrix<T: Float> {
    rows: usize,
    cols: usize,
    data: Vec<Complex<T>>,
}

impl<T: Float> SpectralMatrix<T> {
    fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Complex::zero(); rows * cols],
        }
    }

    /// Assemble a matrix from per-frame spectra. All columns must share a length.
    pub fn from_columns(columns: Vec<Vec<Complex<T>>>) -> Result<Self, StftError> {
        let rows = match columns.first() {
            Some(c) if !c.is_empty() => c.len(),
            _ => return Err(StftError::EmptySpectrum),
        };
        let cols = columns.len();
        let mut data = Vec::with_capacity(rows * cols);
        for column in columns {
            if column.len() != rows {
                return Err(StftError::DimensionMismatch {
                    expected: rows,
                    found: column.len(),
                });
            }
            data.extend_from_slice(&column);
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(frequency bins, frames)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn column(&self, frame: usize) -> &[Complex<T>] {
        &self.data[frame * self.rows..(frame + 1) * self.rows]
    }

    pub fn column_mut(&mut self, frame: usize) -> &mut [Complex<T>] {
        &mut self.data[frame * self.rows..(frame + 1) * self.rows]
    }

    pub fn columns(&self) -> core::slice::ChunksExact<'_, Complex<T>> {
        self.data.chunks_exact(self.rows)
    }

    pub fn get(&self, bin: usize, frame: usize) -> Option<Complex<T>> {
        if bin < self.rows && frame < self.cols {
            Some(self.data[frame * self.rows + bin])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[Complex<T>] {
        &self.data
    }

    /// Real parts as nested rows (`[bin][frame]`).
    pub fn real_parts(&self) -> Vec<Vec<T>> {
        self.nested(|c| c.re)
    }

    /// Imaginary parts as nested rows (`[bin][frame]`).
    pub fn imag_parts(&self) -> Vec<Vec<T>> {
        self.nested(|c| c.im)
    }

    /// Magnitudes as nested rows (`[bin][frame]`).
    pub fn magnitudes(&self) -> Vec<Vec<T>> {
        self.nested(|c| c.norm())
    }

    fn nested(&self, f: impl Fn(Complex<T>) -> T) -> Vec<Vec<T>> {
        (0..self.rows)
            .map(|bin| self.columns().map(|col| f(col[bin])).collect())
            .collect()
    }
}

/// Iterator over the full frames of a signal, `window_size` samples every
/// `hop_length` samples. Trailing samples that do not fill a frame are skipped.
#[derive(Debug, Clone)]
pub struct Frames<'a, T> {
    signal: &'a [T],
    window_size: usize,
    hop_length: usize,
    next: usize,
    count: usize,
}

impl<'a, T> Iterator for Frames<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let start = self.next * self.hop_length;
        self.next += 1;
        Some(&self.signal[start..start + self.window_size])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next;
        (left, Some(left))
    }
}

impl<T> ExactSizeIterator for Frames<'_, T> {}

/// STFT/iSTFT engine for one fixed configuration.
pub struct StftProcessor<T: Float = f64> {
    config: StftConfig,
    window: Vec<T>,
    /// Per-sample overlap-add weight: `w²` or `w` depending on normalization.
    weights: Vec<T>,
    plan: Arc<FftPlan<T>>,
}

impl<T: Float> StftProcessor<T> {
    pub fn new(config: StftConfig) -> Result<Self, StftError> {
        config.validate()?;
        let plan = Arc::new(FftPlan::new(config.window_size)?);
        Ok(Self::build(config, plan))
    }

    /// Construct sharing cached FFT plans with other processors.
    pub fn with_planner(config: StftConfig, planner: &mut FftPlanner<T>) -> Result<Self, StftError> {
        config.validate()?;
        let plan = planner.plan(config.window_size)?;
        Ok(Self::build(config, plan))
    }

    fn build(config: StftConfig, plan: Arc<FftPlan<T>>) -> Self {
        let window: Vec<T> = config.window_type.generate(config.window_size);
        let weights = match config.normalization {
            Normalization::WindowEnergy => window.iter().map(|&w| w * w).collect(),
            Normalization::WindowSum => window.clone(),
        };
        verbose!(
            debug,
            "stft processor: window={} size={} hop={} normalization={:?} bluestein={}",
            config.window_type,
            config.window_size,
            config.hop_length,
            config.normalization,
            plan.is_bluestein()
        );
        Self {
            config,
            window,
            weights,
            plan,
        }
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }

    pub fn window(&self) -> &[T] {
        &self.window
    }

    pub fn window_size(&self) -> usize {
        self.config.window_size
    }

    pub fn hop_length(&self) -> usize {
        self.config.hop_length
    }

    pub fn frame_count(&self, signal_len: usize) -> Result<usize, StftError> {
        self.config.frame_count(signal_len)
    }

    /// Frames of `signal` in analysis order.
    pub fn frames<'a>(&self, signal: &'a [T]) -> Result<Frames<'a, T>, StftError> {
        let count = self.frame_count(signal.len())?;
        Ok(Frames {
            signal,
            window_size: self.config.window_size,
            hop_length: self.config.hop_length,
            next: 0,
            count,
        })
    }

    fn scratch(&self) -> Vec<Complex<T>> {
        vec![Complex::zero(); self.plan.scratch_len()]
    }

    fn forward_into(
        &self,
        frame: &[T],
        out: &mut [Complex<T>],
        scratch: &mut [Complex<T>],
    ) -> Result<(), StftError> {
        for ((o, &x), &w) in out.iter_mut().zip(frame).zip(&self.window) {
            *o = Complex::from_real(x * w);
        }
        self.plan.forward_with_scratch(out, scratch)?;
        Ok(())
    }

    fn inverse_into(
        &self,
        column: &[Complex<T>],
        buf: &mut [Complex<T>],
        out: &mut [T],
        scratch: &mut [Complex<T>],
    ) -> Result<(), StftError> {
        buf.copy_from_slice(column);
        self.plan.inverse_with_scratch(buf, scratch)?;
        for ((o, c), &w) in out.iter_mut().zip(buf.iter()).zip(&self.window) {
            *o = c.re * w;
        }
        Ok(())
    }

    /// Windowed forward transform of a single `window_size`-sample frame.
    pub fn transform_frame(&self, frame: &[T]) -> Result<Vec<Complex<T>>, StftError> {
        if frame.len() != self.config.window_size {
            return Err(StftError::DimensionMismatch {
                expected: self.config.window_size,
                found: frame.len(),
            });
        }
        let mut out = vec![Complex::zero(); frame.len()];
        self.forward_into(frame, &mut out, &mut self.scratch())?;
        Ok(out)
    }

    /// Real part of the inverse transform of one column, re-windowed.
    pub fn inverse_frame(&self, column: &[Complex<T>]) -> Result<Vec<T>, StftError> {
        self.check_rows(column.len())?;
        let mut buf = column.to_vec();
        let mut out = vec![T::zero(); column.len()];
        self.inverse_into(column, &mut buf, &mut out, &mut self.scratch())?;
        Ok(out)
    }

    fn check_rows(&self, rows: usize) -> Result<(), StftError> {
        if rows != self.config.window_size {
            return Err(StftError::DimensionMismatch {
                expected: self.config.window_size,
                found: rows,
            });
        }
        Ok(())
    }

    /// Forward STFT: one spectral column per full frame of `signal`.
    pub fn stft(&self, signal: &[T]) -> Result<SpectralMatrix<T>, StftError> {
        #[cfg(feature = "parallel")]
        {
            let frames = self.frame_count(signal.len())?;
            if should_parallelize(frames) {
                return self.stft_parallel(signal);
            }
        }
        self.stft_serial(signal)
    }

    fn stft_serial(&self, signal: &[T]) -> Result<SpectralMatrix<T>, StftError> {
        let frames = self.frames(signal)?;
        verbose!(debug, "stft: {} samples -> {} frames", signal.len(), frames.len());
        let mut matrix = SpectralMatrix::zeros(self.config.window_size, frames.len());
        let mut scratch = self.scratch();
        for (i, frame) in frames.enumerate() {
            self.forward_into(frame, matrix.column_mut(i), &mut scratch)?;
        }
        Ok(matrix)
    }

    /// Inverse STFT by weighted overlap-add.
    ///
    /// Output length is `(frames - 1) * hop_length + window_size`.
    pub fn istft(&self, spectrum: &SpectralMatrix<T>) -> Result<Vec<T>, StftError> {
        self.check_rows(spectrum.rows())?;
        #[cfg(feature = "parallel")]
        {
            if should_parallelize(spectrum.cols()) {
                return self.istft_parallel(spectrum);
            }
        }
        let len = self.config.output_len(spectrum.cols());
        verbose!(debug, "istft: {} frames -> {} samples", spectrum.cols(), len);
        let mut accum = vec![T::zero(); len];
        let mut buf = vec![Complex::zero(); self.config.window_size];
        let mut frame = vec![T::zero(); self.config.window_size];
        let mut scratch = self.scratch();
        for (i, column) in spectrum.columns().enumerate() {
            self.inverse_into(column, &mut buf, &mut frame, &mut scratch)?;
            let start = i * self.config.hop_length;
            for (a, &x) in accum[start..start + frame.len()].iter_mut().zip(&frame) {
                *a += x;
            }
        }
        Ok(self.normalize(accum, spectrum.cols()))
    }

    /// Per-sample overlap-add weight for `frame_count` frames.
    pub fn weight_envelope(&self, frame_count: usize) -> Vec<T> {
        let mut envelope = vec![T::zero(); self.config.output_len(frame_count)];
        for i in 0..frame_count {
            let start = i * self.config.hop_length;
            for (e, &w) in envelope[start..start + self.weights.len()]
                .iter_mut()
                .zip(&self.weights)
            {
                *e += w;
            }
        }
        envelope
    }

    fn normalize(&self, mut accum: Vec<T>, frame_count: usize) -> Vec<T> {
        let floor = T::from_f64(WEIGHT_FLOOR);
        let envelope = self.weight_envelope(frame_count);
        let mut floored = 0usize;
        for (a, &w) in accum.iter_mut().zip(&envelope) {
            if w < floor {
                floored += 1;
            } else {
                *a = *a / w;
            }
        }
        verbose!(trace, "istft: {} samples below the weight floor", floored);
        accum
    }
}

#[cfg(feature = "parallel")]
mod parallel {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use rayon::prelude::*;
    use std::sync::OnceLock;

    /// `0` means no override.
    static PARALLEL_FRAME_THRESHOLD_OVERRIDE: AtomicUsize = AtomicUsize::new(0);
    static PARALLEL_FRAME_THRESHOLD_ENV: OnceLock<usize> = OnceLock::new();

    /// Environment variable holding the minimum frame count for parallel dispatch.
    pub const PARALLEL_FRAME_THRESHOLD_ENV_VAR: &str = "FFT_ANALYSIS_PAR_MIN_FRAMES";

    /// Set the minimum frame count at which [`StftProcessor::stft`] and
    /// [`StftProcessor::istft`] switch to the Rayon path.
    ///
    /// Passing `0` reverts to the environment variable or the built-in heuristic.
    pub fn set_parallel_frame_threshold(frames: usize) {
        PARALLEL_FRAME_THRESHOLD_OVERRIDE.store(frames, Ordering::Relaxed);
    }

    /// Current parallel dispatch threshold, in frames.
    pub fn parallel_frame_threshold() -> usize {
        let override_frames = PARALLEL_FRAME_THRESHOLD_OVERRIDE.load(Ordering::Relaxed);
        if override_frames != 0 {
            return override_frames;
        }
        *PARALLEL_FRAME_THRESHOLD_ENV.get_or_init(|| {
            std::env::var(PARALLEL_FRAME_THRESHOLD_ENV_VAR)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|&v| v != 0)
                .unwrap_or_else(|| 4 * num_cpus::get().max(1))
        })
    }

    pub(super) fn should_parallelize(frames: usize) -> bool {
        let threshold = parallel_frame_threshold();
        let parallel = frames >= threshold;
        verbose!(
            trace,
            "stft dispatch: {} frames, threshold {}, parallel={}",
            frames,
            threshold,
            parallel
        );
        parallel
    }

    impl<T: Float> StftProcessor<T> {
        /// Forward STFT with frames distributed over the Rayon pool.
        ///
        /// Each worker writes only its own column.
        pub fn stft_parallel(&self, signal: &[T]) -> Result<SpectralMatrix<T>, StftError> {
            let frames = self.frame_count(signal.len())?;
            let size = self.config.window_size;
            let hop = self.config.hop_length;
            let mut matrix = SpectralMatrix::zeros(size, frames);
            matrix
                .data
                .par_chunks_mut(size)
                .enumerate()
                .try_for_each_init(
                    || self.scratch(),
                    |scratch, (i, column)| {
                        let start = i * hop;
                        self.forward_into(&signal[start..start + size], column, scratch)
                    },
                )?;
            Ok(matrix)
        }

        /// Inverse STFT with per-frame synthesis on the Rayon pool.
        ///
        /// Frames overlap in the output, so each worker produces a private
        /// partial frame and the partials are summed in frame order afterwards.
        pub fn istft_parallel(&self, spectrum: &SpectralMatrix<T>) -> Result<Vec<T>, StftError> {
            self.check_rows(spectrum.rows())?;
            let size = self.config.window_size;
            let partials: Vec<Vec<T>> = spectrum
                .data
                .par_chunks(size)
                .map_init(
                    || (self.scratch(), vec![Complex::zero(); size]),
                    |(scratch, buf), column| {
                        let mut out = vec![T::zero(); size];
                        self.inverse_into(column, buf, &mut out, scratch)?;
                        Ok::<_, StftError>(out)
                    },
                )
                .collect::<Result<_, StftError>>()?;
            let mut accum = vec![T::zero(); self.config.output_len(partials.len())];
            for (i, partial) in partials.iter().enumerate() {
                let start = i * self.config.hop_length;
                for (a, &x) in accum[start..start + size].iter_mut().zip(partial) {
                    *a += x;
                }
            }
            Ok(self.normalize(accum, partials.len()))
        }
    }
}

#[cfg(feature = "parallel")]
use parallel::should_parallelize;
#[cfg(feature = "parallel")]
pub use parallel::{
    parallel_frame_threshold, set_parallel_frame_threshold, PARALLEL_FRAME_THRESHOLD_ENV_VAR,
};
