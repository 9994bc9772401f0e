//! # fft-analysis - STFT analysis and overlap-add resynthesis
//!
//! Splits a real signal into overlapping windowed frames, takes the FFT of each
//! frame to build a complex spectrogram, and reconstructs the time-domain
//! signal from that spectrogram by weighted overlap-add. The SNR between the
//! original and the reconstruction measures round-trip fidelity.
//!
//! ```
//! use fft_analysis::{metrics, StftConfig, StftProcessor, WindowType};
//!
//! let signal: Vec<f64> = (0..1000)
//!     .map(|i| (2.0 * std::f64::consts::PI * 10.0 * i as f64 / 1000.0).sin())
//!     .collect();
//! let processor = StftProcessor::new(StftConfig::new(200, 50, WindowType::Hann)).unwrap();
//! let spectrum = processor.stft(&signal).unwrap();
//! assert_eq!(spectrum.shape(), (200, 17));
//! let restored = processor.istft(&spectrum).unwrap();
//! assert!(metrics::rmse_range(&signal, &restored, 200..801) < 1e-9);
//! ```
//!
//! ## Cargo Features
//!
//! - `std` (default): `std::error::Error` impls and CPU-count detection
//! - `parallel`: Rayon frame-parallel STFT/iSTFT, dispatched automatically
//!   above a frame-count threshold
//! - `verbose-logging`: `log` diagnostics from the engine
//! - `serde`: serialization of configuration types and `Complex`
//!
//! Without `std` the crate is `no_std` + `alloc`; all math goes through `libm`.

#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

/// `log` call when `verbose-logging` is enabled, type-checked no-op otherwise.
macro_rules! verbose {
    ($lvl:ident, $($arg:tt)+) => {{
        #[cfg(feature = "verbose-logging")]
        {
            log::$lvl!($($arg)+);
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            if false {
                let _ = alloc::format!($($arg)+);
            }
        }
    }};
}

pub mod num;

/// Complex FFT primitive: Stockham radix-2 plus Bluestein for other lengths.
pub mod fft;

/// Periodic analysis/synthesis windows.
pub mod window;

/// STFT engine and overlap-add reconstruction.
pub mod stft;

pub mod metrics;

/// Whole-signal spectrum helpers.
pub mod spectrum;

pub mod signal;

pub use fft::{FftError, FftPlan, FftPlanner};
pub use num::{Complex, Complex32, Complex64, Float};
pub use stft::{
    ConfigError, Normalization, SpectralMatrix, StftConfig, StftError, StftProcessor,
    WEIGHT_FLOOR,
};
pub use window::WindowType;
