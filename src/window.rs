//! Window functions for STFT analysis and synthesis.
//!
//! All generators return *periodic* (DFT-even) windows: the symmetric window of
//! length `len + 1` with its final sample dropped. This is the variant whose
//! shifted copies tile cleanly under overlap-add.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::num::Float;

/// Supported analysis/synthesis windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WindowType {
    #[default]
    Hann,
    Hamming,
    Blackman,
    Bartlett,
}

impl WindowType {
    pub const ALL: [WindowType; 4] = [
        WindowType::Hann,
        WindowType::Hamming,
        WindowType::Blackman,
        WindowType::Bartlett,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WindowType::Hann => "hann",
            WindowType::Hamming => "hamming",
            WindowType::Blackman => "blackman",
            WindowType::Bartlett => "bartlett",
        }
    }

    /// Generate `len` coefficients of this window.
    pub fn generate<T: Float>(self, len: usize) -> Vec<T> {
        match self {
            WindowType::Hann => hann(len),
            WindowType::Hamming => hamming(len),
            WindowType::Blackman => blackman(len),
            WindowType::Bartlett => bartlett(len),
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name that did not match any [`WindowType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWindow(pub String);

impl fmt::Display for UnknownWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported window type `{}` (supported: hann, hamming, blackman, bartlett)",
            self.0
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownWindow {}

impl FromStr for WindowType {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        WindowType::ALL
            .iter()
            .copied()
            .find(|w| w.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownWindow(String::from(name)))
    }
}

/// Sum of cosines `Σ (-1)^k a_k cos(2πk n / len)`, the shared form of the
/// Hann, Hamming and Blackman windows.
fn cosine_sum<T: Float>(len: usize, coeffs: &[f64]) -> Vec<T> {
    if len == 1 {
        return alloc::vec![T::one()];
    }
    (0..len)
        .map(|n| {
            let x = 2.0 * core::f64::consts::PI * n as f64 / len as f64;
            let v = coeffs.iter().enumerate().fold(0.0, |acc, (k, &a)| {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                acc + sign * a * libm::cos(k as f64 * x)
            });
            T::from_f64(v)
        })
        .collect()
}

/// Generate a Hann window of length `len`.
pub fn hann<T: Float>(len: usize) -> Vec<T> {
    cosine_sum(len, &[0.5, 0.5])
}

/// Generate a Hamming window of length `len`.
pub fn hamming<T: Float>(len: usize) -> Vec<T> {
    cosine_sum(len, &[0.54, 0.46])
}

/// Generate a Blackman window of length `len`.
pub fn blackman<T: Float>(len: usize) -> Vec<T> {
    cosine_sum(len, &[0.42, 0.5, 0.08])
}

/// Generate a Bartlett (triangular, zero endpoints) window of length `len`.
pub fn bartlett<T: Float>(len: usize) -> Vec<T> {
    if len == 1 {
        return alloc::vec![T::one()];
    }
    let half = len as f64 / 2.0;
    (0..len)
        .map(|n| T::from_f64(1.0 - libm::fabs(n as f64 - half) / half))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_hann() {
        let w: Vec<f64> = hann(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-12);
        assert!((w[4] - 1.0).abs() < 1e-12);
        // periodic: w[n] == w[len - n]
        for n in 1..8 {
            assert!((w[n] - w[8 - n]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_hamming() {
        let w: Vec<f32> = hamming(8);
        assert!((w[0] - 0.08).abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!(w.iter().all(|&x| (0.0..=1.0 + 1e-6).contains(&x)));
    }

    #[test]
    fn test_blackman() {
        let w: Vec<f64> = blackman(8);
        assert!(w[0].abs() < 1e-12);
        assert!((w[4] - 1.0).abs() < 1e-12);
        assert!(w.iter().all(|&x| (-1e-12..=1.0 + 1e-12).contains(&x)));
    }

    #[test]
    fn test_bartlett() {
        let w: Vec<f64> = bartlett(8);
        assert_eq!(w, vec![0.0, 0.25, 0.5, 0.75, 1.0, 0.75, 0.5, 0.25]);
    }

    #[test]
    fn test_degenerate_lengths() {
        for kind in WindowType::ALL {
            assert!(kind.generate::<f64>(0).is_empty());
            assert_eq!(kind.generate::<f64>(1), vec![1.0]);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("hann".parse::<WindowType>(), Ok(WindowType::Hann));
        assert_eq!(" Hamming ".parse::<WindowType>(), Ok(WindowType::Hamming));
        assert_eq!("BLACKMAN".parse::<WindowType>(), Ok(WindowType::Blackman));
        assert_eq!("bartlett".parse::<WindowType>(), Ok(WindowType::Bartlett));
        assert_eq!(
            "kaiser".parse::<WindowType>(),
            Err(UnknownWindow(String::from("kaiser")))
        );
        for kind in WindowType::ALL {
            assert_eq!(kind.name().parse::<WindowType>(), Ok(kind));
        }
    }
}
