use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fft_analysis::{Normalization, StftConfig};
use fft_analysis_demo::{
    date_stamp, run_fft, run_stft, FftExperiment, SignalSource, StftExperiment,
};
use log::info;

/// Frequency-domain analysis experiments: STFT round trip and full-signal FFT.
#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// STFT analysis and overlap-add reconstruction of a test chord or WAV file
    Stft {
        /// Samples per frame
        #[arg(long, default_value_t = 2048)]
        window_size: usize,

        /// Samples between frame starts
        #[arg(long, default_value_t = 512)]
        hop_length: usize,

        /// Window function: hann, hamming, blackman or bartlett
        #[arg(long, default_value = "hann")]
        window: String,

        /// Divide by the plain window sum instead of the squared window sum
        #[arg(long)]
        legacy_normalization: bool,

        /// Analyze this WAV file instead of the synthetic A4/A5/A6 chord
        #[arg(long)]
        input: Option<PathBuf>,

        /// Sample rate of the synthetic chord
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,

        /// Length of the synthetic chord in seconds
        #[arg(long, default_value_t = 1.0)]
        duration: f64,

        #[arg(long, default_value_t = 1)]
        experiment_id: u32,

        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// FFT and inverse FFT of a three-partial harmonic signal
    Fft {
        /// Fundamental frequency in Hz
        #[arg(long, default_value_t = 5.0)]
        frequency: f64,

        #[arg(long, default_value_t = 1000.0)]
        sample_rate: f64,

        #[arg(long, default_value_t = 1.0)]
        duration: f64,

        #[arg(long, default_value_t = 1)]
        experiment_id: u32,

        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Stft {
            window_size,
            hop_length,
            window,
            legacy_normalization,
            input,
            sample_rate,
            duration,
            experiment_id,
            output_dir,
        } => {
            let mut config = StftConfig::from_names(window_size, hop_length, &window)?;
            if legacy_normalization {
                config = config.with_normalization(Normalization::WindowSum);
            }
            let source = match input {
                Some(path) => SignalSource::Wav(path),
                None => SignalSource::Chord {
                    duration,
                    sample_rate,
                },
            };
            let outcome = run_stft(&StftExperiment {
                config,
                source,
                experiment_id,
                output_dir,
                date: date_stamp(),
            })?;
            info!(
                "{} x {} spectral matrix, SNR {:.2} dB, report {}",
                outcome.shape.0,
                outcome.shape.1,
                outcome.snr,
                outcome.report_path.display()
            );
        }
        Command::Fft {
            frequency,
            sample_rate,
            duration,
            experiment_id,
            output_dir,
        } => {
            let outcome = run_fft(&FftExperiment {
                frequency,
                duration,
                sample_rate,
                experiment_id,
                output_dir,
                date: date_stamp(),
            })?;
            info!(
                "peak {:.2} Hz, RMSE {:.3e}, report {}",
                outcome.peak_frequency,
                outcome.rmse,
                outcome.report_path.display()
            );
        }
    }
    Ok(())
}
