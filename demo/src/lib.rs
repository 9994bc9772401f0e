//! Experiment driver: synthesizes test signals, runs the STFT and FFT round
//! trips, and writes WAV, JSON and Markdown report artifacts.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fft_analysis::{metrics, signal, spectrum, StftConfig, StftProcessor};
use log::info;
use serde::Serialize;

/// Report appended to by every experiment in the output directory.
pub const REPORT_FILE: &str = "REPORT.md";
const REPORT_TITLE: &str = "# Frequency Analysis Experiment Report\n\n";

pub const ORIGINAL_WAV: &str = "original_audio.wav";
pub const RECONSTRUCTED_WAV: &str = "reconstructed_audio.wav";

/// Today's date as `YYYYMMDD`, the stamp used in artifact names.
pub fn date_stamp() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Write mono 16-bit PCM, clipping samples to `[-1, 1]`.
pub fn write_wav(path: &Path, samples: &[f64], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;
    for &x in samples {
        let v = (x.clamp(-1.0, 1.0) * i16::MAX as f64).round() as i16;
        writer.write_sample(v)?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

/// Read a WAV file as mono samples in `[-1, 1]`, averaging channels.
pub fn read_wav(path: &Path) -> Result<(Vec<f64>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()?
        }
    };
    let channels = usize::from(spec.channels.max(1));
    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
        .collect();
    Ok((mono, spec.sample_rate))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Append `entry` to the report in `dir`, creating it with a title when missing.
pub fn append_report(dir: &Path, entry: &str) -> Result<PathBuf> {
    let path = dir.join(REPORT_FILE);
    let fresh = !path.exists();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    if fresh {
        file.write_all(REPORT_TITLE.as_bytes())?;
    }
    file.write_all(entry.as_bytes())?;
    Ok(path)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Where the STFT experiment gets its signal.
#[derive(Debug, Clone)]
pub enum SignalSource {
    /// A4/A5/A6 mixture of the given length.
    Chord { duration: f64, sample_rate: u32 },
    Wav(PathBuf),
}

#[derive(Debug, Clone)]
pub struct StftExperiment {
    pub config: StftConfig,
    pub source: SignalSource,
    pub experiment_id: u32,
    pub output_dir: PathBuf,
    pub date: String,
}

/// Persisted STFT analysis. Matrices are nested `[bin][frame]` arrays.
#[derive(Debug, Serialize)]
pub struct StftRecord {
    pub experiment_id: u32,
    pub date: String,
    pub window_size: usize,
    pub hop_length: usize,
    pub window_type: String,
    /// `None` when the SNR is not finite (perfect or silent reconstruction).
    pub snr: Option<f64>,
    pub stft_shape: [usize; 2],
    pub stft_real: Vec<Vec<f64>>,
    pub stft_imag: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct StftOutcome {
    pub snr: f64,
    pub shape: (usize, usize),
    pub data_path: PathBuf,
    pub report_path: PathBuf,
}

pub fn run_stft(exp: &StftExperiment) -> Result<StftOutcome> {
    fs::create_dir_all(&exp.output_dir)
        .with_context(|| format!("creating {}", exp.output_dir.display()))?;
    let (samples, sample_rate) = match &exp.source {
        SignalSource::Chord {
            duration,
            sample_rate,
        } => (signal::a4_chord(*duration, f64::from(*sample_rate)), *sample_rate),
        SignalSource::Wav(path) => read_wav(path)?,
    };
    info!(
        "stft experiment #{}: {} samples @ {} Hz, window {} ({}), hop {}",
        exp.experiment_id,
        samples.len(),
        sample_rate,
        exp.config.window_size,
        exp.config.window_type,
        exp.config.hop_length
    );

    let processor = StftProcessor::new(exp.config)?;
    let matrix = processor.stft(&samples).context("STFT analysis failed")?;
    let restored = processor
        .istft(&matrix)
        .context("STFT reconstruction failed")?;
    let snr = metrics::snr_db(&samples, &restored);
    info!("reconstruction SNR: {:.2} dB", snr);

    write_wav(&exp.output_dir.join(ORIGINAL_WAV), &samples, sample_rate)?;
    write_wav(&exp.output_dir.join(RECONSTRUCTED_WAV), &restored, sample_rate)?;

    let (rows, cols) = matrix.shape();
    let record = StftRecord {
        experiment_id: exp.experiment_id,
        date: exp.date.clone(),
        window_size: exp.config.window_size,
        hop_length: exp.config.hop_length,
        window_type: exp.config.window_type.to_string(),
        snr: snr.is_finite().then_some(snr),
        stft_shape: [rows, cols],
        stft_real: matrix.real_parts(),
        stft_imag: matrix.imag_parts(),
    };
    let data_path = exp
        .output_dir
        .join(format!("STFT_Data_Exp{}_{}.json", exp.experiment_id, exp.date));
    write_json(&data_path, &record)?;
    info!("analysis data written to {}", data_path.display());

    let entry = format!(
        "\n## STFT/iSTFT analysis #{} - {}\n\n\
         ### Results\n\
         - Window: {} ({} samples, hop {})\n\
         - Spectral matrix: {} bins x {} frames\n\
         - Reconstruction SNR: {:.2} dB\n\n\
         ### Files\n\
         - Original audio: [{orig}](./{orig})\n\
         - Reconstructed audio: [{rec}](./{rec})\n\
         - Analysis data: [{data}](./{data})\n\n---\n",
        exp.experiment_id,
        timestamp(),
        exp.config.window_type,
        exp.config.window_size,
        exp.config.hop_length,
        rows,
        cols,
        snr,
        orig = ORIGINAL_WAV,
        rec = RECONSTRUCTED_WAV,
        data = file_name(&data_path),
    );
    let report_path = append_report(&exp.output_dir, &entry)?;

    Ok(StftOutcome {
        snr,
        shape: (rows, cols),
        data_path,
        report_path,
    })
}

#[derive(Debug, Clone)]
pub struct FftExperiment {
    /// Fundamental of the harmonic test signal, in Hz.
    pub frequency: f64,
    pub duration: f64,
    pub sample_rate: f64,
    pub experiment_id: u32,
    pub output_dir: PathBuf,
    pub date: String,
}

/// Persisted full-signal FFT analysis.
#[derive(Debug, Serialize)]
pub struct FftRecord {
    pub experiment_id: u32,
    pub date: String,
    pub target_frequencies: Vec<f64>,
    pub time_series: Vec<f64>,
    pub original_signal: Vec<f64>,
    pub reconstructed_signal: Vec<f64>,
    pub fft_frequencies: Vec<f64>,
    pub fft_magnitude: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct FftOutcome {
    pub rmse: f64,
    pub mean_absolute_error: f64,
    /// Frequency of the strongest non-negative bin.
    pub peak_frequency: f64,
    pub data_path: PathBuf,
    pub report_path: PathBuf,
}

pub fn run_fft(exp: &FftExperiment) -> Result<FftOutcome> {
    if !(exp.sample_rate > 0.0 && exp.duration > 0.0) {
        bail!(
            "sample rate and duration must be positive (got {} Hz, {} s)",
            exp.sample_rate,
            exp.duration
        );
    }
    fs::create_dir_all(&exp.output_dir)
        .with_context(|| format!("creating {}", exp.output_dir.display()))?;
    let test = signal::harmonic_series(exp.frequency, exp.duration, exp.sample_rate);
    info!(
        "fft experiment #{}: {} samples, partials at {:?} Hz",
        exp.experiment_id,
        test.samples.len(),
        test.frequencies
    );

    let magnitude = spectrum::magnitude_spectrum(&test.samples, exp.sample_rate)?;
    let restored = spectrum::inverse_real(&spectrum::forward(&test.samples)?)?;
    let rmse = metrics::rmse(&test.samples, &restored);
    let mae = metrics::mean_absolute_error(&test.samples, &restored);
    let peak_frequency = magnitude.peak().map(|(f, _)| f).unwrap_or(0.0);
    info!("reconstruction RMSE {:.3e}, MAE {:.3e}", rmse, mae);

    let data_path = exp.output_dir.join(format!(
        "FFT_Data_Exp{}_{}_save_data.json",
        exp.experiment_id, exp.date
    ));
    let record = FftRecord {
        experiment_id: exp.experiment_id,
        date: exp.date.clone(),
        target_frequencies: test.frequencies,
        time_series: test.time,
        original_signal: test.samples,
        reconstructed_signal: restored,
        fft_frequencies: magnitude.frequencies,
        fft_magnitude: magnitude.magnitudes,
    };
    write_json(&data_path, &record)?;
    info!("analysis data written to {}", data_path.display());

    let entry = format!(
        "\n## FFT/iFFT experiment #{} - {}\n\n\
         ### Results\n\
         - Run at: {}\n\
         - Strongest component: {:.2} Hz\n\
         - Reconstruction RMSE: {:.6e}\n\
         - Mean absolute error: {:.6e}\n\n\
         Data file: [{data}](./{data})\n\n---\n",
        exp.experiment_id,
        exp.date,
        timestamp(),
        peak_frequency,
        rmse,
        mae,
        data = file_name(&data_path),
    );
    let report_path = append_report(&exp.output_dir, &entry)?;

    Ok(FftOutcome {
        rmse,
        mean_absolute_error: mae,
        peak_frequency,
        data_path,
        report_path,
    })
}
