//! Log-mel spectrogram used as input to the keyword classifier.
//!
//! Parameters are fixed to the ones the keyword model was trained with:
//! 2048-point FFT, hop of 512 samples, periodic Hann window, centred frames
//! padded with zeros, 128 Slaney-normalised mel bands between 0 Hz and
//! Nyquist. Power values are converted to decibels relative to the
//! spectrogram maximum and floored at 80 dB below it.

use crate::core::tensor::Tensor;
use crate::domain::model::{N_MELS, SAMPLE_RATE};
use crate::utils::error::{AegisError, Result};
use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;

pub const N_FFT: usize = 2048;
pub const HOP_LENGTH: usize = 512;
const AMIN: f64 = 1e-10;
const TOP_DB: f64 = 80.0;

#[derive(Debug, Clone)]
pub struct MelSpectrogram {
    n_fft: usize,
    hop_length: usize,
    n_mels: usize,
    window: Vec<f64>,
    /// [n_mels][n_fft / 2 + 1]
    filters: Vec<Vec<f64>>,
}

impl Default for MelSpectrogram {
    fn default() -> Self {
        Self::new(SAMPLE_RATE, N_FFT, HOP_LENGTH, N_MELS)
    }
}

impl MelSpectrogram {
    pub fn new(sample_rate: u32, n_fft: usize, hop_length: usize, n_mels: usize) -> Self {
        Self {
            n_fft,
            hop_length,
            n_mels,
            window: hann_window(n_fft),
            filters: mel_filterbank(sample_rate, n_fft, n_mels),
        }
    }

    /// 幀數: 1 + len / hop
    pub fn frame_count(&self, num_samples: usize) -> usize {
        1 + num_samples / self.hop_length
    }

    /// Mel power spectrogram, `[n_mels][frames]`.
    pub fn power(&self, samples: &[f64]) -> Result<Vec<Vec<f64>>> {
        if samples.is_empty() {
            return Err(AegisError::invalid_input("Audio buffer is empty"));
        }
        if let Some(i) = samples.iter().position(|s| !s.is_finite()) {
            return Err(AegisError::invalid_input(format!(
                "Audio buffer is not finite everywhere (sample {})",
                i
            )));
        }

        let pad = self.n_fft / 2;
        let mut padded = vec![0.0; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let frames = self.frame_count(samples.len());
        let bins = self.n_fft / 2 + 1;
        let fft = FftPlanner::<f64>::new().plan_fft_forward(self.n_fft);

        let mut mel = vec![vec![0.0; frames]; self.n_mels];
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];
        let mut power = vec![0.0; bins];

        for t in 0..frames {
            let start = t * self.hop_length;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(padded[start + i] * self.window[i], 0.0);
            }
            fft.process(&mut buffer);

            for (k, p) in power.iter_mut().enumerate() {
                *p = buffer[k].norm_sqr();
            }
            for (m, filter) in self.filters.iter().enumerate() {
                mel[m][t] = filter.iter().zip(&power).map(|(w, p)| w * p).sum();
            }
        }

        Ok(mel)
    }

    /// Log-mel spectrogram reshaped for the keyword CNN: `[1, n_mels, frames, 1]`.
    pub fn compute(&self, samples: &[f64]) -> Result<Tensor> {
        let mel = self.power(samples)?;
        let frames = mel.first().map(Vec::len).unwrap_or(0);
        let db = power_to_db(mel);

        let data: Vec<f32> = db.into_iter().flatten().map(|v| v as f32).collect();
        Tensor::new(vec![1, self.n_mels, frames, 1], data)
    }
}

/// dB relative to the maximum power, floored at `TOP_DB` below the peak.
pub fn power_to_db(spec: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    let reference = spec
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let ref_db = 10.0 * reference.max(AMIN).log10();

    let mut db: Vec<Vec<f64>> = spec
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|p| 10.0 * p.max(AMIN).log10() - ref_db)
                .collect()
        })
        .collect();

    let max_db = db
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = max_db - TOP_DB;
    for v in db.iter_mut().flatten() {
        if *v < floor {
            *v = floor;
        }
    }
    db
}

fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above.
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<Vec<f64>> {
    let bins = n_fft / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;
    let fft_freqs: Vec<f64> = (0..bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let min_mel = hz_to_mel(0.0);
    let max_mel = hz_to_mel(nyquist);
    let mel_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| {
            let mel = min_mel + (max_mel - min_mel) * i as f64 / (n_mels + 1) as f64;
            mel_to_hz(mel)
        })
        .collect();

    (0..n_mels)
        .map(|m| {
            let (left, center, right) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
            let enorm = 2.0 / (right - left);
            fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - left) / (center - left);
                    let upper = (right - f) / (right - center);
                    lower.min(upper).max(0.0) * enorm
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / SAMPLE_RATE as f64).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_one_second_clip_shape() {
        let tensor = MelSpectrogram::default().compute(&sine(440.0, 16_000)).unwrap();
        assert_eq!(tensor.shape(), &[1, 128, 32, 1]);
    }

    #[test]
    fn test_short_clip_still_produces_a_frame() {
        let tensor = MelSpectrogram::default().compute(&[0.1, -0.1, 0.2]).unwrap();
        assert_eq!(tensor.shape(), &[1, 128, 1, 1]);
    }

    #[test]
    fn test_db_range_is_relative_to_peak() {
        let tensor = MelSpectrogram::default().compute(&sine(1000.0, 8_000)).unwrap();
        let max = tensor.data().iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min = tensor.data().iter().copied().fold(f32::INFINITY, f32::min);
        assert!(max.abs() < 1e-4);
        assert!(min >= -80.0 - 1e-4);
    }

    #[test]
    fn test_tone_energy_lands_in_matching_band() {
        let spec = MelSpectrogram::default();
        let power = spec.power(&sine(440.0, 16_000)).unwrap();
        let energy: Vec<f64> = power.iter().map(|row| row.iter().sum()).collect();
        let peak_band = energy
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();

        let mel_440 = hz_to_mel(440.0);
        let max_mel = hz_to_mel(8000.0);
        let expected = (mel_440 / max_mel * 129.0).round() as i64 - 1;
        assert!((peak_band as i64 - expected).abs() <= 1);
    }

    #[test]
    fn test_silence_is_flat() {
        let tensor = MelSpectrogram::default().compute(&vec![0.0; 4_000]).unwrap();
        assert!(tensor.data().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        let spec = MelSpectrogram::default();
        assert!(spec.compute(&[]).unwrap_err().is_client_error());
        assert!(spec.compute(&[0.0, f64::NAN]).unwrap_err().is_client_error());
    }

    #[test]
    fn test_mel_scale_round_trip() {
        for hz in [0.0, 300.0, 1000.0, 4000.0, 8000.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6);
        }
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_filters_are_non_negative() {
        let filters = mel_filterbank(SAMPLE_RATE, N_FFT, N_MELS);
        assert_eq!(filters.len(), N_MELS);
        assert!(filters.iter().all(|f| f.len() == N_FFT / 2 + 1));
        assert!(filters.iter().flatten().all(|w| *w >= 0.0));
        assert!(filters.iter().all(|f| f.iter().any(|w| *w > 0.0)));
    }
}
