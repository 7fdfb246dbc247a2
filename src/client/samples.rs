use crate::domain::model::{SAMPLE_RATE, SENSOR_CHANNELS, SEQUENCE_LENGTH};
use crate::utils::error::{AegisError, Result};
use hound::{SampleFormat, WavReader};
use rand::Rng;
use std::path::Path;

/// 模擬正常行走: 100x6 的 [0, 1) 隨機值
pub fn walking_sequence<R: Rng>(rng: &mut R) -> Vec<[f32; SENSOR_CHANNELS]> {
    (0..SEQUENCE_LENGTH)
        .map(|_| {
            let mut row = [0.0f32; SENSOR_CHANNELS];
            rng.fill(&mut row[..]);
            row
        })
        .collect()
}

/// 模擬跌倒: 行走序列的最後一個時間點出現大幅尖峰
pub fn fall_sequence<R: Rng>(rng: &mut R) -> Vec<[f32; SENSOR_CHANNELS]> {
    let mut sequence = walking_sequence(rng);
    if let Some(last) = sequence.last_mut() {
        *last = [20.0; SENSOR_CHANNELS];
    }
    sequence
}

/// 讀取 WAV 為 [-1, 1] 範圍的單聲道樣本；多聲道取平均。
/// 取樣率必須為 16 kHz。
pub fn load_wav_mono<P: AsRef<Path>>(path: P) -> Result<Vec<f32>> {
    let mut reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();

    if spec.sample_rate != SAMPLE_RATE {
        return Err(AegisError::invalid_input(format!(
            "{} is sampled at {} Hz, expected {} Hz",
            path.as_ref().display(),
            spec.sample_rate,
            SAMPLE_RATE
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    Ok(interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn test_walking_sequence_shape_and_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let sequence = walking_sequence(&mut rng);
        assert_eq!(sequence.len(), SEQUENCE_LENGTH);
        assert!(sequence.iter().flatten().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_fall_sequence_spikes_last_row() {
        let mut rng = StdRng::seed_from_u64(7);
        let sequence = fall_sequence(&mut rng);
        assert_eq!(sequence[SEQUENCE_LENGTH - 1], [20.0; SENSOR_CHANNELS]);
        assert!(sequence[0].iter().all(|v| *v < 1.0));
    }

    #[test]
    fn test_load_stereo_int_wav_downmixes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for (l, r) in [(16384i16, 0i16), (-32768, -32768)] {
            writer.write_sample(l).unwrap();
            writer.write_sample(r).unwrap();
        }
        writer.finalize().unwrap();

        let samples = load_wav_mono(&path).unwrap();
        assert_eq!(samples, vec![0.25, -1.0]);
    }

    #[test]
    fn test_load_float_wav() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0.5f32, -0.125] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        assert_eq!(load_wav_mono(&path).unwrap(), vec![0.5, -0.125]);
    }

    #[test]
    fn test_rejects_other_sample_rates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cd.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let err = load_wav_mono(&path).unwrap_err();
        assert!(err.to_string().contains("44100 Hz"));
    }

    #[test]
    fn test_missing_file_is_audio_error() {
        let err = load_wav_mono("/nonexistent/go.wav").unwrap_err();
        assert!(matches!(err, AegisError::AudioError(_)));
    }
}
