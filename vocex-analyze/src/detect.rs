//! Energy-envelope onset detection over a single recording.

/// Rolling mean-square energy in dB over `frame_ms` windows. Returns the
/// envelope and the frame length in samples. Empty when the signal is
/// shorter than one frame.
pub fn rolling_energy_db(samples: &[f32], sample_rate: u32, frame_ms: f64) -> (Vec<f64>, usize) {
    let frame_len = ((sample_rate as f64 * frame_ms / 1000.0).round() as usize).max(1);
    if samples.len() < frame_len {
        return (Vec::new(), frame_len);
    }

    // Running sum of squares; one pass over the signal.
    let mut energy = Vec::with_capacity(samples.len() - frame_len + 1);
    let mut acc: f64 = samples[..frame_len]
        .iter()
        .map(|s| *s as f64 * *s as f64)
        .sum();
    energy.push(power_db(acc / frame_len as f64));
    for i in frame_len..samples.len() {
        acc += samples[i] as f64 * samples[i] as f64;
        acc -= samples[i - frame_len] as f64 * samples[i - frame_len] as f64;
        energy.push(power_db((acc / frame_len as f64).max(0.0)));
    }
    (energy, frame_len)
}

fn power_db(power: f64) -> f64 {
    10.0 * power.max(1e-12).log10()
}

/// First time (ms from recording start) at or after `start_ms` where the
/// envelope stays above `threshold_db` for `min_frames` consecutive
/// frames. The returned onset is centered on the detection frame.
pub fn detect_onset_after(
    energy_db: &[f64],
    sample_rate: u32,
    frame_len: usize,
    start_ms: f64,
    threshold_db: f64,
    min_frames: usize,
) -> Option<f64> {
    let start_sample = ((start_ms / 1000.0) * sample_rate as f64).round().max(0.0) as usize;
    let start_idx = start_sample.min(energy_db.len());
    let min_frames = min_frames.max(1);

    let region = &energy_db[start_idx..];
    let mut run = 0usize;
    for (offset, value) in region.iter().enumerate() {
        if *value > threshold_db {
            run += 1;
            if run == min_frames {
                let onset_idx = start_idx + offset + 1 - min_frames;
                let onset_samples = onset_idx as f64 + frame_len as f64 / 2.0;
                return Some(onset_samples / sample_rate as f64 * 1000.0);
            }
        } else {
            run = 0;
        }
    }
    None
}

/// Percentile of a sample set (nearest-rank on a sorted copy).
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = ((sorted.len() - 1) as f64 * p / 100.0).round() as usize;
    Some(sorted[rank.min(sorted.len() - 1)])
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44_100;

    /// 1 s of near-silence followed by a 440 Hz tone.
    fn silence_then_tone(tone_from_ms: f64, total_ms: f64) -> Vec<f32> {
        let total = (total_ms / 1000.0 * RATE as f64) as usize;
        let tone_from = (tone_from_ms / 1000.0 * RATE as f64) as usize;
        (0..total)
            .map(|i| {
                if i < tone_from {
                    0.0005 * if i % 2 == 0 { 1.0 } else { -1.0 }
                } else {
                    0.5 * (2.0 * std::f64::consts::PI * 440.0 * i as f64 / RATE as f64).sin() as f32
                }
            })
            .collect()
    }

    #[test]
    fn onset_lands_near_the_tone_start() {
        let samples = silence_then_tone(1_000.0, 2_000.0);
        let (energy, frame_len) = rolling_energy_db(&samples, RATE, 10.0);
        let onset = detect_onset_after(&energy, RATE, frame_len, 0.0, -40.0, 4).unwrap();
        assert!(
            (onset - 1_000.0).abs() < 20.0,
            "onset {onset} ms too far from 1000 ms"
        );
    }

    #[test]
    fn detection_ignores_energy_before_start_ms() {
        let samples = silence_then_tone(500.0, 2_000.0);
        let (energy, frame_len) = rolling_energy_db(&samples, RATE, 10.0);
        let onset = detect_onset_after(&energy, RATE, frame_len, 1_200.0, -40.0, 4).unwrap();
        assert!(onset >= 1_200.0);
    }

    #[test]
    fn pure_silence_yields_no_onset() {
        let samples = vec![0.0f32; RATE as usize];
        let (energy, frame_len) = rolling_energy_db(&samples, RATE, 10.0);
        assert!(detect_onset_after(&energy, RATE, frame_len, 0.0, -40.0, 4).is_none());
    }

    #[test]
    fn short_signals_produce_an_empty_envelope() {
        let (energy, frame_len) = rolling_energy_db(&[0.0; 4], RATE, 10.0);
        assert!(energy.is_empty());
        assert_eq!(frame_len, 441);
    }

    #[test]
    fn percentile_is_nearest_rank() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 100.0), Some(4.0));
        assert_eq!(percentile(&values, 75.0), Some(3.0));
        assert_eq!(percentile(&[], 50.0), None);
    }
}
