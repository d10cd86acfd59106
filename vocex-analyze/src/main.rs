//! Offline vocal-response latency analyzer.
//!
//! Batch tool, independent of the live engine: it reads an exported
//! `results_*.csv` and the per-trial WAV recordings next to it, finds the
//! first sustained energy rise after stimulus playback ended, and writes
//! `latency_summary.csv` with the detected onsets and latencies.

mod detect;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vocex_core::normalize_word;

#[derive(Debug, Parser)]
#[command(name = "vocex-analyze", about = "Vocal-response latency analyzer")]
struct Args {
    /// Directory holding the results CSV and the WAV recordings.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Results CSV path; auto-discovered under `root` when omitted.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Energy threshold for speech detection, in dB.
    #[arg(long, default_value_t = -40.0)]
    threshold_db: f64,

    /// Envelope frame length, in milliseconds.
    #[arg(long, default_value_t = 10.0)]
    frame_ms: f64,

    /// Consecutive frames required above threshold.
    #[arg(long, default_value_t = 4)]
    min_frames: usize,

    /// Extra time ignored after playback end, in milliseconds.
    #[arg(long, default_value_t = 50.0)]
    guard_ms: f64,

    /// Output CSV path (default: `<root>/latency_summary.csv`).
    #[arg(long)]
    output: Option<PathBuf>,
}

/// The columns consumed from the session log; extra columns are ignored.
#[derive(Debug, Deserialize)]
struct TrialRow {
    participant_id: String,
    trial: u32,
    voice: String,
    word: String,
    #[serde(default)]
    recording_file: Option<String>,
    #[serde(default)]
    playback_end_ms: Option<f64>,
    #[serde(default)]
    recording_start_ms: Option<f64>,
}

#[derive(Debug, Serialize)]
struct LatencyRow {
    participant_id: String,
    trial: u32,
    voice: String,
    word: String,
    audio_file: String,
    status: String,
    playback_end_ms_rel: Option<f64>,
    onset_ms_from_recording_start: Option<f64>,
    latency_ms_from_playback_end: Option<f64>,
    max_energy_db: Option<f64>,
    dynamic_threshold_db: f64,
    fallback_used: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let csv_path = find_results_csv(&args.root, args.csv.as_deref())?;
    info!(csv = %csv_path.display(), "analyzing session log");

    let rows = read_rows(&csv_path)?;
    let summary: Vec<LatencyRow> = rows
        .iter()
        .map(|row| analyze_row(row, &args))
        .collect();

    let detected = summary
        .iter()
        .filter(|r| r.latency_ms_from_playback_end.is_some())
        .count();
    let missing = summary.iter().filter(|r| r.status == "missing").count();
    info!(
        trials = summary.len(),
        detected,
        missing,
        "analysis complete"
    );

    let out_path = args
        .output
        .unwrap_or_else(|| args.root.join("latency_summary.csv"));
    write_summary(&out_path, &summary)?;
    println!("Latency summary written to {}", out_path.display());
    Ok(())
}

fn find_results_csv(root: &Path, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("CSV not found: {}", path.display());
        }
        return Ok(path.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(root)
        .with_context(|| format!("listing {}", root.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "csv")
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("results_"))
        })
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => bail!("no results_*.csv found under {}", root.display()),
        1 => Ok(candidates.remove(0)),
        _ => bail!("multiple results_*.csv found; pass --csv to pick one"),
    }
}

fn read_rows(path: &Path) -> Result<Vec<TrialRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row.with_context(|| format!("parsing {}", path.display()))?);
    }
    Ok(rows)
}

fn wav_path_for(row: &TrialRow, root: &Path) -> PathBuf {
    match &row.recording_file {
        Some(name) if !name.is_empty() => root.join(name),
        _ => root.join(format!(
            "{}_trial{}_{}_{}.wav",
            row.participant_id,
            row.trial,
            row.voice.to_lowercase(),
            normalize_word(&row.word)
        )),
    }
}

fn analyze_row(row: &TrialRow, args: &Args) -> LatencyRow {
    let wav_path = wav_path_for(row, &args.root);
    let mut out = LatencyRow {
        participant_id: row.participant_id.clone(),
        trial: row.trial,
        voice: row.voice.clone(),
        word: row.word.clone(),
        audio_file: wav_path.display().to_string(),
        status: "ok".into(),
        playback_end_ms_rel: None,
        onset_ms_from_recording_start: None,
        latency_ms_from_playback_end: None,
        max_energy_db: None,
        dynamic_threshold_db: args.threshold_db,
        fallback_used: false,
    };

    if !wav_path.is_file() {
        out.status = "missing".into();
        return out;
    }

    let (samples, sample_rate) = match read_mono(&wav_path) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(file = %wav_path.display(), %err, "unreadable recording");
            out.status = "read_error".into();
            return out;
        }
    };

    let (energy, frame_len) = detect::rolling_energy_db(&samples, sample_rate, args.frame_ms);
    if energy.is_empty() {
        out.status = "read_error".into();
        return out;
    }
    out.max_energy_db = energy
        .iter()
        .cloned()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));

    // Times in the log are session-relative; shift playback end onto the
    // recording's own axis.
    let playback_end_rel = (row.playback_end_ms.unwrap_or(0.0)
        - row.recording_start_ms.unwrap_or(0.0))
    .max(0.0);
    out.playback_end_ms_rel = Some(playback_end_rel);
    let start_ms = playback_end_rel + args.guard_ms;

    let mut onset = detect::detect_onset_after(
        &energy,
        sample_rate,
        frame_len,
        start_ms,
        args.threshold_db,
        args.min_frames,
    );

    // Adaptive fallback: derive a threshold from pre-playback noise.
    if onset.is_none() {
        let pre_samples = ((playback_end_rel / 1000.0) * sample_rate as f64) as usize;
        let pre_region = &energy[..pre_samples.min(energy.len())];
        if let Some(noise_db) = detect::percentile(pre_region, 75.0) {
            let dynamic = (args.threshold_db - 5.0).max(noise_db + 6.0);
            out.dynamic_threshold_db = dynamic;
            out.fallback_used = true;
            onset = detect::detect_onset_after(
                &energy,
                sample_rate,
                frame_len,
                start_ms,
                dynamic,
                args.min_frames,
            );
        }
    }

    match onset {
        Some(onset_ms) => {
            out.onset_ms_from_recording_start = Some(onset_ms);
            out.latency_ms_from_playback_end = Some(onset_ms - playback_end_rel);
        }
        None => out.status = "no_speech_detected".into(),
    }
    out
}

/// Read a WAV as mono f32, averaging channels when needed.
fn read_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    } else {
        samples
    };
    Ok((mono, spec.sample_rate))
}

fn write_summary(path: &Path, rows: &[LatencyRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(recording_file: Option<&str>) -> TrialRow {
        TrialRow {
            participant_id: "999".into(),
            trial: 1,
            voice: "male".into(),
            word: "sandía".into(),
            recording_file: recording_file.map(str::to_string),
            playback_end_ms: Some(2_000.0),
            recording_start_ms: Some(1_100.0),
        }
    }

    #[test]
    fn wav_path_prefers_the_explicit_reference() {
        let path = wav_path_for(&row(Some("custom.wav")), Path::new("/data"));
        assert_eq!(path, Path::new("/data/custom.wav"));
    }

    #[test]
    fn wav_path_reconstruction_matches_the_export_layout() {
        let path = wav_path_for(&row(None), Path::new("/data"));
        assert_eq!(path, Path::new("/data/999_trial1_male_sandia.wav"));
    }

    #[test]
    fn analysis_reports_missing_recordings() {
        let args = Args {
            root: PathBuf::from("/nonexistent-vocex"),
            csv: None,
            threshold_db: -40.0,
            frame_ms: 10.0,
            min_frames: 4,
            guard_ms: 50.0,
            output: None,
        };
        let out = analyze_row(&row(None), &args);
        assert_eq!(out.status, "missing");
        assert!(out.latency_ms_from_playback_end.is_none());
    }

    #[test]
    fn detected_onset_yields_latency_relative_to_playback_end() {
        let rate = 44_100u32;
        let dir = std::env::temp_dir().join(format!("vocex-analyze-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        // Recording: 1 s silence, then speech-like tone. Playback ended at
        // 900 ms session time with recording started at 0, so the detected
        // onset near 1000 ms gives a ~100 ms latency.
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let path = dir.join("999_trial1_male_sandia.wav");
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..(2 * rate as usize) {
            let value = if i < rate as usize {
                0
            } else {
                let t = i as f64 / rate as f64;
                ((0.5 * (2.0 * std::f64::consts::PI * 220.0 * t).sin()) * 30_000.0) as i16
            };
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();

        let args = Args {
            root: dir,
            csv: None,
            threshold_db: -40.0,
            frame_ms: 10.0,
            min_frames: 4,
            guard_ms: 50.0,
            output: None,
        };
        let mut trial = row(None);
        trial.playback_end_ms = Some(900.0);
        trial.recording_start_ms = Some(0.0);

        let out = analyze_row(&trial, &args);
        assert_eq!(out.status, "ok");
        let onset = out.onset_ms_from_recording_start.unwrap();
        assert!((onset - 1_000.0).abs() < 25.0, "onset {onset}");
        let latency = out.latency_ms_from_playback_end.unwrap();
        assert!((latency - 100.0).abs() < 25.0, "latency {latency}");
    }
}
