use serde::Serialize;
use vocex_core::SessionResult;

use crate::ExportError;

/// One CSV row per trial. All time columns are milliseconds relative to
/// session start; the column names are the ones the offline latency
/// analyzer consumes.
#[derive(Debug, Serialize)]
struct TrialRow<'a> {
    participant_id: &'a str,
    trial: usize,
    attempt: u8,
    voice: &'a str,
    word: &'a str,
    word_id: u32,
    list: u8,
    japanese_target: &'a str,
    playback_file: &'a str,
    recording_file: &'a str,
    playback_onset_ms: f64,
    playback_end_ms: f64,
    recording_start_ms: f64,
    recording_end_ms: f64,
    iti_ms: u64,
}

fn ms(ns: u64) -> f64 {
    ns as f64 / 1e6
}

/// Render the tabular log as CSV bytes, one row per trial in index order.
pub fn write_table(result: &SessionResult) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (record, named) in result.records.iter().zip(&result.captures) {
        writer.serialize(TrialRow {
            participant_id: &result.participant_id,
            trial: record.index,
            attempt: record.attempt,
            voice: record.voice.as_str(),
            word: &record.word,
            word_id: record.word_id,
            list: record.list,
            japanese_target: &record.translation,
            playback_file: &record.playback_file,
            recording_file: &named.file_name,
            playback_onset_ms: ms(record.playback_onset_ns),
            playback_end_ms: ms(record.playback_end_ns),
            recording_start_ms: ms(record.capture_start_ns),
            recording_end_ms: ms(record.capture_end_ns),
            iti_ms: record.iti_ms,
        })?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocex_core::{Capture, NamedCapture, TrialRecord, Voice};

    fn result_with(n: usize) -> SessionResult {
        let records = (1..=n)
            .map(|index| TrialRecord {
                index,
                attempt: 1,
                voice: Voice::Female,
                word: format!("word{index}"),
                translation: "訳".into(),
                word_id: index as u32,
                list: 1,
                playback_file: format!("female/word{index}.wav"),
                playback_onset_ns: index as u64 * 1_000_000_000,
                playback_end_ns: index as u64 * 1_000_000_000 + 900_000_000,
                capture_start_ns: index as u64 * 1_000_000_000 + 500_000,
                capture_end_ns: index as u64 * 1_000_000_000 + 6_000_500_000,
                iti_ms: 1_500,
            })
            .collect();
        let captures = (1..=n)
            .map(|index| NamedCapture {
                file_name: format!("P01_trial{index}_female_word{index}.wav"),
                capture: Capture {
                    samples: vec![0.0; 8],
                    sample_rate: 44_100,
                    channels: 1,
                },
            })
            .collect();
        SessionResult {
            participant_id: "P01".into(),
            records,
            captures,
        }
    }

    #[test]
    fn one_row_per_trial_in_ascending_index_order() {
        let bytes = write_table(&result_with(3)).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let trials: Vec<u64> = reader
            .records()
            .map(|row| row.unwrap().get(1).unwrap().parse().unwrap())
            .collect();
        assert_eq!(trials, vec![1, 2, 3]);
    }

    #[test]
    fn header_carries_the_analyzer_columns() {
        let bytes = write_table(&result_with(1)).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let header: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        for column in [
            "participant_id",
            "trial",
            "voice",
            "word",
            "recording_file",
            "playback_end_ms",
            "recording_start_ms",
        ] {
            assert!(header.iter().any(|h| h == column), "missing {column}");
        }
    }

    #[test]
    fn times_are_milliseconds_relative_to_session_start() {
        let bytes = write_table(&result_with(1)).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let row = reader.records().next().unwrap().unwrap();
        // playback_onset_ms is column 10.
        assert_eq!(row.get(10).unwrap().parse::<f64>().unwrap(), 1_000.0);
    }
}
