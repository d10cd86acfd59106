use std::io::{Cursor, Write};

use serde::Serialize;
use tracing::info;
use vocex_core::{SessionConfig, SessionResult, Voice};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::{ExportError, table, wav};

/// Metadata snapshot written alongside the tabular log, so an exported
/// bundle is self-describing.
#[derive(Debug, Serialize)]
struct SessionMeta<'a> {
    participant_id: &'a str,
    seed: u32,
    first_voice: Voice,
    trial_count: usize,
    capture_ms: u64,
    iti_ms: u64,
    sample_rate: u32,
    channels: u16,
}

pub fn bundle_name(participant_id: &str) -> String {
    format!("results_{participant_id}.zip")
}

/// Package the complete dataset as one ZIP archive: the CSV log, one WAV
/// per trial under `recordings/`, and the session metadata. Only callable
/// with a finished `SessionResult`, so there is never a partial bundle.
pub fn package(result: &SessionResult, config: &SessionConfig) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(format!("results_{}.csv", result.participant_id), options)?;
    zip.write_all(&table::write_table(result)?)?;

    for named in &result.captures {
        zip.start_file(format!("recordings/{}", named.file_name), options)?;
        zip.write_all(&wav::encode_wav(&named.capture)?)?;
    }

    zip.start_file(format!("session_{}.json", result.participant_id), options)?;
    let meta = SessionMeta {
        participant_id: &result.participant_id,
        seed: config.seed,
        first_voice: config.first_voice,
        trial_count: result.records.len(),
        capture_ms: config.capture_ms,
        iti_ms: config.iti_ms,
        sample_rate: config.sample_rate,
        channels: config.channels,
    };
    zip.write_all(&serde_json::to_vec_pretty(&meta)?)?;

    let cursor = zip.finish()?;
    let bytes = cursor.into_inner();
    info!(
        participant = %result.participant_id,
        recordings = result.captures.len(),
        bytes = bytes.len(),
        "export bundle ready"
    );
    Ok(bytes)
}
