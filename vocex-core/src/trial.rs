use serde::Serialize;

use crate::stimulus::Voice;

/// Immutable outcome of one completed trial. All timestamps are
/// nanoseconds on the session clock, whose zero is the instant the start
/// signal was processed.
///
/// Invariants, checked by the assembler: `capture_start_ns >=
/// playback_onset_ns`, and `capture_end_ns - capture_start_ns` equals the
/// configured capture window up to scheduling jitter.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    /// 1-based, contiguous across the session.
    pub index: usize,
    pub attempt: u8,
    pub voice: Voice,
    pub word: String,
    pub translation: String,
    pub word_id: u32,
    pub list: u8,
    /// Asset reference that was played, e.g. `female/gato.wav`.
    pub playback_file: String,
    pub playback_onset_ns: u64,
    pub playback_end_ns: u64,
    pub capture_start_ns: u64,
    pub capture_end_ns: u64,
    pub iti_ms: u64,
}

/// Raw audio recorded during a single trial's capture window. Owned by
/// that trial until handed to the assembler; never shared across trials.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// A capture bound to its deterministic export file name.
#[derive(Debug, Clone)]
pub struct NamedCapture {
    pub file_name: String,
    pub capture: Capture,
}

/// The complete dataset of a finished session, handed to export in one
/// piece. Only a session that reached `Complete` produces one; its
/// lifecycle ends when the bundle is written.
#[derive(Debug)]
pub struct SessionResult {
    pub participant_id: String,
    pub records: Vec<TrialRecord>,
    pub captures: Vec<NamedCapture>,
}
