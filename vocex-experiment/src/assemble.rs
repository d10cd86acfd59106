use std::collections::HashSet;

use vocex_core::{
    Capture, NamedCapture, SessionConfig, SessionError, SessionResult, TrialRecord, normalize_word,
};

/// Deterministic capture file name:
/// `{participant}_trial{index}_{voice}_{word}.wav`, with the word
/// accent-stripped. This is the layout the offline latency analyzer
/// reconstructs when the log carries no explicit file reference.
pub fn capture_file_name(participant_id: &str, record: &TrialRecord) -> String {
    format!(
        "{}_trial{}_{}_{}.wav",
        participant_id,
        record.index,
        record.voice,
        normalize_word(&record.word)
    )
}

/// Collects per-trial outcomes in trial order and hands the complete
/// dataset off in one piece. Validation happens before any mutation, so a
/// rejected trial leaves previously collected records untouched.
pub struct ResultAssembler {
    participant_id: String,
    records: Vec<TrialRecord>,
    captures: Vec<NamedCapture>,
    names: HashSet<String>,
}

impl ResultAssembler {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            participant_id: config.participant_id.clone(),
            records: Vec::new(),
            captures: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Accept one completed trial and the capture it owns. Index
    /// contiguity, capture-after-onset ordering, and name uniqueness are
    /// hard invariants; violating any is a logic error.
    pub fn push(&mut self, record: TrialRecord, capture: Capture) -> Result<(), SessionError> {
        let expected = self.records.len() + 1;
        if record.index != expected {
            return Err(SessionError::Logic(format!(
                "trial index {} out of order, expected {expected}",
                record.index
            )));
        }
        if record.capture_start_ns < record.playback_onset_ns {
            return Err(SessionError::Logic(format!(
                "trial {}: capture started before playback onset",
                record.index
            )));
        }
        let file_name = capture_file_name(&self.participant_id, &record);
        if !self.names.insert(file_name.clone()) {
            return Err(SessionError::Logic(format!(
                "duplicate capture file name '{file_name}'"
            )));
        }
        self.captures.push(NamedCapture { file_name, capture });
        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(self) -> SessionResult {
        SessionResult {
            participant_id: self.participant_id,
            records: self.records,
            captures: self.captures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskConfig;
    use vocex_core::Voice;

    fn record(index: usize, word: &str) -> TrialRecord {
        TrialRecord {
            index,
            attempt: 1,
            voice: Voice::Female,
            word: word.into(),
            translation: String::new(),
            word_id: 1,
            list: 1,
            playback_file: format!("female/{word}.wav"),
            playback_onset_ns: 1_000,
            playback_end_ns: 2_000,
            capture_start_ns: 1_500,
            capture_end_ns: 6_001_500,
            iti_ms: 1_500,
        }
    }

    fn capture() -> Capture {
        Capture {
            samples: vec![0.0; 64],
            sample_rate: 44_100,
            channels: 1,
        }
    }

    fn assembler() -> ResultAssembler {
        let session = TaskConfig::default().session_for("P01").unwrap();
        ResultAssembler::new(&session)
    }

    #[test]
    fn names_follow_the_analyzer_layout() {
        let name = capture_file_name("P01", &record(3, "lápiz"));
        assert_eq!(name, "P01_trial3_female_lapiz.wav");
    }

    #[test]
    fn accepts_contiguous_trials_in_order() {
        let mut asm = assembler();
        asm.push(record(1, "gato"), capture()).unwrap();
        asm.push(record(2, "oso"), capture()).unwrap();
        let result = asm.finish();
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.captures.len(), 2);
        assert_eq!(result.captures[0].file_name, "P01_trial1_female_gato.wav");
    }

    #[test]
    fn rejects_out_of_order_indices_without_corruption() {
        let mut asm = assembler();
        asm.push(record(1, "gato"), capture()).unwrap();
        let err = asm.push(record(3, "oso"), capture()).unwrap_err();
        assert!(matches!(err, SessionError::Logic(_)));
        assert_eq!(asm.len(), 1);
    }

    #[test]
    fn rejects_capture_before_playback_onset() {
        let mut asm = assembler();
        let mut bad = record(1, "gato");
        bad.capture_start_ns = 500;
        let err = asm.push(bad, capture()).unwrap_err();
        assert!(matches!(err, SessionError::Logic(_)));
        assert!(asm.is_empty());
    }

    #[test]
    fn same_word_at_different_indices_keeps_names_unique() {
        let mut asm = assembler();
        asm.push(record(1, "gato"), capture()).unwrap();
        let mut dup = record(2, "gato");
        dup.index = 2;
        asm.push(dup, capture()).unwrap();
        let result = asm.finish();
        assert_ne!(
            result.captures[0].file_name,
            result.captures[1].file_name
        );
    }
}
