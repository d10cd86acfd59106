use serde::{Deserialize, Serialize};

use crate::stimulus::{StimulusItem, Voice};

/// One scheduled presentation: which item, which repetition, which voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTrial {
    pub item: StimulusItem,
    /// 1 or 2; successive attempts of an item always differ in voice.
    pub attempt: u8,
    pub voice: Voice,
}

/// The full ordered schedule for a session. Built once by the order
/// generator, read-only while the session runs. Serializable so that
/// determinism can be checked byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialPlan {
    pub participant_id: String,
    pub seed: u32,
    pub first_voice: Voice,
    pub trials: Vec<PlannedTrial>,
}

impl TrialPlan {
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}
