use serde::{Deserialize, Serialize};
use vocex_core::{SessionConfig, SessionError, StimulusItem, Voice, embedded_numeric};

/// Fixed task parameters. The defaults mirror the production task: a 6 s
/// capture window shared with stimulus presentation, a 1.5 s ITI,
/// 44.1 kHz mono capture, and a 10 s rest before and after the trial
/// block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub capture_ms: u64,
    pub iti_ms: u64,
    pub lead_in_ms: u64,
    pub lead_out_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            capture_ms: 6_000,
            iti_ms: 1_500,
            lead_in_ms: 10_000,
            lead_out_ms: 10_000,
            sample_rate: 44_100,
            channels: 1,
        }
    }
}

impl TaskConfig {
    /// Bind these parameters to one participant. An empty identifier is
    /// rejected before any resource is acquired; an identifier without
    /// digits falls back to seed 0 (documented edge case, not a failure).
    /// Even numeric identity puts the female voice first, odd the male.
    pub fn session_for(&self, participant_id: &str) -> Result<SessionConfig, SessionError> {
        let id = participant_id.trim();
        if id.is_empty() {
            return Err(SessionError::Configuration(
                "participant identifier is empty".into(),
            ));
        }
        let numeric = embedded_numeric(id).unwrap_or(0);
        Ok(SessionConfig {
            participant_id: id.to_string(),
            numeric_id: numeric,
            seed: numeric as u32,
            first_voice: if numeric % 2 == 0 {
                Voice::Female
            } else {
                Voice::Male
            },
            capture_ms: self.capture_ms,
            iti_ms: self.iti_ms,
            lead_in_ms: self.lead_in_ms,
            lead_out_ms: self.lead_out_ms,
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }
}

/// The built-in 24-item Spanish → Japanese catalog, split into two
/// balanced lists of 12.
pub fn builtin_catalog() -> Vec<StimulusItem> {
    const WORDS: [(&str, &str); 24] = [
        ("elote", "とうもろこし"),
        ("ardilla", "リス"),
        ("basurero", "ごみ箱"),
        ("caballo", "馬"),
        ("cebolla", "玉ねぎ"),
        ("cinta", "テープ"),
        ("conejo", "ウサギ"),
        ("cuaderno", "ノート"),
        ("fresas", "いちご"),
        ("gato", "猫"),
        ("grapadora", "ホッチキス"),
        ("hongos", "きのこ"),
        ("lápiz", "鉛筆"),
        ("lechuga", "レタス"),
        ("loro", "オウム"),
        ("manzana", "りんご"),
        ("naranja", "オレンジ"),
        ("oso", "熊"),
        ("pato", "アヒル"),
        ("pez", "魚"),
        ("reloj", "時計"),
        ("sandía", "スイカ"),
        ("tijeras", "ハサミ"),
        ("tiza", "チョーク"),
    ];

    WORDS
        .iter()
        .enumerate()
        .map(|(idx, (word, translation))| StimulusItem {
            word: (*word).into(),
            translation: (*translation).into(),
            word_id: idx as u32 + 1,
            list: if idx < WORDS.len() / 2 { 1 } else { 2 },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_24_items_in_two_balanced_lists() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 24);
        assert_eq!(catalog.iter().filter(|i| i.list == 1).count(), 12);
        assert_eq!(catalog.iter().filter(|i| i.list == 2).count(), 12);
        // word_ids are 1-based and contiguous
        for (idx, item) in catalog.iter().enumerate() {
            assert_eq!(item.word_id, idx as u32 + 1);
        }
    }

    #[test]
    fn even_identifier_leads_with_female_voice() {
        let session = TaskConfig::default().session_for("S002").unwrap();
        assert_eq!(session.numeric_id, 2);
        assert_eq!(session.seed, 2);
        assert_eq!(session.first_voice, Voice::Female);
    }

    #[test]
    fn odd_identifier_leads_with_male_voice() {
        let session = TaskConfig::default().session_for("S003").unwrap();
        assert_eq!(session.first_voice, Voice::Male);
    }

    #[test]
    fn digitless_identifier_falls_back_to_seed_zero() {
        let session = TaskConfig::default().session_for("anon").unwrap();
        assert_eq!(session.seed, 0);
        assert_eq!(session.first_voice, Voice::Female);
    }

    #[test]
    fn empty_identifier_is_a_configuration_error() {
        let err = TaskConfig::default().session_for("   ").unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));
    }

    #[test]
    fn config_overrides_deserialize_over_defaults() {
        let config: TaskConfig = serde_json::from_str(r#"{"capture_ms": 4000}"#).unwrap();
        assert_eq!(config.capture_ms, 4_000);
        assert_eq!(config.iti_ms, 1_500);
    }
}
