use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One catalog entry: a spoken prompt word and its expected response.
/// Defined at configuration time, immutable for the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusItem {
    /// Prompt word as presented (may carry diacritics).
    pub word: String,
    /// Target response, carried through to the tabular log.
    pub translation: String,
    /// 1-based numeric identity within the catalog.
    pub word_id: u32,
    /// Balanced-half assignment used by the order generator.
    pub list: u8,
}

impl StimulusItem {
    /// Accent-stripped stem used to address the item's audio assets and to
    /// name its capture files.
    pub fn asset_stem(&self) -> String {
        normalize_word(&self.word)
    }
}

/// Speaker-voice condition of a stimulus presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Female,
    Male,
}

impl Voice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Female => "female",
            Voice::Male => "male",
        }
    }

    /// The complementary condition, used for the second attempt.
    pub fn other(&self) -> Voice {
        match self {
            Voice::Female => Voice::Male,
            Voice::Male => Voice::Female,
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded, immediately playable stimulus audio. Interleaved f32 samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub samples: Arc<Vec<f32>>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl Clip {
    pub fn duration(&self) -> Duration {
        let channels = self.channels.max(1) as u64;
        let rate = self.sample_rate.max(1) as u64;
        let frames = self.samples.len() as u64 / channels;
        Duration::from_nanos(frames.saturating_mul(1_000_000_000) / rate)
    }
}

/// Strip diacritics and drop anything that is not ASCII alphanumeric.
/// `sandía` becomes `sandia`; the result is safe in file names and matches
/// the layout the offline analyzer expects.
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .flat_map(|ch| ch.to_lowercase())
        .map(|ch| match ch {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .filter(char::is_ascii_alphanumeric)
        .collect()
}
