use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use vocex_core::{AudioDecoder, Clip, SessionError, TrialPlan, Voice, normalize_word};

/// Extensions probed per asset, in order.
const ASSET_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AssetKey {
    voice: Voice,
    stem: String,
}

/// One preloaded asset: the decoded clip plus the reference it was
/// resolved from (`female/gato.wav`), carried into the trial log.
#[derive(Debug, Clone)]
pub struct CachedStimulus {
    pub clip: Arc<Clip>,
    pub asset: String,
}

/// Every audio asset a session will play, fetched and decoded before the
/// first trial so that playback onset never blocks on I/O or decode.
#[derive(Debug)]
pub struct StimulusCache {
    clips: HashMap<AssetKey, CachedStimulus>,
}

impl StimulusCache {
    /// Fetch and decode every distinct asset the plan references. Any
    /// unreadable or undecodable asset aborts the whole preload; no
    /// partial cache is returned.
    pub fn preload<D: AudioDecoder>(
        plan: &TrialPlan,
        asset_root: &Path,
        decoder: &D,
    ) -> Result<Self, SessionError> {
        let mut clips = HashMap::new();
        for trial in &plan.trials {
            let key = AssetKey {
                voice: trial.voice,
                stem: trial.item.asset_stem(),
            };
            if clips.contains_key(&key) {
                continue;
            }
            let path = resolve_asset(asset_root, &key)?;
            let asset = asset_reference(&key, &path);
            let bytes = fs::read(&path).map_err(|err| SessionError::AssetLoad {
                asset: path.display().to_string(),
                message: err.to_string(),
            })?;
            let clip = decoder
                .decode(&bytes)
                .map_err(|message| SessionError::AssetLoad {
                    asset: path.display().to_string(),
                    message,
                })?;
            debug!(asset = %path.display(), samples = clip.samples.len(), "decoded stimulus");
            clips.insert(
                key,
                CachedStimulus {
                    clip: Arc::new(clip),
                    asset,
                },
            );
        }
        info!(assets = clips.len(), "stimulus cache ready");
        Ok(Self { clips })
    }

    /// Lookup by voice and (unnormalized) word. A miss here after preload
    /// passed is a logic error on the caller's side.
    pub fn get(&self, voice: Voice, word: &str) -> Option<&CachedStimulus> {
        self.clips.get(&AssetKey {
            voice,
            stem: normalize_word(word),
        })
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

fn resolve_asset(root: &Path, key: &AssetKey) -> Result<PathBuf, SessionError> {
    for ext in ASSET_EXTENSIONS {
        let candidate = root
            .join(key.voice.as_str())
            .join(format!("{}.{ext}", key.stem));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(SessionError::AssetLoad {
        asset: format!(
            "{}/{}/{}.{{wav,mp3}}",
            root.display(),
            key.voice.as_str(),
            key.stem
        ),
        message: "asset not found".into(),
    })
}

/// Voice-relative reference recorded in the trial log.
fn asset_reference(key: &AssetKey, path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(ASSET_EXTENSIONS[0]);
    format!("{}/{}.{ext}", key.voice.as_str(), key.stem)
}
