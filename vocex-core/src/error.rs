use thiserror::Error;

/// Session-terminal failures. None of these are retried or resumed: the
/// session transitions to `Failed`, already-collected trials are discarded,
/// and no bundle is exported.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The participant identifier is unusable. Raised before any resource
    /// is acquired; the session never starts.
    #[error("invalid participant identifier: {0}")]
    Configuration(String),

    /// An asset could not be fetched or decoded during preload. Aborts
    /// before `AwaitingStart`; no partial cache is ever used.
    #[error("failed to load stimulus asset '{asset}': {message}")]
    AssetLoad { asset: String, message: String },

    /// Microphone access refused or unavailable. Aborts before any trial.
    #[error("microphone unavailable: {0}")]
    PermissionDenied(String),

    /// Recording backend failure mid-session.
    #[error("audio capture failed: {0}")]
    Capture(String),

    /// Playback backend failure mid-session.
    #[error("playback failed for asset '{asset}': {message}")]
    Playback { asset: String, message: String },

    /// Internal bookkeeping violation: a cache miss after preload passed, a
    /// non-contiguous trial index, a duplicate capture name. Fatal, and must
    /// not corrupt records already collected for prior trials.
    #[error("sequencing logic error: {0}")]
    Logic(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_load_names_the_failing_asset() {
        let err = SessionError::AssetLoad {
            asset: "stimuli/female/gato.wav".into(),
            message: "no such file".into(),
        };
        let text = err.to_string();
        assert!(text.contains("stimuli/female/gato.wav"));
        assert!(text.contains("no such file"));
    }
}
