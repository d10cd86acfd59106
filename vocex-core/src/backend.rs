use std::time::Duration;

use crate::error::SessionError;
use crate::stimulus::Clip;
use crate::trial::Capture;

/// Decodes raw asset bytes into a playable clip. The cache is generic over
/// this so preload is testable without an audio device.
pub trait AudioDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Clip, String>;
}

/// Stimulus playback. `start` returns as soon as the clip has been handed
/// to the output device; the sequencer stamps the playback onset at the
/// instant of invocation.
pub trait Player {
    fn start(&mut self, clip: &Clip) -> Result<(), String>;

    /// Release the per-trial playback resource. Idempotent; called at the
    /// end of every trial regardless of outcome.
    fn stop(&mut self);
}

/// Microphone capture. The stream is acquired once per session; each
/// trial's capture window is independent, and only one may be active at a
/// time (a second concurrent window is a programming error, not a runtime
/// condition).
pub trait Recorder {
    /// Acquire the input stream. Denial or absence of a device maps to
    /// `SessionError::PermissionDenied`, before any trial has run.
    fn open(&mut self) -> Result<(), SessionError>;

    /// Start sampling immediately, block for exactly `window`, and return
    /// everything captured in that span.
    fn capture_for(&mut self, window: Duration) -> Result<Capture, SessionError>;
}

/// Thin view driven by the sequencer. Renders the announced cue and holds
/// no logic or timing of its own.
pub trait Presenter {
    /// "Stimulus incoming" indicator shown while audio plays and the
    /// response is recorded.
    fn show_prompt(&mut self);

    /// Neutral fixation cue shown through the inter-trial interval.
    fn show_fixation(&mut self);

    fn show_message(&mut self, text: &str);
}

/// Suspension point for the single designated start input. Implementations
/// ignore every other input and return only when the session should begin.
pub trait StartSignal {
    fn wait_for_start(&mut self) -> Result<(), SessionError>;
}
