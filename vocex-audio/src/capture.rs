use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use tracing::{info, warn};
use vocex_core::{Capture, Recorder, SessionError};
use vocex_timing::high_precision_sleep;

/// Microphone capture on a single cpal input stream, opened once per
/// session and reused by every trial. The stream callback appends samples
/// only while a trial's capture window is armed, so buffers never leak
/// across trials.
pub struct CpalRecorder {
    sample_rate: u32,
    channels: u16,
    stream: Option<Stream>,
    armed: Arc<AtomicBool>,
    buffer: Arc<Mutex<Vec<f32>>>,
    fault: Arc<Mutex<Option<String>>>,
}

impl CpalRecorder {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            stream: None,
            armed: Arc::new(AtomicBool::new(false)),
            buffer: Arc::new(Mutex::new(Vec::new())),
            fault: Arc::new(Mutex::new(None)),
        }
    }

    fn take_fault(&self) -> Option<String> {
        self.fault.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl Recorder for CpalRecorder {
    fn open(&mut self) -> Result<(), SessionError> {
        if self.stream.is_some() {
            return Err(SessionError::Logic("microphone stream already open".into()));
        }

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| {
            SessionError::PermissionDenied("no input device available".into())
        })?;
        let config = StreamConfig {
            channels: self.channels,
            sample_rate: SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let armed = Arc::clone(&self.armed);
        let buffer = Arc::clone(&self.buffer);
        let fault = Arc::clone(&self.fault);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if armed.load(Ordering::Relaxed) {
                        if let Ok(mut samples) = buffer.lock() {
                            samples.extend_from_slice(data);
                        }
                    }
                },
                move |err| {
                    warn!(%err, "input stream error");
                    if let Ok(mut slot) = fault.lock() {
                        *slot = Some(err.to_string());
                    }
                },
                None,
            )
            .map_err(|err| SessionError::PermissionDenied(err.to_string()))?;
        stream.play().map_err(|err| SessionError::Capture(err.to_string()))?;

        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate = self.sample_rate,
            channels = self.channels,
            "microphone stream open"
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn capture_for(&mut self, window: Duration) -> Result<Capture, SessionError> {
        if self.stream.is_none() {
            return Err(SessionError::Capture("microphone stream is not open".into()));
        }

        {
            let mut samples = self
                .buffer
                .lock()
                .map_err(|_| SessionError::Capture("capture buffer poisoned".into()))?;
            samples.clear();
        }

        let was_armed = self.armed.swap(true, Ordering::SeqCst);
        assert!(!was_armed, "a capture window is already active");

        high_precision_sleep(window);
        self.armed.store(false, Ordering::SeqCst);

        if let Some(message) = self.take_fault() {
            return Err(SessionError::Capture(message));
        }

        let samples = {
            let mut guard = self
                .buffer
                .lock()
                .map_err(|_| SessionError::Capture("capture buffer poisoned".into()))?;
            std::mem::take(&mut *guard)
        };

        Ok(Capture {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }
}
