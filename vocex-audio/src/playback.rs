use std::io::Cursor;
use std::sync::Arc;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;
use vocex_core::{AudioDecoder, Clip, Player};

/// Decodes container bytes (WAV, MP3) through rodio's symphonia backend.
pub struct RodioDecoder;

impl AudioDecoder for RodioDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Clip, String> {
        let decoder = Decoder::try_from(Cursor::new(bytes.to_vec()))
            .map_err(|err| format!("decode failed: {err}"))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.collect();
        if samples.is_empty() {
            return Err("decoded to zero samples".into());
        }
        Ok(Clip {
            samples: Arc::new(samples),
            channels,
            sample_rate,
        })
    }
}

/// Stimulus playback on the default output device. One sink per trial;
/// `stop` drops it, so nothing carries over into the next trial.
pub struct RodioPlayer {
    stream: OutputStream,
    sink: Option<Sink>,
}

impl RodioPlayer {
    pub fn new() -> Result<Self, String> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|err| format!("no audio output: {err}"))?;
        Ok(Self { stream, sink: None })
    }
}

impl Player for RodioPlayer {
    fn start(&mut self, clip: &Clip) -> Result<(), String> {
        self.stop();
        let sink = Sink::connect_new(self.stream.mixer());
        let source = SamplesBuffer::new(
            clip.channels,
            clip.sample_rate,
            clip.samples.as_ref().clone(),
        );
        sink.append(source);
        debug!(
            samples = clip.samples.len(),
            sample_rate = clip.sample_rate,
            "playback started"
        );
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}
