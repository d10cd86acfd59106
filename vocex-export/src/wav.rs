use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use vocex_core::Capture;

use crate::ExportError;

/// Encode one capture as 16-bit PCM WAV bytes.
pub fn encode_wav(capture: &Capture) -> Result<Vec<u8>, ExportError> {
    let spec = WavSpec {
        channels: capture.channels,
        sample_rate: capture.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in &capture.samples {
        let value = (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        writer.write_sample(value)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}
