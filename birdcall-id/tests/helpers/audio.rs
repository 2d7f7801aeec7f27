//! Audio payload generator
//!
//! In-memory WAV recordings for upload tests.

use std::io::Cursor;

const SAMPLE_RATE: u32 = 22_050;
const WAV_HEADER_BYTES: usize = 44;

/// Mono 16-bit WAV of roughly `target_len` bytes
///
/// The signal is a repeating 2-4 kHz upward sweep, loosely shaped like a
/// song phrase, so the payload is not a block of zeros.
pub fn chirp_wav(target_len: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let total_samples = target_len.saturating_sub(WAV_HEADER_BYTES) / 2;
    let phrase_samples = (SAMPLE_RATE / 4) as usize;

    let mut cursor = Cursor::new(Vec::with_capacity(target_len));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let mut phase = 0.0f32;
        for i in 0..total_samples {
            let progress = (i % phrase_samples) as f32 / phrase_samples as f32;
            let freq = 2_000.0 + 2_000.0 * progress;
            phase += 2.0 * std::f32::consts::PI * freq / SAMPLE_RATE as f32;
            let sample = (0.3 * phase.sin() * i16::MAX as f32) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// A short call, a few kilobytes
pub fn short_call() -> Vec<u8> {
    chirp_wav(8 * 1024)
}
