//! Builds playable WAV containers from streamed PCM fragments.

use std::io::Cursor;

/// Describes the raw PCM layout of a stream of audio fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_rate: u32,
}

/// The format the upstream realtime API streams replies in.
pub const REPLY_FORMAT: PcmFormat = PcmFormat {
    channels: 1,
    bits_per_sample: 16,
    sample_rate: 24_000,
};

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Callers are expected to skip encoding when a turn produced no audio.
    #[error("no audio fragments to encode")]
    Empty,
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Encodes an ordered sequence of raw PCM byte fragments into a WAV container.
///
/// Fragments are concatenated exactly in the given order; arrival order is
/// the playback order, the protocol carries no sequence numbers. A trailing
/// odd byte (half a 16-bit sample) is dropped.
pub fn encode_wav(fragments: &[Vec<u8>], format: PcmFormat) -> Result<Vec<u8>, EncodeError> {
    if fragments.is_empty() {
        return Err(EncodeError::Empty);
    }

    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    let pcm = fragments.concat();
    for sample in pcm.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([sample[0], sample[1]]))?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}
