//! WAV file format utilities.
//!
//! Generates and parses the canonical 44-byte RIFF/WAVE header used by
//! every capture. Captures are always PCM, 2 channels, 16 bits per sample.

use crate::models::error::RenderError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Channel count of every capture.
pub const CHANNELS: u16 = 2;

/// Bit depth of every capture.
pub const BITS_PER_SAMPLE: u16 = 16;

/// `channels * bits_per_sample / 8`.
pub const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;

/// Generate a 44-byte WAV RIFF header for a stereo 16-bit capture.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8 (= 36 + data_size)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels = 2
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * block_align
/// [32-33]  block_align = 4
/// [34-35]  bits per sample = 16
/// [36-39]  "data"
/// [40-43]  data_size (= file size - 44)
/// ```
pub fn generate_wav_header(sample_rate: u32, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate.saturating_mul(BLOCK_ALIGN as u32);
    let chunk_size = 36u32.saturating_add(data_size);

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Decoded fields of a 44-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Whether the size fields agree with a file of `file_len` bytes.
    pub fn is_consistent_with(&self, file_len: u64) -> bool {
        file_len >= WAV_HEADER_SIZE as u64
            && self.chunk_size as u64 == file_len - 8
            && self.data_size as u64 == file_len - WAV_HEADER_SIZE as u64
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// Parse the canonical header at the start of `bytes`.
pub fn parse_wav_header(bytes: &[u8]) -> Result<WavHeader, RenderError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(RenderError::EncodingFailed(format!(
            "header needs {} bytes, got {}",
            WAV_HEADER_SIZE,
            bytes.len()
        )));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(RenderError::EncodingFailed("missing RIFF/WAVE magic".into()));
    }
    if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
        return Err(RenderError::EncodingFailed("unexpected sub-chunk layout".into()));
    }

    Ok(WavHeader {
        chunk_size: read_u32(bytes, 4),
        audio_format: read_u16(bytes, 20),
        channels: read_u16(bytes, 22),
        sample_rate: read_u32(bytes, 24),
        byte_rate: read_u32(bytes, 28),
        block_align: read_u16(bytes, 32),
        bits_per_sample: read_u16(bytes, 34),
        data_size: read_u32(bytes, 40),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_is_44_bytes() {
        let header = generate_wav_header(48000, 0);
        assert_eq!(header.len(), 44);
    }

    #[test]
    fn header_riff_magic() {
        let header = generate_wav_header(48000, 0);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_44khz_fields() {
        let header = parse_wav_header(&generate_wav_header(44100, 8820)).unwrap();

        assert_eq!(header.audio_format, 1);
        assert_eq!(header.channels, 2);
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.byte_rate, 176400); // 44100 * 4
        assert_eq!(header.block_align, 4);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.data_size, 8820);
        assert_eq!(header.chunk_size, 36 + 8820);
    }

    #[test]
    fn huge_sample_rate_saturates_byte_rate() {
        let header = parse_wav_header(&generate_wav_header(u32::MAX / 2, 0)).unwrap();
        assert_eq!(header.byte_rate, u32::MAX);
        assert_eq!(header.sample_rate, u32::MAX / 2);
    }

    #[test]
    fn consistency_against_file_length() {
        let header = parse_wav_header(&generate_wav_header(48000, 16)).unwrap();
        assert!(header.is_consistent_with(60));
        assert!(!header.is_consistent_with(64));
        assert!(!header.is_consistent_with(8));
    }

    #[test]
    fn rejects_short_or_foreign_headers() {
        assert!(parse_wav_header(&[0u8; 10]).is_err());
        assert!(parse_wav_header(&[0u8; 44]).is_err());

        let mut header = generate_wav_header(48000, 0);
        header[36..40].copy_from_slice(b"LIST");
        assert!(parse_wav_header(&header).is_err());
    }
}
