use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::RenderError;
use crate::models::render_pass::CaptureFile;
use crate::processing::pcm::{self, ClipPolicy};
use crate::processing::wav_format::{self, BITS_PER_SAMPLE, CHANNELS, WAV_HEADER_SIZE};

/// Scratch capacity reserved up front: 4096 stereo frames of int16.
const SCRATCH_BYTES: usize = 4096 * 4;

/// Streaming WAV encoder for one capture.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header, zeroed until close]
/// [raw 16-bit stereo PCM data...]
/// ```
///
/// The header is back-written on `close` from the final byte count. After
/// `close` every further `write_frames` or `close` fails with
/// `RenderError::StreamNotOpen`.
pub struct WavStreamWriter {
    file_path: PathBuf,
    sample_rate: u32,
    clip_policy: ClipPolicy,
    file: Option<BufWriter<File>>,
    data_bytes: u64,
    clipped_samples: u64,
    scratch: Vec<u8>,
}

impl WavStreamWriter {
    /// Create (or truncate) `file_path` and write a zeroed 44-byte header.
    pub fn open(file_path: PathBuf, sample_rate: u32, clip_policy: ClipPolicy) -> Result<Self, RenderError> {
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| RenderError::StorageError(format!("failed to create directory: {}", e)))?;
            }
        }

        let file = File::create(&file_path)
            .map_err(|e| RenderError::StorageError(format!("failed to create {}: {}", file_path.display(), e)))?;
        let mut file = BufWriter::new(file);
        file.write_all(&[0u8; WAV_HEADER_SIZE])
            .map_err(|e| RenderError::StorageError(format!("failed to reserve header: {}", e)))?;

        Ok(Self {
            file_path,
            sample_rate,
            clip_policy,
            file: Some(file),
            data_bytes: 0,
            clipped_samples: 0,
            scratch: Vec::with_capacity(SCRATCH_BYTES),
        })
    }

    /// Append interleaved stereo float frames.
    pub fn write_frames(&mut self, samples: &[f32]) -> Result<(), RenderError> {
        self.write_interleaved(samples, CHANNELS)
    }

    /// Append interleaved frames with `channels` channels, adapted to stereo.
    ///
    /// A batch that does not hold a whole number of frames is rejected and
    /// nothing is written.
    pub fn write_interleaved(&mut self, samples: &[f32], channels: u16) -> Result<(), RenderError> {
        let file = self.file.as_mut().ok_or(RenderError::StreamNotOpen)?;
        if channels == 0 {
            return Err(RenderError::EncodingFailed("frame batch has zero channels".into()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(RenderError::EncodingFailed(format!(
                "{} samples is not a whole number of {}-channel frames",
                samples.len(),
                channels
            )));
        }

        self.scratch.clear();
        self.clipped_samples += pcm::encode_stereo_i16(samples, channels, self.clip_policy, &mut self.scratch);

        file.write_all(&self.scratch)
            .map_err(|e| RenderError::StorageError(format!("write failed: {}", e)))?;
        self.data_bytes += self.scratch.len() as u64;
        Ok(())
    }

    /// Finalize the file: back-write the header, flush, close and checksum.
    pub fn close(&mut self) -> Result<CaptureFile, RenderError> {
        let writer = self.file.take().ok_or(RenderError::StreamNotOpen)?;
        let mut file = writer
            .into_inner()
            .map_err(|e| RenderError::StorageError(format!("flush failed: {}", e.error())))?;

        let file_len = file
            .seek(SeekFrom::End(0))
            .map_err(|e| RenderError::StorageError(e.to_string()))?;
        let data_size = file_len.saturating_sub(WAV_HEADER_SIZE as u64);
        let data_size_u32 = u32::try_from(data_size).unwrap_or_else(|_| {
            log::error!(
                "{} exceeds the 4 GiB RIFF limit, header sizes saturated",
                self.file_path.display()
            );
            u32::MAX - 36
        });

        let header = wav_format::generate_wav_header(self.sample_rate, data_size_u32);
        file.seek(SeekFrom::Start(0))
            .map_err(|e| RenderError::StorageError(e.to_string()))?;
        file.write_all(&header)
            .map_err(|e| RenderError::StorageError(format!("failed to write header: {}", e)))?;
        file.flush().map_err(|e| RenderError::StorageError(e.to_string()))?;
        drop(file);

        if self.clipped_samples > 0 {
            log::warn!(
                "{}: {} samples exceeded full scale ({:?})",
                self.file_path.display(),
                self.clipped_samples,
                self.clip_policy
            );
        }

        let checksum = sha256_file(&self.file_path)?;
        Ok(CaptureFile {
            path: self.file_path.clone(),
            sample_rate: self.sample_rate,
            channels: CHANNELS,
            bits_per_sample: BITS_PER_SAMPLE,
            data_bytes: data_size,
            clipped_samples: self.clipped_samples,
            checksum,
        })
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// PCM bytes written so far (excluding the header).
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    /// Path of the output file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// Compute SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, RenderError> {
    let data = fs::read(path)
        .map_err(|e| RenderError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
