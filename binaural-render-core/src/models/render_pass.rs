use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::scene::PassSource;
use super::state::{RenderMethod, RenderPhase};

/// One timed unit of playback + capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPass {
    /// Zero-based position of this pass within the sequence.
    pub ordinal: usize,
    pub phase: RenderPhase,
    pub source: PassSource,
    pub hrtf_index: usize,
    pub hrtf_name: Option<String>,
    pub room_index: usize,
    pub duration_secs: u32,
    /// Identifier the capture file name is derived from.
    pub configuration: String,
    pub directory: PathBuf,
}

/// A finalized WAV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFile {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// PCM payload size (file length minus the 44-byte header).
    pub data_bytes: u64,
    /// Samples that were outside [-1, 1] before conversion.
    pub clipped_samples: u64,
    /// SHA-256 of the finished file, lowercase hex.
    pub checksum: String,
}

impl CaptureFile {
    pub fn frame_count(&self) -> u64 {
        let block_align = self.channels as u64 * self.bits_per_sample as u64 / 8;
        if block_align == 0 {
            0
        } else {
            self.data_bytes / block_align
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }
}

/// A pass together with its capture outcome. `capture` is `None` when the
/// file could not be opened or finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedPass {
    pub pass: RenderPass,
    pub capture: Option<CaptureFile>,
}

/// Metadata stored alongside a capture.
///
/// Serializable for the JSON sidecar consumed by offline analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureMetadata {
    pub id: String,
    pub sequence_id: String,
    pub method: RenderMethod,
    pub created_at: String,
    pub pass: RenderPass,
    pub file_path: String,
    pub sample_rate: u32,
    pub data_bytes: u64,
    pub duration_secs: f64,
    pub checksum: String,
}

impl CaptureMetadata {
    pub fn new(sequence_id: &str, method: RenderMethod, pass: &RenderPass, capture: &CaptureFile) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sequence_id: sequence_id.to_string(),
            method,
            created_at: chrono::Utc::now().to_rfc3339(),
            pass: pass.clone(),
            file_path: capture.path.to_string_lossy().to_string(),
            sample_rate: capture.sample_rate,
            data_bytes: capture.data_bytes,
            duration_secs: capture.duration_secs(),
            checksum: capture.checksum.clone(),
        }
    }
}
