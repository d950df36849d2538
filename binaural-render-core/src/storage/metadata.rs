use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::RenderError;
use crate::models::render_pass::CaptureMetadata;

/// Sidecar path for a capture: `mic_00.wav` -> `mic_00.metadata.json`.
pub fn metadata_path(capture_path: &Path) -> PathBuf {
    capture_path.with_extension("metadata.json")
}

/// Write capture metadata as a JSON sidecar file next to the capture.
pub fn write_metadata(metadata: &CaptureMetadata, capture_path: &Path) -> Result<PathBuf, RenderError> {
    let path = metadata_path(capture_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| RenderError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&path, json).map_err(|e| RenderError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(path)
}

/// Read capture metadata from its JSON sidecar file.
pub fn read_metadata(capture_path: &Path) -> Result<CaptureMetadata, RenderError> {
    let json = fs::read_to_string(metadata_path(capture_path))
        .map_err(|e| RenderError::StorageError(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| RenderError::StorageError(format!("failed to parse metadata: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::render_pass::{CaptureFile, RenderPass};
    use crate::models::scene::PassSource;
    use crate::models::state::{RenderMethod, RenderPhase};

    #[test]
    fn sidecar_sits_next_to_capture() {
        assert_eq!(
            metadata_path(Path::new("render0/mic_00.wav")),
            PathBuf::from("render0/mic_00.metadata.json")
        );
    }

    #[test]
    fn written_metadata_reads_back() {
        let dir = std::env::temp_dir().join(format!("binaural_meta_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let capture_path = dir.join("mic_01.wav");

        let pass = RenderPass {
            ordinal: 1,
            phase: RenderPhase::Speakers,
            source: PassSource::Speaker("B".into()),
            hrtf_index: 0,
            hrtf_name: None,
            room_index: 0,
            duration_secs: 6,
            configuration: "01".into(),
            directory: dir.clone(),
        };
        let capture = CaptureFile {
            path: capture_path.clone(),
            sample_rate: 48000,
            channels: 2,
            bits_per_sample: 16,
            data_bytes: 1920,
            clipped_samples: 0,
            checksum: "ab".repeat(32),
        };
        let metadata = CaptureMetadata::new("seq", RenderMethod::OneByOne { hrtf_index: 0 }, &pass, &capture);

        let written = write_metadata(&metadata, &capture_path).unwrap();
        assert!(written.exists());
        assert_eq!(read_metadata(&capture_path).unwrap(), metadata);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_sidecar_is_a_storage_error() {
        let result = read_metadata(Path::new("/nonexistent/mic_99.wav"));
        assert!(matches!(result, Err(RenderError::StorageError(_))));
    }
}
