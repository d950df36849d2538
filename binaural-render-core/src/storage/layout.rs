use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::RenderError;

/// Name of the plain-text render log written into each segment directory.
pub const LOG_FILE_NAME: &str = "log.txt";

/// Resolves where a sequence writes its captures.
///
/// ```text
/// <output_root>/
/// └── render<N>/          one per sequence
///     ├── mic_*.wav       one-by-one / all-at-once
///     ├── inroom<k>/      one per room
///     └── user<u>/        near-field phase
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    output_root: PathBuf,
    sequence_root: Option<PathBuf>,
}

impl OutputLayout {
    pub fn new(output_root: PathBuf) -> Self {
        Self {
            output_root,
            sequence_root: None,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Root of the current sequence, if one was allocated.
    pub fn sequence_root(&self) -> Option<&Path> {
        self.sequence_root.as_deref()
    }

    /// Create `render<N>` under the output root, where N starts at the number
    /// of existing sub-directories and is bumped until the name is free.
    pub fn allocate_sequence_root(&mut self) -> Result<PathBuf, RenderError> {
        self.sequence_root = None;
        fs::create_dir_all(&self.output_root)
            .map_err(|e| RenderError::StorageError(format!("failed to create output root: {}", e)))?;

        let existing = fs::read_dir(&self.output_root)
            .map_err(|e| RenderError::StorageError(format!("failed to list output root: {}", e)))?
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .count();

        let mut index = existing;
        let root = loop {
            let candidate = self.output_root.join(format!("render{}", index));
            if !candidate.exists() {
                break candidate;
            }
            index += 1;
        };

        fs::create_dir_all(&root)
            .map_err(|e| RenderError::StorageError(format!("failed to create {}: {}", root.display(), e)))?;
        log::info!("allocated render folder {}", root.display());
        self.sequence_root = Some(root.clone());
        Ok(root)
    }

    /// Directory of the current sequence, falling back to the output root
    /// when allocation failed.
    pub fn root_dir(&self) -> PathBuf {
        self.sequence_root.clone().unwrap_or_else(|| self.output_root.clone())
    }

    pub fn room_dir(&self, room: usize) -> PathBuf {
        self.root_dir().join(format!("inroom{}", room))
    }

    pub fn user_dir(&self, user: usize) -> PathBuf {
        self.root_dir().join(format!("user{}", user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("binaural_layout_{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn allocates_sequential_render_folders() {
        let root = temp_root();
        let mut layout = OutputLayout::new(root.clone());

        let first = layout.allocate_sequence_root().unwrap();
        let second = layout.allocate_sequence_root().unwrap();

        assert_eq!(first, root.join("render0"));
        assert_eq!(second, root.join("render1"));
        assert_eq!(layout.sequence_root(), Some(second.as_path()));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn skips_taken_names() {
        let root = temp_root();
        fs::create_dir_all(root.join("render1")).unwrap();

        // One existing folder -> starts at render1, which is taken.
        let mut layout = OutputLayout::new(root.clone());
        let allocated = layout.allocate_sequence_root().unwrap();
        assert_eq!(allocated, root.join("render2"));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn segment_dirs_hang_off_sequence_root() {
        let root = temp_root();
        let mut layout = OutputLayout::new(root.clone());
        assert_eq!(layout.room_dir(3), root.join("inroom3"));

        let seq = layout.allocate_sequence_root().unwrap();
        assert_eq!(layout.room_dir(0), seq.join("inroom0"));
        assert_eq!(layout.user_dir(7), seq.join("user7"));

        fs::remove_dir_all(&root).ok();
    }
}
