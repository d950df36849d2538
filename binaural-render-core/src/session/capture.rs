use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::models::error::RenderError;
use crate::models::render_pass::CaptureFile;
use crate::processing::pcm::ClipPolicy;
use crate::storage::wav_writer::WavStreamWriter;
use crate::traits::audio_source::AudioBufferCallback;

/// Derive `mic_<pair>.wav` from a configuration identifier.
///
/// Non-digits are stripped from the identifier's stem. The near-field
/// variant also drops the first remaining digit (the user configuration).
/// Identifiers without digits fall back to a sanitised stem.
pub fn capture_file_name(identifier: &str, near_field: bool) -> String {
    let stem = Path::new(identifier)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(identifier);

    let mut digits: String = stem.chars().filter(|c| c.is_ascii_digit()).collect();
    if near_field && !digits.is_empty() {
        digits.remove(0);
    }
    if !digits.is_empty() {
        return format!("mic_{}.wav", digits);
    }

    let sanitised: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if sanitised.is_empty() {
        "mic_unnamed.wav".to_string()
    } else {
        format!("mic_{}.wav", sanitised)
    }
}

/// Where the next capture goes and what it is named after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTarget {
    pub directory: PathBuf,
    /// Active configuration identifier (HRTF name or speaker ordinal).
    pub identifier: String,
    pub near_field: bool,
}

impl CaptureTarget {
    pub fn path(&self) -> PathBuf {
        self.directory
            .join(capture_file_name(&self.identifier, self.near_field))
    }
}

/// Counters for debugging the audio bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub buffers_received: u64,
    pub samples_written: u64,
    pub samples_dropped: u64,
    pub write_errors: u64,
    pub files_finalized: u64,
    pub clipped_samples: u64,
    pub double_starts: u64,
}

/// State shared between the control thread and the audio thread.
struct CaptureShared {
    recording: AtomicBool,
    rendering: AtomicBool,
    writer: Mutex<Option<WavStreamWriter>>,
    diagnostics: Mutex<CaptureDiagnostics>,
}

impl CaptureShared {
    fn transmit(&self, samples: &[f32], channels: u16) {
        if !(self.rendering.load(Ordering::Acquire) && self.recording.load(Ordering::Acquire)) {
            let mut d = self.diagnostics.lock();
            d.buffers_received += 1;
            d.samples_dropped += samples.len() as u64;
            return;
        }

        let result = {
            let mut guard = self.writer.lock();
            match guard.as_mut() {
                Some(writer) => Some(writer.write_interleaved(samples, channels)),
                // Stream closed between the flag check and the lock.
                None => None,
            }
        };

        let mut d = self.diagnostics.lock();
        d.buffers_received += 1;
        match result {
            Some(Ok(())) => d.samples_written += samples.len() as u64,
            Some(Err(e)) => {
                d.write_errors += 1;
                d.samples_dropped += samples.len() as u64;
                drop(d);
                log::error!("capture write failed: {}", e);
            }
            None => d.samples_dropped += samples.len() as u64,
        }
    }
}

/// Owns at most one open capture stream at a time.
///
/// ```text
/// [audio thread] → CaptureSink::transmit_data ─┐
///                                               ├→ Mutex<Option<WavStreamWriter>>
/// [control thread] → start/stop/toggle ─────────┘
/// ```
///
/// Frames reach the file only while both the recording and the rendering
/// flags are set. On stop the recording flag is cleared before the stream is
/// taken out of the lock, so a frame at a pass boundary lands in the old
/// file or nowhere.
pub struct CaptureSession {
    shared: Arc<CaptureShared>,
    sample_rate: u32,
    clip_policy: ClipPolicy,
    target: Option<CaptureTarget>,
    current_path: Option<PathBuf>,
}

impl CaptureSession {
    pub fn new(sample_rate: u32, clip_policy: ClipPolicy) -> Self {
        Self {
            shared: Arc::new(CaptureShared {
                recording: AtomicBool::new(false),
                rendering: AtomicBool::new(false),
                writer: Mutex::new(None),
                diagnostics: Mutex::new(CaptureDiagnostics::default()),
            }),
            sample_rate,
            clip_policy,
            target: None,
            current_path: None,
        }
    }

    /// Set the configuration the next `start_recording` names its file after.
    pub fn set_target(&mut self, target: CaptureTarget) {
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<&CaptureTarget> {
        self.target.as_ref()
    }

    /// Mirror of the sequencer's rendering flag, read on the audio thread.
    pub fn set_rendering(&self, rendering: bool) {
        self.shared.rendering.store(rendering, Ordering::Release);
    }

    pub fn is_rendering(&self) -> bool {
        self.shared.rendering.load(Ordering::Acquire)
    }

    pub fn is_recording(&self) -> bool {
        self.shared.recording.load(Ordering::Acquire)
    }

    /// Path of the file currently being written.
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Stop if recording, start otherwise.
    pub fn toggle_recording(&mut self) -> Result<Option<CaptureFile>, RenderError> {
        if self.is_recording() {
            self.stop_recording()
        } else {
            self.start_recording().map(|_| None)
        }
    }

    /// Open a new capture for the current target.
    ///
    /// Already recording is logged and ignored.
    pub fn start_recording(&mut self) -> Result<(), RenderError> {
        if self.is_recording() {
            self.shared.diagnostics.lock().double_starts += 1;
            log::warn!(
                "start requested while already recording to {}",
                self.current_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
            return Ok(());
        }

        let target = self
            .target
            .as_ref()
            .ok_or_else(|| RenderError::InvalidState("no capture target set".into()))?;
        let path = target.path();

        let writer = WavStreamWriter::open(path.clone(), self.sample_rate, self.clip_policy)?;
        *self.shared.writer.lock() = Some(writer);
        self.shared.recording.store(true, Ordering::Release);

        log::debug!("recording to {}", path.display());
        self.current_path = Some(path);
        Ok(())
    }

    /// Finalize the open capture. Not recording is a no-op.
    pub fn stop_recording(&mut self) -> Result<Option<CaptureFile>, RenderError> {
        if !self.is_recording() {
            return Ok(None);
        }
        self.shared.recording.store(false, Ordering::Release);
        self.current_path = None;

        let writer = self.shared.writer.lock().take();
        let Some(mut writer) = writer else {
            return Err(RenderError::StreamNotOpen);
        };

        let capture = writer.close()?;
        {
            let mut d = self.shared.diagnostics.lock();
            d.files_finalized += 1;
            d.clipped_samples += capture.clipped_samples;
        }
        log::debug!(
            "finalized {} ({} data bytes)",
            capture.path.display(),
            capture.data_bytes
        );
        Ok(Some(capture))
    }

    /// Entry point for the host audio callback.
    pub fn transmit_data(&self, samples: &[f32], channels: u16) {
        self.shared.transmit(samples, channels);
    }

    /// A handle the audio thread can hold without keeping the session alive.
    pub fn sink(&self) -> CaptureSink {
        CaptureSink {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.shared.diagnostics.lock().clone()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.is_recording() {
            if let Err(e) = self.stop_recording() {
                log::error!("failed to finalize capture on drop: {}", e);
            }
        }
    }
}

/// Audio-thread handle to a `CaptureSession`.
///
/// Frames are dropped once the session is gone.
#[derive(Clone)]
pub struct CaptureSink {
    shared: Weak<CaptureShared>,
}

impl CaptureSink {
    pub fn transmit_data(&self, samples: &[f32], channels: u16) {
        if let Some(shared) = self.shared.upgrade() {
            shared.transmit(samples, channels);
        }
    }

    /// Wrap the sink as an `AudioSource` callback.
    pub fn into_callback(self) -> AudioBufferCallback {
        Arc::new(move |samples: &[f32], channels: u16| self.transmit_data(samples, channels))
    }
}
