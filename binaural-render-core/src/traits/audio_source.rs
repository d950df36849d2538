use std::sync::Arc;

use crate::models::error::RenderError;

/// Callback invoked when an audio buffer is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples.
/// - `channels`: Number of channels (2 for the host mix).
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], u16) + Send + Sync + 'static>;

/// The host's real-time audio pipeline.
///
/// Implemented by:
/// - `ToneGenerator` (headless deterministic stimulus)
///
/// The callback fires on a dedicated audio thread. Keep processing minimal.
pub trait AudioSource: Send {
    /// Native output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Start delivering buffers via `callback`.
    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), RenderError>;

    /// Stop delivering buffers and release resources.
    fn stop(&mut self) -> Result<(), RenderError>;

    fn is_running(&self) -> bool;
}
