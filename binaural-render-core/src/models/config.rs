use std::path::PathBuf;

use super::scene::ListenerBounds;
use super::state::RenderMethod;
use crate::processing::pcm::ClipPolicy;
use crate::processing::wav_format::BLOCK_ALIGN;

/// Highest sample rate whose byte rate still fits the 32-bit header field.
pub const MAX_SAMPLE_RATE: u32 = u32::MAX / BLOCK_ALIGN as u32;

/// Configuration for a render sequencer and its capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfiguration {
    /// Host output sample rate in Hz (default: 48000).
    pub sample_rate: u32,

    /// Directory under which one `render<N>` folder is allocated per sequence.
    pub output_root: PathBuf,

    /// Length of a single pass in whole seconds (default: 6).
    pub pass_duration_secs: u32,

    /// Strategy used by the next `setup_render`.
    pub render_method: RenderMethod,

    /// Number of rooms for room-based methods (None = one room per speaker).
    pub room_count: Option<usize>,

    /// Number of user configurations the near-field phase picks from (default: 11).
    pub user_config_pairs: usize,

    /// HRTF passes rendered in the near-field phase (default: 2).
    pub near_field_passes: usize,

    /// Region the listener is randomly relocated into.
    pub listener_bounds: ListenerBounds,

    /// How out-of-range samples are converted to 16-bit PCM.
    pub clip_policy: ClipPolicy,

    /// Write a JSON sidecar next to every finalized capture (default: true).
    pub write_metadata: bool,
}

impl RenderConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.sample_rate > MAX_SAMPLE_RATE {
            return Err(format!("sample rate must not exceed {} Hz", MAX_SAMPLE_RATE));
        }
        if self.pass_duration_secs == 0 {
            return Err("pass duration must be at least one second".into());
        }
        if self.room_count == Some(0) {
            return Err("room count must be positive".into());
        }
        if self.user_config_pairs == 0 {
            return Err("at least one user configuration is required".into());
        }
        if self.near_field_passes == 0 {
            return Err("near-field phase needs at least one pass".into());
        }
        if !self.listener_bounds.is_valid() {
            return Err("listener bounds are inverted".into());
        }
        Ok(())
    }
}

impl Default for RenderConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            output_root: PathBuf::from("renders").join("rooms"),
            pass_duration_secs: 6,
            render_method: RenderMethod::FullRender,
            room_count: None,
            user_config_pairs: 11,
            near_field_passes: 2,
            listener_bounds: ListenerBounds::default(),
            clip_policy: ClipPolicy::Clamp,
            write_metadata: true,
        }
    }
}
