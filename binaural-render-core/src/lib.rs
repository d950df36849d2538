//! # binaural-render-core
//!
//! Platform-agnostic render sequencing and streaming WAV capture.
//!
//! Walks a batch of HRTF render passes (per speaker, per HRTF, per room, and
//! a near-field user phase) and captures the host's mixed output to one
//! 16-bit stereo WAV file per pass. The game engine and audio middleware plug
//! in through the `RenderScene`, `HrtfBank` and `AudioSource` traits.
//!
//! ## Architecture
//!
//! ```text
//! binaural-render-core (this crate)
//! ├── traits/       ← RenderScene, HrtfBank, AudioSource, RenderObserver, RenderRandomness
//! ├── models/       ← RenderError, RenderConfiguration, SequencerState, RenderPass, etc.
//! ├── processing/   ← float → int16 PCM, WAV header generation/parsing
//! ├── session/      ← RenderSequencer, CaptureSession, RenderTimer, strategy table
//! └── storage/      ← WavStreamWriter, OutputLayout, RenderLog, metadata
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::RenderConfiguration;
pub use models::error::RenderError;
pub use models::render_pass::{CaptureFile, CaptureMetadata, CompletedPass, RenderPass};
pub use models::scene::{ListenerBounds, ListenerPlacement, PassSource, Position, RoomSnapshot, SourceSnapshot};
pub use models::state::{RenderCursor, RenderMethod, RenderPhase, SequencerState};
pub use processing::pcm::ClipPolicy;
pub use session::capture::{CaptureDiagnostics, CaptureSession, CaptureSink, CaptureTarget};
pub use session::sequencer::{RenderProgress, RenderSequencer};
pub use session::timer::{ProgressPlan, RenderTimer, TimerCompleted};
pub use storage::wav_writer::WavStreamWriter;
pub use traits::audio_source::{AudioBufferCallback, AudioSource};
pub use traits::hrtf_bank::HrtfBank;
pub use traits::observer::RenderObserver;
pub use traits::randomness::{RenderRandomness, ThreadRandomness};
pub use traits::scene::RenderScene;
