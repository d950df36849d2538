//! # binaural-render-headless
//!
//! Engine-free backend for binaural-render-core.
//!
//! Provides:
//! - `HeadlessScene` : in-memory speakers, near-field source, listener and room
//! - `StaticHrtfBank` : HRTF bank over a fixed list of SOFA names
//! - `ToneGenerator` : deterministic stereo stimulus on a dedicated thread
//! - `HeadlessHost` : drives the sequencer from a monotonic clock
//!
//! ## Usage
//! ```ignore
//! use binaural_render_core::{RenderConfiguration, RenderSequencer};
//! use binaural_render_headless::{HeadlessHost, HeadlessScene, StaticHrtfBank, ToneGenerator};
//!
//! let sequencer = RenderSequencer::new(
//!     HeadlessScene::ring(4),
//!     StaticHrtfBank::with_users(6, 11),
//!     RenderConfiguration::default(),
//! )?;
//! let mut host = HeadlessHost::new(sequencer, ToneGenerator::new(48000));
//! host.start()?;
//! host.run_until_idle(Duration::from_millis(50), Duration::from_secs(3600))?;
//! ```

pub mod host;
pub mod hrtf_bank;
pub mod scene;
pub mod tone_generator;

pub use host::HeadlessHost;
pub use hrtf_bank::StaticHrtfBank;
pub use scene::{HeadlessScene, HeadlessSource, ParameterRanges};
pub use tone_generator::ToneGenerator;
