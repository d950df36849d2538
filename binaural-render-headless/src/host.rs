use std::thread;
use std::time::{Duration, Instant};

use binaural_render_core::models::error::RenderError;
use binaural_render_core::session::sequencer::RenderSequencer;
use binaural_render_core::traits::audio_source::AudioSource;
use binaural_render_core::traits::hrtf_bank::HrtfBank;
use binaural_render_core::traits::scene::RenderScene;

/// Stands in for the engine frame loop: drives the sequencer from a clock and
/// wires an `AudioSource` into its capture sink.
pub struct HeadlessHost<S: RenderScene, B: HrtfBank, A: AudioSource> {
    sequencer: RenderSequencer<S, B>,
    audio: A,
}

impl<S: RenderScene, B: HrtfBank, A: AudioSource> HeadlessHost<S, B, A> {
    pub fn new(sequencer: RenderSequencer<S, B>, audio: A) -> Self {
        Self { sequencer, audio }
    }

    /// Connect the audio source and start a new sequence.
    pub fn start(&mut self) -> Result<(), RenderError> {
        if !self.audio.is_running() {
            self.audio.start(self.sequencer.capture_sink().into_callback())?;
        }
        if let Err(e) = self.sequencer.toggle_render() {
            let _ = self.audio.stop();
            return Err(e);
        }
        Ok(())
    }

    /// Advance the sequencer by `elapsed`. Returns completions handled.
    pub fn step(&mut self, elapsed: Duration) -> usize {
        self.sequencer.tick(elapsed)
    }

    /// Tick on a monotonic clock every `tick_interval` until the sequence
    /// returns to idle. Stops the sequence and fails after `timeout`.
    pub fn run_until_idle(&mut self, tick_interval: Duration, timeout: Duration) -> Result<Duration, RenderError> {
        let started = Instant::now();
        let mut last = started;

        while self.sequencer.is_rendering() {
            thread::sleep(tick_interval);
            let now = Instant::now();
            self.sequencer.tick(now - last);
            last = now;

            if now - started > timeout && self.sequencer.is_rendering() {
                log::error!("render did not finish within {:?}, stopping", timeout);
                self.sequencer.stop_render();
                self.audio.stop()?;
                return Err(RenderError::InvalidState(format!(
                    "render timed out after {:?}",
                    timeout
                )));
            }
        }

        self.audio.stop()?;
        Ok(started.elapsed())
    }

    /// Abort the running sequence and disconnect audio.
    pub fn stop(&mut self) -> Result<(), RenderError> {
        self.sequencer.stop_render();
        self.audio.stop()
    }

    pub fn sequencer(&self) -> &RenderSequencer<S, B> {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut RenderSequencer<S, B> {
        &mut self.sequencer
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn into_parts(self) -> (RenderSequencer<S, B>, A) {
        (self.sequencer, self.audio)
    }
}
