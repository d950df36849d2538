use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use binaural_render_core::models::error::RenderError;
use binaural_render_core::traits::audio_source::{AudioBufferCallback, AudioSource};

const CHANNELS: u16 = 2;

/// Oscillator state shared by the audio thread and `pump`.
struct Oscillator {
    sample_rate: u32,
    frequency: f64,
    amplitude: f32,
    phase: f64,
}

impl Oscillator {
    /// Append `frames` interleaved stereo frames of a sine tone.
    fn fill(&mut self, frames: usize, out: &mut Vec<f32>) {
        let step = TAU * self.frequency / self.sample_rate as f64;
        out.reserve(frames * CHANNELS as usize);
        for _ in 0..frames {
            let sample = self.amplitude * self.phase.sin() as f32;
            out.push(sample);
            out.push(sample);
            self.phase = (self.phase + step) % TAU;
        }
    }
}

/// Deterministic stereo test stimulus standing in for the host audio pipeline.
///
/// In real-time mode `start` spawns a thread that delivers one block every
/// block period. In manual mode nothing is spawned and blocks are delivered
/// by `pump`.
pub struct ToneGenerator {
    sample_rate: u32,
    block_frames: usize,
    manual: bool,
    oscillator: Arc<Mutex<Oscillator>>,
    callback: Arc<Mutex<Option<AudioBufferCallback>>>,
    running: Arc<AtomicBool>,
    thread_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl ToneGenerator {
    /// A 1 kHz tone at half scale in blocks of 1024 frames.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            block_frames: 1024,
            manual: false,
            oscillator: Arc::new(Mutex::new(Oscillator {
                sample_rate,
                frequency: 1000.0,
                amplitude: 0.5,
                phase: 0.0,
            })),
            callback: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        }
    }

    /// Deliver blocks only when `pump` is called.
    pub fn manual(mut self) -> Self {
        self.manual = true;
        self
    }

    pub fn with_tone(self, frequency: f64, amplitude: f32) -> Self {
        {
            let mut osc = self.oscillator.lock();
            osc.frequency = frequency;
            osc.amplitude = amplitude;
        }
        self
    }

    pub fn with_block_frames(mut self, frames: usize) -> Self {
        self.block_frames = frames.max(1);
        self
    }

    pub fn block_period(&self) -> Duration {
        Duration::from_secs_f64(self.block_frames as f64 / self.sample_rate as f64)
    }

    /// Synchronously deliver `duration` worth of audio to the callback.
    ///
    /// Returns the number of frames delivered (0 when not started).
    pub fn pump(&self, duration: Duration) -> usize {
        let Some(callback) = self.callback.lock().clone() else {
            return 0;
        };
        let total = (duration.as_secs_f64() * self.sample_rate as f64).round() as usize;

        let mut delivered = 0;
        let mut block = Vec::with_capacity(self.block_frames * CHANNELS as usize);
        while delivered < total {
            let frames = self.block_frames.min(total - delivered);
            block.clear();
            self.oscillator.lock().fill(frames, &mut block);
            callback(&block, CHANNELS);
            delivered += frames;
        }
        delivered
    }
}

impl AudioSource for ToneGenerator {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), RenderError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(RenderError::InvalidState("tone generator already running".into()));
        }

        *self.callback.lock() = Some(Arc::clone(&callback));
        self.running.store(true, Ordering::SeqCst);
        if self.manual {
            return Ok(());
        }

        let running = Arc::clone(&self.running);
        let oscillator = Arc::clone(&self.oscillator);
        let block_frames = self.block_frames;
        let period = self.block_period();

        let handle = thread::Builder::new()
            .name("tone-generator".into())
            .spawn(move || {
                let mut block = Vec::with_capacity(block_frames * CHANNELS as usize);
                while running.load(Ordering::SeqCst) {
                    block.clear();
                    oscillator.lock().fill(block_frames, &mut block);
                    callback(&block, CHANNELS);
                    thread::sleep(period);
                }
                log::debug!("tone generator thread exiting");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                RenderError::InvalidState(format!("failed to spawn tone thread: {}", e))
            })?;

        *self.thread_handle.lock() = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RenderError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
        *self.callback.lock() = None;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for ToneGenerator {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_callback() -> (AudioBufferCallback, Arc<AtomicUsize>, Arc<Mutex<f32>>) {
        let frames = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(Mutex::new(0.0f32));
        let (f, p) = (Arc::clone(&frames), Arc::clone(&peak));
        let callback: AudioBufferCallback = Arc::new(move |samples: &[f32], channels: u16| {
            f.fetch_add(samples.len() / channels as usize, Ordering::SeqCst);
            let mut peak = p.lock();
            for s in samples {
                *peak = peak.max(s.abs());
            }
        });
        (callback, frames, peak)
    }

    #[test]
    fn pump_delivers_exact_frame_counts() {
        let mut tone = ToneGenerator::new(48000).manual().with_block_frames(480);
        assert_eq!(tone.pump(Duration::from_millis(10)), 0);

        let (callback, frames, peak) = counting_callback();
        tone.start(callback).unwrap();
        assert_eq!(tone.pump(Duration::from_millis(25)), 1200);
        assert_eq!(frames.load(Ordering::SeqCst), 1200);
        assert!(*peak.lock() <= 0.5 + 1e-6);
        assert!(*peak.lock() > 0.4);

        tone.stop().unwrap();
        assert!(!tone.is_running());
        assert_eq!(tone.pump(Duration::from_millis(10)), 0);
    }

    #[test]
    fn double_start_is_rejected() {
        let mut tone = ToneGenerator::new(48000).manual();
        let (callback, _, _) = counting_callback();
        tone.start(Arc::clone(&callback)).unwrap();
        assert!(matches!(tone.start(callback), Err(RenderError::InvalidState(_))));
    }

    #[test]
    fn realtime_thread_delivers_until_stopped() {
        let mut tone = ToneGenerator::new(48000).with_block_frames(256);
        let (callback, frames, _) = counting_callback();
        tone.start(callback).unwrap();
        thread::sleep(Duration::from_millis(50));
        tone.stop().unwrap();

        let delivered = frames.load(Ordering::SeqCst);
        assert!(delivered >= 256);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(frames.load(Ordering::SeqCst), delivered);
    }
}
