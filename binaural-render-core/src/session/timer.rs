use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::models::error::RenderError;

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Multipliers for the advisory progress counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressPlan {
    /// Passes in the current segment (one room, or the whole run for flat methods).
    pub passes_per_segment: usize,
    /// Passes in the whole sequence.
    pub total_passes: usize,
}

/// Sent once when a countdown reaches zero on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerCompleted {
    pub generation: u64,
}

/// Cooperative one-second countdown driven by `tick`.
///
/// Only the per-pass countdown and its completion drive control flow. The
/// segment and total counters are computed on the first `begin` after a
/// `reset_progress` and then only decremented.
pub struct RenderTimer {
    active: bool,
    started: bool,
    progress_planned: bool,
    generation: u64,
    elapsed: Duration,
    current_secs: u32,
    segment_secs: u32,
    total_secs: u32,
    container_secs: u32,
    sender: Sender<TimerCompleted>,
    receiver: Option<Receiver<TimerCompleted>>,
}

impl Default for RenderTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTimer {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            active: false,
            started: false,
            progress_planned: false,
            generation: 0,
            elapsed: Duration::ZERO,
            current_secs: 0,
            segment_secs: 0,
            total_secs: 0,
            container_secs: 0,
            sender,
            receiver: Some(receiver),
        }
    }

    /// Take the completion receiver. Only the first call gets it.
    pub fn subscribe(&mut self) -> Option<Receiver<TimerCompleted>> {
        self.receiver.take()
    }

    /// Start (or restart) the per-pass countdown.
    pub fn begin(&mut self, duration_secs: u32, plan: ProgressPlan) {
        self.generation += 1;
        self.active = true;
        self.started = true;
        self.elapsed = Duration::ZERO;
        self.current_secs = duration_secs;

        if !self.progress_planned {
            self.total_secs = duration_secs.saturating_mul(plan.total_passes as u32);
            self.container_secs = self.total_secs;
            self.progress_planned = true;
        }
        if self.segment_secs == 0 {
            self.segment_secs = duration_secs.saturating_mul(plan.passes_per_segment as u32);
        }
        log::debug!(
            "timer generation {} begins: {}s (segment {}s, total {}s)",
            self.generation,
            self.current_secs,
            self.segment_secs,
            self.total_secs
        );
    }

    /// Cancel the countdown without signalling completion.
    pub fn stop(&mut self) -> Result<(), RenderError> {
        if !self.started {
            return Err(RenderError::InvalidState("timer was never started".into()));
        }
        self.active = false;
        // Invalidate a completion already queued for this countdown.
        self.generation += 1;
        Ok(())
    }

    /// Forget the progress counters so the next `begin` recomputes them.
    pub fn reset_progress(&mut self) {
        self.progress_planned = false;
        self.segment_secs = 0;
        self.total_secs = 0;
        self.container_secs = 0;
    }

    /// Zero the segment counter so the next `begin` starts a fresh segment.
    pub fn reset_segment(&mut self) {
        self.segment_secs = 0;
    }

    /// Advance by `elapsed`. Returns true when this tick completed the countdown.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if !self.active {
            return false;
        }

        self.elapsed += elapsed;
        while self.current_secs > 0 && self.elapsed >= ONE_SECOND {
            self.elapsed -= ONE_SECOND;
            self.current_secs -= 1;
            self.segment_secs = self.segment_secs.saturating_sub(1);
            self.total_secs = self.total_secs.saturating_sub(1);
        }

        if self.current_secs > 0 {
            return false;
        }

        self.active = false;
        let completed = TimerCompleted {
            generation: self.generation,
        };
        if self.sender.send(completed).is_err() {
            log::debug!("timer completion {} has no receiver", self.generation);
        }
        true
    }

    /// Whether `completed` belongs to the countdown that is still current.
    pub fn is_current(&self, completed: &TimerCompleted) -> bool {
        completed.generation == self.generation
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_secs_left(&self) -> u32 {
        self.current_secs
    }

    pub fn segment_secs_left(&self) -> u32 {
        self.segment_secs
    }

    pub fn total_secs_left(&self) -> u32 {
        self.total_secs
    }

    pub fn container_secs(&self) -> u32 {
        self.container_secs
    }

    /// `(container - total) / container`, or 0 before the first `begin`.
    pub fn progress(&self) -> f32 {
        if self.container_secs == 0 {
            return 0.0;
        }
        (self.container_secs - self.total_secs) as f32 / self.container_secs as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(per_segment: usize, total: usize) -> ProgressPlan {
        ProgressPlan {
            passes_per_segment: per_segment,
            total_passes: total,
        }
    }

    #[test]
    fn completes_once_after_whole_seconds() {
        let mut timer = RenderTimer::new();
        let rx = timer.subscribe().unwrap();
        timer.begin(3, plan(1, 1));

        assert!(!timer.tick(Duration::from_millis(1500)));
        assert_eq!(timer.current_secs_left(), 2);
        assert!(!timer.tick(Duration::from_millis(1400)));
        assert!(timer.tick(Duration::from_millis(100)));
        assert!(!timer.is_active());
        assert!(!timer.tick(Duration::from_secs(5)));

        let completed = rx.try_recv().unwrap();
        assert!(timer.is_current(&completed));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn zero_duration_completes_on_next_tick() {
        let mut timer = RenderTimer::new();
        let rx = timer.subscribe().unwrap();
        timer.begin(0, plan(1, 1));
        assert!(timer.tick(Duration::ZERO));
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn stop_never_signals_and_stales_queued_completion() {
        let mut timer = RenderTimer::new();
        let rx = timer.subscribe().unwrap();
        timer.begin(1, plan(1, 1));
        timer.tick(Duration::from_secs(1));
        timer.stop().unwrap();

        let completed = rx.try_recv().unwrap();
        assert!(!timer.is_current(&completed));

        timer.begin(2, plan(1, 1));
        timer.stop().unwrap();
        assert!(!timer.tick(Duration::from_secs(5)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stop_before_begin_is_misuse() {
        let mut timer = RenderTimer::new();
        assert!(matches!(timer.stop(), Err(RenderError::InvalidState(_))));
    }

    #[test]
    fn subscribe_hands_out_one_receiver() {
        let mut timer = RenderTimer::new();
        assert!(timer.subscribe().is_some());
        assert!(timer.subscribe().is_none());
    }

    #[test]
    fn totals_are_computed_once_per_sequence() {
        let mut timer = RenderTimer::new();
        timer.begin(2, plan(3, 6));
        assert_eq!(timer.total_secs_left(), 12);
        assert_eq!(timer.segment_secs_left(), 6);

        timer.tick(Duration::from_secs(2));
        timer.begin(2, plan(3, 6));
        assert_eq!(timer.total_secs_left(), 10);
        assert_eq!(timer.segment_secs_left(), 4);
        assert!((timer.progress() - 2.0 / 12.0).abs() < 1e-6);

        // Stop alone keeps the totals.
        timer.stop().unwrap();
        timer.begin(2, plan(3, 6));
        assert_eq!(timer.total_secs_left(), 10);

        timer.reset_progress();
        timer.begin(2, plan(1, 4));
        assert_eq!(timer.total_secs_left(), 8);
        assert_eq!(timer.segment_secs_left(), 2);
        assert_eq!(timer.progress(), 0.0);
    }

    #[test]
    fn segment_counter_refills_after_reaching_zero() {
        let mut timer = RenderTimer::new();
        timer.begin(1, plan(2, 4));
        timer.tick(Duration::from_secs(1));
        timer.begin(1, plan(2, 4));
        timer.tick(Duration::from_secs(1));
        assert_eq!(timer.segment_secs_left(), 0);

        timer.begin(1, plan(2, 4));
        assert_eq!(timer.segment_secs_left(), 2);
        assert_eq!(timer.total_secs_left(), 2);
    }
}
