use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::models::config::RenderConfiguration;
use crate::models::error::RenderError;
use crate::models::render_pass::{CaptureMetadata, CompletedPass, RenderPass};
use crate::models::scene::{ListenerPlacement, PassSource};
use crate::models::state::{RenderCursor, RenderMethod, RenderPhase, SequencerState};
use crate::session::capture::{CaptureDiagnostics, CaptureSession, CaptureSink, CaptureTarget};
use crate::session::strategy::{self, SequenceBounds, Transition};
use crate::session::timer::{ProgressPlan, RenderTimer, TimerCompleted};
use crate::storage::layout::{OutputLayout, LOG_FILE_NAME};
use crate::storage::metadata;
use crate::storage::render_log::{LogTitle, RenderLog};
use crate::traits::hrtf_bank::HrtfBank;
use crate::traits::observer::RenderObserver;
use crate::traits::randomness::{RenderRandomness, ThreadRandomness};
use crate::traits::scene::RenderScene;

/// Read-only projection of the sequencer and timer for a UI layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProgress {
    pub is_rendering: bool,
    pub is_timing: bool,
    pub method: RenderMethod,
    /// Live cursor while rendering, the last one after a sequence ends.
    pub cursor: Option<RenderCursor>,
    pub active_hrtf: Option<String>,
    pub current_secs_left: u32,
    pub segment_secs_left: u32,
    pub total_secs_left: u32,
    /// Fraction of the sequence's planned time already elapsed.
    pub progress: f32,
    /// Segments (rooms, near-field phase) not yet finished.
    pub renders_left: usize,
    pub passes_completed: usize,
}

/// Orchestrates render passes for the selected `RenderMethod`.
///
/// Generic over the scene and HRTF bank via `RenderScene` / `HrtfBank`.
/// Owns the capture session and the timer; only this type mutates the
/// cursor.
///
/// ```text
/// setup_render ─▶ start_render ─▶ [pass] ─tick─▶ completion ─▶ transition
///                                    ▲                            │
///                                    └── next speaker/HRTF/room ◀─┘
/// ```
///
/// Capture, log and metadata failures are logged and reported to observers.
/// The sequence keeps going and the pass is recorded without a capture.
pub struct RenderSequencer<S: RenderScene, B: HrtfBank> {
    scene: S,
    bank: B,
    config: RenderConfiguration,
    method: RenderMethod,
    state: SequencerState,
    last_cursor: Option<RenderCursor>,
    capture: CaptureSession,
    timer: RenderTimer,
    completions: Receiver<TimerCompleted>,
    layout: OutputLayout,
    randomness: Box<dyn RenderRandomness + Send>,
    observers: Vec<Arc<dyn RenderObserver>>,

    // Fixed at setup
    speakers: Vec<String>,
    bounds: SequenceBounds,
    far_indices: Vec<usize>,
    user_indices: Vec<usize>,
    sequence_id: String,

    current_pass: Option<RenderPass>,
    completed: Vec<CompletedPass>,
    captured_paths: HashSet<PathBuf>,
}

impl<S: RenderScene, B: HrtfBank> RenderSequencer<S, B> {
    pub fn new(scene: S, bank: B, config: RenderConfiguration) -> Result<Self, RenderError> {
        config.validate().map_err(RenderError::ConfigurationFailed)?;

        let mut timer = RenderTimer::new();
        let completions = timer
            .subscribe()
            .ok_or_else(|| RenderError::InvalidState("timer completions already subscribed".into()))?;

        Ok(Self {
            scene,
            bank,
            method: config.render_method,
            state: SequencerState::Idle,
            last_cursor: None,
            capture: CaptureSession::new(config.sample_rate, config.clip_policy),
            timer,
            completions,
            layout: OutputLayout::new(config.output_root.clone()),
            randomness: Box::new(ThreadRandomness),
            observers: Vec::new(),
            speakers: Vec::new(),
            bounds: SequenceBounds::default(),
            far_indices: Vec::new(),
            user_indices: Vec::new(),
            sequence_id: String::new(),
            current_pass: None,
            completed: Vec::new(),
            captured_paths: HashSet::new(),
            config,
        })
    }

    /// Replace the random source for listener placement and user choice.
    pub fn with_randomness<R: RenderRandomness + Send + 'static>(mut self, randomness: R) -> Self {
        self.randomness = Box::new(randomness);
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn RenderObserver>) {
        if !self.observers.iter().any(|o| same_observer(o, &observer)) {
            self.observers.push(observer);
        }
    }

    pub fn remove_observer(&mut self, observer: &Arc<dyn RenderObserver>) {
        self.observers.retain(|o| !same_observer(o, observer));
    }

    /// Select the strategy used by the next `setup_render`.
    pub fn set_render_method(&mut self, method: RenderMethod) -> Result<(), RenderError> {
        if self.state.is_rendering() {
            return Err(RenderError::InvalidState(
                "cannot change render method while rendering".into(),
            ));
        }
        log::info!("render method set to {}", method.name());
        self.method = method;
        self.config.render_method = method;
        Ok(())
    }

    /// Prepare a fresh sequence. Transitions: idle → rendering.
    pub fn setup_render(&mut self) -> Result<(), RenderError> {
        if self.state.is_rendering() {
            return Err(RenderError::InvalidState("a sequence is already rendering".into()));
        }

        let mut speakers = self.scene.speaker_names();
        speakers.sort();
        let far_indices = self.bank.far_field_indices();
        let hrtfs = far_indices.len();
        let rooms = self.config.room_count.unwrap_or(speakers.len());

        match self.method {
            RenderMethod::OneByOne { hrtf_index } => {
                if speakers.is_empty() {
                    return Err(RenderError::ConfigurationFailed("scene has no speakers".into()));
                }
                if hrtf_index >= self.bank.count() {
                    return Err(RenderError::ConfigurationFailed(format!(
                        "HRTF index {} out of range ({} configurations)",
                        hrtf_index,
                        self.bank.count()
                    )));
                }
            }
            RenderMethod::AllAtOnce | RenderMethod::RenderRooms | RenderMethod::FullRender => {
                if hrtfs == 0 {
                    return Err(RenderError::ConfigurationFailed(
                        "HRTF bank has no far-field configurations".into(),
                    ));
                }
                if self.method != RenderMethod::AllAtOnce && rooms == 0 {
                    return Err(RenderError::ConfigurationFailed("no rooms to render".into()));
                }
            }
            RenderMethod::RenderUser => {}
        }

        self.bounds = SequenceBounds {
            speakers: speakers.len(),
            hrtfs,
            rooms,
            near_field_passes: self.config.near_field_passes,
        };
        self.speakers = speakers;
        self.far_indices = far_indices;
        self.user_indices.clear();
        self.completed.clear();
        self.captured_paths.clear();
        self.current_pass = None;
        self.last_cursor = None;
        self.sequence_id = uuid::Uuid::new_v4().to_string();
        self.timer.reset_progress();
        self.discard_completions();

        if let Err(e) = self.layout.allocate_sequence_root() {
            self.report(&e);
        }

        self.state = SequencerState::Rendering {
            method: self.method,
            cursor: RenderCursor::new(self.method),
        };
        log::info!(
            "sequence {} set up: {} ({} speakers, {} far-field HRTFs, {} rooms, {} passes planned)",
            self.sequence_id,
            self.method.name(),
            self.bounds.speakers,
            self.bounds.hrtfs,
            self.bounds.rooms,
            strategy::total_passes(self.method, &self.bounds)
        );
        Ok(())
    }

    /// Start the first pass of the prepared sequence.
    pub fn start_render(&mut self) -> Result<(), RenderError> {
        let cursor = self
            .cursor()
            .ok_or_else(|| RenderError::InvalidState("setup_render must run before start_render".into()))?;
        if self.current_pass.is_some() {
            log::warn!("start_render called while a pass is running, ignored");
            return Ok(());
        }

        self.capture.set_rendering(true);
        self.start_segment(cursor);
        Ok(())
    }

    /// Finish the current pass and start the next one in the same segment.
    ///
    /// Fails when the current pass is the last of its segment; those
    /// boundaries are only crossed by a timer completion.
    pub fn continue_render(&mut self) -> Result<(), RenderError> {
        let cursor = self
            .cursor()
            .ok_or_else(|| RenderError::InvalidState("not rendering".into()))?;
        if self.current_pass.is_none() {
            return Err(RenderError::InvalidState("no pass is running".into()));
        }

        let transition = strategy::next_transition(self.method, &cursor, &self.bounds);
        if transition.ends_segment() {
            return Err(RenderError::InvalidState(
                "current pass is the last of its segment".into(),
            ));
        }
        self.apply_transition(transition);
        Ok(())
    }

    /// Abort the sequence. Transitions: rendering → idle.
    ///
    /// The in-flight capture is finalized and the timer cancelled. Observers
    /// are not told the render completed.
    pub fn stop_render(&mut self) {
        if !self.state.is_rendering() {
            log::debug!("stop_render while idle, nothing to do");
            return;
        }

        self.end_segment();
        self.capture.set_rendering(false);
        self.timer.reset_progress();
        self.last_cursor = self.cursor();
        self.state = SequencerState::Idle;
        log::info!(
            "sequence {} stopped after {} passes",
            self.sequence_id,
            self.completed.len()
        );
    }

    /// Stop if rendering, otherwise set up and start a new sequence.
    pub fn toggle_render(&mut self) -> Result<(), RenderError> {
        if self.state.is_rendering() {
            self.stop_render();
            Ok(())
        } else {
            self.setup_render()?;
            self.start_render()
        }
    }

    /// Advance the timer and handle any completion it produced.
    ///
    /// Returns the number of completions handled.
    pub fn tick(&mut self, elapsed: Duration) -> usize {
        self.timer.tick(elapsed);

        let mut handled = 0;
        while let Ok(completed) = self.completions.try_recv() {
            if !self.timer.is_current(&completed) || !self.state.is_rendering() {
                log::debug!("discarding stale timer completion {}", completed.generation);
                continue;
            }
            self.handle_completion();
            handled += 1;
        }
        handled
    }

    /// Forward host audio to the capture session.
    pub fn transmit_data(&self, samples: &[f32], channels: u16) {
        self.capture.transmit_data(samples, channels);
    }

    /// Handle for the host audio thread.
    pub fn capture_sink(&self) -> CaptureSink {
        self.capture.sink()
    }

    pub fn progress(&self) -> RenderProgress {
        let live = self.state.cursor();
        RenderProgress {
            is_rendering: self.state.is_rendering(),
            is_timing: self.timer.is_active(),
            method: self.method,
            cursor: live.copied().or(self.last_cursor),
            active_hrtf: self.current_pass.as_ref().and_then(|_| self.bank.active_name()),
            current_secs_left: self.timer.current_secs_left(),
            segment_secs_left: self.timer.segment_secs_left(),
            total_secs_left: self.timer.total_secs_left(),
            progress: self.timer.progress(),
            renders_left: live
                .map(|c| strategy::segments_left(self.method, c, &self.bounds))
                .unwrap_or(0),
            passes_completed: self.completed.len(),
        }
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn is_rendering(&self) -> bool {
        self.state.is_rendering()
    }

    pub fn is_timing(&self) -> bool {
        self.timer.is_active()
    }

    pub fn method(&self) -> RenderMethod {
        self.method
    }

    pub fn config(&self) -> &RenderConfiguration {
        &self.config
    }

    pub fn bounds(&self) -> &SequenceBounds {
        &self.bounds
    }

    pub fn current_pass(&self) -> Option<&RenderPass> {
        self.current_pass.as_ref()
    }

    /// Passes finished in the current (or last) sequence, in order.
    pub fn completed_passes(&self) -> &[CompletedPass] {
        &self.completed
    }

    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }

    pub fn sequence_root(&self) -> Option<&Path> {
        self.layout.sequence_root()
    }

    pub fn capture_diagnostics(&self) -> CaptureDiagnostics {
        self.capture.diagnostics()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    // --- Internal helpers ---

    fn cursor(&self) -> Option<RenderCursor> {
        self.state.cursor().copied()
    }

    fn set_cursor(&mut self, updated: RenderCursor) {
        if let SequencerState::Rendering { cursor, .. } = &mut self.state {
            *cursor = updated;
        }
    }

    fn discard_completions(&self) {
        while self.completions.try_recv().is_ok() {}
    }

    fn handle_completion(&mut self) {
        let Some(cursor) = self.cursor() else {
            return;
        };
        let transition = strategy::next_transition(self.method, &cursor, &self.bounds);
        log::debug!("pass {} complete: {:?}", cursor.passes_completed, transition);
        self.apply_transition(transition);

        let progress = self.progress();
        for observer in &self.observers {
            observer.on_notify(&progress);
        }
    }

    fn apply_transition(&mut self, transition: Transition) {
        let Some(mut cursor) = self.cursor() else {
            return;
        };

        match transition {
            Transition::NextSpeaker | Transition::NextHrtf | Transition::NextUserPass => {
                match transition {
                    Transition::NextSpeaker => cursor.speaker += 1,
                    Transition::NextHrtf => cursor.hrtf += 1,
                    _ => cursor.user_pass += 1,
                }
                self.set_cursor(cursor);
                self.finalize_pass();
                if let Some(cursor) = self.cursor() {
                    self.begin_pass(cursor);
                }
            }
            Transition::NextRoom | Transition::EnterUserPhase => {
                self.end_segment();
                let Some(mut cursor) = self.cursor() else {
                    return;
                };
                if transition == Transition::NextRoom {
                    cursor.room += 1;
                } else {
                    cursor.phase = RenderPhase::User;
                }
                cursor.hrtf = 0;
                self.set_cursor(cursor);
                self.start_segment(cursor);
            }
            Transition::Finish => {
                self.end_segment();
                self.finish();
            }
        }
    }

    /// Begin a room, the near-field phase, or a flat method's only segment.
    fn start_segment(&mut self, mut cursor: RenderCursor) {
        if cursor.phase.is_near_field() && cursor.user_config.is_none() {
            let user = self.randomness.user_config(self.config.user_config_pairs);
            let indices: Vec<usize> = self
                .bank
                .user_config_indices(user)
                .into_iter()
                .take(self.config.near_field_passes)
                .collect();
            cursor.user_config = Some(user);
            self.set_cursor(cursor);

            if indices.is_empty() {
                log::warn!("no HRTF configurations for user {}, skipping near-field phase", user);
                self.finish();
                return;
            }
            log::info!("near-field phase uses user {} ({} configurations)", user, indices.len());
            self.bounds.near_field_passes = indices.len();
            self.user_indices = indices;
        }

        let position = self.randomness.listener_position(&self.config.listener_bounds);
        self.scene.relocate_listener(ListenerPlacement::At(position));
        self.scene.randomise_source_parameters(cursor.phase.is_near_field());
        self.timer.reset_segment();

        let directory = self.segment_dir(&cursor);
        let room = self.scene.room_snapshot();
        let title = LogTitle {
            sequence_id: &self.sequence_id,
            room: &room,
            sample_rate: self.config.sample_rate,
        };
        if let Err(e) = RenderLog::new(directory.join(LOG_FILE_NAME)).write_title(&title) {
            self.report(&e);
        }

        log::info!("segment {:?} started in {}", cursor.phase, directory.display());
        self.begin_pass(cursor);
    }

    /// Play the pass at `cursor`, open its capture and start the countdown.
    fn begin_pass(&mut self, cursor: RenderCursor) {
        let Some(pass) = self.build_pass(&cursor) else {
            log::error!("cursor {:?} is outside the sequence, finishing", cursor);
            self.finish();
            return;
        };

        self.bank.set_active(pass.hrtf_index);
        match &pass.source {
            PassSource::Speaker(name) => self.scene.play_speaker(name),
            PassSource::AllSpeakers => self.scene.play_all(),
            PassSource::NearField => self.scene.play_near_field(),
        }

        let target = CaptureTarget {
            directory: pass.directory.clone(),
            identifier: pass.configuration.clone(),
            near_field: pass.phase.is_near_field(),
        };
        let path = target.path();
        self.capture.set_target(target);
        // Two configurations can reduce to the same file name; keep the first.
        if !self.captured_paths.insert(path.clone()) {
            self.report(&RenderError::StorageError(format!(
                "{} was already captured in this sequence, pass {} ({}) not recorded",
                path.display(),
                pass.ordinal,
                pass.configuration
            )));
        } else if let Err(e) = self.capture.start_recording() {
            self.report(&e);
        }

        let plan = ProgressPlan {
            passes_per_segment: strategy::passes_per_segment(cursor.phase, &self.bounds),
            total_passes: strategy::total_passes(self.method, &self.bounds),
        };
        self.timer.begin(self.config.pass_duration_secs, plan);

        log::info!(
            "pass {} started: {} ({})",
            pass.ordinal,
            pass.configuration,
            pass.hrtf_name.as_deref().unwrap_or("no HRTF name")
        );
        for observer in &self.observers {
            observer.on_pass_started(&pass);
        }
        self.current_pass = Some(pass);
    }

    fn build_pass(&self, cursor: &RenderCursor) -> Option<RenderPass> {
        let (source, hrtf_index, configuration) = match cursor.phase {
            RenderPhase::Speakers => {
                let name = self.speakers.get(cursor.speaker)?.clone();
                let hrtf_index = match self.method {
                    RenderMethod::OneByOne { hrtf_index } => hrtf_index,
                    _ => 0,
                };
                (PassSource::Speaker(name), hrtf_index, format!("{:02}", cursor.speaker))
            }
            RenderPhase::Hrtfs | RenderPhase::Rooms => {
                let index = *self.far_indices.get(cursor.hrtf)?;
                (PassSource::AllSpeakers, index, self.hrtf_identifier(index))
            }
            RenderPhase::User => {
                let index = *self.user_indices.get(cursor.user_pass)?;
                (PassSource::NearField, index, self.hrtf_identifier(index))
            }
        };

        Some(RenderPass {
            ordinal: cursor.passes_completed,
            phase: cursor.phase,
            source,
            hrtf_index,
            hrtf_name: self.bank.name(hrtf_index),
            room_index: cursor.room,
            duration_secs: self.config.pass_duration_secs,
            configuration,
            directory: self.segment_dir(cursor),
        })
    }

    fn hrtf_identifier(&self, index: usize) -> String {
        self.bank.name(index).unwrap_or_else(|| format!("{:02}", index))
    }

    fn segment_dir(&self, cursor: &RenderCursor) -> PathBuf {
        match cursor.phase {
            RenderPhase::Speakers | RenderPhase::Hrtfs => self.layout.root_dir(),
            RenderPhase::Rooms => self.layout.room_dir(cursor.room),
            RenderPhase::User => self.layout.user_dir(cursor.user_config.unwrap_or(0)),
        }
    }

    /// Close the running pass: finalize its capture, log it, write metadata.
    fn finalize_pass(&mut self) {
        let Some(pass) = self.current_pass.take() else {
            return;
        };

        let capture = match self.capture.stop_recording() {
            Ok(capture) => capture,
            Err(e) => {
                self.report(&e);
                None
            }
        };
        if capture.is_none() {
            log::warn!("pass {} ({}) produced no capture", pass.ordinal, pass.configuration);
        }

        let sources = self.scene.source_snapshots(&pass.source);
        let render_log = RenderLog::new(pass.directory.join(LOG_FILE_NAME));
        if let Err(e) = render_log.append_pass(&pass, &sources, capture.as_ref()) {
            self.report(&e);
        }

        if self.config.write_metadata {
            if let Some(file) = &capture {
                let meta = CaptureMetadata::new(&self.sequence_id, self.method, &pass, file);
                if let Err(e) = metadata::write_metadata(&meta, &file.path) {
                    self.report(&e);
                }
            }
        }

        if let Some(mut cursor) = self.cursor() {
            cursor.passes_completed += 1;
            self.set_cursor(cursor);
        }
        self.completed.push(CompletedPass { pass, capture });
    }

    /// Close the segment: cancel the timer, finalize, silence and reset the scene.
    fn end_segment(&mut self) {
        if let Err(e) = self.timer.stop() {
            log::debug!("timer stop at segment end: {}", e);
        }
        self.finalize_pass();
        self.scene.stop_sources();
        self.scene.relocate_listener(ListenerPlacement::Default);
        self.bank.set_active(0);
    }

    fn finish(&mut self) {
        self.capture.set_rendering(false);
        self.timer.reset_progress();
        self.last_cursor = self.cursor();
        self.state = SequencerState::Idle;

        let missing = self.completed.iter().filter(|c| c.capture.is_none()).count();
        log::info!(
            "sequence {} complete: {} passes, {} without capture",
            self.sequence_id,
            self.completed.len(),
            missing
        );
        for observer in &self.observers {
            observer.on_render_complete(&self.completed);
        }
    }

    fn report(&self, error: &RenderError) {
        log::error!("render sequence {}: {}", self.sequence_id, error);
        for observer in &self.observers {
            observer.on_error(error);
        }
    }
}

fn same_observer(a: &Arc<dyn RenderObserver>, b: &Arc<dyn RenderObserver>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
