use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use binaural_render_core::processing::pcm;
use binaural_render_core::processing::wav_format::parse_wav_header;
use binaural_render_core::{
    AudioSource, CompletedPass, RenderConfiguration, RenderMethod, RenderObserver, RenderProgress, RenderSequencer,
};
use binaural_render_headless::{HeadlessHost, HeadlessScene, StaticHrtfBank, ToneGenerator};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!("binaural_headless_{}", uuid::Uuid::new_v4()))
}

fn wav_files_under(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(next) = stack.pop() {
        for entry in fs::read_dir(&next).unwrap().filter_map(Result::ok) {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|e| e == "wav") {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

#[derive(Default)]
struct CompletionRecorder {
    notifications: Mutex<usize>,
    completed: Mutex<Option<usize>>,
}

impl RenderObserver for CompletionRecorder {
    fn on_notify(&self, _progress: &RenderProgress) {
        *self.notifications.lock() += 1;
    }

    fn on_render_complete(&self, passes: &[CompletedPass]) {
        *self.completed.lock() = Some(passes.len());
    }
}

fn host(
    root: &Path,
    speakers: usize,
    bank: StaticHrtfBank,
    method: RenderMethod,
) -> HeadlessHost<HeadlessScene, StaticHrtfBank, ToneGenerator> {
    let config = RenderConfiguration {
        output_root: root.to_path_buf(),
        pass_duration_secs: 1,
        render_method: method,
        room_count: Some(2),
        user_config_pairs: 3,
        ..Default::default()
    };
    let sequencer = RenderSequencer::new(HeadlessScene::ring(speakers), bank, config).unwrap();
    HeadlessHost::new(sequencer, ToneGenerator::new(48000).manual().with_block_frames(480))
}

/// Pump one pass worth of audio, then let the pass complete.
fn step_pass(host: &mut HeadlessHost<HeadlessScene, StaticHrtfBank, ToneGenerator>) -> usize {
    host.audio().pump(Duration::from_millis(100));
    host.step(Duration::from_secs(1))
}

#[test]
fn full_render_produces_every_capture() {
    init_logging();
    let root = temp_root();
    let recorder = Arc::new(CompletionRecorder::default());
    let mut host = host(&root, 3, StaticHrtfBank::with_users(3, 3), RenderMethod::FullRender);
    host.sequencer_mut().add_observer(recorder.clone());

    host.start().unwrap();
    let mut passes = 0;
    while host.sequencer().is_rendering() {
        passes += step_pass(&mut host);
        assert!(passes < 100);
    }

    // Two rooms of 3 far-field HRTFs, then 2 near-field passes.
    assert_eq!(passes, 2 * 3 + 2);
    assert_eq!(*recorder.completed.lock(), Some(8));
    assert_eq!(*recorder.notifications.lock(), 8);

    let files = wav_files_under(&root.join("render0"));
    assert_eq!(files.len(), 8);
    for room in ["inroom0", "inroom1"] {
        let mut names: Vec<String> = wav_files_under(&root.join("render0").join(room))
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["mic_00.wav", "mic_01.wav", "mic_02.wav"]);
    }
    for file in &files {
        let bytes = fs::read(file).unwrap();
        let header = parse_wav_header(&bytes).unwrap();
        assert!(header.is_consistent_with(bytes.len() as u64), "{}", file.display());
        assert_eq!(header.sample_rate, 48000);
        // 100 ms of stereo int16
        assert_eq!(header.data_size, 4800 * 4);
    }

    fs::remove_dir_all(&root).ok();
}

#[test]
fn tone_survives_the_round_trip() {
    init_logging();
    let root = temp_root();
    let mut host = host(
        &root,
        1,
        StaticHrtfBank::new(["kemar.sofa"]),
        RenderMethod::OneByOne { hrtf_index: 0 },
    );

    host.start().unwrap();
    step_pass(&mut host);
    assert!(host.sequencer().state().is_idle());

    let capture = host.sequencer().completed_passes()[0].capture.clone().unwrap();
    assert_eq!(capture.path.file_name().unwrap(), "mic_00.wav");
    let bytes = fs::read(&capture.path).unwrap();
    let samples = pcm::decode_i16_le(&bytes[44..]);
    let peak = pcm::peak_level(&samples);
    assert!((peak - 0.5).abs() < 0.01, "peak {}", peak);
    // Left and right carry the same tone.
    assert!(samples.chunks_exact(2).all(|f| f[0] == f[1]));

    fs::remove_dir_all(&root).ok();
}

#[test]
fn stopped_host_captures_nothing_more() {
    init_logging();
    let root = temp_root();
    let mut host = host(&root, 2, StaticHrtfBank::new(["a.sofa", "b.sofa"]), RenderMethod::AllAtOnce);

    host.start().unwrap();
    host.stop().unwrap();
    let after_stop = host.sequencer().capture_diagnostics();
    assert_eq!(after_stop.samples_written, 0);

    // Audio disconnected by stop: nothing more arrives.
    assert_eq!(host.audio().pump(Duration::from_millis(50)), 0);
    assert_eq!(host.sequencer().completed_passes().len(), 1);
    assert_eq!(host.sequencer().completed_passes()[0].capture.as_ref().unwrap().data_bytes, 0);

    fs::remove_dir_all(&root).ok();
}

#[test]
fn realtime_loop_finishes_and_times_out() {
    init_logging();
    let root = temp_root();
    let config = RenderConfiguration {
        output_root: root.clone(),
        pass_duration_secs: 1,
        render_method: RenderMethod::AllAtOnce,
        ..Default::default()
    };
    let sequencer =
        RenderSequencer::new(HeadlessScene::ring(2), StaticHrtfBank::new(["a.sofa"]), config.clone()).unwrap();
    let mut host = HeadlessHost::new(sequencer, ToneGenerator::new(48000).with_block_frames(480));

    host.start().unwrap();
    let took = host
        .run_until_idle(Duration::from_millis(20), Duration::from_secs(10))
        .unwrap();
    assert!(took >= Duration::from_secs(1));
    assert!(!host.audio().is_running());

    let capture = host.sequencer().completed_passes()[0].capture.clone().unwrap();
    assert!(capture.data_bytes > 0);

    let slow = RenderConfiguration {
        pass_duration_secs: 30,
        ..config
    };
    let sequencer = RenderSequencer::new(HeadlessScene::ring(2), StaticHrtfBank::new(["a.sofa"]), slow).unwrap();
    let mut host = HeadlessHost::new(sequencer, ToneGenerator::new(48000).manual());
    host.start().unwrap();
    let result = host.run_until_idle(Duration::from_millis(10), Duration::from_millis(100));
    assert!(result.is_err());
    assert!(host.sequencer().state().is_idle());

    fs::remove_dir_all(&root).ok();
}
