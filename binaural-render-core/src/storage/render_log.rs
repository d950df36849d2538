use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::error::RenderError;
use crate::models::render_pass::{CaptureFile, RenderPass};
use crate::models::scene::{RoomSnapshot, SourceSnapshot};

/// Title block written when a segment directory is first used.
#[derive(Debug, Clone)]
pub struct LogTitle<'a> {
    pub sequence_id: &'a str,
    pub room: &'a RoomSnapshot,
    pub sample_rate: u32,
}

/// Append-only plain-text log consumed alongside the captures.
pub struct RenderLog {
    path: PathBuf,
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl RenderLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<BufWriter<File>, RenderError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RenderError::StorageError(format!("failed to create log directory: {}", e)))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RenderError::StorageError(format!("failed to open {}: {}", self.path.display(), e)))?;
        Ok(BufWriter::new(file))
    }

    pub fn write_title(&self, title: &LogTitle<'_>) -> Result<(), RenderError> {
        let mut w = self.open()?;
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let room = title.room;

        let text = format!(
            "Simulation Log : {timestamp}\n\
             // --------------------\n\
             Sequence : {}\n\
             Room name : {}\n\
             \n\
             Low Freq. Absorption : {}\n\
             Mid Freq. Absorption : {}\n\
             High Freq. Absorption : {}\n\
             Scattering : {}\n\
             \n\
             Sample rate : {} Hz\n",
            title.sequence_id,
            room.name,
            room.low_freq_absorption,
            room.mid_freq_absorption,
            room.high_freq_absorption,
            room.scattering,
            title.sample_rate,
        );
        w.write_all(text.as_bytes())
            .and_then(|_| w.flush())
            .map_err(|e| RenderError::StorageError(format!("failed to write log title: {}", e)))
    }

    /// One entry per completed pass, one block per source that played.
    pub fn append_pass(
        &self,
        pass: &RenderPass,
        sources: &[SourceSnapshot],
        capture: Option<&CaptureFile>,
    ) -> Result<(), RenderError> {
        let mut w = self.open()?;
        let mut text = String::new();

        text.push_str(&format!(
            "\nPass : {}\n    HRTF : {}\n    Capture : {}\n",
            pass.ordinal,
            pass.hrtf_name.as_deref().unwrap_or("-"),
            capture
                .map(|c| c.path.display().to_string())
                .unwrap_or_else(|| "missing".into()),
        ));

        for source in sources {
            text.push_str(&format!(
                "\nName : {}\n\
                 \x20       Audio Clip : {}\n\
                 \x20   Geometry : \n\
                 \x20       Distance To Receiver : {} units\n\
                 \x20       Azimuth angle : {}\n\
                 \x20       Elevation angle : {}\n\
                 \n\
                 \x20   Parameters : \n\
                 \x20       Real Time Bounces : {}\n\
                 \x20       Volume: {}\n\
                 \x20       Direct Mix Level : {}\n\
                 \x20       Reflection Mix Level : {}\n\
                 \x20       HRTF Applied To Reflections? : {}\n\
                 \x20       Distance Attenuation Applied : {}\n\
                 \x20       Air Absorption Applied : {}\n",
                source.name,
                source.clip_name,
                source.distance_to_listener,
                source.azimuth_deg,
                source.elevation_deg,
                source.real_time_bounces,
                source.volume,
                source.direct_mix_level,
                source.reflection_mix_level,
                yes_no(source.hrtf_on_reflections),
                yes_no(source.distance_attenuation),
                yes_no(source.air_absorption),
            ));
        }
        text.push('\n');

        w.write_all(text.as_bytes())
            .and_then(|_| w.flush())
            .map_err(|e| RenderError::StorageError(format!("failed to append pass: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scene::PassSource;
    use crate::models::state::RenderPhase;

    fn pass() -> RenderPass {
        RenderPass {
            ordinal: 4,
            phase: RenderPhase::Rooms,
            source: PassSource::AllSpeakers,
            hrtf_index: 2,
            hrtf_name: Some("mic_12.sofa".into()),
            room_index: 1,
            duration_secs: 6,
            configuration: "mic_12.sofa".into(),
            directory: PathBuf::from("inroom1"),
        }
    }

    fn source(name: &str) -> SourceSnapshot {
        SourceSnapshot {
            name: name.into(),
            clip_name: "sweep_48kHz".into(),
            distance_to_listener: 2.5,
            azimuth_deg: 90.0,
            elevation_deg: 0.0,
            real_time_bounces: 4,
            volume: 0.15,
            direct_mix_level: 0.95,
            reflection_mix_level: 0.2,
            hrtf_on_reflections: true,
            distance_attenuation: false,
            air_absorption: true,
        }
    }

    #[test]
    fn title_then_entries_are_appended() {
        let dir = std::env::temp_dir().join(format!("binaural_log_{}", uuid::Uuid::new_v4()));
        let log = RenderLog::new(dir.join("log.txt"));

        log.write_title(&LogTitle {
            sequence_id: "seq-1",
            room: &RoomSnapshot::default(),
            sample_rate: 48000,
        })
        .unwrap();
        log.append_pass(&pass(), &[source("speaker1"), source("speaker2")], None)
            .unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        assert!(text.starts_with("Simulation Log : "));
        assert!(text.contains("Room name : room1"));
        assert!(text.contains("Sample rate : 48000 Hz"));
        assert!(text.contains("Pass : 4"));
        assert!(text.contains("HRTF : mic_12.sofa"));
        assert!(text.contains("Capture : missing"));
        assert_eq!(text.matches("Audio Clip : sweep_48kHz").count(), 2);
        assert!(text.contains("HRTF Applied To Reflections? : yes"));
        assert!(text.contains("Distance Attenuation Applied : no"));

        fs::remove_dir_all(&dir).ok();
    }
}
