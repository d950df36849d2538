use binaural_render_core::models::scene::{
    ListenerPlacement, PassSource, Position, RoomSnapshot, SourceSnapshot,
};
use binaural_render_core::traits::randomness::uniform;
use binaural_render_core::traits::scene::RenderScene;

/// Ranges parameters are drawn from at each segment start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRanges {
    pub volume: (f32, f32),
    pub direct_mix: (f32, f32),
    pub reflection_mix: (f32, f32),
    pub near_field_reflection_mix: (f32, f32),
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self {
            volume: (0.1, 0.2),
            direct_mix: (0.9, 1.0),
            reflection_mix: (0.1, 0.3),
            near_field_reflection_mix: (0.001, 0.002),
        }
    }
}

/// One sound source in the in-memory scene.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSource {
    pub name: String,
    pub clip_name: String,
    pub position: Position,
    pub playing: bool,
    pub volume: f32,
    pub direct_mix_level: f32,
    pub reflection_mix_level: f32,
    pub real_time_bounces: u32,
    pub hrtf_on_reflections: bool,
    pub distance_attenuation: bool,
    pub air_absorption: bool,
}

impl HeadlessSource {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            clip_name: "sweep_48kHz".into(),
            position,
            playing: false,
            volume: 0.15,
            direct_mix_level: 1.0,
            reflection_mix_level: 0.2,
            real_time_bounces: 4,
            hrtf_on_reflections: true,
            distance_attenuation: true,
            air_absorption: true,
        }
    }

    fn snapshot(&self, listener: &Position) -> SourceSnapshot {
        let (distance, azimuth, elevation) = geometry(listener, &self.position);
        SourceSnapshot {
            name: self.name.clone(),
            clip_name: self.clip_name.clone(),
            distance_to_listener: distance,
            azimuth_deg: azimuth,
            elevation_deg: elevation,
            real_time_bounces: self.real_time_bounces,
            volume: self.volume,
            direct_mix_level: self.direct_mix_level,
            reflection_mix_level: self.reflection_mix_level,
            hrtf_on_reflections: self.hrtf_on_reflections,
            distance_attenuation: self.distance_attenuation,
            air_absorption: self.air_absorption,
        }
    }
}

/// Horizontal distance, azimuth and elevation (degrees in [0, 360)).
fn geometry(listener: &Position, source: &Position) -> (f32, f32, f32) {
    let dx = source.x - listener.x;
    let dy = source.y - listener.y;
    let dz = source.z - listener.z;
    let horizontal = (dx * dx + dz * dz).sqrt();
    let azimuth = dx.atan2(dz).to_degrees().rem_euclid(360.0);
    let elevation = dy.atan2(horizontal).to_degrees().rem_euclid(360.0);
    (horizontal, azimuth, elevation)
}

/// An engine-free `RenderScene`: speakers, a near-field source and a listener.
#[derive(Debug, Clone)]
pub struct HeadlessScene {
    speakers: Vec<HeadlessSource>,
    near_field: HeadlessSource,
    listener: Position,
    default_listener: Position,
    room: RoomSnapshot,
    ranges: ParameterRanges,
}

impl HeadlessScene {
    pub fn new(speakers: Vec<HeadlessSource>, near_field: HeadlessSource, listener: Position) -> Self {
        Self {
            speakers,
            near_field,
            listener,
            default_listener: listener,
            room: RoomSnapshot::default(),
            ranges: ParameterRanges::default(),
        }
    }

    /// `count` speakers named `speaker1..` on a circle of radius 2 around
    /// the listener, plus a near-field source 10 cm to its right.
    pub fn ring(count: usize) -> Self {
        let listener = Position::new(0.0, 1.5, 0.0);
        let speakers = (0..count)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / count.max(1) as f32;
                HeadlessSource::new(
                    format!("speaker{}", i + 1),
                    Position::new(2.0 * angle.sin(), 1.5, 2.0 * angle.cos()),
                )
            })
            .collect();
        let near_field = HeadlessSource::new("nearField", Position::new(0.1, 1.5, 0.0));
        Self::new(speakers, near_field, listener)
    }

    pub fn with_room(mut self, room: RoomSnapshot) -> Self {
        self.room = room;
        self
    }

    pub fn with_ranges(mut self, ranges: ParameterRanges) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn listener(&self) -> Position {
        self.listener
    }

    pub fn speakers(&self) -> &[HeadlessSource] {
        &self.speakers
    }

    pub fn near_field(&self) -> &HeadlessSource {
        &self.near_field
    }

    /// Names of the sources currently playing.
    pub fn playing(&self) -> Vec<&str> {
        self.speakers
            .iter()
            .chain(std::iter::once(&self.near_field))
            .filter(|s| s.playing)
            .map(|s| s.name.as_str())
            .collect()
    }
}

impl RenderScene for HeadlessScene {
    fn speaker_names(&self) -> Vec<String> {
        self.speakers.iter().map(|s| s.name.clone()).collect()
    }

    fn play_speaker(&mut self, name: &str) {
        match self.speakers.iter_mut().find(|s| s.name == name) {
            Some(speaker) => speaker.playing = true,
            None => log::warn!("no speaker named {}", name),
        }
    }

    fn play_all(&mut self) {
        for speaker in &mut self.speakers {
            speaker.playing = true;
        }
    }

    fn play_near_field(&mut self) {
        self.near_field.playing = true;
    }

    fn stop_sources(&mut self) {
        for speaker in &mut self.speakers {
            speaker.playing = false;
        }
        self.near_field.playing = false;
    }

    fn relocate_listener(&mut self, placement: ListenerPlacement) {
        self.listener = match placement {
            ListenerPlacement::Default => self.default_listener,
            ListenerPlacement::At(position) => position,
        };
    }

    fn randomise_source_parameters(&mut self, near_field: bool) {
        let r = self.ranges;
        if near_field {
            self.near_field.volume = uniform(r.volume.0, r.volume.1);
            self.near_field.direct_mix_level = uniform(r.direct_mix.0, r.direct_mix.1);
            self.near_field.reflection_mix_level =
                uniform(r.near_field_reflection_mix.0, r.near_field_reflection_mix.1);
        } else {
            for speaker in &mut self.speakers {
                speaker.volume = uniform(r.volume.0, r.volume.1);
                speaker.direct_mix_level = uniform(r.direct_mix.0, r.direct_mix.1);
                speaker.reflection_mix_level = uniform(r.reflection_mix.0, r.reflection_mix.1);
            }
        }
    }

    fn source_snapshots(&self, source: &PassSource) -> Vec<SourceSnapshot> {
        match source {
            PassSource::Speaker(name) => self
                .speakers
                .iter()
                .filter(|s| &s.name == name)
                .map(|s| s.snapshot(&self.listener))
                .collect(),
            PassSource::AllSpeakers => self.speakers.iter().map(|s| s.snapshot(&self.listener)).collect(),
            PassSource::NearField => vec![self.near_field.snapshot(&self.listener)],
        }
    }

    fn room_snapshot(&self) -> RoomSnapshot {
        self.room.clone()
    }
}
