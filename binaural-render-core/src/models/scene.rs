use serde::{Deserialize, Serialize};

/// A point in scene space (engine units).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Axis-aligned box the listener may be relocated into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListenerBounds {
    pub lower: Position,
    pub upper: Position,
}

impl ListenerBounds {
    pub fn contains(&self, p: &Position) -> bool {
        (self.lower.x..=self.upper.x).contains(&p.x)
            && (self.lower.y..=self.upper.y).contains(&p.y)
            && (self.lower.z..=self.upper.z).contains(&p.z)
    }

    pub fn is_valid(&self) -> bool {
        self.lower.x <= self.upper.x && self.lower.y <= self.upper.y && self.lower.z <= self.upper.z
    }
}

impl Default for ListenerBounds {
    fn default() -> Self {
        Self {
            lower: Position::new(-4.0, 1.2, -3.0),
            upper: Position::new(4.0, 1.8, 3.0),
        }
    }
}

/// Where the listener should be placed at a segment boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListenerPlacement {
    /// The position the listener had when the scene was loaded.
    Default,
    At(Position),
}

/// Which sources a pass plays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassSource {
    Speaker(String),
    AllSpeakers,
    NearField,
}

/// Read-only view of one source, recorded in the render log after each pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub name: String,
    pub clip_name: String,
    pub distance_to_listener: f32,
    pub azimuth_deg: f32,
    pub elevation_deg: f32,
    pub real_time_bounces: u32,
    pub volume: f32,
    pub direct_mix_level: f32,
    pub reflection_mix_level: f32,
    pub hrtf_on_reflections: bool,
    pub distance_attenuation: bool,
    pub air_absorption: bool,
}

/// Room name and material coefficients, written in the render log title block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub name: String,
    pub low_freq_absorption: f32,
    pub mid_freq_absorption: f32,
    pub high_freq_absorption: f32,
    pub scattering: f32,
}

impl Default for RoomSnapshot {
    fn default() -> Self {
        Self {
            name: "room1".into(),
            low_freq_absorption: 0.1,
            mid_freq_absorption: 0.2,
            high_freq_absorption: 0.3,
            scattering: 0.05,
        }
    }
}
