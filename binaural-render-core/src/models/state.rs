use serde::{Deserialize, Serialize};

/// Strategy selecting how passes are generated and sequenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMethod {
    /// Each speaker alone, in name order, under one fixed HRTF.
    OneByOne { hrtf_index: usize },
    /// All speakers together, once per HRTF.
    AllAtOnce,
    /// All speakers together per room layout, cycling every HRTF in each room.
    RenderRooms,
    /// Near-field source under the HRTFs of one randomly chosen user configuration.
    RenderUser,
    /// `RenderRooms` followed by `RenderUser`.
    FullRender,
}

impl RenderMethod {
    /// Phase a fresh sequence starts in.
    pub fn initial_phase(&self) -> RenderPhase {
        match self {
            Self::OneByOne { .. } => RenderPhase::Speakers,
            Self::AllAtOnce => RenderPhase::Hrtfs,
            Self::RenderRooms | Self::FullRender => RenderPhase::Rooms,
            Self::RenderUser => RenderPhase::User,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OneByOne { .. } => "one_by_one",
            Self::AllAtOnce => "all_at_once",
            Self::RenderRooms => "render_rooms",
            Self::RenderUser => "render_user",
            Self::FullRender => "full_render",
        }
    }
}

/// Sub-phase of a running sequence. `FullRender` moves from `Rooms` to `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPhase {
    Speakers,
    Hrtfs,
    Rooms,
    User,
}

impl RenderPhase {
    pub fn is_near_field(&self) -> bool {
        matches!(self, Self::User)
    }
}

/// Position of the sequencer within a sequence.
///
/// Indices only grow within one sequence, except `hrtf` which returns to
/// zero when a room finishes. A fresh `setup_render` resets everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderCursor {
    pub phase: RenderPhase,
    pub speaker: usize,
    pub hrtf: usize,
    pub room: usize,
    pub user_pass: usize,
    /// User configuration chosen once per sequence when the near-field phase starts.
    pub user_config: Option<usize>,
    /// Passes completed so far in this sequence.
    pub passes_completed: usize,
}

impl RenderCursor {
    pub fn new(method: RenderMethod) -> Self {
        Self {
            phase: method.initial_phase(),
            speaker: 0,
            hrtf: 0,
            room: 0,
            user_pass: 0,
            user_config: None,
            passes_completed: 0,
        }
    }
}

/// Render sequencer state machine.
///
/// State transitions:
/// ```text
/// idle ──setup_render──▶ rendering ──(timer completion)*──▶ idle
///   ▲                        │
///   └──── manual stop ◀──────┘
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerState {
    Idle,
    Rendering {
        method: RenderMethod,
        cursor: RenderCursor,
    },
}

impl SequencerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_rendering(&self) -> bool {
        matches!(self, Self::Rendering { .. })
    }

    pub fn cursor(&self) -> Option<&RenderCursor> {
        match self {
            Self::Rendering { cursor, .. } => Some(cursor),
            Self::Idle => None,
        }
    }
}
