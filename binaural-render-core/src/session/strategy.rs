//! Transition table of the render sequencer.
//!
//! Pure functions over a cursor snapshot. The sequencer applies the returned
//! transition; nothing here touches the scene, the bank or the filesystem.

use crate::models::state::{RenderCursor, RenderMethod, RenderPhase};

/// Sizes the sequence walks over, fixed at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceBounds {
    pub speakers: usize,
    /// Far-field profiles only; user profiles are counted by `near_field_passes`.
    pub hrtfs: usize,
    pub rooms: usize,
    pub near_field_passes: usize,
}

/// What happens when the current pass's countdown completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same segment, next speaker.
    NextSpeaker,
    /// Same segment, next HRTF.
    NextHrtf,
    /// Close the room, relocate the listener, start the next room.
    NextRoom,
    /// Close the last room and switch to the near-field phase.
    EnterUserPhase,
    /// Same segment, next near-field configuration.
    NextUserPass,
    /// Close the last pass and return to idle.
    Finish,
}

impl Transition {
    /// Whether the transition ends the current segment.
    pub fn ends_segment(&self) -> bool {
        matches!(self, Self::NextRoom | Self::EnterUserPhase | Self::Finish)
    }
}

#[inline]
fn is_last(index: usize, count: usize) -> bool {
    index + 1 >= count
}

/// Decide the transition for a completed pass at `cursor`.
pub fn next_transition(method: RenderMethod, cursor: &RenderCursor, bounds: &SequenceBounds) -> Transition {
    match cursor.phase {
        RenderPhase::Speakers => {
            if is_last(cursor.speaker, bounds.speakers) {
                Transition::Finish
            } else {
                Transition::NextSpeaker
            }
        }
        RenderPhase::Hrtfs => {
            if is_last(cursor.hrtf, bounds.hrtfs) {
                Transition::Finish
            } else {
                Transition::NextHrtf
            }
        }
        RenderPhase::Rooms => {
            if !is_last(cursor.hrtf, bounds.hrtfs) {
                Transition::NextHrtf
            } else if !is_last(cursor.room, bounds.rooms) {
                Transition::NextRoom
            } else if method == RenderMethod::FullRender {
                Transition::EnterUserPhase
            } else {
                Transition::Finish
            }
        }
        RenderPhase::User => {
            if is_last(cursor.user_pass, bounds.near_field_passes) {
                Transition::Finish
            } else {
                Transition::NextUserPass
            }
        }
    }
}

/// Passes a full sequence of `method` produces.
pub fn total_passes(method: RenderMethod, bounds: &SequenceBounds) -> usize {
    match method {
        RenderMethod::OneByOne { .. } => bounds.speakers,
        RenderMethod::AllAtOnce => bounds.hrtfs,
        RenderMethod::RenderRooms => bounds.rooms * bounds.hrtfs,
        RenderMethod::RenderUser => bounds.near_field_passes,
        RenderMethod::FullRender => bounds.rooms * bounds.hrtfs + bounds.near_field_passes,
    }
}

/// Passes in one segment of `phase`.
pub fn passes_per_segment(phase: RenderPhase, bounds: &SequenceBounds) -> usize {
    match phase {
        RenderPhase::Speakers => bounds.speakers,
        RenderPhase::Hrtfs | RenderPhase::Rooms => bounds.hrtfs,
        RenderPhase::User => bounds.near_field_passes,
    }
}

/// Segments not yet finished, counting the current one.
pub fn segments_left(method: RenderMethod, cursor: &RenderCursor, bounds: &SequenceBounds) -> usize {
    match (method, cursor.phase) {
        (RenderMethod::RenderRooms, RenderPhase::Rooms) => bounds.rooms.saturating_sub(cursor.room),
        (RenderMethod::FullRender, RenderPhase::Rooms) => bounds.rooms.saturating_sub(cursor.room) + 1,
        _ => 1,
    }
}
