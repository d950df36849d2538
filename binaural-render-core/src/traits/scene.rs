use crate::models::scene::{ListenerPlacement, PassSource, RoomSnapshot, SourceSnapshot};

/// Playback side of the host: speakers, the near-field source and the listener.
///
/// Implemented by:
/// - `HeadlessScene` (in-memory, no engine)
/// - A game-engine binding that forwards to real source/listener objects
///
/// All methods are called from the control thread that drives the sequencer.
pub trait RenderScene {
    /// Names of the far-field speakers. The sequencer sorts them once per setup.
    fn speaker_names(&self) -> Vec<String>;

    /// Start playback of a single named speaker.
    fn play_speaker(&mut self, name: &str);

    /// Start playback of every far-field speaker.
    fn play_all(&mut self);

    /// Start playback of the near-field source.
    fn play_near_field(&mut self);

    /// Stop every source that is playing.
    fn stop_sources(&mut self);

    fn relocate_listener(&mut self, placement: ListenerPlacement);

    /// Draw new volume and mix levels for the far-field speakers, or for the
    /// near-field source when `near_field` is set.
    fn randomise_source_parameters(&mut self, near_field: bool);

    /// Geometry and parameters of the sources a pass played, for the render log.
    fn source_snapshots(&self, source: &PassSource) -> Vec<SourceSnapshot>;

    fn room_snapshot(&self) -> RoomSnapshot;
}
