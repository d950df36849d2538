use crate::models::scene::{ListenerBounds, Position};

/// Random choices made by the sequencer.
///
/// Injected so tests can pin listener placement and the user configuration.
pub trait RenderRandomness {
    /// A position inside `bounds`.
    fn listener_position(&mut self, bounds: &ListenerBounds) -> Position;

    /// A user configuration in `0..pairs`.
    fn user_config(&mut self, pairs: usize) -> usize;
}

/// `RenderRandomness` backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandomness;

/// Uniform sample in `[lower, upper]`.
pub fn uniform(lower: f32, upper: f32) -> f32 {
    lower + (upper - lower) * rand::random::<f32>()
}

impl RenderRandomness for ThreadRandomness {
    fn listener_position(&mut self, bounds: &ListenerBounds) -> Position {
        Position::new(
            uniform(bounds.lower.x, bounds.upper.x),
            uniform(bounds.lower.y, bounds.upper.y),
            uniform(bounds.lower.z, bounds.upper.z),
        )
    }

    fn user_config(&mut self, pairs: usize) -> usize {
        if pairs == 0 {
            return 0;
        }
        ((rand::random::<f32>() * pairs as f32) as usize).min(pairs - 1)
    }
}
