use crate::models::error::RenderError;
use crate::models::render_pass::{CompletedPass, RenderPass};
use crate::session::sequencer::RenderProgress;

/// Event observer for render sequencer notifications.
///
/// All methods are called from the control thread that drives the sequencer.
/// Implementations should marshal to a UI thread if needed.
pub trait RenderObserver: Send + Sync {
    /// Called when a pass has started playing and capturing.
    fn on_pass_started(&self, _pass: &RenderPass) {}

    /// Called after every handled timer completion.
    fn on_notify(&self, progress: &RenderProgress);

    /// Called once when a sequence runs to its natural end.
    fn on_render_complete(&self, passes: &[CompletedPass]);

    /// Called when a capture, log or metadata operation fails.
    fn on_error(&self, _error: &RenderError) {}
}
