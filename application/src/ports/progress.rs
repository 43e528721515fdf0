//! Progress notification port
//!
//! Defines the interface for reporting progress during panel execution.

use panel_domain::{Phase, ReaderId};

/// Callback for progress updates during panel execution
///
/// Implementations live at the presentation edge and can display progress
/// in various ways (console, web UI, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize);

    /// Called when a task completes within a phase
    fn on_task_complete(&self, phase: &Phase, reader: &ReaderId, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: &Phase);

    // ==================== Stream Callbacks ====================

    /// Called when a speaker starts streaming a statement.
    fn on_stream_start(&self, _speaker: &str) {}

    /// Called for each text chunk while a statement streams.
    fn on_stream_chunk(&self, _speaker: &str, _chunk: &str) {}

    /// Called when a speaker finishes streaming.
    fn on_stream_end(&self, _speaker: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: &Phase, _total_tasks: usize) {}
    fn on_task_complete(&self, _phase: &Phase, _reader: &ReaderId, _success: bool) {}
    fn on_phase_complete(&self, _phase: &Phase) {}
}
