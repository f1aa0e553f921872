//! Progress reporting seam.

/// Receives milestone updates during a run.
///
/// Updates are fire-and-forget: implementations must not block, and a sink
/// that drops updates does not affect the run.
pub trait ProgressSink: Send + Sync {
    /// Report that the run reached `percent` (0–100) at `step`.
    fn update(&self, percent: u8, step: &str);
}

/// Sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _percent: u8, _step: &str) {}
}

impl<F> ProgressSink for F
where
    F: Fn(u8, &str) + Send + Sync,
{
    fn update(&self, percent: u8, step: &str) {
        self(percent, step)
    }
}
