//! Progress sinks

use semdex_domain::ports::ProgressSink;

/// Progress sink that logs reports through tracing
#[derive(Debug, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn report(&self, progress: f64, message: &str, processed: usize, total: usize) {
        tracing::info!(
            progress = format!("{:.0}%", progress * 100.0),
            processed,
            total,
            "{}",
            message
        );
    }
}
