//! Migration progress reporting

use tracing::{info, warn};

/// Events emitted while an export or import runs.
/// Record contents are omitted; only keys travel in events.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationEvent {
    PhaseStarted {
        phase: &'static str,
    },
    PhaseFinished {
        phase: &'static str,
        created: usize,
        reused: usize,
    },
    RecordSkipped {
        phase: &'static str,
        key: String,
        reason: String,
    },
    RecordFailed {
        phase: &'static str,
        key: String,
        message: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: MigrationEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: MigrationEvent) {}
}

/// Reporter that logs every event through tracing.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: MigrationEvent) {
        match event {
            MigrationEvent::PhaseStarted { phase } => {
                info!(phase, "Phase started");
            }
            MigrationEvent::PhaseFinished {
                phase,
                created,
                reused,
            } => {
                info!(phase, created, reused, "Phase finished");
            }
            MigrationEvent::RecordSkipped { phase, key, reason } => {
                warn!(phase, %key, %reason, "Record skipped");
            }
            MigrationEvent::RecordFailed {
                phase,
                key,
                message,
            } => {
                warn!(phase, %key, %message, "Record failed");
            }
        }
    }
}
