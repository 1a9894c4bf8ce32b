use crate::ReportTarget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Whether a step spent its time computing or waiting on I/O.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkKind {
    Cpu,
    Io,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StepTiming {
    pub step: String,
    pub kind: WorkKind,
    pub elapsed_ms: f64,
}

/// A finished session, as handed to the reporter.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub profiling_group: String,
    pub request_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub succeeded: bool,
    pub steps: Vec<StepTiming>,
}

/// Profiling scope for a single invocation.
///
/// Dropping a session without calling `finish` abandons it and nothing
/// is reported.
pub struct ProfilingSession {
    target: Option<ReportTarget>,
    request_id: String,
    started_at: DateTime<Utc>,
    clock: Instant,
    steps: Vec<StepTiming>,
    finished: bool,
}

impl ProfilingSession {
    pub(crate) fn new(request_id: &str, target: Option<ReportTarget>) -> Self {
        if let Some(target) = &target {
            tracing::debug!(
                profiling_group = %target.profiling_group,
                request_id,
                "Profiling session started"
            );
        }

        ProfilingSession {
            target,
            request_id: request_id.to_string(),
            started_at: Utc::now(),
            clock: Instant::now(),
            steps: Vec::new(),
            finished: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn record(&mut self, step: &str, kind: WorkKind, elapsed: Duration) {
        if self.target.is_none() {
            return;
        }

        self.steps.push(StepTiming {
            step: step.to_string(),
            kind,
            elapsed_ms: elapsed.as_micros() as f64 / 1000.0,
        });
    }

    /// Release the session and report it.
    /// Reporting failures are logged, never returned.
    pub async fn finish(mut self, succeeded: bool) -> Option<Profile> {
        self.finished = true;

        let target: ReportTarget = self.target.take()?;
        let profile: Profile = Profile {
            profiling_group: target.profiling_group,
            request_id: std::mem::take(&mut self.request_id),
            started_at: self.started_at,
            duration_ms: self.clock.elapsed().as_millis() as u64,
            succeeded,
            steps: std::mem::take(&mut self.steps),
        };

        match target.reporter.report(&profile).await {
            Ok(()) => {
                tracing::debug!(
                    reporter = target.reporter.name(),
                    duration_ms = profile.duration_ms,
                    "Profile reported"
                );
            }
            Err(err) => {
                tracing::warn!(
                    reporter = target.reporter.name(),
                    error = %err,
                    "Failed to report profile"
                );
            }
        }

        Some(profile)
    }
}

impl Drop for ProfilingSession {
    fn drop(&mut self) {
        if !self.finished && self.target.is_some() {
            tracing::warn!(
                request_id = %self.request_id,
                "Profiling session dropped before finishing, nothing reported"
            );
        }
    }
}
