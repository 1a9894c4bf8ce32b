use async_trait::async_trait;
use model::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod session;

pub use crate::session::{Profile, ProfilingSession, StepTiming, WorkKind};

/// Destination for finished profiles.
/// The production implementation posts to CodeGuru Profiler.
#[async_trait]
pub trait ProfileReporter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn report(&self, profile: &Profile) -> Result<(), ProfilerError>;
}

#[derive(Debug, Clone, Default)]
pub struct ProfilerSettings {
    pub profiling_group_name: Option<String>,
    pub enabled: bool,
}

/// Hands out one profiling session per invocation.
///
/// A profiler is only active when enabled with a profiling group.
/// Otherwise every session it starts is a no-op.
#[derive(Clone)]
pub struct Profiler {
    target: Option<ReportTarget>,
}

#[derive(Clone)]
pub(crate) struct ReportTarget {
    pub(crate) profiling_group: String,
    pub(crate) reporter: Arc<dyn ProfileReporter>,
}

impl Profiler {
    pub fn new(settings: ProfilerSettings, reporter: Arc<dyn ProfileReporter>) -> Self {
        match (settings.enabled, settings.profiling_group_name) {
            (false, _) => {
                tracing::info!("Profiling switched off by configuration");

                Profiler::disabled()
            }
            (true, None) => {
                tracing::warn!("No profiling group name configured, profiling is a no-op");

                Profiler::disabled()
            }
            (true, Some(profiling_group)) => {
                tracing::info!(
                    profiling_group = %profiling_group,
                    reporter = reporter.name(),
                    "Initialising profiler"
                );

                Profiler {
                    target: Some(ReportTarget {
                        profiling_group,
                        reporter,
                    }),
                }
            }
        }
    }

    pub fn disabled() -> Self {
        Profiler { target: None }
    }

    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn profiling_group(&self) -> Option<&str> {
        self.target
            .as_ref()
            .map(|target| target.profiling_group.as_str())
    }

    /// Acquire a session. It must be released with `ProfilingSession::finish`.
    pub fn start(&self, request_id: &str) -> ProfilingSession {
        ProfilingSession::new(request_id, self.target.clone())
    }
}

/// Errors arising from building or delivering a profile.
#[derive(Debug)]
pub enum ProfilerError {
    // The profile couldn't be encoded
    Serialise(String),
    // The reporter backend rejected the profile
    Report(Error),
}

impl Display for ProfilerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfilerError::Serialise(reason) => write!(f, "failed to encode profile: {reason}"),
            ProfilerError::Report(err) => write!(f, "failed to report profile: {err}"),
        }
    }
}

impl std::error::Error for ProfilerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfilerError::Serialise(_) => None,
            ProfilerError::Report(err) => Some(err.as_ref()),
        }
    }
}
