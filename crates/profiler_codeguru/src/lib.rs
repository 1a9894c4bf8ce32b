use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_codeguruprofiler::config::Region;
use aws_sdk_codeguruprofiler::primitives::Blob;
use profiler::{Profile, ProfileReporter, ProfilerError};
use std::sync::atomic::{AtomicBool, Ordering};

pub mod agent_profile;

const PROFILE_CONTENT_TYPE: &str = "application/json";

/// Reports finished profiles to CodeGuru Profiler.
pub struct CodeGuruReporter {
    client: aws_sdk_codeguruprofiler::Client,
    should_profile: AtomicBool,
}

impl CodeGuruReporter {
    /// The target region overrides the region of the shared SDK config,
    /// the profiling group may live outside the function's region.
    pub fn new(sdk_config: &SdkConfig, target_region: Option<String>) -> Self {
        let mut builder: aws_sdk_codeguruprofiler::config::Builder =
            aws_sdk_codeguruprofiler::config::Builder::from(sdk_config);

        if let Some(region) = target_region {
            builder = builder.region(Region::new(region));
        }

        CodeGuruReporter::from_client(aws_sdk_codeguruprofiler::Client::from_conf(
            builder.build(),
        ))
    }

    pub fn from_client(client: aws_sdk_codeguruprofiler::Client) -> Self {
        CodeGuruReporter {
            client,
            should_profile: AtomicBool::new(true),
        }
    }

    /// Ask the service whether the group wants profiles from this agent.
    ///
    /// Called once at cold start. Until it succeeds every profile is sent.
    pub async fn configure_agent(&self, profiling_group: &str) -> Result<bool, ProfilerError> {
        let output = self
            .client
            .configure_agent()
            .profiling_group_name(profiling_group)
            .send()
            .await
            .map_err(|err| ProfilerError::Report(err.into()))?;

        let should_profile: bool = output
            .configuration()
            .is_none_or(|configuration| configuration.should_profile());
        self.should_profile.store(should_profile, Ordering::Relaxed);

        tracing::info!(profiling_group, should_profile, "Configured profiling agent");

        Ok(should_profile)
    }

    pub fn should_profile(&self) -> bool {
        self.should_profile.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ProfileReporter for CodeGuruReporter {
    fn name(&self) -> &'static str {
        "codeguru"
    }

    async fn report(&self, profile: &Profile) -> Result<(), ProfilerError> {
        if !self.should_profile() {
            tracing::debug!(
                profiling_group = %profile.profiling_group,
                "Profiling paused by agent configuration, profile not sent"
            );

            return Ok(());
        }

        let body: Vec<u8> = agent_profile::encode(profile)?;

        self.client
            .post_agent_profile()
            .profiling_group_name(&profile.profiling_group)
            .content_type(PROFILE_CONTENT_TYPE)
            .agent_profile(Blob::new(body))
            .send()
            .await
            .map_err(|err| ProfilerError::Report(err.into()))?;

        Ok(())
    }
}
