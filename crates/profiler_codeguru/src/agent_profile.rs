//! Encodes a finished `Profile` as the agent profile document accepted by
//! `PostAgentProfile`.
//!
//! Each recorded step becomes a child frame of a single root frame. Step
//! timings are turned into `WALL_TIME` sample counts at a fixed sampling
//! interval, and any time not covered by a step is counted on the root.

use profiler::{Profile, ProfilerError, StepTiming};
use serde::Serialize;
use std::collections::BTreeMap;

pub const SAMPLE_INTERVAL_MS: u64 = 1;
pub const ROOT_FRAME: &str = "workflow::run";
const WALL_TIME: &str = "WALL_TIME";
const AGENT_TYPE: &str = "RustLambdaAgent";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentProfile {
    start: i64,
    end: i64,
    agent_metadata: AgentMetadata,
    callgraph: CallGraphNode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentMetadata {
    sample_weights: BTreeMap<&'static str, f64>,
    duration_in_ms: u64,
    num_times_sampled: u64,
    agent_info: AgentInfo,
}

#[derive(Debug, Serialize)]
struct AgentInfo {
    #[serde(rename = "type")]
    agent_type: &'static str,
    version: &'static str,
}

#[derive(Debug, Default, Serialize)]
struct CallGraphNode {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    counts: BTreeMap<&'static str, u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, CallGraphNode>,
}

impl CallGraphNode {
    fn add_wall_time(&mut self, samples: u64) {
        if samples > 0 {
            *self.counts.entry(WALL_TIME).or_default() += samples;
        }
    }
}

/// Number of samples a step would have collected. A recorded step is
/// always visible with at least one sample.
fn samples(timing: &StepTiming) -> u64 {
    let samples: u64 = (timing.elapsed_ms / SAMPLE_INTERVAL_MS as f64).ceil() as u64;

    samples.max(1)
}

fn callgraph(profile: &Profile) -> (CallGraphNode, u64) {
    let mut run: CallGraphNode = CallGraphNode::default();
    let mut step_samples: u64 = 0;

    for timing in &profile.steps {
        let count: u64 = samples(timing);
        step_samples += count;

        run.children
            .entry(format!("{ROOT_FRAME}::{}", timing.step))
            .or_default()
            .add_wall_time(count);
    }

    let total_samples: u64 = (profile.duration_ms / SAMPLE_INTERVAL_MS).max(step_samples);
    run.add_wall_time(total_samples - step_samples);

    let mut root: CallGraphNode = CallGraphNode::default();
    root.children.insert(ROOT_FRAME.to_string(), run);

    (root, total_samples)
}

pub fn encode(profile: &Profile) -> Result<Vec<u8>, ProfilerError> {
    let (callgraph, num_times_sampled) = callgraph(profile);
    let start: i64 = profile.started_at.timestamp_millis();

    let document: AgentProfile = AgentProfile {
        start,
        end: start + profile.duration_ms as i64,
        agent_metadata: AgentMetadata {
            // Seconds represented by one sample
            sample_weights: BTreeMap::from([(WALL_TIME, SAMPLE_INTERVAL_MS as f64 / 1000.0)]),
            duration_in_ms: profile.duration_ms,
            num_times_sampled,
            agent_info: AgentInfo {
                agent_type: AGENT_TYPE,
                version: env!("CARGO_PKG_VERSION"),
            },
        },
        callgraph,
    };

    serde_json::to_vec(&document).map_err(|err| ProfilerError::Serialise(err.to_string()))
}
