//! Infrastructure implementation of the instance ports over the `aws` CLI.
//!
//! `AwsCliProvider<R>` routes every EC2 call through a `CommandRunner`, so
//! tests can inject canned output without spawning processes.

use std::collections::BTreeMap;
use std::process::Output;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::{Ack, CommandRunner, InstanceCommand, InstanceQuery};
use crate::domain::instance::{InstanceGroup, InstanceId, RawInstance};
use crate::infra::command_runner::TokioCommandRunner;

/// Program invoked for every provider call.
pub const AWS_PROGRAM: &str = "aws";

// ── Wire format ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesResponse {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<Ec2Instance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Ec2Instance {
    instance_id: String,
    state: Ec2State,
    #[serde(default)]
    tags: Vec<Ec2Tag>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Ec2State {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Ec2Tag {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StateChangeResponse {
    #[serde(default, alias = "StartingInstances", alias = "StoppingInstances")]
    instances: Vec<StateChange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StateChange {
    instance_id: String,
    current_state: Ec2State,
}

/// Parse `aws ec2 describe-instances --output json`.
///
/// # Errors
///
/// Returns an error if the document is not a describe-instances response.
pub fn parse_describe_instances(json: &[u8]) -> Result<Vec<InstanceGroup>> {
    let response: DescribeInstancesResponse =
        serde_json::from_slice(json).context("cannot parse describe-instances output")?;
    Ok(response
        .reservations
        .into_iter()
        .map(|reservation| InstanceGroup {
            instances: reservation
                .instances
                .into_iter()
                .map(|instance| RawInstance {
                    id: InstanceId::new(instance.instance_id),
                    state: instance.state.name,
                    tags: instance
                        .tags
                        .into_iter()
                        .map(|tag| (tag.key, tag.value))
                        .collect::<BTreeMap<_, _>>(),
                })
                .collect(),
        })
        .collect())
}

/// Parse `aws ec2 start-instances` / `stop-instances` output.
///
/// # Errors
///
/// Returns an error if the document is not a state-change response.
pub fn parse_state_change(json: &[u8]) -> Result<Ack> {
    let response: StateChangeResponse =
        serde_json::from_slice(json).context("cannot parse state-change output")?;
    Ok(Ack {
        current_states: response
            .instances
            .into_iter()
            .map(|change| (InstanceId::new(change.instance_id), change.current_state.name))
            .collect(),
    })
}

// ── Provider ─────────────────────────────────────────────────────────────────

/// EC2 through the `aws` CLI.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
#[derive(Debug, Clone)]
pub struct AwsCliProvider<R: CommandRunner> {
    runner: R,
    region: Option<String>,
    profile: Option<String>,
}

impl<R: CommandRunner> AwsCliProvider<R> {
    pub fn new(runner: R, region: Option<String>, profile: Option<String>) -> Self {
        Self {
            runner,
            region,
            profile,
        }
    }

    /// Full argument list for `aws ec2 <subcommand>`.
    #[must_use]
    pub fn ec2_args(&self, subcommand: &str, ids: &[InstanceId]) -> Vec<String> {
        let mut args = vec!["ec2".to_string(), subcommand.to_string()];
        if !ids.is_empty() {
            args.push("--instance-ids".to_string());
            args.extend(ids.iter().map(|id| id.as_str().to_string()));
        }
        args.extend(["--output".to_string(), "json".to_string()]);
        if let Some(region) = &self.region {
            args.extend(["--region".to_string(), region.clone()]);
        }
        if let Some(profile) = &self.profile {
            args.extend(["--profile".to_string(), profile.clone()]);
        }
        args
    }

    async fn ec2(&self, subcommand: &str, ids: &[InstanceId]) -> Result<Vec<u8>> {
        let args = self.ec2_args(subcommand, ids);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        debug!(subcommand, instances = ids.len(), "calling aws ec2");
        let output = self.runner.run(AWS_PROGRAM, &argv).await?;
        check_status(subcommand, output)
    }
}

impl AwsCliProvider<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner(region: Option<String>, profile: Option<String>) -> Self {
        Self::new(TokioCommandRunner::default(), region, profile)
    }
}

/// The provider's stderr is the error message, so callers can surface it
/// verbatim.
fn check_status(subcommand: &str, output: Output) -> Result<Vec<u8>> {
    if output.status.success() {
        return Ok(output.stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    debug!(subcommand, status = %output.status, "aws ec2 call failed");
    if stderr.is_empty() {
        anyhow::bail!("aws ec2 {subcommand} exited with {}", output.status);
    }
    Err(anyhow::Error::msg(stderr))
}

impl<R: CommandRunner> InstanceQuery for AwsCliProvider<R> {
    async fn describe_instances(&self, ids: &[InstanceId]) -> Result<Vec<InstanceGroup>> {
        let stdout = self.ec2("describe-instances", ids).await?;
        parse_describe_instances(&stdout)
    }
}

impl<R: CommandRunner> InstanceCommand for AwsCliProvider<R> {
    async fn start_instances(&self, ids: &[InstanceId]) -> Result<Ack> {
        let stdout = self.ec2("start-instances", ids).await?;
        parse_state_change(&stdout)
    }

    async fn stop_instances(&self, ids: &[InstanceId]) -> Result<Ack> {
        let stdout = self.ec2("stop-instances", ids).await?;
        parse_state_change(&stdout)
    }
}
