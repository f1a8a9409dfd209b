use std::time::Duration;

use clap::Args;
use url::Url;

use crate::sensitive::Sensitive;

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// How the provider talks to Azure Resource Manager.
#[derive(Clone, Debug, PartialEq, Eq, Args)]
#[command(next_help_heading = "Provider Options")]
pub struct ProviderOptions {
    /// The subscription new resources are created in.
    #[arg(long, env = "ARM_SUBSCRIPTION_ID")]
    pub subscription_id: String,

    /// The Azure Resource Manager endpoint, which differs for sovereign clouds.
    #[arg(long, env = "ARM_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: Url,

    /// Bearer token used for every request, e.g. from `az account get-access-token`.
    #[arg(long, env = "ARM_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Sensitive,

    /// Time between two polls of a long running operation, unless the service asks for a
    /// different one.
    #[arg(long, env = "ARM_POLL_INTERVAL", default_value = "10s", value_parser = humantime::parse_duration)]
    pub poll_interval: Duration,
}
