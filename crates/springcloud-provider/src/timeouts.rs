//! Time budgets for the lifecycle phases of a resource.

use std::{future::Future, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::Snafu;

/// A lifecycle phase of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Create,
    Read,
    Update,
    Delete,
}

#[derive(Debug, PartialEq, Eq, Snafu)]
#[snafu(display("{phase} did not finish within {}", humantime::format_duration(*timeout)))]
pub struct TimeoutError {
    phase: Phase,
    timeout: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub const fn from_minutes(create: u64, read: u64, update: u64, delete: u64) -> Self {
        Self {
            create: Duration::from_secs(create * 60),
            read: Duration::from_secs(read * 60),
            update: Duration::from_secs(update * 60),
            delete: Duration::from_secs(delete * 60),
        }
    }

    pub fn get(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Create => self.create,
            Phase::Read => self.read,
            Phase::Update => self.update,
            Phase::Delete => self.delete,
        }
    }

    pub fn with_overrides(mut self, overrides: &TimeoutOverrides) -> Self {
        let TimeoutOverrides {
            create,
            read,
            update,
            delete,
        } = overrides;
        self.create = create.unwrap_or(self.create);
        self.read = read.unwrap_or(self.read);
        self.update = update.unwrap_or(self.update);
        self.delete = delete.unwrap_or(self.delete);
        self
    }

    /// Runs `future` with the budget of `phase`.
    ///
    /// When the budget is exceeded the future is dropped, which abandons the remote operation
    /// that is currently awaited. It keeps running on the Azure side.
    pub async fn limit<F: Future>(&self, phase: Phase, future: F) -> Result<F::Output, TimeoutError> {
        let timeout = self.get(phase);
        tokio::time::timeout(timeout, future)
            .await
            .map_err(|_| TimeoutError { phase, timeout })
    }
}

/// Per-resource overrides of the default [`Timeouts`], written like `45m` or `1h 30m`.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct TimeoutOverrides {
    #[serde(default, with = "humantime_opt", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub create: Option<Duration>,

    #[serde(default, with = "humantime_opt", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub read: Option<Duration>,

    #[serde(default, with = "humantime_opt", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub update: Option<Duration>,

    #[serde(default, with = "humantime_opt", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub delete: Option<Duration>,
}

mod humantime_opt {
    use super::*;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.collect_str(&humantime::format_duration(*duration)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|input| humantime::parse_duration(&input).map_err(serde::de::Error::custom))
            .transpose()
    }
}
