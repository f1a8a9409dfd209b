//! Wire representation of the `Microsoft.AppPlatform` REST API.
//!
//! Every type mirrors the camelCase JSON of the API. Optional fields are skipped when
//! serializing, so that a request only carries what the configuration sets.

use serde::{Deserialize, Serialize};

mod accelerator;
mod build_service;
mod config_server;
mod configuration_service;
mod service;

pub use accelerator::*;
pub use build_service::*;
pub use config_server::*;
pub use configuration_service::*;
pub use service::*;

/// An error embedded in the properties of a resource, which the API reports although the
/// long-running operation succeeded.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The flat git credential fields of config server and configuration service repositories.
///
/// The API never returns secrets in plain text. Depending on the API version they are either
/// omitted or masked, so their presence only tells which kind of authentication is configured.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key_algorithm: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_host_key_checking: Option<bool>,
}
