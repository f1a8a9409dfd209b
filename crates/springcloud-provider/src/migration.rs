//! Upgrades of state persisted by older versions.
//!
//! Every resource type has a [`SCHEMA_VERSION`](crate::resource::ResourceDefinition). State is
//! upgraded one version at a time until it reaches the current version, before it is decoded.

use serde_json::Value;
use snafu::{ResultExt, Snafu, ensure};
use springcloud_shared::id::{ParseError, SpringCloudServiceId};

use crate::resource::{
    ResourceDefinition, configuration_service::SpringCloudConfigurationService,
    customized_accelerator::SpringCloudCustomizedAccelerator, service::SpringCloudService,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("unknown resource type {type_name:?}"))]
    UnknownType { type_name: String },

    #[snafu(display(
        "state of {type_name} has version {version}, which is newer than the supported version {current}"
    ))]
    FutureVersion {
        type_name: String,
        version: u32,
        current: u32,
    },

    #[snafu(display("failed to parse id {id:?} of {type_name} state"))]
    ParseId {
        type_name: String,
        id: String,
        source: ParseError,
    },
}

/// Returns the current schema version of `type_name`.
pub fn current_version(type_name: &str) -> Result<u32, Error> {
    match type_name {
        SpringCloudService::TYPE_NAME => Ok(SpringCloudService::SCHEMA_VERSION),
        SpringCloudConfigurationService::TYPE_NAME => {
            Ok(SpringCloudConfigurationService::SCHEMA_VERSION)
        }
        SpringCloudCustomizedAccelerator::TYPE_NAME => {
            Ok(SpringCloudCustomizedAccelerator::SCHEMA_VERSION)
        }
        _ => UnknownTypeSnafu { type_name }.fail(),
    }
}

/// Upgrades the `attributes` of a `type_name` state from `version` to the current version.
pub fn upgrade(type_name: &str, mut version: u32, mut attributes: Value) -> Result<Value, Error> {
    let current = current_version(type_name)?;
    ensure!(
        version <= current,
        FutureVersionSnafu {
            type_name,
            version,
            current
        }
    );

    while version < current {
        tracing::info!(type_name, from = version, to = version + 1, "upgrading state");
        attributes = match (type_name, version) {
            (SpringCloudService::TYPE_NAME, 0) => service_v0_to_v1(attributes)?,
            // Versions without a structural change
            _ => attributes,
        };
        version += 1;
    }

    Ok(attributes)
}

/// Older versions stored the service id with the `Spring` segment as returned by the API.
fn service_v0_to_v1(mut attributes: Value) -> Result<Value, Error> {
    if let Some(id) = attributes.get_mut("id")
        && let Some(old) = id.as_str()
    {
        let parsed = SpringCloudServiceId::parse_insensitively(old).context(ParseIdSnafu {
            type_name: SpringCloudService::TYPE_NAME,
            id: old,
        })?;
        *id = Value::String(parsed.to_string());
    }
    Ok(attributes)
}
