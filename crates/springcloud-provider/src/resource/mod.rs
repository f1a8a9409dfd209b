//! The managed resources.
//!
//! Each resource is a module with its declarative model (which doubles as its state), the
//! expand/flatten transforms between the model and the wire types, and a reconciler which
//! implements create, read, update and delete on top of [`AppPlatform`](crate::client::AppPlatform).

use schemars::{JsonSchema, Schema};
use serde::{Serialize, de::DeserializeOwned};

use crate::timeouts::Timeouts;

pub mod configuration_service;
pub mod customized_accelerator;
pub mod service;

/// Static facts about a resource type.
pub trait ResourceDefinition {
    /// The model is both the configuration and the state of the resource.
    type Model: Clone + DeserializeOwned + JsonSchema + Serialize;

    /// The name resources of this type are declared with, like `spring_cloud_service`.
    const TYPE_NAME: &'static str;

    /// Version of the persisted state, see [`crate::migration`].
    const SCHEMA_VERSION: u32;

    const DEFAULT_TIMEOUTS: Timeouts;

    /// Set for resources which are retired in favour of another resource.
    const DEPRECATION_MESSAGE: Option<&'static str> = None;

    fn schema() -> Schema {
        schemars::schema_for!(Self::Model)
    }
}

/// Normalizes an Azure location, `West Europe` and `westeurope` denote the same region.
pub fn normalize_location(location: &str) -> String {
    location.replace(' ', "").to_lowercase()
}

/// Converts an empty string into `None`.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

/// Converts an empty list into `None`.
pub(crate) fn non_empty_list(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("West Europe", "westeurope")]
    #[case("westeurope", "westeurope")]
    #[case("East US 2", "eastus2")]
    fn locations_are_normalized(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_location(input), expected);
    }
}
