//! Dispatch over every resource type, so that manifests and state files can mix them.

use std::fmt::Display;

use serde_json::Value;
use snafu::{ResultExt, Snafu};

use crate::{
    client::AppPlatform,
    resource::{
        ResourceDefinition,
        configuration_service::{
            self, ConfigurationServiceReconciler, SpringCloudConfigurationService,
        },
        customized_accelerator::{
            self, CustomizedAcceleratorReconciler, SpringCloudCustomizedAccelerator,
        },
        service::{self, ServiceReconciler, SpringCloudService},
    },
    timeouts::TimeoutOverrides,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("unknown resource type {type_name:?}"))]
    UnknownType { type_name: String },

    #[snafu(display("invalid attributes for a {type_name}"))]
    Decode {
        type_name: String,
        source: serde_json::Error,
    },

    #[snafu(display("failed to encode a {type_name}"))]
    Encode {
        type_name: String,
        source: serde_json::Error,
    },

    #[snafu(display("can not change the type of {address}"))]
    TypeChanged { address: Address },

    #[snafu(display("failed to reconcile spring cloud service"))]
    Service { source: service::Error },

    #[snafu(display("failed to reconcile configuration service"))]
    ConfigurationService { source: configuration_service::Error },

    #[snafu(display("failed to reconcile customized accelerator"))]
    CustomizedAccelerator {
        source: customized_accelerator::Error,
    },
}

impl Error {
    /// Whether the update failed because a field changed which the service can't change in
    /// place.
    pub fn requires_replacement(&self) -> bool {
        matches!(
            self,
            Self::Service {
                source: service::Error::RequiresReplacement { .. }
            } | Self::ConfigurationService {
                source: configuration_service::Error::RequiresReplacement { .. }
            } | Self::CustomizedAccelerator {
                source: customized_accelerator::Error::RequiresReplacement { .. }
            }
        )
    }
}

/// Where a resource lives in manifests and state, like `spring_cloud_service.main`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Address {
    pub type_name: String,
    pub name: String,
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_name, self.name)
    }
}

/// The configuration or state of one resource of any type.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    Service(SpringCloudService),
    ConfigurationService(SpringCloudConfigurationService),
    CustomizedAccelerator(SpringCloudCustomizedAccelerator),
}

impl Resource {
    pub fn decode(type_name: &str, attributes: Value) -> Result<Self, Error> {
        let context = DecodeSnafu { type_name };
        match type_name {
            SpringCloudService::TYPE_NAME => serde_json::from_value(attributes)
                .map(Self::Service)
                .context(context),
            SpringCloudConfigurationService::TYPE_NAME => serde_json::from_value(attributes)
                .map(Self::ConfigurationService)
                .context(context),
            SpringCloudCustomizedAccelerator::TYPE_NAME => serde_json::from_value(attributes)
                .map(Self::CustomizedAccelerator)
                .context(context),
            _ => UnknownTypeSnafu { type_name }.fail(),
        }
    }

    pub fn encode(&self) -> Result<Value, Error> {
        match self {
            Self::Service(service) => serde_json::to_value(service),
            Self::ConfigurationService(configuration_service) => {
                serde_json::to_value(configuration_service)
            }
            Self::CustomizedAccelerator(accelerator) => serde_json::to_value(accelerator),
        }
        .context(EncodeSnafu {
            type_name: self.type_name(),
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Service(_) => SpringCloudService::TYPE_NAME,
            Self::ConfigurationService(_) => SpringCloudConfigurationService::TYPE_NAME,
            Self::CustomizedAccelerator(_) => SpringCloudCustomizedAccelerator::TYPE_NAME,
        }
    }

    pub fn schema_version(&self) -> u32 {
        match self {
            Self::Service(_) => SpringCloudService::SCHEMA_VERSION,
            Self::ConfigurationService(_) => SpringCloudConfigurationService::SCHEMA_VERSION,
            Self::CustomizedAccelerator(_) => SpringCloudCustomizedAccelerator::SCHEMA_VERSION,
        }
    }

    pub fn deprecation_message(&self) -> Option<&'static str> {
        match self {
            Self::Service(_) => SpringCloudService::DEPRECATION_MESSAGE,
            Self::ConfigurationService(_) => SpringCloudConfigurationService::DEPRECATION_MESSAGE,
            Self::CustomizedAccelerator(_) => SpringCloudCustomizedAccelerator::DEPRECATION_MESSAGE,
        }
    }
}

/// Runs the reconciler matching the type of a [`Resource`].
#[derive(Clone)]
pub struct Provider {
    client: AppPlatform,
    subscription_id: String,
}

impl Provider {
    pub fn new(client: AppPlatform, subscription_id: impl Into<String>) -> Self {
        Self {
            client,
            subscription_id: subscription_id.into(),
        }
    }

    pub fn services(&self, timeouts: &TimeoutOverrides) -> ServiceReconciler {
        ServiceReconciler::new(self.client.clone(), &self.subscription_id).with_timeouts(timeouts)
    }

    fn configuration_services(&self, timeouts: &TimeoutOverrides) -> ConfigurationServiceReconciler {
        ConfigurationServiceReconciler::new(self.client.clone()).with_timeouts(timeouts)
    }

    fn customized_accelerators(
        &self,
        timeouts: &TimeoutOverrides,
    ) -> CustomizedAcceleratorReconciler {
        CustomizedAcceleratorReconciler::new(self.client.clone()).with_timeouts(timeouts)
    }

    pub async fn create(
        &self,
        config: &Resource,
        timeouts: &TimeoutOverrides,
    ) -> Result<Resource, Error> {
        Ok(match config {
            Resource::Service(config) => Resource::Service(
                self.services(timeouts)
                    .create(config)
                    .await
                    .context(ServiceSnafu)?,
            ),
            Resource::ConfigurationService(config) => Resource::ConfigurationService(
                self.configuration_services(timeouts)
                    .create(config)
                    .await
                    .context(ConfigurationServiceSnafu)?,
            ),
            Resource::CustomizedAccelerator(config) => Resource::CustomizedAccelerator(
                self.customized_accelerators(timeouts)
                    .create(config)
                    .await
                    .context(CustomizedAcceleratorSnafu)?,
            ),
        })
    }

    /// Returns `None` if the resource no longer exists.
    pub async fn read(
        &self,
        state: &Resource,
        timeouts: &TimeoutOverrides,
    ) -> Result<Option<Resource>, Error> {
        Ok(match state {
            Resource::Service(state) => {
                let id = state
                    .id
                    .clone()
                    .unwrap_or_else(|| state.service_id(&self.subscription_id));
                self.services(timeouts)
                    .read(&id, Some(state))
                    .await
                    .context(ServiceSnafu)?
                    .map(Resource::Service)
            }
            Resource::ConfigurationService(state) => {
                let id = state
                    .id
                    .clone()
                    .unwrap_or_else(|| state.configuration_service_id());
                self.configuration_services(timeouts)
                    .read(&id, Some(state))
                    .await
                    .context(ConfigurationServiceSnafu)?
                    .map(Resource::ConfigurationService)
            }
            Resource::CustomizedAccelerator(state) => {
                let id = state
                    .id
                    .clone()
                    .unwrap_or_else(|| state.customized_accelerator_id());
                self.customized_accelerators(timeouts)
                    .read(&id, Some(state))
                    .await
                    .context(CustomizedAcceleratorSnafu)?
                    .map(Resource::CustomizedAccelerator)
            }
        })
    }

    pub async fn update(
        &self,
        address: &Address,
        prior: &Resource,
        config: &Resource,
        timeouts: &TimeoutOverrides,
    ) -> Result<Resource, Error> {
        Ok(match (prior, config) {
            (Resource::Service(prior), Resource::Service(config)) => Resource::Service(
                self.services(timeouts)
                    .update(prior, config)
                    .await
                    .context(ServiceSnafu)?,
            ),
            (Resource::ConfigurationService(prior), Resource::ConfigurationService(config)) => {
                Resource::ConfigurationService(
                    self.configuration_services(timeouts)
                        .update(prior, config)
                        .await
                        .context(ConfigurationServiceSnafu)?,
                )
            }
            (Resource::CustomizedAccelerator(prior), Resource::CustomizedAccelerator(config)) => {
                Resource::CustomizedAccelerator(
                    self.customized_accelerators(timeouts)
                        .update(prior, config)
                        .await
                        .context(CustomizedAcceleratorSnafu)?,
                )
            }
            _ => {
                return TypeChangedSnafu {
                    address: address.clone(),
                }
                .fail();
            }
        })
    }

    pub async fn delete(&self, state: &Resource, timeouts: &TimeoutOverrides) -> Result<(), Error> {
        match state {
            Resource::Service(state) => self
                .services(timeouts)
                .delete(state)
                .await
                .context(ServiceSnafu),
            Resource::ConfigurationService(state) => self
                .configuration_services(timeouts)
                .delete(state)
                .await
                .context(ConfigurationServiceSnafu),
            Resource::CustomizedAccelerator(state) => self
                .customized_accelerators(timeouts)
                .delete(state)
                .await
                .context(CustomizedAcceleratorSnafu),
        }
    }

    pub async fn import(&self, type_name: &str, id: &str) -> Result<Resource, Error> {
        let timeouts = TimeoutOverrides::default();
        Ok(match type_name {
            SpringCloudService::TYPE_NAME => Resource::Service(
                self.services(&timeouts)
                    .import(id)
                    .await
                    .context(ServiceSnafu)?,
            ),
            SpringCloudConfigurationService::TYPE_NAME => Resource::ConfigurationService(
                self.configuration_services(&timeouts)
                    .import(id)
                    .await
                    .context(ConfigurationServiceSnafu)?,
            ),
            SpringCloudCustomizedAccelerator::TYPE_NAME => Resource::CustomizedAccelerator(
                self.customized_accelerators(&timeouts)
                    .import(id)
                    .await
                    .context(CustomizedAcceleratorSnafu)?,
            ),
            _ => return UnknownTypeSnafu { type_name }.fail(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_by_type_name() {
        let resource = Resource::decode(
            "spring_cloud_service",
            json!({"name": "svc", "resource_group_name": "rg", "location": "West Europe"}),
        )
        .expect("valid service");

        assert_eq!(resource.type_name(), "spring_cloud_service");
        assert!(resource.deprecation_message().is_some());
        assert_eq!(
            resource.encode().expect("encodable")["location"],
            json!("West Europe")
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(matches!(
            Resource::decode("spring_cloud_app", json!({})),
            Err(Error::UnknownType { .. })
        ));
        assert!(matches!(
            Resource::decode("spring_cloud_service", json!({"name": 1})),
            Err(Error::Decode { .. })
        ));
    }
}
