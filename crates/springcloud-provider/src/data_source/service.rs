use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt, Snafu};
use springcloud_shared::id::SpringCloudServiceId;
use tracing::instrument;

use crate::{
    resource::service::{
        self, ConfigServerGitSetting, RequiredNetworkTrafficRule, ServiceReconciler,
        SpringCloudService,
    },
    validation::{self, Validator},
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid lookup"))]
    InvalidLookup { source: validation::Errors },

    #[snafu(display("failed to read {id}"))]
    Read { id: String, source: service::Error },

    #[snafu(display("{id} was not found"))]
    NotFound { id: String },
}

/// Identifies the service to look up.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct SpringCloudServiceLookup {
    pub name: String,
    pub resource_group_name: String,
}

/// What the data source exposes about a service. Secrets of the git setting are never set.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct SpringCloudServiceData {
    #[schemars(with = "String")]
    pub id: SpringCloudServiceId,

    pub name: String,

    pub resource_group_name: String,

    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_server_git_setting: Option<ConfigServerGitSetting>,

    #[serde(default)]
    pub outbound_public_ip_addresses: Vec<String>,

    #[serde(default)]
    pub required_network_traffic_rules: Vec<RequiredNetworkTrafficRule>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl SpringCloudServiceData {
    pub const TYPE_NAME: &'static str = "spring_cloud_service";

    fn new(id: SpringCloudServiceId, service: SpringCloudService) -> Self {
        Self {
            id,
            name: service.name,
            resource_group_name: service.resource_group_name,
            location: service.location,
            config_server_git_setting: service.config_server_git_setting,
            outbound_public_ip_addresses: service.outbound_public_ip_addresses,
            required_network_traffic_rules: service.required_network_traffic_rules,
            tags: service.tags,
        }
    }
}

/// Looks up existing `spring_cloud_service`s.
#[derive(Clone)]
pub struct ServiceDataSource {
    reconciler: ServiceReconciler,
    subscription_id: String,
}

impl ServiceDataSource {
    pub fn new(reconciler: ServiceReconciler, subscription_id: impl Into<String>) -> Self {
        Self {
            reconciler,
            subscription_id: subscription_id.into(),
        }
    }

    /// Reads the service. Unlike a managed resource, a missing service is an error.
    #[instrument(skip_all, fields(name = %lookup.name))]
    pub async fn read(&self, lookup: &SpringCloudServiceLookup) -> Result<SpringCloudServiceData, Error> {
        let mut validator = Validator::default();
        validator.check(validation::service_name("name", &lookup.name));
        validator.check(validation::not_empty(
            "resource_group_name",
            &lookup.resource_group_name,
        ));
        validator.finish().context(InvalidLookupSnafu)?;

        let id = SpringCloudServiceId::new(
            &self.subscription_id,
            &lookup.resource_group_name,
            &lookup.name,
        );
        // Without prior state no secret can be restored
        let service = self
            .reconciler
            .read(&id, None)
            .await
            .context(ReadSnafu { id: id.to_string() })?
            .context(NotFoundSnafu { id: id.to_string() })?;

        Ok(SpringCloudServiceData::new(id, service))
    }
}
