use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::ApiError;

/// A Spring Cloud service (`Microsoft.AppPlatform/Spring`).
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ClusterResourceProperties>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResourceProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnet_addons: Option<ServiceVNetAddons>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_redundant: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace_resource: Option<MarketplaceResource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_environment_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_subnet_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_runtime_subnet_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_cidr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_network_resource_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_runtime_network_resource_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_config: Option<IngressConfig>,

    #[serde(
        default,
        rename = "outboundIPs",
        skip_serializing_if = "Option::is_none"
    )]
    pub outbound_ips: Option<NetworkProfileOutboundIps>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_traffics: Option<Vec<RequiredTraffic>>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_in_seconds: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NetworkProfileOutboundIps {
    #[serde(
        default,
        rename = "publicIPs",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_ips: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredTraffic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdns: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceVNetAddons {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_stream_public_endpoint: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

/// The monitoring (distributed tracing) settings of a service.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSettingResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<MonitoringSettingProperties>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSettingProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_insights_instrumentation_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_insights_sampling_rate: Option<f64>,
}

/// The Eureka service registry of an enterprise service. It has no settings.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRegistryResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
