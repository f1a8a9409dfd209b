//! Wire model (plus prior state) to state.

use springcloud_shared::id::{DEFAULT_NAME, SpringCloudContainerRegistryId, SpringCloudServiceId};

use crate::{
    auth::{GitAuth, RemoteAuth},
    models::{
        BuildService, ConfigServerResource, ContainerRegistryCredentials,
        ContainerRegistryResource, GitPatternRepository, MarketplaceResource,
        MonitoringSettingProperties, NetworkProfile, ServiceResource,
    },
    resource::{
        non_empty, normalize_location,
        service::{
            AgentPoolSize, ConfigServerGitSetting, ConfigServerRepository, ContainerRegistry,
            DefaultBuildService, Marketplace, Network, OutboundType, RequiredNetworkTrafficRule,
            SpringCloudService, Trace,
        },
    },
    sensitive::Sensitive,
};

/// Everything read from Azure for one service.
#[derive(Debug, Default)]
pub(super) struct RemoteService {
    pub service: ServiceResource,
    pub monitoring: Option<MonitoringSettingProperties>,
    pub service_registry_enabled: bool,

    /// `None` when the registries were not read, the prior value is kept then.
    pub container_registries: Option<Vec<ContainerRegistryResource>>,

    /// `None` when the build service was not read, the prior value is kept then.
    pub build_service: Option<BuildService>,

    /// `None` when the agent pool was not read, the prior value is kept then.
    pub agent_pool_size: Option<String>,

    /// `None` for enterprise services, which have no config server.
    pub config_server: Option<ConfigServerResource>,
}

pub(super) fn service(
    id: &SpringCloudServiceId,
    remote: RemoteService,
    prior: Option<&SpringCloudService>,
) -> SpringCloudService {
    let RemoteService {
        service,
        monitoring,
        service_registry_enabled,
        container_registries,
        build_service,
        agent_pool_size,
        config_server,
    } = remote;
    let properties = service.properties.unwrap_or_default();
    let sku = service.sku.unwrap_or_default();
    let network_profile = properties.network_profile;

    let container_registry = match container_registries {
        Some(remote) => self::container_registries(
            remote,
            prior.map_or(&[][..], |prior| prior.container_registry.as_slice()),
        ),
        None => prior
            .map(|prior| prior.container_registry.clone())
            .unwrap_or_default(),
    };
    let default_build_service = match build_service {
        Some(build_service) => self::default_build_service(&build_service),
        None => prior.and_then(|prior| prior.default_build_service.clone()),
    };
    let config_server_git_setting = match config_server {
        Some(config_server) => config_server_git_setting(
            config_server,
            prior.and_then(|prior| prior.config_server_git_setting.as_ref()),
        ),
        None => prior.and_then(|prior| prior.config_server_git_setting.clone()),
    };

    SpringCloudService {
        id: Some(id.clone()),
        name: id.spring_name.clone(),
        resource_group_name: id.resource_group.clone(),
        location: service
            .location
            .as_deref()
            .map(normalize_location)
            .or_else(|| prior.map(|prior| prior.location.clone()))
            .unwrap_or_default(),
        sku_name: sku
            .name
            .and_then(|name| name.parse().ok())
            .or_else(|| prior.map(|prior| prior.sku_name))
            .unwrap_or_default(),
        sku_tier: sku.tier.and_then(|tier| tier.parse().ok()),
        managed_environment_id: properties
            .managed_environment_id
            .or_else(|| prior.and_then(|prior| prior.managed_environment_id.clone())),
        build_agent_pool_size: match agent_pool_size {
            Some(size) => size.parse::<AgentPoolSize>().ok(),
            None => prior.and_then(|prior| prior.build_agent_pool_size),
        },
        container_registry,
        default_build_service,
        log_stream_public_endpoint_enabled: properties
            .vnet_addons
            .and_then(|addons| addons.log_stream_public_endpoint)
            .or_else(|| prior.map(|prior| prior.log_stream_public_endpoint_enabled))
            .unwrap_or(false),
        marketplace: properties.marketplace_resource.map(marketplace),
        network: network_profile.as_ref().and_then(network),
        config_server_git_setting,
        trace: monitoring.and_then(trace),
        service_registry_enabled,
        zone_redundant: properties.zone_redundant.unwrap_or(false),
        tags: service.tags.unwrap_or_default(),
        service_registry_id: if service_registry_enabled {
            id.service_registry(DEFAULT_NAME).to_string()
        } else {
            String::new()
        },
        outbound_public_ip_addresses: network_profile
            .as_ref()
            .and_then(|profile| profile.outbound_ips.as_ref())
            .and_then(|ips| ips.public_ips.clone())
            .unwrap_or_default(),
        required_network_traffic_rules: network_profile
            .map(required_network_traffic_rules)
            .unwrap_or_default(),
    }
}

fn marketplace(marketplace: MarketplaceResource) -> Marketplace {
    Marketplace {
        plan: marketplace.plan.unwrap_or_default(),
        publisher: marketplace.publisher.unwrap_or_default(),
        product: marketplace.product.unwrap_or_default(),
    }
}

/// Returns `None` when nothing of the network is configured.
pub(super) fn network(profile: &NetworkProfile) -> Option<Network> {
    let cidr_ranges = profile
        .service_cidr
        .as_deref()
        .filter(|cidr| !cidr.is_empty())
        .map(|cidr| cidr.split(',').map(str::to_owned).collect::<Vec<_>>())
        .unwrap_or_default();
    let network = Network {
        app_subnet_id: profile.app_subnet_id.clone().unwrap_or_default(),
        service_runtime_subnet_id: profile.service_runtime_subnet_id.clone().unwrap_or_default(),
        cidr_ranges,
        app_network_resource_group: profile
            .app_network_resource_group
            .as_deref()
            .and_then(non_empty),
        service_runtime_network_resource_group: profile
            .service_runtime_network_resource_group
            .as_deref()
            .and_then(non_empty),
        outbound_type: profile
            .outbound_type
            .as_deref()
            .and_then(|outbound_type| outbound_type.parse().ok())
            .unwrap_or(OutboundType::LoadBalancer),
        read_timeout_seconds: profile
            .ingress_config
            .as_ref()
            .and_then(|ingress| ingress.read_timeout_in_seconds)
            .and_then(|seconds| u32::try_from(seconds).ok())
            .filter(|seconds| *seconds != 0),
    };

    let unset = network.app_subnet_id.is_empty()
        && network.service_runtime_subnet_id.is_empty()
        && network.app_network_resource_group.is_none()
        && network.service_runtime_network_resource_group.is_none()
        && network.cidr_ranges.is_empty();
    (!unset).then_some(network)
}

fn required_network_traffic_rules(profile: NetworkProfile) -> Vec<RequiredNetworkTrafficRule> {
    profile
        .required_traffics
        .unwrap_or_default()
        .into_iter()
        .map(|traffic| RequiredNetworkTrafficRule {
            protocol: traffic.protocol.unwrap_or_default(),
            port: traffic.port.unwrap_or_default(),
            ip_addresses: traffic.ips.unwrap_or_default(),
            fqdns: traffic.fqdns.unwrap_or_default(),
            direction: traffic.direction.unwrap_or_default(),
        })
        .collect()
}

/// Returns `None` unless tracing is enabled.
pub(super) fn trace(properties: MonitoringSettingProperties) -> Option<Trace> {
    if !properties.trace_enabled.unwrap_or(false) {
        return None;
    }
    Some(Trace {
        connection_string: properties
            .app_insights_instrumentation_key
            .filter(|key| !key.is_empty()),
        sample_rate: properties.app_insights_sampling_rate.unwrap_or_default(),
    })
}

/// Restores the secrets of the git setting from `prior`. The top-level authentication and each
/// repository (by name) are matched separately.
pub(super) fn config_server_git_setting(
    resource: ConfigServerResource,
    prior: Option<&ConfigServerGitSetting>,
) -> Option<ConfigServerGitSetting> {
    let git = resource.properties?.config_server?.git_property?;

    let prior_auth = prior.and_then(|prior| {
        GitAuth::from_blocks(
            "config_server_git_setting",
            prior.http_basic_auth.as_ref(),
            prior.ssh_auth.as_ref(),
        )
        .ok()
    });
    let (http_basic_auth, ssh_auth) = RemoteAuth::from(&git.credentials)
        .restore(prior_auth.as_ref())
        .into_blocks();

    let repository = git
        .repositories
        .unwrap_or_default()
        .into_iter()
        .map(|remote| {
            let prior = prior.and_then(|prior| {
                prior
                    .repository
                    .iter()
                    .find(|repository| Some(&repository.name) == remote.name.as_ref())
            });
            config_server_repository(remote, prior)
        })
        .collect();

    Some(ConfigServerGitSetting {
        uri: git.uri.unwrap_or_default(),
        label: git.label.filter(|label| !label.is_empty()),
        search_paths: git.search_paths.unwrap_or_default(),
        http_basic_auth,
        ssh_auth,
        repository,
    })
}

fn config_server_repository(
    remote: GitPatternRepository,
    prior: Option<&ConfigServerRepository>,
) -> ConfigServerRepository {
    let prior_auth = prior.and_then(|prior| {
        GitAuth::from_blocks(
            &prior.name,
            prior.http_basic_auth.as_ref(),
            prior.ssh_auth.as_ref(),
        )
        .ok()
    });
    let (http_basic_auth, ssh_auth) = RemoteAuth::from(&remote.credentials)
        .restore(prior_auth.as_ref())
        .into_blocks();

    ConfigServerRepository {
        name: remote.name.unwrap_or_default(),
        uri: remote.uri.unwrap_or_default(),
        label: remote.label.filter(|label| !label.is_empty()),
        pattern: remote.pattern.unwrap_or_default(),
        search_paths: remote.search_paths.unwrap_or_default(),
        http_basic_auth,
        ssh_auth,
    }
}

/// Passwords are taken from the `prior` registry of the same name. Registries known to `prior`
/// keep their position, new ones are appended in remote order.
pub(super) fn container_registries(
    remote: Vec<ContainerRegistryResource>,
    prior: &[ContainerRegistry],
) -> Vec<ContainerRegistry> {
    let mut registries = remote
        .into_iter()
        .map(|resource| {
            let name = resource.name.unwrap_or_default();
            let credentials = resource
                .properties
                .and_then(|properties| properties.credentials)
                .map(|ContainerRegistryCredentials::BasicAuth(basic)| basic)
                .unwrap_or_default();
            let password = prior
                .iter()
                .find(|prior| prior.name == name)
                .map(|prior| prior.password.clone())
                .unwrap_or_default();

            ContainerRegistry {
                name,
                server: credentials.server.unwrap_or_default(),
                username: credentials.username.unwrap_or_default(),
                password,
            }
        })
        .collect::<Vec<_>>();

    registries.sort_by_key(|registry| {
        prior
            .iter()
            .position(|prior| prior.name == registry.name)
            .unwrap_or(usize::MAX)
    });
    registries
}

fn default_build_service(build_service: &BuildService) -> Option<DefaultBuildService> {
    let registry_id = build_service
        .properties
        .as_ref()?
        .container_registry
        .as_deref()?;
    let registry_id = SpringCloudContainerRegistryId::parse_insensitively(registry_id).ok()?;
    Some(DefaultBuildService {
        container_registry_name: registry_id.container_registry_name,
    })
}
