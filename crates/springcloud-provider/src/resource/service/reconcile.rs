use std::fmt::Display;

use async_trait::async_trait;
use snafu::{OptionExt, ResultExt, Snafu, ensure};
use springcloud_shared::id::{DEFAULT_NAME, ParseError, SpringCloudServiceId};
use tracing::instrument;

use crate::{
    client::{self, AppPlatform, NotFoundExt},
    models::{
        BuildService, BuildServiceAgentPoolResource, ConfigServerResource,
        ContainerRegistryResource, MonitoringSettingResource, ServiceResource,
    },
    resource::{
        ResourceDefinition, normalize_location,
        service::{
            SkuName, SpringCloudService, expand,
            flatten::{self, RemoteService},
        },
    },
    saga::{self, Step},
    timeouts::{Phase, TimeoutError, TimeoutOverrides, Timeouts},
    validation,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid configuration"))]
    InvalidConfig { source: validation::Errors },

    #[snafu(display("failed to expand the configuration"))]
    Expand { source: validation::Error },

    #[snafu(display("failed to parse the service id"))]
    ParseId { source: ParseError },

    #[snafu(display("failed to check whether {id} exists"))]
    CheckExisting { id: String, source: client::Error },

    #[snafu(display("{id} already exists, it has to be imported to be managed"))]
    AlreadyExists { id: String },

    #[snafu(display("{id} does not exist"))]
    Missing { id: String },

    #[snafu(display("changing {} of {id} requires replacing the service", fields.join(", ")))]
    RequiresReplacement {
        id: String,
        fields: Vec<&'static str>,
    },

    #[snafu(display("failed to create {id}"))]
    Create { id: String, source: client::Error },

    #[snafu(display("failed waiting for creation of {id}"))]
    WaitForCreation { id: String, source: client::Error },

    #[snafu(display("failed to update the tags of {id}"))]
    UpdateTags { id: String, source: client::Error },

    #[snafu(display("failed waiting for the tag update of {id}"))]
    WaitForTags { id: String, source: client::Error },

    #[snafu(display("failed to update the config server of {id}"))]
    UpdateConfigServer { id: String, source: client::Error },

    #[snafu(display("failed waiting for the config server update of {id}"))]
    WaitForConfigServer { id: String, source: client::Error },

    #[snafu(display("failed to retrieve the config server of {id}"))]
    RetrieveConfigServer { id: String, source: client::Error },

    #[snafu(display("the config server of {id} reports {code}: {message}"))]
    ConfigServer {
        id: String,
        code: String,
        message: String,
    },

    #[snafu(display("failed to update the monitoring settings of {id}"))]
    UpdateMonitoring { id: String, source: client::Error },

    #[snafu(display("failed waiting for the monitoring settings update of {id}"))]
    WaitForMonitoring { id: String, source: client::Error },

    #[snafu(display("failed to retrieve the monitoring settings of {id}"))]
    RetrieveMonitoring { id: String, source: client::Error },

    #[snafu(display("failed to create service registry {id}"))]
    CreateServiceRegistry { id: String, source: client::Error },

    #[snafu(display("failed waiting for creation of service registry {id}"))]
    WaitForServiceRegistry { id: String, source: client::Error },

    #[snafu(display("failed to delete service registry {id}"))]
    DeleteServiceRegistry { id: String, source: client::Error },

    #[snafu(display("failed waiting for deletion of service registry {id}"))]
    WaitForServiceRegistryDeletion { id: String, source: client::Error },

    #[snafu(display("failed to retrieve service registry {id}"))]
    RetrieveServiceRegistry { id: String, source: client::Error },

    #[snafu(display("failed to list the container registries of {id}"))]
    ListContainerRegistries { id: String, source: client::Error },

    #[snafu(display("failed to delete container registry {id}"))]
    DeleteContainerRegistry { id: String, source: client::Error },

    #[snafu(display("failed waiting for deletion of container registry {id}"))]
    WaitForContainerRegistryDeletion { id: String, source: client::Error },

    #[snafu(display("failed to update container registry {id}"))]
    UpdateContainerRegistry { id: String, source: client::Error },

    #[snafu(display("failed waiting for the update of container registry {id}"))]
    WaitForContainerRegistry { id: String, source: client::Error },

    #[snafu(display("failed to update build service {id}"))]
    UpdateBuildService { id: String, source: client::Error },

    #[snafu(display("failed waiting for the update of build service {id}"))]
    WaitForBuildService { id: String, source: client::Error },

    #[snafu(display("failed to update agent pool {id}"))]
    UpdateAgentPool { id: String, source: client::Error },

    #[snafu(display("failed waiting for the update of agent pool {id}"))]
    WaitForAgentPool { id: String, source: client::Error },

    #[snafu(display("failed to retrieve {id}"))]
    Retrieve { id: String, source: client::Error },

    #[snafu(display("{id} disappeared right after it was reconciled"))]
    Vanished { id: String },

    #[snafu(display("failed to delete {id}"))]
    Delete { id: String, source: client::Error },

    #[snafu(display("failed waiting for deletion of {id}"))]
    WaitForDeletion { id: String, source: client::Error },

    #[snafu(display("gave up on {id}"))]
    Timeout { id: String, source: TimeoutError },
}

/// One remote mutation of a service reconciliation, carrying its expanded request body.
#[derive(Debug)]
enum ServiceStep {
    CreateService(ServiceResource),
    UpdateTags(ServiceResource),
    PutConfigServer(ConfigServerResource),
    PutMonitoringSettings(MonitoringSettingResource),
    CreateServiceRegistry,
    DeleteServiceRegistry,

    /// Deletes every remote container registry whose name is not in `keep`.
    PruneContainerRegistries {
        keep: Vec<String>,
    },
    PutContainerRegistry {
        name: String,
        body: ContainerRegistryResource,
    },
    PutBuildService(BuildService),
    PutAgentPool(BuildServiceAgentPoolResource),
}

impl Display for ServiceStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateService(_) => f.write_str("create service"),
            Self::UpdateTags(_) => f.write_str("update tags"),
            Self::PutConfigServer(_) => f.write_str("put config server"),
            Self::PutMonitoringSettings(_) => f.write_str("put monitoring settings"),
            Self::CreateServiceRegistry => f.write_str("create service registry"),
            Self::DeleteServiceRegistry => f.write_str("delete service registry"),
            Self::PruneContainerRegistries { .. } => f.write_str("prune container registries"),
            Self::PutContainerRegistry { name, .. } => write!(f, "put container registry {name}"),
            Self::PutBuildService(_) => f.write_str("put build service"),
            Self::PutAgentPool(_) => f.write_str("put agent pool"),
        }
    }
}

struct ServiceContext {
    client: AppPlatform,
    id: SpringCloudServiceId,
}

#[async_trait]
impl Step for ServiceStep {
    type Context = ServiceContext;
    type Error = Error;

    async fn apply(&self, context: &ServiceContext) -> Result<(), Error> {
        let ServiceContext { client, id } = context;

        match self {
            Self::CreateService(body) => client
                .create_or_update_service(id, body)
                .await
                .context(CreateSnafu { id: id.to_string() })?
                .wait()
                .await
                .context(WaitForCreationSnafu { id: id.to_string() }),
            Self::UpdateTags(body) => client
                .update_service(id, body)
                .await
                .context(UpdateTagsSnafu { id: id.to_string() })?
                .wait()
                .await
                .context(WaitForTagsSnafu { id: id.to_string() }),
            Self::PutConfigServer(body) => {
                client
                    .update_put_config_server(id, body)
                    .await
                    .context(UpdateConfigServerSnafu { id: id.to_string() })?
                    .wait()
                    .await
                    .context(WaitForConfigServerSnafu { id: id.to_string() })?;

                // The operation succeeds even if the repository can't be reached, the problem
                // is only reported in the properties
                let config_server = client
                    .get_config_server(id)
                    .await
                    .context(RetrieveConfigServerSnafu { id: id.to_string() })?;
                match config_server.properties.and_then(|properties| properties.error) {
                    Some(error) => ConfigServerSnafu {
                        id: id.to_string(),
                        code: error.code.unwrap_or_default(),
                        message: error.message.unwrap_or_default(),
                    }
                    .fail(),
                    None => Ok(()),
                }
            }
            Self::PutMonitoringSettings(body) => client
                .update_put_monitoring_settings(id, body)
                .await
                .context(UpdateMonitoringSnafu { id: id.to_string() })?
                .wait()
                .await
                .context(WaitForMonitoringSnafu { id: id.to_string() }),
            Self::CreateServiceRegistry => {
                let registry_id = id.service_registry(DEFAULT_NAME);
                client
                    .create_or_update_service_registry(&registry_id)
                    .await
                    .context(CreateServiceRegistrySnafu {
                        id: registry_id.to_string(),
                    })?
                    .wait()
                    .await
                    .context(WaitForServiceRegistrySnafu {
                        id: registry_id.to_string(),
                    })
            }
            Self::DeleteServiceRegistry => {
                let registry_id = id.service_registry(DEFAULT_NAME);
                let operation = client
                    .delete_service_registry(&registry_id)
                    .await
                    .optional()
                    .context(DeleteServiceRegistrySnafu {
                        id: registry_id.to_string(),
                    })?;
                match operation {
                    Some(operation) => operation.wait().await.optional().map(|_| ()).context(
                        WaitForServiceRegistryDeletionSnafu {
                            id: registry_id.to_string(),
                        },
                    ),
                    None => Ok(()),
                }
            }
            Self::PruneContainerRegistries { keep } => {
                let remote = client
                    .list_container_registries(id)
                    .await
                    .context(ListContainerRegistriesSnafu { id: id.to_string() })?;
                let obsolete = remote
                    .into_iter()
                    .filter_map(|registry| registry.name)
                    .filter(|name| !keep.contains(name));

                for name in obsolete {
                    let registry_id = id.container_registry(name);
                    tracing::debug!(id = %registry_id, "deleting container registry");
                    client
                        .delete_container_registry(&registry_id)
                        .await
                        .context(DeleteContainerRegistrySnafu {
                            id: registry_id.to_string(),
                        })?
                        .wait()
                        .await
                        .context(WaitForContainerRegistryDeletionSnafu {
                            id: registry_id.to_string(),
                        })?;
                }
                Ok(())
            }
            Self::PutContainerRegistry { name, body } => {
                let registry_id = id.container_registry(name);
                client
                    .create_or_update_container_registry(&registry_id, body)
                    .await
                    .context(UpdateContainerRegistrySnafu {
                        id: registry_id.to_string(),
                    })?
                    .wait()
                    .await
                    .context(WaitForContainerRegistrySnafu {
                        id: registry_id.to_string(),
                    })
            }
            Self::PutBuildService(body) => {
                let build_service_id = id.build_service(DEFAULT_NAME);
                client
                    .create_or_update_build_service(&build_service_id, body)
                    .await
                    .context(UpdateBuildServiceSnafu {
                        id: build_service_id.to_string(),
                    })?
                    .wait()
                    .await
                    .context(WaitForBuildServiceSnafu {
                        id: build_service_id.to_string(),
                    })
            }
            Self::PutAgentPool(body) => {
                let agent_pool_id = id.build_service(DEFAULT_NAME).agent_pool(DEFAULT_NAME);
                client
                    .update_put_agent_pool(&agent_pool_id, body)
                    .await
                    .context(UpdateAgentPoolSnafu {
                        id: agent_pool_id.to_string(),
                    })?
                    .wait()
                    .await
                    .context(WaitForAgentPoolSnafu {
                        id: agent_pool_id.to_string(),
                    })
            }
        }
    }
}

/// The steps of the build service, which only exists for enterprise services. They are issued
/// on every update because the remote side is not compared.
fn build_service_steps(
    id: &SpringCloudServiceId,
    config: &SpringCloudService,
    steps: &mut Vec<ServiceStep>,
) {
    if config.sku_name == SkuName::E0 {
        steps.push(ServiceStep::PruneContainerRegistries {
            keep: config
                .container_registry
                .iter()
                .map(|registry| registry.name.clone())
                .collect(),
        });
        steps.extend(
            config
                .container_registry
                .iter()
                .map(|registry| ServiceStep::PutContainerRegistry {
                    name: registry.name.clone(),
                    body: expand::container_registry(registry),
                }),
        );
        steps.push(ServiceStep::PutBuildService(expand::build_service(
            id,
            config.default_build_service.as_ref(),
        )));
    }

    if let Some(size) = config.build_agent_pool_size {
        steps.push(ServiceStep::PutAgentPool(expand::agent_pool(size)));
    }
}

fn plan_create(
    id: &SpringCloudServiceId,
    config: &SpringCloudService,
) -> Result<Vec<ServiceStep>, Error> {
    let mut steps = vec![ServiceStep::CreateService(expand::service(config))];

    if config.sku_name != SkuName::E0 {
        steps.push(ServiceStep::PutConfigServer(
            expand::config_server(config.config_server_git_setting.as_ref())
                .context(ExpandSnafu)?,
        ));
    }
    steps.push(ServiceStep::PutMonitoringSettings(
        expand::monitoring_settings(config.trace.as_ref()),
    ));
    if config.service_registry_enabled {
        steps.push(ServiceStep::CreateServiceRegistry);
    }
    build_service_steps(id, config, &mut steps);

    Ok(steps)
}

fn plan_update(
    id: &SpringCloudServiceId,
    prior: &SpringCloudService,
    config: &SpringCloudService,
) -> Result<Vec<ServiceStep>, Error> {
    let mut steps = Vec::new();

    if config.tags != prior.tags {
        steps.push(ServiceStep::UpdateTags(expand::tags_update(config)));
    }
    if config.sku_name != SkuName::E0
        && config.config_server_git_setting != prior.config_server_git_setting
    {
        steps.push(ServiceStep::PutConfigServer(
            expand::config_server(config.config_server_git_setting.as_ref())
                .context(ExpandSnafu)?,
        ));
    }
    if config.trace != prior.trace {
        steps.push(ServiceStep::PutMonitoringSettings(
            expand::monitoring_settings(config.trace.as_ref()),
        ));
    }
    match (prior.service_registry_enabled, config.service_registry_enabled) {
        (false, true) => steps.push(ServiceStep::CreateServiceRegistry),
        (true, false) => steps.push(ServiceStep::DeleteServiceRegistry),
        _ => {}
    }
    build_service_steps(id, config, &mut steps);

    Ok(steps)
}

/// Returns the fields whose change can only be applied by recreating the service.
fn replacement_fields(prior: &SpringCloudService, config: &SpringCloudService) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if prior.name != config.name {
        fields.push("name");
    }
    if prior.resource_group_name != config.resource_group_name {
        fields.push("resource_group_name");
    }
    if normalize_location(&prior.location) != normalize_location(&config.location) {
        fields.push("location");
    }
    if prior.sku_name != config.sku_name {
        fields.push("sku_name");
    }
    if config.sku_tier.is_some() && prior.sku_tier != config.sku_tier {
        fields.push("sku_tier");
    }
    if prior.network != config.network {
        fields.push("network");
    }
    fields
}

/// Warns about changes which the service only accepts on creation.
fn warn_about_ignored_changes(
    id: &SpringCloudServiceId,
    prior: &SpringCloudService,
    config: &SpringCloudService,
) {
    let ignored = [
        ("zone_redundant", prior.zone_redundant != config.zone_redundant),
        ("marketplace", prior.marketplace != config.marketplace),
        (
            "log_stream_public_endpoint_enabled",
            prior.log_stream_public_endpoint_enabled != config.log_stream_public_endpoint_enabled,
        ),
        (
            "managed_environment_id",
            prior.managed_environment_id != config.managed_environment_id,
        ),
    ];
    for (field, _) in ignored.iter().filter(|(_, changed)| *changed) {
        tracing::warn!(%id, field, "changes of this field are only applied when the service is created");
    }
}

/// Creates, reads, updates and deletes `spring_cloud_service` resources.
#[derive(Clone)]
pub struct ServiceReconciler {
    client: AppPlatform,
    subscription_id: String,
    timeouts: Timeouts,
}

impl ServiceReconciler {
    pub fn new(client: AppPlatform, subscription_id: impl Into<String>) -> Self {
        Self {
            client,
            subscription_id: subscription_id.into(),
            timeouts: SpringCloudService::DEFAULT_TIMEOUTS,
        }
    }

    pub fn with_timeouts(mut self, overrides: &TimeoutOverrides) -> Self {
        self.timeouts = self.timeouts.with_overrides(overrides);
        self
    }

    fn context(&self, id: &SpringCloudServiceId) -> ServiceContext {
        ServiceContext {
            client: self.client.clone(),
            id: id.clone(),
        }
    }

    /// Creates the service and all of its sub-resources and returns the new state.
    ///
    /// Fails if the service already exists.
    #[instrument(skip_all, fields(name = %config.name))]
    pub async fn create(&self, config: &SpringCloudService) -> Result<SpringCloudService, Error> {
        config.validate().context(InvalidConfigSnafu)?;
        let id = config.service_id(&self.subscription_id);

        let create = async {
            let existing = self
                .client
                .get_service(&id)
                .await
                .optional()
                .context(CheckExistingSnafu { id: id.to_string() })?;
            ensure!(existing.is_none(), AlreadyExistsSnafu { id: id.to_string() });

            let steps = plan_create(&id, config)?;
            saga::run(&steps, &self.context(&id)).await?;

            self.read_remote(&id, Some(config))
                .await?
                .context(VanishedSnafu { id: id.to_string() })
        };
        self.timeouts
            .limit(Phase::Create, create)
            .await
            .context(TimeoutSnafu { id: id.to_string() })?
    }

    /// Reads the service. Returns `None` if it no longer exists, in which case it has to be
    /// removed from the state.
    #[instrument(skip_all, fields(%id))]
    pub async fn read(
        &self,
        id: &SpringCloudServiceId,
        prior: Option<&SpringCloudService>,
    ) -> Result<Option<SpringCloudService>, Error> {
        self.timeouts
            .limit(Phase::Read, self.read_remote(id, prior))
            .await
            .context(TimeoutSnafu { id: id.to_string() })?
    }

    /// Moves the service from `prior` to `config` and returns the new state.
    #[instrument(skip_all, fields(name = %config.name))]
    pub async fn update(
        &self,
        prior: &SpringCloudService,
        config: &SpringCloudService,
    ) -> Result<SpringCloudService, Error> {
        config.validate().context(InvalidConfigSnafu)?;
        let id = config.service_id(&self.subscription_id);

        let fields = replacement_fields(prior, config);
        ensure!(
            fields.is_empty(),
            RequiresReplacementSnafu {
                id: id.to_string(),
                fields
            }
        );
        warn_about_ignored_changes(&id, prior, config);

        let update = async {
            let steps = plan_update(&id, prior, config)?;
            saga::run(&steps, &self.context(&id)).await?;

            self.read_remote(&id, Some(config))
                .await?
                .context(VanishedSnafu { id: id.to_string() })
        };
        self.timeouts
            .limit(Phase::Update, update)
            .await
            .context(TimeoutSnafu { id: id.to_string() })?
    }

    /// Deletes the service, its sub-resources are deleted along with it. A service that is
    /// already gone is not an error.
    #[instrument(skip_all, fields(name = %state.name))]
    pub async fn delete(&self, state: &SpringCloudService) -> Result<(), Error> {
        let id = state
            .id
            .clone()
            .unwrap_or_else(|| state.service_id(&self.subscription_id));

        let delete = async {
            let operation = self
                .client
                .delete_service(&id)
                .await
                .optional()
                .context(DeleteSnafu { id: id.to_string() })?;
            match operation {
                Some(operation) => {
                    operation
                        .wait()
                        .await
                        .optional()
                        .context(WaitForDeletionSnafu { id: id.to_string() })?;
                }
                None => tracing::info!(%id, "service was already deleted"),
            }
            Ok::<_, Error>(())
        };
        self.timeouts
            .limit(Phase::Delete, delete)
            .await
            .context(TimeoutSnafu { id: id.to_string() })?
    }

    /// Reads an existing service into a fresh state. Secrets can't be read and stay empty.
    #[instrument(skip(self))]
    pub async fn import(&self, id: &str) -> Result<SpringCloudService, Error> {
        let id: SpringCloudServiceId = id.parse().context(ParseIdSnafu)?;
        self.read(&id, None)
            .await?
            .context(MissingSnafu { id: id.to_string() })
    }

    async fn read_remote(
        &self,
        id: &SpringCloudServiceId,
        prior: Option<&SpringCloudService>,
    ) -> Result<Option<SpringCloudService>, Error> {
        let Some(service) = self
            .client
            .get_service(id)
            .await
            .optional()
            .context(RetrieveSnafu { id: id.to_string() })?
        else {
            tracing::info!(%id, "service no longer exists, removing it from state");
            return Ok(None);
        };

        let monitoring = self
            .client
            .get_monitoring_settings(id)
            .await
            .context(RetrieveMonitoringSnafu { id: id.to_string() })?
            .properties;

        let registry_id = id.service_registry(DEFAULT_NAME);
        let service_registry_enabled = self
            .client
            .get_service_registry(&registry_id)
            .await
            .optional()
            .context(RetrieveServiceRegistrySnafu {
                id: registry_id.to_string(),
            })?
            .is_some();

        let sku_name = service
            .sku
            .as_ref()
            .and_then(|sku| sku.name.as_deref())
            .and_then(|name| name.parse::<SkuName>().ok());

        let mut remote = RemoteService {
            service,
            monitoring,
            service_registry_enabled,
            ..RemoteService::default()
        };

        if sku_name == Some(SkuName::E0) {
            self.read_build_service(id, &mut remote).await;
        } else {
            let config_server = self
                .client
                .get_config_server(id)
                .await
                .optional()
                .context(RetrieveConfigServerSnafu { id: id.to_string() })?;
            remote.config_server = Some(config_server.unwrap_or_default());
        }

        Ok(Some(flatten::service(id, remote, prior)))
    }

    /// Reads the build service related sub-resources. Failures are tolerated, the prior value
    /// is kept for whatever could not be read.
    async fn read_build_service(&self, id: &SpringCloudServiceId, remote: &mut RemoteService) {
        match self.client.list_container_registries(id).await {
            Ok(registries) => remote.container_registries = Some(registries),
            Err(err) => tracing::warn!(%err, %id, "failed to list container registries"),
        }

        let build_service_id = id.build_service(DEFAULT_NAME);
        match self.client.get_build_service(&build_service_id).await.optional() {
            Ok(build_service) => remote.build_service = Some(build_service.unwrap_or_default()),
            Err(err) => tracing::warn!(%err, id = %build_service_id, "failed to read build service"),
        }

        let agent_pool_id = build_service_id.agent_pool(DEFAULT_NAME);
        match self.client.get_agent_pool(&agent_pool_id).await.optional() {
            Ok(agent_pool) => {
                remote.agent_pool_size = Some(
                    agent_pool
                        .and_then(|agent_pool| agent_pool.properties)
                        .and_then(|properties| properties.pool_size)
                        .and_then(|size| size.name)
                        .unwrap_or_default(),
                );
            }
            Err(err) => tracing::warn!(%err, id = %agent_pool_id, "failed to read agent pool"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        client::memory::{Call, InMemoryResourceManager, Method},
        resource::service::{
            AgentPoolSize, ContainerRegistry, DefaultBuildService,
            tests::{enterprise, git_setting, standard},
        },
        sensitive::Sensitive,
    };

    const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

    fn reconciler() -> (Arc<InMemoryResourceManager>, ServiceReconciler) {
        let manager = Arc::new(InMemoryResourceManager::default());
        let reconciler = ServiceReconciler::new(AppPlatform::new(manager.clone()), SUBSCRIPTION);
        (manager, reconciler)
    }

    fn registry(name: &str) -> ContainerRegistry {
        ContainerRegistry {
            name: name.to_owned(),
            server: format!("{name}.azurecr.io"),
            username: "pusher".to_owned(),
            password: Sensitive::new(format!("{name}-password")),
        }
    }

    fn service_id(config: &SpringCloudService) -> SpringCloudServiceId {
        config.service_id(SUBSCRIPTION)
    }

    #[tokio::test]
    async fn service_registry_follows_toggle() {
        let (manager, reconciler) = reconciler();
        let config = SpringCloudService {
            service_registry_enabled: true,
            ..enterprise()
        };
        let registry_id = service_id(&config).service_registry(DEFAULT_NAME).to_string();

        let state = reconciler.create(&config).await.expect("create succeeds");
        assert!(state.service_registry_enabled);
        assert_eq!(state.service_registry_id, registry_id);

        manager.clear_calls();
        let config = SpringCloudService {
            service_registry_enabled: false,
            ..config
        };
        let state = reconciler.update(&state, &config).await.expect("update succeeds");

        assert!(manager.mutations().contains(&Call {
            method: Method::Delete,
            id: registry_id,
        }));
        assert!(!state.service_registry_enabled);
        assert_eq!(state.service_registry_id, "");
    }

    #[tokio::test]
    async fn container_registries_are_synchronized_by_name() {
        let (manager, reconciler) = reconciler();
        let config = SpringCloudService {
            container_registry: vec![registry("a"), registry("b")],
            default_build_service: Some(DefaultBuildService {
                container_registry_name: "a".to_owned(),
            }),
            ..enterprise()
        };
        let id = service_id(&config);

        let state = reconciler.create(&config).await.expect("create succeeds");
        assert_eq!(state.container_registry, config.container_registry);
        assert_eq!(state.default_build_service, config.default_build_service);

        manager.clear_calls();
        let config = SpringCloudService {
            container_registry: vec![registry("a"), registry("c")],
            ..config
        };
        let state = reconciler.update(&state, &config).await.expect("update succeeds");

        let registry_calls = manager
            .mutations()
            .into_iter()
            .filter(|call| call.id.contains("/containerRegistries/"))
            .collect::<Vec<_>>();
        assert_eq!(
            registry_calls,
            vec![
                Call {
                    method: Method::Delete,
                    id: id.container_registry("b").to_string(),
                },
                Call {
                    method: Method::Put,
                    id: id.container_registry("a").to_string(),
                },
                Call {
                    method: Method::Put,
                    id: id.container_registry("c").to_string(),
                },
            ]
        );
        assert_eq!(state.container_registry, config.container_registry);
    }

    #[tokio::test]
    async fn config_server_for_enterprise_is_rejected_without_calls() {
        let (manager, reconciler) = reconciler();
        let config = SpringCloudService {
            config_server_git_setting: Some(git_setting()),
            ..enterprise()
        };

        let err = reconciler.create(&config).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert_eq!(manager.calls(), Vec::new());
    }

    #[tokio::test]
    async fn existing_service_is_not_adopted() {
        let (manager, reconciler) = reconciler();
        let config = standard();
        manager.insert(&service_id(&config).to_string(), json!({"sku": {"name": "S0"}}));

        let err = reconciler.create(&config).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(manager.mutations(), Vec::new());
    }

    #[tokio::test]
    async fn embedded_config_server_error_fails_creation() {
        let (manager, reconciler) = reconciler();
        let config = SpringCloudService {
            config_server_git_setting: Some(git_setting()),
            ..standard()
        };
        let id = service_id(&config);
        manager.merge_after_put(
            &format!("{id}/configServers/default"),
            json!({"properties": {"error": {"code": "InvalidGitRepository", "message": "authentication failed"}}}),
        );

        let err = reconciler.create(&config).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("the config server of {id} reports InvalidGitRepository: authentication failed")
        );
        assert!(
            !manager
                .mutations()
                .iter()
                .any(|call| call.id.contains("/monitoringSettings/"))
        );
    }

    #[tokio::test]
    async fn failed_operation_aborts_the_saga() {
        let (manager, reconciler) = reconciler();
        let config = SpringCloudService {
            service_registry_enabled: true,
            build_agent_pool_size: Some(AgentPoolSize::S2),
            ..enterprise()
        };
        let id = service_id(&config);
        manager.fail_operation(
            Method::Put,
            &id.service_registry(DEFAULT_NAME).to_string(),
            "quota exceeded",
        );

        let err = reconciler.create(&config).await.unwrap_err();
        assert!(matches!(err, Error::WaitForServiceRegistry { .. }));
        assert!(!manager.contains(&id.build_service(DEFAULT_NAME).to_string()));
    }

    #[tokio::test]
    async fn standard_service_round_trip() {
        let (manager, reconciler) = reconciler();
        let config = SpringCloudService {
            config_server_git_setting: Some(git_setting()),
            trace: Some(crate::resource::service::Trace {
                connection_string: Some("InstrumentationKey=abc".to_owned()),
                sample_rate: 25.0,
            }),
            tags: [("env".to_owned(), "test".to_owned())].into(),
            ..standard()
        };

        let state = reconciler.create(&config).await.expect("create succeeds");
        assert_eq!(state.config_server_git_setting, config.config_server_git_setting);
        assert_eq!(state.trace, config.trace);
        assert_eq!(state.tags, config.tags);
        assert_eq!(state.id, Some(service_id(&config)));

        // Nothing changed, nothing is sent
        manager.clear_calls();
        reconciler.update(&state, &config).await.expect("update succeeds");
        assert_eq!(manager.mutations(), Vec::new());
    }

    #[tokio::test]
    async fn replacement_fields_are_refused() {
        let (_, reconciler) = reconciler();
        let prior = standard();
        let config = SpringCloudService {
            location: "northeurope".to_owned(),
            ..standard()
        };

        let err = reconciler.update(&prior, &config).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RequiresReplacement { ref fields, .. } if fields.as_slice() == ["location"]
        ));
    }

    #[tokio::test]
    async fn delete_tolerates_missing_service() {
        let (manager, reconciler) = reconciler();
        reconciler.delete(&standard()).await.expect("delete succeeds");
        assert_eq!(manager.mutations().len(), 1);
    }

    #[tokio::test]
    async fn read_removes_missing_service() {
        let (_, reconciler) = reconciler();
        let state = reconciler
            .read(&service_id(&standard()), Some(&standard()))
            .await
            .expect("read succeeds");
        assert_eq!(state, None);
    }

    #[tokio::test]
    async fn import_reads_everything_but_secrets() {
        let (_, reconciler) = reconciler();
        let config = SpringCloudService {
            config_server_git_setting: Some(git_setting()),
            ..standard()
        };
        reconciler.create(&config).await.expect("create succeeds");

        let state = reconciler
            .import(&service_id(&config).to_string())
            .await
            .expect("import succeeds");
        let setting = state.config_server_git_setting.expect("git setting is set");
        assert_eq!(setting.uri, git_setting().uri);
        assert_eq!(
            setting.http_basic_auth.map(|auth| (auth.username, auth.password.is_empty())),
            Some(("git".to_owned(), true))
        );

        let err = reconciler
            .import("/subscriptions/sub/resourceGroups/rg")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParseId { .. }));
    }
}
