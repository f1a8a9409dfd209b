use snafu::{OptionExt, ResultExt, Snafu, ensure};
use springcloud_shared::id::{ParseError, SpringCloudConfigurationServiceId};
use tracing::instrument;

use crate::{
    client::{self, AppPlatform, NotFoundExt},
    resource::{
        ResourceDefinition,
        configuration_service::{SpringCloudConfigurationService, transform},
    },
    timeouts::{Phase, TimeoutError, TimeoutOverrides, Timeouts},
    validation,
};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid configuration"))]
    InvalidConfig { source: validation::Errors },

    #[snafu(display("failed to parse the configuration service id"))]
    ParseId { source: ParseError },

    #[snafu(display("failed to check whether {id} exists"))]
    CheckExisting { id: String, source: client::Error },

    #[snafu(display("{id} already exists, it has to be imported to be managed"))]
    AlreadyExists { id: String },

    #[snafu(display("{id} does not exist"))]
    Missing { id: String },

    #[snafu(display("moving {id} to another service requires replacing it"))]
    RequiresReplacement { id: String },

    #[snafu(display("failed to update {id}"))]
    Update { id: String, source: client::Error },

    #[snafu(display("failed waiting for the update of {id}"))]
    WaitForUpdate { id: String, source: client::Error },

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

/// Creates, reads, updates and deletes `spring_cloud_configuration_service` resources.
#[derive(Clone)]
pub struct ConfigurationServiceReconciler {
    client: AppPlatform,
    timeouts: Timeouts,
}

impl ConfigurationServiceReconciler {
    pub fn new(client: AppPlatform) -> Self {
        Self {
            client,
            timeouts: SpringCloudConfigurationService::DEFAULT_TIMEOUTS,
        }
    }

    pub fn with_timeouts(mut self, overrides: &TimeoutOverrides) -> Self {
        self.timeouts = self.timeouts.with_overrides(overrides);
        self
    }

    #[instrument(skip_all, fields(service = %config.spring_cloud_service_id))]
    pub async fn create(
        &self,
        config: &SpringCloudConfigurationService,
    ) -> Result<SpringCloudConfigurationService, Error> {
        config.validate().context(InvalidConfigSnafu)?;
        let id = config.configuration_service_id();

        let create = async {
            let existing = self
                .client
                .get_configuration_service(&id)
                .await
                .optional()
                .context(CheckExistingSnafu { id: id.to_string() })?;
            ensure!(existing.is_none(), AlreadyExistsSnafu { id: id.to_string() });

            self.put(&id, config).await
        };
        self.timeouts
            .limit(Phase::Create, create)
            .await
            .context(TimeoutSnafu { id: id.to_string() })?
    }

    #[instrument(skip_all, fields(%id))]
    pub async fn read(
        &self,
        id: &SpringCloudConfigurationServiceId,
        prior: Option<&SpringCloudConfigurationService>,
    ) -> Result<Option<SpringCloudConfigurationService>, Error> {
        self.timeouts
            .limit(Phase::Read, self.read_remote(id, prior))
            .await
            .context(TimeoutSnafu { id: id.to_string() })?
    }

    #[instrument(skip_all, fields(service = %config.spring_cloud_service_id))]
    pub async fn update(
        &self,
        prior: &SpringCloudConfigurationService,
        config: &SpringCloudConfigurationService,
    ) -> Result<SpringCloudConfigurationService, Error> {
        config.validate().context(InvalidConfigSnafu)?;
        let id = config.configuration_service_id();
        ensure!(
            prior.configuration_service_id() == id,
            RequiresReplacementSnafu {
                id: prior.configuration_service_id().to_string()
            }
        );

        self.timeouts
            .limit(Phase::Update, self.put(&id, config))
            .await
            .context(TimeoutSnafu { id: id.to_string() })?
    }

    #[instrument(skip_all, fields(service = %state.spring_cloud_service_id))]
    pub async fn delete(&self, state: &SpringCloudConfigurationService) -> Result<(), Error> {
        let id = state.configuration_service_id();

        let delete = async {
            match self
                .client
                .delete_configuration_service(&id)
                .await
                .optional()
                .context(DeleteSnafu { id: id.to_string() })?
            {
                Some(operation) => {
                    operation
                        .wait()
                        .await
                        .optional()
                        .context(WaitForDeletionSnafu { id: id.to_string() })?;
                }
                None => tracing::info!(%id, "configuration service was already deleted"),
            }
            Ok::<_, Error>(())
        };
        self.timeouts
            .limit(Phase::Delete, delete)
            .await
            .context(TimeoutSnafu { id: id.to_string() })?
    }

    #[instrument(skip(self))]
    pub async fn import(&self, id: &str) -> Result<SpringCloudConfigurationService, Error> {
        let id: SpringCloudConfigurationServiceId = id.parse().context(ParseIdSnafu)?;
        self.read(&id, None)
            .await?
            .context(MissingSnafu { id: id.to_string() })
    }

    async fn put(
        &self,
        id: &SpringCloudConfigurationServiceId,
        config: &SpringCloudConfigurationService,
    ) -> Result<SpringCloudConfigurationService, Error> {
        self.client
            .create_or_update_configuration_service(id, &transform::expand(config))
            .await
            .context(UpdateSnafu { id: id.to_string() })?
            .wait()
            .await
            .context(WaitForUpdateSnafu { id: id.to_string() })?;

        self.read_remote(id, Some(config))
            .await?
            .context(VanishedSnafu { id: id.to_string() })
    }

    async fn read_remote(
        &self,
        id: &SpringCloudConfigurationServiceId,
        prior: Option<&SpringCloudConfigurationService>,
    ) -> Result<Option<SpringCloudConfigurationService>, Error> {
        let remote = self
            .client
            .get_configuration_service(id)
            .await
            .optional()
            .context(RetrieveSnafu { id: id.to_string() })?;

        match remote {
            Some(remote) => Ok(Some(transform::flatten(id, remote, prior))),
            None => {
                tracing::info!(%id, "configuration service no longer exists, removing it from state");
                Ok(None)
            }
        }
    }
}
