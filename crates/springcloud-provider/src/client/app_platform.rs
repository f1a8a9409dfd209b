use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use snafu::ResultExt;
use springcloud_shared::id::{
    DEFAULT_NAME, SpringCloudBuildServiceAgentPoolId, SpringCloudBuildServiceId,
    SpringCloudConfigurationServiceId, SpringCloudContainerRegistryId,
    SpringCloudCustomizedAcceleratorId, SpringCloudServiceId, SpringCloudServiceRegistryId,
};

use crate::{
    client::{DecodeSnafu, EncodeSnafu, Error, Operation, ResourceManager},
    models::{
        BuildService, BuildServiceAgentPoolResource, ConfigServerResource,
        ConfigurationServiceResource, ContainerRegistryResource, CustomizedAcceleratorResource,
        MonitoringSettingResource, ServiceRegistryResource, ServiceResource,
    },
};

/// Typed access to the `Microsoft.AppPlatform` resources.
#[derive(Clone)]
pub struct AppPlatform {
    manager: Arc<dyn ResourceManager>,
}

impl AppPlatform {
    pub fn new(manager: Arc<dyn ResourceManager>) -> Self {
        Self { manager }
    }

    async fn get<T: DeserializeOwned>(&self, id: &str) -> Result<T, Error> {
        let value = self.manager.get(id).await?;
        serde_json::from_value(value).context(DecodeSnafu { id })
    }

    async fn put<T: Serialize>(&self, id: &str, body: &T) -> Result<Operation, Error> {
        let body = serde_json::to_value(body).context(EncodeSnafu { id })?;
        self.manager.put(id, body).await
    }

    // Spring Cloud service

    pub async fn get_service(&self, id: &SpringCloudServiceId) -> Result<ServiceResource, Error> {
        self.get(&id.to_string()).await
    }

    pub async fn create_or_update_service(
        &self,
        id: &SpringCloudServiceId,
        service: &ServiceResource,
    ) -> Result<Operation, Error> {
        self.put(&id.to_string(), service).await
    }

    pub async fn update_service(
        &self,
        id: &SpringCloudServiceId,
        service: &ServiceResource,
    ) -> Result<Operation, Error> {
        let id = id.to_string();
        let body = serde_json::to_value(service).context(EncodeSnafu { id: &id })?;
        self.manager.patch(&id, body).await
    }

    pub async fn delete_service(&self, id: &SpringCloudServiceId) -> Result<Operation, Error> {
        self.manager.delete(&id.to_string()).await
    }

    // Config server and monitoring settings are singletons without an id type of their own

    pub async fn get_config_server(
        &self,
        id: &SpringCloudServiceId,
    ) -> Result<ConfigServerResource, Error> {
        self.get(&config_server_id(id)).await
    }

    pub async fn update_put_config_server(
        &self,
        id: &SpringCloudServiceId,
        config_server: &ConfigServerResource,
    ) -> Result<Operation, Error> {
        self.put(&config_server_id(id), config_server).await
    }

    pub async fn get_monitoring_settings(
        &self,
        id: &SpringCloudServiceId,
    ) -> Result<MonitoringSettingResource, Error> {
        self.get(&monitoring_settings_id(id)).await
    }

    pub async fn update_put_monitoring_settings(
        &self,
        id: &SpringCloudServiceId,
        settings: &MonitoringSettingResource,
    ) -> Result<Operation, Error> {
        self.put(&monitoring_settings_id(id), settings).await
    }

    // Service registry

    pub async fn get_service_registry(
        &self,
        id: &SpringCloudServiceRegistryId,
    ) -> Result<ServiceRegistryResource, Error> {
        self.get(&id.to_string()).await
    }

    pub async fn create_or_update_service_registry(
        &self,
        id: &SpringCloudServiceRegistryId,
    ) -> Result<Operation, Error> {
        self.manager
            .put(&id.to_string(), Value::Object(serde_json::Map::new()))
            .await
    }

    pub async fn delete_service_registry(
        &self,
        id: &SpringCloudServiceRegistryId,
    ) -> Result<Operation, Error> {
        self.manager.delete(&id.to_string()).await
    }

    // Build service

    pub async fn list_container_registries(
        &self,
        id: &SpringCloudServiceId,
    ) -> Result<Vec<ContainerRegistryResource>, Error> {
        let collection = format!("{id}/containerRegistries");
        let values = self.manager.list(&collection).await?;
        values
            .into_iter()
            .map(|value| serde_json::from_value(value).context(DecodeSnafu { id: &collection }))
            .collect()
    }

    pub async fn create_or_update_container_registry(
        &self,
        id: &SpringCloudContainerRegistryId,
        registry: &ContainerRegistryResource,
    ) -> Result<Operation, Error> {
        self.put(&id.to_string(), registry).await
    }

    pub async fn delete_container_registry(
        &self,
        id: &SpringCloudContainerRegistryId,
    ) -> Result<Operation, Error> {
        self.manager.delete(&id.to_string()).await
    }

    pub async fn get_build_service(
        &self,
        id: &SpringCloudBuildServiceId,
    ) -> Result<BuildService, Error> {
        self.get(&id.to_string()).await
    }

    pub async fn create_or_update_build_service(
        &self,
        id: &SpringCloudBuildServiceId,
        build_service: &BuildService,
    ) -> Result<Operation, Error> {
        self.put(&id.to_string(), build_service).await
    }

    pub async fn get_agent_pool(
        &self,
        id: &SpringCloudBuildServiceAgentPoolId,
    ) -> Result<BuildServiceAgentPoolResource, Error> {
        self.get(&id.to_string()).await
    }

    pub async fn update_put_agent_pool(
        &self,
        id: &SpringCloudBuildServiceAgentPoolId,
        agent_pool: &BuildServiceAgentPoolResource,
    ) -> Result<Operation, Error> {
        self.put(&id.to_string(), agent_pool).await
    }

    // Configuration service

    pub async fn get_configuration_service(
        &self,
        id: &SpringCloudConfigurationServiceId,
    ) -> Result<ConfigurationServiceResource, Error> {
        self.get(&id.to_string()).await
    }

    pub async fn create_or_update_configuration_service(
        &self,
        id: &SpringCloudConfigurationServiceId,
        configuration_service: &ConfigurationServiceResource,
    ) -> Result<Operation, Error> {
        self.put(&id.to_string(), configuration_service).await
    }

    pub async fn delete_configuration_service(
        &self,
        id: &SpringCloudConfigurationServiceId,
    ) -> Result<Operation, Error> {
        self.manager.delete(&id.to_string()).await
    }

    // Customized accelerator

    pub async fn get_customized_accelerator(
        &self,
        id: &SpringCloudCustomizedAcceleratorId,
    ) -> Result<CustomizedAcceleratorResource, Error> {
        self.get(&id.to_string()).await
    }

    pub async fn create_or_update_customized_accelerator(
        &self,
        id: &SpringCloudCustomizedAcceleratorId,
        accelerator: &CustomizedAcceleratorResource,
    ) -> Result<Operation, Error> {
        self.put(&id.to_string(), accelerator).await
    }

    pub async fn delete_customized_accelerator(
        &self,
        id: &SpringCloudCustomizedAcceleratorId,
    ) -> Result<Operation, Error> {
        self.manager.delete(&id.to_string()).await
    }
}

fn config_server_id(id: &SpringCloudServiceId) -> String {
    format!("{id}/configServers/{DEFAULT_NAME}")
}

fn monitoring_settings_id(id: &SpringCloudServiceId) -> String {
    format!("{id}/monitoringSettings/{DEFAULT_NAME}")
}
