resource_id! {
    /// Identifies a Spring Cloud service (an Azure Spring Apps instance).
    SpringCloudServiceId in "Microsoft.AppPlatform" {
        spring_name => "spring",
    }
}

resource_id! {
    /// Identifies the service registry of a Spring Cloud service. The only supported name is
    /// `default`.
    SpringCloudServiceRegistryId in "Microsoft.AppPlatform" {
        spring_name => "spring",
        service_registry_name => "serviceRegistries",
    }
}

resource_id! {
    /// Identifies a container registry credential set attached to a Spring Cloud service.
    SpringCloudContainerRegistryId in "Microsoft.AppPlatform" {
        spring_name => "spring",
        container_registry_name => "containerRegistries",
    }
}

resource_id! {
    SpringCloudBuildServiceId in "Microsoft.AppPlatform" {
        spring_name => "spring",
        build_service_name => "buildServices",
    }
}

resource_id! {
    SpringCloudBuildServiceAgentPoolId in "Microsoft.AppPlatform" {
        spring_name => "spring",
        build_service_name => "buildServices",
        agent_pool_name => "agentPools",
    }
}

resource_id! {
    /// Identifies the (enterprise tier) configuration service of a Spring Cloud service.
    SpringCloudConfigurationServiceId in "Microsoft.AppPlatform" {
        spring_name => "spring",
        configuration_service_name => "configurationServices",
    }
}

resource_id! {
    SpringCloudAcceleratorId in "Microsoft.AppPlatform" {
        spring_name => "spring",
        application_accelerator_name => "applicationAccelerators",
    }
}

resource_id! {
    /// Identifies a customized accelerator, which is a child of an application accelerator.
    SpringCloudCustomizedAcceleratorId in "Microsoft.AppPlatform" {
        spring_name => "spring",
        application_accelerator_name => "applicationAccelerators",
        customized_accelerator_name => "customizedAccelerators",
    }
}

resource_id! {
    SubnetId in "Microsoft.Network" {
        virtual_network_name => "virtualNetworks",
        subnet_name => "subnets",
    }
}

/// The name of singleton sub-resources (service registry, build service, agent pool,
/// configuration service).
pub const DEFAULT_NAME: &str = "default";

impl SpringCloudServiceId {
    pub fn service_registry(&self, name: impl Into<String>) -> SpringCloudServiceRegistryId {
        SpringCloudServiceRegistryId::new(
            &self.subscription_id,
            &self.resource_group,
            &self.spring_name,
            name,
        )
    }

    pub fn container_registry(&self, name: impl Into<String>) -> SpringCloudContainerRegistryId {
        SpringCloudContainerRegistryId::new(
            &self.subscription_id,
            &self.resource_group,
            &self.spring_name,
            name,
        )
    }

    pub fn build_service(&self, name: impl Into<String>) -> SpringCloudBuildServiceId {
        SpringCloudBuildServiceId::new(
            &self.subscription_id,
            &self.resource_group,
            &self.spring_name,
            name,
        )
    }

    pub fn configuration_service(
        &self,
        name: impl Into<String>,
    ) -> SpringCloudConfigurationServiceId {
        SpringCloudConfigurationServiceId::new(
            &self.subscription_id,
            &self.resource_group,
            &self.spring_name,
            name,
        )
    }
}

impl SpringCloudBuildServiceId {
    pub fn agent_pool(&self, name: impl Into<String>) -> SpringCloudBuildServiceAgentPoolId {
        SpringCloudBuildServiceAgentPoolId::new(
            &self.subscription_id,
            &self.resource_group,
            &self.spring_name,
            &self.build_service_name,
            name,
        )
    }
}

impl SpringCloudConfigurationServiceId {
    pub fn service(&self) -> SpringCloudServiceId {
        SpringCloudServiceId::new(&self.subscription_id, &self.resource_group, &self.spring_name)
    }
}

impl SpringCloudAcceleratorId {
    pub fn customized_accelerator(
        &self,
        name: impl Into<String>,
    ) -> SpringCloudCustomizedAcceleratorId {
        SpringCloudCustomizedAcceleratorId::new(
            &self.subscription_id,
            &self.resource_group,
            &self.spring_name,
            &self.application_accelerator_name,
            name,
        )
    }
}

impl SpringCloudCustomizedAcceleratorId {
    pub fn accelerator(&self) -> SpringCloudAcceleratorId {
        SpringCloudAcceleratorId::new(
            &self.subscription_id,
            &self.resource_group,
            &self.spring_name,
            &self.application_accelerator_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;
    use crate::id::ParseError;

    const SERVICE_ID: &str =
        "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/resGroup1/providers/Microsoft.AppPlatform/spring/spring1";

    #[test]
    fn service_id_round_trip() {
        let id = SpringCloudServiceId::from_str(SERVICE_ID).expect("valid id");

        assert_eq!(id.subscription_id, "12345678-1234-9876-4563-123456789012");
        assert_eq!(id.resource_group, "resGroup1");
        assert_eq!(id.spring_name, "spring1");
        assert_eq!(id.to_string(), SERVICE_ID);
    }

    #[test]
    fn service_id_requires_app_platform_namespace() {
        let input = SERVICE_ID.replace("Microsoft.AppPlatform", "Microsoft.Web");
        assert!(SpringCloudServiceId::from_str(&input).is_err());
    }

    #[test]
    fn service_id_insensitively_normalizes_casing() {
        let input = SERVICE_ID
            .replace("/spring/", "/Spring/")
            .replace("resourceGroups", "resourcegroups");

        assert!(SpringCloudServiceId::from_str(&input).is_err());

        let id = SpringCloudServiceId::parse_insensitively(&input).expect("valid id");
        assert_eq!(id.to_string(), SERVICE_ID);
    }

    #[test]
    fn child_ids_are_composed_from_parent() {
        let service = SpringCloudServiceId::new("sub", "rg", "svc");

        assert_eq!(
            service.service_registry(DEFAULT_NAME).to_string(),
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc/serviceRegistries/default"
        );
        assert_eq!(
            service.build_service(DEFAULT_NAME).agent_pool(DEFAULT_NAME).to_string(),
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc/buildServices/default/agentPools/default"
        );
        assert_eq!(
            service.container_registry("acr").to_string(),
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc/containerRegistries/acr"
        );
    }

    #[test]
    fn customized_accelerator_id() {
        let input = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc/applicationAccelerators/default/customizedAccelerators/acc1";
        let id = SpringCloudCustomizedAcceleratorId::from_str(input).expect("valid id");

        assert_eq!(id.customized_accelerator_name, "acc1");
        assert_eq!(id.accelerator().customized_accelerator("acc1"), id);
        assert_eq!(id.to_string(), input);
    }

    #[rstest]
    #[case("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc")]
    #[case("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc/containerRegistries")]
    #[case("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc/serviceRegistries/default")]
    fn container_registry_id_invalid(#[case] input: &str) {
        assert!(SpringCloudContainerRegistryId::from_str(input).is_err());
    }

    #[test]
    fn subnet_id() {
        let input = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet/subnets/apps";
        let id = SubnetId::from_str(input).expect("valid id");

        assert_eq!(id.virtual_network_name, "vnet");
        assert_eq!(id.subnet_name, "apps");

        let err = SubnetId::from_str(SERVICE_ID).unwrap_err();
        assert!(matches!(err, ParseError::SegmentCount { .. } | ParseError::UnexpectedValue { .. }));
    }

    #[test]
    fn serde_uses_string_form() {
        let id = SpringCloudServiceId::new("sub", "rg", "svc");
        let json = serde_json::to_string(&id).expect("serializable");
        assert_eq!(
            json,
            "\"/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc\""
        );

        let back: SpringCloudServiceId = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back, id);
    }
}
