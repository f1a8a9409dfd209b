use springcloud_shared::id::SpringCloudConfigurationServiceId;

use crate::{
    auth::RemoteAuth,
    models::{
        ConfigurationServiceGitProperty, ConfigurationServiceGitRepository,
        ConfigurationServiceProperties, ConfigurationServiceResource,
        ConfigurationServiceSettings, GitCredentials,
    },
    resource::{
        configuration_service::{
            ConfigurationServiceRepository, SpringCloudConfigurationService,
        },
        non_empty, non_empty_list,
    },
};

pub(super) fn expand(config: &SpringCloudConfigurationService) -> ConfigurationServiceResource {
    let repositories = config.repository.iter().map(expand_repository).collect();

    ConfigurationServiceResource {
        properties: Some(ConfigurationServiceProperties {
            generation: config.generation.map(|generation| generation.to_string()),
            settings: Some(ConfigurationServiceSettings {
                git_property: Some(ConfigurationServiceGitProperty {
                    repositories: Some(repositories),
                }),
                refresh_interval_in_seconds: config
                    .refresh_interval_in_seconds
                    .map(|seconds| i32::try_from(seconds).unwrap_or(i32::MAX)),
            }),
            ..ConfigurationServiceProperties::default()
        }),
        ..ConfigurationServiceResource::default()
    }
}

fn expand_repository(repository: &ConfigurationServiceRepository) -> ConfigurationServiceGitRepository {
    ConfigurationServiceGitRepository {
        name: Some(repository.name.clone()),
        patterns: Some(repository.patterns.clone()),
        uri: Some(repository.uri.clone()),
        label: Some(repository.label.clone()),
        search_paths: non_empty_list(&repository.search_paths),
        ca_cert_resource_id: repository.ca_certificate_id.as_deref().and_then(non_empty),
        credentials: GitCredentials::from(&repository.git_auth()),
    }
}

pub(super) fn flatten(
    id: &SpringCloudConfigurationServiceId,
    remote: ConfigurationServiceResource,
    prior: Option<&SpringCloudConfigurationService>,
) -> SpringCloudConfigurationService {
    let properties = remote.properties.unwrap_or_default();
    let settings = properties.settings.unwrap_or_default();
    let repository = settings
        .git_property
        .and_then(|git| git.repositories)
        .unwrap_or_default()
        .into_iter()
        .map(|remote| {
            let prior = prior.and_then(|prior| {
                prior
                    .repository
                    .iter()
                    .find(|repository| Some(&repository.name) == remote.name.as_ref())
            });
            flatten_repository(remote, prior)
        })
        .collect();

    SpringCloudConfigurationService {
        id: Some(id.clone()),
        name: id.configuration_service_name.clone(),
        spring_cloud_service_id: id.service(),
        generation: properties
            .generation
            .and_then(|generation| generation.parse().ok()),
        refresh_interval_in_seconds: settings
            .refresh_interval_in_seconds
            .and_then(|seconds| u32::try_from(seconds).ok()),
        repository,
    }
}

fn flatten_repository(
    remote: ConfigurationServiceGitRepository,
    prior: Option<&ConfigurationServiceRepository>,
) -> ConfigurationServiceRepository {
    let auth = RemoteAuth::from(&remote.credentials)
        .restore(prior.map(ConfigurationServiceRepository::git_auth).as_ref());

    let mut repository = ConfigurationServiceRepository {
        name: remote.name.unwrap_or_default(),
        label: remote.label.unwrap_or_default(),
        patterns: remote.patterns.unwrap_or_default(),
        uri: remote.uri.unwrap_or_default(),
        search_paths: remote.search_paths.unwrap_or_default(),
        ca_certificate_id: remote.ca_cert_resource_id,
        ..ConfigurationServiceRepository::default()
    };
    repository.set_git_auth(auth);
    repository
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        resource::configuration_service::tests::configuration_service, sensitive::Sensitive,
    };

    fn masked(config: &SpringCloudConfigurationService) -> ConfigurationServiceResource {
        let mut value = serde_json::to_value(expand(config)).expect("serializable");
        for repository in value["properties"]["settings"]["gitProperty"]["repositories"]
            .as_array_mut()
            .into_iter()
            .flatten()
        {
            for key in ["password", "privateKey", "hostKey", "hostKeyAlgorithm"] {
                if repository.get(key).is_some() {
                    repository[key] = json!("*");
                }
            }
        }
        serde_json::from_value(value).expect("valid configuration service")
    }

    #[test]
    fn expanded_repository_carries_one_auth_variant() {
        let resource = expand(&configuration_service());
        let repositories = resource
            .properties
            .and_then(|properties| properties.settings)
            .and_then(|settings| settings.git_property)
            .and_then(|git| git.repositories)
            .expect("repositories are set");

        assert_eq!(repositories[0].credentials.password.as_deref(), Some("top-secret"));
        assert_eq!(repositories[0].credentials.private_key, None);
        assert_eq!(repositories[1].credentials.username, None);
        assert_eq!(repositories[1].credentials.host_key_algorithm.as_deref(), Some("ssh-ed25519"));
    }

    #[test]
    fn flatten_restores_secrets_by_name() {
        let config = configuration_service();
        let id = config.configuration_service_id();

        let state = flatten(&id, masked(&config), Some(&config));
        assert_eq!(
            state,
            SpringCloudConfigurationService {
                id: Some(id),
                ..config
            }
        );
    }

    #[test]
    fn flatten_without_prior_keeps_non_secrets() {
        let config = configuration_service();
        let id = config.configuration_service_id();

        let state = flatten(&id, masked(&config), None);
        assert_eq!(state.generation, config.generation);
        assert_eq!(state.refresh_interval_in_seconds, Some(60));
        assert_eq!(state.spring_cloud_service_id, config.spring_cloud_service_id);

        let basic = &state.repository[0];
        assert_eq!(basic.username.as_deref(), Some("git"));
        assert_eq!(basic.password, Some(Sensitive::default()));

        let ssh = &state.repository[1];
        assert_eq!(ssh.patterns, config.repository[1].patterns);
        assert_eq!(ssh.search_paths, config.repository[1].search_paths);
        assert_eq!(ssh.private_key, Some(Sensitive::default()));
        assert_eq!(ssh.host_key, None);
        assert_eq!(ssh.strict_host_key_checking, Some(true));
    }
}
