//! `spring_cloud_configuration_service`: the Application Configuration Service of an
//! enterprise Spring Cloud service, which serves configuration from git repositories.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use springcloud_shared::id::{
    DEFAULT_NAME, SpringCloudConfigurationServiceId, SpringCloudServiceId,
};

use crate::{
    auth::GitAuth,
    resource::ResourceDefinition,
    sensitive::Sensitive,
    timeouts::Timeouts,
    validation::{self, GIT_URI_PREFIXES, Validator},
};

mod reconcile;
mod transform;

pub use reconcile::{ConfigurationServiceReconciler, Error};

/// The refresh interval is an `int32` on the wire.
const MAX_REFRESH_INTERVAL_SECONDS: u32 = i32::MAX.unsigned_abs();

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    JsonSchema,
    PartialEq,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Generation {
    Gen1,
    Gen2,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct SpringCloudConfigurationService {
    /// Computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub id: Option<SpringCloudConfigurationServiceId>,

    /// Always `default`, a service has a single configuration service.
    pub name: String,

    #[schemars(with = "String")]
    pub spring_cloud_service_id: SpringCloudServiceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<Generation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval_in_seconds: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repository: Vec<ConfigurationServiceRepository>,
}

/// A git repository with flat authentication fields.
///
/// Either `username` and `password` (basic authentication) or `private_key` (SSH) may be set.
/// Without either the repository is public.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct ConfigurationServiceRepository {
    pub name: String,

    pub label: String,

    pub patterns: Vec<String>,

    pub uri: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<Sensitive>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<Sensitive>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key: Option<Sensitive>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key_algorithm: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_host_key_checking: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_certificate_id: Option<String>,
}

impl ResourceDefinition for SpringCloudConfigurationService {
    type Model = Self;

    const DEFAULT_TIMEOUTS: Timeouts = Timeouts::from_minutes(30, 5, 30, 30);
    const SCHEMA_VERSION: u32 = 0;
    const TYPE_NAME: &'static str = "spring_cloud_configuration_service";
}

impl SpringCloudConfigurationService {
    pub fn configuration_service_id(&self) -> SpringCloudConfigurationServiceId {
        self.spring_cloud_service_id.configuration_service(&self.name)
    }

    pub fn validate(&self) -> Result<(), validation::Errors> {
        let mut validator = Validator::default();
        if self.name != DEFAULT_NAME {
            validator.push(validation::Error::Unsupported {
                field: "name".to_owned(),
                message: format!("the only supported name is {DEFAULT_NAME:?}"),
            });
        }

        for (index, repository) in self.repository.iter().enumerate() {
            let field = format!("repository.{index}");
            validator.check(validation::not_empty(&format!("{field}.name"), &repository.name));
            validator.check(validation::not_empty(&format!("{field}.label"), &repository.label));
            validator.check(validation::min_items(
                &format!("{field}.patterns"),
                repository.patterns.len(),
                1,
            ));
            validator.check(validation::has_prefix(
                &format!("{field}.uri"),
                &repository.uri,
                GIT_URI_PREFIXES,
            ));
            if let Some(ca_certificate_id) = &repository.ca_certificate_id {
                validator.check(validation::resource_id(
                    &format!("{field}.ca_certificate_id"),
                    ca_certificate_id,
                ));
            }
            for error in repository.auth_errors(&field) {
                validator.push(error);
            }
        }
        validator.check(validation::unique_names(
            "repository",
            self.repository.iter().map(|repository| repository.name.as_str()),
        ));
        if let Some(seconds) = self.refresh_interval_in_seconds {
            validator.check(validation::in_range(
                "refresh_interval_in_seconds",
                seconds,
                0..=MAX_REFRESH_INTERVAL_SECONDS,
            ));
        }

        validator.finish()
    }
}

impl ConfigurationServiceRepository {
    fn auth_errors(&self, field: &str) -> Vec<validation::Error> {
        let basic = self.username.is_some() || self.password.is_some();
        let ssh = self.private_key.is_some();

        [
            validation::conflicts(
                (&format!("{field}.username"), basic),
                (&format!("{field}.private_key"), ssh),
            ),
            validation::required_with(
                (&format!("{field}.username"), self.username.is_some()),
                (&format!("{field}.password"), self.password.is_some()),
            ),
            validation::required_with(
                (&format!("{field}.password"), self.password.is_some()),
                (&format!("{field}.username"), self.username.is_some()),
            ),
            validation::required_with(
                (
                    &format!("{field}.host_key"),
                    self.host_key.is_some() || self.host_key_algorithm.is_some(),
                ),
                (&format!("{field}.private_key"), ssh),
            ),
            validation::conflicts(
                (
                    &format!("{field}.ca_certificate_id"),
                    self.ca_certificate_id.is_some(),
                ),
                (&format!("{field}.private_key"), ssh),
            ),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect()
    }

    /// Resolves the flat fields into a [`GitAuth`]. The fields must have been validated.
    pub fn git_auth(&self) -> GitAuth {
        match (&self.username, &self.password, &self.private_key) {
            (_, _, Some(private_key)) => GitAuth::Ssh {
                private_key: private_key.clone(),
                host_key: self.host_key.clone(),
                host_key_algorithm: self.host_key_algorithm.clone(),
                strict_host_key_checking: self.strict_host_key_checking,
            },
            (Some(username), Some(password), None) => GitAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => GitAuth::Public,
        }
    }

    /// The inverse of [`ConfigurationServiceRepository::git_auth`].
    pub fn set_git_auth(&mut self, auth: GitAuth) {
        self.username = None;
        self.password = None;
        self.private_key = None;
        self.host_key = None;
        self.host_key_algorithm = None;
        self.strict_host_key_checking = None;

        match auth {
            GitAuth::Public => {}
            GitAuth::Basic { username, password } => {
                self.username = Some(username);
                self.password = Some(password);
            }
            GitAuth::Ssh {
                private_key,
                host_key,
                host_key_algorithm,
                strict_host_key_checking,
            } => {
                self.private_key = Some(private_key);
                self.host_key = host_key;
                self.host_key_algorithm = host_key_algorithm;
                self.strict_host_key_checking = strict_host_key_checking;
            }
        }
    }
}
