//! `spring_cloud_customized_accelerator`: a project template served by the Application
//! Accelerator of an enterprise Spring Cloud service.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use springcloud_shared::id::{SpringCloudAcceleratorId, SpringCloudCustomizedAcceleratorId};

use crate::{
    auth::{GitAuth, HttpBasicAuth},
    resource::ResourceDefinition,
    sensitive::Sensitive,
    timeouts::Timeouts,
    validation::{self, GIT_URI_PREFIXES, Validator},
};

mod reconcile;
mod transform;

pub use reconcile::{CustomizedAcceleratorReconciler, Error};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Eq,
    JsonSchema,
    PartialEq,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
pub enum AcceleratorType {
    #[default]
    Accelerator,
    Fragment,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct SpringCloudCustomizedAccelerator {
    /// Computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub id: Option<SpringCloudCustomizedAcceleratorId>,

    pub name: String,

    #[schemars(with = "String")]
    pub spring_cloud_accelerator_id: SpringCloudAcceleratorId,

    pub git_repository: GitRepository,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accelerator_tags: Vec<String>,

    #[serde(default)]
    pub accelerator_type: AcceleratorType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct GitRepository {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<HttpBasicAuth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_auth: Option<AcceleratorSshAuth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_certificate_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_tag: Option<String>,

    /// How often the repository is checked for updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_in_seconds: Option<u32>,

    /// The folder of the accelerator within the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// SSH authentication without host key checking options, which accelerators don't support.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct AcceleratorSshAuth {
    pub private_key: Sensitive,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key: Option<Sensitive>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key_algorithm: Option<String>,
}

impl ResourceDefinition for SpringCloudCustomizedAccelerator {
    type Model = Self;

    const DEFAULT_TIMEOUTS: Timeouts = Timeouts::from_minutes(30, 5, 30, 30);
    const SCHEMA_VERSION: u32 = 0;
    const TYPE_NAME: &'static str = "spring_cloud_customized_accelerator";
}

impl SpringCloudCustomizedAccelerator {
    pub fn customized_accelerator_id(&self) -> SpringCloudCustomizedAcceleratorId {
        self.spring_cloud_accelerator_id
            .customized_accelerator(&self.name)
    }

    pub fn validate(&self) -> Result<(), validation::Errors> {
        let mut validator = Validator::default();
        validator.check(validation::not_empty("name", &self.name));

        let repository = &self.git_repository;
        validator.check(validation::has_prefix(
            "git_repository.url",
            &repository.url,
            GIT_URI_PREFIXES,
        ));
        // Empty references are not sent, so they don't count as set
        let is_set = |reference: Option<&str>| reference.is_some_and(|r| !r.is_empty());
        validator.check(validation::exactly_one_of(&[
            ("git_repository.branch", is_set(repository.branch.as_deref())),
            ("git_repository.commit", is_set(repository.commit.as_deref())),
            ("git_repository.git_tag", is_set(repository.git_tag.as_deref())),
        ]));
        validator.check(validation::conflicts(
            ("git_repository.basic_auth", repository.basic_auth.is_some()),
            ("git_repository.ssh_auth", repository.ssh_auth.is_some()),
        ));
        validator.check(validation::conflicts(
            (
                "git_repository.ca_certificate_id",
                repository.ca_certificate_id.is_some(),
            ),
            ("git_repository.ssh_auth", repository.ssh_auth.is_some()),
        ));
        if let Some(interval) = repository.interval_in_seconds {
            validator.check(validation::in_range(
                "git_repository.interval_in_seconds",
                interval,
                10..=3600,
            ));
        }
        if let Some(ca_certificate_id) = &repository.ca_certificate_id {
            validator.check(validation::resource_id(
                "git_repository.ca_certificate_id",
                ca_certificate_id,
            ));
        }
        if let Some(basic) = &repository.basic_auth {
            validator.check(validation::not_empty(
                "git_repository.basic_auth.username",
                &basic.username,
            ));
        }

        validator.finish()
    }
}

impl GitRepository {
    /// The authentication of the repository. `basic_auth` wins if both blocks are set, which
    /// validation rejects.
    pub fn git_auth(&self) -> GitAuth {
        match (&self.basic_auth, &self.ssh_auth) {
            (Some(basic), _) => GitAuth::Basic {
                username: basic.username.clone(),
                password: basic.password.clone(),
            },
            (None, Some(ssh)) => GitAuth::Ssh {
                private_key: ssh.private_key.clone(),
                host_key: ssh.host_key.clone(),
                host_key_algorithm: ssh.host_key_algorithm.clone(),
                strict_host_key_checking: None,
            },
            (None, None) => GitAuth::Public,
        }
    }

    pub fn set_git_auth(&mut self, auth: GitAuth) {
        (self.basic_auth, self.ssh_auth) = match auth {
            GitAuth::Public => (None, None),
            GitAuth::Basic { username, password } => {
                (Some(HttpBasicAuth { username, password }), None)
            }
            GitAuth::Ssh {
                private_key,
                host_key,
                host_key_algorithm,
                ..
            } => (
                None,
                Some(AcceleratorSshAuth {
                    private_key,
                    host_key,
                    host_key_algorithm,
                }),
            ),
        };
    }
}
