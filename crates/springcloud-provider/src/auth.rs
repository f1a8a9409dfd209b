//! Git authentication, shared by the config server, the configuration service and customized
//! accelerators.
//!
//! Declaratively a repository has optional `http_basic_auth`/`ssh_auth` blocks (or flat fields).
//! Internally this is always resolved into the closed [`GitAuth`] sum type, so that a repository
//! can never be configured with two kinds of authentication at once.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{models::GitCredentials, sensitive::Sensitive, validation};

const fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct HttpBasicAuth {
    pub username: String,
    pub password: Sensitive,
}

#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct SshAuth {
    pub private_key: Sensitive,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key: Option<Sensitive>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key_algorithm: Option<String>,

    #[serde(default = "default_true")]
    pub strict_host_key_checking_enabled: bool,
}

/// How a git repository is accessed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum GitAuth {
    #[default]
    Public,
    Basic {
        username: String,
        password: Sensitive,
    },
    Ssh {
        private_key: Sensitive,
        host_key: Option<Sensitive>,
        host_key_algorithm: Option<String>,
        strict_host_key_checking: Option<bool>,
    },
}

impl GitAuth {
    /// Resolves the optional `http_basic_auth` and `ssh_auth` blocks of `field`.
    pub fn from_blocks(
        field: &str,
        basic: Option<&HttpBasicAuth>,
        ssh: Option<&SshAuth>,
    ) -> Result<Self, validation::Error> {
        match (basic, ssh) {
            (Some(_), Some(_)) => Err(validation::Error::Conflict {
                first: format!("{field}.http_basic_auth"),
                second: format!("{field}.ssh_auth"),
            }),
            (Some(basic), None) => Ok(Self::Basic {
                username: basic.username.clone(),
                password: basic.password.clone(),
            }),
            (None, Some(ssh)) => Ok(Self::Ssh {
                private_key: ssh.private_key.clone(),
                host_key: ssh.host_key.clone(),
                host_key_algorithm: ssh.host_key_algorithm.clone(),
                strict_host_key_checking: Some(ssh.strict_host_key_checking_enabled),
            }),
            (None, None) => Ok(Self::Public),
        }
    }

    /// The inverse of [`GitAuth::from_blocks`].
    pub fn into_blocks(self) -> (Option<HttpBasicAuth>, Option<SshAuth>) {
        match self {
            Self::Public => (None, None),
            Self::Basic { username, password } => {
                (Some(HttpBasicAuth { username, password }), None)
            }
            Self::Ssh {
                private_key,
                host_key,
                host_key_algorithm,
                strict_host_key_checking,
            } => (
                None,
                Some(SshAuth {
                    private_key,
                    host_key,
                    host_key_algorithm,
                    strict_host_key_checking_enabled: strict_host_key_checking.unwrap_or(true),
                }),
            ),
        }
    }

    pub fn is_ssh(&self) -> bool {
        matches!(self, Self::Ssh { .. })
    }
}

impl From<&GitAuth> for GitCredentials {
    fn from(auth: &GitAuth) -> Self {
        match auth {
            GitAuth::Public => Self::default(),
            GitAuth::Basic { username, password } => Self {
                username: Some(username.clone()),
                password: Some(password.expose().to_owned()),
                ..Self::default()
            },
            GitAuth::Ssh {
                private_key,
                host_key,
                host_key_algorithm,
                strict_host_key_checking,
            } => Self {
                private_key: Some(private_key.expose().to_owned()),
                host_key: host_key
                    .as_ref()
                    .filter(|key| !key.is_empty())
                    .map(|key| key.expose().to_owned()),
                host_key_algorithm: host_key_algorithm.clone().filter(|alg| !alg.is_empty()),
                strict_host_key_checking: *strict_host_key_checking,
                ..Self::default()
            },
        }
    }
}

/// What the API reports about the authentication of a repository.
///
/// Secrets are never part of it, they have to be restored from the prior state with
/// [`RemoteAuth::restore`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RemoteAuth {
    Public,
    Basic {
        username: Option<String>,
    },
    Ssh {
        strict_host_key_checking: Option<bool>,
    },
}

impl From<&GitCredentials> for RemoteAuth {
    fn from(credentials: &GitCredentials) -> Self {
        if credentials.private_key.is_some() {
            Self::Ssh {
                strict_host_key_checking: credentials.strict_host_key_checking,
            }
        } else if credentials.username.is_some() {
            Self::Basic {
                username: credentials.username.clone(),
            }
        } else {
            Self::Public
        }
    }
}

impl RemoteAuth {
    /// Combines the remote view with the secrets of the `prior` authentication of the same
    /// repository.
    ///
    /// Secrets are only taken over when the prior authentication is of the same kind.
    pub fn restore(self, prior: Option<&GitAuth>) -> GitAuth {
        match (self, prior) {
            (Self::Public, _) => GitAuth::Public,
            (
                Self::Basic { username },
                Some(GitAuth::Basic {
                    username: prior_username,
                    password,
                }),
            ) => GitAuth::Basic {
                // The API masks usernames in some versions, prefer what the user configured
                username: if prior_username.is_empty() {
                    username.unwrap_or_default()
                } else {
                    prior_username.clone()
                },
                password: password.clone(),
            },
            (Self::Basic { username }, _) => GitAuth::Basic {
                username: username.unwrap_or_default(),
                password: Sensitive::default(),
            },
            (
                Self::Ssh {
                    strict_host_key_checking,
                },
                Some(GitAuth::Ssh {
                    private_key,
                    host_key,
                    host_key_algorithm,
                    ..
                }),
            ) => GitAuth::Ssh {
                private_key: private_key.clone(),
                host_key: host_key.clone(),
                host_key_algorithm: host_key_algorithm.clone(),
                strict_host_key_checking,
            },
            (
                Self::Ssh {
                    strict_host_key_checking,
                },
                _,
            ) => GitAuth::Ssh {
                private_key: Sensitive::default(),
                host_key: None,
                host_key_algorithm: None,
                strict_host_key_checking,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> HttpBasicAuth {
        HttpBasicAuth {
            username: "git".to_owned(),
            password: Sensitive::new("secret"),
        }
    }

    fn ssh() -> SshAuth {
        SshAuth {
            private_key: Sensitive::new("-----BEGIN KEY-----"),
            host_key: Some(Sensitive::new("AAAA")),
            host_key_algorithm: Some("ssh-rsa".to_owned()),
            strict_host_key_checking_enabled: false,
        }
    }

    #[test]
    fn both_blocks_conflict() {
        let err = GitAuth::from_blocks("config_server_git_setting", Some(&basic()), Some(&ssh()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "config_server_git_setting.http_basic_auth conflicts with config_server_git_setting.ssh_auth"
        );
    }

    #[test]
    fn blocks_round_trip() {
        for (basic, ssh) in [
            (None, None),
            (Some(basic()), None),
            (None, Some(ssh())),
        ] {
            let auth = GitAuth::from_blocks("repo", basic.as_ref(), ssh.as_ref())
                .expect("no conflict");
            assert_eq!(auth.into_blocks(), (basic, ssh));
        }
    }

    #[test]
    fn credentials_only_carry_the_selected_variant() {
        let auth = GitAuth::from_blocks("repo", None, Some(&ssh())).expect("no conflict");
        let credentials = GitCredentials::from(&auth);

        assert_eq!(credentials.username, None);
        assert_eq!(credentials.password, None);
        assert_eq!(credentials.private_key.as_deref(), Some("-----BEGIN KEY-----"));
        assert_eq!(credentials.strict_host_key_checking, Some(false));
    }

    #[test]
    fn secrets_are_restored_from_prior() {
        let prior = GitAuth::from_blocks("repo", Some(&basic()), None).expect("no conflict");
        let remote = GitCredentials {
            username: Some("*".to_owned()),
            password: Some("*".to_owned()),
            ..GitCredentials::default()
        };

        let restored = RemoteAuth::from(&remote).restore(Some(&prior));
        assert_eq!(restored, prior);
    }

    #[test]
    fn secrets_are_not_taken_from_other_variant() {
        let prior = GitAuth::from_blocks("repo", Some(&basic()), None).expect("no conflict");
        let remote = GitCredentials {
            private_key: Some("*".to_owned()),
            strict_host_key_checking: Some(true),
            ..GitCredentials::default()
        };

        let restored = RemoteAuth::from(&remote).restore(Some(&prior));
        assert_eq!(
            restored,
            GitAuth::Ssh {
                private_key: Sensitive::default(),
                host_key: None,
                host_key_algorithm: None,
                strict_host_key_checking: Some(true),
            }
        );
    }
}
