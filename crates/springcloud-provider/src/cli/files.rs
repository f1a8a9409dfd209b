//! The files the CLI works on: a YAML manifest declaring resources, and the JSON state of
//! the resources managed so far.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{ResultExt, Snafu, ensure};

use crate::{
    cli::resource::{self, Address, Resource},
    migration,
    timeouts::TimeoutOverrides,
};

const STATE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read {}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse manifest {}", path.display()))]
    ParseManifest {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("failed to parse state {}", path.display()))]
    ParseState {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("state format version {version} is not supported"))]
    UnsupportedStateFormat { version: u32 },

    #[snafu(display("{address} is declared more than once"))]
    DuplicateAddress { address: Address },

    #[snafu(display("invalid configuration of {address}"))]
    DecodeConfig {
        address: Address,
        source: resource::Error,
    },

    #[snafu(display("failed to upgrade the state of {address}"))]
    UpgradeState {
        address: Address,
        source: migration::Error,
    },

    #[snafu(display("invalid state of {address}"))]
    DecodeState {
        address: Address,
        source: resource::Error,
    },

    #[snafu(display("failed to encode the state of {address}"))]
    EncodeState {
        address: Address,
        source: resource::Error,
    },

    #[snafu(display("failed to serialize state"))]
    SerializeState { source: serde_json::Error },

    #[snafu(display("failed to write {}", path.display()))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    resources: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    #[serde(rename = "type")]
    type_name: String,
    name: String,
    #[serde(default)]
    timeouts: TimeoutOverrides,
    config: Value,
}

/// A resource as declared in the manifest.
#[derive(Clone, Debug)]
pub struct Declared {
    pub address: Address,
    pub timeouts: TimeoutOverrides,
    pub config: Resource,
}

/// Loads the manifest, resources are returned in the order they are declared in.
///
/// ```yaml
/// resources:
///   - type: spring_cloud_service
///     name: main
///     timeouts:
///       create: 90m
///     config:
///       name: spring-main
///       resource_group_name: rg
///       location: westeurope
/// ```
pub fn load_manifest(path: &Path) -> Result<Vec<Declared>, Error> {
    let content = fs::read_to_string(path).context(ReadFileSnafu { path })?;
    let manifest: ManifestFile =
        serde_yaml::from_str(&content).context(ParseManifestSnafu { path })?;

    let mut declared = Vec::<Declared>::with_capacity(manifest.resources.len());
    for entry in manifest.resources {
        let address = Address {
            type_name: entry.type_name,
            name: entry.name,
        };
        ensure!(
            declared.iter().all(|other| other.address != address),
            DuplicateAddressSnafu { address }
        );
        let config = Resource::decode(&address.type_name, entry.config).context(
            DecodeConfigSnafu {
                address: address.clone(),
            },
        )?;
        declared.push(Declared {
            address,
            timeouts: entry.timeouts,
            config,
        });
    }
    Ok(declared)
}

#[derive(Debug, Deserialize, Serialize)]
struct StateFile {
    version: u32,
    #[serde(default)]
    resources: Vec<StateEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
struct StateEntry {
    #[serde(rename = "type")]
    type_name: String,
    name: String,
    schema_version: u32,
    attributes: Value,
}

/// The state of every managed resource, kept in the order the resources were created in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    resources: Vec<(Address, Resource)>,
}

impl State {
    /// Loads the state, a missing file is an empty state. Older state is upgraded.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no state yet");
                return Ok(Self::default());
            }
            Err(err) => return Err(err).context(ReadFileSnafu { path }),
        };
        let file: StateFile =
            serde_json::from_slice(&content).context(ParseStateSnafu { path })?;
        ensure!(
            file.version == STATE_FORMAT_VERSION,
            UnsupportedStateFormatSnafu {
                version: file.version
            }
        );

        let mut state = Self::default();
        for entry in file.resources {
            let address = Address {
                type_name: entry.type_name,
                name: entry.name,
            };
            let attributes =
                migration::upgrade(&address.type_name, entry.schema_version, entry.attributes)
                    .context(UpgradeStateSnafu {
                        address: address.clone(),
                    })?;
            let resource = Resource::decode(&address.type_name, attributes).context(
                DecodeStateSnafu {
                    address: address.clone(),
                },
            )?;
            state.insert(address, resource);
        }
        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let resources = self
            .resources
            .iter()
            .map(|(address, resource)| {
                Ok(StateEntry {
                    type_name: address.type_name.clone(),
                    name: address.name.clone(),
                    schema_version: resource.schema_version(),
                    attributes: resource.encode().context(EncodeStateSnafu {
                        address: address.clone(),
                    })?,
                })
            })
            .collect::<Result<_, Error>>()?;
        let file = StateFile {
            version: STATE_FORMAT_VERSION,
            resources,
        };

        let content = serde_json::to_vec_pretty(&file).context(SerializeStateSnafu)?;
        fs::write(path, content).context(WriteFileSnafu { path })
    }

    pub fn get(&self, address: &Address) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|(candidate, _)| candidate == address)
            .map(|(_, resource)| resource)
    }

    /// Replaces the state of `address`, or appends it if it is new.
    pub fn insert(&mut self, address: Address, resource: Resource) {
        match self
            .resources
            .iter_mut()
            .find(|(candidate, _)| *candidate == address)
        {
            Some((_, existing)) => *existing = resource,
            None => self.resources.push((address, resource)),
        }
    }

    pub fn remove(&mut self, address: &Address) -> Option<Resource> {
        let index = self
            .resources
            .iter()
            .position(|(candidate, _)| candidate == address)?;
        Some(self.resources.remove(index).1)
    }

    /// Addresses in creation order.
    pub fn addresses(&self) -> Vec<Address> {
        self.resources
            .iter()
            .map(|(address, _)| address.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// How many resources of each type are managed.
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary = BTreeMap::new();
        for (_, resource) in &self.resources {
            *summary.entry(resource.type_name()).or_default() += 1;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn main_service() -> Address {
        Address {
            type_name: "spring_cloud_service".to_owned(),
            name: "main".to_owned(),
        }
    }

    #[test]
    fn manifest_is_decoded_in_order() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("manifest.yaml");
        fs::write(
            &path,
            indoc! {"
                resources:
                  - type: spring_cloud_service
                    name: main
                    timeouts:
                      create: 90m
                    config:
                      name: spring-main
                      resource_group_name: rg
                      location: westeurope
                      sku_name: E0
                  - type: spring_cloud_configuration_service
                    name: default
                    config:
                      name: default
                      spring_cloud_service_id: /subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/spring-main
            "},
        )
        .expect("writable");

        let declared = load_manifest(&path).expect("valid manifest");
        assert_eq!(declared.len(), 2);
        assert_eq!(declared[0].address, main_service());
        assert_eq!(
            declared[0].timeouts.create,
            Some(std::time::Duration::from_secs(90 * 60))
        );
        assert!(matches!(
            declared[1].config,
            Resource::ConfigurationService(_)
        ));
    }

    #[test]
    fn duplicate_addresses_are_rejected() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("manifest.yaml");
        fs::write(
            &path,
            indoc! {"
                resources:
                  - type: spring_cloud_service
                    name: main
                    config: {name: a, resource_group_name: rg, location: westeurope}
                  - type: spring_cloud_service
                    name: main
                    config: {name: b, resource_group_name: rg, location: westeurope}
            "},
        )
        .expect("writable");

        assert!(matches!(
            load_manifest(&path),
            Err(Error::DuplicateAddress { .. })
        ));
    }

    #[test]
    fn state_survives_save_and_load() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("state.json");
        assert!(State::load(&path).expect("missing state is empty").is_empty());

        let resource = Resource::decode(
            "spring_cloud_service",
            serde_json::json!({"name": "spring-main", "resource_group_name": "rg", "location": "westeurope"}),
        )
        .expect("valid service");
        let mut state = State::default();
        state.insert(main_service(), resource.clone());
        state.save(&path).expect("state is saved");

        let loaded = State::load(&path).expect("state is loaded");
        assert_eq!(loaded, state);
        assert_eq!(loaded.get(&main_service()), Some(&resource));
        assert_eq!(loaded.summary().get("spring_cloud_service"), Some(&1));
    }

    #[test]
    fn old_state_is_upgraded() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            serde_json::json!({
                "version": 1,
                "resources": [{
                    "type": "spring_cloud_service",
                    "name": "main",
                    "schema_version": 0,
                    "attributes": {
                        "id": "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/Spring/spring-main",
                        "name": "spring-main",
                        "resource_group_name": "rg",
                        "location": "westeurope"
                    }
                }]
            })
            .to_string(),
        )
        .expect("writable");

        let state = State::load(&path).expect("state is upgraded");
        let id = match state.get(&main_service()) {
            Some(Resource::Service(service)) => service.id.as_ref().map(ToString::to_string),
            _ => None,
        };
        assert_eq!(
            id.as_deref(),
            Some(
                "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/spring-main"
            )
        );
    }
}
