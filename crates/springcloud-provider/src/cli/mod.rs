//! The `springcloud-provider` command line: applies a manifest of resources, keeping their
//! state in a file between runs.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, Parser, Subcommand};
use schemars::Schema;
use snafu::{ResultExt, Snafu, ensure};
use springcloud_shared::yaml::{self, SerializeOptions, YamlDocument};

use crate::{
    client::{AppPlatform, arm::ArmClient},
    config::ProviderOptions,
    data_source::{ServiceDataSource, SpringCloudServiceData, SpringCloudServiceLookup},
    resource::{
        ResourceDefinition, configuration_service::SpringCloudConfigurationService,
        customized_accelerator::SpringCloudCustomizedAccelerator, service::SpringCloudService,
    },
    timeouts::TimeoutOverrides,
};

mod files;
mod resource;

pub use files::{Declared, State, load_manifest};
pub use resource::{Address, Provider, Resource};

pub const APP_NAME: &str = "springcloud-provider";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to load the manifest"))]
    LoadManifest { source: files::Error },

    #[snafu(display("failed to load the state"))]
    LoadState { source: files::Error },

    #[snafu(display("failed to save the state"))]
    SaveState { source: files::Error },

    #[snafu(display("failed to create {address}"))]
    Create {
        address: Address,
        source: resource::Error,
    },

    #[snafu(display("failed to read {address}"))]
    Read {
        address: Address,
        source: resource::Error,
    },

    #[snafu(display("failed to update {address}"))]
    Update {
        address: Address,
        source: resource::Error,
    },

    #[snafu(display("failed to delete {address}"))]
    Delete {
        address: Address,
        source: resource::Error,
    },

    #[snafu(display("failed to import {address}"))]
    Import {
        address: Address,
        source: resource::Error,
    },

    #[snafu(display("{address} is already managed"))]
    AlreadyManaged { address: Address },

    #[snafu(display("failed to look up the service"))]
    Lookup {
        source: crate::data_source::service::Error,
    },

    #[snafu(display("failed to print {what}"))]
    Print { what: String, source: yaml::Error },
}

#[derive(Debug, Parser)]
#[command(name = APP_NAME, author, version, about = "Manages Azure Spring Cloud resources")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prints the schema of every resource type and of the data source.
    Schema,

    /// Creates, updates and deletes resources until they match the manifest.
    Apply(ApplyArguments),

    /// Reads every managed resource and updates the state, forgetting deleted resources.
    Refresh(StateArguments),

    /// Deletes every managed resource.
    Destroy(StateArguments),

    /// Starts managing an existing resource.
    Import(ImportArguments),

    /// Looks up an existing Spring Cloud service.
    Data(DataArguments),
}

#[derive(Debug, Args)]
pub struct StateArguments {
    /// The file the state of managed resources is kept in.
    #[arg(
        long,
        short = 's',
        value_name = "FILE",
        env = "SPRINGCLOUD_STATE",
        default_value = "springcloud.state.json"
    )]
    pub state: PathBuf,

    #[command(flatten)]
    pub provider: ProviderOptions,
}

#[derive(Debug, Args)]
pub struct ApplyArguments {
    /// The YAML manifest declaring the resources.
    #[arg(long, short = 'f', value_name = "FILE")]
    pub manifest: PathBuf,

    #[command(flatten)]
    pub state: StateArguments,
}

#[derive(Debug, Args)]
pub struct ImportArguments {
    /// The resource type, like `spring_cloud_service`.
    #[arg(long = "type", value_name = "TYPE")]
    pub type_name: String,

    /// The name of the resource in the manifest.
    #[arg(long)]
    pub name: String,

    /// The Azure resource id.
    pub id: String,

    #[command(flatten)]
    pub state: StateArguments,
}

#[derive(Debug, Args)]
pub struct DataArguments {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub resource_group_name: String,

    #[command(flatten)]
    pub provider: ProviderOptions,
}

impl Cli {
    pub async fn run(self) -> Result<(), Error> {
        match self.command {
            Command::Schema => print_schemas(),
            Command::Apply(arguments) => {
                let provider = connect(&arguments.state.provider);
                let declared = load_manifest(&arguments.manifest).context(LoadManifestSnafu)?;
                apply(&provider, declared, &arguments.state.state).await
            }
            Command::Refresh(arguments) => {
                refresh(&connect(&arguments.provider), &arguments.state).await
            }
            Command::Destroy(arguments) => {
                destroy(&connect(&arguments.provider), &arguments.state).await
            }
            Command::Import(arguments) => {
                let address = Address {
                    type_name: arguments.type_name,
                    name: arguments.name,
                };
                import(
                    &connect(&arguments.state.provider),
                    address,
                    &arguments.id,
                    &arguments.state.state,
                )
                .await
            }
            Command::Data(arguments) => {
                let provider = connect(&arguments.provider);
                let data_source = ServiceDataSource::new(
                    provider.services(&TimeoutOverrides::default()),
                    &arguments.provider.subscription_id,
                );
                let data = data_source
                    .read(&SpringCloudServiceLookup {
                        name: arguments.name,
                        resource_group_name: arguments.resource_group_name,
                    })
                    .await
                    .context(LookupSnafu)?;
                data.print_yaml_document(&SerializeOptions::default())
                    .context(PrintSnafu {
                        what: data.id.to_string(),
                    })
            }
        }
    }
}

fn connect(options: &ProviderOptions) -> Provider {
    let client = AppPlatform::new(Arc::new(ArmClient::new(options)));
    Provider::new(client, &options.subscription_id)
}

fn print_schemas() -> Result<(), Error> {
    let schemas: [(&str, &str, Schema); 4] = [
        (
            "resource",
            SpringCloudService::TYPE_NAME,
            SpringCloudService::schema(),
        ),
        (
            "resource",
            SpringCloudConfigurationService::TYPE_NAME,
            SpringCloudConfigurationService::schema(),
        ),
        (
            "resource",
            SpringCloudCustomizedAccelerator::TYPE_NAME,
            SpringCloudCustomizedAccelerator::schema(),
        ),
        (
            "data source",
            SpringCloudServiceData::TYPE_NAME,
            schemars::schema_for!(SpringCloudServiceLookup),
        ),
    ];
    for (kind, type_name, schema) in schemas {
        schema
            .print_yaml_document(&SerializeOptions::titled(format!("{kind} {type_name}")))
            .context(PrintSnafu { what: type_name })?;
    }
    Ok(())
}

/// Moves the managed resources to the `declared` ones. The state is saved after every change,
/// so that a failure keeps track of everything that was done before it.
pub async fn apply(
    provider: &Provider,
    declared: Vec<Declared>,
    state_path: &Path,
) -> Result<(), Error> {
    let mut state = State::load(state_path).context(LoadStateSnafu)?;

    // Resources which are no longer declared go first, in reverse order of creation
    for address in state.addresses().into_iter().rev() {
        if declared.iter().any(|declared| declared.address == address) {
            continue;
        }
        if let Some(prior) = state.get(&address) {
            tracing::info!(%address, "deleting resource which is no longer declared");
            provider
                .delete(prior, &TimeoutOverrides::default())
                .await
                .context(DeleteSnafu {
                    address: address.clone(),
                })?;
        }
        state.remove(&address);
        state.save(state_path).context(SaveStateSnafu)?;
    }

    for Declared {
        address,
        timeouts,
        config,
    } in declared
    {
        let new_state = match state.get(&address) {
            None => {
                if let Some(message) = config.deprecation_message() {
                    tracing::warn!(%address, "{message}");
                }
                tracing::info!(%address, "creating resource");
                provider
                    .create(&config, &timeouts)
                    .await
                    .context(CreateSnafu {
                        address: address.clone(),
                    })?
            }
            Some(prior) => match provider.update(&address, prior, &config, &timeouts).await {
                Ok(updated) => updated,
                Err(err) if err.requires_replacement() => {
                    tracing::info!(%address, %err, "replacing resource");
                    provider
                        .delete(prior, &timeouts)
                        .await
                        .context(DeleteSnafu {
                            address: address.clone(),
                        })?;
                    state.remove(&address);
                    state.save(state_path).context(SaveStateSnafu)?;

                    provider
                        .create(&config, &timeouts)
                        .await
                        .context(CreateSnafu {
                            address: address.clone(),
                        })?
                }
                Err(err) => {
                    return Err(err).context(UpdateSnafu { address });
                }
            },
        };
        state.insert(address, new_state);
        state.save(state_path).context(SaveStateSnafu)?;
    }

    tracing::info!(resources = ?state.summary(), "apply complete");
    Ok(())
}

/// Reads every managed resource, resources which no longer exist are removed from the state.
pub async fn refresh(provider: &Provider, state_path: &Path) -> Result<(), Error> {
    let mut state = State::load(state_path).context(LoadStateSnafu)?;

    for address in state.addresses() {
        let Some(prior) = state.get(&address) else {
            continue;
        };
        let current = provider
            .read(prior, &TimeoutOverrides::default())
            .await
            .context(ReadSnafu {
                address: address.clone(),
            })?;
        match current {
            Some(current) => state.insert(address, current),
            None => {
                state.remove(&address);
            }
        }
    }

    state.save(state_path).context(SaveStateSnafu)
}

/// Deletes every managed resource, in reverse order of creation.
pub async fn destroy(provider: &Provider, state_path: &Path) -> Result<(), Error> {
    let mut state = State::load(state_path).context(LoadStateSnafu)?;

    for address in state.addresses().into_iter().rev() {
        if let Some(prior) = state.get(&address) {
            tracing::info!(%address, "deleting resource");
            provider
                .delete(prior, &TimeoutOverrides::default())
                .await
                .context(DeleteSnafu {
                    address: address.clone(),
                })?;
        }
        state.remove(&address);
        state.save(state_path).context(SaveStateSnafu)?;
    }
    Ok(())
}

/// Adds an existing resource to the state. Secrets can't be read and have to be declared in
/// the manifest before the next apply.
pub async fn import(
    provider: &Provider,
    address: Address,
    id: &str,
    state_path: &Path,
) -> Result<(), Error> {
    let mut state = State::load(state_path).context(LoadStateSnafu)?;
    ensure!(
        state.get(&address).is_none(),
        AlreadyManagedSnafu { address }
    );

    let imported = provider
        .import(&address.type_name, id)
        .await
        .context(ImportSnafu {
            address: address.clone(),
        })?;
    state.insert(address, imported);
    state.save(state_path).context(SaveStateSnafu)
}
