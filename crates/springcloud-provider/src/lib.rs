//! Reconcilers for Azure Spring Cloud resources.
//!
//! Each managed resource has a declarative model in [`resource`], which is validated, expanded
//! into the wire types of [`models`] and reconciled against Azure Resource Manager through
//! [`client`]. What is read back is flattened into the new state, keeping the secrets the
//! service never returns.

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod data_source;
pub mod logging;
pub mod migration;
pub mod models;
pub mod resource;
pub mod saga;
pub mod sensitive;
pub mod timeouts;
pub mod validation;
