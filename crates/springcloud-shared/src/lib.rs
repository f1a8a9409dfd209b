//! This crate contains helpers shared by the crates in this workspace: hierarchical resource
//! identifiers and YAML output.

pub mod id;
pub mod yaml;
