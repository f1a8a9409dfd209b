//! Read-only lookups of existing resources.

pub mod service;

pub use service::{ServiceDataSource, SpringCloudServiceData, SpringCloudServiceLookup};
