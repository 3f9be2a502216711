//! clusterkit - host registry and command expansion for cloud clusters
//!
//! clusterkit keeps a local directory of host files, one per cluster, in
//! sync with the cloud inventory and loads them back into cluster records.
//! It also expands placeholder tokens such as `{pgurl:1-3}` or
//! `{store-dir}` in command arguments against a cluster's nodes.

pub mod cloud;
pub mod cluster;
pub mod config;
pub mod error;
pub mod install;

pub use error::{ClusterError, Result};
