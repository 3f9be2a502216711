//! Cluster registry
//!
//! Keeps one host file per cluster on disk and loads them back into
//! [`Cluster`] records.

pub mod catalog;
pub mod hosts;
pub mod record;

pub use catalog::Catalog;
pub use hosts::{parse_hosts, render_hosts, HostRegistry};
pub use record::{Cluster, NodeRef, LOCAL_CLUSTER_NAME};
