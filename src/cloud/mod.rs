//! Cloud inventory model
//!
//! The inventory is produced by an external discovery step and handed to
//! the host registry for synchronization.

pub mod vm;

pub use vm::{Cloud, CloudCluster, Vm};
