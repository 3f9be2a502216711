//! Catalog of loaded clusters

use super::record::Cluster;
use crate::error::{ClusterError, Result};
use std::collections::BTreeMap;

/// Clusters by name, as read from the host directory
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    clusters: BTreeMap<String, Cluster>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a cluster
    pub fn insert(&mut self, cluster: Cluster) {
        self.clusters.insert(cluster.name().to_string(), cluster);
    }

    /// Look up a cluster by name
    pub fn get(&self, name: &str) -> Option<&Cluster> {
        self.clusters.get(name)
    }

    /// Look up a cluster, failing if it is unknown
    pub fn require(&self, name: &str) -> Result<&Cluster> {
        self.get(name)
            .ok_or_else(|| ClusterError::ClusterNotFound(name.to_string()))
    }

    /// Cluster names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}
