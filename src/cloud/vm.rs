//! Clusters and VMs as reported by the cloud

use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A cloud VM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vm {
    /// VM name
    pub name: String,
    /// Public address
    pub public_ip: String,
    /// Private address
    pub private_ip: String,
    /// Login user
    pub remote_user: String,
    /// Cloud provider (e.g., "gce", "aws")
    pub provider: String,
    /// Availability zone
    pub zone: String,
    /// VPC identifier
    pub vpc: String,
}

impl Vm {
    /// Create a new VM
    pub fn new(name: &str, public_ip: &str, remote_user: &str) -> Self {
        Self {
            name: name.to_string(),
            public_ip: public_ip.to_string(),
            remote_user: remote_user.to_string(),
            ..Default::default()
        }
    }

    /// Set provider and zone
    pub fn placed(mut self, provider: &str, zone: &str) -> Self {
        self.provider = provider.to_string();
        self.zone = zone.to_string();
        self
    }

    /// Set VPC
    pub fn vpc(mut self, vpc: &str) -> Self {
        self.vpc = vpc.to_string();
        self
    }

    /// Region of the VM's zone (`us-east1-b` is in `us-east1`)
    pub fn region(&self) -> &str {
        match self.zone.rfind('-') {
            Some(idx) => &self.zone[..idx],
            None => &self.zone,
        }
    }

    /// Locality string handed to the database, empty when the zone is unknown
    pub fn locality(&self) -> String {
        if self.zone.is_empty() {
            return String::new();
        }
        format!(
            "cloud={},region={},zone={}",
            self.provider,
            self.region(),
            self.zone
        )
    }
}

/// A named group of VMs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudCluster {
    /// Cluster name
    pub name: String,
    /// VMs in node order
    #[serde(default)]
    pub vms: Vec<Vm>,
}

impl CloudCluster {
    /// Create a new cluster
    pub fn new(name: &str, vms: Vec<Vm>) -> Self {
        Self {
            name: name.to_string(),
            vms,
        }
    }
}

/// Cloud inventory: every known cluster by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cloud {
    #[serde(default)]
    pub clusters: BTreeMap<String, CloudCluster>,
}

impl Cloud {
    /// Create an empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a cluster
    pub fn insert(&mut self, cluster: CloudCluster) {
        self.clusters.insert(cluster.name.clone(), cluster);
    }

    /// Check whether a cluster is known
    pub fn contains(&self, name: &str) -> bool {
        self.clusters.contains_key(name)
    }

    /// Parse an inventory from JSON.
    ///
    /// Accepts either `{"clusters": {...}}` or a bare list of clusters.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if value.is_array() {
            let list: Vec<CloudCluster> = serde_json::from_value(value)?;
            let mut cloud = Cloud::new();
            for cluster in list {
                cloud.insert(cluster);
            }
            return Ok(cloud);
        }
        let mut cloud: Cloud = serde_json::from_value(value)?;
        // Map keys win over any name embedded in the record.
        for (name, cluster) in cloud.clusters.iter_mut() {
            cluster.name = name.clone();
        }
        Ok(cloud)
    }

    /// Read an inventory JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClusterError::file("could not read", path, e))?;
        Self::from_json_str(&content)
    }
}
