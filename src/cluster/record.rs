//! Cluster records loaded from host files

use crate::install::ClusterImpl;
use std::collections::BTreeMap;

/// Name of the cluster whose nodes all run on this machine
pub const LOCAL_CLUSTER_NAME: &str = "local";

/// A cluster and its nodes.
///
/// Nodes are numbered from 1 in host-file order. The four per-node
/// sequences always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cluster {
    name: String,
    hosts: Vec<String>,
    users: Vec<String>,
    localities: Vec<String>,
    vpcs: Vec<String>,
}

/// Borrowed view of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef<'a> {
    /// 1-based node index
    pub index: usize,
    pub host: &'a str,
    pub user: &'a str,
    pub locality: &'a str,
    pub vpc: &'a str,
}

impl Cluster {
    /// Create an empty cluster
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Append a node, returning its index
    pub fn push_node(&mut self, host: &str, user: &str, locality: &str, vpc: &str) -> usize {
        self.hosts.push(host.to_string());
        self.users.push(user.to_string());
        self.localities.push(locality.to_string());
        self.vpcs.push(vpc.to_string());
        self.hosts.len()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn localities(&self) -> &[String] {
        &self.localities
    }

    pub fn vpcs(&self) -> &[String] {
        &self.vpcs
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.hosts.len()
    }

    /// Check whether the cluster runs on this machine
    pub fn is_local(&self) -> bool {
        self.name == LOCAL_CLUSTER_NAME
    }

    /// Look up a node by 1-based index
    pub fn node(&self, index: usize) -> Option<NodeRef<'_>> {
        let i = index.checked_sub(1)?;
        Some(NodeRef {
            index,
            host: self.hosts.get(i)?,
            user: self.users.get(i)?,
            locality: self.localities.get(i)?,
            vpc: self.vpcs.get(i)?,
        })
    }

    /// Iterate over nodes in index order
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (1..=self.node_count()).filter_map(move |i| self.node(i))
    }

    /// Every node index, ascending
    pub fn all_nodes(&self) -> Vec<usize> {
        (1..=self.node_count()).collect()
    }

    /// Connection URL for each of `nodes`
    pub fn pg_urls(&self, imp: &dyn ClusterImpl, nodes: &[usize]) -> BTreeMap<usize, String> {
        nodes
            .iter()
            .filter_map(|&i| {
                let node = self.node(i)?;
                let port = imp.node_port(self, i);
                Some((i, imp.node_url(self, node.host, port)))
            })
            .collect()
    }

    /// SQL port for each of `nodes`
    pub fn pg_ports(&self, imp: &dyn ClusterImpl, nodes: &[usize]) -> BTreeMap<usize, String> {
        nodes
            .iter()
            .filter(|&&i| self.node(i).is_some())
            .map(|&i| (i, imp.node_port(self, i).to_string()))
            .collect()
    }
}
