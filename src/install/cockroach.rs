//! Per-cluster node layout: ports, data directories and connection URLs

use crate::cluster::Cluster;
use crate::config::{expand_env, DEFAULT_BASE_PORT};

/// Data directory of a node in a remote cluster
pub const REMOTE_STORE_DIR: &str = "/mnt/data1/cockroach";

/// Where and how a cluster's nodes listen
pub trait ClusterImpl {
    /// SQL port of `node`
    fn node_port(&self, cluster: &Cluster, node: usize) -> u16;

    /// Data directory of `node`
    fn node_dir(&self, cluster: &Cluster, node: usize) -> String;

    /// Connection URL for a node reachable at `host:port`
    fn node_url(&self, cluster: &Cluster, host: &str, port: u16) -> String;
}

/// Layout of a CockroachDB cluster
#[derive(Debug, Clone)]
pub struct CockroachImpl {
    /// Port of node 1
    pub base_port: u16,
    /// Data directory root of the local cluster, may reference `$HOME`
    pub local_root: String,
}

impl Default for CockroachImpl {
    fn default() -> Self {
        Self {
            base_port: DEFAULT_BASE_PORT,
            local_root: "${HOME}/local".to_string(),
        }
    }
}

impl CockroachImpl {
    /// Create a layout with the given base port
    pub fn new(base_port: u16) -> Self {
        Self {
            base_port,
            ..Default::default()
        }
    }
}

impl ClusterImpl for CockroachImpl {
    fn node_port(&self, cluster: &Cluster, node: usize) -> u16 {
        if !cluster.is_local() {
            return self.base_port;
        }
        // Local nodes share one host; each takes a SQL and an HTTP port.
        let offset = node.saturating_sub(1).saturating_mul(2);
        u16::try_from(offset)
            .ok()
            .and_then(|o| self.base_port.checked_add(o))
            .unwrap_or(u16::MAX)
    }

    fn node_dir(&self, cluster: &Cluster, node: usize) -> String {
        if cluster.is_local() {
            format!("{}/{}/data", expand_env(&self.local_root), node)
        } else {
            REMOTE_STORE_DIR.to_string()
        }
    }

    fn node_url(&self, _cluster: &Cluster, host: &str, port: u16) -> String {
        format!("'postgres://root@{}:{}?sslmode=disable'", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> Cluster {
        let mut c = Cluster::new("local");
        for _ in 0..3 {
            c.push_node("localhost", "me", "", "");
        }
        c
    }

    #[test]
    fn test_remote_layout() {
        let imp = CockroachImpl::default();
        let c = Cluster::new("prod");
        assert_eq!(imp.node_port(&c, 1), 26257);
        assert_eq!(imp.node_port(&c, 3), 26257);
        assert_eq!(imp.node_dir(&c, 2), REMOTE_STORE_DIR);
    }

    #[test]
    fn test_local_layout() {
        let imp = CockroachImpl {
            base_port: 26257,
            local_root: "/tmp/local".to_string(),
        };
        let c = local();
        assert_eq!(imp.node_port(&c, 1), 26257);
        assert_eq!(imp.node_port(&c, 3), 26261);
        assert_eq!(imp.node_dir(&c, 2), "/tmp/local/2/data");
    }

    #[test]
    fn test_port_saturates() {
        let imp = CockroachImpl::new(65530);
        assert_eq!(imp.node_port(&local(), 100), u16::MAX);
    }

    #[test]
    fn test_node_url() {
        let imp = CockroachImpl::default();
        let url = imp.node_url(&local(), "10.0.0.1", 26257);
        assert_eq!(url, "'postgres://root@10.0.0.1:26257?sslmode=disable'");
    }
}
