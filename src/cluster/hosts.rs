//! Host files
//!
//! Each known cluster has one file in the host directory, named after the
//! cluster, with one line per node:
//!
//! ```text
//! # user@host   locality   vpcId
//! alice@10.0.0.1  us-east1-b  vpc-123
//! ```
//!
//! Columns are space aligned on write and read back with any run of whitespace
//! as the separator.

use super::catalog::Catalog;
use super::record::Cluster;
use crate::cloud::{Cloud, CloudCluster};
use crate::config::Config;
use crate::error::{ClusterError, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Header written at the top of every host file
pub const HOSTS_HEADER: [&str; 3] = ["# user@host", "locality", "vpcId"];

/// Minimum gap between aligned columns
const COLUMN_PADDING: usize = 2;

/// Host directory registry
#[derive(Debug, Clone)]
pub struct HostRegistry {
    /// Directory holding one file per cluster
    dir: PathBuf,
    /// User assumed for lines without `user@`
    default_user: String,
}

impl HostRegistry {
    /// Create a registry over `dir`
    pub fn new(dir: PathBuf, default_user: &str) -> Self {
        Self {
            dir,
            default_user: default_user.to_string(),
        }
    }

    /// Create a registry from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.host_dir_path()?, &config.os_user))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a cluster's host file
    pub fn hosts_path(&self, cluster: &str) -> PathBuf {
        self.dir.join(cluster)
    }

    /// Create the host directory if it does not exist
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| ClusterError::file("could not create directory", &self.dir, e))
    }

    /// Write a host file for every cluster in `cloud`, then remove stale files
    pub fn sync(&self, cloud: &Cloud) -> Result<()> {
        self.sync_with(cloud, |path| std::fs::remove_file(path))
    }

    fn sync_with<F>(&self, cloud: &Cloud, remove: F) -> Result<()>
    where
        F: Fn(&Path) -> io::Result<()>,
    {
        // Nothing is written unless every name is usable as a file name.
        for name in cloud.clusters.keys() {
            validate_cluster_name(name)?;
        }
        for cluster in cloud.clusters.values() {
            self.write_hosts(cluster)?;
        }
        self.gc_with(cloud, remove)?;
        Ok(())
    }

    fn write_hosts(&self, cluster: &CloudCluster) -> Result<()> {
        validate_cluster_name(&cluster.name)?;
        let path = self.hosts_path(&cluster.name);
        info!(
            "Writing hosts for cluster {} ({} nodes)",
            cluster.name,
            cluster.vms.len()
        );

        let mut file =
            File::create(&path).map_err(|e| ClusterError::file("problem creating file", &path, e))?;
        file.write_all(render_hosts(cluster).as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| ClusterError::file("problem writing file", &path, e))
    }

    /// Remove every regular file that does not belong to a cluster in `cloud`.
    ///
    /// Removal failures are logged and skipped. Returns the files removed.
    pub fn gc(&self, cloud: &Cloud) -> Result<Vec<PathBuf>> {
        self.gc_with(cloud, |path| std::fs::remove_file(path))
    }

    fn gc_with<F>(&self, cloud: &Cloud, remove: F) -> Result<Vec<PathBuf>>
    where
        F: Fn(&Path) -> io::Result<()>,
    {
        let mut removed = Vec::new();

        for (name, path) in self.regular_files()? {
            if cloud.contains(&name) {
                continue;
            }
            match remove(&path) {
                Ok(()) => {
                    debug!("Removed stale hosts file {}", path.display());
                    removed.push(path);
                }
                Err(e) => warn!("Failed to remove file {}: {}", path.display(), e),
            }
        }

        Ok(removed)
    }

    /// Parse every host file into a fresh catalog.
    ///
    /// Any malformed line fails the whole load.
    pub fn load(&self) -> Result<Catalog> {
        let mut catalog = Catalog::new();

        for (name, path) in self.regular_files()? {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| ClusterError::file("could not read", &path, e))?;
            let cluster = parse_hosts(&name, &content, &self.default_user)?;
            debug!("Loaded cluster {} ({} nodes)", name, cluster.node_count());
            catalog.insert(cluster);
        }

        Ok(catalog)
    }

    /// Regular files in the host directory, sorted by name
    fn regular_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| ClusterError::file("could not list", &self.dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ClusterError::file("could not list", &self.dir, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| ClusterError::file("could not stat", entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            // Names that are not valid UTF-8 cannot be cluster names.
            if let Some(name) = entry.file_name().to_str() {
                files.push((name.to_string(), entry.path()));
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Check that a cluster name is a plain file name inside the host directory
pub fn validate_cluster_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(ClusterError::InvalidClusterName(name.to_string()));
    }
    Ok(())
}

/// Render a cluster's host file.
///
/// Empty columns leave no field behind, so a VM with a VPC but no locality
/// reads back with the VPC as its locality and an empty VPC.
pub fn render_hosts(cluster: &CloudCluster) -> String {
    let mut rows: Vec<[String; 3]> = Vec::with_capacity(cluster.vms.len() + 1);
    rows.push(HOSTS_HEADER.map(str::to_string));
    for vm in &cluster.vms {
        rows.push([
            format!("{}@{}", vm.remote_user, vm.public_ip),
            vm.locality(),
            vm.vpc.clone(),
        ]);
    }

    let width = |col: usize| {
        rows.iter()
            .map(|r| r[col].chars().count())
            .max()
            .unwrap_or(0)
            + COLUMN_PADDING
    };
    let (w0, w1) = (width(0), width(1));

    rows.iter()
        .map(|[addr, locality, vpc]| format!("{:<w0$}{:<w1$}{}\n", addr, locality, vpc))
        .collect()
}

/// Parse the contents of a host file
pub fn parse_hosts(name: &str, content: &str, default_user: &str) -> Result<Cluster> {
    let mut cluster = Cluster::new(name);

    for line in content.split('\n') {
        if let Some(host) = parse_line(line, default_user)? {
            cluster.push_node(host.host, host.user, host.locality, host.vpc);
        }
    }

    Ok(cluster)
}

/// One node line
#[derive(Debug, PartialEq, Eq)]
struct HostLine<'a> {
    user: &'a str,
    host: &'a str,
    locality: &'a str,
    vpc: &'a str,
}

/// Parse a single line, `None` for blanks and comments
fn parse_line<'a>(line: &'a str, default_user: &'a str) -> Result<Option<HostLine<'a>>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let Some(&addr) = fields.first() else {
        return Ok(None);
    };
    if addr.starts_with('#') {
        return Ok(None);
    }
    if fields.len() > 3 {
        return Err(ClusterError::InvalidHostsLine(line.to_string()));
    }

    let (user, host) = match addr.split('@').collect::<Vec<_>>().as_slice() {
        [host] => (default_user, *host),
        [user, host] => (*user, *host),
        _ => return Err(ClusterError::InvalidHostsLine(line.to_string())),
    };

    Ok(Some(HostLine {
        user,
        host,
        locality: fields.get(1).copied().unwrap_or_default(),
        vpc: fields.get(2).copied().unwrap_or_default(),
    }))
}
