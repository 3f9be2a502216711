//! clusterkit - host registry and command expansion for cloud clusters
//!
//! This is the main CLI entry point for clusterkit.

use clap::{Parser, Subcommand};
use clusterkit::cloud::Cloud;
use clusterkit::cluster::HostRegistry;
use clusterkit::config::Config;
use clusterkit::error::Result;
use clusterkit::install::{CockroachImpl, Expander};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// clusterkit - cluster host registry
#[derive(Parser)]
#[command(name = "clusterkit")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Host registry and command expansion for cloud clusters", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Host directory (default: ${HOME}/.clusterkit/hosts)
    #[arg(long, global = true)]
    host_dir: Option<String>,

    /// Login user for hosts without one
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the host directory
    Init,

    /// Write host files from a cloud inventory and remove stale ones
    Sync {
        /// Inventory JSON file
        inventory: PathBuf,
    },

    /// Remove host files for clusters missing from a cloud inventory
    Gc {
        /// Inventory JSON file
        inventory: PathBuf,
    },

    /// List known clusters
    #[command(visible_alias = "ls")]
    List,

    /// Show the nodes of a cluster
    Show {
        /// Cluster name
        cluster: String,
    },

    /// Expand placeholders in command arguments
    Expand {
        /// Cluster name
        cluster: String,
        /// Target node
        #[arg(short, long, default_value = "1")]
        node: usize,
        /// Arguments to expand
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env();
    if let Some(dir) = &cli.host_dir {
        config = config.host_dir(dir);
    }
    if let Some(user) = &cli.user {
        config = config.os_user(user);
    }

    let registry = HostRegistry::from_config(&config)?;

    match cli.command {
        Commands::Init => {
            registry.init()?;
            println!("{}", registry.dir().display());
        }

        Commands::Sync { inventory } => {
            let cloud = Cloud::from_json_file(&inventory)?;
            registry.init()?;
            registry.sync(&cloud)?;
            println!("Synced {} clusters", cloud.clusters.len());
        }

        Commands::Gc { inventory } => {
            let cloud = Cloud::from_json_file(&inventory)?;
            for path in registry.gc(&cloud)? {
                println!("{}", path.display());
            }
        }

        Commands::List => {
            let catalog = registry.load()?;
            println!("{:<30} {:<6}", "CLUSTER", "NODES");
            for cluster in catalog.iter() {
                println!("{:<30} {:<6}", cluster.name(), cluster.node_count());
            }
        }

        Commands::Show { cluster } => {
            let catalog = registry.load()?;
            let cluster = catalog.require(&cluster)?;
            println!(
                "{:<6} {:<35} {:<45} {:<20}",
                "NODE", "ADDRESS", "LOCALITY", "VPC"
            );
            for node in cluster.nodes() {
                println!(
                    "{:<6} {:<35} {:<45} {:<20}",
                    node.index,
                    format!("{}@{}", node.user, node.host),
                    node.locality,
                    node.vpc
                );
            }
        }

        Commands::Expand {
            cluster,
            node,
            args,
        } => {
            let catalog = registry.load()?;
            let cluster = catalog.require(&cluster)?;
            let mut expander = Expander::new(node, CockroachImpl::new(config.base_port));
            for arg in expander.expand_all(cluster, &args) {
                println!("{}", arg);
            }
        }
    }

    Ok(())
}
