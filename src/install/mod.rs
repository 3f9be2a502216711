//! Command preparation for cluster nodes
//!
//! Resolves node selections and expands placeholder tokens in the
//! arguments of commands run against a cluster.

pub mod cockroach;
pub mod expander;
pub mod selector;

pub use cockroach::{ClusterImpl, CockroachImpl};
pub use expander::{
    ExpandContext, Expander, ExpanderCache, NodeListResolver, StoreDirResolver, TokenFamily,
    TokenResolver,
};
pub use selector::{list_nodes, NodeSelector, RangeSelector, ALL_NODES};
