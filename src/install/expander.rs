//! Placeholder expansion for command arguments
//!
//! Arguments may embed `{...}` tokens that are rewritten against a cluster
//! before a command is run on a node:
//!
//! - `{pgurl}` / `{pgurl:<nodes>}`: connection URLs, space separated
//! - `{pgport}` / `{pgport:<nodes>}`: SQL ports, space separated
//! - `{store-dir}`: data directory of the target node
//!
//! Unrecognized tokens are left untouched. A bad node selection replaces
//! its token with the error text instead of failing the expansion.

use super::cockroach::ClusterImpl;
use super::selector::{NodeSelector, RangeSelector, ALL_NODES};
use crate::cluster::Cluster;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

static PARAMETER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("parameter pattern is valid"));

static PG_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{pgurl(?::([^{}]*))?\}$").expect("pgurl pattern is valid")
});

static PG_PORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{pgport(?::([^{}]*))?\}$").expect("pgport pattern is valid")
});

const STORE_DIR_TOKEN: &str = "{store-dir}";

/// Per-node value tables that are cached while expanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenFamily {
    /// Connection URLs
    PgUrl,
    /// SQL ports
    PgPort,
}

impl TokenFamily {
    /// Build the table for every node of `cluster`
    fn build(self, cluster: &Cluster, imp: &dyn ClusterImpl) -> BTreeMap<usize, String> {
        let nodes = cluster.all_nodes();
        match self {
            TokenFamily::PgUrl => cluster.pg_urls(imp, &nodes),
            TokenFamily::PgPort => cluster.pg_ports(imp, &nodes),
        }
    }
}

/// Lazily built per-node tables, valid for a single cluster
#[derive(Debug, Default)]
pub struct ExpanderCache {
    cluster: Option<String>,
    tables: HashMap<TokenFamily, BTreeMap<usize, String>>,
}

impl ExpanderCache {
    /// Drop cached tables if they were built for another cluster
    fn bind(&mut self, cluster: &str) {
        if self.cluster.as_deref() != Some(cluster) {
            self.tables.clear();
            self.cluster = Some(cluster.to_string());
        }
    }

    /// Table for `family`, building it on first use
    pub fn table<F>(&mut self, family: TokenFamily, build: F) -> &BTreeMap<usize, String>
    where
        F: FnOnce() -> BTreeMap<usize, String>,
    {
        self.tables.entry(family).or_insert_with(build)
    }

    /// Check whether a table has been built
    pub fn contains(&self, family: TokenFamily) -> bool {
        self.tables.contains_key(&family)
    }
}

/// State visible to resolvers while expanding one argument
pub struct ExpandContext<'a> {
    cluster: &'a Cluster,
    imp: &'a dyn ClusterImpl,
    selector: &'a dyn NodeSelector,
    node: usize,
    cache: &'a mut ExpanderCache,
}

impl<'a> ExpandContext<'a> {
    pub fn cluster(&self) -> &'a Cluster {
        self.cluster
    }

    pub fn imp(&self) -> &'a dyn ClusterImpl {
        self.imp
    }

    pub fn selector(&self) -> &'a dyn NodeSelector {
        self.selector
    }

    /// Target node of the expansion
    pub fn node(&self) -> usize {
        self.node
    }

    pub fn cache(&mut self) -> &mut ExpanderCache {
        self.cache
    }
}

/// Rewrites one kind of token
pub trait TokenResolver {
    /// Replacement for `token` (braces included), or `None` if it is not handled here
    fn try_expand(&self, ctx: &mut ExpandContext<'_>, token: &str) -> Option<String>;
}

/// Resolver for tokens that take an optional node selection
pub struct NodeListResolver {
    family: TokenFamily,
    pattern: &'static Regex,
}

impl NodeListResolver {
    /// `{pgurl}` / `{pgurl:<nodes>}`
    pub fn pg_url() -> Self {
        Self {
            family: TokenFamily::PgUrl,
            pattern: &PG_URL_RE,
        }
    }

    /// `{pgport}` / `{pgport:<nodes>}`
    pub fn pg_port() -> Self {
        Self {
            family: TokenFamily::PgPort,
            pattern: &PG_PORT_RE,
        }
    }
}

impl TokenResolver for NodeListResolver {
    fn try_expand(&self, ctx: &mut ExpandContext<'_>, token: &str) -> Option<String> {
        let caps = self.pattern.captures(token)?;
        let expr = caps.get(1).map_or(ALL_NODES, |m| m.as_str());

        let (cluster, imp, selector) = (ctx.cluster, ctx.imp, ctx.selector);
        let family = self.family;
        let table = ctx.cache.table(family, || family.build(cluster, imp));

        let nodes = match selector.list_nodes(expr, cluster.node_count()) {
            Ok(nodes) => nodes,
            Err(e) => return Some(e.to_string()),
        };

        // Nodes without a table entry are skipped.
        let values: Vec<&str> = nodes
            .iter()
            .filter_map(|i| table.get(i).map(String::as_str))
            .collect();
        Some(values.join(" "))
    }
}

/// Resolver for `{store-dir}`
pub struct StoreDirResolver;

impl TokenResolver for StoreDirResolver {
    fn try_expand(&self, ctx: &mut ExpandContext<'_>, token: &str) -> Option<String> {
        if token != STORE_DIR_TOKEN {
            return None;
        }
        Some(ctx.imp.node_dir(ctx.cluster, ctx.node))
    }
}

/// Expands placeholder tokens for one target node
pub struct Expander {
    node: usize,
    imp: Box<dyn ClusterImpl>,
    selector: Box<dyn NodeSelector>,
    resolvers: Vec<Box<dyn TokenResolver>>,
    cache: ExpanderCache,
}

impl Expander {
    /// Create an expander targeting `node` with the built-in resolvers
    pub fn new(node: usize, imp: impl ClusterImpl + 'static) -> Self {
        Self {
            node,
            imp: Box::new(imp),
            selector: Box::new(RangeSelector),
            resolvers: vec![
                Box::new(NodeListResolver::pg_url()) as Box<dyn TokenResolver>,
                Box::new(NodeListResolver::pg_port()),
                Box::new(StoreDirResolver),
            ],
            cache: ExpanderCache::default(),
        }
    }

    /// Use a different node selector
    pub fn with_selector(mut self, selector: impl NodeSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Register a resolver, tried after the existing ones
    pub fn with_resolver(mut self, resolver: impl TokenResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Target node
    pub fn node(&self) -> usize {
        self.node
    }

    pub fn cache(&self) -> &ExpanderCache {
        &self.cache
    }

    /// Expand every token in `arg`
    pub fn expand(&mut self, cluster: &Cluster, arg: &str) -> String {
        let Self {
            node,
            imp,
            selector,
            resolvers,
            cache,
        } = self;
        cache.bind(cluster.name());

        let mut ctx = ExpandContext {
            cluster,
            imp: &**imp,
            selector: &**selector,
            node: *node,
            cache,
        };

        PARAMETER_RE
            .replace_all(arg, |caps: &Captures| {
                let token = &caps[0];
                resolvers
                    .iter()
                    .find_map(|r| r.try_expand(&mut ctx, token))
                    .unwrap_or_else(|| token.to_string())
            })
            .into_owned()
    }

    /// Expand a list of arguments
    pub fn expand_all<S: AsRef<str>>(&mut self, cluster: &Cluster, args: &[S]) -> Vec<String> {
        args.iter()
            .map(|arg| self.expand(cluster, arg.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::install::cockroach::REMOTE_STORE_DIR;
    use crate::install::CockroachImpl;
    use std::cell::Cell;
    use std::rc::Rc;

    fn demo() -> Cluster {
        let mut c = Cluster::new("demo");
        c.push_node("10.0.0.1", "alice", "us-east", "v1");
        c.push_node("10.0.0.2", "alice", "us-east", "v2");
        c.push_node("10.0.0.3", "alice", "us-east", "v3");
        c
    }

    fn url(host: &str) -> String {
        format!("'postgres://root@{}:26257?sslmode=disable'", host)
    }

    /// Counts port lookups
    struct CountingImpl {
        calls: Rc<Cell<usize>>,
    }

    impl ClusterImpl for CountingImpl {
        fn node_port(&self, _cluster: &Cluster, node: usize) -> u16 {
            self.calls.set(self.calls.get() + 1);
            9000 + node as u16
        }

        fn node_dir(&self, _cluster: &Cluster, node: usize) -> String {
            format!("/data/{}", node)
        }

        fn node_url(&self, _cluster: &Cluster, host: &str, port: u16) -> String {
            format!("pg://{}:{}", host, port)
        }
    }

    #[test]
    fn test_no_tokens_unchanged() {
        let mut e = Expander::new(1, CockroachImpl::default());
        let c = demo();
        assert_eq!(e.expand(&c, "--insecure"), "--insecure");
        assert_eq!(e.expand(&c, ""), "");
        assert!(!e.cache().contains(TokenFamily::PgUrl));
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let mut e = Expander::new(1, CockroachImpl::default());
        let c = demo();
        assert_eq!(e.expand(&c, "{foo} {pgurl"), "{foo} {pgurl");
        assert_eq!(e.expand(&c, "{store-dir:1}"), "{store-dir:1}");
    }

    #[test]
    fn test_pgurl_all_nodes() {
        let mut e = Expander::new(1, CockroachImpl::default());
        let out = e.expand(&demo(), "{pgurl}");
        assert_eq!(
            out,
            format!("{} {} {}", url("10.0.0.1"), url("10.0.0.2"), url("10.0.0.3"))
        );
    }

    #[test]
    fn test_pgurl_subset() {
        let mut e = Expander::new(2, CockroachImpl::default());
        let out = e.expand(&demo(), "{pgurl:1,3}");
        assert_eq!(out, format!("{} {}", url("10.0.0.1"), url("10.0.0.3")));
    }

    #[test]
    fn test_pgurl_in_argument() {
        let mut e = Expander::new(1, CockroachImpl::default());
        let out = e.expand(&demo(), "--url={pgurl:1}");
        assert_eq!(out, format!("--url={}", url("10.0.0.1")));
    }

    #[test]
    fn test_pgport() {
        let mut e = Expander::new(1, CockroachImpl::default());
        assert_eq!(e.expand(&demo(), "{pgport:2-3}"), "26257 26257");

        let mut local = Cluster::new("local");
        local.push_node("localhost", "me", "", "");
        local.push_node("localhost", "me", "", "");
        let mut e = Expander::new(1, CockroachImpl::default());
        assert_eq!(e.expand(&local, "p={pgport}"), "p=26257 26259");
    }

    #[test]
    fn test_store_dir_uses_target_node() {
        let calls = Rc::new(Cell::new(0));
        let mut e = Expander::new(2, CountingImpl { calls });
        assert_eq!(e.expand(&demo(), "--store={store-dir}"), "--store=/data/2");
    }

    #[test]
    fn test_bad_selection_is_inline() {
        let mut e = Expander::new(1, CockroachImpl::default());
        let out = e.expand(&demo(), "{pgport:abc} {store-dir} {pgport:1}");
        assert_eq!(
            out,
            format!(
                "unable to parse node \"abc\" in \"abc\" {} 26257",
                REMOTE_STORE_DIR
            )
        );
    }

    #[test]
    fn test_out_of_range_selection_is_inline() {
        let mut e = Expander::new(1, CockroachImpl::default());
        let out = e.expand(&demo(), "x={pgurl:9}");
        assert_eq!(out, "x=invalid node 9 (cluster has 3 nodes)");
    }

    #[test]
    fn test_empty_selection_is_inline() {
        // An empty suffix is claimed by the resolver and rejected by the
        // selector rather than passed through as an unknown token.
        let mut e = Expander::new(1, CockroachImpl::default());
        assert_eq!(
            e.expand(&demo(), "a={pgurl:} b={pgport:}"),
            "a=empty node specification b=empty node specification"
        );
    }

    #[test]
    fn test_huge_range_is_inline() {
        let mut e = Expander::new(1, CockroachImpl::default());
        let expr = format!("--join={{pgurl:1-{}}} {{store-dir}}", usize::MAX);
        assert_eq!(
            e.expand(&demo(), &expr),
            format!(
                "--join=invalid node {} (cluster has 3 nodes) {}",
                usize::MAX,
                REMOTE_STORE_DIR
            )
        );
    }

    #[test]
    fn test_empty_cluster_yields_empty() {
        let mut e = Expander::new(1, CockroachImpl::default());
        let empty = Cluster::new("empty");
        assert_eq!(e.expand(&empty, "[{pgurl}]"), "[]");
    }

    #[test]
    fn test_tables_built_once() {
        let calls = Rc::new(Cell::new(0));
        let mut e = Expander::new(
            1,
            CountingImpl {
                calls: calls.clone(),
            },
        );
        let c = demo();

        assert_eq!(e.expand(&c, "{pgport} {pgport:1}"), "9001 9002 9003 9001");
        assert_eq!(calls.get(), 3);
        assert!(e.cache().contains(TokenFamily::PgPort));
        assert!(!e.cache().contains(TokenFamily::PgUrl));

        assert_eq!(e.expand(&c, "{pgport:3}"), "9003");
        assert_eq!(calls.get(), 3);

        e.expand(&c, "{pgurl:2}");
        assert_eq!(calls.get(), 6);
    }

    #[test]
    fn test_cache_reset_for_other_cluster() {
        let mut e = Expander::new(1, CockroachImpl::default());
        assert_eq!(e.expand(&demo(), "{pgurl:1}"), url("10.0.0.1"));

        let mut other = Cluster::new("other");
        other.push_node("192.168.0.9", "bob", "", "");
        assert_eq!(e.expand(&other, "{pgurl:1}"), url("192.168.0.9"));
    }

    struct SparseSelector;

    impl NodeSelector for SparseSelector {
        fn list_nodes(&self, _expr: &str, _node_count: usize) -> Result<Vec<usize>> {
            Ok(vec![3, 42, 1])
        }
    }

    #[test]
    fn test_missing_table_entries_skipped() {
        let mut e = Expander::new(1, CockroachImpl::default()).with_selector(SparseSelector);
        assert_eq!(e.expand(&demo(), "{pgport}"), "26257 26257");
    }

    struct NodeIndexResolver;

    impl TokenResolver for NodeIndexResolver {
        fn try_expand(&self, ctx: &mut ExpandContext<'_>, token: &str) -> Option<String> {
            (token == "{node}").then(|| ctx.node().to_string())
        }
    }

    #[test]
    fn test_custom_resolver() {
        let mut e = Expander::new(3, CockroachImpl::default()).with_resolver(NodeIndexResolver);
        assert_eq!(e.expand(&demo(), "n{node}-{store-dir}"), format!("n3-{}", REMOTE_STORE_DIR));
    }

    #[test]
    fn test_expand_all() {
        let mut e = Expander::new(1, CockroachImpl::default());
        let args = ["start", "--store={store-dir}", "--join={pgport:1}"];
        assert_eq!(
            e.expand_all(&demo(), &args),
            vec!["start", "--store=/mnt/data1/cockroach", "--join=26257"]
        );
    }
}
