//! Dependency graph between invoked services.
//!
//! Edges are recorded as services are built: when the provider of `A` invokes
//! `B`, the edge `A -> B` is added. The graph is observational only; it is
//! never consulted for resolution and edges are never removed.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::key::EdgeService;

#[cfg(feature = "graph-export")]
use serde::{Deserialize, Serialize};

#[derive(Default)]
struct GraphInner {
    dependencies: HashMap<EdgeService, HashSet<EdgeService>>,
    dependents: HashMap<EdgeService, HashSet<EdgeService>>,
}

/// Tree-wide store of `(scope, service)` dependency edges.
///
/// Both directions are kept in sync: `to` is in `dependencies(from)` exactly
/// when `from` is in `dependents(to)`.
///
/// # Examples
///
/// ```
/// use ferrous_injector::{Injector, Invoker};
///
/// let injector = Injector::new();
/// injector.provide_value("config", 1u8).unwrap();
/// injector.provide_lazy("db", |ctx| Ok(*ctx.invoke::<u8>("config")? + 1)).unwrap();
/// injector.invoke::<u8>("db").unwrap();
///
/// let db = injector.list_invoked().into_iter().find(|e| e.service == "db").unwrap();
/// let (dependencies, dependents) = injector.graph().query(&db);
/// assert_eq!(dependencies.len(), 1);
/// assert_eq!(dependencies[0].service, "config");
/// assert!(dependents.is_empty());
/// ```
#[derive(Default)]
pub struct DependencyGraph {
    inner: RwLock<GraphInner>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_edge(&self, from: EdgeService, to: EdgeService) {
        let mut inner = self.inner.write();
        inner
            .dependencies
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        inner.dependents.entry(to).or_default().insert(from);
    }

    /// Direct dependencies and direct dependents of `edge`, each sorted.
    /// Unknown services yield two empty lists.
    pub fn query(&self, edge: &EdgeService) -> (Vec<EdgeService>, Vec<EdgeService>) {
        let inner = self.inner.read();
        (
            sorted(inner.dependencies.get(edge)),
            sorted(inner.dependents.get(edge)),
        )
    }

    /// Direct dependencies of `edge`.
    pub fn dependencies_of(&self, edge: &EdgeService) -> Vec<EdgeService> {
        sorted(self.inner.read().dependencies.get(edge))
    }

    /// Direct dependents of `edge`.
    pub fn dependents_of(&self, edge: &EdgeService) -> Vec<EdgeService> {
        sorted(self.inner.read().dependents.get(edge))
    }

    /// Every edge as `(from, to)`, sorted.
    pub fn edges(&self) -> Vec<(EdgeService, EdgeService)> {
        let inner = self.inner.read();
        let mut edges: Vec<(EdgeService, EdgeService)> = inner
            .dependencies
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (from.clone(), to.clone())))
            .collect();
        edges.sort();
        edges
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.inner.read().dependencies.values().map(HashSet::len).sum()
    }

    /// True when no edge has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializable copy of the graph.
    #[cfg(feature = "graph-export")]
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            exported_at: chrono::Utc::now().to_rfc3339(),
            edges: self
                .edges()
                .into_iter()
                .map(|(from, to)| GraphEdge { from, to })
                .collect(),
        }
    }
}

fn sorted(set: Option<&HashSet<EdgeService>>) -> Vec<EdgeService> {
    let mut out: Vec<EdgeService> = set.map(|s| s.iter().cloned().collect()).unwrap_or_default();
    out.sort();
    out
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("edges", &self.len())
            .finish()
    }
}

/// An edge of an exported graph: `from` depends on `to`.
#[cfg(feature = "graph-export")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: EdgeService,
    pub to: EdgeService,
}

/// Point-in-time export of the dependency graph.
#[cfg(feature = "graph-export")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// RFC 3339 timestamp
    pub exported_at: String,
    pub edges: Vec<GraphEdge>,
}

#[cfg(feature = "graph-export")]
impl GraphSnapshot {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// DOT format for Graphviz. Nodes are labelled `scope/service`.
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph DependencyGraph {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n\n");
        for edge in &self.edges {
            output.push_str(&format!(
                "  \"{}\" -> \"{}\";\n",
                dot_node(&edge.from),
                dot_node(&edge.to)
            ));
        }
        output.push_str("}\n");
        output
    }
}

#[cfg(feature = "graph-export")]
fn dot_node(edge: &EdgeService) -> String {
    edge.to_string().replace('"', "\\\"")
}
