//! Dependency Graph Engine
//!
//! Builds a directed graph over schema objects from dependency edge facts and
//! derives per-object navigation data: direct neighbors, transitive impact,
//! cycles, and an importance ranking.
//!
//! The engine is pure and synchronous. Malformed input (an edge endpoint that
//! is not part of the schema snapshot) is programmer error in the caller and
//! panics rather than surfacing as a user-facing `Result`; the orchestrator
//! filters edges against the snapshot before building.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::Direction;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{DetectedVia, ObjectDependency, ObjectRef};

/// Per-object output of the graph engine.
///
/// One entry exists for every object that participates in at least one edge.
/// Objects without edges are not graph nodes; they are reported in
/// [`DependencyAnalysis::standalone`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDependency {
    /// The object this entry describes
    pub object: ObjectRef,

    /// Canonical keys of direct out-edge targets, sorted
    pub depends_on: Vec<String>,

    /// Canonical keys of direct in-edge sources, sorted
    pub referenced_by: Vec<String>,

    /// Canonical keys of everything reachable via out-edges, sorted
    pub transitive_impact: Vec<String>,

    /// Importance ranking; see [`TableDependency::importance`]
    pub importance_score: usize,
}

impl TableDependency {
    /// Importance policy: `3×|referenced_by| + |depends_on| + |transitive_impact|`.
    ///
    /// Being a dependency target is the strongest centrality signal, hence the
    /// triple weight on `referenced_by`. The formula is part of the report
    /// contract and must not drift.
    fn importance(referenced_by: usize, depends_on: usize, transitive_impact: usize) -> usize {
        3 * referenced_by + depends_on + transitive_impact
    }
}

/// Full output of one graph analysis pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    /// One entry per graph node, sorted by importance descending
    pub dependencies: Vec<TableDependency>,

    /// Detected cycles: each is the sorted member-key list of one strongly
    /// connected component of size > 1, or a self-loop
    pub cycles: Vec<Vec<String>>,

    /// Canonical keys of objects with no edges at all, sorted
    pub standalone: Vec<String>,
}

impl DependencyAnalysis {
    /// Find the entry for a canonical key.
    pub fn get(&self, key: &str) -> Option<&TableDependency> {
        self.dependencies
            .iter()
            .find(|d| d.object.canonical_key() == key)
    }
}

/// Directed dependency graph over schema objects.
pub struct DependencyGraph {
    graph: StableGraph<ObjectRef, DetectedVia>,
    standalone: Vec<String>,
}

impl DependencyGraph {
    /// Build a graph from a schema's object list and its dependency facts.
    ///
    /// Nodes are created only for objects that appear as an endpoint of at
    /// least one edge; the rest are recorded as standalone.
    ///
    /// # Panics
    /// Panics if an edge endpoint does not appear in `objects`.
    pub fn build(objects: &[ObjectRef], edges: &[ObjectDependency]) -> Self {
        let known: HashMap<String, &ObjectRef> = objects
            .iter()
            .map(|o| (o.canonical_key(), o))
            .collect();

        let mut graph = StableGraph::new();
        let mut indices: HashMap<String, NodeIndex> = HashMap::new();

        let node_for = |graph: &mut StableGraph<ObjectRef, DetectedVia>,
                        indices: &mut HashMap<String, NodeIndex>,
                        endpoint: &ObjectRef| {
            let key = endpoint.canonical_key();
            let obj = *known
                .get(&key)
                .unwrap_or_else(|| panic!("dangling edge endpoint '{}' not in schema", key));
            *indices
                .entry(key)
                .or_insert_with(|| graph.add_node(obj.clone()))
        };

        for edge in edges {
            let from = node_for(&mut graph, &mut indices, &edge.from);
            let to = node_for(&mut graph, &mut indices, &edge.to);
            graph.add_edge(from, to, edge.via);
        }

        let mut standalone: Vec<String> = objects
            .iter()
            .map(|o| o.canonical_key())
            .filter(|k| !indices.contains_key(k))
            .collect();
        standalone.sort();
        standalone.dedup();

        debug!(
            "dependency graph: {} nodes, {} edges, {} standalone objects",
            graph.node_count(),
            graph.edge_count(),
            standalone.len()
        );

        Self { graph, standalone }
    }

    /// Number of graph nodes (objects with at least one edge).
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Run the full analysis: neighbors, impact, importance, cycles.
    pub fn analyze(&self) -> DependencyAnalysis {
        let nodes: Vec<NodeIndex> = self.graph.node_indices().collect();

        // Impact search is independent per node; fan out across cores.
        let mut dependencies: Vec<TableDependency> = nodes
            .par_iter()
            .map(|&ix| self.node_dependency(ix))
            .collect();

        dependencies.sort_by(|a, b| {
            b.importance_score
                .cmp(&a.importance_score)
                .then_with(|| a.object.canonical_key().cmp(&b.object.canonical_key()))
        });

        DependencyAnalysis {
            dependencies,
            cycles: self.cycles(),
            standalone: self.standalone.clone(),
        }
    }

    /// Detect cycles as strongly connected components.
    ///
    /// Any SCC with more than one member is a cycle, as is a single node
    /// carrying a self-loop. Members are reported sorted and the cycle list
    /// is sorted by first member, for deterministic report output. Detection
    /// only; no attempt is made to rank or break cycles.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some())
            .map(|scc| {
                let mut members: Vec<String> = scc
                    .iter()
                    .map(|&ix| self.graph[ix].canonical_key())
                    .collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();
        cycles
    }

    fn node_dependency(&self, ix: NodeIndex) -> TableDependency {
        let depends_on: BTreeSet<String> = self
            .graph
            .neighbors_directed(ix, Direction::Outgoing)
            .map(|n| self.graph[n].canonical_key())
            .collect();

        let referenced_by: BTreeSet<String> = self
            .graph
            .neighbors_directed(ix, Direction::Incoming)
            .map(|n| self.graph[n].canonical_key())
            .collect();

        let transitive_impact = self.transitive_impact(ix);

        let importance_score = TableDependency::importance(
            referenced_by.len(),
            depends_on.len(),
            transitive_impact.len(),
        );

        TableDependency {
            object: self.graph[ix].clone(),
            depends_on: depends_on.into_iter().collect(),
            referenced_by: referenced_by.into_iter().collect(),
            transitive_impact,
            importance_score,
        }
    }

    /// Everything reachable from `start` via out-edges.
    ///
    /// Breadth-first with a visited-set guard, so cycles terminate and each
    /// node is expanded at most once. `start` itself appears in the result
    /// only if a cycle leads back to it.
    fn transitive_impact(&self, start: NodeIndex) -> Vec<String> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();

        for n in self.graph.neighbors_directed(start, Direction::Outgoing) {
            if visited.insert(n) {
                queue.push_back(n);
            }
        }

        while let Some(ix) = queue.pop_front() {
            for n in self.graph.neighbors_directed(ix, Direction::Outgoing) {
                if visited.insert(n) {
                    queue.push_back(n);
                }
            }
        }

        let mut impact: Vec<String> = visited
            .into_iter()
            .map(|ix| self.graph[ix].canonical_key())
            .collect();
        impact.sort();
        impact
    }
}
