// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Weighted undirected graph storage for the Louvain engine.
//!
//! [`WeightedGraph`] is the read-only collaborator the optimization engine
//! runs against: it enumerates nodes in a stable order, enumerates weighted
//! neighbors (self-loop entry included), and produces the coarsened quotient
//! graph for the next level via [`WeightedGraph::quotient`].

use foldhash::{HashMap, HashMapExt};
use indexmap::IndexMap;
use petgraph::visit::{EdgeRef, IntoEdgeReferences, NodeCount, NodeIndexable};

use crate::error::{Error, Result};

/// Insertion-ordered adjacency row. Iteration order of these maps is part of
/// the deterministic contract: neighbor enumeration order is the order edges
/// were inserted, stable across runs.
pub(crate) type AdjMap = IndexMap<usize, f64, foldhash::fast::RandomState>;

/// A weighted undirected graph with contiguous node ids `0..n`.
///
/// Self-loops are permitted, stored once in the owning node's adjacency row,
/// and count twice toward that node's weighted degree. Parallel edges
/// accumulate into a single entry. Edge weights must be strictly positive;
/// [`WeightedGraph::add_edge`] rejects anything else.
#[derive(Clone, Debug, Default)]
pub struct WeightedGraph {
    adj: Vec<AdjMap>,
    num_edges: usize,
    // Sum of all weighted degrees, i.e. the standard 2m normalizer.
    // Self-loops contribute twice their weight.
    total_weight: f64,
}

impl WeightedGraph {
    /// Create a graph with `num_nodes` nodes and no edges.
    pub fn new(num_nodes: usize) -> Self {
        WeightedGraph {
            adj: vec![AdjMap::default(); num_nodes],
            num_edges: 0,
            total_weight: 0.0,
        }
    }

    /// Create a graph from an edge list.
    pub fn from_edges<I>(num_nodes: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut graph = Self::new(num_nodes);
        for (u, v, w) in edges {
            graph.add_edge(u, v, w)?;
        }
        Ok(graph)
    }

    /// Convert any petgraph-style undirected graph, extracting each edge's
    /// weight with `weight_fn`.
    pub fn from_graph<G, F>(graph: G, mut weight_fn: F) -> Result<Self>
    where
        G: IntoEdgeReferences + NodeCount + NodeIndexable,
        F: FnMut(G::EdgeRef) -> f64,
    {
        let mut out = Self::new(graph.node_count());
        for edge in graph.edge_references() {
            let u = graph.to_index(edge.source());
            let v = graph.to_index(edge.target());
            out.add_edge(u, v, weight_fn(edge))?;
        }
        Ok(out)
    }

    /// Add an undirected edge. Repeated `(u, v)` pairs accumulate weight.
    pub fn add_edge(&mut self, u: usize, v: usize, weight: f64) -> Result<()> {
        let num_nodes = self.adj.len();
        for node in [u, v] {
            if node >= num_nodes {
                return Err(Error::NodeOutOfBounds { node, num_nodes });
            }
        }
        if !(weight > 0.0) {
            return Err(Error::NonPositiveWeight {
                source: u,
                target: v,
                weight,
            });
        }

        let is_new = !self.adj[u].contains_key(&v);
        *self.adj[u].entry(v).or_insert(0.0) += weight;
        if u != v {
            *self.adj[v].entry(u).or_insert(0.0) += weight;
        }
        if is_new {
            self.num_edges += 1;
        }
        self.total_weight += 2.0 * weight;
        Ok(())
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.adj.len()
    }

    /// Number of distinct edges (parallel insertions collapse, self-loops
    /// count once).
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Sum of all weighted degrees: twice the total edge weight (`2m`).
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Node ids in stable ascending order.
    pub fn nodes(&self) -> std::ops::Range<usize> {
        0..self.adj.len()
    }

    /// Weighted neighbors of `node` in edge-insertion order. A self-loop
    /// appears as a `(node, weight)` entry with its stored (single) weight.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adj[node].iter().map(|(&v, &w)| (v, w))
    }

    /// Stored weight of `node`'s self-loop, 0 if there is none.
    pub fn self_loop(&self, node: usize) -> f64 {
        self.adj[node].get(&node).copied().unwrap_or(0.0)
    }

    /// Weighted degree of `node`; the self-loop contributes twice.
    pub fn weighted_degree(&self, node: usize) -> f64 {
        self.adj[node].values().sum::<f64>() + self.self_loop(node)
    }

    /// Build the coarsened quotient graph of a partition.
    ///
    /// The quotient's nodes are the distinct community ids of `partition`,
    /// densified to `0..k` in the order they are first encountered while
    /// scanning nodes in ascending id order (the same rule as
    /// [`crate::community::renumber`]). The weight between two coarse nodes
    /// is the sum of original edge weights crossing the two communities;
    /// weight internal to a community becomes a coarse self-loop. Total edge
    /// weight is invariant under this coarsening.
    pub fn quotient(&self, partition: &[usize]) -> Result<WeightedGraph> {
        let num_nodes = self.adj.len();
        if partition.len() != num_nodes {
            return Err(Error::PartitionLength {
                expected: num_nodes,
                found: partition.len(),
            });
        }

        let mut dense: HashMap<usize, usize> = HashMap::with_capacity(num_nodes);
        for &com in partition {
            let next = dense.len();
            dense.entry(com).or_insert(next);
        }
        let num_communities = dense.len();

        let mut coarse = WeightedGraph::new(num_communities);
        for u in 0..num_nodes {
            let cu = dense[&partition[u]];
            for (&v, &w) in &self.adj[u] {
                let cv = dense[&partition[v]];
                if cu != cv {
                    // Both directed entries of a cross edge land here, one
                    // per endpoint, keeping the coarse rows symmetric. Count
                    // the edge only from the lower-id row.
                    let is_new = !coarse.adj[cu].contains_key(&cv);
                    *coarse.adj[cu].entry(cv).or_insert(0.0) += w;
                    if is_new && cu < cv {
                        coarse.num_edges += 1;
                    }
                    coarse.total_weight += w;
                } else if u <= v {
                    // Internal edge (or original self-loop): counted once,
                    // stored as a coarse self-loop.
                    let is_new = !coarse.adj[cu].contains_key(&cu);
                    *coarse.adj[cu].entry(cu).or_insert(0.0) += w;
                    if is_new {
                        coarse.num_edges += 1;
                    }
                    coarse.total_weight += 2.0 * w;
                }
            }
        }
        debug_assert!(
            (coarse.total_weight - self.total_weight).abs() <= 1e-9 * self.total_weight.max(1.0)
        );
        Ok(coarse)
    }
}
