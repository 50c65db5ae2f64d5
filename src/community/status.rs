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

//! Incremental community aggregates for one coarsening level.

use indexmap::IndexMap;

use crate::graph::WeightedGraph;

/// Community id marking a node detached mid-move.
pub(crate) const UNASSIGNED: usize = usize::MAX;

/// Weight from a node to each neighboring community, in first-encounter
/// order of the node's adjacency row.
pub type NeighborWeights = IndexMap<usize, f64, foldhash::fast::RandomState>;

/// Running aggregates over a partition of one level's graph.
///
/// Node degrees and the `2m` normalizer are fixed at construction; the
/// per-community internal weight and degree sums are updated in O(1) by
/// [`CommunityStatus::remove`] / [`CommunityStatus::insert`], which is what
/// makes the greedy pass O(degree) per node. One instance serves exactly one
/// level's optimizer run and is discarded afterwards.
#[derive(Clone, Debug)]
pub struct CommunityStatus {
    node_to_com: Vec<usize>,
    // Weighted degree per node, self-loop counted twice. Immutable.
    node_degree: Vec<f64>,
    // Self-loop weight per node (stored once). Immutable.
    loops: Vec<f64>,
    // Sum of all weighted degrees (2m). Immutable.
    total_weight: f64,
    // Sum of node_degree over the members of each community.
    community_degree: Vec<f64>,
    // Twice the internal edge weight of each community, so that
    // community_internal[c] / total_weight is the modularity coverage term.
    community_internal: Vec<f64>,
}

impl CommunityStatus {
    /// Start from the singleton partition: every node its own community.
    pub fn new(graph: &WeightedGraph) -> Self {
        let n = graph.num_nodes();
        let mut node_degree = Vec::with_capacity(n);
        let mut loops = Vec::with_capacity(n);
        let mut community_internal = Vec::with_capacity(n);
        for node in graph.nodes() {
            let degree = graph.weighted_degree(node);
            let loop_weight = graph.self_loop(node);
            node_degree.push(degree);
            loops.push(loop_weight);
            community_internal.push(2.0 * loop_weight);
        }
        CommunityStatus {
            node_to_com: (0..n).collect(),
            community_degree: node_degree.clone(),
            node_degree,
            loops,
            total_weight: graph.total_weight(),
            community_internal,
        }
    }

    /// Current community of `node`.
    pub fn community_of(&self, node: usize) -> usize {
        self.node_to_com[node]
    }

    /// The current node-to-community assignment.
    pub fn partition(&self) -> &[usize] {
        &self.node_to_com
    }

    /// Weighted degree of `node`, fixed at construction.
    pub fn node_degree(&self, node: usize) -> f64 {
        self.node_degree[node]
    }

    /// Sum of member degrees of community `com`.
    pub fn community_degree(&self, com: usize) -> f64 {
        self.community_degree[com]
    }

    /// The `2m` normalizer of this level's graph.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Weight from `node` to each community it touches through an edge,
    /// self-loops excluded. O(degree).
    pub fn neighbor_communities(&self, graph: &WeightedGraph, node: usize) -> NeighborWeights {
        let mut weights = NeighborWeights::default();
        for (neighbor, weight) in graph.neighbors(node) {
            if neighbor != node {
                *weights.entry(self.node_to_com[neighbor]).or_insert(0.0) += weight;
            }
        }
        weights
    }

    /// Detach `node` from `com`. `weight_to_com` is the weight from `node`
    /// to the other members of `com`, as reported by
    /// [`CommunityStatus::neighbor_communities`]. O(1).
    pub fn remove(&mut self, node: usize, com: usize, weight_to_com: f64) {
        debug_assert_eq!(self.node_to_com[node], com);
        self.community_degree[com] -= self.node_degree[node];
        self.community_internal[com] -= 2.0 * (weight_to_com + self.loops[node]);
        self.node_to_com[node] = UNASSIGNED;
    }

    /// Attach `node` to `com`; symmetric to [`CommunityStatus::remove`]. O(1).
    pub fn insert(&mut self, node: usize, com: usize, weight_to_com: f64) {
        debug_assert_eq!(self.node_to_com[node], UNASSIGNED);
        self.node_to_com[node] = com;
        self.community_degree[com] += self.node_degree[node];
        self.community_internal[com] += 2.0 * (weight_to_com + self.loops[node]);
    }

    /// Modularity of the current partition at resolution `gamma`:
    /// Σ_c internal[c]/2m − γ·(degree[c]/2m)². O(#communities).
    ///
    /// Callers guard the `2m == 0` case (a zero-edge graph never reaches an
    /// optimizer run).
    pub fn modularity(&self, gamma: f64) -> f64 {
        debug_assert!(self.total_weight > 0.0);
        let two_m = self.total_weight;
        let mut result = 0.0;
        for (internal, degree) in self.community_internal.iter().zip(&self.community_degree) {
            result += internal / two_m - gamma * (degree / two_m) * (degree / two_m);
        }
        result
    }

    /// Between moves, the community degree sums must add back up to 2m.
    pub(crate) fn check_degree_invariant(&self) {
        let sum: f64 = self.community_degree.iter().sum();
        debug_assert!(
            (sum - self.total_weight).abs() <= 1e-9 * self.total_weight.max(1.0),
            "community degree sum {sum} drifted from 2m = {}",
            self.total_weight
        );
    }
}

#[cfg(test)]
mod tests {
    use super::CommunityStatus;
    use crate::graph::WeightedGraph;

    const EPS: f64 = 1e-12;

    fn square_graph() -> WeightedGraph {
        // 4-cycle with one self-loop
        WeightedGraph::from_edges(
            4,
            [
                (0, 1, 1.0),
                (1, 2, 1.0),
                (2, 3, 1.0),
                (3, 0, 1.0),
                (0, 0, 0.5),
            ],
        )
        .unwrap()
    }

    fn degree_sum(status: &CommunityStatus) -> f64 {
        (0..status.partition().len())
            .map(|c| status.community_degree(c))
            .sum()
    }

    #[test]
    fn singleton_construction() {
        let g = square_graph();
        let status = CommunityStatus::new(&g);
        assert_eq!(status.partition(), &[0, 1, 2, 3]);
        assert_eq!(status.total_weight(), 9.0);
        assert!((status.node_degree(0) - 3.0).abs() < EPS);
        assert!((status.node_degree(1) - 2.0).abs() < EPS);
        assert!((degree_sum(&status) - status.total_weight()).abs() < EPS);
    }

    #[test]
    fn neighbor_communities_excludes_self_loop() {
        let g = square_graph();
        let status = CommunityStatus::new(&g);
        let neigh = status.neighbor_communities(&g, 0);
        let entries: Vec<_> = neigh.iter().map(|(&c, &w)| (c, w)).collect();
        assert_eq!(entries, vec![(1, 1.0), (3, 1.0)]);
    }

    #[test]
    fn neighbor_communities_aggregates_by_community() {
        let g = square_graph();
        let mut status = CommunityStatus::new(&g);
        // Merge 1 and 3 into the same community, then node 0 sees both
        // edges through a single entry.
        status.remove(3, 3, 0.0);
        status.insert(3, 1, 0.0);
        let neigh = status.neighbor_communities(&g, 0);
        let entries: Vec<_> = neigh.iter().map(|(&c, &w)| (c, w)).collect();
        assert_eq!(entries, vec![(1, 2.0)]);
    }

    #[test]
    fn remove_insert_round_trip_preserves_invariant() {
        let g = square_graph();
        let mut status = CommunityStatus::new(&g);
        let before = status.modularity(1.0);

        let neigh = status.neighbor_communities(&g, 1);
        let w_own = neigh.get(&1).copied().unwrap_or(0.0);
        status.remove(1, 1, w_own);
        status.insert(1, 0, neigh.get(&0).copied().unwrap_or(0.0));
        assert!((degree_sum(&status) - status.total_weight()).abs() < EPS);
        status.check_degree_invariant();

        // Move it back; aggregates must return to the starting state.
        let neigh = status.neighbor_communities(&g, 1);
        status.remove(1, 0, neigh.get(&0).copied().unwrap_or(0.0));
        status.insert(1, 1, 0.0);
        assert!((degree_sum(&status) - status.total_weight()).abs() < EPS);
        assert!((status.modularity(1.0) - before).abs() < EPS);
    }

    #[test]
    fn modularity_matches_hand_computation() {
        // Two nodes, one edge: singleton partition.
        let g = WeightedGraph::from_edges(2, [(0, 1, 1.0)]).unwrap();
        let status = CommunityStatus::new(&g);
        // Q = Σ_c (0/2 - (1/2)^2) = -0.5
        assert!((status.modularity(1.0) - (-0.5)).abs() < EPS);

        // After merging both nodes: Q = 2/2 - (2/2)^2 = 0
        let mut status = CommunityStatus::new(&g);
        let neigh = status.neighbor_communities(&g, 1);
        status.remove(1, 1, 0.0);
        status.insert(1, 0, neigh.get(&0).copied().unwrap_or(0.0));
        assert!(status.modularity(1.0).abs() < EPS);
    }

    #[test]
    fn resolution_scales_degree_term() {
        let g = WeightedGraph::from_edges(2, [(0, 1, 1.0)]).unwrap();
        let status = CommunityStatus::new(&g);
        // Q(γ) = -γ/2 for the singleton partition of a single edge.
        assert!((status.modularity(2.0) - (-1.0)).abs() < EPS);
        assert!((status.modularity(0.5) - (-0.25)).abs() < EPS);
    }
}
