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
// https://arxiv.org/abs/0803.0476

//! Multilevel Louvain driver and public facade.

use foldhash::{HashMap, HashMapExt};
use log::debug;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::community::dendrogram::{renumber, Dendrogram};
use crate::community::one_level::one_level;
use crate::community::status::CommunityStatus;
use crate::error::{Error, Result};
use crate::graph::WeightedGraph;

/// Tuning knobs for the optimizer, passed explicitly instead of living in
/// process-wide state.
#[derive(Clone, Debug)]
pub struct LouvainConfig {
    /// Resolution γ scaling the degree term of the modularity objective.
    /// Values above 1 favor smaller communities. Default 1.0.
    pub resolution: f64,
    /// Minimum modularity improvement for another sweep or another
    /// coarsening level. Default 1e-7.
    pub min_gain: f64,
    /// Cap on sweeps per level; `None` means sweep until stable.
    pub max_passes: Option<usize>,
    /// Seed for shuffling node visit order once per level. `None` keeps the
    /// graph's stable node order, making runs reproducible by construction.
    pub shuffle_seed: Option<u64>,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        LouvainConfig {
            resolution: 1.0,
            min_gain: 1e-7,
            max_passes: None,
            shuffle_seed: None,
        }
    }
}

/// Run the full coarsen-and-reoptimize loop, producing one dendrogram level
/// per round that improved modularity.
///
/// A zero-edge graph short-circuits to a single identity-partition level.
/// Otherwise each round optimizes the current graph, canonicalizes the
/// partition, records it, and rebuilds the quotient graph for the next
/// round, stopping once the modularity gain drops below
/// [`LouvainConfig::min_gain`]. The result always has at least one level.
/// Every coarse graph is an immutable value owned by its own round.
pub fn generate_dendrogram(graph: &WeightedGraph, config: &LouvainConfig) -> Result<Dendrogram> {
    if graph.num_edges() == 0 {
        // Every node is its own community; nothing to optimize.
        return Ok(Dendrogram::new(vec![graph.nodes().collect()]));
    }

    let mut rng = config.shuffle_seed.map(Pcg64::seed_from_u64);
    let mut levels: Vec<Vec<usize>> = Vec::new();

    let mut status = CommunityStatus::new(graph);
    one_level(graph, &mut status, config, rng.as_mut());
    let mut cur_mod = status.modularity(config.resolution);

    let mut partition = renumber(status.partition());
    levels.push(partition.clone());
    let mut current = graph.quotient(&partition)?;
    debug!(
        "level 0: {} nodes -> {} communities, modularity {cur_mod:.7}",
        graph.num_nodes(),
        current.num_nodes()
    );

    loop {
        let mut status = CommunityStatus::new(&current);
        one_level(&current, &mut status, config, rng.as_mut());
        let new_mod = status.modularity(config.resolution);
        if new_mod - cur_mod < config.min_gain {
            break;
        }

        partition = renumber(status.partition());
        levels.push(partition.clone());
        let coarser = current.quotient(&partition)?;
        debug!(
            "level {}: {} nodes -> {} communities, modularity {new_mod:.7}",
            levels.len() - 1,
            current.num_nodes(),
            coarser.num_nodes()
        );
        cur_mod = new_mod;
        current = coarser;
    }

    Ok(Dendrogram::new(levels))
}

/// Compute the best-found partition of `graph`: the coarsest level of the
/// full dendrogram, with community ids dense in `0..k`.
///
/// This is a heuristic local optimum, not a guaranteed global one.
pub fn best_partition(graph: &WeightedGraph, config: &LouvainConfig) -> Result<Vec<usize>> {
    let dendrogram = generate_dendrogram(graph, config)?;
    Ok(dendrogram.final_partition())
}

/// Modularity of an explicit node-to-community assignment at resolution
/// `gamma`: Σ_c L_c/m − γ·(k_c/2m)².
///
/// Errors if `partition` does not have one entry per node. A zero-edge
/// graph has modularity 0 by convention.
pub fn modularity(graph: &WeightedGraph, partition: &[usize], gamma: f64) -> Result<f64> {
    if partition.len() != graph.num_nodes() {
        return Err(Error::PartitionLength {
            expected: graph.num_nodes(),
            found: partition.len(),
        });
    }
    let two_m = graph.total_weight();
    if two_m == 0.0 {
        return Ok(0.0);
    }

    let mut internal: HashMap<usize, f64> = HashMap::new();
    let mut degree: HashMap<usize, f64> = HashMap::new();
    for u in graph.nodes() {
        *degree.entry(partition[u]).or_insert(0.0) += graph.weighted_degree(u);
        for (v, w) in graph.neighbors(u) {
            // Each internal edge counted once, doubled so that
            // internal / 2m equals the L_c / m coverage term.
            if partition[u] == partition[v] && u <= v {
                *internal.entry(partition[u]).or_insert(0.0) += 2.0 * w;
            }
        }
    }

    let mut q = 0.0;
    for (com, &deg) in &degree {
        let inc = internal.get(com).copied().unwrap_or(0.0);
        q += inc / two_m - gamma * (deg / two_m) * (deg / two_m);
    }
    Ok(q)
}

/// Group a node-to-community assignment into explicit member lists, ordered
/// by each community's smallest node id so equal partitions always produce
/// the same grouping.
pub fn group_communities(partition: &[usize]) -> Vec<Vec<usize>> {
    let mut members: HashMap<usize, Vec<usize>> = HashMap::with_capacity(partition.len());
    for (node, &com) in partition.iter().enumerate() {
        members.entry(com).or_default().push(node);
    }
    let mut result: Vec<Vec<usize>> = members.into_values().collect();
    result.sort_by_key(|com| com.first().copied().unwrap_or(usize::MAX));
    result
}

/// Rebuild a node-to-community assignment from explicit member lists.
///
/// Errors unless the lists cover every node of a `num_nodes`-node graph
/// exactly once.
pub fn partition_from_communities(
    communities: &[Vec<usize>],
    num_nodes: usize,
) -> Result<Vec<usize>> {
    let mut partition = vec![usize::MAX; num_nodes];
    for (com, members) in communities.iter().enumerate() {
        for &node in members {
            if node >= num_nodes {
                return Err(Error::InvalidPartition {
                    reason: format!("node {node} out of bounds for {num_nodes} nodes"),
                });
            }
            if partition[node] != usize::MAX {
                return Err(Error::InvalidPartition {
                    reason: format!("node {node} appears in more than one community"),
                });
            }
            partition[node] = com;
        }
    }
    if let Some(node) = partition.iter().position(|&c| c == usize::MAX) {
        return Err(Error::InvalidPartition {
            reason: format!("node {node} is not covered by any community"),
        });
    }
    Ok(partition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn two_triangles_with_bridge() -> WeightedGraph {
        WeightedGraph::from_edges(
            6,
            [
                (0, 1, 1.0),
                (0, 2, 1.0),
                (1, 2, 1.0),
                (3, 4, 1.0),
                (3, 5, 1.0),
                (4, 5, 1.0),
                (2, 3, 0.1),
            ],
        )
        .unwrap()
    }

    #[test]
    fn zero_edge_graph_yields_identity_partition() {
        let g = WeightedGraph::new(4);
        let partition = best_partition(&g, &LouvainConfig::default()).unwrap();
        assert_eq!(partition, vec![0, 1, 2, 3]);
        let d = generate_dendrogram(&g, &LouvainConfig::default()).unwrap();
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn single_edge_pair_shares_a_community() {
        let g = WeightedGraph::from_edges(2, [(0, 1, 1.0)]).unwrap();
        let partition = best_partition(&g, &LouvainConfig::default()).unwrap();
        assert_eq!(partition, vec![0, 0]);
    }

    #[test]
    fn two_triangles_split_at_the_bridge() {
        let g = two_triangles_with_bridge();
        let partition = best_partition(&g, &LouvainConfig::default()).unwrap();
        assert_eq!(partition, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn best_partition_ids_are_dense() {
        let g = two_triangles_with_bridge();
        let partition = best_partition(&g, &LouvainConfig::default()).unwrap();
        let max = partition.iter().copied().max().unwrap();
        for com in 0..=max {
            assert!(partition.contains(&com), "gap at community id {com}");
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let g = two_triangles_with_bridge();
        let config = LouvainConfig::default();
        let a = best_partition(&g, &config).unwrap();
        let b = best_partition(&g, &config).unwrap();
        assert_eq!(a, b);

        let seeded = LouvainConfig {
            shuffle_seed: Some(42),
            ..LouvainConfig::default()
        };
        let a = best_partition(&g, &seeded).unwrap();
        let b = best_partition(&g, &seeded).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn modularity_is_non_decreasing_across_levels() {
        let g = WeightedGraph::from_edges(
            9,
            [
                (0, 1, 1.0),
                (0, 2, 1.0),
                (1, 2, 1.0),
                (3, 4, 1.0),
                (3, 5, 1.0),
                (4, 5, 1.0),
                (6, 7, 1.0),
                (6, 8, 1.0),
                (7, 8, 1.0),
                (2, 3, 0.2),
                (5, 6, 0.2),
                (8, 0, 0.2),
            ],
        )
        .unwrap();
        init_logs();
        let config = LouvainConfig::default();
        let d = generate_dendrogram(&g, &config).unwrap();
        let mut previous = f64::NEG_INFINITY;
        for level in 0..d.len() {
            let q = modularity(&g, &d.partition_at_level(level), config.resolution).unwrap();
            assert!(
                q >= previous - 1e-12,
                "modularity dropped at level {level}: {previous} -> {q}"
            );
            previous = q;
        }
    }

    #[test]
    fn dendrogram_levels_chain_by_length() {
        let g = two_triangles_with_bridge();
        let d = generate_dendrogram(&g, &LouvainConfig::default()).unwrap();
        assert!(!d.is_empty());
        assert_eq!(d.levels()[0].len(), g.num_nodes());
        for i in 1..d.len() {
            let coms_below = d.levels()[i - 1].iter().copied().max().unwrap() + 1;
            assert_eq!(d.levels()[i].len(), coms_below);
        }
    }

    #[test]
    fn modularity_matches_known_value() {
        let g = two_triangles_with_bridge();
        // Two triangle communities, m = 6.1: Q = Σ_c (3/6.1 − (6.1/12.2)²).
        let q = modularity(&g, &[0, 0, 0, 1, 1, 1], 1.0).unwrap();
        let expected = 2.0 * (3.0 / 6.1 - (6.1_f64 / 12.2).powi(2));
        assert!((q - expected).abs() < 1e-12);

        assert!(matches!(
            modularity(&g, &[0, 0], 1.0),
            Err(Error::PartitionLength { .. })
        ));
    }

    #[test]
    fn higher_resolution_fragments_communities() {
        let g = two_triangles_with_bridge();
        let coarse = best_partition(&g, &LouvainConfig::default()).unwrap();
        let fine = best_partition(
            &g,
            &LouvainConfig {
                resolution: 8.0,
                ..LouvainConfig::default()
            },
        )
        .unwrap();
        let count = |p: &[usize]| p.iter().copied().max().unwrap() + 1;
        assert!(count(&fine) >= count(&coarse));
    }

    #[test]
    fn grouping_round_trips() {
        let partition = vec![0, 0, 1, 2, 1, 0];
        let groups = group_communities(&partition);
        assert_eq!(groups, vec![vec![0, 1, 5], vec![2, 4], vec![3]]);
        let back = partition_from_communities(&groups, 6).unwrap();
        assert_eq!(back, vec![0, 0, 1, 2, 1, 0]);
    }

    #[test]
    fn partition_from_communities_validates_coverage() {
        assert!(matches!(
            partition_from_communities(&[vec![0, 1], vec![1]], 2),
            Err(Error::InvalidPartition { .. })
        ));
        assert!(matches!(
            partition_from_communities(&[vec![0]], 2),
            Err(Error::InvalidPartition { .. })
        ));
        assert!(matches!(
            partition_from_communities(&[vec![0, 5]], 2),
            Err(Error::InvalidPartition { .. })
        ));
    }
}
