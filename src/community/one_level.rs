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

//! Single-level greedy optimization pass.

use log::trace;
use rand::prelude::*;
use rand_pcg::Pcg64;
use rayon::prelude::*;

use crate::community::louvain::LouvainConfig;
use crate::community::status::{CommunityStatus, NeighborWeights};
use crate::graph::WeightedGraph;

/// Below this many candidate communities, scoring a node's moves in
/// parallel costs more than it saves.
const PARALLEL_SCORING_CUTOFF: usize = 512;

/// Run greedy sweeps over `graph` until the level converges: no node moved,
/// the sweep-over-sweep modularity gain fell below `config.min_gain`, or the
/// pass cap was reached. Returns whether any node changed community.
///
/// Nodes are visited in the graph's stable order, shuffled once per level
/// when an RNG is supplied. Candidate scoring per node is side-effect-free
/// and may fan out over rayon; the reduction is sequential and keeps the
/// first-encountered maximum, so the outcome does not depend on scheduling.
pub(crate) fn one_level(
    graph: &WeightedGraph,
    status: &mut CommunityStatus,
    config: &LouvainConfig,
    rng: Option<&mut Pcg64>,
) -> bool {
    let mut nodes: Vec<usize> = graph.nodes().collect();
    if let Some(rng) = rng {
        nodes.shuffle(rng);
    }

    let mut moved_any = false;
    let mut modified = true;
    let mut passes = 0usize;
    let mut cur_mod = status.modularity(config.resolution);

    while modified && config.max_passes.map_or(true, |cap| passes < cap) {
        modified = false;
        passes += 1;
        let mut moves = 0usize;

        for &node in &nodes {
            let com = status.community_of(node);
            let degc_totw = status.node_degree(node) / status.total_weight();
            let neigh = status.neighbor_communities(graph, node);
            let weight_to_own = neigh.get(&com).copied().unwrap_or(0.0);

            status.remove(node, com, weight_to_own);

            let best = best_candidate(status, &neigh, com, weight_to_own, degc_totw, config);
            let weight_to_best = if best == com {
                weight_to_own
            } else {
                neigh[&best]
            };
            status.insert(node, best, weight_to_best);

            if best != com {
                modified = true;
                moved_any = true;
                moves += 1;
            }
        }

        status.check_degree_invariant();
        let new_mod = status.modularity(config.resolution);
        trace!("pass {passes}: {moves} moves, modularity {new_mod:.7}");
        if new_mod - cur_mod < config.min_gain {
            break;
        }
        cur_mod = new_mod;
    }

    moved_any
}

/// Pick the community the detached node gains most from joining.
///
/// Every community reachable through an edge is scored with
/// `w_to_candidate − γ·degree(candidate)·degc_totw`; the original community
/// is the baseline, so the node only moves on a strict improvement, and ties
/// resolve to the first-encountered candidate in generation order.
fn best_candidate(
    status: &CommunityStatus,
    neigh: &NeighborWeights,
    own: usize,
    weight_to_own: f64,
    degc_totw: f64,
    config: &LouvainConfig,
) -> usize {
    let gamma = config.resolution;
    let score = |com: usize, weight: f64| weight - gamma * status.community_degree(com) * degc_totw;

    let mut best = own;
    let mut best_gain = score(own, weight_to_own);

    if neigh.len() >= PARALLEL_SCORING_CUTOFF {
        // Order-preserving parallel map; the fold below stays sequential so
        // equal gains keep resolving to the earliest candidate.
        let entries: Vec<(usize, f64)> = neigh.iter().map(|(&c, &w)| (c, w)).collect();
        let gains: Vec<(usize, f64)> = entries
            .par_iter()
            .map(|&(com, weight)| (com, score(com, weight)))
            .collect();
        for (com, gain) in gains {
            if com != own && gain > best_gain {
                best_gain = gain;
                best = com;
            }
        }
    } else {
        for (&com, &weight) in neigh {
            if com == own {
                continue;
            }
            let gain = score(com, weight);
            if gain > best_gain {
                best_gain = gain;
                best = com;
            }
        }
    }

    best
}
