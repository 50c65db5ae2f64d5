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

//! Hierarchical Louvain community detection for weighted undirected graphs.
//!
//! The Louvain method ("Fast unfolding of communities in large networks",
//! Blondel et al.) greedily reassigns nodes to neighboring communities to
//! increase modularity, then coarsens the graph by collapsing each community
//! into a node and repeats, yielding a dendrogram of partitions from finest
//! to coarsest.
//!
//! Runs are deterministic: nodes are visited in the graph's stable order
//! (optionally shuffled with a fixed seed), and equal-gain moves resolve to
//! the first-encountered candidate.
//!
//! ```
//! use louvain::{best_partition, LouvainConfig, WeightedGraph};
//!
//! // Two triangles joined by a light bridge edge.
//! let graph = WeightedGraph::from_edges(
//!     6,
//!     [
//!         (0, 1, 1.0),
//!         (0, 2, 1.0),
//!         (1, 2, 1.0),
//!         (3, 4, 1.0),
//!         (3, 5, 1.0),
//!         (4, 5, 1.0),
//!         (2, 3, 0.1),
//!     ],
//! )?;
//! let partition = best_partition(&graph, &LouvainConfig::default())?;
//! assert_eq!(partition, vec![0, 0, 0, 1, 1, 1]);
//! # Ok::<(), louvain::Error>(())
//! ```

pub mod community;
pub mod error;
pub mod graph;

pub use community::{
    best_partition, generate_dendrogram, group_communities, modularity,
    partition_from_communities, renumber, CommunityStatus, Dendrogram, LouvainConfig,
    NeighborWeights,
};
pub use error::{Error, Result};
pub use graph::WeightedGraph;
