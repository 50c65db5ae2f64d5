// Licensed under the Apache License, Version 2.0 (the "License"); you may
// not use this file except in compliance with the License. You may obtain
// a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations
// under the License.

//! Louvain community detection: incremental bookkeeping, the single-level
//! greedy pass, the multilevel driver, and the dendrogram it produces.

pub mod dendrogram;
pub mod louvain;
mod one_level;
pub mod status;

pub use self::dendrogram::{renumber, Dendrogram};
pub use self::louvain::{
    best_partition, generate_dendrogram, group_communities, modularity,
    partition_from_communities, LouvainConfig,
};
pub use self::status::{CommunityStatus, NeighborWeights};
