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

//! The multi-resolution hierarchy produced by the coarsening loop.

use foldhash::{HashMap, HashMapExt};

/// Canonicalize community ids to a dense `0..k` range.
///
/// Ids are assigned in the order they are first encountered while scanning
/// nodes in ascending id order, so the result is deterministic and the
/// function is idempotent. Grouping is preserved exactly: two nodes share an
/// output id iff they shared an input id.
pub fn renumber(partition: &[usize]) -> Vec<usize> {
    let mut dense: HashMap<usize, usize> = HashMap::with_capacity(partition.len());
    partition
        .iter()
        .map(|&com| {
            let next = dense.len();
            *dense.entry(com).or_insert(next)
        })
        .collect()
}

/// Ordered hierarchy of partitions, level 0 finest.
///
/// Level `i > 0` partitions the community ids of level `i - 1`, not the
/// original nodes; [`Dendrogram::partition_at_level`] composes the maps back
/// down to original nodes. Every level holds dense `0..k` community ids.
#[derive(Clone, Debug)]
pub struct Dendrogram {
    levels: Vec<Vec<usize>>,
}

impl Dendrogram {
    pub(crate) fn new(levels: Vec<Vec<usize>>) -> Self {
        debug_assert!(!levels.is_empty());
        Dendrogram { levels }
    }

    /// Number of levels (coarsening rounds that improved modularity, ≥ 1).
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The raw per-level assignments, finest first.
    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    /// Partition of the original nodes at resolution `level`.
    ///
    /// Level 0 is returned directly; higher levels are obtained by looking
    /// up each node's community in every level up the chain.
    ///
    /// # Panics
    /// Panics if `level >= self.len()`.
    pub fn partition_at_level(&self, level: usize) -> Vec<usize> {
        assert!(
            level < self.levels.len(),
            "level {level} out of range for dendrogram with {} levels",
            self.levels.len()
        );
        let mut partition = self.levels[0].clone();
        for upper in self.levels.iter().take(level + 1).skip(1) {
            for com in partition.iter_mut() {
                *com = upper[*com];
            }
        }
        partition
    }

    /// The coarsest partition reached, i.e. the heuristic's best-found
    /// resolution.
    pub fn final_partition(&self) -> Vec<usize> {
        self.partition_at_level(self.levels.len() - 1)
    }
}
