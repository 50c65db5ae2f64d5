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

use std::fmt;

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building graphs or validating partitions.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// An edge was added with a weight <= 0. The modularity formulas
    /// require strictly positive edge weights.
    NonPositiveWeight {
        /// Source endpoint.
        source: usize,
        /// Target endpoint.
        target: usize,
        /// Offending weight.
        weight: f64,
    },

    /// An edge endpoint is not a node of the graph.
    NodeOutOfBounds {
        /// Offending node id.
        node: usize,
        /// Number of nodes in the graph.
        num_nodes: usize,
    },

    /// A partition slice does not have one entry per node.
    PartitionLength {
        /// Expected length (number of nodes).
        expected: usize,
        /// Length of the slice that was passed.
        found: usize,
    },

    /// A community-list partition does not cover every node exactly once.
    InvalidPartition {
        /// Description of the violation.
        reason: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NonPositiveWeight {
                source,
                target,
                weight,
            } => write!(
                f,
                "edge ({source}, {target}) has non-positive weight {weight}; \
                 Louvain requires positive edge weights"
            ),
            Error::NodeOutOfBounds { node, num_nodes } => {
                write!(f, "node {node} out of bounds for graph with {num_nodes} nodes")
            }
            Error::PartitionLength { expected, found } => {
                write!(f, "partition has {found} entries, expected one per node ({expected})")
            }
            Error::InvalidPartition { reason } => write!(f, "invalid partition: {reason}"),
        }
    }
}

impl std::error::Error for Error {}
