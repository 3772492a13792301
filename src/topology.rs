//! Graph topology analysis using CSR format.
//!
//! A [`GraphTopology`] is a snapshot of a genome's enabled connections in
//! Compressed Sparse Row form, indexed densely by node id. It drives the
//! activation order of the evaluator and cycle checks on the genome.
//!
//! ## Determinism
//!
//! Nodes are indexed by ascending id and edges are sorted by innovation number
//! before CSR construction, so the summation order of every node's inputs is
//! fixed regardless of arena layout. Floating-point addition is not
//! associative, and this keeps repeated activations bit-identical.

use std::collections::VecDeque;

use crate::gene::NodeId;
use crate::genome::Genome;

/// CSR-format graph topology over a genome's enabled connections.
#[derive(Debug, Clone)]
pub struct GraphTopology {
    /// Number of nodes in the graph.
    node_count: usize,
    /// Maps NodeId to dense index, sorted by NodeId for binary search.
    node_to_idx: Vec<(NodeId, usize)>,
    /// Maps dense index back to NodeId.
    idx_to_node: Vec<NodeId>,
    /// CSR offsets for outgoing edges. Length = node_count + 1.
    fwd_offsets: Vec<usize>,
    /// fwd_targets[fwd_offsets[i]..fwd_offsets[i+1]] are successors of node i.
    fwd_targets: Vec<usize>,
    /// CSR offsets for incoming edges. Length = node_count + 1.
    rev_offsets: Vec<usize>,
    /// rev_sources[rev_offsets[i]..rev_offsets[i+1]] are predecessors of node i.
    rev_sources: Vec<usize>,
    /// Edge weights, parallel to rev_sources.
    rev_weights: Vec<f32>,
}

impl GraphTopology {
    /// Build topology from a genome's enabled connections.
    ///
    /// Connections with an endpoint missing from the genome are skipped.
    #[must_use]
    pub fn from_genome(genome: &Genome) -> Self {
        let mut node_entries: Vec<(NodeId, usize)> = genome
            .nodes
            .iter()
            .map(|(key, node)| (key, node.id))
            .collect();
        node_entries.sort_by_key(|(_, id)| *id);

        let node_count = node_entries.len();
        let idx_to_node: Vec<NodeId> = node_entries.iter().map(|(key, _)| *key).collect();

        let mut node_to_idx: Vec<(NodeId, usize)> = idx_to_node
            .iter()
            .enumerate()
            .map(|(i, &key)| (key, i))
            .collect();
        node_to_idx.sort_by_key(|(key, _)| *key);

        let mut edges: Vec<(usize, usize, f32, u64)> = genome
            .connections
            .values()
            .filter(|c| c.enabled)
            .filter_map(|c| {
                let from = lookup_idx(&node_to_idx, c.from)?;
                let to = lookup_idx(&node_to_idx, c.to)?;
                Some((from, to, c.weight, c.innovation))
            })
            .collect();
        edges.sort_by_key(|&(_, _, _, innovation)| innovation);

        // Forward CSR (outgoing edges).
        let mut fwd_counts = vec![0usize; node_count];
        for &(from, _, _, _) in &edges {
            fwd_counts[from] += 1;
        }
        let fwd_offsets = prefix_offsets(&fwd_counts);
        let mut fwd_targets = vec![0usize; edges.len()];
        let mut fwd_write_pos = fwd_offsets[..node_count].to_vec();
        for &(from, to, _, _) in &edges {
            fwd_targets[fwd_write_pos[from]] = to;
            fwd_write_pos[from] += 1;
        }

        // Reverse CSR (incoming edges).
        let mut rev_counts = vec![0usize; node_count];
        for &(_, to, _, _) in &edges {
            rev_counts[to] += 1;
        }
        let rev_offsets = prefix_offsets(&rev_counts);
        let mut rev_sources = vec![0usize; edges.len()];
        let mut rev_weights = vec![0.0f32; edges.len()];
        let mut rev_write_pos = rev_offsets[..node_count].to_vec();
        for &(from, to, weight, _) in &edges {
            let pos = rev_write_pos[to];
            rev_sources[pos] = from;
            rev_weights[pos] = weight;
            rev_write_pos[to] += 1;
        }

        Self {
            node_count,
            node_to_idx,
            idx_to_node,
            fwd_offsets,
            fwd_targets,
            rev_offsets,
            rev_sources,
            rev_weights,
        }
    }

    /// Get the dense index for a NodeId.
    #[inline]
    #[must_use]
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        lookup_idx(&self.node_to_idx, id)
    }

    /// Get the NodeId for a dense index.
    #[inline]
    #[must_use]
    pub fn node_id(&self, idx: usize) -> Option<NodeId> {
        self.idx_to_node.get(idx).copied()
    }

    /// Number of nodes in the topology.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of enabled edges in the topology.
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.fwd_targets.len()
    }

    /// Iterate over successors of a node (forward edges).
    #[inline]
    pub fn successors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let start = self.fwd_offsets[idx];
        let end = self.fwd_offsets[idx + 1];
        self.fwd_targets[start..end].iter().copied()
    }

    /// Iterate over `(source, weight)` pairs of a node's incoming edges,
    /// in innovation order.
    #[inline]
    pub fn incoming(&self, idx: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let start = self.rev_offsets[idx];
        let end = self.rev_offsets[idx + 1];
        self.rev_sources[start..end]
            .iter()
            .copied()
            .zip(self.rev_weights[start..end].iter().copied())
    }

    /// Detect if the graph contains any cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.topological_order().is_none()
    }

    /// Node indices in topological order, using Kahn's algorithm.
    ///
    /// Ready nodes are released lowest index first. Returns `None` if the
    /// graph has cycles.
    #[must_use]
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let mut in_degree: Vec<usize> = (0..self.node_count)
            .map(|idx| self.rev_offsets[idx + 1] - self.rev_offsets[idx])
            .collect();

        let mut queue: VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(idx, _)| idx)
            .collect();

        let mut order = Vec::with_capacity(self.node_count);
        while let Some(u) = queue.pop_front() {
            order.push(u);
            for v in self.successors(u) {
                in_degree[v] -= 1;
                if in_degree[v] == 0 {
                    queue.push_back(v);
                }
            }
        }

        if order.len() == self.node_count {
            Some(order)
        } else {
            None
        }
    }
}

/// Exclusive prefix sums of `counts`, with the total appended.
fn prefix_offsets(counts: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(counts.len() + 1);
    let mut total = 0;
    offsets.push(total);
    for &count in counts {
        total += count;
        offsets.push(total);
    }
    offsets
}

/// Binary search for NodeId in sorted vec.
fn lookup_idx(sorted: &[(NodeId, usize)], id: NodeId) -> Option<usize> {
    sorted
        .binary_search_by_key(&id, |(k, _)| *k)
        .ok()
        .map(|pos| sorted[pos].1)
}
