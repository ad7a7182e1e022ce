//! Failure-aware reachability
//!
//! A cable carries traffic only while it and both of its endpoints are
//! working. The adjacency is rebuilt from the current flags for every run and
//! never cached between runs.

use std::collections::{BTreeMap, VecDeque};

use tracing::trace;

use crate::topology::Topology;
use crate::types::NodeId;

/// Undirected adjacency over the currently traversable cables
#[derive(Debug, Clone, Default)]
pub struct ActiveAdjacency {
    adjacency: BTreeMap<NodeId, Vec<NodeId>>,
}

impl ActiveAdjacency {
    /// Build the adjacency from the current failure flags
    ///
    /// Every node gets an entry; neighbours keep cable creation order so
    /// searches are deterministic.
    pub fn build(topology: &Topology) -> Self {
        let mut adjacency: BTreeMap<NodeId, Vec<NodeId>> = topology
            .nodes()
            .iter()
            .map(|n| (n.id.clone(), Vec::new()))
            .collect();

        let is_active = |id: &NodeId| topology.node(id).map(|n| n.active).unwrap_or(false);

        for link in topology.links() {
            if link.active && is_active(&link.source) && is_active(&link.target) {
                if let Some(neighbors) = adjacency.get_mut(&link.source) {
                    neighbors.push(link.target.clone());
                }
                if let Some(neighbors) = adjacency.get_mut(&link.target) {
                    neighbors.push(link.source.clone());
                }
            }
        }

        Self { adjacency }
    }

    /// Working neighbours of `node`
    pub fn neighbors(&self, node: &NodeId) -> &[NodeId] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of traversable cables
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum::<usize>() / 2
    }
}

/// Shortest path by hop count from `sender` to `target`
///
/// Returns `None` when the target is unreachable, including when the sender
/// itself is broken or unknown. The path starts at the sender, ends at the
/// target and never repeats a node.
pub fn find_path(
    sender: &NodeId,
    target: &NodeId,
    topology: &Topology,
    adjacency: &ActiveAdjacency,
) -> Option<Vec<NodeId>> {
    let sender_active = topology.node(sender).map(|n| n.active).unwrap_or(false);
    if !sender_active {
        trace!(%sender, "sender inactive, skipping search");
        return None;
    }

    // Each visited node maps to the node it was discovered from
    let mut parents: BTreeMap<&NodeId, Option<&NodeId>> = BTreeMap::new();
    let mut queue: VecDeque<&NodeId> = VecDeque::new();
    parents.insert(sender, None);
    queue.push_back(sender);

    while let Some(node) = queue.pop_front() {
        if node == target {
            return Some(unwind(node, &parents));
        }

        for neighbor in adjacency.neighbors(node) {
            if !parents.contains_key(neighbor) {
                parents.insert(neighbor, Some(node));
                queue.push_back(neighbor);
            }
        }
    }

    None
}

fn unwind<'a>(end: &'a NodeId, parents: &BTreeMap<&'a NodeId, Option<&'a NodeId>>) -> Vec<NodeId> {
    let mut path = vec![end.clone()];
    let mut current = end;
    while let Some(Some(parent)) = parents.get(current) {
        path.push((*parent).clone());
        current = *parent;
    }
    path.reverse();
    path
}
