//! Arena-backed room DAG
//!
//! Nodes live in a `Vec` owned by `DungeonGraph` and refer to each other by
//! `NodeId`. Every edge is stored twice, once in the source's `next` list and
//! once in the target's `prev` list; all mutation goes through
//! [`DungeonGraph::connect`] so the two lists never disagree.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::room::RoomType;

/// Index of a node in its graph's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Traversal direction for bounded neighborhood queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Door choice when a room has two exits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Door {
    Left = 0,
    Right = 1,
}

/// One room slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonNode {
    pub id: NodeId,
    pub room_type: RoomType,
    /// Longest-path edge count from start. Only meaningful after
    /// `calculate_depths`.
    pub depth: u32,
    next: Vec<NodeId>,
    prev: Vec<NodeId>,
}

impl DungeonNode {
    fn new(id: NodeId, room_type: RoomType) -> Self {
        Self {
            id,
            room_type,
            depth: 0,
            next: Vec::new(),
            prev: Vec::new(),
        }
    }

    pub fn next(&self) -> &[NodeId] {
        &self.next
    }

    pub fn prev(&self) -> &[NodeId] {
        &self.prev
    }

    pub fn out_degree(&self) -> usize {
        self.next.len()
    }

    pub fn in_degree(&self) -> usize {
        self.prev.len()
    }

    pub fn is_terminal(&self) -> bool {
        self.next.is_empty()
    }
}

/// The room graph of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonGraph {
    nodes: Vec<DungeonNode>,
    start: NodeId,
}

impl Default for DungeonGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DungeonGraph {
    /// Create a graph holding only the start room
    pub fn new() -> Self {
        Self {
            nodes: vec![DungeonNode::new(NodeId(0), RoomType::StartRoom)],
            start: NodeId(0),
        }
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A graph always holds its start node
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[DungeonNode] {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&DungeonNode> {
        self.nodes.get(id.index())
    }

    /// Panics if `id` does not belong to this graph.
    pub fn node(&self, id: NodeId) -> &DungeonNode {
        &self.nodes[id.index()]
    }

    pub fn room_type(&self, id: NodeId) -> RoomType {
        self.node(id).room_type
    }

    pub fn set_room_type(&mut self, id: NodeId, room_type: RoomType) {
        self.nodes[id.index()].room_type = room_type;
    }

    pub fn depth(&self, id: NodeId) -> u32 {
        self.node(id).depth
    }

    /// Swap the room types of two nodes
    pub fn swap_types(&mut self, a: NodeId, b: NodeId) {
        let ta = self.room_type(a);
        let tb = self.room_type(b);
        self.set_room_type(a, tb);
        self.set_room_type(b, ta);
    }

    /// Append a new, unconnected node
    pub fn add_node(&mut self, room_type: RoomType) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(DungeonNode::new(id, room_type));
        id
    }

    /// Add the edge `from -> to`, updating both adjacency lists.
    ///
    /// Idempotent. Self-loops are refused. Returns whether a new edge was
    /// added. Does not check for cycles; see [`Self::try_connect`].
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> bool {
        if from == to || self.nodes[from.index()].next.contains(&to) {
            return false;
        }
        self.nodes[from.index()].next.push(to);
        self.nodes[to.index()].prev.push(from);
        true
    }

    /// Add `from -> to` only if it keeps the graph acyclic
    pub fn try_connect(&mut self, from: NodeId, to: NodeId) -> bool {
        if self.would_create_cycle(from, to) {
            tracing::trace!(%from, %to, "edge refused, would close a cycle");
            return false;
        }
        self.connect(from, to)
    }

    /// Forward BFS: can `b` be reached from `a`? A node reaches itself.
    pub fn is_reachable(&self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return true;
        }
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([a]);
        seen[a.index()] = true;
        while let Some(current) = queue.pop_front() {
            for &next in &self.nodes[current.index()].next {
                if next == b {
                    return true;
                }
                if !seen[next.index()] {
                    seen[next.index()] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// An edge `a -> b` is unsafe when `b` already reaches `a`
    pub fn would_create_cycle(&self, a: NodeId, b: NodeId) -> bool {
        self.is_reachable(b, a)
    }

    /// All nodes reachable from start, in BFS order
    pub fn collect_all_nodes(&self) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([self.start]);
        seen[self.start.index()] = true;
        while let Some(current) = queue.pop_front() {
            order.push(current);
            for &next in &self.nodes[current.index()].next {
                if !seen[next.index()] {
                    seen[next.index()] = true;
                    queue.push_back(next);
                }
            }
        }
        order
    }

    /// Assign every reachable node its longest-path distance from start.
    ///
    /// Processes nodes in topological order, so each node is finalized once
    /// all of its reachable predecessors are. Nodes on a cycle (which a valid
    /// graph never has) keep the depth reached before the cycle.
    pub fn calculate_depths(&mut self) {
        let reachable = self.collect_all_nodes();
        let mut in_reach = vec![false; self.nodes.len()];
        for &id in &reachable {
            in_reach[id.index()] = true;
        }

        let mut pending = vec![0usize; self.nodes.len()];
        for &id in &reachable {
            self.nodes[id.index()].depth = 0;
            pending[id.index()] = self.nodes[id.index()]
                .prev
                .iter()
                .filter(|p| in_reach[p.index()])
                .count();
        }

        let mut queue = VecDeque::from([self.start]);
        while let Some(current) = queue.pop_front() {
            let depth = self.nodes[current.index()].depth;
            let next = self.nodes[current.index()].next.clone();
            for n in next {
                let node = &mut self.nodes[n.index()];
                node.depth = node.depth.max(depth + 1);
                pending[n.index()] -= 1;
                if pending[n.index()] == 0 {
                    queue.push_back(n);
                }
            }
        }
    }

    /// Nodes within `k` hops of `node` (excluding `node` itself)
    pub fn nodes_within_distance(&self, node: NodeId, k: u32, direction: Direction) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut found = Vec::new();
        let mut queue = VecDeque::from([(node, 0u32)]);
        seen[node.index()] = true;
        while let Some((current, dist)) = queue.pop_front() {
            if dist == k {
                continue;
            }
            let neighbors = match direction {
                Direction::Forward => &self.nodes[current.index()].next,
                Direction::Backward => &self.nodes[current.index()].prev,
            };
            for &n in neighbors {
                if !seen[n.index()] {
                    seen[n.index()] = true;
                    found.push(n);
                    queue.push_back((n, dist + 1));
                }
            }
        }
        found
    }

    pub fn max_depth(&self) -> u32 {
        self.collect_all_nodes()
            .into_iter()
            .map(|id| self.depth(id))
            .max()
            .unwrap_or(0)
    }

    /// Reachable nodes grouped by depth, each group in BFS order
    pub fn depth_groups(&self) -> BTreeMap<u32, Vec<NodeId>> {
        let mut groups: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
        for id in self.collect_all_nodes() {
            groups.entry(self.depth(id)).or_default().push(id);
        }
        groups
    }

    pub fn nodes_at_depth(&self, depth: u32) -> Vec<NodeId> {
        self.collect_all_nodes()
            .into_iter()
            .filter(|&id| self.depth(id) == depth)
            .collect()
    }

    /// Reachable nodes without successors
    pub fn terminals(&self) -> Vec<NodeId> {
        self.collect_all_nodes()
            .into_iter()
            .filter(|&id| self.node(id).is_terminal())
            .collect()
    }

    /// All edges in arena order
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.nodes
            .iter()
            .flat_map(|n| n.next.iter().map(move |&to| (n.id, to)))
            .collect()
    }

    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).next
    }

    /// Successor behind a door. Index 0 is the left door, index 1 the right.
    pub fn door(&self, id: NodeId, door: Door) -> Option<NodeId> {
        self.node(id).next.get(door as usize).copied()
    }

    pub fn count_of(&self, room_type: RoomType) -> usize {
        self.nodes.iter().filter(|n| n.room_type == room_type).count()
    }

    pub fn type_counts(&self) -> BTreeMap<RoomType, usize> {
        let mut counts = BTreeMap::new();
        for n in &self.nodes {
            *counts.entry(n.room_type).or_insert(0) += 1;
        }
        counts
    }

    /// Check every structural invariant of a finished level.
    ///
    /// Depth ordering is checked against the stored depths, so call
    /// `calculate_depths` after the last structural edit.
    pub fn validate(&self) -> Result<(), GraphError> {
        let len = self.nodes.len();
        let start = self.get(self.start).ok_or(GraphError::UnknownNode(self.start))?;
        if start.room_type != RoomType::StartRoom {
            return Err(GraphError::StartNotStartRoom(self.start));
        }
        if !start.prev.is_empty() {
            return Err(GraphError::StartHasPredecessors(self.start));
        }

        for node in &self.nodes {
            if node.id != self.start && node.room_type == RoomType::StartRoom {
                return Err(GraphError::ExtraStart(node.id));
            }
            for (i, &to) in node.next.iter().enumerate() {
                let target = self.get(to).ok_or(GraphError::UnknownNode(to))?;
                if node.next[..i].contains(&to) {
                    return Err(GraphError::DuplicateEdge { from: node.id, to });
                }
                if !target.prev.contains(&node.id) {
                    return Err(GraphError::AsymmetricEdge { from: node.id, to });
                }
            }
            for &from in &node.prev {
                let source = self.get(from).ok_or(GraphError::UnknownNode(from))?;
                if !source.next.contains(&node.id) {
                    return Err(GraphError::AsymmetricEdge { from, to: node.id });
                }
            }
        }

        // Kahn over the whole arena; anything left over sits on a cycle.
        let mut pending: Vec<usize> = self.nodes.iter().map(|n| n.prev.len()).collect();
        let mut queue: VecDeque<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.prev.is_empty())
            .map(|n| n.id)
            .collect();
        let mut done = vec![false; len];
        while let Some(current) = queue.pop_front() {
            done[current.index()] = true;
            for &n in &self.nodes[current.index()].next {
                pending[n.index()] -= 1;
                if pending[n.index()] == 0 {
                    queue.push_back(n);
                }
            }
        }
        if let Some((from, to)) = self
            .edges()
            .into_iter()
            .find(|(a, b)| !done[a.index()] && !done[b.index()])
        {
            return Err(GraphError::Cycle { from, to });
        }

        let mut reached = vec![false; len];
        for id in self.collect_all_nodes() {
            reached[id.index()] = true;
        }
        if let Some(node) = self.nodes.iter().find(|n| !reached[n.id.index()]) {
            return Err(GraphError::Unreachable(node.id));
        }

        // Acyclic and finite, so every node reaches some sink; sinks must be
        // End or Boss rooms.
        if let Some(node) = self
            .nodes
            .iter()
            .find(|n| n.is_terminal() && !n.room_type.is_terminal_type())
        {
            return Err(GraphError::DeadEnd(node.id));
        }

        if let Some((from, to)) = self
            .edges()
            .into_iter()
            .find(|&(a, b)| self.depth(b) < self.depth(a) + 1)
        {
            return Err(GraphError::DepthOrder { from, to });
        }

        Ok(())
    }
}
