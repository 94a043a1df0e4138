//! Main path (spine) construction
//!
//! The spine is the guaranteed start-to-terminal chain. Its length depends
//! only on the room budget, so branching never shortens the critical path.

use crate::graph::{DungeonGraph, NodeId};
use crate::room::RoomType;

/// Levels above this get a second boss halfway along the spine
pub const DOUBLE_BOSS_LEVEL: u32 = 5;

/// The spine as built, start first and terminal last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainPath {
    pub nodes: Vec<NodeId>,
    pub bosses: Vec<NodeId>,
}

impl MainPath {
    pub fn terminal(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// Number of edges from start to terminal
    pub fn length(&self) -> usize {
        self.nodes.len() - 1
    }
}

/// Spine length for a room budget, never below 2
pub fn main_path_length(dungeon_size: usize) -> usize {
    (dungeon_size / 2).max(2)
}

/// Build the spine from the graph's start node.
///
/// Creates `main_path_length - 1` CombatRooms after start, turns the ones at
/// the boss slots into BossRooms, then appends `terminal`. Depths are
/// recomputed before returning.
pub fn generate_main_path(
    graph: &mut DungeonGraph,
    dungeon_size: usize,
    level: u32,
    terminal: RoomType,
) -> MainPath {
    let length = main_path_length(dungeon_size);
    let mut nodes = vec![graph.start()];
    let mut current = graph.start();
    for _ in 1..length {
        let next = graph.add_node(RoomType::CombatRoom);
        graph.connect(current, next);
        nodes.push(next);
        current = next;
    }

    let slots = if level > DOUBLE_BOSS_LEVEL {
        vec![length / 2, length - 1]
    } else {
        vec![length - 1]
    };
    let mut bosses = Vec::new();
    for slot in slots {
        // Slot 0 is the start room.
        if slot == 0 || bosses.contains(&nodes[slot]) {
            continue;
        }
        graph.set_room_type(nodes[slot], RoomType::BossRoom);
        bosses.push(nodes[slot]);
    }

    let end = graph.add_node(terminal);
    graph.connect(current, end);
    nodes.push(end);
    graph.calculate_depths();

    tracing::debug!(
        level,
        length = nodes.len() - 1,
        bosses = bosses.len(),
        %terminal,
        "main path generated"
    );

    MainPath { nodes, bosses }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spine_shape_low_level() {
        let mut g = DungeonGraph::new();
        let path = generate_main_path(&mut g, 7, 1, RoomType::EndRoom);

        // 7 / 2 = 3 spine slots, then the end room.
        assert_eq!(path.nodes.len(), 4);
        assert_eq!(path.length(), 3);
        assert_eq!(g.len(), 4);
        assert_eq!(g.room_type(path.nodes[0]), RoomType::StartRoom);
        assert_eq!(g.room_type(path.nodes[1]), RoomType::CombatRoom);
        assert_eq!(g.room_type(path.nodes[2]), RoomType::BossRoom);
        assert_eq!(g.room_type(path.terminal()), RoomType::EndRoom);
        assert_eq!(path.bosses, vec![path.nodes[2]]);
        assert_eq!(g.depth(path.terminal()), 3);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_two_bosses_above_level_five() {
        let mut g = DungeonGraph::new();
        let path = generate_main_path(&mut g, 20, 6, RoomType::EndRoom);
        // length 10: bosses at 5 and 9
        assert_eq!(path.bosses, vec![path.nodes[5], path.nodes[9]]);
        assert_eq!(g.count_of(RoomType::BossRoom), 2);
    }

    #[test]
    fn test_boss_terminal() {
        let mut g = DungeonGraph::new();
        let path = generate_main_path(&mut g, 25, 10, RoomType::BossRoom);
        assert_eq!(g.room_type(path.terminal()), RoomType::BossRoom);
        assert!(g.node(path.terminal()).is_terminal());
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_degenerate_size_still_connects() {
        for size in 0..4 {
            let mut g = DungeonGraph::new();
            let path = generate_main_path(&mut g, size, 9, RoomType::EndRoom);
            assert_eq!(path.length(), 2);
            assert!(g.is_reachable(g.start(), path.terminal()));
            // Both boss slots collapse onto node 1.
            assert_eq!(path.bosses, vec![path.nodes[1]]);
            assert!(g.validate().is_ok());
        }
    }
}
