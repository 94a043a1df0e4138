//! Diagnostic output: Graphviz DOT, JSON and a plain-text summary
//!
//! None of this is read back by gameplay code.

use std::fmt::Write;

use strum::IntoEnumIterator;

use crate::generator::GeneratedLevel;
use crate::graph::DungeonGraph;
use crate::room::RoomType;

/// Render the graph as a DOT digraph.
///
/// Nodes are labelled with type and depth and filled by type; nodes of equal
/// depth share a rank.
pub fn to_dot(graph: &DungeonGraph) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "digraph Dungeon {{");
    let _ = writeln!(out, "    rankdir=TB;");
    let _ = writeln!(out, "    node [shape=box, style=filled];");

    for node in graph.nodes() {
        let _ = writeln!(
            out,
            "    n{} [label=\"{}\\nd={}\", fillcolor={}];",
            node.id.0,
            node.room_type,
            node.depth,
            node.room_type.dot_color()
        );
    }
    for (from, to) in graph.edges() {
        let _ = writeln!(out, "    n{} -> n{};", from.0, to.0);
    }
    for ids in graph.depth_groups().values() {
        let members: Vec<String> = ids.iter().map(|id| format!("n{}", id.0)).collect();
        let _ = writeln!(out, "    {{ rank=same; {}; }}", members.join("; "));
    }

    out.push_str("}\n");
    out
}

/// Pretty-printed JSON of the whole level record
pub fn to_json(level: &GeneratedLevel) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(level)
}

/// Human-readable overview of a generated level
pub fn summary(level: &GeneratedLevel) -> String {
    let graph = &level.graph;
    let counts = graph.type_counts();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "level {} (seed {}): {} rooms, {} edges, depth {} (nominal {})",
        level.level,
        level.seed,
        graph.len(),
        graph.edges().len(),
        graph.max_depth(),
        level.params.depth
    );
    for room_type in RoomType::iter() {
        let n = counts.get(&room_type).copied().unwrap_or(0);
        if n > 0 {
            let _ = writeln!(out, "  {room_type:<13} {n}");
        }
    }
    let b = &level.branch_report;
    let _ = writeln!(
        out,
        "  branches {} (early merges {}, rejoins {}), merges {}, shop swaps {}",
        b.branches,
        b.early_merges,
        b.rejoins + b.terminal_rejoins,
        b.merges,
        level.balance_report.shop_swaps.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::generator::GenerationService;

    fn small_graph() -> DungeonGraph {
        let mut g = DungeonGraph::new();
        let s = g.start();
        let a = g.add_node(RoomType::ShopRoom);
        let b = g.add_node(RoomType::CombatRoom);
        let e = g.add_node(RoomType::EndRoom);
        g.connect(s, a);
        g.connect(s, b);
        g.connect(a, e);
        g.connect(b, e);
        g.calculate_depths();
        g
    }

    #[test]
    fn test_dot_structure() {
        let dot = to_dot(&small_graph());
        assert!(dot.starts_with("digraph Dungeon {"));
        assert!(dot.trim_end().ends_with('}'));
        assert!(dot.contains("n1 [label=\"ShopRoom\\nd=1\", fillcolor=cyan];"));
        assert!(dot.contains("n0 -> n2;"));
        assert!(dot.contains("{ rank=same; n1; n2; }"));
        assert!(dot.contains("{ rank=same; n3; }"));
        assert_eq!(dot.matches("->").count(), 4);
    }

    #[test]
    fn test_json_and_summary() {
        let level = GenerationService::new(GenerationConfig::default())
            .unwrap()
            .generate(3, 8)
            .unwrap();
        let json: Result<String, serde_json::Error> = to_json(&level);
        let json = json.unwrap();
        let back: GeneratedLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(back.graph, level.graph);
        assert!(back.graph.validate().is_ok());

        let text = summary(&level);
        assert!(text.starts_with("level 3 (seed 8)"));
        assert!(text.contains("StartRoom"));
    }
}
