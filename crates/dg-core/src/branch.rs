//! Side branches and merges
//!
//! Branches give a room extra exits; merges make separate rooms share a
//! descendant so the graph braids back toward the terminal. Every edge added
//! here goes through the cycle guard, and an attempt that finds no safe
//! target is skipped without affecting the rest of the pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::LevelParams;
use crate::graph::{DungeonGraph, NodeId};
use crate::path::MainPath;
use crate::rng::GameRng;
use crate::room::RoomType;

/// Longest branch, in rooms
pub const MAX_BRANCH_LENGTH: usize = 3;

/// What the branch pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchReport {
    pub branches: usize,
    pub branch_rooms: usize,
    /// Branches that joined back in while still growing
    pub early_merges: usize,
    /// Branches joined back in after reaching full length
    pub rejoins: usize,
    /// Branches that only found the terminal to join
    pub terminal_rejoins: usize,
    pub merges: usize,
    pub skipped: usize,
}

/// Run the branch pass, then the merge pass. Depths are current on return.
pub fn add_branches_and_merges(
    graph: &mut DungeonGraph,
    path: &MainPath,
    params: &LevelParams,
    rng: &mut GameRng,
) -> BranchReport {
    let mut report = BranchReport::default();

    add_branches(graph, path.terminal(), params, rng, &mut report);
    graph.calculate_depths();

    add_merges(graph, params, rng, &mut report);
    graph.calculate_depths();

    tracing::debug!(
        branches = report.branches,
        branch_rooms = report.branch_rooms,
        early_merges = report.early_merges,
        rejoins = report.rejoins,
        merges = report.merges,
        skipped = report.skipped,
        rooms = graph.len(),
        "branches and merges added"
    );
    report
}

/// Boss and End rooms never gain edges from this module, except the
/// fallback rejoin to the terminal.
fn is_open(graph: &DungeonGraph, id: NodeId) -> bool {
    let t = graph.room_type(id);
    !t.is_terminal_type() && t != RoomType::StartRoom
}

fn add_branches(
    graph: &mut DungeonGraph,
    terminal: NodeId,
    params: &LevelParams,
    rng: &mut GameRng,
    report: &mut BranchReport,
) {
    let max_depth = graph.max_depth();
    if max_depth < 3 {
        return;
    }
    // Depth layers as they stood before any branch was added; merge targets
    // come only from here.
    let layers = graph.depth_groups();
    let origins: Vec<NodeId> = graph
        .collect_all_nodes()
        .into_iter()
        .filter(|&id| {
            let depth = graph.depth(id);
            (1..=max_depth - 2).contains(&depth) && is_open(graph, id) && !graph.node(id).is_terminal()
        })
        .collect();

    for origin in origins {
        for _ in 0..params.max_branching {
            if graph.len() >= params.num_rooms {
                tracing::trace!("room budget spent, no more branches");
                return;
            }
            if graph.node(origin).out_degree() >= params.max_out_degree() {
                break;
            }
            if !rng.chance(params.branch_probability) {
                break;
            }
            build_branch(graph, origin, max_depth, &layers, terminal, params, rng, report);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_branch(
    graph: &mut DungeonGraph,
    origin: NodeId,
    max_depth: u32,
    layers: &BTreeMap<u32, Vec<NodeId>>,
    terminal: NodeId,
    params: &LevelParams,
    rng: &mut GameRng,
    report: &mut BranchReport,
) {
    let origin_depth = graph.depth(origin);
    // Leave at least one layer between the branch and the terminal.
    let budget = (max_depth - 1 - origin_depth) as usize;
    let length = rng.range_inclusive(1, MAX_BRANCH_LENGTH).min(budget);

    let mut tail = origin;
    let mut tail_depth = origin_depth;
    for step in 0..length {
        if step > 0 && graph.len() >= params.num_rooms {
            break;
        }
        let room = graph.add_node(RoomType::CombatRoom);
        graph.connect(tail, room);
        tail = room;
        tail_depth += 1;
        report.branch_rooms += 1;

        if rng.chance(params.merge_probability / 2.0)
            && let Some(target) = pick_target(graph, layers, &[tail], tail_depth + 1..=tail_depth + 1, rng)
            && graph.try_connect(tail, target)
        {
            report.branches += 1;
            report.early_merges += 1;
            tracing::trace!(%origin, %target, step, "branch merged early");
            return;
        }
    }
    report.branches += 1;

    if let Some(target) = pick_target(graph, layers, &[tail], tail_depth + 1..=max_depth - 1, rng)
        && graph.try_connect(tail, target)
    {
        report.rejoins += 1;
        return;
    }
    // The terminal has no successors, so this edge is always safe.
    graph.try_connect(tail, terminal);
    report.terminal_rejoins += 1;
}

/// Random open node whose depth lies in `depths` that none of `sources` can
/// reach yet and that every source can connect to without closing a cycle.
fn pick_target(
    graph: &DungeonGraph,
    layers: &BTreeMap<u32, Vec<NodeId>>,
    sources: &[NodeId],
    depths: std::ops::RangeInclusive<u32>,
    rng: &mut GameRng,
) -> Option<NodeId> {
    if depths.start() > depths.end() {
        return None;
    }
    let candidates: Vec<NodeId> = layers
        .range(depths)
        .flat_map(|(_, ids)| ids.iter().copied())
        .filter(|&c| is_open(graph, c))
        .filter(|&c| {
            sources
                .iter()
                .all(|&s| !graph.is_reachable(s, c) && !graph.would_create_cycle(s, c))
        })
        .collect();
    rng.choose(&candidates).copied()
}

fn add_merges(
    graph: &mut DungeonGraph,
    params: &LevelParams,
    rng: &mut GameRng,
    report: &mut BranchReport,
) {
    let layers = graph.depth_groups();
    for (&depth, ids) in &layers {
        let eligible: Vec<NodeId> = ids.iter().copied().filter(|&id| is_open(graph, id)).collect();
        if eligible.len() < 2 {
            continue;
        }
        for pair in eligible.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if !rng.chance(params.merge_probability) {
                continue;
            }
            let cap = params.max_out_degree();
            if graph.node(a).out_degree() >= cap || graph.node(b).out_degree() >= cap {
                report.skipped += 1;
                continue;
            }
            let Some(target) = pick_target(graph, &layers, &[a, b], depth + 1..=depth + 2, rng) else {
                tracing::trace!(%a, %b, depth, "no merge target");
                report.skipped += 1;
                continue;
            };
            let linked_a = graph.try_connect(a, target);
            let linked_b = graph.try_connect(b, target);
            if linked_a && linked_b {
                report.merges += 1;
            } else {
                report.skipped += 1;
            }
        }
    }
}
