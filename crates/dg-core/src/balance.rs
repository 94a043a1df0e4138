//! Room type balancing
//!
//! Assigns final room types so the population matches the configured
//! distribution, whatever shape branching left behind. The pass runs in a
//! fixed order:
//!
//! 1. reset every non-fixed room to CombatRoom
//! 2. sample a target count per distributed type
//! 3. space mini-bosses evenly over the depth range
//! 4. fill Reward, Event and Shop deficits from a shuffled combat pool
//! 5. optionally give every special type at least one room
//! 6. move shops in front of hard encounters
//!
//! A step that finds no candidate for an item skips that item.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{GenerationConfig, RoomDistribution};
use crate::graph::{Direction, DungeonGraph, NodeId};
use crate::rng::GameRng;
use crate::room::RoomType;

/// Depth fractions preferred when a special room has to be forced in
pub const PREFERRED_DEPTH_BAND: (f64, f64) = (0.4, 0.8);
const PREFERRED_DEPTH_CENTER: f64 = 0.6;

/// What the balance pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub total: usize,
    pub fixed: usize,
    /// Sampled target per type, CombatRoom including the remainder
    pub targets: BTreeMap<RoomType, usize>,
    /// Final population per type
    pub counts: BTreeMap<RoomType, usize>,
    pub mini_bosses: Vec<NodeId>,
    /// Rooms retyped only to give a special type its first room
    pub guaranteed: Vec<NodeId>,
    /// (old shop, new shop) pairs from the pacing pass
    pub shop_swaps: Vec<(NodeId, NodeId)>,
}

/// Room type balancer for one level
#[derive(Debug, Clone)]
pub struct RoomBalancer<'a> {
    distribution: &'a RoomDistribution,
    ensure_each_special: bool,
    shop_safety_radius: u32,
    allow_mini_bosses: bool,
}

impl<'a> RoomBalancer<'a> {
    pub fn new(distribution: &'a RoomDistribution) -> Self {
        Self {
            distribution,
            ensure_each_special: false,
            shop_safety_radius: 2,
            allow_mini_bosses: true,
        }
    }

    pub fn from_config(config: &'a GenerationConfig) -> Self {
        Self {
            distribution: &config.distribution,
            ensure_each_special: config.ensure_each_special,
            shop_safety_radius: config.shop_safety_radius,
            allow_mini_bosses: true,
        }
    }

    pub fn ensure_each_special(mut self, enabled: bool) -> Self {
        self.ensure_each_special = enabled;
        self
    }

    pub fn shop_safety_radius(mut self, hops: u32) -> Self {
        self.shop_safety_radius = hops;
        self
    }

    /// Suppress mini-bosses, e.g. when the previous level had some
    pub fn allow_mini_bosses(mut self, allowed: bool) -> Self {
        self.allow_mini_bosses = allowed;
        self
    }

    /// Retype every non-fixed room. Depths must be current.
    pub fn balance_room_types(&self, graph: &mut DungeonGraph, rng: &mut GameRng) -> BalanceReport {
        let nodes = graph.collect_all_nodes();
        let total = nodes.len();
        let mut modifiable = Vec::with_capacity(total);
        let mut fixed = 0;
        for &id in &nodes {
            if graph.room_type(id).is_fixed() {
                fixed += 1;
            } else {
                graph.set_room_type(id, RoomType::CombatRoom);
                modifiable.push(id);
            }
        }

        let targets = self.sample_targets(total, rng);
        let target_of = |t: RoomType| targets.get(&t).copied().unwrap_or(0);

        let mini_bosses = place_mini_bosses(graph, target_of(RoomType::MiniBossRoom), rng);

        let mut pool: Vec<NodeId> = modifiable
            .iter()
            .copied()
            .filter(|&id| graph.room_type(id) == RoomType::CombatRoom)
            .collect();
        rng.shuffle(&mut pool);
        for room_type in RoomType::SPECIAL {
            let current = modifiable
                .iter()
                .filter(|&&id| graph.room_type(id) == room_type)
                .count();
            let deficit = target_of(room_type).saturating_sub(current);
            for _ in 0..deficit {
                let Some(id) = pool.pop() else {
                    tracing::trace!(%room_type, "combat pool exhausted");
                    break;
                };
                graph.set_room_type(id, room_type);
            }
        }

        let guaranteed = if self.ensure_each_special {
            let wanted: Vec<RoomType> = RoomType::SPECIAL
                .into_iter()
                .filter(|&t| self.distribution.get(t).is_some_and(|r| r.max > 0.0))
                .collect();
            ensure_special_rooms(graph, &wanted)
        } else {
            Vec::new()
        };

        let shop_swaps = optimize_shop_placement(graph, self.shop_safety_radius);

        let report = BalanceReport {
            total,
            fixed,
            targets,
            counts: graph.type_counts(),
            mini_bosses,
            guaranteed,
            shop_swaps,
        };
        tracing::debug!(
            total,
            fixed,
            mini_bosses = report.mini_bosses.len(),
            guaranteed = report.guaranteed.len(),
            shop_swaps = report.shop_swaps.len(),
            "room types balanced"
        );
        report
    }

    /// Uniform count per type within floor(total*min)..=ceil(total*max);
    /// CombatRoom absorbs whatever is left.
    fn sample_targets(&self, total: usize, rng: &mut GameRng) -> BTreeMap<RoomType, usize> {
        let mut targets = BTreeMap::new();
        for (room_type, range) in self.distribution.iter() {
            let (lo, hi) = range.count_bounds(total);
            let mut count = rng.range_inclusive(lo, hi);
            if room_type == RoomType::MiniBossRoom && !self.allow_mini_bosses {
                count = 0;
            }
            targets.insert(room_type, count);
        }
        let assigned: usize = targets.values().sum();
        *targets.entry(RoomType::CombatRoom).or_insert(0) += total.saturating_sub(assigned);
        targets
    }
}

/// Space `count` mini-bosses evenly over the depth range.
///
/// For each desired depth the nearest layer holding a CombatRoom is used
/// (the shallower one on a tie) and one of its combat rooms is retyped.
pub fn place_mini_bosses(graph: &mut DungeonGraph, count: usize, rng: &mut GameRng) -> Vec<NodeId> {
    let mut placed = Vec::new();
    if count == 0 {
        return placed;
    }
    let max_depth = graph.max_depth();
    let groups = graph.depth_groups();
    let spacing = max_depth as f64 / (count + 1) as f64;

    for i in 1..=count {
        let desired = spacing * i as f64;
        let nearest = groups
            .iter()
            .filter(|(_, ids)| ids.iter().any(|&id| graph.room_type(id) == RoomType::CombatRoom))
            .min_by(|(a, _), (b, _)| {
                let da = (**a as f64 - desired).abs();
                let db = (**b as f64 - desired).abs();
                da.total_cmp(&db).then(a.cmp(b))
            });
        let Some((&depth, ids)) = nearest else {
            tracing::trace!(desired, "no combat room left for a mini-boss");
            break;
        };
        let combat: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|&id| graph.room_type(id) == RoomType::CombatRoom)
            .collect();
        if let Some(&id) = rng.choose(&combat) {
            graph.set_room_type(id, RoomType::MiniBossRoom);
            tracing::trace!(%id, depth, "mini-boss placed");
            placed.push(id);
        }
    }
    placed
}

/// Give each type in `wanted` one room if it has none.
///
/// Candidates are CombatRooms ranked by: depth fraction inside
/// [`PREFERRED_DEPTH_BAND`] first, then closeness of the fraction to 0.6,
/// then node id.
pub fn ensure_special_rooms(graph: &mut DungeonGraph, wanted: &[RoomType]) -> Vec<NodeId> {
    let max_depth = graph.max_depth().max(1) as f64;
    let mut retyped = Vec::new();
    for &room_type in wanted {
        if graph.count_of(room_type) > 0 {
            continue;
        }
        let best = graph
            .collect_all_nodes()
            .into_iter()
            .filter(|&id| graph.room_type(id) == RoomType::CombatRoom)
            .map(|id| {
                let fraction = graph.depth(id) as f64 / max_depth;
                let in_band = (PREFERRED_DEPTH_BAND.0..=PREFERRED_DEPTH_BAND.1).contains(&fraction);
                (!in_band, (fraction - PREFERRED_DEPTH_CENTER).abs(), id)
            })
            .min_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)).then(a.2.cmp(&b.2)));
        if let Some((_, _, id)) = best {
            graph.set_room_type(id, room_type);
            retyped.push(id);
        }
    }
    retyped
}

fn precedes_hard_encounter(graph: &DungeonGraph, id: NodeId, radius: u32) -> bool {
    graph
        .nodes_within_distance(id, radius, Direction::Forward)
        .into_iter()
        .any(|n| graph.room_type(n).is_hard_encounter())
}

/// Move shops so they sit within `radius` forward hops of a boss or
/// mini-boss.
///
/// Greedy: each badly placed shop swaps with the first Combat or Event room
/// (in BFS order) that does precede a hard encounter.
pub fn optimize_shop_placement(graph: &mut DungeonGraph, radius: u32) -> Vec<(NodeId, NodeId)> {
    let mut swaps = Vec::new();
    let order = graph.collect_all_nodes();
    let shops: Vec<NodeId> = order
        .iter()
        .copied()
        .filter(|&id| graph.room_type(id) == RoomType::ShopRoom)
        .collect();

    for shop in shops {
        if precedes_hard_encounter(graph, shop, radius) {
            continue;
        }
        let candidate = order.iter().copied().find(|&id| {
            matches!(graph.room_type(id), RoomType::CombatRoom | RoomType::EventRoom)
                && precedes_hard_encounter(graph, id, radius)
        });
        match candidate {
            Some(id) => {
                graph.swap_types(shop, id);
                swaps.push((shop, id));
            }
            None => tracing::trace!(%shop, "no better spot for shop"),
        }
    }
    swaps
}
