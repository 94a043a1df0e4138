//! End-to-end level generation checks

use dg_core::balance::RoomBalancer;
use dg_core::{
    Door, DungeonGraph, GameRng, GenerationConfig, GenerationService, LevelParams, NodeId,
    RoomDistribution, RoomType,
};
use proptest::prelude::*;

fn service() -> GenerationService {
    GenerationService::new(GenerationConfig::default()).unwrap()
}

fn starts(graph: &DungeonGraph) -> Vec<NodeId> {
    graph
        .nodes()
        .iter()
        .filter(|n| n.room_type == RoomType::StartRoom)
        .map(|n| n.id)
        .collect()
}

#[test]
fn test_level_one_scenario() {
    let level = service().generate(1, 42).unwrap();
    assert_eq!(level.params.depth, 3);
    assert_eq!(level.params.num_rooms, 7);
    assert_eq!(level.params.max_branching, 1);
    assert!(level.graph.len() <= 7);

    let terminals = level.graph.terminals();
    assert!(!terminals.is_empty());
    assert!(
        terminals
            .iter()
            .all(|&t| level.graph.room_type(t) == RoomType::EndRoom)
    );
}

#[test]
fn test_level_ten_scenario() {
    let level = service().generate(10, 42).unwrap();
    assert_eq!(level.params.depth, 7);
    assert_eq!(level.params.num_rooms, 25);
    assert_eq!(level.params.max_branching, 3);
    assert!(level.params.is_boss_level);

    // Branches rejoin instead of ending, so the boss is the only terminal.
    let terminals = level.graph.terminals();
    assert_eq!(terminals.len(), 1);
    assert_eq!(level.graph.room_type(terminals[0]), RoomType::BossRoom);
}

#[test]
fn test_linear_graph_refuses_back_edge() {
    let mut g = DungeonGraph::new();
    let a = g.start();
    let b = g.add_node(RoomType::CombatRoom);
    let c = g.add_node(RoomType::EndRoom);
    g.connect(a, b);
    g.connect(b, c);

    assert!(g.would_create_cycle(c, a));
    assert!(!g.try_connect(c, a));
    assert!(!g.is_reachable(c, a));
}

#[test]
fn test_player_can_walk_to_the_end() {
    let level = service().generate(8, 3).unwrap();
    let g = &level.graph;
    let mut current = g.start();
    let mut steps = 0;
    while !g.node(current).is_terminal() {
        let door = if steps % 2 == 0 { Door::Left } else { Door::Right };
        current = g
            .door(current, door)
            .or_else(|| g.door(current, Door::Left))
            .unwrap();
        steps += 1;
        assert!(steps <= g.len(), "walk did not terminate");
    }
    assert!(g.room_type(current).is_terminal_type());
}

#[test]
fn test_rebalancing_keeps_fixed_rooms() {
    let level = service().generate(12, 77).unwrap();
    let mut graph = level.graph.clone();
    let config = GenerationConfig::default();
    let mut rng = GameRng::new(1);

    let fixed_before: Vec<_> = graph
        .nodes()
        .iter()
        .filter(|n| n.room_type.is_fixed())
        .map(|n| (n.id, n.room_type))
        .collect();
    for _ in 0..3 {
        RoomBalancer::from_config(&config).balance_room_types(&mut graph, &mut rng);
        let fixed_after: Vec<_> = graph
            .nodes()
            .iter()
            .filter(|n| n.room_type.is_fixed())
            .map(|n| (n.id, n.room_type))
            .collect();
        assert_eq!(fixed_before, fixed_after);
        assert_eq!(graph.edges(), level.graph.edges());
    }
}

#[test]
fn test_different_seeds_vary_layout() {
    let mut svc = service();
    let layouts: Vec<_> = (0..10)
        .map(|seed| svc.generate(15, seed).unwrap().graph)
        .collect();
    assert!(layouts.windows(2).any(|w| w[0] != w[1]));
}

#[test]
fn test_special_rooms_present_on_large_levels() {
    let config = GenerationConfig {
        distribution: RoomDistribution::default(),
        ensure_each_special: true,
        ..Default::default()
    };
    let mut svc = GenerationService::new(config).unwrap();
    for seed in 0..10 {
        let level = svc.generate(15, seed).unwrap();
        for t in RoomType::SPECIAL {
            assert!(level.graph.count_of(t) > 0, "seed {seed}: no {t}");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_generated_graphs_hold_invariants(level in 1u32..30, seed in any::<u64>()) {
        let generated = service().generate(level, seed).unwrap();
        let g = &generated.graph;

        prop_assert_eq!(g.validate(), Ok(()));
        prop_assert_eq!(starts(g), vec![g.start()]);
        prop_assert_eq!(g.collect_all_nodes().len(), g.len());

        for (a, b) in g.edges() {
            prop_assert!(g.depth(b) >= g.depth(a) + 1);
            prop_assert!(g.node(b).prev().contains(&a));
        }
        for node in g.nodes() {
            prop_assert!(g.terminals().iter().any(|&t| g.is_reachable(node.id, t)));
        }
    }

    #[test]
    fn test_distributed_counts_respect_upper_bounds(level in 1u32..30, seed in any::<u64>()) {
        let generated = service().generate(level, seed).unwrap();
        let total = generated.balance_report.total;
        let dist = RoomDistribution::default();
        for (room_type, range) in dist.iter() {
            let (_, hi) = range.count_bounds(total);
            prop_assert!(generated.graph.count_of(room_type) <= hi);
        }
    }

    #[test]
    fn test_generation_is_reproducible(level in 1u32..30, seed in any::<u64>()) {
        let a = service().generate(level, seed).unwrap();
        let b = service().generate(level, seed).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn test_room_budget_is_respected(level in 1u32..60, seed in any::<u64>()) {
        let generated = service().generate(level, seed).unwrap();
        let params = LevelParams::for_level(level, &GenerationConfig::default());
        prop_assert!(generated.graph.len() <= params.num_rooms.max(4));
    }
}
