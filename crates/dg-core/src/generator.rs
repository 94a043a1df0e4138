//! Level generation driver
//!
//! `GenerationService` lives for a game session. Each `generate` call builds
//! a fresh graph from `(level, seed)`: main path, then branches and merges,
//! then room type balancing.

use serde::{Deserialize, Serialize};

use crate::balance::{BalanceReport, RoomBalancer};
use crate::branch::{BranchReport, add_branches_and_merges};
use crate::config::{GenerationConfig, LevelParams};
use crate::error::GenerationError;
use crate::graph::DungeonGraph;
use crate::path::generate_main_path;
use crate::rng::GameRng;
use crate::room::RoomType;

/// A finished level and how it was made
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLevel {
    pub level: u32,
    pub seed: u64,
    pub params: LevelParams,
    pub graph: DungeonGraph,
    pub branch_report: BranchReport,
    pub balance_report: BalanceReport,
}

/// Session-scoped level generator
#[derive(Debug, Clone)]
pub struct GenerationService {
    config: GenerationConfig,
    /// Most recent level that received at least one mini-boss
    last_mini_boss_level: Option<u32>,
}

impl GenerationService {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        config.validate()?;
        Ok(Self {
            config,
            last_mini_boss_level: None,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn last_mini_boss_level(&self) -> Option<u32> {
        self.last_mini_boss_level
    }

    /// Forget mini-boss pacing, e.g. when a new run starts
    pub fn reset_pacing(&mut self) {
        self.last_mini_boss_level = None;
    }

    fn mini_bosses_allowed(&self, level: u32) -> bool {
        match self.last_mini_boss_level {
            Some(last) if level > last => level - last >= self.config.mini_boss_level_gap,
            _ => true,
        }
    }

    /// Build the room graph for `level` (1-based)
    pub fn generate(&mut self, level: u32, seed: u64) -> Result<GeneratedLevel, GenerationError> {
        if level == 0 {
            return Err(GenerationError::InvalidLevel(level));
        }
        let params = LevelParams::for_level(level, &self.config);
        let mut rng = GameRng::new(seed);
        tracing::debug!(
            level,
            seed,
            depth = params.depth,
            num_rooms = params.num_rooms,
            max_branching = params.max_branching,
            boss_level = params.is_boss_level,
            "generating level"
        );

        let mut graph = DungeonGraph::new();
        let path = generate_main_path(&mut graph, params.num_rooms, level, params.terminal_type());
        let branch_report = add_branches_and_merges(&mut graph, &path, &params, &mut rng);
        let balance_report = RoomBalancer::from_config(&self.config)
            .allow_mini_bosses(self.mini_bosses_allowed(level))
            .balance_room_types(&mut graph, &mut rng);

        if self.config.validate_output {
            graph.validate()?;
        }
        if graph.count_of(RoomType::MiniBossRoom) > 0 {
            self.last_mini_boss_level = Some(level);
        }

        tracing::info!(
            level,
            rooms = graph.len(),
            depth = graph.max_depth(),
            "level generated"
        );
        Ok(GeneratedLevel {
            level,
            seed,
            params,
            graph,
            branch_report,
            balance_report,
        })
    }

    /// Generate `count` consecutive levels starting at `first_level`.
    ///
    /// Each level's seed is forked from `seed` by level number, so a level's
    /// layout does not depend on how many levels came before it; only the
    /// mini-boss pacing carries over.
    pub fn generate_run(
        &mut self,
        first_level: u32,
        count: u32,
        seed: u64,
    ) -> Result<Vec<GeneratedLevel>, GenerationError> {
        let master = GameRng::new(seed);
        (first_level..first_level.saturating_add(count))
            .map(|level| self.generate(level, master.fork(level as u64).seed()))
            .collect()
    }
}
