//! dg-core: room graph generation for one dungeon level
//!
//! Builds a directed acyclic graph of typed rooms in three phases: a main
//! path from start to terminal, optional branches and merges, and room type
//! balancing. The result is consumed by the room-instantiation layer, which
//! walks successors by door choice and reads each room's type.
//!
//! Generation is synchronous and reproducible from `(level, seed)`.

pub mod balance;
pub mod branch;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod graph;
pub mod path;
pub mod room;

mod rng;

pub use config::{FractionRange, GenerationConfig, LevelParams, RoomDistribution};
pub use error::{ConfigError, GenerationError, GraphError};
pub use generator::{GeneratedLevel, GenerationService};
pub use graph::{Direction, Door, DungeonGraph, DungeonNode, NodeId};
pub use rng::GameRng;
pub use room::RoomType;
