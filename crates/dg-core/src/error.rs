//! Error types for graph validation, configuration and generation

use thiserror::Error;

use crate::graph::NodeId;
use crate::room::RoomType;

/// A broken structural invariant found by `DungeonGraph::validate`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("start node {0} is not a StartRoom")]
    StartNotStartRoom(NodeId),

    #[error("start node {0} has incoming edges")]
    StartHasPredecessors(NodeId),

    #[error("node {0} is a second StartRoom")]
    ExtraStart(NodeId),

    #[error("edge {from} -> {to} is missing its back reference")]
    AsymmetricEdge { from: NodeId, to: NodeId },

    #[error("edge {from} -> {to} appears more than once")]
    DuplicateEdge { from: NodeId, to: NodeId },

    #[error("edge {from} -> {to} closes a cycle")]
    Cycle { from: NodeId, to: NodeId },

    #[error("node {0} is not reachable from start")]
    Unreachable(NodeId),

    #[error("node {0} has no successors but is not an End or Boss room")]
    DeadEnd(NodeId),

    #[error("edge {from} -> {to} does not increase depth")]
    DepthOrder { from: NodeId, to: NodeId },

    #[error("node id {0} is out of range")]
    UnknownNode(NodeId),
}

/// Invalid generation configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("fraction range for {room_type} is invalid: min {min}, max {max}")]
    BadFraction {
        room_type: RoomType,
        min: f64,
        max: f64,
    },

    #[error("{room_type} is a fixed room type and cannot be distributed")]
    FixedTypeInDistribution { room_type: RoomType },

    #[error("probability `{name}` must lie in 0..=1, got {value}")]
    BadProbability { name: &'static str, value: f64 },

    #[error("`{name}` must be greater than zero")]
    Zero { name: &'static str },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors returned by `GenerationService`
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("level must be 1 or greater, got {0}")]
    InvalidLevel(u32),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("generated graph is invalid: {0}")]
    Graph(#[from] GraphError),
}
