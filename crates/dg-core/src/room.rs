//! Room types carried by graph nodes
//!
//! The room-instantiation layer reads these tags to decide which scene to
//! build for a node.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Gameplay category of a room slot
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
#[repr(u8)]
pub enum RoomType {
    /// Entry room, the single root of the graph
    StartRoom = 0,
    /// Exit of an ordinary level
    EndRoom = 1,
    /// Boss encounter; also the terminal on boss levels
    BossRoom = 2,
    MiniBossRoom = 3,
    /// Default category, absorbs whatever the distribution leaves over
    #[default]
    CombatRoom = 4,
    RewardRoom = 5,
    EventRoom = 6,
    ShopRoom = 7,
}

impl RoomType {
    /// Special types in the order the balancer fills them
    pub const SPECIAL: [RoomType; 3] = [
        RoomType::RewardRoom,
        RoomType::EventRoom,
        RoomType::ShopRoom,
    ];

    /// Start, End and Boss rooms are structural and never retyped
    pub fn is_fixed(self) -> bool {
        matches!(
            self,
            RoomType::StartRoom | RoomType::EndRoom | RoomType::BossRoom
        )
    }

    /// Types allowed on a node with no successors
    pub fn is_terminal_type(self) -> bool {
        matches!(self, RoomType::EndRoom | RoomType::BossRoom)
    }

    /// Difficulty spikes a shop should sit in front of
    pub fn is_hard_encounter(self) -> bool {
        matches!(self, RoomType::MiniBossRoom | RoomType::BossRoom)
    }

    pub fn is_special(self) -> bool {
        Self::SPECIAL.contains(&self)
    }

    /// Fill color used by the DOT export
    pub fn dot_color(self) -> &'static str {
        match self {
            RoomType::StartRoom => "palegreen",
            RoomType::EndRoom => "lightblue",
            RoomType::BossRoom => "firebrick1",
            RoomType::MiniBossRoom => "orange",
            RoomType::CombatRoom => "lightgrey",
            RoomType::RewardRoom => "gold",
            RoomType::EventRoom => "plum",
            RoomType::ShopRoom => "cyan",
        }
    }
}
