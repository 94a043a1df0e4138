//! Generation configuration
//!
//! `GenerationConfig` is held for a whole game session; `LevelParams` are
//! derived from it for each level.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::room::RoomType;

/// Allowed share of the total room count, as fractions in 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractionRange {
    pub min: f64,
    pub max: f64,
}

impl FractionRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive count bounds for `total` rooms: floor(total*min)..=ceil(total*max)
    pub fn count_bounds(&self, total: usize) -> (usize, usize) {
        let lo = (total as f64 * self.min).floor() as usize;
        let hi = (total as f64 * self.max).ceil() as usize;
        (lo, hi.max(lo))
    }

    fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.min) && (0.0..=1.0).contains(&self.max) && self.min <= self.max
    }
}

/// Target share of each distributed room type.
///
/// CombatRoom may be listed but is always topped up with whatever the other
/// types leave over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomDistribution(BTreeMap<RoomType, FractionRange>);

impl Default for RoomDistribution {
    fn default() -> Self {
        Self(BTreeMap::from([
            (RoomType::MiniBossRoom, FractionRange::new(0.05, 0.10)),
            (RoomType::RewardRoom, FractionRange::new(0.05, 0.10)),
            (RoomType::EventRoom, FractionRange::new(0.10, 0.20)),
            (RoomType::ShopRoom, FractionRange::new(0.05, 0.10)),
        ]))
    }
}

impl RoomDistribution {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, room_type: RoomType, min: f64, max: f64) -> Self {
        self.0.insert(room_type, FractionRange::new(min, max));
        self
    }

    pub fn get(&self, room_type: RoomType) -> Option<FractionRange> {
        self.0.get(&room_type).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoomType, FractionRange)> + '_ {
        self.0.iter().map(|(&t, &r)| (t, r))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (room_type, range) in self.iter() {
            if room_type.is_fixed() {
                return Err(ConfigError::FixedTypeInDistribution { room_type });
            }
            if !range.is_valid() {
                return Err(ConfigError::BadFraction {
                    room_type,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

/// Session-wide generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub distribution: RoomDistribution,

    /// Branch probability at level 1
    pub branch_probability: f64,
    /// Added to the branch probability for every level past the first
    pub branch_probability_per_level: f64,
    /// Upper bound on the per-level branch probability
    pub branch_probability_cap: f64,
    pub merge_probability: f64,

    /// Cap on the room budget of any level
    pub max_rooms: usize,

    /// Give every special type at least one room when there is space
    pub ensure_each_special: bool,

    /// Minimum number of levels between two levels with mini-bosses
    pub mini_boss_level_gap: u32,

    /// Forward hops checked around shops by the pacing pass
    pub shop_safety_radius: u32,

    /// Run `DungeonGraph::validate` on every generated level
    pub validate_output: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            distribution: RoomDistribution::default(),
            branch_probability: 0.3,
            branch_probability_per_level: 0.03,
            branch_probability_cap: 0.7,
            merge_probability: 0.3,
            max_rooms: 40,
            ensure_each_special: true,
            mini_boss_level_gap: 1,
            shop_safety_radius: 2,
            validate_output: true,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.distribution.validate()?;
        for (name, value) in [
            ("branch_probability", self.branch_probability),
            ("branch_probability_per_level", self.branch_probability_per_level),
            ("branch_probability_cap", self.branch_probability_cap),
            ("merge_probability", self.merge_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::BadProbability { name, value });
            }
        }
        if self.max_rooms == 0 {
            return Err(ConfigError::Zero { name: "max_rooms" });
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GenerationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Shape parameters for one level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    pub level: u32,
    /// Nominal number of depth layers
    pub depth: u32,
    /// Room budget; the spine takes half of it
    pub num_rooms: usize,
    /// Extra exits a room may gain beyond its spine exit
    pub max_branching: usize,
    /// Every fifth level ends in a boss room
    pub is_boss_level: bool,
    pub branch_probability: f64,
    pub merge_probability: f64,
}

impl LevelParams {
    pub fn for_level(level: u32, config: &GenerationConfig) -> Self {
        let depth = (2 + level / 2).max(3);
        let num_rooms = (5 + 2 * level as usize).min(config.max_rooms);
        let max_branching = (1 + level as usize / 4).min(3);
        let branch_probability = (config.branch_probability
            + config.branch_probability_per_level * level.saturating_sub(1) as f64)
            .min(config.branch_probability_cap);
        Self {
            level,
            depth,
            num_rooms,
            max_branching,
            is_boss_level: level % 5 == 0,
            branch_probability,
            merge_probability: config.merge_probability,
        }
    }

    /// Most successors any room may have
    pub fn max_out_degree(&self) -> usize {
        self.max_branching + 1
    }

    pub fn terminal_type(&self) -> RoomType {
        if self.is_boss_level {
            RoomType::BossRoom
        } else {
            RoomType::EndRoom
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_one_params() {
        let p = LevelParams::for_level(1, &GenerationConfig::default());
        assert_eq!(p.depth, 3);
        assert_eq!(p.num_rooms, 7);
        assert_eq!(p.max_branching, 1);
        assert!(!p.is_boss_level);
        assert_eq!(p.terminal_type(), RoomType::EndRoom);
        assert!((p.branch_probability - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_level_ten_params() {
        let p = LevelParams::for_level(10, &GenerationConfig::default());
        assert_eq!(p.depth, 7);
        assert_eq!(p.num_rooms, 25);
        assert_eq!(p.max_branching, 3);
        assert!(p.is_boss_level);
        assert_eq!(p.terminal_type(), RoomType::BossRoom);
    }

    #[test]
    fn test_room_cap_and_probability_cap() {
        let p = LevelParams::for_level(50, &GenerationConfig::default());
        assert_eq!(p.num_rooms, 40);
        assert_eq!(p.max_branching, 3);
        assert!((p.branch_probability - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_count_bounds() {
        let r = FractionRange::new(0.05, 0.10);
        assert_eq!(r.count_bounds(25), (1, 3));
        assert_eq!(r.count_bounds(7), (0, 1));
        assert_eq!(FractionRange::new(0.0, 0.0).count_bounds(10), (0, 0));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(GenerationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_fraction() {
        let config = GenerationConfig {
            distribution: RoomDistribution::empty().with(RoomType::ShopRoom, 0.3, 0.1),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadFraction { room_type: RoomType::ShopRoom, .. })
        ));
    }

    #[test]
    fn test_rejects_fixed_type() {
        let config = GenerationConfig {
            distribution: RoomDistribution::empty().with(RoomType::BossRoom, 0.1, 0.2),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FixedTypeInDistribution { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let config = GenerationConfig {
            merge_probability: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadProbability { name: "merge_probability", .. })
        ));
    }

    #[test]
    fn test_json_partial_config() {
        let config = GenerationConfig::from_json_str(
            r#"{ "merge_probability": 0.5, "distribution": { "ShopRoom": { "min": 0.1, "max": 0.2 } } }"#,
        )
        .unwrap();
        assert_eq!(config.merge_probability, 0.5);
        assert_eq!(config.max_rooms, 40);
        assert_eq!(
            config.distribution.get(RoomType::ShopRoom),
            Some(FractionRange::new(0.1, 0.2))
        );
        assert_eq!(config.distribution.get(RoomType::RewardRoom), None);
    }

    #[test]
    fn test_json_round_trip_default() {
        let config = GenerationConfig::default();
        let json = config.to_json_string().unwrap();
        assert_eq!(GenerationConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_json_parse_error() {
        assert!(matches!(
            GenerationConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
