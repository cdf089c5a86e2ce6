//! Static game data: per-life equipment, requesters and filler items.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use thiserror::Error;

use crate::constants::MAX_REQUEST_CHECKPOINTS;
use crate::life::{Life, LifeRole};
use crate::tier::{Rank, deserialize_rank_name};

const BUNDLED_GAME_DATA: &str = include_str!("../assets/game_data.json");

/// Equipment a life needs when item restrictions are enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeData {
    pub life: Life,
    #[serde(default)]
    pub equipment: SmallVec<[String; 2]>,
}

/// Which lives a requester checkpoint asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LifeTarget {
    Life(Life),
    Role(LifeRole),
}

/// Rank demanded by one numbered request of a requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRequirement {
    pub checkpoint: u8,
    pub target: LifeTarget,
    #[serde(deserialize_with = "deserialize_rank_name")]
    pub rank: Rank,
}

/// A villager offering Other Requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub name: String,
    /// Chapters that must be complete before the requester appears.
    #[serde(default)]
    pub chapter: u32,
    /// Only present on Origin Island.
    #[serde(default)]
    pub dlc: bool,
    #[serde(default)]
    pub requirements: Vec<CheckpointRequirement>,
}

impl Requester {
    /// Whether this requester answers to `name`, ignoring case and surrounding spaces.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }

    #[must_use]
    pub fn requirement(&self, checkpoint: u8) -> Option<&CheckpointRequirement> {
        self.requirements
            .iter()
            .find(|req| req.checkpoint == checkpoint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillerCategory {
    Food,
    Potions,
    Antidotes,
    Cures,
    Bombs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FillerTable {
    #[serde(default)]
    pub food: Vec<String>,
    #[serde(default)]
    pub potions: Vec<String>,
    #[serde(default)]
    pub antidotes: Vec<String>,
    #[serde(default)]
    pub cures: Vec<String>,
    #[serde(default)]
    pub bombs: Vec<String>,
}

impl FillerTable {
    #[must_use]
    pub fn items(&self, category: FillerCategory) -> &[String] {
        match category {
            FillerCategory::Food => &self.food,
            FillerCategory::Potions => &self.potions,
            FillerCategory::Antidotes => &self.antidotes,
            FillerCategory::Cures => &self.cures,
            FillerCategory::Bombs => &self.bombs,
        }
    }

    /// Pick a category uniformly, then an item within it. Empty categories are
    /// skipped.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        const CATEGORIES: [FillerCategory; 5] = [
            FillerCategory::Food,
            FillerCategory::Potions,
            FillerCategory::Antidotes,
            FillerCategory::Cures,
            FillerCategory::Bombs,
        ];
        let stocked: SmallVec<[FillerCategory; 5]> = CATEGORIES
            .into_iter()
            .filter(|&category| !self.items(category).is_empty())
            .collect();
        let category = *stocked.choose(rng)?;
        self.items(category).choose(rng).map(String::as_str)
    }
}

/// Errors raised while loading or validating game data.
#[derive(Debug, Error)]
pub enum GameDataError {
    #[error("game data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("game data has no entry for life {life}")]
    MissingLife { life: Life },
    #[error("game data lists life {life} more than once")]
    DuplicateLife { life: Life },
    #[error("requester '{name}' is listed more than once")]
    DuplicateRequester { name: String },
    #[error("requester '{name}' declares checkpoint {checkpoint}, expected 1..={max}")]
    CheckpointOutOfRange { name: String, checkpoint: u8, max: u8 },
}

/// Container for everything the rule catalog reads from game data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    pub lives: Vec<LifeData>,
    #[serde(default)]
    pub requesters: Vec<Requester>,
    #[serde(default)]
    pub filler: FillerTable,
}

impl GameData {
    /// Load and validate game data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, GameDataError> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    /// The game data shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled asset is corrupt.
    pub fn bundled() -> Result<Self, GameDataError> {
        Self::from_json(BUNDLED_GAME_DATA)
    }

    /// Check that every life appears exactly once and requesters are well formed.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), GameDataError> {
        let mut seen_lives = HashSet::new();
        for entry in &self.lives {
            if !seen_lives.insert(entry.life) {
                return Err(GameDataError::DuplicateLife { life: entry.life });
            }
        }
        if let Some(&life) = Life::ALL.iter().find(|life| !seen_lives.contains(*life)) {
            return Err(GameDataError::MissingLife { life });
        }

        for (index, requester) in self.requesters.iter().enumerate() {
            let earlier = &self.requesters[..index];
            if earlier.iter().any(|other| other.is_named(&requester.name)) {
                return Err(GameDataError::DuplicateRequester {
                    name: requester.name.clone(),
                });
            }
            for req in &requester.requirements {
                if req.checkpoint == 0 || req.checkpoint > MAX_REQUEST_CHECKPOINTS {
                    return Err(GameDataError::CheckpointOutOfRange {
                        name: requester.name.clone(),
                        checkpoint: req.checkpoint,
                        max: MAX_REQUEST_CHECKPOINTS,
                    });
                }
            }
        }
        Ok(())
    }

    /// Equipment `life` needs; empty when the data lists none.
    #[must_use]
    pub fn equipment(&self, life: Life) -> &[String] {
        self.lives
            .iter()
            .find(|entry| entry.life == life)
            .map(|entry| entry.equipment.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn requester(&self, name: &str) -> Option<&Requester> {
        self.requesters
            .iter()
            .find(|requester| requester.is_named(name))
    }
}

/// Source of game data for hosts that do not ship the bundled asset.
pub trait GameDataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load game data from the host's source.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be loaded.
    fn load_game_data(&self) -> Result<GameData, Self::Error>;
}

/// Loader serving the bundled asset.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLoader;

impl GameDataLoader for BundledLoader {
    type Error = GameDataError;

    fn load_game_data(&self) -> Result<GameData, Self::Error> {
        GameData::bundled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn bundled_data_covers_every_life() {
        let data = GameData::bundled().unwrap();
        for &life in Life::ALL {
            assert!(!data.equipment(life).is_empty(), "{life}");
        }
        assert_eq!(data.requesters.len(), 100);
        assert!(data.requester("sir loin").is_some());
    }

    #[test]
    fn missing_lives_are_rejected() {
        let json = r#"{ "lives": [ { "life": "paladin", "equipment": ["Sword"] } ] }"#;
        let err = GameData::from_json(json).unwrap_err();
        assert!(matches!(err, GameDataError::MissingLife { life: Life::Mercenary }));
    }

    #[test]
    fn requester_checkpoints_parse_rank_names() {
        let mut data = GameData::bundled().unwrap();
        let json = r#"{
            "name": "Test Villager",
            "chapter": 2,
            "requirements": [
                { "checkpoint": 1, "target": "miner", "rank": "Adept" },
                { "checkpoint": 2, "target": "combat", "rank": "Demi Creator" }
            ]
        }"#;
        let requester: Requester = serde_json::from_str(json).unwrap();
        assert_eq!(requester.requirement(1).unwrap().target, LifeTarget::Life(Life::Miner));
        assert_eq!(requester.requirement(2).unwrap().rank, Rank::DemiCreator);
        assert_eq!(
            requester.requirement(2).unwrap().target,
            LifeTarget::Role(LifeRole::Combat)
        );
        data.requesters.push(requester.clone());
        data.requesters.push(requester);
        assert!(matches!(
            data.validate(),
            Err(GameDataError::DuplicateRequester { .. })
        ));
    }

    #[test]
    fn requester_names_compare_without_case() {
        let mut data = GameData::bundled().unwrap();
        let mut twin = data.requesters[0].clone();
        let name = twin.name.clone();
        twin.name = format!(" {} ", name.to_ascii_lowercase());
        assert!(data.requester(&twin.name).is_some_and(|found| found.name == name));

        data.requesters.push(twin);
        assert!(matches!(
            data.validate(),
            Err(GameDataError::DuplicateRequester { .. })
        ));
    }

    #[test]
    fn unknown_rank_names_fail_to_parse() {
        let json = r#"{ "checkpoint": 1, "target": "miner", "rank": "Legendary" }"#;
        let err = serde_json::from_str::<CheckpointRequirement>(json).unwrap_err();
        assert!(err.to_string().contains("Legendary"));
    }

    #[test]
    fn checkpoints_outside_range_are_rejected() {
        let mut data = GameData::bundled().unwrap();
        data.requesters[0].requirements.push(CheckpointRequirement {
            checkpoint: 5,
            target: LifeTarget::Life(Life::Cook),
            rank: Rank::Novice,
        });
        assert!(matches!(
            data.validate(),
            Err(GameDataError::CheckpointOutOfRange { checkpoint: 5, .. })
        ));
    }

    #[test]
    fn filler_picks_are_seed_stable() {
        let data = GameData::bundled().unwrap();
        let first: Vec<String> = {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            (0..8)
                .filter_map(|_| data.filler.pick(&mut rng).map(str::to_string))
                .collect()
        };
        let second: Vec<String> = {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            (0..8)
                .filter_map(|_| data.filler.pick(&mut rng).map(str::to_string))
                .collect()
        };
        assert_eq!(first.len(), 8);
        assert_eq!(first, second);
        assert!(FillerTable::default().pick(&mut ChaCha8Rng::seed_from_u64(1)).is_none());
    }
}
