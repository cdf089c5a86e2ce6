//! Fantasy Life Randomizer Logic
//!
//! Access-rule engine for a Fantasy Life multiworld randomizer: license tiers,
//! story milestones, requester checkpoints and win conditions, compiled into a
//! read-only [`Catalog`] of predicates over a player's collected items.
//! The crate holds no world-generation or host state; hosts supply options, game
//! data and item counts.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod data;
pub mod goal;
pub mod life;
pub mod predicate;
pub mod state;
pub mod tier;

pub use catalog::{Catalog, RuleError, RuleKey, milestone_gate};
pub use config::{
    ConfigSnapshot, ConfigurationError, Goal, LifeMasteryParams, Options, OtherRequests,
    StartingBlissBonus, StartingLife, WishHuntParams,
};
pub use data::{
    BundledLoader, CheckpointRequirement, FillerCategory, FillerTable, GameData, GameDataError,
    GameDataLoader, LifeData, LifeTarget, Requester,
};
pub use goal::{life_mastery_goal, wish_hunt_goal};
pub use life::{Life, LifeRole};
pub use predicate::{Predicate, Quantifier, Trace, TraceEntry};
pub use state::{CollectionState, ItemCounts, Milestone, PlayerId, normalize_item_name};
pub use tier::{LicenseScheme, Rank, RankEntry, TierError, TierRequirement, TierResolver};

use anyhow::Context;

/// Compile the catalog for one validated configuration.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] when the game data or goal parameters are
/// invalid for the snapshot.
pub fn build_catalog(
    snapshot: &ConfigSnapshot,
    data: &GameData,
) -> Result<Catalog, ConfigurationError> {
    Catalog::build(snapshot, data)
}

/// Builds catalogs for players from a host-provided game data source.
pub struct RuleEngine<L>
where
    L: GameDataLoader,
{
    data_loader: L,
}

impl<L> RuleEngine<L>
where
    L: GameDataLoader,
{
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Validate `options` and compile the player's catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if game data cannot be loaded, the options are invalid,
    /// or the catalog cannot be built.
    pub fn catalog_for(
        &self,
        player: PlayerId,
        options: Options,
        seed: u64,
    ) -> Result<Catalog, anyhow::Error> {
        let data = self
            .data_loader
            .load_game_data()
            .with_context(|| format!("loading game data for {player}"))?;
        let snapshot = options
            .into_snapshot(seed)
            .with_context(|| format!("validating options for {player}"))?;
        let catalog = build_catalog(&snapshot, &data)
            .with_context(|| format!("building rule catalog for {player}"))?;
        log::debug!("{player}: {} rules ready", catalog.len());
        Ok(catalog)
    }
}

impl Default for RuleEngine<BundledLoader> {
    fn default() -> Self {
        Self::new(BundledLoader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("fixture store is offline")]
    struct Offline;

    struct OfflineLoader;

    impl GameDataLoader for OfflineLoader {
        type Error = Offline;

        fn load_game_data(&self) -> Result<GameData, Self::Error> {
            Err(Offline)
        }
    }

    #[test]
    fn engine_builds_catalog_from_bundled_data() {
        let engine = RuleEngine::default();
        let catalog = engine
            .catalog_for(PlayerId(2), Options::default(), 99)
            .unwrap();
        assert!(catalog.resolve("goal").is_ok());
        assert_eq!(catalog.snapshot().goal(), Goal::WishHunt);
    }

    #[test]
    fn engine_reports_loader_failures_with_context() {
        let engine = RuleEngine::new(OfflineLoader);
        let err = engine
            .catalog_for(PlayerId(4), Options::default(), 1)
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("loading game data for player 4"), "{message}");
        assert!(message.contains("offline"), "{message}");
    }

    #[test]
    fn engine_reports_invalid_options() {
        let options = Options {
            wish_hunt_required: 0,
            ..Options::default()
        };
        let err = RuleEngine::default()
            .catalog_for(PlayerId(1), options, 1)
            .unwrap_err();
        assert!(err.downcast_ref::<ConfigurationError>().is_some());
    }
}
