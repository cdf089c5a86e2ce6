//! Player options and the immutable snapshot the rule catalog is built from.
//!
//! [`Options`] mirrors the raw option values a host resolves for one player.
//! [`Options::into_snapshot`] validates them once, resolves the random starting
//! life and bliss bonus from a seed, and yields a [`ConfigSnapshot`] that never changes again.
//! Combinations the game cannot support are rejected with a
//! [`ConfigurationError`] instead of being adjusted.
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    ITEM_BETTER_SHOPPING, ITEM_BIGGER_BAG, ITEM_BIGGER_STORAGE, LIFE_MASTERY_COUNT_MAX,
    LIFE_MASTERY_COUNT_MIN, LOG_SNAPSHOT_STARTING_BLISS, LOG_SNAPSHOT_STARTING_LIFE,
    WISH_CAPACITY_FIRST_BASE, WISH_CAPACITY_FIRST_DLC, WISH_CAPACITY_SECOND_BASE,
    WISH_CAPACITY_SECOND_DLC, WISH_HUNT_MAX, WISH_HUNT_MIN,
};
use crate::data::GameDataError;
use crate::life::{Life, LifeRole};
use crate::tier::{LicenseScheme, Rank, TierError, TierResolver, deserialize_rank_name};

/// Win condition selected for the player.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Collect a number of Lost Wishes.
    #[default]
    WishHunt,
    /// Raise several lives to a target rank.
    LifeMastery,
}

impl Goal {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WishHunt => "wish_hunt",
            Self::LifeMastery => "life_mastery",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many numbered Other Requests per requester are checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum OtherRequests {
    None,
    OnlyFirst,
    UpToSecond,
    UpToThird,
    #[default]
    All,
}

impl OtherRequests {
    /// Highest request checkpoint included.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::None => 0,
            Self::OnlyFirst => 1,
            Self::UpToSecond => 2,
            Self::UpToThird => 3,
            Self::All => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OnlyFirst => "only_first",
            Self::UpToSecond => "up_to_second",
            Self::UpToThird => "up_to_third",
            Self::All => "all",
        }
    }

    /// Smallest setting whose checkpoints can hold `total` Lost Wishes.
    #[must_use]
    pub const fn required_for_wishes(total: u32, dlc: bool) -> Self {
        let (first, second) = if dlc {
            (WISH_CAPACITY_FIRST_DLC, WISH_CAPACITY_SECOND_DLC)
        } else {
            (WISH_CAPACITY_FIRST_BASE, WISH_CAPACITY_SECOND_BASE)
        };
        if total <= first {
            Self::OnlyFirst
        } else if total <= second {
            Self::UpToSecond
        } else {
            Self::UpToThird
        }
    }
}

/// Which life the player starts with a license for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StartingLife {
    Disabled,
    Fixed(Life),
    /// Seeded pick among the members of a role.
    Random(LifeRole),
}

impl Default for StartingLife {
    fn default() -> Self {
        Self::Random(LifeRole::CombatEasy)
    }
}

impl FromStr for StartingLife {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("disabled") {
            return Ok(Self::Disabled);
        }
        if let Ok(life) = s.parse::<Life>() {
            return Ok(Self::Fixed(life));
        }
        s.parse::<LifeRole>()
            .map(Self::Random)
            .map_err(|()| format!("unknown starting life '{s}'"))
    }
}

impl TryFrom<String> for StartingLife {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StartingLife> for String {
    fn from(value: StartingLife) -> Self {
        match value {
            StartingLife::Disabled => "disabled".to_string(),
            StartingLife::Fixed(life) => life.as_str().to_ascii_lowercase(),
            StartingLife::Random(role) => role.as_str().to_string(),
        }
    }
}

/// Bliss bonus the player starts with when bliss bonuses are in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartingBlissBonus {
    Disabled,
    Bag,
    Storage,
    Shopping,
    /// Seeded pick among bag, storage and shopping.
    #[default]
    Any,
}

impl StartingBlissBonus {
    pub const ALL: &'static [Self] = &[
        Self::Disabled,
        Self::Bag,
        Self::Storage,
        Self::Shopping,
        Self::Any,
    ];

    const PICKABLE: [&'static str; 3] =
        [ITEM_BIGGER_BAG, ITEM_BIGGER_STORAGE, ITEM_BETTER_SHOPPING];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Bag => "bag",
            Self::Storage => "storage",
            Self::Shopping => "shopping",
            Self::Any => "any",
        }
    }

    fn resolve(self, rng: &mut ChaCha8Rng) -> Option<&'static str> {
        match self {
            Self::Disabled => None,
            Self::Bag => Some(ITEM_BIGGER_BAG),
            Self::Storage => Some(ITEM_BIGGER_STORAGE),
            Self::Shopping => Some(ITEM_BETTER_SHOPPING),
            Self::Any => Self::PICKABLE.choose(rng).copied(),
        }
    }
}

impl fmt::Display for StartingBlissBonus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw option values for one player, as resolved by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub progressive_licenses: LicenseScheme,
    #[serde(default = "Options::default_dlc")]
    pub dlc: bool,
    #[serde(default)]
    pub item_restrictions: bool,
    #[serde(default)]
    pub goal: Goal,
    #[serde(default = "Options::default_wish_hunt_required")]
    pub wish_hunt_required: u32,
    #[serde(default = "Options::default_wish_hunt_total")]
    pub wish_hunt_total: u32,
    #[serde(
        default = "Options::default_life_mastery_rank",
        deserialize_with = "deserialize_rank_name"
    )]
    pub life_mastery_rank: Rank,
    #[serde(default = "Options::default_life_mastery_count")]
    pub life_mastery_count: u32,
    #[serde(default)]
    pub require_main_story_for_goal: bool,
    #[serde(default)]
    pub other_requests: OtherRequests,
    #[serde(default)]
    pub bliss_bonuses: bool,
    #[serde(default)]
    pub starting_life: StartingLife,
    #[serde(default)]
    pub starting_bliss_bonus: StartingBlissBonus,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            progressive_licenses: LicenseScheme::default(),
            dlc: Self::default_dlc(),
            item_restrictions: false,
            goal: Goal::default(),
            wish_hunt_required: Self::default_wish_hunt_required(),
            wish_hunt_total: Self::default_wish_hunt_total(),
            life_mastery_rank: Self::default_life_mastery_rank(),
            life_mastery_count: Self::default_life_mastery_count(),
            require_main_story_for_goal: false,
            other_requests: OtherRequests::default(),
            bliss_bonuses: false,
            starting_life: StartingLife::default(),
            starting_bliss_bonus: StartingBlissBonus::default(),
        }
    }
}

/// Errors raised while validating options or building the rule catalog.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid goal configuration: {reason}")]
    InvalidGoalConfiguration { reason: String },
    #[error("rank {rank} is unavailable for {context}: the Origin Island DLC is excluded")]
    TierUnavailable { rank: Rank, context: String },
    #[error("unknown rank '{name}' in {context}")]
    UnknownTier { name: String, context: String },
    #[error("option {option} is invalid: {reason}")]
    InvalidOption { option: &'static str, reason: String },
    #[error(transparent)]
    GameData(#[from] GameDataError),
}

impl ConfigurationError {
    /// Attach `context` (the option, key or requester involved) to a tier error.
    pub(crate) fn from_tier(err: TierError, context: impl Into<String>) -> Self {
        match err {
            TierError::UnknownTier { name } => Self::UnknownTier {
                name,
                context: context.into(),
            },
            TierError::TierUnavailable { rank } => Self::TierUnavailable {
                rank,
                context: context.into(),
            },
        }
    }
}

impl Options {
    const fn default_dlc() -> bool {
        true
    }

    const fn default_wish_hunt_required() -> u32 {
        30
    }

    const fn default_wish_hunt_total() -> u32 {
        50
    }

    const fn default_life_mastery_rank() -> Rank {
        Rank::Master
    }

    const fn default_life_mastery_count() -> u32 {
        1
    }

    /// Parse options from a JSON object; absent keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        for (option, value) in [
            ("wish_hunt_required", self.wish_hunt_required),
            ("wish_hunt_total", self.wish_hunt_total),
        ] {
            if !(WISH_HUNT_MIN..=WISH_HUNT_MAX).contains(&value) {
                return Err(ConfigurationError::InvalidOption {
                    option,
                    reason: format!("{value} is outside {WISH_HUNT_MIN}..={WISH_HUNT_MAX}"),
                });
            }
        }
        if !(LIFE_MASTERY_COUNT_MIN..=LIFE_MASTERY_COUNT_MAX).contains(&self.life_mastery_count) {
            return Err(ConfigurationError::InvalidOption {
                option: "life_mastery_count",
                reason: format!(
                    "{} is outside {LIFE_MASTERY_COUNT_MIN}..={LIFE_MASTERY_COUNT_MAX}",
                    self.life_mastery_count
                ),
            });
        }
        if self.life_mastery_rank == Rank::Novice {
            return Err(ConfigurationError::InvalidOption {
                option: "life_mastery_rank",
                reason: "every life starts at Novice; pick Fledgling or above".to_string(),
            });
        }
        if matches!(self.progressive_licenses, LicenseScheme::Full)
            && self.other_requests == OtherRequests::None
        {
            return Err(ConfigurationError::InvalidOption {
                option: "progressive_licenses",
                reason: "full progressive licenses need Other Requests as checks; \
                         use fast licenses or include other requests"
                    .to_string(),
            });
        }
        if self.goal == Goal::WishHunt {
            let needed = OtherRequests::required_for_wishes(self.wish_hunt_total, self.dlc);
            if self.other_requests < needed {
                return Err(ConfigurationError::InvalidOption {
                    option: "other_requests",
                    reason: format!(
                        "{} Lost Wishes need other_requests of at least {}",
                        self.wish_hunt_total,
                        needed.as_str()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Validate the options and freeze them into a snapshot.
    ///
    /// `seed` drives the random starting-life and bliss-bonus picks so the same
    /// seed always yields the same snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] naming the first offending option.
    pub fn into_snapshot(self, seed: u64) -> Result<ConfigSnapshot, ConfigurationError> {
        self.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let starting_life = self.resolve_starting_life(&mut rng);
        if let Some(life) = starting_life {
            log::debug!("{LOG_SNAPSHOT_STARTING_LIFE}: {life} (seed {seed:#x})");
        }
        let starting_bliss_bonus = if self.bliss_bonuses {
            self.starting_bliss_bonus.resolve(&mut rng)
        } else {
            None
        };
        if let Some(bonus) = starting_bliss_bonus {
            log::debug!("{LOG_SNAPSHOT_STARTING_BLISS}: {bonus} (seed {seed:#x})");
        }
        Ok(ConfigSnapshot {
            scheme: self.progressive_licenses,
            dlc: self.dlc,
            item_restrictions: self.item_restrictions,
            goal: self.goal,
            wish_hunt: WishHuntParams {
                required: self.wish_hunt_required,
                total: self.wish_hunt_total,
            },
            life_mastery: LifeMasteryParams {
                rank: self.life_mastery_rank,
                count: self.life_mastery_count,
            },
            main_story_required: self.require_main_story_for_goal,
            other_requests: self.other_requests,
            bliss_bonuses: self.bliss_bonuses,
            starting_life,
            starting_bliss_bonus,
        })
    }

    fn resolve_starting_life(&self, rng: &mut ChaCha8Rng) -> Option<Life> {
        if matches!(self.progressive_licenses, LicenseScheme::Disabled) {
            return None;
        }
        match self.starting_life {
            StartingLife::Disabled => None,
            StartingLife::Fixed(life) => Some(life),
            StartingLife::Random(role) => role.members().choose(rng).copied(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WishHuntParams {
    pub required: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LifeMasteryParams {
    pub rank: Rank,
    pub count: u32,
}

/// Validated, immutable configuration for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    scheme: LicenseScheme,
    dlc: bool,
    item_restrictions: bool,
    goal: Goal,
    wish_hunt: WishHuntParams,
    life_mastery: LifeMasteryParams,
    main_story_required: bool,
    other_requests: OtherRequests,
    bliss_bonuses: bool,
    starting_life: Option<Life>,
    starting_bliss_bonus: Option<&'static str>,
}

impl ConfigSnapshot {
    #[must_use]
    pub const fn scheme(&self) -> LicenseScheme {
        self.scheme
    }

    #[must_use]
    pub const fn dlc(&self) -> bool {
        self.dlc
    }

    #[must_use]
    pub const fn item_restrictions(&self) -> bool {
        self.item_restrictions
    }

    #[must_use]
    pub const fn goal(&self) -> Goal {
        self.goal
    }

    #[must_use]
    pub const fn wish_hunt(&self) -> WishHuntParams {
        self.wish_hunt
    }

    #[must_use]
    pub const fn life_mastery(&self) -> LifeMasteryParams {
        self.life_mastery
    }

    #[must_use]
    pub const fn main_story_required(&self) -> bool {
        self.main_story_required
    }

    #[must_use]
    pub const fn other_requests(&self) -> OtherRequests {
        self.other_requests
    }

    #[must_use]
    pub const fn bliss_bonuses(&self) -> bool {
        self.bliss_bonuses
    }

    #[must_use]
    pub const fn starting_life(&self) -> Option<Life> {
        self.starting_life
    }

    /// Bliss bonus item precollected for the player, if any.
    #[must_use]
    pub const fn starting_bliss_bonus(&self) -> Option<&'static str> {
        self.starting_bliss_bonus
    }

    #[must_use]
    pub const fn tier_resolver(&self) -> TierResolver {
        TierResolver::new(self.scheme, self.dlc)
    }

    /// Items the host should precollect for the player.
    #[must_use]
    pub fn starting_items(&self) -> Vec<String> {
        let resolver = self.tier_resolver();
        self.starting_life
            .and_then(|life| resolver.license_item(life))
            .into_iter()
            .chain(self.starting_bliss_bonus.map(str::to_string))
            .collect()
    }

    /// Host location-category toggle: `Some(enabled)` for categories these options
    /// control, `None` to defer to the host's default.
    #[must_use]
    pub fn is_location_category_enabled(&self, category: &str) -> Option<bool> {
        let category = category.trim();
        if category.eq_ignore_ascii_case("Wish Hunt") {
            return Some(self.goal == Goal::WishHunt);
        }
        let level = category
            .strip_prefix("Other Requests ")
            .and_then(|rest| rest.trim().parse::<u8>().ok())?;
        Some(self.other_requests.level() >= level)
    }
}
