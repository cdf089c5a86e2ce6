//! Rule catalog: every named access rule for one player's configuration.
//!
//! The catalog is compiled once from a [`ConfigSnapshot`] and [`GameData`] and
//! is read-only afterwards. Keys have a stable string form so hosts can refer to
//! rules from their location tables:
//!
//! | key | rule |
//! |---|---|
//! | `license:<Life>:<Rank>` | the life has reached the rank |
//! | `any:<role>:<Rank>` / `all:<role>:<Rank>` | some / every life of the role has |
//! | `chapter:<n>` / `intermission:<n>` | story milestone counts |
//! | `request:<Requester>:<n>` | numbered Other Request of a requester |
//! | `shopping:<n>` | Better Shopping tier |
//! | `goal`, `goal:wish_hunt`, `goal:life_mastery` | win conditions |
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ConfigSnapshot, ConfigurationError, Goal};
use crate::constants::{
    ITEM_BETTER_SHOPPING, LOG_CATALOG_BUILT, MAX_CHAPTERS_BASE, MAX_CHAPTERS_DLC,
    MAX_INTERMISSIONS_BASE, MAX_INTERMISSIONS_DLC, MAX_SHOPPING_TIERS,
};
use crate::data::{GameData, LifeTarget, Requester};
use crate::goal::{life_mastery_goal, wish_hunt_goal};
use crate::life::{Life, LifeRole};
use crate::predicate::{Predicate, Quantifier};
use crate::state::Milestone;
use crate::tier::{Rank, TierError, TierRequirement, TierResolver};

/// Identifier of a catalog rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum RuleKey {
    License { life: Life, rank: Rank },
    AnyLife { role: LifeRole, rank: Rank },
    AllLives { role: LifeRole, rank: Rank },
    Milestone { milestone: Milestone, count: u32 },
    Request { requester: String, checkpoint: u8 },
    Shopping { tier: u32 },
    Goal,
    GoalOf(Goal),
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::License { life, rank } => write!(f, "license:{life}:{rank}"),
            Self::AnyLife { role, rank } => write!(f, "any:{role}:{rank}"),
            Self::AllLives { role, rank } => write!(f, "all:{role}:{rank}"),
            Self::Milestone { milestone, count } => write!(f, "{}:{count}", milestone.key()),
            Self::Request {
                requester,
                checkpoint,
            } => write!(f, "request:{requester}:{checkpoint}"),
            Self::Shopping { tier } => write!(f, "shopping:{tier}"),
            Self::Goal => f.write_str("goal"),
            Self::GoalOf(goal) => write!(f, "goal:{goal}"),
        }
    }
}

impl From<RuleKey> for String {
    fn from(value: RuleKey) -> Self {
        value.to_string()
    }
}

/// Errors returned when looking a rule up.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("no rule is built for key '{key}'")]
    UnknownRuleKey { key: String },
    #[error("rule key '{key}' names an unknown rank '{name}'")]
    UnknownTier { key: String, name: String },
}

impl RuleError {
    fn unknown(key: &str) -> Self {
        Self::UnknownRuleKey {
            key: key.to_string(),
        }
    }
}

fn parse_count<T: FromStr>(key: &str, raw: &str) -> Result<T, RuleError> {
    raw.trim().parse().map_err(|_| RuleError::unknown(key))
}

fn parse_rank(key: &str, raw: &str) -> Result<Rank, RuleError> {
    Rank::parse_name(raw).map_err(|err| match err {
        TierError::UnknownTier { name } => RuleError::UnknownTier {
            key: key.to_string(),
            name,
        },
        TierError::TierUnavailable { .. } => RuleError::unknown(key),
    })
}

impl FromStr for RuleKey {
    type Err = RuleError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = key.trim().split(':').collect();
        let parsed = match parts.as_slice() {
            ["goal"] => Self::Goal,
            ["goal", "wish_hunt"] => Self::GoalOf(Goal::WishHunt),
            ["goal", "life_mastery"] => Self::GoalOf(Goal::LifeMastery),
            ["license", life, rank] => Self::License {
                life: life.parse::<Life>().map_err(|()| RuleError::unknown(key))?,
                rank: parse_rank(key, rank)?,
            },
            [quantifier @ ("any" | "all"), role, rank] => {
                let role = role.parse::<LifeRole>().map_err(|()| RuleError::unknown(key))?;
                let rank = parse_rank(key, rank)?;
                if *quantifier == "any" {
                    Self::AnyLife { role, rank }
                } else {
                    Self::AllLives { role, rank }
                }
            }
            ["chapter", count] => Self::Milestone {
                milestone: Milestone::Chapter,
                count: parse_count(key, count)?,
            },
            ["intermission", count] => Self::Milestone {
                milestone: Milestone::Intermission,
                count: parse_count(key, count)?,
            },
            ["request", requester, checkpoint] => Self::Request {
                requester: requester.trim().to_string(),
                checkpoint: parse_count(key, checkpoint)?,
            },
            ["shopping", tier] => Self::Shopping {
                tier: parse_count(key, tier)?,
            },
            _ => return Err(RuleError::unknown(key)),
        };
        Ok(parsed)
    }
}

pub(crate) const fn max_milestones(milestone: Milestone, dlc: bool) -> u32 {
    match (milestone, dlc) {
        (Milestone::Chapter, false) => MAX_CHAPTERS_BASE,
        (Milestone::Chapter, true) => MAX_CHAPTERS_DLC,
        (Milestone::Intermission, false) => MAX_INTERMISSIONS_BASE,
        (Milestone::Intermission, true) => MAX_INTERMISSIONS_DLC,
    }
}

/// Story milestone gate; trivially true when `count` is 0.
#[must_use]
pub fn milestone_gate(milestone: Milestone, count: u32) -> Predicate {
    Predicate::threshold(milestone.item_name(), count)
}

/// Compiles rank and life predicates for one snapshot.
pub(crate) struct RuleBuilder<'a> {
    snapshot: &'a ConfigSnapshot,
    data: &'a GameData,
    resolver: TierResolver,
}

impl<'a> RuleBuilder<'a> {
    pub(crate) const fn new(snapshot: &'a ConfigSnapshot, data: &'a GameData) -> Self {
        Self {
            snapshot,
            data,
            resolver: snapshot.tier_resolver(),
        }
    }

    pub(crate) const fn resolver(&self) -> TierResolver {
        self.resolver
    }

    /// `life` has reached `rank`, including required equipment when item
    /// restrictions are on.
    pub(crate) fn rank(&self, life: Life, rank: Rank) -> Result<Predicate, TierError> {
        let licenses = match self.resolver.resolve(rank)? {
            TierRequirement::Trivial => Predicate::Always,
            TierRequirement::Licenses { count, min_chapter } => {
                match self.resolver.license_item(life) {
                    Some(item) => Predicate::all_of([
                        milestone_gate(Milestone::Chapter, min_chapter),
                        Predicate::threshold(item, count),
                    ]),
                    None => Predicate::Always,
                }
            }
        };
        let predicate = if self.snapshot.item_restrictions() {
            Predicate::all_of([licenses, Predicate::has_all(self.data.equipment(life))])
        } else {
            licenses
        };
        Ok(predicate.simplify())
    }

    pub(crate) fn role(
        &self,
        role: LifeRole,
        rank: Rank,
        mode: Quantifier,
    ) -> Result<Predicate, TierError> {
        let members = role
            .members()
            .iter()
            .map(|&life| self.rank(life, rank))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Predicate::Quantified { mode, members })
    }

    fn target(&self, target: LifeTarget, rank: Rank) -> Result<Predicate, TierError> {
        match target {
            LifeTarget::Life(life) => self.rank(life, rank),
            LifeTarget::Role(role) => self.role(role, rank, Quantifier::any()),
        }
    }

    fn request(
        &self,
        requester: &Requester,
        checkpoint: u8,
    ) -> Result<Predicate, ConfigurationError> {
        let context = || format!("request:{}:{checkpoint}", requester.name);
        let max_chapters = max_milestones(Milestone::Chapter, self.snapshot.dlc());
        if requester.chapter > max_chapters {
            return Err(ConfigurationError::InvalidOption {
                option: "dlc",
                reason: format!(
                    "{} appears after chapter {} but only {max_chapters} chapters exist",
                    context(),
                    requester.chapter
                ),
            });
        }
        let requirement = match requester.requirement(checkpoint) {
            Some(req) => self
                .target(req.target, req.rank)
                .map_err(|err| ConfigurationError::from_tier(err, context()))?,
            None => Predicate::Always,
        };
        Ok(Predicate::all_of([
            milestone_gate(Milestone::Chapter, requester.chapter),
            requirement,
        ])
        .simplify())
    }
}

/// Compiled, read-only rule set for one player.
#[derive(Debug, Clone)]
pub struct Catalog {
    rules: BTreeMap<RuleKey, Predicate>,
    goal: Predicate,
    snapshot: ConfigSnapshot,
}

impl Catalog {
    /// Compile every rule relevant under `snapshot`.
    ///
    /// Ranks that need the DLC are skipped when the DLC is excluded; explicit
    /// demands for them (goal target, requester checkpoints) fail here rather
    /// than at evaluation time.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for invalid game data, goal parameters,
    /// or ranks the configuration cannot reach.
    pub fn build(snapshot: &ConfigSnapshot, data: &GameData) -> Result<Self, ConfigurationError> {
        data.validate()?;
        let builder = RuleBuilder::new(snapshot, data);
        let resolver = builder.resolver();
        let mut rules = BTreeMap::new();

        for &life in Life::ALL {
            for rank in resolver.available_ranks() {
                let predicate = builder.rank(life, rank).map_err(|err| {
                    ConfigurationError::from_tier(err, format!("license:{life}:{rank}"))
                })?;
                rules.insert(RuleKey::License { life, rank }, predicate);
            }
        }

        for &role in LifeRole::ALL {
            for rank in resolver.available_ranks() {
                let context = || format!("{role}:{rank}");
                let any = builder
                    .role(role, rank, Quantifier::any())
                    .map_err(|err| ConfigurationError::from_tier(err, context()))?;
                let all = builder
                    .role(role, rank, Quantifier::All)
                    .map_err(|err| ConfigurationError::from_tier(err, context()))?;
                rules.insert(RuleKey::AnyLife { role, rank }, any.simplify());
                rules.insert(RuleKey::AllLives { role, rank }, all.simplify());
            }
        }

        for &milestone in Milestone::ALL {
            for count in 1..=max_milestones(milestone, snapshot.dlc()) {
                rules.insert(
                    RuleKey::Milestone { milestone, count },
                    milestone_gate(milestone, count),
                );
            }
        }

        for requester in &data.requesters {
            if requester.dlc && !snapshot.dlc() {
                continue;
            }
            for checkpoint in 1..=snapshot.other_requests().level() {
                let predicate = builder.request(requester, checkpoint)?;
                rules.insert(
                    RuleKey::Request {
                        requester: requester.name.clone(),
                        checkpoint,
                    },
                    predicate,
                );
            }
        }

        for tier in 1..=MAX_SHOPPING_TIERS {
            let predicate = if snapshot.bliss_bonuses() {
                Predicate::threshold(ITEM_BETTER_SHOPPING, tier)
            } else {
                Predicate::Always
            };
            rules.insert(RuleKey::Shopping { tier }, predicate);
        }

        let wish_hunt = (Goal::WishHunt, wish_hunt_goal(snapshot));
        let life_mastery = (Goal::LifeMastery, life_mastery_goal(snapshot, data));
        let (selected, unselected) = match snapshot.goal() {
            Goal::WishHunt => (wish_hunt, life_mastery),
            Goal::LifeMastery => (life_mastery, wish_hunt),
        };
        let goal = selected.1?;
        rules.insert(RuleKey::GoalOf(selected.0), goal.clone());
        match unselected.1 {
            Ok(predicate) => {
                rules.insert(RuleKey::GoalOf(unselected.0), predicate);
            }
            Err(err) => log::debug!("skipping unselected goal {}: {err}", unselected.0),
        }
        rules.insert(RuleKey::Goal, goal.clone());

        log::info!(
            "{LOG_CATALOG_BUILT}: {} rules (licenses {}, dlc {}, goal {})",
            rules.len(),
            snapshot.scheme(),
            snapshot.dlc(),
            snapshot.goal()
        );

        Ok(Self {
            rules,
            goal,
            snapshot: snapshot.clone(),
        })
    }

    /// Look a rule up by its string key.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnknownRuleKey`] when the key is malformed or was not
    /// built for this configuration, [`RuleError::UnknownTier`] when it names an
    /// unknown rank.
    pub fn resolve(&self, key: &str) -> Result<&Predicate, RuleError> {
        let parsed: RuleKey = key.parse()?;
        self.rules.get(&parsed).ok_or_else(|| RuleError::unknown(key))
    }

    /// Look a rule up by typed key.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnknownRuleKey`] when the key was not built.
    pub fn get(&self, key: &RuleKey) -> Result<&Predicate, RuleError> {
        self.rules
            .get(key)
            .ok_or_else(|| RuleError::unknown(&key.to_string()))
    }

    /// The win condition selected by the configuration.
    #[must_use]
    pub const fn goal_predicate(&self) -> &Predicate {
        &self.goal
    }

    #[must_use]
    pub const fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Whether the host should create locations of `category`; `None` for
    /// categories the configuration does not toggle.
    #[must_use]
    pub fn is_location_category_enabled(&self, category: &str) -> Option<bool> {
        self.snapshot.is_location_category_enabled(category)
    }

    /// Keys in stable order.
    pub fn keys(&self) -> impl Iterator<Item = &RuleKey> {
        self.rules.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RuleKey, &Predicate)> {
        self.rules.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Options, OtherRequests};
    use crate::state::{ItemCounts, PlayerId};
    use crate::tier::LicenseScheme;

    fn catalog(options: Options) -> Catalog {
        let snapshot = options.into_snapshot(11).unwrap();
        Catalog::build(&snapshot, &GameData::bundled().unwrap()).unwrap()
    }

    #[test]
    fn keys_round_trip_through_strings() {
        let keys = [
            "license:Paladin:Demi-Creator",
            "any:combat_easy:Expert",
            "all:gathering:Master",
            "chapter:3",
            "intermission:2",
            "request:Sir Loin:2",
            "shopping:1",
            "goal",
            "goal:life_mastery",
        ];
        for key in keys {
            let parsed: RuleKey = key.parse().unwrap();
            assert_eq!(parsed.to_string(), key);
        }
        assert_eq!(
            "license:paladin:demi creator".parse::<RuleKey>().unwrap().to_string(),
            "license:Paladin:Demi-Creator"
        );
    }

    #[test]
    fn malformed_keys_are_unknown() {
        for key in ["", "license:Paladin", "license:Bard:Novice", "chapter:x", "goal:speedrun"] {
            assert!(
                matches!(key.parse::<RuleKey>(), Err(RuleError::UnknownRuleKey { .. })),
                "{key}"
            );
        }
        assert_eq!(
            "license:Paladin:Grandmaster".parse::<RuleKey>(),
            Err(RuleError::UnknownTier {
                key: "license:Paladin:Grandmaster".to_string(),
                name: "Grandmaster".to_string()
            })
        );
    }

    #[test]
    fn dlc_ranks_are_not_built_without_dlc() {
        let catalog = catalog(Options {
            dlc: false,
            ..Options::default()
        });
        assert!(catalog.resolve("license:Paladin:Legend").is_ok());
        assert!(matches!(
            catalog.resolve("license:Paladin:Creator"),
            Err(RuleError::UnknownRuleKey { .. })
        ));
        assert!(catalog.resolve("chapter:7").is_ok());
        assert!(catalog.resolve("chapter:8").is_err());
    }

    #[test]
    fn progressive_rank_includes_chapter_gate() {
        let catalog = catalog(Options::default());
        let rule = catalog.resolve("license:Miner:Expert").unwrap();
        assert_eq!(
            rule.to_string(),
            "|Chapter Complete:3| and |Progressive Miner License:4|"
        );
        let ungated = catalog.resolve("license:Miner:Apprentice").unwrap();
        assert_eq!(ungated.to_string(), "|Progressive Miner License:2|");
    }

    #[test]
    fn single_and_disabled_schemes_shape_rank_rules() {
        let single = catalog(Options {
            progressive_licenses: LicenseScheme::Single,
            ..Options::default()
        });
        assert_eq!(
            single.resolve("license:Tailor:Hero").unwrap().to_string(),
            "|Tailor License|"
        );
        let disabled = catalog(Options {
            progressive_licenses: LicenseScheme::Disabled,
            ..Options::default()
        });
        assert!(disabled.resolve("license:Tailor:Creator").unwrap().is_trivially_true());
    }

    #[test]
    fn item_restrictions_add_equipment() {
        let catalog = catalog(Options {
            progressive_licenses: LicenseScheme::Single,
            item_restrictions: true,
            ..Options::default()
        });
        let rule = catalog.resolve("license:Paladin:Novice").unwrap();
        let licensed = ItemCounts::new(PlayerId(1)).with("Paladin License", 1);
        assert!(!rule.evaluate(&licensed));
        let equipped = licensed.with("Sword", 1).with("Shield", 1);
        assert!(rule.evaluate(&equipped));
    }

    #[test]
    fn role_quantifiers_cover_members() {
        let catalog = catalog(Options {
            progressive_licenses: LicenseScheme::Single,
            ..Options::default()
        });
        let any = catalog.resolve("any:gathering:Adept").unwrap();
        let all = catalog.resolve("all:gathering:Adept").unwrap();
        let state = ItemCounts::new(PlayerId(1)).with("Angler License", 1);
        assert!(any.evaluate(&state));
        assert!(!all.evaluate(&state));
        let state = state.with("Miner License", 1).with("Woodcutter License", 1);
        assert!(all.evaluate(&state));
    }

    #[test]
    fn requests_follow_other_requests_level() {
        let catalog = catalog(Options {
            other_requests: OtherRequests::UpToSecond,
            ..Options::default()
        });
        assert!(catalog.resolve("request:Gramps:2").is_ok());
        assert!(matches!(
            catalog.resolve("request:Gramps:3"),
            Err(RuleError::UnknownRuleKey { .. })
        ));
    }

    #[test]
    fn requester_checkpoints_compile_declared_requirements() {
        let mut data = GameData::bundled().unwrap();
        data.requesters.push(
            serde_json::from_str(
                r#"{
                    "name": "Quarry Foreman",
                    "chapter": 2,
                    "requirements": [ { "checkpoint": 1, "target": "gathering", "rank": "Adept" } ]
                }"#,
            )
            .unwrap(),
        );
        let snapshot = Options {
            progressive_licenses: LicenseScheme::Fast,
            ..Options::default()
        }
        .into_snapshot(1)
        .unwrap();
        let catalog = Catalog::build(&snapshot, &data).unwrap();
        let rule = catalog.resolve("request:Quarry Foreman:1").unwrap();
        let state = ItemCounts::new(PlayerId(1))
            .with("Chapter Complete", 2)
            .with("Fast Progressive Angler License", 1);
        assert!(!rule.evaluate(&state));
        let state = state.with("Fast Progressive Angler License", 2);
        assert!(rule.evaluate(&state));
        assert_eq!(
            catalog.resolve("request:Quarry Foreman:2").unwrap().to_string(),
            "|Chapter Complete:2|"
        );
    }

    #[test]
    fn dlc_rank_requests_fail_at_build_without_dlc() {
        let mut data = GameData::bundled().unwrap();
        data.requesters.push(
            serde_json::from_str(
                r#"{
                    "name": "Star Gazer",
                    "requirements": [ { "checkpoint": 1, "target": "cook", "rank": "Creator" } ]
                }"#,
            )
            .unwrap(),
        );
        let snapshot = Options {
            dlc: false,
            ..Options::default()
        }
        .into_snapshot(1)
        .unwrap();
        let err = Catalog::build(&snapshot, &data).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::TierUnavailable {
                rank: Rank::Creator,
                ..
            }
        ));
        assert!(err.to_string().contains("request:Star Gazer:1"));
    }

    #[test]
    fn dlc_requesters_are_skipped_without_dlc() {
        let mut data = GameData::bundled().unwrap();
        data.requesters[0].dlc = true;
        let name = data.requesters[0].name.clone();
        let snapshot = Options {
            dlc: false,
            ..Options::default()
        }
        .into_snapshot(1)
        .unwrap();
        let catalog = Catalog::build(&snapshot, &data).unwrap();
        assert!(catalog.resolve(&format!("request:{name}:1")).is_err());
    }

    #[test]
    fn shopping_tiers_follow_bliss_bonuses() {
        let off = catalog(Options::default());
        assert!(off.resolve("shopping:2").unwrap().is_trivially_true());
        let on = catalog(Options {
            bliss_bonuses: true,
            ..Options::default()
        });
        assert_eq!(on.resolve("shopping:2").unwrap().to_string(), "|Better Shopping:2|");
    }

    #[test]
    fn location_categories_follow_snapshot() {
        let catalog = catalog(Options {
            goal: Goal::LifeMastery,
            other_requests: OtherRequests::OnlyFirst,
            progressive_licenses: LicenseScheme::Fast,
            ..Options::default()
        });
        assert_eq!(catalog.is_location_category_enabled("Wish Hunt"), Some(false));
        assert_eq!(catalog.is_location_category_enabled("Other Requests 1"), Some(true));
        assert_eq!(catalog.is_location_category_enabled("Other Requests 2"), Some(false));
        assert_eq!(catalog.is_location_category_enabled("Shops"), None);
    }

    #[test]
    fn catalog_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
        assert_send_sync::<Predicate>();
    }

    #[test]
    fn keys_iterate_in_stable_order() {
        let render = |catalog: Catalog| -> Vec<String> {
            catalog.keys().map(ToString::to_string).collect()
        };
        let first = render(catalog(Options::default()));
        let second = render(catalog(Options::default()));
        assert_eq!(first, second);
        assert!(first.contains(&"goal".to_string()));
    }
}
