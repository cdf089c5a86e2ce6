//! License ranks and the schemes that turn a rank into an item count.
//!
//! Every rank carries a coarse (fast progressive) and a fine (full progressive)
//! threshold plus a minimum chapter gate. The selected [`LicenseScheme`] decides
//! which column applies, and whether a rank needs items at all.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{FAST_COPIES_BASE, FAST_COPIES_DLC, FULL_COPIES_BASE, FULL_COPIES_DLC};
use crate::life::Life;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Novice,
    Fledgling,
    Apprentice,
    Adept,
    Expert,
    Master,
    Hero,
    Legend,
    DemiCreator,
    Creator,
}

/// Per-rank thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankEntry {
    pub coarse: u32,
    pub fine: u32,
    pub min_chapter: u32,
    pub dlc_only: bool,
}

const fn entry(coarse: u32, fine: u32, min_chapter: u32, dlc_only: bool) -> RankEntry {
    RankEntry {
        coarse,
        fine,
        min_chapter,
        dlc_only,
    }
}

const RANK_TABLE: [RankEntry; 10] = [
    entry(1, 1, 0, false),
    entry(1, 1, 0, false),
    entry(1, 2, 0, false),
    entry(2, 3, 2, false),
    entry(2, 4, 3, false),
    entry(3, 5, 4, false),
    entry(4, 6, 6, false),
    entry(4, 7, 7, false),
    entry(5, 8, 7, true),
    entry(5, 9, 8, true),
];

impl Rank {
    pub const ALL: &'static [Self] = &[
        Self::Novice,
        Self::Fledgling,
        Self::Apprentice,
        Self::Adept,
        Self::Expert,
        Self::Master,
        Self::Hero,
        Self::Legend,
        Self::DemiCreator,
        Self::Creator,
    ];

    #[must_use]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Novice => "Novice",
            Self::Fledgling => "Fledgling",
            Self::Apprentice => "Apprentice",
            Self::Adept => "Adept",
            Self::Expert => "Expert",
            Self::Master => "Master",
            Self::Hero => "Hero",
            Self::Legend => "Legend",
            Self::DemiCreator => "Demi-Creator",
            Self::Creator => "Creator",
        }
    }

    #[must_use]
    pub const fn entry(self) -> RankEntry {
        RANK_TABLE[self.ordinal()]
    }

    #[must_use]
    pub const fn requires_dlc(self) -> bool {
        self.entry().dlc_only
    }

    /// Parse a rank name, ignoring case, spacing, hyphens and underscores.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::UnknownTier`] when the name matches no rank.
    pub fn parse_name(name: &str) -> Result<Self, TierError> {
        let folded: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_' | '\t'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let rank = match folded.as_str() {
            "novice" => Self::Novice,
            "fledgling" | "fledgeling" => Self::Fledgling,
            "apprentice" => Self::Apprentice,
            "adept" => Self::Adept,
            "expert" => Self::Expert,
            "master" => Self::Master,
            "hero" => Self::Hero,
            "legend" => Self::Legend,
            "demicreator" => Self::DemiCreator,
            "creator" => Self::Creator,
            _ => {
                return Err(TierError::UnknownTier {
                    name: name.to_string(),
                });
            }
        };
        Ok(rank)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serde adapter accepting any spelling [`Rank::parse_name`] understands.
pub(crate) fn deserialize_rank_name<'de, D>(deserializer: D) -> Result<Rank, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Rank::parse_name(&name).map_err(serde::de::Error::custom)
}

impl FromStr for Rank {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_name(s)
    }
}

/// How licenses appear in the item pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LicenseScheme {
    /// No licenses; every life is open from the start.
    Disabled,
    /// One license per life unlocks every rank.
    Single,
    /// Coarse progressive licenses (stair-stepped ranks).
    Fast,
    /// Fine progressive licenses (one license per rank step).
    #[default]
    Full,
}

impl LicenseScheme {
    pub const ALL: &'static [Self] = &[Self::Disabled, Self::Single, Self::Fast, Self::Full];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Single => "single",
            Self::Fast => "fast",
            Self::Full => "full",
        }
    }

    #[must_use]
    pub const fn is_progressive(self) -> bool {
        matches!(self, Self::Fast | Self::Full)
    }
}

impl fmt::Display for LicenseScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised when resolving a rank.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TierError {
    #[error("unknown rank '{name}'")]
    UnknownTier { name: String },
    #[error("rank {rank} requires the Origin Island DLC")]
    TierUnavailable { rank: Rank },
}

/// Outcome of resolving a rank under a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierRequirement {
    /// Licenses are not in play; the rank is always reachable.
    Trivial,
    /// `count` licenses, reachable only once `min_chapter` chapters are complete.
    Licenses { count: u32, min_chapter: u32 },
}

impl TierRequirement {
    #[must_use]
    pub const fn count(self) -> u32 {
        match self {
            Self::Trivial => 0,
            Self::Licenses { count, .. } => count,
        }
    }

    #[must_use]
    pub const fn min_chapter(self) -> u32 {
        match self {
            Self::Trivial => 0,
            Self::Licenses { min_chapter, .. } => min_chapter,
        }
    }
}

/// Maps ranks to license requirements for one scheme and DLC setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierResolver {
    scheme: LicenseScheme,
    dlc: bool,
}

impl TierResolver {
    #[must_use]
    pub const fn new(scheme: LicenseScheme, dlc: bool) -> Self {
        Self { scheme, dlc }
    }

    #[must_use]
    pub const fn scheme(&self) -> LicenseScheme {
        self.scheme
    }

    #[must_use]
    pub const fn dlc(&self) -> bool {
        self.dlc
    }

    /// Whether `rank` exists under this DLC setting.
    #[must_use]
    pub const fn is_available(&self, rank: Rank) -> bool {
        self.dlc || !rank.requires_dlc()
    }

    /// Resolve `rank` into a license requirement.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::TierUnavailable`] when the rank needs the DLC and the
    /// DLC is excluded, whatever the scheme.
    pub fn resolve(&self, rank: Rank) -> Result<TierRequirement, TierError> {
        if !self.is_available(rank) {
            return Err(TierError::TierUnavailable { rank });
        }
        let entry = rank.entry();
        let requirement = match self.scheme {
            LicenseScheme::Disabled => TierRequirement::Trivial,
            LicenseScheme::Single => TierRequirement::Licenses {
                count: 1,
                min_chapter: 0,
            },
            LicenseScheme::Fast => TierRequirement::Licenses {
                count: entry.coarse,
                min_chapter: entry.min_chapter,
            },
            LicenseScheme::Full => TierRequirement::Licenses {
                count: entry.fine,
                min_chapter: entry.min_chapter,
            },
        };
        Ok(requirement)
    }

    /// Parse and resolve a rank given by name.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::UnknownTier`] for unrecognized names, otherwise the
    /// errors of [`TierResolver::resolve`].
    pub fn resolve_name(&self, name: &str) -> Result<TierRequirement, TierError> {
        self.resolve(Rank::parse_name(name)?)
    }

    /// Item counted toward `life`'s rank, or `None` when licenses are disabled.
    #[must_use]
    pub fn license_item(&self, life: Life) -> Option<String> {
        match self.scheme {
            LicenseScheme::Disabled => None,
            LicenseScheme::Single => Some(life.license_item()),
            LicenseScheme::Fast => Some(life.fast_progressive_license_item()),
            LicenseScheme::Full => Some(life.progressive_license_item()),
        }
    }

    /// Licenses the item pool carries for each life.
    #[must_use]
    pub const fn copies_per_life(&self) -> u32 {
        match (self.scheme, self.dlc) {
            (LicenseScheme::Disabled, _) => 0,
            (LicenseScheme::Single, _) => 1,
            (LicenseScheme::Fast, false) => FAST_COPIES_BASE,
            (LicenseScheme::Fast, true) => FAST_COPIES_DLC,
            (LicenseScheme::Full, false) => FULL_COPIES_BASE,
            (LicenseScheme::Full, true) => FULL_COPIES_DLC,
        }
    }

    /// Ranks reachable under this DLC setting, lowest first.
    pub fn available_ranks(&self) -> impl Iterator<Item = Rank> + '_ {
        Rank::ALL.iter().copied().filter(|&rank| self.is_available(rank))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_table_columns_never_decrease() {
        for pair in RANK_TABLE.windows(2) {
            assert!(pair[0].coarse <= pair[1].coarse);
            assert!(pair[0].fine <= pair[1].fine);
            assert!(pair[0].min_chapter <= pair[1].min_chapter);
        }
    }

    #[test]
    fn fine_counts_track_ordinals() {
        let resolver = TierResolver::new(LicenseScheme::Full, true);
        assert_eq!(resolver.resolve(Rank::Novice).unwrap().count(), 1);
        for &rank in &Rank::ALL[1..] {
            let count = resolver.resolve(rank).unwrap().count();
            assert_eq!(count as usize, rank.ordinal(), "{rank}");
        }
    }

    #[test]
    fn coarse_counts_follow_stairsteps() {
        let resolver = TierResolver::new(LicenseScheme::Fast, true);
        let counts: Vec<u32> = Rank::ALL
            .iter()
            .map(|&rank| resolver.resolve(rank).unwrap().count())
            .collect();
        assert_eq!(counts, vec![1, 1, 1, 2, 2, 3, 4, 4, 5, 5]);
    }

    #[test]
    fn expert_without_dlc_needs_two_fast_licenses() {
        let resolver = TierResolver::new(LicenseScheme::Fast, false);
        assert_eq!(
            resolver.resolve_name("Expert"),
            Ok(TierRequirement::Licenses {
                count: 2,
                min_chapter: 3
            })
        );
        assert_eq!(
            resolver.resolve(Rank::Creator),
            Err(TierError::TierUnavailable {
                rank: Rank::Creator
            })
        );
    }

    #[test]
    fn single_scheme_always_needs_one_and_ignores_gates() {
        let resolver = TierResolver::new(LicenseScheme::Single, true);
        for &rank in Rank::ALL {
            assert_eq!(
                resolver.resolve(rank),
                Ok(TierRequirement::Licenses {
                    count: 1,
                    min_chapter: 0
                })
            );
        }
    }

    #[test]
    fn disabled_scheme_is_trivial_but_keeps_dlc_gate() {
        let resolver = TierResolver::new(LicenseScheme::Disabled, false);
        assert_eq!(resolver.resolve(Rank::Legend), Ok(TierRequirement::Trivial));
        for rank in [Rank::DemiCreator, Rank::Creator] {
            assert_eq!(
                resolver.resolve(rank),
                Err(TierError::TierUnavailable { rank })
            );
        }
        let with_dlc = TierResolver::new(LicenseScheme::Disabled, true);
        assert_eq!(with_dlc.resolve(Rank::Creator), Ok(TierRequirement::Trivial));
        assert_eq!(resolver.license_item(Life::Hunter), None);
        assert_eq!(resolver.copies_per_life(), 0);
    }

    #[test]
    fn low_ranks_are_ungated() {
        let resolver = TierResolver::new(LicenseScheme::Full, true);
        for &rank in &Rank::ALL[..3] {
            assert_eq!(resolver.resolve(rank).unwrap().min_chapter(), 0);
        }
        for &rank in &Rank::ALL[3..] {
            assert!(resolver.resolve(rank).unwrap().min_chapter() > 0);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        let resolver = TierResolver::new(LicenseScheme::Full, true);
        assert_eq!(
            resolver.resolve_name("Grandmaster"),
            Err(TierError::UnknownTier {
                name: "Grandmaster".to_string()
            })
        );
        assert_eq!(Rank::parse_name("demi_creator"), Ok(Rank::DemiCreator));
        assert_eq!(Rank::parse_name(" Fledgeling "), Ok(Rank::Fledgling));
    }

    #[test]
    fn resolved_counts_fit_in_the_pool() {
        for &scheme in LicenseScheme::ALL {
            for dlc in [false, true] {
                let resolver = TierResolver::new(scheme, dlc);
                for rank in resolver.available_ranks() {
                    let count = resolver.resolve(rank).unwrap().count();
                    assert!(count <= resolver.copies_per_life(), "{scheme} {rank} dlc={dlc}");
                }
            }
        }
    }
}
