//! Lives (license categories) and the role groups used by quantified rules.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{FAST_PROGRESSIVE_PREFIX, LICENSE_SUFFIX, PROGRESSIVE_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Life {
    Paladin,
    Mercenary,
    Hunter,
    Magician,
    Miner,
    Woodcutter,
    Angler,
    Cook,
    Blacksmith,
    Carpenter,
    Tailor,
    Alchemist,
}

impl Life {
    /// Every life in evaluation order.
    pub const ALL: &'static [Self] = &[
        Self::Paladin,
        Self::Mercenary,
        Self::Hunter,
        Self::Magician,
        Self::Miner,
        Self::Woodcutter,
        Self::Angler,
        Self::Cook,
        Self::Blacksmith,
        Self::Carpenter,
        Self::Tailor,
        Self::Alchemist,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paladin => "Paladin",
            Self::Mercenary => "Mercenary",
            Self::Hunter => "Hunter",
            Self::Magician => "Magician",
            Self::Miner => "Miner",
            Self::Woodcutter => "Woodcutter",
            Self::Angler => "Angler",
            Self::Cook => "Cook",
            Self::Blacksmith => "Blacksmith",
            Self::Carpenter => "Carpenter",
            Self::Tailor => "Tailor",
            Self::Alchemist => "Alchemist",
        }
    }

    /// Name of the single (non-stacking) license, e.g. `Paladin License`.
    #[must_use]
    pub fn license_item(self) -> String {
        format!("{} {LICENSE_SUFFIX}", self.as_str())
    }

    /// Name of the stacking license used by the full progressive scheme.
    #[must_use]
    pub fn progressive_license_item(self) -> String {
        format!("{PROGRESSIVE_PREFIX} {} {LICENSE_SUFFIX}", self.as_str())
    }

    /// Name of the stacking license used by the fast progressive scheme.
    #[must_use]
    pub fn fast_progressive_license_item(self) -> String {
        format!("{FAST_PROGRESSIVE_PREFIX} {} {LICENSE_SUFFIX}", self.as_str())
    }
}

impl fmt::Display for Life {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Life {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|life| life.as_str().eq_ignore_ascii_case(wanted))
            .ok_or(())
    }
}

/// Role subgroups of lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeRole {
    CombatEasy,
    Combat,
    Gathering,
    Crafting,
    Any,
}

impl LifeRole {
    pub const ALL: &'static [Self] = &[
        Self::CombatEasy,
        Self::Combat,
        Self::Gathering,
        Self::Crafting,
        Self::Any,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CombatEasy => "combat_easy",
            Self::Combat => "combat",
            Self::Gathering => "gathering",
            Self::Crafting => "crafting",
            Self::Any => "any",
        }
    }

    #[must_use]
    pub const fn members(self) -> &'static [Life] {
        match self {
            Self::CombatEasy => &[Life::Paladin, Life::Mercenary],
            Self::Combat => &[Life::Paladin, Life::Mercenary, Life::Hunter, Life::Magician],
            Self::Gathering => &[Life::Miner, Life::Woodcutter, Life::Angler],
            Self::Crafting => &[
                Life::Cook,
                Life::Blacksmith,
                Life::Carpenter,
                Life::Tailor,
                Life::Alchemist,
            ],
            Self::Any => Life::ALL,
        }
    }
}

impl fmt::Display for LifeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifeRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "combat_easy" => Ok(Self::CombatEasy),
            "combat" => Ok(Self::Combat),
            "gathering" => Ok(Self::Gathering),
            "crafting" => Ok(Self::Crafting),
            "any" => Ok(Self::Any),
            _ => Err(()),
        }
    }
}
