//! Read-only view of a player's collected items.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::constants::{ITEM_CHAPTER_COMPLETE, ITEM_INTERMISSION_COMPLETE};

/// Opaque player identifier threaded through by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

/// Story completion counters, held as ordinary stackable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Chapter,
    Intermission,
}

impl Milestone {
    pub const ALL: &'static [Self] = &[Self::Chapter, Self::Intermission];

    #[must_use]
    pub const fn item_name(self) -> &'static str {
        match self {
            Self::Chapter => ITEM_CHAPTER_COMPLETE,
            Self::Intermission => ITEM_INTERMISSION_COMPLETE,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Intermission => "intermission",
        }
    }
}

/// Canonical lookup form of an item name: trimmed, inner whitespace collapsed,
/// ASCII-lowercased.
#[must_use]
pub fn normalize_item_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for word in name.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().map(|c| c.to_ascii_lowercase()));
    }
    out
}

/// Accessor contract the engine evaluates predicates against.
///
/// Implementations must be side-effect free. The engine never mutates a state
/// and may evaluate several rules against the same state from different threads.
pub trait CollectionState: Sync {
    /// Held quantity of `item`, 0 if absent.
    fn count(&self, item: &str) -> u32;

    fn has_at_least(&self, item: &str, n: u32) -> bool {
        self.count(item) >= n
    }

    fn has_all(&self, items: &[&str]) -> bool {
        items.iter().all(|item| self.count(item) > 0)
    }

    fn has_any(&self, items: &[&str]) -> bool {
        items.iter().any(|item| self.count(item) > 0)
    }
}

impl<T: CollectionState + ?Sized> CollectionState for &T {
    fn count(&self, item: &str) -> u32 {
        (**self).count(item)
    }
}

/// Per-player item count map keyed by normalized item names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemCounts {
    #[serde(default)]
    player: PlayerId,
    #[serde(default, deserialize_with = "deserialize_counts")]
    items: HashMap<String, u32>,
}

fn deserialize_counts<'de, D>(deserializer: D) -> Result<HashMap<String, u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = HashMap::<String, u32>::deserialize(deserializer)?;
    let mut items = HashMap::with_capacity(raw.len());
    for (name, count) in raw {
        let held = items.entry(normalize_item_name(&name)).or_insert(0u32);
        *held = held.saturating_add(count);
    }
    Ok(items)
}

impl ItemCounts {
    #[must_use]
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            items: HashMap::new(),
        }
    }

    /// Build from `(name, count)` pairs; repeated names accumulate.
    #[must_use]
    pub fn from_pairs<'a, I>(player: PlayerId, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut counts = Self::new(player);
        for (name, count) in pairs {
            counts.add(name, count);
        }
        counts
    }

    /// Load a state from a JSON document `{ "player": 1, "items": { "Lost Wish": 3 } }`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a count is negative.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with(mut self, name: &str, count: u32) -> Self {
        self.insert(name, count);
        self
    }

    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Overwrite the count held for `name`.
    pub fn insert(&mut self, name: &str, count: u32) {
        let key = normalize_item_name(name);
        if count == 0 {
            self.items.remove(&key);
        } else {
            self.items.insert(key, count);
        }
    }

    /// Collect `count` more copies of `name`.
    pub fn add(&mut self, name: &str, count: u32) {
        if count == 0 {
            return;
        }
        let entry = self.items.entry(normalize_item_name(name)).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    #[must_use]
    pub fn milestone(&self, milestone: Milestone) -> u32 {
        self.count(milestone.item_name())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when every count held here is at least the count held by `other`.
    #[must_use]
    pub fn is_superset_of(&self, other: &Self) -> bool {
        other
            .items
            .iter()
            .all(|(name, &count)| self.items.get(name).copied().unwrap_or(0) >= count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(name, &count)| (name.as_str(), count))
    }
}

impl CollectionState for ItemCounts {
    fn count(&self, item: &str) -> u32 {
        self.items
            .get(&normalize_item_name(item))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_folds_case_and_whitespace() {
        assert_eq!(
            normalize_item_name("  Progressive   Paladin\tLicense "),
            "progressive paladin license"
        );
        assert_eq!(normalize_item_name(""), "");
    }

    #[test]
    fn absent_items_count_as_zero() {
        let state = ItemCounts::new(PlayerId(1));
        assert_eq!(state.count("Lost Wish"), 0);
        assert!(state.has_at_least("Lost Wish", 0));
        assert!(!state.has_at_least("Lost Wish", 1));
    }

    #[test]
    fn lookups_ignore_spelling_noise() {
        let state = ItemCounts::new(PlayerId(1)).with("Lost Wish", 3);
        assert_eq!(state.count("lost  wish"), 3);
        assert_eq!(state.count(" LOST WISH "), 3);
    }

    #[test]
    fn add_accumulates_and_insert_overwrites() {
        let mut state = ItemCounts::from_pairs(
            PlayerId(2),
            [("Chapter Complete", 1), ("chapter complete", 2)],
        );
        assert_eq!(state.milestone(Milestone::Chapter), 3);
        state.insert("Chapter Complete", 1);
        assert_eq!(state.milestone(Milestone::Chapter), 1);
        state.insert("Chapter Complete", 0);
        assert!(state.is_empty());
    }

    #[test]
    fn has_all_and_has_any_follow_empty_conventions() {
        let state = ItemCounts::new(PlayerId(0)).with("Axe", 1);
        assert!(state.has_all(&[]));
        assert!(!state.has_any(&[]));
        assert!(state.has_all(&["Axe"]));
        assert!(!state.has_all(&["Axe", "Saw"]));
        assert!(state.has_any(&["Saw", "axe"]));
    }

    #[test]
    fn superset_compares_every_count() {
        let small = ItemCounts::new(PlayerId(0)).with("Lost Wish", 2);
        let large = small.clone().with("Lost Wish", 5).with("Axe", 1);
        assert!(large.is_superset_of(&small));
        assert!(!small.is_superset_of(&large));
        assert!(small.is_superset_of(&small));
    }

    #[test]
    fn json_state_normalizes_names() {
        let state = ItemCounts::from_json(
            r#"{ "player": 4, "items": { "Lost Wish": 2, "lost wish": 1, "Axe": 1 } }"#,
        )
        .unwrap();
        assert_eq!(state.player(), PlayerId(4));
        assert_eq!(state.count("Lost Wish"), 3);
        assert!(ItemCounts::from_json(r#"{ "items": { "Axe": -1 } }"#).is_err());
    }

    #[test]
    fn json_state_saturates_merged_spellings() {
        let state = ItemCounts::from_json(
            r#"{ "items": { "Lost Wish": 4294967295, "lost wish": 1, "LOST WISH": 7 } }"#,
        )
        .unwrap();
        assert_eq!(state.count("Lost Wish"), u32::MAX);
        assert!(state.has_at_least("lost wish", u32::MAX));
    }
}
