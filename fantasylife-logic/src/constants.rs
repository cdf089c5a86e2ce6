//! Item names and story limits shared across the access logic.
//!
//! The host world keys every requirement by item name, so the exact spelling of
//! these strings is part of the logic contract.

// Item names ---------------------------------------------------------------
pub const ITEM_LOST_WISH: &str = "Lost Wish";
pub const ITEM_CHAPTER_COMPLETE: &str = "Chapter Complete";
pub const ITEM_INTERMISSION_COMPLETE: &str = "Intermission Complete";
pub const ITEM_BETTER_SHOPPING: &str = "Better Shopping";
pub const ITEM_BIGGER_BAG: &str = "Bigger Bag";
pub const ITEM_BIGGER_STORAGE: &str = "Bigger Storage";
pub(crate) const LICENSE_SUFFIX: &str = "License";
pub(crate) const PROGRESSIVE_PREFIX: &str = "Progressive";
pub(crate) const FAST_PROGRESSIVE_PREFIX: &str = "Fast Progressive";

// Story milestones ---------------------------------------------------------
/// Chapter count that marks the end of the main story (Prologue through Final).
pub const FINAL_CHAPTER: u32 = 7;
pub(crate) const MAX_CHAPTERS_BASE: u32 = 7;
pub(crate) const MAX_CHAPTERS_DLC: u32 = 9;
pub(crate) const MAX_INTERMISSIONS_BASE: u32 = 4;
pub(crate) const MAX_INTERMISSIONS_DLC: u32 = 6;

// License pool sizes -------------------------------------------------------
pub(crate) const FAST_COPIES_BASE: u32 = 4;
pub(crate) const FAST_COPIES_DLC: u32 = 5;
pub(crate) const FULL_COPIES_BASE: u32 = 7;
pub(crate) const FULL_COPIES_DLC: u32 = 9;

// Other requests -----------------------------------------------------------
pub(crate) const MAX_REQUEST_CHECKPOINTS: u8 = 4;
pub(crate) const WISH_CAPACITY_FIRST_BASE: u32 = 84;
pub(crate) const WISH_CAPACITY_FIRST_DLC: u32 = 100;
pub(crate) const WISH_CAPACITY_SECOND_BASE: u32 = 168;
pub(crate) const WISH_CAPACITY_SECOND_DLC: u32 = 200;

// Option ranges ------------------------------------------------------------
pub(crate) const WISH_HUNT_MIN: u32 = 1;
pub(crate) const WISH_HUNT_MAX: u32 = 200;
pub(crate) const LIFE_MASTERY_COUNT_MIN: u32 = 1;
pub(crate) const LIFE_MASTERY_COUNT_MAX: u32 = 12;
pub(crate) const MAX_SHOPPING_TIERS: u32 = 3;

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_CATALOG_BUILT: &str = "catalog.built";
pub(crate) const LOG_SNAPSHOT_STARTING_LIFE: &str = "snapshot.starting-life";
pub(crate) const LOG_SNAPSHOT_STARTING_BLISS: &str = "snapshot.starting-bliss";
