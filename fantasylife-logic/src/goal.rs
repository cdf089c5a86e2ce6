//! Win conditions.
use crate::catalog::{RuleBuilder, milestone_gate};
use crate::config::{ConfigSnapshot, ConfigurationError};
use crate::constants::{FINAL_CHAPTER, ITEM_LOST_WISH};
use crate::data::GameData;
use crate::life::Life;
use crate::predicate::{Predicate, Quantifier};
use crate::state::Milestone;

fn story_gate(snapshot: &ConfigSnapshot) -> Predicate {
    if snapshot.main_story_required() {
        milestone_gate(Milestone::Chapter, FINAL_CHAPTER)
    } else {
        Predicate::Always
    }
}

/// Enough Lost Wishes, plus the final chapter when the story is required.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidGoalConfiguration`] when more wishes are
/// required than exist in the pool.
pub fn wish_hunt_goal(snapshot: &ConfigSnapshot) -> Result<Predicate, ConfigurationError> {
    let params = snapshot.wish_hunt();
    if params.required > params.total {
        return Err(ConfigurationError::InvalidGoalConfiguration {
            reason: format!(
                "wish hunt requires {} Lost Wishes but only {} are placed",
                params.required, params.total
            ),
        });
    }
    Ok(Predicate::all_of([
        Predicate::threshold(ITEM_LOST_WISH, params.required),
        story_gate(snapshot),
    ])
    .simplify())
}

/// At least `count` lives at the target rank, checked in life order and
/// stopping at the `count`-th success.
///
/// # Errors
///
/// Returns [`ConfigurationError::TierUnavailable`] when the target rank needs the
/// DLC but it is excluded, and
/// [`ConfigurationError::InvalidGoalConfiguration`] when `count` is 0 or exceeds
/// the number of lives.
pub fn life_mastery_goal(
    snapshot: &ConfigSnapshot,
    data: &GameData,
) -> Result<Predicate, ConfigurationError> {
    let params = snapshot.life_mastery();
    let count = usize::try_from(params.count).unwrap_or(usize::MAX);
    if count == 0 || count > Life::ALL.len() {
        return Err(ConfigurationError::InvalidGoalConfiguration {
            reason: format!(
                "life mastery needs between 1 and {} lives, got {count}",
                Life::ALL.len()
            ),
        });
    }

    let builder = RuleBuilder::new(snapshot, data);
    let members = Life::ALL
        .iter()
        .map(|&life| builder.rank(life, params.rank))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ConfigurationError::from_tier(err, "life_mastery_rank"))?;

    let mastery = Predicate::Quantified {
        mode: Quantifier::at_least(count),
        members,
    };
    Ok(Predicate::all_of([mastery, story_gate(snapshot)]).simplify())
}
