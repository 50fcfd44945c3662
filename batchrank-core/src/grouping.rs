/// Grouping strategies for small-batch ranking rounds.
///
/// Public functions accept `item_ids: &[i64]` and return groups of IDs.
/// Internal functions use `usize` indices for efficient array indexing.
use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::MIN_GROUP_SIZE;
use crate::error::{RankError, Result};
use crate::types::{IndexedGroup, ItemId};

/// How a session picks the ordering criterion for each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupingStrategy {
    /// Score order for the first round, uncertainty order afterwards.
    #[default]
    Adaptive,
    /// Score order every round.
    ScoreOnly,
}

/// The sort key used to line items up before chunking them into groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupingCriterion {
    /// Current score, descending.
    ByScore,
    /// Uncertainty descending, then score ascending.
    ByUncertainty,
}

/// Determine the criterion for a round.
///
/// Before any round has completed there is no uncertainty signal, so the
/// adaptive strategy falls back to score order.
pub fn get_effective_criterion(
    strategy: GroupingStrategy,
    rounds_completed: usize,
) -> GroupingCriterion {
    match strategy {
        GroupingStrategy::ScoreOnly => GroupingCriterion::ByScore,
        GroupingStrategy::Adaptive if rounds_completed == 0 => GroupingCriterion::ByScore,
        GroupingStrategy::Adaptive => GroupingCriterion::ByUncertainty,
    }
}

/// Sort item indices by the criterion. The sort is stable, so items with
/// equal keys stay in registration order.
pub fn priority_order(
    criterion: GroupingCriterion,
    scores: &[f64],
    uncertainties: &[f64],
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    match criterion {
        GroupingCriterion::ByScore => {
            order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        }
        GroupingCriterion::ByUncertainty => {
            order.sort_by(|&a, &b| {
                uncertainties[b]
                    .total_cmp(&uncertainties[a])
                    .then(scores[a].total_cmp(&scores[b]))
            });
        }
    }
    order
}

// ---------------------------------------------------------------------------
// Public grouping function (works with i64 IDs)
// ---------------------------------------------------------------------------

/// Partition items into groups of `group_size` for one round.
///
/// `scores[i]` and `uncertainties[i]` belong to `item_ids[i]`. The last group
/// holds the remainder and may be smaller.
pub fn generate_groups<R: Rng + ?Sized>(
    item_ids: &[ItemId],
    scores: &[f64],
    uncertainties: &[f64],
    group_size: usize,
    criterion: GroupingCriterion,
    rng: &mut R,
) -> Result<Vec<Vec<ItemId>>> {
    let groups =
        generate_groups_indexed(scores, uncertainties, group_size, criterion, rng)?;
    Ok(groups
        .into_iter()
        .map(|g| g.into_iter().map(|i| item_ids[i]).collect())
        .collect())
}

// ---------------------------------------------------------------------------
// Internal indexed grouping (works with usize indices)
// ---------------------------------------------------------------------------

pub(crate) fn generate_groups_indexed<R: Rng + ?Sized>(
    scores: &[f64],
    uncertainties: &[f64],
    group_size: usize,
    criterion: GroupingCriterion,
    rng: &mut R,
) -> Result<Vec<IndexedGroup>> {
    if group_size < MIN_GROUP_SIZE {
        return Err(RankError::InvalidConfiguration(format!(
            "group size must be at least {MIN_GROUP_SIZE}, got {group_size}"
        )));
    }
    if scores.is_empty() {
        return Err(RankError::InvalidConfiguration(
            "cannot group an empty item set".to_string(),
        ));
    }
    debug_assert_eq!(scores.len(), uncertainties.len());

    let order = priority_order(criterion, scores, uncertainties);

    // Shuffle within each window only; the window boundaries carry the
    // near-peer structure from the sort.
    let groups = order
        .chunks(group_size)
        .map(|window| {
            let mut group = window.to_vec();
            group.shuffle(rng);
            group
        })
        .collect();

    Ok(groups)
}
