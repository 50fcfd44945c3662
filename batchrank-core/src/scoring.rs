/// Borda scoring for one resolved group.
///
/// Points use the session's nominal group size, not the size of the group
/// being scored, so a remainder group's top item earns as much as a full
/// group's top item.
use crate::types::IndexedGroup;

/// Points for finishing at `position` (0 = best) under a nominal group size.
pub fn borda_points(group_size: usize, position: usize) -> f64 {
    group_size.saturating_sub(position) as f64
}

/// Total points handed out for one group of `group_len` items.
///
/// `group_size * group_len - group_len * (group_len - 1) / 2`; for a full
/// group that is `group_size * (group_size + 1) / 2`.
pub fn group_point_total(group_size: usize, group_len: usize) -> f64 {
    (0..group_len).map(|pos| borda_points(group_size, pos)).sum()
}

/// Total points handed out in one round that partitions `num_items` items.
///
/// A `group_size` of zero hands out nothing.
pub fn round_point_total(group_size: usize, num_items: usize) -> f64 {
    if group_size == 0 {
        return 0.0;
    }
    let full_groups = num_items / group_size;
    let remainder = num_items % group_size;
    full_groups as f64 * group_point_total(group_size, group_size)
        + group_point_total(group_size, remainder)
}

/// Apply one group's order (best first) to the score and history tables.
///
/// New scores are computed before anything is written, then each item's new
/// cumulative score is appended to its history.
pub(crate) fn apply_group_order(
    scores: &mut [f64],
    history: &mut [Vec<f64>],
    order: &IndexedGroup,
    group_size: usize,
) {
    let updates: Vec<(usize, f64)> = order
        .iter()
        .enumerate()
        .map(|(pos, &idx)| (idx, scores[idx] + borda_points(group_size, pos)))
        .collect();

    for (idx, new_score) in updates {
        scores[idx] = new_score;
        history[idx].push(new_score);
    }
}
