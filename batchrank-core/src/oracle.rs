/// The order oracle: whoever turns a group into a best-to-worst order.
///
/// The engine never cares how the order was obtained (a person dragging rows
/// around, a typed list, a model, a test script). It only checks that the
/// answer is a permutation of what it asked for.
use std::collections::HashSet;

use crate::error::{OracleError, OrderViolation};
use crate::types::{Group, ItemId};

pub trait OrderOracle {
    /// Return the items of `group` ordered best to worst, each exactly once.
    fn request_order(&mut self, group: &Group) -> Result<Vec<ItemId>, OracleError>;
}

impl<F> OrderOracle for F
where
    F: FnMut(&Group) -> Result<Vec<ItemId>, OracleError>,
{
    fn request_order(&mut self, group: &Group) -> Result<Vec<ItemId>, OracleError> {
        self(group)
    }
}

/// Check that `order` is a permutation of `group`.
pub fn validate_order(group: &[ItemId], order: &[ItemId]) -> Result<(), OrderViolation> {
    if order.len() != group.len() {
        return Err(OrderViolation::LengthMismatch {
            expected: group.len(),
            actual: order.len(),
        });
    }

    let members: HashSet<ItemId> = group.iter().copied().collect();
    let mut seen: HashSet<ItemId> = HashSet::with_capacity(order.len());
    for &item in order {
        if !members.contains(&item) {
            return Err(OrderViolation::UnexpectedItem(item));
        }
        if !seen.insert(item) {
            return Err(OrderViolation::DuplicateItem(item));
        }
    }
    Ok(())
}
