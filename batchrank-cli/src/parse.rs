/// Parsing of a typed group order.
///
/// Accepts positions from the numbered listing ("3,1,2") or item names
/// ("Imagine, Hey Jude"), mixed freely. Names match case-insensitively and
/// win over positions, so an item called "1999" is picked by name. Names
/// containing a comma can only be picked by position.
/// Permutation checks are left to the session, which rejects short or
/// repeated orders with a precise reason.
use batchrank_core::{Group, ItemId};

/// Parse one line of user input into an order of item IDs.
///
/// Blank input keeps the presented order. Returns an error message for
/// tokens that name nothing in the group.
pub fn parse_order(line: &str, group: &Group, names: &[String]) -> Result<Vec<ItemId>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(group.items.clone());
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| resolve_token(tok, group, names))
        .collect()
}

fn resolve_token(tok: &str, group: &Group, names: &[String]) -> Result<ItemId, String> {
    if let Some(id) = group
        .items
        .iter()
        .copied()
        .find(|&id| names[id as usize].eq_ignore_ascii_case(tok))
    {
        return Ok(id);
    }

    match tok.parse::<usize>() {
        Ok(pos) => match pos.checked_sub(1).and_then(|i| group.items.get(i)) {
            Some(&id) => Ok(id),
            None => Err(format!("\"{tok}\" is not between 1 and {}", group.len())),
        },
        Err(_) => Err(format!("\"{tok}\" is not in this group")),
    }
}
