/// Prompt text for one group.
use batchrank_core::Group;

pub const INPUT_HINT: &str =
    "Order (comma-separated numbers or names, best first; blank keeps this order): ";

/// Build the numbered listing shown for a group.
///
/// `names[id]` is the display name for item `id`.
pub fn build_prompt(group: &Group, names: &[String]) -> String {
    let mut out = format!(
        "\nRound {}, group {}: rank these from best to worst\n",
        group.round + 1,
        group.index + 1
    );
    for (pos, &id) in group.items.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", pos + 1, names[id as usize]));
    }
    out
}
