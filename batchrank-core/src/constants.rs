/// Added to every uncertainty before inverting it for the confidence average,
/// so a perfectly flat score history does not divide by zero.
pub const CONFIDENCE_EPSILON: f64 = 1e-6;

/// Uncertainty reported for items with fewer than two score snapshots.
pub const UNBOUNDED_UNCERTAINTY: f64 = f64::INFINITY;

/// Smallest group that can express a preference.
pub const MIN_GROUP_SIZE: usize = 2;

/// Defaults match the interactive ranking app: groups of five, at most
/// twenty rounds, stop once average confidence reaches 0.9.
pub const DEFAULT_GROUP_SIZE: usize = 5;
pub const DEFAULT_MAX_ROUNDS: usize = 20;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.9;
