/// batchrank-core: Pure-computation small-batch ranking engine.
///
/// Small total orders → Borda points → cumulative scores, with a per-item
/// uncertainty and a confidence-based stopping rule. No IO and no UI.
/// Bring your own judge.
///
/// Items are identified by caller-provided `i64` IDs. The crate handles the
/// internal mapping to array indices.
///
/// # Quick start
///
/// ```rust
/// use batchrank_core::{RankingSession, SessionConfig};
///
/// let items = vec![1, 2, 3, 4];
/// let mut session = RankingSession::start(&items, SessionConfig {
///     group_size: 4,
///     max_rounds: 3,
///     seed: Some(7),
///     ..SessionConfig::default()
/// })?;
///
/// while let Some(group) = session.next_group().cloned() {
///     // Ask your judge. Here lower IDs always win.
///     let mut order = group.items.clone();
///     order.sort();
///     session.submit_order(&group, &order)?;
/// }
///
/// let result = session.result()?;
/// assert_eq!(result.final_ranking(), vec![1, 2, 3, 4]);
/// for r in &result.rankings {
///     println!("Item {}: {:.1} (uncertainty {:.2})", r.item, r.score, r.uncertainty);
/// }
/// # Ok::<(), batchrank_core::RankError>(())
/// ```

pub mod constants;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod oracle;
pub mod scoring;
pub mod stopping;
pub mod types;
pub mod uncertainty;

// Re-export primary public API at crate root.
pub use engine::{RankingSession, SessionConfig, SubmitOutcome};
pub use error::{OracleError, OrderViolation, RankError, Result};
pub use grouping::{generate_groups, get_effective_criterion, GroupingCriterion, GroupingStrategy};
pub use oracle::{validate_order, OrderOracle};
pub use scoring::{borda_points, round_point_total};
pub use stopping::aggregate_confidence;
pub use types::{
    Group, ItemId, RankedItem, SessionProgress, SessionResult, SessionSnapshot, StopReason,
};
