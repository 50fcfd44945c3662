/// Ranking session orchestrator.
///
/// Pure computation: no IO, no blocking on the caller's behalf. The caller
/// pulls the next group, gets it ordered however it likes, and pushes the
/// order back. The session resumes exactly where it left off on every call,
/// so it can be driven one UI event at a time.
///
/// Items are identified by caller-provided `i64` IDs.
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_GROUP_SIZE, DEFAULT_MAX_ROUNDS, MIN_GROUP_SIZE,
    UNBOUNDED_UNCERTAINTY,
};
use crate::error::{OrderViolation, RankError, Result};
use crate::grouping::{generate_groups_indexed, get_effective_criterion, GroupingStrategy};
use crate::oracle::{validate_order, OrderOracle};
use crate::scoring::apply_group_order;
use crate::stopping::{aggregate_confidence, evaluate, final_order, StopDecision};
use crate::types::{
    Group, IdMap, IndexedGroup, ItemId, RankedItem, SessionProgress, SessionResult,
    SessionSnapshot, StopReason,
};
use crate::uncertainty::estimate_all;

/// Parameters for one ranking session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Nominal group size; also the Borda points for first place.
    pub group_size: usize,
    /// Hard cap on rounds.
    pub max_rounds: usize,
    /// Stop once aggregate confidence reaches this, in (0, 1].
    pub confidence_threshold: f64,
    pub strategy: GroupingStrategy,
    /// Seed for within-group shuffling. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            group_size: DEFAULT_GROUP_SIZE,
            max_rounds: DEFAULT_MAX_ROUNDS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            strategy: GroupingStrategy::default(),
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.group_size < MIN_GROUP_SIZE {
            return Err(RankError::InvalidConfiguration(format!(
                "group size must be at least {MIN_GROUP_SIZE}, got {}",
                self.group_size
            )));
        }
        if self.max_rounds == 0 {
            return Err(RankError::InvalidConfiguration(
                "max rounds must be at least 1".to_string(),
            ));
        }
        let t = self.confidence_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(RankError::InvalidConfiguration(format!(
                "confidence threshold must be in (0, 1], got {t}"
            )));
        }
        Ok(())
    }
}

/// What a successful submission did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmitOutcome {
    /// Scored; more groups remain in this round.
    GroupAccepted { groups_remaining: usize },
    /// Last group of the round scored; the next round is planned.
    RoundCompleted { round: usize, confidence: f64 },
    /// Last group of the round scored and the session stopped.
    Terminated { round: usize, confidence: f64, stop_reason: StopReason },
}

/// One ranking run over a fixed item set.
pub struct RankingSession {
    /// Maps between caller i64 IDs and internal 0..N indices.
    id_map: IdMap,
    config: SessionConfig,
    rng: StdRng,

    /// Cumulative Borda scores (indexed internally 0..num_items).
    scores: Vec<f64>,
    /// Score snapshot after each round the item took part in.
    history: Vec<Vec<f64>>,
    uncertainties: Vec<f64>,

    /// Zero-based index of the round being collected. Equals the number of
    /// completed rounds while running.
    current_round: usize,
    plan: Vec<Group>,
    pending: Vec<bool>,

    last_confidence: Option<f64>,
    result: Option<SessionResult>,
}

impl RankingSession {
    /// Start a session and plan its first round.
    pub fn start(item_ids: &[ItemId], config: SessionConfig) -> Result<Self> {
        config.validate()?;
        if item_ids.is_empty() {
            return Err(RankError::InvalidConfiguration(
                "at least one item is required".to_string(),
            ));
        }
        let id_map = IdMap::from_ids(item_ids)?;
        let num_items = id_map.len();

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut session = RankingSession {
            id_map,
            config,
            rng,
            scores: vec![0.0; num_items],
            history: vec![Vec::new(); num_items],
            uncertainties: vec![UNBOUNDED_UNCERTAINTY; num_items],
            current_round: 0,
            plan: Vec::new(),
            pending: Vec::new(),
            last_confidence: None,
            result: None,
        };
        session.plan_round()?;

        info!(
            items = num_items,
            group_size = session.config.group_size,
            max_rounds = session.config.max_rounds,
            "ranking session started"
        );
        Ok(session)
    }

    fn plan_round(&mut self) -> Result<()> {
        let criterion = get_effective_criterion(self.config.strategy, self.current_round);
        let groups = generate_groups_indexed(
            &self.scores,
            &self.uncertainties,
            self.config.group_size,
            criterion,
            &mut self.rng,
        )?;

        self.plan = groups
            .iter()
            .enumerate()
            .map(|(index, g)| Group {
                round: self.current_round,
                index,
                items: self.id_map.to_ids(g),
            })
            .collect();
        self.pending = vec![true; groups.len()];

        debug!(
            round = self.current_round + 1,
            groups = self.plan.len(),
            ?criterion,
            "round planned"
        );
        Ok(())
    }

    /// Number of items being ranked.
    pub fn num_items(&self) -> usize {
        self.id_map.len()
    }

    /// Item IDs in registration order.
    pub fn item_ids(&self) -> &[ItemId] {
        self.id_map.ids()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Zero-based index of the round being collected.
    pub fn current_round(&self) -> usize {
        self.current_round
    }

    /// Every group of the current round, submitted or not. Empty once terminated.
    pub fn current_round_groups(&self) -> &[Group] {
        if self.result.is_some() {
            return &[];
        }
        &self.plan
    }

    /// Groups of the current round still waiting for an order.
    pub fn pending_groups(&self) -> impl Iterator<Item = &Group> {
        self.current_round_groups()
            .iter()
            .zip(self.pending.iter())
            .filter(|(_, &p)| p)
            .map(|(g, _)| g)
    }

    /// The next group to hand to the oracle. `None` once terminated.
    pub fn next_group(&self) -> Option<&Group> {
        self.pending_groups().next()
    }

    pub fn is_terminated(&self) -> bool {
        self.result.is_some()
    }

    /// Score one group. The group must be pending in the current round and
    /// `order` must be a permutation of its items, best first. On error
    /// nothing changes.
    pub fn submit_order(&mut self, group: &Group, order: &[ItemId]) -> Result<SubmitOutcome> {
        if self.result.is_some() {
            return Err(RankError::SessionTerminated);
        }

        let index = group.index;
        let is_pending = group.round == self.current_round
            && self.pending.get(index).copied().unwrap_or(false);
        if !is_pending {
            return Err(OrderViolation::GroupNotPending {
                round: group.round,
                index,
            }
            .into());
        }

        // The planned group is authoritative, not the caller's copy.
        validate_order(&self.plan[index].items, order)?;
        let indexed_order: IndexedGroup = order
            .iter()
            .map(|&id| {
                self.id_map
                    .to_idx(id)
                    .ok_or(RankError::MalformedOrder(OrderViolation::UnexpectedItem(id)))
            })
            .collect::<Result<_>>()?;

        apply_group_order(
            &mut self.scores,
            &mut self.history,
            &indexed_order,
            self.config.group_size,
        );
        self.pending[index] = false;

        let groups_remaining = self.pending.iter().filter(|&&p| p).count();
        debug!(
            round = self.current_round + 1,
            group = index,
            groups_remaining,
            "group scored"
        );

        if groups_remaining > 0 {
            return Ok(SubmitOutcome::GroupAccepted { groups_remaining });
        }
        self.finish_round()
    }

    fn finish_round(&mut self) -> Result<SubmitOutcome> {
        let round = self.current_round;
        self.uncertainties = estimate_all(&self.history);
        let confidence = aggregate_confidence(&self.uncertainties);
        self.last_confidence = Some(confidence);

        info!(round = round + 1, confidence, "round completed");

        match evaluate(
            confidence,
            self.config.confidence_threshold,
            round,
            self.config.max_rounds,
        ) {
            StopDecision::Stop(stop_reason) => {
                self.finalize(confidence, stop_reason);
                info!(rounds = round + 1, ?stop_reason, "ranking session terminated");
                Ok(SubmitOutcome::Terminated {
                    round,
                    confidence,
                    stop_reason,
                })
            }
            StopDecision::Continue => {
                self.current_round += 1;
                self.plan_round()?;
                Ok(SubmitOutcome::RoundCompleted { round, confidence })
            }
        }
    }

    fn finalize(&mut self, confidence: f64, stop_reason: StopReason) {
        self.result = Some(SessionResult {
            rankings: self.standings(),
            rounds_completed: self.current_round + 1,
            confidence,
            stop_reason,
        });
    }

    /// Current standings in final-ranking order.
    pub fn standings(&self) -> Vec<RankedItem> {
        final_order(&self.scores)
            .into_iter()
            .map(|idx| RankedItem {
                item: self.id_map.to_id(idx),
                score: self.scores[idx],
                uncertainty: self.uncertainties[idx],
            })
            .collect()
    }

    /// The final result. Fails with `NotReady` until the session terminates;
    /// afterwards always returns the same value.
    pub fn result(&self) -> Result<&SessionResult> {
        self.result.as_ref().ok_or(RankError::NotReady)
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            round: self.current_round,
            groups_total: self.plan.len(),
            groups_pending: self.pending_groups().count(),
            last_confidence: self.last_confidence,
            terminated: self.is_terminated(),
        }
    }

    pub fn score(&self, item: ItemId) -> Option<f64> {
        self.id_map.to_idx(item).map(|i| self.scores[i])
    }

    pub fn uncertainty(&self, item: ItemId) -> Option<f64> {
        self.id_map.to_idx(item).map(|i| self.uncertainties[i])
    }

    pub fn history(&self, item: ItemId) -> Option<&[f64]> {
        self.id_map.to_idx(item).map(|i| self.history[i].as_slice())
    }

    /// `(item, score)` pairs in registration order.
    pub fn scores(&self) -> Vec<(ItemId, f64)> {
        self.id_map.ids().iter().copied().zip(self.scores.iter().copied()).collect()
    }

    /// `(item, uncertainty)` pairs in registration order.
    pub fn uncertainties(&self) -> Vec<(ItemId, f64)> {
        self.id_map
            .ids()
            .iter()
            .copied()
            .zip(self.uncertainties.iter().copied())
            .collect()
    }

    /// Drive the session to termination, asking `oracle` for every group.
    ///
    /// Oracle failures and malformed orders are returned as-is; the session is
    /// left untouched by the failed group and can be driven again.
    pub fn run_with_oracle<O: OrderOracle + ?Sized>(
        &mut self,
        oracle: &mut O,
    ) -> Result<&SessionResult> {
        while let Some(group) = self.next_group().cloned() {
            let order = oracle.request_order(&group).map_err(RankError::Oracle)?;
            self.submit_order(&group, &order)?;
        }
        self.result()
    }

    /// Give up on the session and keep what was learned so far.
    pub fn abandon(self) -> SessionSnapshot {
        let rounds_completed = match self.result {
            Some(ref r) => r.rounds_completed,
            None => self.current_round,
        };
        info!(rounds_completed, "ranking session abandoned");
        SessionSnapshot {
            rounds_completed,
            standings: self.standings(),
            result: self.result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::grouping::{priority_order, GroupingCriterion};

    type OracleResult = std::result::Result<Vec<ItemId>, OracleError>;

    const A: ItemId = 1;
    const B: ItemId = 2;
    const C: ItemId = 3;
    const D: ItemId = 4;

    fn config(group_size: usize, max_rounds: usize) -> SessionConfig {
        SessionConfig {
            group_size,
            max_rounds,
            confidence_threshold: 0.9,
            strategy: GroupingStrategy::Adaptive,
            seed: Some(7),
        }
    }

    /// Orders any group by ascending ID, so lower IDs are "better".
    fn by_id(group: &Group) -> OracleResult {
        let mut order = group.items.clone();
        order.sort_unstable();
        Ok(order)
    }

    #[test]
    fn test_start_plans_first_round() {
        let session = RankingSession::start(&[A, B, C, D, 5], config(2, 5)).unwrap();
        let groups = session.current_round_groups();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2].len(), 1);
        assert!(groups.iter().all(|g| g.round == 0));
        assert_eq!(session.next_group(), Some(&groups[0]));
        assert!(!session.is_terminated());
    }

    #[test]
    fn test_start_rejects_bad_config() {
        assert!(matches!(
            RankingSession::start(&[], config(2, 5)),
            Err(RankError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            RankingSession::start(&[A, B], config(1, 5)),
            Err(RankError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            RankingSession::start(&[A, B], config(2, 0)),
            Err(RankError::InvalidConfiguration(_))
        ));
        let mut bad_threshold = config(2, 5);
        bad_threshold.confidence_threshold = 0.0;
        assert!(matches!(
            RankingSession::start(&[A, B], bad_threshold),
            Err(RankError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            RankingSession::start(&[A, A], config(2, 5)),
            Err(RankError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_first_round_scores_and_continues() {
        let mut session = RankingSession::start(&[A, B, C, D], config(4, 10)).unwrap();
        let group = session.next_group().cloned().unwrap();

        let outcome = session.submit_order(&group, &[A, B, C, D]).unwrap();
        assert!(matches!(outcome, SubmitOutcome::RoundCompleted { round: 0, .. }));

        assert_eq!(session.scores(), vec![(A, 4.0), (B, 3.0), (C, 2.0), (D, 1.0)]);
        assert!(session.uncertainty(A).unwrap().is_infinite());
        assert_eq!(session.current_round(), 1);
        assert_eq!(session.next_group().map(|g| g.round), Some(1));
    }

    #[test]
    fn test_group_accepted_until_round_done() {
        let mut session = RankingSession::start(&[A, B, C, D], config(2, 10)).unwrap();
        let first = session.next_group().cloned().unwrap();
        let mut order = first.items.clone();
        order.sort_unstable();

        let outcome = session.submit_order(&first, &order).unwrap();
        assert_eq!(outcome, SubmitOutcome::GroupAccepted { groups_remaining: 1 });
        assert_eq!(session.progress().groups_pending, 1);

        // The same group can't be scored twice.
        let err = session.submit_order(&first, &order).unwrap_err();
        assert!(matches!(
            err,
            RankError::MalformedOrder(OrderViolation::GroupNotPending { round: 0, index: 0 })
        ));
    }

    #[test]
    fn test_malformed_order_leaves_state_untouched() {
        let mut session = RankingSession::start(&[A, B, C], config(3, 10)).unwrap();
        let group = session.next_group().cloned().unwrap();

        let err = session.submit_order(&group, &[A, A, B]).unwrap_err();
        assert!(matches!(err, RankError::MalformedOrder(OrderViolation::DuplicateItem(A))));
        let err = session.submit_order(&group, &[A, B]).unwrap_err();
        assert!(matches!(err, RankError::MalformedOrder(OrderViolation::LengthMismatch { .. })));

        assert!(session.scores().iter().all(|&(_, s)| s == 0.0));
        assert!(session.history(A).unwrap().is_empty());
        assert_eq!(session.next_group(), Some(&group));

        // A valid resubmission still works.
        session.submit_order(&group, &[C, B, A]).unwrap();
        assert_eq!(session.score(C), Some(3.0));
    }

    #[test]
    fn test_max_rounds_one_terminates_after_one_round() {
        let mut session = RankingSession::start(&[A, B, C, D], config(4, 1)).unwrap();
        let group = session.next_group().cloned().unwrap();
        let outcome = session.submit_order(&group, &[D, C, B, A]).unwrap();

        assert!(matches!(
            outcome,
            SubmitOutcome::Terminated { round: 0, stop_reason: StopReason::MaxRounds, .. }
        ));
        let result = session.result().unwrap();
        assert_eq!(result.final_ranking(), vec![D, C, B, A]);
        assert_eq!(result.rounds_completed, 1);
    }

    #[test]
    fn test_result_not_ready_before_termination() {
        let session = RankingSession::start(&[A, B], config(2, 3)).unwrap();
        assert!(matches!(session.result(), Err(RankError::NotReady)));
    }

    #[test]
    fn test_terminated_session_is_frozen() {
        let mut session = RankingSession::start(&[A, B, C], config(3, 2)).unwrap();
        let first = session.run_with_oracle(&mut by_id).unwrap().clone();

        assert!(session.is_terminated());
        assert!(session.next_group().is_none());
        assert!(session.current_round_groups().is_empty());
        assert_eq!(session.result().unwrap(), &first);

        let stale = Group { round: 1, index: 0, items: vec![A, B, C] };
        assert!(matches!(
            session.submit_order(&stale, &[A, B, C]),
            Err(RankError::SessionTerminated)
        ));
        assert_eq!(session.run_with_oracle(&mut by_id).unwrap(), &first);
    }

    #[test]
    fn test_confidence_can_stop_early() {
        // A lone item gains 2 points a round: history [2, 4] has variance 2,
        // confidence just under 0.5. A low threshold stops at round two.
        let mut cfg = config(2, 20);
        cfg.confidence_threshold = 0.4;
        let mut session = RankingSession::start(&[A], cfg).unwrap();
        let result = session.run_with_oracle(&mut by_id).unwrap();

        assert_eq!(result.stop_reason, StopReason::ConfidenceReached);
        assert_eq!(result.rounds_completed, 2);
    }

    #[test]
    fn test_oracle_error_propagates() {
        let mut session = RankingSession::start(&[A, B], config(2, 3)).unwrap();
        let mut failing = |_: &Group| -> OracleResult { Err("judge went home".into()) };
        let err = session.run_with_oracle(&mut failing).unwrap_err();
        assert!(matches!(err, RankError::Oracle(_)));
        assert_eq!(session.progress().groups_pending, 1);
    }

    #[test]
    fn test_abandon_returns_provisional_standings() {
        let mut session = RankingSession::start(&[A, B, C, D], config(4, 5)).unwrap();
        let group = session.next_group().cloned().unwrap();
        session.submit_order(&group, &[B, A, D, C]).unwrap();

        let snapshot = session.abandon();
        assert_eq!(snapshot.rounds_completed, 1);
        assert!(snapshot.result.is_none());
        let order: Vec<ItemId> = snapshot.standings.iter().map(|r| r.item).collect();
        assert_eq!(order, vec![B, A, D, C]);
    }

    /// Windows a session would build from its own tables under `criterion`,
    /// each sorted by ID so they compare independent of the shuffle.
    fn expected_windows(session: &RankingSession, criterion: GroupingCriterion) -> Vec<Vec<ItemId>> {
        let scores: Vec<f64> = session.scores().iter().map(|&(_, s)| s).collect();
        let uncertainties: Vec<f64> = session.uncertainties().iter().map(|&(_, u)| u).collect();
        let ids = session.item_ids();
        priority_order(criterion, &scores, &uncertainties)
            .chunks(session.config().group_size)
            .map(|window| {
                let mut members: Vec<ItemId> = window.iter().map(|&i| ids[i]).collect();
                members.sort_unstable();
                members
            })
            .collect()
    }

    #[test]
    fn test_adaptive_session_groups_by_uncertainty_after_first_round() {
        let mut session = RankingSession::start(&[A, B, C, D, 5, 6, 7, 8], config(4, 5)).unwrap();
        while session.current_round() < 2 {
            let group = session.next_group().cloned().unwrap();
            let order = by_id(&group).unwrap();
            session.submit_order(&group, &order).unwrap();
        }
        assert!(!session.is_terminated());

        let planned: Vec<Vec<ItemId>> = session
            .current_round_groups()
            .iter()
            .map(|g| {
                let mut members = g.items.clone();
                members.sort_unstable();
                members
            })
            .collect();

        // Variances after two rounds: 1 and 3 are least settled, 6 and 8 most.
        assert_eq!(planned, expected_windows(&session, GroupingCriterion::ByUncertainty));
        assert_eq!(planned, vec![vec![A, B, C, D], vec![5, 6, 7, 8]]);
        assert_ne!(planned, expected_windows(&session, GroupingCriterion::ByScore));
    }

    #[test]
    fn test_score_only_session_keeps_grouping_by_score() {
        let mut cfg = config(4, 5);
        cfg.strategy = GroupingStrategy::ScoreOnly;
        let mut session = RankingSession::start(&[A, B, C, D, 5, 6, 7, 8], cfg).unwrap();
        while session.current_round() < 2 {
            let group = session.next_group().cloned().unwrap();
            let order = by_id(&group).unwrap();
            session.submit_order(&group, &order).unwrap();
        }

        let planned: Vec<Vec<ItemId>> = session
            .current_round_groups()
            .iter()
            .map(|g| {
                let mut members = g.items.clone();
                members.sort_unstable();
                members
            })
            .collect();
        assert_eq!(planned, expected_windows(&session, GroupingCriterion::ByScore));
    }
}
