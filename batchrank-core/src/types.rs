use std::collections::HashMap;

use crate::error::{RankError, Result};

/// Caller-provided item identifier. Opaque to the engine; unique within a session.
pub type ItemId = i64;

/// One batch of items presented to the order oracle.
///
/// Groups within a round are disjoint and together cover every item.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    /// Zero-based round this group belongs to.
    pub round: usize,
    /// Position of this group within its round plan.
    pub index: usize,
    /// Items in presentation order (shuffled within the group).
    pub items: Vec<ItemId>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }
}

/// An item's standing: cumulative Borda score and current uncertainty.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedItem {
    pub item: ItemId,
    pub score: f64,
    /// Variance of the item's score history. `f64::INFINITY` until the item
    /// has at least two snapshots; serialized as `null` in that case.
    #[cfg_attr(feature = "serde", serde(with = "unbounded_as_null"))]
    pub uncertainty: f64,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    /// Aggregate confidence met the configured threshold.
    ConfidenceReached,
    /// The round cap was hit.
    MaxRounds,
}

/// Final output of a terminated session. Fixed once produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionResult {
    /// All items, sorted by score descending; ties keep registration order.
    pub rankings: Vec<RankedItem>,
    pub rounds_completed: usize,
    /// Aggregate confidence after the last round.
    pub confidence: f64,
    pub stop_reason: StopReason,
}

impl SessionResult {
    /// Item IDs in final rank order.
    pub fn final_ranking(&self) -> Vec<ItemId> {
        self.rankings.iter().map(|r| r.item).collect()
    }

    pub fn get(&self, item: ItemId) -> Option<&RankedItem> {
        self.rankings.iter().find(|r| r.item == item)
    }
}

/// Where a session is in its round loop.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionProgress {
    /// Zero-based index of the round currently being collected (or the last
    /// round, once terminated).
    pub round: usize,
    pub groups_total: usize,
    pub groups_pending: usize,
    /// Aggregate confidence after the most recent completed round.
    pub last_confidence: Option<f64>,
    pub terminated: bool,
}

/// What is left of a session that was abandoned before (or after) termination.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionSnapshot {
    pub rounds_completed: usize,
    /// Provisional standings, ordered the same way a final ranking would be.
    pub standings: Vec<RankedItem>,
    /// Set if the session had already terminated.
    pub result: Option<SessionResult>,
}

/// Uncertainty on the wire: finite values as numbers, unbounded as `null`.
#[cfg(feature = "serde")]
mod unbounded_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::constants::UNBOUNDED_UNCERTAINTY;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(UNBOUNDED_UNCERTAINTY))
    }
}

/// Internal indexed group (usize indices, not caller IDs).
pub(crate) type IndexedGroup = Vec<usize>;

/// Maps between caller-provided i64 IDs and internal 0..N indices.
///
/// Index order is registration order, which is also the tie-break order for
/// equal scores.
#[derive(Debug, Clone)]
pub(crate) struct IdMap {
    ids: Vec<ItemId>,
    id_to_idx: HashMap<ItemId, usize>,
}

impl IdMap {
    pub fn from_ids(ids: &[ItemId]) -> Result<Self> {
        let mut id_to_idx = HashMap::with_capacity(ids.len());
        for (idx, &id) in ids.iter().enumerate() {
            if id_to_idx.insert(id, idx).is_some() {
                return Err(RankError::InvalidConfiguration(format!(
                    "duplicate item ID: {id}"
                )));
            }
        }
        Ok(IdMap {
            ids: ids.to_vec(),
            id_to_idx,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn to_idx(&self, id: ItemId) -> Option<usize> {
        self.id_to_idx.get(&id).copied()
    }

    pub fn to_id(&self, idx: usize) -> ItemId {
        self.ids[idx]
    }

    pub fn to_ids(&self, indices: &[usize]) -> Vec<ItemId> {
        indices.iter().map(|&i| self.ids[i]).collect()
    }
}
