//! Error taxonomy for the allocation engine.
//!
//! Allocation-time errors never surface to the caller of the background
//! trigger: the orchestrator converts every [`AllocationError`] into an
//! `Error` status write and logs the details. [`StoreError`] is the only
//! error kind that crosses the store boundary.

use thiserror::Error;
use uuid::Uuid;

use crate::model::{ExpeditionStatus, HeroCategory};

/// Failures of the backing stores (expeditions, heroes, reservations).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("expedition {0} not found")]
    NotFound(Uuid),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Why a single allocation attempt failed.
///
/// Caught at the orchestrator boundary; none of these are returned to the
/// code that triggered the allocation.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// The expedition has no tasks, so mean difficulty is undefined.
    /// Aborts before any resource query.
    #[error("expedition has no tasks to aggregate")]
    EmptyTaskList,

    /// The free pool for a category ran out before covering its demand.
    #[error("cannot cover {demand} {category} demand from the free pool")]
    UnsatisfiableDemand {
        category: HeroCategory,
        demand: f64,
    },

    /// A category has positive demand but no free hero at all.
    #[error("no free {category} heroes for the expedition window")]
    NoFreeResources { category: HeroCategory },

    /// The expedition is not in `Created` state; the attempt is rejected
    /// without touching any store.
    #[error("expedition {id} is already {status}, refusing to allocate")]
    InvalidStatus {
        id: Uuid,
        status: ExpeditionStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AllocationError {
    /// Whether the failure should move the expedition to `Error` state.
    /// A status guard rejection must not touch a terminal expedition.
    pub fn marks_expedition_failed(&self) -> bool {
        !matches!(self, AllocationError::InvalidStatus { .. })
    }
}
