//! Persistence for expeditions, the hero catalog, and reservations.
//!
//! Backends:
//! - `memory`: in-memory maps (non-persistent, used by tests)
//! - `sqlite`: SQLite database, overlap query pushed into SQL
//!
//! The success commit and the error write deliberately use separate
//! transactions: a failed allocation attempt must be able to record its
//! `Error` status no matter what state the attempt left behind.

mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Demand, Expedition, Hero, Reservation, TimeWindow};

/// Storage contract the allocation engine runs against.
#[async_trait]
pub trait EngineStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Load an expedition with its task list.
    ///
    /// # Errors
    /// `NotFound` if no such expedition exists.
    async fn load_expedition(&self, id: Uuid) -> Result<Expedition, StoreError>;

    /// Persist a freshly created expedition (status `Created`).
    async fn insert_expedition(&self, expedition: &Expedition) -> Result<(), StoreError>;

    /// Snapshot of the hero catalog. Read-only from the engine's side.
    async fn list_heroes(&self) -> Result<Vec<Hero>, StoreError>;

    /// Seed a hero into the catalog.
    async fn insert_hero(&self, hero: &Hero) -> Result<(), StoreError>;

    /// Reservations whose window conflicts with `window` under the
    /// closed-interval semantics of [`TimeWindow::conflicts_with`].
    async fn list_overlapping(&self, window: &TimeWindow) -> Result<Vec<Reservation>, StoreError>;

    /// Commit a successful allocation in one transaction: insert every
    /// reservation, write the aggregated demand back, set status
    /// `Finished`. Either all of it lands or none of it does.
    async fn commit_success(
        &self,
        expedition_id: Uuid,
        reservations: &[Reservation],
        demand: Demand,
    ) -> Result<(), StoreError>;

    /// Set status `Error` in a fresh transaction, independent of whatever
    /// a failed attempt did before.
    async fn mark_error(&self, expedition_id: Uuid) -> Result<(), StoreError>;

    /// Expeditions still `Created` that were created before the cutoff.
    /// Feed for the reconciliation sweep.
    async fn list_stuck(&self, created_before: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError>;
}
