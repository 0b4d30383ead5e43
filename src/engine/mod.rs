//! The allocation core.
//!
//! `demand`, `compat`, `picker`, and `availability` are pure, synchronous
//! computations over in-memory snapshots; `orchestrator` is the only piece
//! that touches stores or suspends.

pub mod availability;
pub mod compat;
pub mod demand;
pub mod orchestrator;
pub mod picker;

pub use compat::CapacityAdjustment;
pub use orchestrator::Orchestrator;
pub use picker::Candidate;

use std::sync::Arc;

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::StoreError;
use crate::model::Expedition;
use crate::store::EngineStore;

/// Entry point wiring a store to an orchestrator.
///
/// Services are constructed once at startup and injected explicitly; there
/// are no process-global singletons hiding behind this type.
pub struct Engine {
    store: Arc<dyn EngineStore>,
    orchestrator: Arc<Orchestrator>,
}

impl Engine {
    /// Build an engine from configuration: sqlite when `db_path` is set,
    /// the non-persistent in-memory store otherwise.
    pub fn from_config(config: &EngineConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn EngineStore> = match &config.db_path {
            Some(path) => Arc::new(crate::store::SqliteStore::open(path)?),
            None => Arc::new(crate::store::InMemoryStore::new()),
        };
        Ok(Self::new(store, config))
    }

    pub fn new(store: Arc<dyn EngineStore>, config: &EngineConfig) -> Self {
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&store),
            config.capacity_adjustment,
        ));
        Self {
            store,
            orchestrator,
        }
    }

    /// Persist a new expedition and kick off allocation in the background.
    ///
    /// Returns as soon as the record is stored; the expedition's status is
    /// the only way to observe the allocation outcome.
    pub async fn submit(&self, expedition: Expedition) -> Result<Uuid, StoreError> {
        let id = expedition.id;
        self.store.insert_expedition(&expedition).await?;
        self.orchestrator.spawn(id);
        Ok(id)
    }

    pub fn store(&self) -> &Arc<dyn EngineStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Demand, ExpeditionStatus, Hero, HeroCategory, TaskSpec, TimeWindow};
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[tokio::test]
    async fn from_config_picks_the_backend() {
        let memory = Engine::from_config(&EngineConfig::default()).unwrap();
        assert!(!memory.store().is_persistent());

        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            db_path: Some(dir.path().join("engine.db")),
            ..EngineConfig::default()
        };
        let sqlite = Engine::from_config(&config).unwrap();
        assert!(sqlite.store().is_persistent());
    }

    #[tokio::test]
    async fn submit_returns_before_allocation_and_finishes_in_background() {
        let store = Arc::new(InMemoryStore::new());
        let hero = Hero::new("w", HeroCategory::Warrior, 2, 10.0);
        store.insert_hero(&hero).await.unwrap();

        let engine = Engine::new(
            Arc::clone(&store) as Arc<dyn EngineStore>,
            &EngineConfig::default(),
        );
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 3, 20, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 20, 18, 0, 0).unwrap(),
        )
        .unwrap();
        let expedition = Expedition::new(
            "ruins",
            window,
            vec![TaskSpec::new("dig", 2, Demand::new(10.0, 0.0, 0.0))],
        );
        let id = engine.submit(expedition).await.unwrap();

        // The background task owns the transition; poll until it lands.
        let mut status = ExpeditionStatus::Created;
        for _ in 0..100 {
            status = store.load_expedition(id).await.unwrap().status;
            if status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, ExpeditionStatus::Finished);
    }
}
