//! In-memory engine store (non-persistent).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::EngineStore;
use crate::error::StoreError;
use crate::model::{Demand, Expedition, ExpeditionStatus, Hero, Reservation, TimeWindow};

#[derive(Clone, Default)]
pub struct InMemoryStore {
    expeditions: Arc<RwLock<HashMap<Uuid, Expedition>>>,
    heroes: Arc<RwLock<Vec<Hero>>>,
    reservations: Arc<RwLock<Vec<Reservation>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reservations, in insertion order. Test helper.
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.reservations.read().await.clone()
    }
}

#[async_trait]
impl EngineStore for InMemoryStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn load_expedition(&self, id: Uuid) -> Result<Expedition, StoreError> {
        self.expeditions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn insert_expedition(&self, expedition: &Expedition) -> Result<(), StoreError> {
        self.expeditions
            .write()
            .await
            .insert(expedition.id, expedition.clone());
        Ok(())
    }

    async fn list_heroes(&self) -> Result<Vec<Hero>, StoreError> {
        Ok(self.heroes.read().await.clone())
    }

    async fn insert_hero(&self, hero: &Hero) -> Result<(), StoreError> {
        self.heroes.write().await.push(hero.clone());
        Ok(())
    }

    async fn list_overlapping(&self, window: &TimeWindow) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .reservations
            .read()
            .await
            .iter()
            .filter(|r| r.window.conflicts_with(window))
            .cloned()
            .collect())
    }

    async fn commit_success(
        &self,
        expedition_id: Uuid,
        reservations: &[Reservation],
        demand: Demand,
    ) -> Result<(), StoreError> {
        // Hold both write guards for the whole commit so the reservation
        // inserts and the status flip are observed together.
        let mut expeditions = self.expeditions.write().await;
        let mut reserved = self.reservations.write().await;
        let expedition = expeditions
            .get_mut(&expedition_id)
            .ok_or(StoreError::NotFound(expedition_id))?;
        expedition
            .finish(demand)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        reserved.extend_from_slice(reservations);
        Ok(())
    }

    async fn mark_error(&self, expedition_id: Uuid) -> Result<(), StoreError> {
        let mut expeditions = self.expeditions.write().await;
        let expedition = expeditions
            .get_mut(&expedition_id)
            .ok_or(StoreError::NotFound(expedition_id))?;
        expedition
            .fail()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(())
    }

    async fn list_stuck(&self, created_before: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .expeditions
            .read()
            .await
            .values()
            .filter(|e| e.status == ExpeditionStatus::Created && e.created_at < created_before)
            .map(|e| e.id)
            .collect())
    }
}
