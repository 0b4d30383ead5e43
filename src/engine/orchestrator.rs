//! Allocation orchestrator: drives one expedition through its lifecycle.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{availability, compat::CapacityAdjustment, demand, picker};
use crate::error::{AllocationError, StoreError};
use crate::model::{ExpeditionStatus, HeroCategory, PickResult, Reservation};
use crate::store::EngineStore;

/// Coordinates availability, demand, compatibility, and the greedy picker,
/// then records the outcome.
///
/// The attempt itself is `try_allocate`, a plain `Result` pipeline; the
/// public driver only interprets the tag. A failed attempt is recorded
/// through [`EngineStore::mark_error`], on a transaction independent of
/// anything the attempt touched, so the failure write cannot be undone by
/// the failure it reports.
pub struct Orchestrator {
    store: Arc<dyn EngineStore>,
    adjustment: CapacityAdjustment,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn EngineStore>, adjustment: CapacityAdjustment) -> Self {
        Self { store, adjustment }
    }

    /// Run one allocation attempt for the expedition.
    ///
    /// Allocation failures never propagate: they are logged and converted
    /// into an `Error` status write. The returned error covers only the
    /// failure write itself (the store being unreachable at that point is
    /// the one thing this method cannot absorb).
    pub async fn process(&self, expedition_id: Uuid) -> Result<(), StoreError> {
        match self.try_allocate(expedition_id).await {
            Ok(result) => {
                info!(
                    %expedition_id,
                    heroes = result.heroes.len(),
                    total_demand = result.demand.total(),
                    "expedition allocated"
                );
                Ok(())
            }
            Err(err) if err.marks_expedition_failed() => {
                error!(%expedition_id, %err, "allocation failed, marking expedition");
                self.store.mark_error(expedition_id).await
            }
            Err(err) => {
                warn!(%expedition_id, %err, "allocation attempt rejected");
                Ok(())
            }
        }
    }

    /// Trigger `process` in the background, fire and forget.
    ///
    /// The creation path must not block on allocation; any error left over
    /// from the failure write is logged here and dropped.
    pub fn spawn(self: &Arc<Self>, expedition_id: Uuid) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = this.process(expedition_id).await {
                error!(%expedition_id, %err, "could not record allocation failure");
            }
        });
    }

    /// Re-run allocation for expeditions stuck in `Created` longer than
    /// `older_than` (a crash mid-run leaves them there forever otherwise).
    /// Returns how many were retried.
    pub async fn sweep_stuck(&self, older_than: Duration) -> Result<usize, StoreError> {
        let cutoff = chrono::Utc::now() - older_than;
        let stuck = self.store.list_stuck(cutoff).await?;
        if !stuck.is_empty() {
            warn!(count = stuck.len(), "retrying stuck expeditions");
        }
        let retried = stuck.len();
        for id in stuck {
            self.process(id).await?;
        }
        Ok(retried)
    }

    /// The attempt: steps 1-6 of the allocation run. Commits on success;
    /// any error (including a commit failure) falls out to `process`.
    async fn try_allocate(&self, expedition_id: Uuid) -> Result<PickResult, AllocationError> {
        let expedition = self.store.load_expedition(expedition_id).await?;
        if expedition.status != ExpeditionStatus::Created {
            return Err(AllocationError::InvalidStatus {
                id: expedition_id,
                status: expedition.status,
            });
        }

        let total = demand::aggregate(&expedition.tasks);
        let mean_level = demand::mean_level(&expedition.tasks)?;
        debug!(%expedition_id, ?total, mean_level, "aggregated demand");

        let heroes = self.store.list_heroes().await?;
        let conflicting = self.store.list_overlapping(&expedition.window).await?;
        let free = availability::free_heroes(&heroes, &conflicting);
        debug!(
            %expedition_id,
            candidates = heroes.len(),
            free = free.len(),
            window = %expedition.window,
            "resolved availability"
        );
        let mut pools = availability::by_category(free);

        let mut selected = Vec::new();
        for category in HeroCategory::ALL {
            let required = total.get(category);
            if required <= 0.0 {
                continue;
            }
            let pool = pools.remove(&category).unwrap_or_default();
            if pool.is_empty() {
                return Err(AllocationError::NoFreeResources { category });
            }
            let candidates: Vec<picker::Candidate> = pool
                .iter()
                .map(|h| picker::Candidate::new(h.id, self.adjustment.effective(h, mean_level)))
                .collect();
            let picked = picker::pick(required, &candidates).map_err(|unsat| {
                debug!(%expedition_id, %category, remaining = unsat.remaining, "pool exhausted");
                AllocationError::UnsatisfiableDemand {
                    category,
                    demand: required,
                }
            })?;
            debug!(%expedition_id, %category, picked = picked.len(), "category covered");
            selected.extend(picked);
        }

        let reservations: Vec<Reservation> = selected
            .iter()
            .map(|&hero_id| Reservation::new(hero_id, expedition.id, expedition.window))
            .collect();
        self.store
            .commit_success(expedition.id, &reservations, total)
            .await?;

        Ok(PickResult {
            heroes: selected,
            demand: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Demand, Expedition, Hero, TaskSpec, TimeWindow};
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn window(day: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 3, day, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, day, 18, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn orchestrator(store: &Arc<InMemoryStore>) -> Orchestrator {
        let store: Arc<dyn EngineStore> = Arc::clone(store) as Arc<dyn EngineStore>;
        Orchestrator::new(store, CapacityAdjustment::Raw)
    }

    async fn seed_hero(
        store: &InMemoryStore,
        name: &str,
        category: HeroCategory,
        capacity: f64,
    ) -> Hero {
        let hero = Hero::new(name, category, 2, capacity);
        store.insert_hero(&hero).await.unwrap();
        hero
    }

    #[tokio::test]
    async fn successful_run_finishes_and_reserves() {
        let store = Arc::new(InMemoryStore::new());
        seed_hero(&store, "w1", HeroCategory::Warrior, 5.0).await;
        let exact = seed_hero(&store, "w2", HeroCategory::Warrior, 13.0).await;
        let mage = seed_hero(&store, "m1", HeroCategory::Magician, 8.0).await;

        let exp = Expedition::new(
            "ruins",
            window(20),
            vec![TaskSpec::new("dig", 2, Demand::new(13.0, 7.0, 0.0))],
        );
        store.insert_expedition(&exp).await.unwrap();
        orchestrator(&store).process(exp.id).await.unwrap();

        let loaded = store.load_expedition(exp.id).await.unwrap();
        assert_eq!(loaded.status, ExpeditionStatus::Finished);
        assert_eq!(loaded.demand.unwrap(), Demand::new(13.0, 7.0, 0.0));

        let reservations = store.reservations().await;
        let mut hero_ids: Vec<_> = reservations.iter().map(|r| r.hero_id).collect();
        hero_ids.sort();
        let mut expected = vec![exact.id, mage.id];
        expected.sort();
        assert_eq!(hero_ids, expected);
        assert!(reservations.iter().all(|r| r.expedition_id == exp.id));
    }

    #[tokio::test]
    async fn failing_category_commits_nothing() {
        let store = Arc::new(InMemoryStore::new());
        seed_hero(&store, "w1", HeroCategory::Warrior, 20.0).await;
        // no strategist at all, and strategist demand is positive

        let exp = Expedition::new(
            "ruins",
            window(20),
            vec![TaskSpec::new("dig", 2, Demand::new(10.0, 0.0, 6.0))],
        );
        store.insert_expedition(&exp).await.unwrap();
        orchestrator(&store).process(exp.id).await.unwrap();

        let loaded = store.load_expedition(exp.id).await.unwrap();
        assert_eq!(loaded.status, ExpeditionStatus::Error);
        assert!(loaded.demand.is_none());
        assert!(store.reservations().await.is_empty());
    }

    #[tokio::test]
    async fn exhausted_pool_marks_error() {
        let store = Arc::new(InMemoryStore::new());
        seed_hero(&store, "w1", HeroCategory::Warrior, 5.0).await;
        seed_hero(&store, "w2", HeroCategory::Warrior, 10.0).await;

        let exp = Expedition::new(
            "ruins",
            window(20),
            vec![TaskSpec::new("dig", 2, Demand::new(50.0, 0.0, 0.0))],
        );
        store.insert_expedition(&exp).await.unwrap();
        orchestrator(&store).process(exp.id).await.unwrap();

        assert_eq!(
            store.load_expedition(exp.id).await.unwrap().status,
            ExpeditionStatus::Error
        );
        assert!(store.reservations().await.is_empty());
    }

    #[tokio::test]
    async fn empty_task_list_marks_error() {
        let store = Arc::new(InMemoryStore::new());
        let exp = Expedition::new("idle", window(20), vec![]);
        store.insert_expedition(&exp).await.unwrap();
        orchestrator(&store).process(exp.id).await.unwrap();

        assert_eq!(
            store.load_expedition(exp.id).await.unwrap().status,
            ExpeditionStatus::Error
        );
    }

    #[tokio::test]
    async fn terminal_expedition_is_left_alone() {
        let store = Arc::new(InMemoryStore::new());
        let mut exp = Expedition::new("done", window(20), vec![]);
        exp.finish(Demand::default()).unwrap();
        store.insert_expedition(&exp).await.unwrap();

        orchestrator(&store).process(exp.id).await.unwrap();
        assert_eq!(
            store.load_expedition(exp.id).await.unwrap().status,
            ExpeditionStatus::Finished
        );
    }

    #[tokio::test]
    async fn reserved_heroes_are_not_double_booked() {
        let store = Arc::new(InMemoryStore::new());
        let busy = seed_hero(&store, "busy", HeroCategory::Warrior, 13.0).await;
        let idle = seed_hero(&store, "idle", HeroCategory::Warrior, 13.0).await;

        // First expedition books the closest-match hero for the window.
        let first = Expedition::new(
            "first",
            window(20),
            vec![TaskSpec::new("dig", 2, Demand::new(13.0, 0.0, 0.0))],
        );
        store.insert_expedition(&first).await.unwrap();
        let orch = orchestrator(&store);
        orch.process(first.id).await.unwrap();
        let booked: Vec<_> = store.reservations().await;
        assert_eq!(booked.len(), 1);
        let booked_id = booked[0].hero_id;
        assert!(booked_id == busy.id || booked_id == idle.id);

        // Second expedition over the same window must take the other one.
        let second = Expedition::new(
            "second",
            window(20),
            vec![TaskSpec::new("dig", 2, Demand::new(13.0, 0.0, 0.0))],
        );
        store.insert_expedition(&second).await.unwrap();
        orch.process(second.id).await.unwrap();

        let reservations = store.reservations().await;
        assert_eq!(reservations.len(), 2);
        assert_ne!(reservations[0].hero_id, reservations[1].hero_id);

        // A disjoint window sees the full pool again.
        let third = Expedition::new(
            "third",
            window(25),
            vec![TaskSpec::new("dig", 2, Demand::new(26.0, 0.0, 0.0))],
        );
        store.insert_expedition(&third).await.unwrap();
        orch.process(third.id).await.unwrap();
        assert_eq!(
            store.load_expedition(third.id).await.unwrap().status,
            ExpeditionStatus::Finished
        );
    }

    #[tokio::test]
    async fn scaled_adjustment_changes_feasibility() {
        let store = Arc::new(InMemoryStore::new());
        // Novice warrior, capacity 10, on medium tasks: effective 6.25.
        let hero = Hero::new("novice", HeroCategory::Warrior, 1, 10.0);
        store.insert_hero(&hero).await.unwrap();

        let exp = Expedition::new(
            "ruins",
            window(20),
            vec![TaskSpec::new("dig", 2, Demand::new(8.0, 0.0, 0.0))],
        );
        store.insert_expedition(&exp).await.unwrap();

        let scaled = Orchestrator::new(
            Arc::clone(&store) as Arc<dyn EngineStore>,
            CapacityAdjustment::Scaled,
        );
        scaled.process(exp.id).await.unwrap();
        assert_eq!(
            store.load_expedition(exp.id).await.unwrap().status,
            ExpeditionStatus::Error
        );

        // Raw capacity (10 >= 8) would have covered it.
        let exp2 = Expedition::new(
            "ruins again",
            window(25),
            vec![TaskSpec::new("dig", 2, Demand::new(8.0, 0.0, 0.0))],
        );
        store.insert_expedition(&exp2).await.unwrap();
        let raw = Orchestrator::new(
            Arc::clone(&store) as Arc<dyn EngineStore>,
            CapacityAdjustment::Raw,
        );
        raw.process(exp2.id).await.unwrap();
        assert_eq!(
            store.load_expedition(exp2.id).await.unwrap().status,
            ExpeditionStatus::Finished
        );
    }

    #[tokio::test]
    async fn sweep_retries_old_created_expeditions() {
        let store = Arc::new(InMemoryStore::new());
        seed_hero(&store, "w1", HeroCategory::Warrior, 10.0).await;

        let mut stuck = Expedition::new(
            "stuck",
            window(20),
            vec![TaskSpec::new("dig", 2, Demand::new(10.0, 0.0, 0.0))],
        );
        stuck.created_at = Utc::now() - Duration::hours(6);
        store.insert_expedition(&stuck).await.unwrap();

        let orch = orchestrator(&store);
        let retried = orch.sweep_stuck(Duration::hours(1)).await.unwrap();
        assert_eq!(retried, 1);
        assert_eq!(
            store.load_expedition(stuck.id).await.unwrap().status,
            ExpeditionStatus::Finished
        );

        // Nothing left to sweep.
        assert_eq!(orch.sweep_stuck(Duration::hours(1)).await.unwrap(), 0);
    }
}
