//! SQLite-backed engine store.
//!
//! Window endpoints are stored as UTC microsecond timestamps so the overlap
//! predicate can run as plain integer comparisons in SQL. Task lists ride
//! along as a JSON column; they are opaque to every query.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::EngineStore;
use crate::error::StoreError;
use crate::model::{
    Demand, Expedition, ExpeditionStatus, Hero, HeroCategory, Reservation, TaskSpec, TimeWindow,
};

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS expeditions (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'created',
    window_start INTEGER NOT NULL,
    window_end INTEGER NOT NULL,
    warrior_demand REAL,
    magician_demand REAL,
    strategist_demand REAL,
    total_demand REAL,
    tasks_json TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_expeditions_status ON expeditions(status, created_at);

CREATE TABLE IF NOT EXISTS heroes (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    level INTEGER NOT NULL,
    capacity REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS reservations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hero_id TEXT NOT NULL,
    expedition_id TEXT NOT NULL,
    window_start INTEGER NOT NULL,
    window_end INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reservations_window ON reservations(window_start, window_end);
CREATE INDEX IF NOT EXISTS idx_reservations_expedition ON reservations(expedition_id);
"#;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Fully in-memory database, handy for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn from_micros(value: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(value)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp {value} out of range")))
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::Corrupt(format!("bad uuid {value}: {e}")))
}

fn window_from_row(start: i64, end: i64) -> Result<TimeWindow, StoreError> {
    TimeWindow::new(from_micros(start)?, from_micros(end)?)
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[async_trait]
impl EngineStore for SqliteStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn load_expedition(&self, id: Uuid) -> Result<Expedition, StoreError> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                "SELECT id, name, status, window_start, window_end,
                        warrior_demand, magician_demand, strategist_demand,
                        tasks_json, created_at
                 FROM expeditions WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<f64>>(5)?,
                        row.get::<_, Option<f64>>(6)?,
                        row.get::<_, Option<f64>>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, i64>(9)?,
                    ))
                },
            )
            .optional()?;
        let Some((id_s, name, status, ws, we, w, m, s, tasks_json, created_at)) = row else {
            return Err(StoreError::NotFound(id));
        };

        let status = ExpeditionStatus::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown expedition status {status}")))?;
        let tasks: Vec<TaskSpec> = serde_json::from_str(&tasks_json)
            .map_err(|e| StoreError::Corrupt(format!("bad task list json: {e}")))?;
        let demand = match (w, m, s) {
            (Some(w), Some(m), Some(s)) => Some(Demand::new(w, m, s)),
            _ => None,
        };
        Ok(Expedition {
            id: parse_uuid(&id_s)?,
            name,
            window: window_from_row(ws, we)?,
            status,
            tasks,
            demand,
            created_at: from_micros(created_at)?,
        })
    }

    async fn insert_expedition(&self, expedition: &Expedition) -> Result<(), StoreError> {
        let tasks_json = serde_json::to_string(&expedition.tasks)
            .map_err(|e| StoreError::Corrupt(format!("unserializable task list: {e}")))?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO expeditions
                (id, name, status, window_start, window_end,
                 warrior_demand, magician_demand, strategist_demand, total_demand,
                 tasks_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                expedition.id.to_string(),
                expedition.name,
                expedition.status.as_str(),
                micros(expedition.window.start),
                micros(expedition.window.end),
                expedition.demand.map(|d| d.warrior),
                expedition.demand.map(|d| d.magician),
                expedition.demand.map(|d| d.strategist),
                expedition.demand.map(|d| d.total()),
                tasks_json,
                micros(expedition.created_at),
            ],
        )?;
        Ok(())
    }

    async fn list_heroes(&self) -> Result<Vec<Hero>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare("SELECT id, name, category, level, capacity FROM heroes ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u8>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?;
        let mut heroes = Vec::new();
        for row in rows {
            let (id, name, category, level, capacity) = row?;
            heroes.push(Hero {
                id: parse_uuid(&id)?,
                name,
                category: HeroCategory::parse(&category).ok_or_else(|| {
                    StoreError::Corrupt(format!("unknown hero category {category}"))
                })?,
                level,
                capacity,
            });
        }
        Ok(heroes)
    }

    async fn insert_hero(&self, hero: &Hero) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO heroes (id, name, category, level, capacity)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                hero.id.to_string(),
                hero.name,
                hero.category.as_str(),
                hero.level,
                hero.capacity,
            ],
        )?;
        Ok(())
    }

    async fn list_overlapping(&self, window: &TimeWindow) -> Result<Vec<Reservation>, StoreError> {
        // Same three clauses as TimeWindow::conflicts_with.
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT hero_id, expedition_id, window_start, window_end
             FROM reservations
             WHERE (window_start <= ?1 AND window_end >= ?1)
                OR (window_end <= ?2 AND window_start >= ?2)
                OR (window_start >= ?1 AND window_end <= ?2)",
        )?;
        let rows = stmt.query_map(
            params![micros(window.start), micros(window.end)],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )?;
        let mut reservations = Vec::new();
        for row in rows {
            let (hero_id, expedition_id, start, end) = row?;
            reservations.push(Reservation {
                hero_id: parse_uuid(&hero_id)?,
                expedition_id: parse_uuid(&expedition_id)?,
                window: window_from_row(start, end)?,
            });
        }
        Ok(reservations)
    }

    async fn commit_success(
        &self,
        expedition_id: Uuid,
        reservations: &[Reservation],
        demand: Demand,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE expeditions
             SET status = ?2, warrior_demand = ?3, magician_demand = ?4,
                 strategist_demand = ?5, total_demand = ?6
             WHERE id = ?1 AND status = ?7",
            params![
                expedition_id.to_string(),
                ExpeditionStatus::Finished.as_str(),
                demand.warrior,
                demand.magician,
                demand.strategist,
                demand.total(),
                ExpeditionStatus::Created.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(expedition_id));
        }
        for reservation in reservations {
            tx.execute(
                "INSERT INTO reservations (hero_id, expedition_id, window_start, window_end)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    reservation.hero_id.to_string(),
                    reservation.expedition_id.to_string(),
                    micros(reservation.window.start),
                    micros(reservation.window.end),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn mark_error(&self, expedition_id: Uuid) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE expeditions SET status = ?2 WHERE id = ?1 AND status = ?3",
            params![
                expedition_id.to_string(),
                ExpeditionStatus::Error.as_str(),
                ExpeditionStatus::Created.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(expedition_id));
        }
        Ok(())
    }

    async fn list_stuck(&self, created_before: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id FROM expeditions
             WHERE status = ?1 AND created_at < ?2
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(
            params![ExpeditionStatus::Created.as_str(), micros(created_before)],
            |row| row.get::<_, String>(0),
        )?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(parse_uuid(&row?)?);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(start_h: u32, end_h: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 3, 20, start_h, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 20, end_h, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn sample_expedition() -> Expedition {
        Expedition::new(
            "ruins",
            window(8, 18),
            vec![TaskSpec::new("dig", 2, Demand::new(4.0, 2.0, 0.0))],
        )
    }

    #[tokio::test]
    async fn expedition_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let exp = sample_expedition();
        store.insert_expedition(&exp).await.unwrap();

        let loaded = store.load_expedition(exp.id).await.unwrap();
        assert_eq!(loaded.id, exp.id);
        assert_eq!(loaded.status, ExpeditionStatus::Created);
        assert_eq!(loaded.window, exp.window);
        assert_eq!(loaded.tasks.len(), 1);
        assert!(loaded.demand.is_none());
    }

    #[tokio::test]
    async fn missing_expedition_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.load_expedition(Uuid::new_v4()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn hero_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let hero = Hero::new("aria", HeroCategory::Magician, 2, 10.0);
        store.insert_hero(&hero).await.unwrap();
        let heroes = store.list_heroes().await.unwrap();
        assert_eq!(heroes.len(), 1);
        assert_eq!(heroes[0].id, hero.id);
        assert_eq!(heroes[0].category, HeroCategory::Magician);
    }

    #[tokio::test]
    async fn overlap_query_matches_window_semantics() {
        let store = SqliteStore::open_in_memory().unwrap();
        let exp = sample_expedition();
        store.insert_expedition(&exp).await.unwrap();

        let touching = Reservation::new(Uuid::new_v4(), exp.id, window(6, 8));
        let inside = Reservation::new(Uuid::new_v4(), exp.id, window(10, 12));
        let before = Reservation::new(Uuid::new_v4(), exp.id, window(1, 5));
        store
            .commit_success(
                exp.id,
                &[touching.clone(), inside.clone(), before],
                Demand::default(),
            )
            .await
            .unwrap();

        let overlapping = store.list_overlapping(&window(8, 18)).await.unwrap();
        let ids: Vec<Uuid> = overlapping.iter().map(|r| r.hero_id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&touching.hero_id));
        assert!(ids.contains(&inside.hero_id));
    }

    #[tokio::test]
    async fn commit_success_is_atomic_and_guarded_by_status() {
        let store = SqliteStore::open_in_memory().unwrap();
        let exp = sample_expedition();
        store.insert_expedition(&exp).await.unwrap();
        store.mark_error(exp.id).await.unwrap();

        // Status is terminal now; the commit must not land any reservation.
        let res = Reservation::new(Uuid::new_v4(), exp.id, window(8, 18));
        let err = store
            .commit_success(exp.id, &[res], Demand::default())
            .await;
        assert!(err.is_err());
        assert!(store
            .list_overlapping(&window(8, 18))
            .await
            .unwrap()
            .is_empty());
        let loaded = store.load_expedition(exp.id).await.unwrap();
        assert_eq!(loaded.status, ExpeditionStatus::Error);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.db");
        let exp = sample_expedition();
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_expedition(&exp).await.unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.is_persistent());
        assert_eq!(store.load_expedition(exp.id).await.unwrap().id, exp.id);
    }
}
