//! # Expedition Engine
//!
//! Resource allocation engine for expeditions: given a bundle of tasks with
//! per-category demand and a time window, pick a set of free heroes whose
//! combined capacity covers the demand, then record the outcome.
//!
//! ## Architecture
//!
//! ```text
//!              ┌─────────────────────────┐
//!              │        Engine           │
//!              │  submit() ──▶ spawn()   │
//!              └────────────┬────────────┘
//!                           ▼
//!              ┌─────────────────────────┐
//!              │      Orchestrator       │
//!              └────────────┬────────────┘
//!          availability ──▶ demand ──▶ compat ──▶ picker (×3 categories)
//!                           │
//!                           ▼
//!              ┌─────────────────────────┐
//!              │       EngineStore       │
//!              │   (memory | sqlite)     │
//!              └─────────────────────────┘
//! ```
//!
//! ## Allocation flow
//! 1. Load the expedition with its task list and window
//! 2. Aggregate per-category demand and mean task difficulty
//! 3. Resolve heroes free during the window
//! 4. Scale each hero's capacity by the level compatibility coefficient
//! 5. Greedily cover each category's demand independently
//! 6. Commit reservations + `Finished` status in one transaction, or write
//!    `Error` status in an independent one
//!
//! Allocation runs in the background: `Engine::submit` returns immediately
//! and the expedition status is the only observable outcome.
//!
//! ## Modules
//! - `model`: domain types (heroes, tasks, expeditions, windows, reservations)
//! - `engine`: the allocation core and its orchestrator
//! - `store`: pluggable persistence (in-memory, sqlite)

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;

pub use config::{ConfigError, EngineConfig};
pub use engine::{CapacityAdjustment, Engine, Orchestrator};
pub use error::{AllocationError, StoreError};
pub use model::{
    Demand, Expedition, ExpeditionStatus, Hero, HeroCategory, PickResult, Reservation, TaskSpec,
    TimeWindow,
};
pub use store::{EngineStore, InMemoryStore, SqliteStore};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a fmt subscriber honoring `RUST_LOG`, defaulting to debug-level
/// engine output. Call once from the embedding binary; allocation failures
/// are only ever visible through these logs.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expedition_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
