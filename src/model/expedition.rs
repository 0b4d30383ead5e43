//! Expeditions and their allocation lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::hero::HeroCategory;
use super::task::TaskSpec;
use super::window::TimeWindow;

/// Per-category capacity, either required by tasks or written back to a
/// finished expedition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub warrior: f64,
    pub magician: f64,
    pub strategist: f64,
}

impl Demand {
    pub fn new(warrior: f64, magician: f64, strategist: f64) -> Self {
        Self {
            warrior,
            magician,
            strategist,
        }
    }

    pub fn get(&self, category: HeroCategory) -> f64 {
        match category {
            HeroCategory::Warrior => self.warrior,
            HeroCategory::Magician => self.magician,
            HeroCategory::Strategist => self.strategist,
        }
    }

    pub fn total(&self) -> f64 {
        self.warrior + self.magician + self.strategist
    }

    /// Component-wise accumulation, used when summing task demand.
    pub fn accumulate(&mut self, other: &Demand) {
        self.warrior += other.warrior;
        self.magician += other.magician;
        self.strategist += other.strategist;
    }
}

/// Lifecycle state of an expedition.
///
/// # State Machine
/// ```text
/// Created -> Finished
///        \-> Error
/// ```
/// `Finished` and `Error` are terminal; nothing transitions out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpeditionStatus {
    /// Allocation has not run (or has not finished running) yet.
    Created,
    /// Allocation succeeded; reservations exist and demand is written back.
    Finished,
    /// Allocation failed; details are only in the logs.
    Error,
}

impl ExpeditionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExpeditionStatus::Finished | ExpeditionStatus::Error)
    }

    /// Stable lowercase name, also used as the storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpeditionStatus::Created => "created",
            ExpeditionStatus::Finished => "finished",
            ExpeditionStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<ExpeditionStatus> {
        match value {
            "created" => Some(ExpeditionStatus::Created),
            "finished" => Some(ExpeditionStatus::Finished),
            "error" => Some(ExpeditionStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExpeditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid expedition transition from {from} to {to}")]
pub struct StatusError {
    pub from: ExpeditionStatus,
    pub to: ExpeditionStatus,
}

/// A bundle of tasks to be staffed within a time window.
///
/// Created in `Created` state with tasks already attached; the allocation
/// run moves it to `Finished` (writing aggregated demand back) or `Error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expedition {
    pub id: Uuid,
    pub name: String,
    pub window: TimeWindow,
    pub status: ExpeditionStatus,
    pub tasks: Vec<TaskSpec>,
    /// Aggregated demand, present only once the expedition is finished.
    pub demand: Option<Demand>,
    pub created_at: DateTime<Utc>,
}

impl Expedition {
    pub fn new(name: impl Into<String>, window: TimeWindow, tasks: Vec<TaskSpec>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            window,
            status: ExpeditionStatus::Created,
            tasks,
            demand: None,
            created_at: Utc::now(),
        }
    }

    /// Transition to `Finished`, recording the aggregated demand.
    ///
    /// # Errors
    /// Returns `StatusError` unless the expedition is in `Created` state.
    pub fn finish(&mut self, demand: Demand) -> Result<(), StatusError> {
        match self.status {
            ExpeditionStatus::Created => {
                self.status = ExpeditionStatus::Finished;
                self.demand = Some(demand);
                Ok(())
            }
            from => Err(StatusError {
                from,
                to: ExpeditionStatus::Finished,
            }),
        }
    }

    /// Transition to `Error`.
    ///
    /// # Errors
    /// Returns `StatusError` unless the expedition is in `Created` state.
    pub fn fail(&mut self) -> Result<(), StatusError> {
        match self.status {
            ExpeditionStatus::Created => {
                self.status = ExpeditionStatus::Error;
                Ok(())
            }
            from => Err(StatusError {
                from,
                to: ExpeditionStatus::Error,
            }),
        }
    }
}

/// Outcome of one allocation attempt: the selected heroes (all categories
/// concatenated) and the demand the selection covers. Transient; the
/// orchestrator projects it into reservations plus expedition updates.
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    pub heroes: Vec<Uuid>,
    pub demand: Demand,
}
