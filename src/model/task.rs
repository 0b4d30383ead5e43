//! Task specifications attached to an expedition.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::expedition::Demand;

/// A single unit of work inside an expedition.
///
/// Immutable once an allocation run starts: the engine aggregates demand
/// from the task list but never writes tasks back.
///
/// # Invariants
/// - `level` is in `1..=3`
/// - all demand components are `>= 0.0`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: Uuid,
    pub name: String,
    /// Difficulty level, 1 (easy) through 3 (hard).
    pub level: u8,
    /// Per-category capacity this task requires.
    pub demand: Demand,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, level: u8, demand: Demand) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            level,
            demand,
        }
    }
}
