//! Demand aggregation over an expedition's task list.

use crate::error::AllocationError;
use crate::model::{Demand, TaskSpec};

/// Sum per-category demand across all tasks.
pub fn aggregate(tasks: &[TaskSpec]) -> Demand {
    let mut total = Demand::default();
    for task in tasks {
        total.accumulate(&task.demand);
    }
    total
}

/// Arithmetic mean of the task difficulty levels.
///
/// # Errors
/// `EmptyTaskList` if there are no tasks; the mean of zero tasks is
/// undefined and the whole allocation attempt must abort before any
/// resource query.
pub fn mean_level(tasks: &[TaskSpec]) -> Result<f64, AllocationError> {
    if tasks.is_empty() {
        return Err(AllocationError::EmptyTaskList);
    }
    let sum: f64 = tasks.iter().map(|t| f64::from(t.level)).sum();
    Ok(sum / tasks.len() as f64)
}
