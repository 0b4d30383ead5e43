//! Level compatibility between hero proficiency and task difficulty.

use serde::{Deserialize, Serialize};

use crate::model::Hero;

/// Coefficient table indexed by `[hero_level - 1][bucket - 1]`.
///
/// A hero whose proficiency matches the task bucket gets 1.0; mismatches
/// are penalized asymmetrically — a level-1 hero on hard tasks loses far
/// more capacity than a level-3 hero gains on easy ones. Values are
/// reciprocals of the underlying task-suitability matrix, kept to three
/// significant digits.
const COEFFICIENTS: [[f64; 3]; 3] = [
    [1.0, 0.625, 0.435],
    [1.124, 1.0, 0.556],
    [1.667, 1.25, 1.0],
];

/// Bucket a mean task level into 1 (easy), 2 (medium), or 3 (hard).
pub fn bucket(mean_task_level: f64) -> u8 {
    if mean_task_level <= 1.5 {
        1
    } else if mean_task_level <= 2.5 {
        2
    } else {
        3
    }
}

/// Multiplier applied to a hero's capacity for tasks of the given mean
/// difficulty. Levels outside `1..=3` are clamped.
pub fn coefficient(hero_level: u8, mean_task_level: f64) -> f64 {
    let row = usize::from(hero_level.clamp(1, 3)) - 1;
    let col = usize::from(bucket(mean_task_level)) - 1;
    COEFFICIENTS[row][col]
}

/// Whether the picker sees compatibility-scaled capacity or the raw value.
///
/// Kept as an explicit switch so both interpretations stay testable; the
/// engine defaults to `Scaled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityAdjustment {
    #[default]
    Scaled,
    Raw,
}

impl CapacityAdjustment {
    /// Capacity the hero contributes toward demand of the given mean level.
    pub fn effective(&self, hero: &Hero, mean_task_level: f64) -> f64 {
        match self {
            CapacityAdjustment::Scaled => hero.capacity * coefficient(hero.level, mean_task_level),
            CapacityAdjustment::Raw => hero.capacity,
        }
    }

    pub fn parse(value: &str) -> Option<CapacityAdjustment> {
        match value {
            "scaled" => Some(CapacityAdjustment::Scaled),
            "raw" => Some(CapacityAdjustment::Raw),
            _ => None,
        }
    }
}
