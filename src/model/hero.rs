//! Hero catalog entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Demand class a hero belongs to. Allocation is solved independently per
/// category; a hero only ever contributes capacity to its own class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeroCategory {
    Warrior,
    Magician,
    Strategist,
}

impl HeroCategory {
    pub const ALL: [HeroCategory; 3] = [
        HeroCategory::Warrior,
        HeroCategory::Magician,
        HeroCategory::Strategist,
    ];

    /// Stable lowercase name, also used as the storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HeroCategory::Warrior => "warrior",
            HeroCategory::Magician => "magician",
            HeroCategory::Strategist => "strategist",
        }
    }

    pub fn parse(value: &str) -> Option<HeroCategory> {
        match value {
            "warrior" => Some(HeroCategory::Warrior),
            "magician" => Some(HeroCategory::Magician),
            "strategist" => Some(HeroCategory::Strategist),
            _ => None,
        }
    }
}

impl std::fmt::Display for HeroCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An allocatable unit from the hero catalog.
///
/// The engine only ever reads a snapshot of the catalog; heroes are owned
/// and mutated elsewhere.
///
/// # Invariants
/// - `level` is in `1..=3`
/// - `capacity >= 0.0`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hero {
    pub id: Uuid,
    pub name: String,
    pub category: HeroCategory,
    /// Proficiency level, 1 (novice) through 3 (veteran).
    pub level: u8,
    /// Raw scalar capacity ("mana") before any compatibility scaling.
    pub capacity: f64,
}

impl Hero {
    pub fn new(name: impl Into<String>, category: HeroCategory, level: u8, capacity: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
            level,
            capacity,
        }
    }
}
