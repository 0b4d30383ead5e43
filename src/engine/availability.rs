//! Free-pool resolution for a query window.
//!
//! The store answers "which reservations conflict with this window" (the
//! sqlite backend does it in SQL, the memory backend via
//! [`TimeWindow::conflicts_with`]); this module is the pure half that turns
//! the conflict list into the candidate pool.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::model::{Hero, HeroCategory, Reservation};

/// Candidates minus every hero holding a conflicting reservation.
///
/// No side effects; store failures are the caller's to propagate.
pub fn free_heroes(candidates: &[Hero], conflicting: &[Reservation]) -> Vec<Hero> {
    let banned: HashSet<Uuid> = conflicting.iter().map(|r| r.hero_id).collect();
    candidates
        .iter()
        .filter(|h| !banned.contains(&h.id))
        .cloned()
        .collect()
}

/// Split a pool by category so each one can be solved independently.
pub fn by_category(heroes: Vec<Hero>) -> HashMap<HeroCategory, Vec<Hero>> {
    let mut pools: HashMap<HeroCategory, Vec<Hero>> = HashMap::new();
    for hero in heroes {
        pools.entry(hero.category).or_default().push(hero);
    }
    pools
}
