//! Hero reservations written on successful allocation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::window::TimeWindow;

/// A hero committed to an expedition for a time window.
///
/// Created only when a whole allocation attempt succeeds. A hero may hold
/// many reservations as long as their windows do not conflict; the
/// availability check treats any conflicting reservation as a ban.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub hero_id: Uuid,
    pub expedition_id: Uuid,
    pub window: TimeWindow,
}

impl Reservation {
    pub fn new(hero_id: Uuid, expedition_id: Uuid, window: TimeWindow) -> Self {
        Self {
            hero_id,
            expedition_id,
            window,
        }
    }
}
