//! Domain types for the allocation engine.
//!
//! Everything here is a plain data snapshot: heroes come from the catalog,
//! tasks are frozen once an expedition is created, and reservations are the
//! only record the engine writes back. Mutation happens exclusively through
//! the explicit transitions on [`Expedition`].

mod expedition;
mod hero;
mod reservation;
mod task;
mod window;

pub use expedition::{Demand, Expedition, ExpeditionStatus, PickResult, StatusError};
pub use hero::{Hero, HeroCategory};
pub use reservation::Reservation;
pub use task::TaskSpec;
pub use window::{TimeWindow, WindowError};
