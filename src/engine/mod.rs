//! Pure sky-phase, scoring and recommendation engine
//!
//! Nothing in here performs I/O or keeps state between calls; stateful
//! callers pass stored values in and persist what comes back.
pub mod challenges;
pub mod countdown;
pub mod observability;
pub mod planner;
pub mod recommend;
pub mod recompute;
pub mod sky_phase;
pub mod streaks;

#[cfg(test)]
pub(crate) mod fixtures;

pub use recompute::{recompute, ViewState};
