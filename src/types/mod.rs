//! Public types exposed by the `lexcap-core` crate.

pub mod options;
pub mod stats;

pub use options::{ReservationOptions, ReservationOptionsBuilder};
pub use stats::ReservationStats;
