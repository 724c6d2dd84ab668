#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(test, allow(clippy::uninlined_format_args))]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: errors are spelled out on `LexcapError` instead of per function.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// `i32::MAX as u64` style casts are bounded by the index format.
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]

//! Document-addition reservations for lexical index writers.
//!
//! A `CapacityReservingWriter` keeps a count of documents callers intend to add and refuses
//! reservations that would push the backend past its max-doc ceiling, after first trying to
//! win the room back by merging deleted documents and, failing that, merging every segment.
//! `AggregatedReservation` bundles reservations taken from several writers so an aborted
//! batch can return all of them at once.

/// The lexcap-core crate version (matches `Cargo.toml`).
pub const LEXCAP_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constants;
pub mod error;
pub mod reservation;
pub mod types;
pub mod writer;

pub use constants::*;
pub use error::{LexcapError, Result};
pub use reservation::{AggregatedReservation, Reservation, Withdraw};
pub use types::{ReservationOptions, ReservationOptionsBuilder, ReservationStats};
#[cfg(feature = "lex")]
pub use writer::TantivySegmentWriter;
pub use writer::{CapacityReservingWriter, SegmentWriter};
