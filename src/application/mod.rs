//! Application layer: the pack → submit → unpack round trip.

pub mod collect;
pub mod error;
pub mod round_trip;
