//! Infrastructure adapters: archive codec, HTTP transport and telemetry.

pub mod archive;
pub mod error;
pub mod telemetry;
pub mod transport;
