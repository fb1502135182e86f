//! Process-level helpers for the `payintent` binary.

mod sig_down;
mod telemetry;

pub use sig_down::SigDown;
pub use telemetry::init_tracing;
