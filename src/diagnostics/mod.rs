//! Run diagnostics: per-surface sweep counters and stage timings.
//!
//! These are reported alongside the estimates so runs can be compared
//! without re-enabling debug logging.

pub mod sweep;
pub mod timing;

pub use sweep::{SurfaceDiagnostics, SweepStats};
pub use timing::{StageTiming, TimingBreakdown};
