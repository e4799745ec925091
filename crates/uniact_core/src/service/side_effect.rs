//! Best-effort side-effect executor.
//!
//! # Responsibility
//! - Run notification/audit side effects with a single, uniform
//!   failure-isolation contract: errors are logged and swallowed, never
//!   propagated to the triggering lifecycle operation.
//!
//! # Invariants
//! - `run_best_effort` never returns an error and never panics on one.

use log::warn;
use std::fmt::Display;

/// Runs `op`; on failure emits one warn event and returns `None`.
pub(crate) fn run_best_effort<T, E: Display>(
    event: &str,
    op: impl FnOnce() -> Result<T, E>,
) -> Option<T> {
    match op() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("event={event} module=side_effect status=swallowed error={err}");
            None
        }
    }
}
