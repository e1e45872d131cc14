//! Checkpoint schedulers: pure functions from `(n_checkpoints, n_timesteps)`
//! (or, for the multi-level case, an `Architecture`) to a stream of
//! `Action`s, with no knowledge of storage or of the operator being
//! checkpointed.

mod classic;
mod combinatorics;
mod hrevolve;

pub use classic::ClassicRevolve;
pub use hrevolve::HRevolve;

use revolve_model::Action;

/// A source of `Action`s for the driver to execute. `next()` is infallible
/// and, per §4.2/§4.3, keeps returning `Terminate` forever once the
/// schedule is exhausted.
pub trait Scheduler {
    fn next(&mut self) -> Action;

    fn n_timesteps(&self) -> u32;

    /// Total forward recomputation divided by `n_timesteps` (§6); 1.0 means
    /// no recomputation beyond the single pass.
    fn ratio(&self) -> f64;

    /// Predicted wall-clock cost under the architecture's `(w, r)` weights,
    /// when the scheduler is able to estimate one (H-Revolve's DP table
    /// gives this for free; Classic Revolve has no such estimate).
    fn makespan(&self) -> Option<f64> {
        None
    }
}
