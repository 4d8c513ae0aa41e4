//! Tick observer trait for progress reporting and data collection.

use evo_core::Tick;

use crate::TickReport;

/// Callbacks invoked by [`Scheduler::run_ticks`][crate::Scheduler::run_ticks]
/// around every tick.
///
/// All methods default to no-ops.
///
/// # Example: slow-system logger
///
/// ```rust,ignore
/// struct SlowSystems { budget: Duration }
///
/// impl TickObserver for SlowSystems {
///     fn on_tick_end(&mut self, report: &TickReport) {
///         for timing in report.systems.iter().filter(|t| t.elapsed > self.budget) {
///             eprintln!("{}: {} took {:?}", report.tick, timing.name, timing.elapsed);
///         }
///     }
/// }
/// ```
pub trait TickObserver {
    /// Called before any system runs for `tick`.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called after every system finished `report.tick` without error.
    fn on_tick_end(&mut self, _report: &TickReport) {}

    /// Called once after the last tick of a `run_ticks` call.
    fn on_run_end(&mut self, _next_tick: Tick) {}
}

/// A [`TickObserver`] that does nothing.
pub struct NoopObserver;

impl TickObserver for NoopObserver {}
