//! Session observer trait for progress reporting and event taps.

use rts_core::Tick;
use rts_move::MotionEvent;

/// Callbacks invoked by [`Sim::run_ticks`][crate::Sim::run_ticks] at key
/// points of each kernel tick.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — motion logger
///
/// ```rust,ignore
/// struct MotionLogger;
///
/// impl SimObserver for MotionLogger {
///     fn on_motion(&mut self, tick: Tick, event: MotionEvent) {
///         println!("{tick}: {event:?}");
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called before the tick's event is raised.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called after the scheduler has drained for this tick.
    fn on_tick_end(&mut self, _tick: Tick) {}

    /// Called once per motion event the movement core emitted this tick.
    fn on_motion(&mut self, _tick: Tick, _event: MotionEvent) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call
/// `run_ticks` but don't want callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
