//! Well-known kernel events.
//!
//! An event is raised by the host (`Kernel::raise_event`) and wakes every
//! task blocked in `await_event` on it, in registration order.  Ids below
//! [`FIRST_USER`] are reserved for the engine.

use rts_core::EventId;

/// The host's periodic 60 Hz tick.  The time server's notifier task lives
/// on this event.
pub const TICK_60HZ: EventId = EventId(0);

/// First event id free for application use.
pub const FIRST_USER: u32 = 64;

/// An application-defined event.
#[inline]
pub fn user_event(n: u32) -> EventId {
    EventId(FIRST_USER + n)
}
