//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  Two fixed rates share
//! it: the kernel raises its periodic event at [`KERNEL_TICK_HZ`] (60 Hz) and
//! the movement simulation advances at [`MOVE_TICK_HZ`] (20 Hz) — one
//! movement step every three kernel ticks.  Using an integer tick as the
//! canonical unit keeps all wake-up arithmetic exact; float time appears only
//! inside one steering step, never across steps.

use std::fmt;

/// The kernel's periodic event rate.  The time server counts these ticks.
pub const KERNEL_TICK_HZ: u32 = 60;

/// The movement simulation rate.
pub const MOVE_TICK_HZ: u32 = 20;

/// Divisor converting a per-second speed to a per-movement-tick speed.
///
/// An entity with `max_speed` world units per second covers at most
/// `max_speed / MOVE_TICK_RES` units in one steering step.
pub const MOVE_TICK_RES: f32 = MOVE_TICK_HZ as f32;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute tick counter.
///
/// Stored as `u64` to avoid overflow: at 60 ticks/second a u64 lasts ~9.7
/// billion years — longer than any conceivable session.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0 - earlier.0
    }

    /// Advance by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.0 += 1;
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}
