//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` for wire
//! encoding (the kernel message protocols ship raw tids), but callers should
//! prefer the `.index()` helper when indexing slots.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to the type's MAX.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a slot index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Stable unique id of a game entity.  Allocated by the entity store and
    /// never reused, so save files can reference entities across sessions.
    pub struct EntityId(u32);
}

typed_id! {
    /// Opaque handle for a reachable destination region on the nav surface.
    /// Two positions snap to the same `DestId` iff they are reachable along
    /// the same connected navigable region near the target.
    pub struct DestId(u32);
}

typed_id! {
    /// Task identifier, unique while the task is alive.  `INVALID` doubles
    /// as the "name not found" wire sentinel of the name server; `create`
    /// can never return it because tids allocate sequentially from 0.
    pub struct TaskId(u32);
}

typed_id! {
    /// Faction (player/team) identifier.  `u16` keeps per-entity storage
    /// compact (max 65,535 factions).
    pub struct FactionId(u16);
}

typed_id! {
    /// Kernel event identifier.  Well-known events get named constants
    /// (`rts_kernel::event::TICK_60HZ`); hosts may define their own above
    /// the reserved range.
    pub struct EventId(u32);
}
