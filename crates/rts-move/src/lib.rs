//! `rts-move` — the flock-based movement core of the `rust_rts` engine.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`state`]  | `ArrivalState`, `MoveState`, `VelHistory`, `WaitResume`   |
//! | [`flock`]  | `Flock`                                                   |
//! | [`forces`] | Steering forces, priority cascade, integration            |
//! | [`engine`] | `MoveEngine` — commands, blocker bookkeeping, the tick    |
//! | [`save`]   | Save/load of movement state                               |
//! | [`events`] | `MotionEvent`                                             |
//! | [`tuning`] | The steering constant table                               |
//! | [`error`]  | `MoveError`, `MoveResult<T>`                              |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                               |
//! |------------|------------------------------------------------------|
//! | `parallel` | Rayon-parallel velocity produce pass in the tick.    |

pub mod engine;
pub mod error;
pub mod events;
pub mod flock;
pub mod forces;
pub mod save;
pub mod state;
pub mod tuning;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use engine::{ClickMode, MoveEngine};
pub use error::{MoveError, MoveResult};
pub use events::MotionEvent;
pub use flock::Flock;
pub use state::{ArrivalState, MoveState, VelHistory, WaitResume};
