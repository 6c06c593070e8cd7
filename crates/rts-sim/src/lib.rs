//! `rts-sim` — session orchestration for the `rust_rts` engine.
//!
//! Wires the two cores together: the kernel's time server drives a periodic
//! movement task at 20 Hz (three 60 Hz kernel ticks per steering step), and
//! the host drives the kernel by raising the tick event once per frame slice.
//!
//! # Crate layout
//!
//! | Module       | Contents                                   |
//! |--------------|--------------------------------------------|
//! | [`sim`]      | `Sim`, `World`, `MouseButton`              |
//! | [`builder`]  | `SimBuilder`                               |
//! | [`observer`] | `SimObserver`, `NoopObserver`              |
//! | [`error`]    | `SimError`, `SimResult<T>`                 |

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{MouseButton, Sim, World};
