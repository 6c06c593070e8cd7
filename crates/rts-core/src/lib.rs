//! `rts-core` — foundational types for the `rust_rts` engine.
//!
//! This crate is a dependency of every other `rts-*` crate.  It intentionally
//! has no `rts-*` dependencies and no required external ones (only optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module   | Contents                                              |
//! |----------|-------------------------------------------------------|
//! | [`ids`]  | `EntityId`, `DestId`, `TaskId`, `FactionId`, `EventId`|
//! | [`vec`]  | `Vec2` (XZ plane), `Vec3`, `Quat`, `EPSILON`          |
//! | [`time`] | `Tick`, tick-rate constants                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |
//!           | Required by `rts-move` save/load.                   |
//!
//! Error handling is per-crate: each `rts-*` crate defines its own
//! `thiserror` enum close to the operations that can fail.

pub mod ids;
pub mod time;
pub mod vec;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use ids::{DestId, EntityId, EventId, FactionId, TaskId};
pub use time::{KERNEL_TICK_HZ, MOVE_TICK_HZ, MOVE_TICK_RES, Tick};
pub use vec::{EPSILON, Quat, Vec2, Vec3};
