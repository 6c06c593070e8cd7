//! `rts-entity` — entity identity and world-state storage.
//!
//! # Crate layout
//!
//! | Module    | Contents                                              |
//! |-----------|-------------------------------------------------------|
//! | [`store`] | `EntityStore`, `EntityRec`, `EntityFlags`             |
//! | [`index`] | `PositionIndex` — R-tree radius queries over entities |
//!
//! The movement core reads entity attributes (position, radius, speed,
//! flags) from the store and writes back position and rotation through the
//! exposed setters.  Everything else about entities (health, ownership UI,
//! …) belongs to other subsystems.

pub mod index;
pub mod store;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use index::PositionIndex;
pub use store::{EntityFlags, EntityRec, EntityStore};
