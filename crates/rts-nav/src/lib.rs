//! `rts-nav` — the movement core's view of the navigation subsystem.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                |
//! |-----------|---------------------------------------------------------|
//! | [`nav`]   | `Nav` trait: flow-field sampling, destination snapping, |
//! |           | line of sight, blockers, passability, height field      |
//! | [`grid`]  | `GridMap` — a uniform-grid `Nav` implementation used by |
//! |           | tests and demos                                         |
//! | [`avoid`] | `LocalAvoidance` trait, `NoAvoidance`,                  |
//! |           | `SampledAvoidance`                                      |
//!
//! The full navigation stack (flow-field construction, portal graphs, …) is
//! a separate subsystem; the steering code only ever talks to the [`Nav`]
//! trait, so any implementation with the same snapping and blocker semantics
//! can sit behind it.

pub mod avoid;
pub mod grid;
pub mod nav;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use avoid::{AVOID_NEIGHBOUR_RADIUS, AvoidanceAgent, LocalAvoidance, NoAvoidance, SampledAvoidance};
pub use grid::GridMap;
pub use nav::Nav;
