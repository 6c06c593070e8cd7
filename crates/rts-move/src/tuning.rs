//! Steering tuning constants.
//!
//! These values are tuned as a set: the force scales, decay curves, and radii
//! balance each other, and changing one in isolation reintroduces the
//! oscillation artifacts the exponential decays exist to remove.  Treat the
//! whole table as one knob.

/// Force→acceleration divisor.
pub const ENTITY_MASS: f32 = 1.0;

/// Per-tick steering force magnitude cap.
pub const MAX_FORCE: f32 = 0.75;

/// Scale applied to the separation force in the combined total.
pub const SEPARATION_FORCE_SCALE: f32 = 0.6;

/// Scale applied to the arrival force in the combined total.
pub const ARRIVE_FORCE_SCALE: f32 = 0.5;

/// Scale applied to the cohesion force in the combined total.
pub const COHESION_FORCE_SCALE: f32 = 0.15;

/// Neighbour query radius for the separation force.
pub const SEPARATION_NEIGHB_RADIUS: f32 = 30.0;

/// Weighting radius for the cohesion centre-of-mass.
pub const COHESION_NEIGHBOUR_RADIUS: f32 = 50.0;

/// Neighbour radius for the alignment force.
pub const ALIGN_NEIGHBOUR_RADIUS: f32 = 10.0;

/// Radius within which the arrival force decelerates linearly.
pub const ARRIVE_SLOWING_RADIUS: f32 = 10.0;

/// Distance to the flock target below which an agent counts as arrived.
pub const ARRIVE_THRESHOLD_DIST: f32 = 5.0;

/// Extra gap allowed by the flockmate adjacency test.
pub const ADJACENCY_SEP_DIST: f32 = 5.0;

/// Extra gap added to combined radii by the separation force.
pub const SEPARATION_BUFFER_DIST: f32 = 0.0;

/// How many movement ticks an agent stays in the waiting state.
pub const WAIT_TICKS: u32 = 60;

/// Orientation-smoothing window length.
pub const VEL_HIST_LEN: usize = 14;
