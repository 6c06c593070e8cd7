//! Local collision avoidance — the ClearPath-shaped velocity primitive.
//!
//! The steering loop hands an avoider its preferred velocity plus the nearby
//! agents split into *dynamic* (moving) and *stationary* (at rest) sets, and
//! gets back the velocity closest to the preference that avoids imminent
//! collision.  The trait keeps the primitive swappable: [`NoAvoidance`] for
//! tests that pin pure steering behaviour, [`SampledAvoidance`] as a usable
//! default.

use rts_core::{EPSILON, Vec2};

/// Radius of the neighbour query feeding the avoidance primitive.
pub const AVOID_NEIGHBOUR_RADIUS: f32 = 40.0;

/// How far ahead (in ticks) [`SampledAvoidance`] scans for collisions.
const SAMPLE_HORIZON_TICKS: f32 = 30.0;

/// Penalty weight for time-to-collision vs. deviation from the preference.
const SAMPLE_TTC_WEIGHT: f32 = 8.0;

/// Candidate directions, as rotations of the preferred velocity (radians).
const SAMPLE_ANGLES: [f32; 9] = [
    0.0, 0.262, -0.262, 0.524, -0.524, 1.047, -1.047, 1.571, -1.571,
];

/// Candidate speed factors applied to each sampled direction.
const SAMPLE_SPEEDS: [f32; 3] = [1.0, 0.5, 0.25];

// ── Neighbour descriptor ──────────────────────────────────────────────────────

/// One nearby agent as seen by the avoidance primitive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AvoidanceAgent {
    /// Position on the nav plane.
    pub pos: Vec2,
    /// Per-tick velocity used in the last integration step.
    pub vel: Vec2,
    /// Collision radius.
    pub radius: f32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// A local-avoidance primitive: picks the velocity closest to `vpref` that
/// does not lead to an imminent collision with the listed neighbours.
pub trait LocalAvoidance: Send + Sync {
    /// Choose a velocity for `agent`.
    ///
    /// `dynamic` holds moving neighbours (their velocities are this tick's
    /// consistent snapshot), `stationary` holds resting ones.  The returned
    /// velocity is in per-tick units like `vpref`.
    fn new_velocity(
        &self,
        agent:      &AvoidanceAgent,
        vpref:      Vec2,
        dynamic:    &[AvoidanceAgent],
        stationary: &[AvoidanceAgent],
    ) -> Vec2;
}

/// Pass-through avoider: always returns the preferred velocity.
///
/// Useful in tests that pin the steering pipeline without avoidance effects.
pub struct NoAvoidance;

impl LocalAvoidance for NoAvoidance {
    fn new_velocity(
        &self,
        _agent:      &AvoidanceAgent,
        vpref:       Vec2,
        _dynamic:    &[AvoidanceAgent],
        _stationary: &[AvoidanceAgent],
    ) -> Vec2 {
        vpref
    }
}

// ── SampledAvoidance ──────────────────────────────────────────────────────────

/// Velocity sampling over rotated/scaled candidates of the preference.
///
/// Each candidate is scored by deviation from `vpref` plus a penalty that
/// grows as its earliest time-to-collision (against the relative velocity of
/// each neighbour) falls inside the scan horizon.  The zero velocity is
/// always a candidate, so a fully boxed-in agent stops instead of pushing
/// through.
pub struct SampledAvoidance;

impl SampledAvoidance {
    /// Earliest collision time of a candidate velocity against one
    /// neighbour, or `None` if they never close within the horizon.
    fn time_to_collision(
        agent:     &AvoidanceAgent,
        candidate: Vec2,
        other:     &AvoidanceAgent,
    ) -> Option<f32> {
        let rel_pos = other.pos - agent.pos;
        let rel_vel = candidate - other.vel;
        let r_sum   = agent.radius + other.radius;

        // Already overlapping: immediate collision.
        if rel_pos.len() <= r_sum {
            return Some(0.0);
        }

        // Solve |rel_pos − rel_vel·t| = r_sum for the smallest positive t.
        let a = rel_vel.len_sq();
        if a < EPSILON * EPSILON {
            return None;
        }
        let b = -2.0 * rel_pos.dot(rel_vel);
        let c = rel_pos.len_sq() - r_sum * r_sum;
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let t = (-b - disc.sqrt()) / (2.0 * a);
        (t >= 0.0 && t <= SAMPLE_HORIZON_TICKS).then_some(t)
    }

    fn penalty(
        agent:      &AvoidanceAgent,
        candidate:  Vec2,
        vpref:      Vec2,
        dynamic:    &[AvoidanceAgent],
        stationary: &[AvoidanceAgent],
    ) -> f32 {
        let mut penalty = candidate.dist(vpref);
        let neighbours = dynamic.iter().chain(stationary.iter());
        for other in neighbours {
            if let Some(ttc) = Self::time_to_collision(agent, candidate, other) {
                penalty += SAMPLE_TTC_WEIGHT * (SAMPLE_HORIZON_TICKS - ttc)
                    / SAMPLE_HORIZON_TICKS;
            }
        }
        penalty
    }
}

impl LocalAvoidance for SampledAvoidance {
    fn new_velocity(
        &self,
        agent:      &AvoidanceAgent,
        vpref:      Vec2,
        dynamic:    &[AvoidanceAgent],
        stationary: &[AvoidanceAgent],
    ) -> Vec2 {
        if vpref.is_near_zero() {
            return vpref;
        }

        let mut best = Vec2::ZERO;
        let mut best_penalty = Self::penalty(agent, Vec2::ZERO, vpref, dynamic, stationary);

        for &angle in &SAMPLE_ANGLES {
            let (sin, cos) = angle.sin_cos();
            let dir = Vec2::new(
                vpref.x * cos - vpref.z * sin,
                vpref.x * sin + vpref.z * cos,
            );
            for &speed in &SAMPLE_SPEEDS {
                let candidate = dir * speed;
                let p = Self::penalty(agent, candidate, vpref, dynamic, stationary);
                if p < best_penalty {
                    best = candidate;
                    best_penalty = p;
                }
            }
        }
        best
    }
}
