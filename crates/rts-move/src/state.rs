//! Per-agent movement state.

use rts_core::{DestId, Vec2};

use crate::tuning::VEL_HIST_LEN;

// ── ArrivalState ──────────────────────────────────────────────────────────────

/// The movement state machine.
///
/// ```text
///             move command                 ‖vdes‖ < ε
///   ARRIVED ───────────────► MOVING ─────────────────► WAITING
///      ▲                        │                          │
///      │   reached target /     │                          │ countdown
///      │   adjacent arrival     │                          │ expires
///      └────────────────────────┘◄─────────────────────────┘
///
///   SEEK_ENEMIES behaves like MOVING but follows the enemy field and
///   belongs to no flock; it shares the WAITING round trip.
/// ```
///
/// ARRIVED and WAITING are the **still** states: the agent contributes a nav
/// blocker and is skipped by the steering passes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ArrivalState {
    Moving,
    Arrived,
    SeekEnemies,
    Waiting,
}

impl ArrivalState {
    /// Still agents rest in place and block the nav surface.
    #[inline]
    pub fn is_still(self) -> bool {
        matches!(self, ArrivalState::Arrived | ArrivalState::Waiting)
    }
}

// ── WaitResume ────────────────────────────────────────────────────────────────

/// Where a waiting agent resumes to once its countdown expires.
///
/// Only recorded when the agent was MOVING: it re-joins the flock for this
/// destination (or a fresh single-member flock if that flock is gone).
#[derive(Copy, Clone, PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct WaitResume {
    pub dest_id: DestId,
    pub target_xz: Vec2,
    pub attack: bool,
}

// ── VelHistory ────────────────────────────────────────────────────────────────

/// Ring buffer of the last [`VEL_HIST_LEN`] chosen velocities.
///
/// The weighted moving average over this window drives orientation: facing
/// follows where the agent has been heading, not the instantaneous velocity,
/// which trades a small visual lag for smooth turning.
#[derive(Clone, PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct VelHistory {
    pub samples: [Vec2; VEL_HIST_LEN],
    /// Index the next sample will be written to.
    pub idx: usize,
}

impl Default for VelHistory {
    fn default() -> Self {
        Self {
            samples: [Vec2::ZERO; VEL_HIST_LEN],
            idx: 0,
        }
    }
}

impl VelHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `v` as the most recent sample, evicting the oldest.
    pub fn push(&mut self, v: Vec2) {
        self.samples[self.idx] = v;
        self.idx = (self.idx + 1) % VEL_HIST_LEN;
    }

    /// Weighted moving average: the most recent sample weighs
    /// `VEL_HIST_LEN`, the oldest weighs 1.
    pub fn weighted_average(&self) -> Vec2 {
        let mut sum = Vec2::ZERO;
        let mut weight_sum = 0.0;
        for age in 0..VEL_HIST_LEN {
            let i = (self.idx + VEL_HIST_LEN - 1 - age) % VEL_HIST_LEN;
            let w = (VEL_HIST_LEN - age) as f32;
            sum += self.samples[i] * w;
            weight_sum += w;
        }
        sum * (1.0 / weight_sum)
    }
}

// ── MoveState ─────────────────────────────────────────────────────────────────

/// The movement record for a single agent.
///
/// Created when the agent is added (state ARRIVED, blocker acquired) and
/// destroyed when it is removed.  `last_stop_pos`/`last_stop_radius` are
/// meaningful only while `blocking` — they name the blocker this record
/// currently holds on the nav surface.
#[derive(Clone, PartialEq, Debug)]
pub struct MoveState {
    pub state: ArrivalState,

    /// Flow-field desired velocity from the last produce pass.
    pub vdes: Vec2,
    /// Velocity chosen for the next integration step.
    pub vnew: Vec2,
    /// Velocity actually used in the last integration step.
    pub velocity: Vec2,

    /// `true` while this agent holds a nav blocker at `last_stop_pos`.
    pub blocking: bool,
    pub last_stop_pos: Vec2,
    pub last_stop_radius: f32,

    /// State to restore once a WAITING period ends.
    pub wait_prev: ArrivalState,
    /// Remaining WAITING ticks.  Positive iff `state == Waiting`.
    pub wait_ticks_left: u32,
    /// Flock to re-join on recovery (MOVING waiters only).
    pub wait_resume: Option<WaitResume>,

    pub vel_hist: VelHistory,
}

impl MoveState {
    /// Fresh state for a newly added agent: arrived, not yet blocking (the
    /// engine acquires the blocker as part of adding the entity).
    pub fn new() -> Self {
        Self {
            state: ArrivalState::Arrived,
            vdes: Vec2::ZERO,
            vnew: Vec2::ZERO,
            velocity: Vec2::ZERO,
            blocking: false,
            last_stop_pos: Vec2::ZERO,
            last_stop_radius: 0.0,
            wait_prev: ArrivalState::Arrived,
            wait_ticks_left: 0,
            wait_resume: None,
            vel_hist: VelHistory::new(),
        }
    }

    /// Zero every velocity channel (used when coming to rest).
    pub fn zero_velocities(&mut self) {
        self.vdes = Vec2::ZERO;
        self.vnew = Vec2::ZERO;
        self.velocity = Vec2::ZERO;
    }
}

impl Default for MoveState {
    fn default() -> Self {
        Self::new()
    }
}
