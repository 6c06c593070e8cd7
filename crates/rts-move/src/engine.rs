//! The movement engine: flock registry, steering tick, blocker bookkeeping.
//!
//! # Tick structure
//!
//! Each 20 Hz tick runs two passes over the moving agents:
//!
//! 1. **Produce** — for every moving agent compute the flow-field desired
//!    velocity, the prioritised steering force, and the avoidance-reconciled
//!    `vnew`.  This pass only reads world state, so with the `parallel`
//!    feature it fans out over Rayon.
//! 2. **Commit** — sequentially (ascending id for determinism) apply `vnew`
//!    to positions, update facing, and evaluate state-machine transitions.
//!
//! The split is a correctness requirement, not an optimisation: every
//! neighbour velocity read during the produce pass must belong to the same
//! tick's snapshot, never to a half-updated world.

use rustc_hash::FxHashMap;

use rts_core::{EntityId, Quat, Vec2, Vec3};
use rts_entity::{EntityFlags, EntityStore, PositionIndex};
use rts_nav::{AVOID_NEIGHBOUR_RADIUS, AvoidanceAgent, LocalAvoidance, Nav};

use crate::forces::{self, SteerCtx};
use crate::tuning::{
    ADJACENCY_SEP_DIST, ARRIVE_THRESHOLD_DIST, SEPARATION_NEIGHB_RADIUS, WAIT_TICKS,
};
use crate::{ArrivalState, Flock, MotionEvent, MoveState, WaitResume};

// ── ClickMode ─────────────────────────────────────────────────────────────────

/// What a left click on terrain means for the current selection.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum ClickMode {
    #[default]
    Move,
    Attack,
}

// ── MoveEngine ────────────────────────────────────────────────────────────────

/// Owner of all movement state: the per-agent state table, the flock list,
/// the pending motion events, and the nav surface itself.
///
/// One engine instance exists per loaded map; dropping it (or calling
/// [`MoveEngine::shutdown`]) releases every outstanding nav blocker.
pub struct MoveEngine<N: Nav, A: LocalAvoidance> {
    /// The nav surface.  Public so hosts can query it between ticks.
    pub nav: N,
    pub(crate) avoid: A,
    /// uid → movement record.  Every entity with a positive selection
    /// radius that was added to the engine has exactly one entry.
    pub(crate) states: FxHashMap<EntityId, MoveState>,
    /// Live flocks.  Deletion always walks this in reverse with
    /// swap-removal, so erase-during-reverse-iteration is safe.
    pub(crate) flocks: Vec<Flock>,
    pub(crate) events: Vec<MotionEvent>,
    pub(crate) click_mode: ClickMode,
}

impl<N: Nav, A: LocalAvoidance> MoveEngine<N, A> {
    pub fn new(nav: N, avoid: A) -> Self {
        Self {
            nav,
            avoid,
            states: FxHashMap::default(),
            flocks: Vec::new(),
            events: Vec::new(),
            click_mode: ClickMode::default(),
        }
    }

    // ── Blocker helpers ───────────────────────────────────────────────────
    //
    // Associated functions over split borrows so callers can hold a state
    // entry and the nav surface at the same time.

    pub(crate) fn block(nav: &mut N, st: &mut MoveState, pos: Vec2, radius: f32) {
        debug_assert!(!st.blocking, "double blocker acquisition");
        nav.add_blocker(pos, radius);
        st.blocking = true;
        st.last_stop_pos = pos;
        st.last_stop_radius = radius;
    }

    pub(crate) fn unblock(nav: &mut N, st: &mut MoveState) {
        debug_assert!(st.blocking, "release without blocker");
        nav.remove_blocker(st.last_stop_pos, st.last_stop_radius);
        st.blocking = false;
    }

    // ── Flock helpers ─────────────────────────────────────────────────────

    /// Remove `id` from every flock, dropping flocks that lose their last
    /// moving member.
    fn detach(flocks: &mut Vec<Flock>, id: EntityId) {
        for i in (0..flocks.len()).rev() {
            flocks[i].remove(id);
            if flocks[i].is_empty() {
                flocks.swap_remove(i);
            }
        }
    }

    /// Re-insert a recovered waiter into the flock for its destination, or
    /// re-create a single-member flock if that flock is gone.
    fn rejoin(flocks: &mut Vec<Flock>, id: EntityId, resume: WaitResume) {
        match flocks.iter_mut().find(|f| f.dest_id == resume.dest_id) {
            Some(flock) => flock.members.push(id),
            None => {
                let mut flock = Flock::new(resume.target_xz, resume.dest_id, resume.attack);
                flock.members.push(id);
                flocks.push(flock);
            }
        }
    }

    // ── Entity lifecycle ──────────────────────────────────────────────────

    /// Register `id` with the movement system.
    ///
    /// The entity starts ARRIVED with a blocker at its current position.
    /// Entities with a zero selection radius carry no movement state and
    /// are rejected, as is double registration.
    pub fn add_entity(&mut self, store: &EntityStore, id: EntityId) -> bool {
        let Some(rec) = store.get(id) else { return false };
        if rec.selection_radius <= 0.0 || self.states.contains_key(&id) {
            return false;
        }
        let mut st = MoveState::new();
        Self::block(&mut self.nav, &mut st, rec.pos_xz(), rec.selection_radius);
        self.states.insert(id, st);
        true
    }

    /// Unregister `id`: releases its blocker and revokes flock membership.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let Self { nav, states, flocks, .. } = self;
        let Some(mut st) = states.remove(&id) else { return false };
        if st.blocking {
            Self::unblock(nav, &mut st);
        }
        Self::detach(flocks, id);
        true
    }

    /// Release every blocker and forget all movement state.
    pub fn shutdown(&mut self) {
        let Self { nav, states, flocks, events, .. } = self;
        for st in states.values_mut() {
            if st.blocking {
                Self::unblock(nav, st);
            }
        }
        states.clear();
        flocks.clear();
        events.clear();
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Order `selection` to `target` as one flock.
    ///
    /// Snaps `target` to the nearest reachable destination (judged from the
    /// first selected agent), pulls every mobile selected agent out of its
    /// current flock, and merges into an existing flock when one already
    /// heads for the same destination.  Returns `false` — committing
    /// nothing — when the selection is empty, the target unreachable, or no
    /// selected agent can move.
    pub fn make_flock(
        &mut self,
        store:     &EntityStore,
        selection: &[EntityId],
        target:    Vec2,
        attack:    bool,
    ) -> bool {
        let Some(&first) = selection.first() else { return false };
        let Some(first_rec) = store.get(first) else { return false };
        let Some((dest_id, target_xz)) =
            self.nav.closest_reachable_dest(first_rec.pos_xz(), target)
        else {
            log::warn!("move command to unreachable target {target}");
            return false;
        };

        let mut members: Vec<EntityId> = Vec::with_capacity(selection.len());
        for &id in selection {
            if members.contains(&id) || !self.states.contains_key(&id) {
                continue;
            }
            let Some(rec) = store.get(id) else { continue };
            if rec.is_immobile() || rec.flags.contains(EntityFlags::MARKER) {
                continue;
            }
            members.push(id);
        }
        if members.is_empty() {
            return false;
        }

        let Self { nav, states, flocks, events, .. } = self;
        for &id in &members {
            Self::detach(flocks, id);
            let Some(st) = states.get_mut(&id) else { continue };
            if st.state.is_still() {
                if st.blocking {
                    Self::unblock(nav, st);
                }
                events.push(MotionEvent::Started(id));
            }
            st.state = ArrivalState::Moving;
            st.wait_ticks_left = 0;
            st.wait_resume = None;
        }

        match flocks.iter_mut().find(|f| f.dest_id == dest_id) {
            Some(existing) => {
                // Merge keeps the existing target (same destination).
                existing.members.extend(members);
                existing.attack = attack;
            }
            None => {
                let mut flock = Flock::new(target_xz, dest_id, attack);
                flock.members = members;
                flocks.push(flock);
            }
        }
        true
    }

    /// Bring `id` to rest in place.  Idempotent: stopping a still agent
    /// changes nothing observable.
    pub fn stop(&mut self, store: &EntityStore, id: EntityId) -> bool {
        let Some(rec) = store.get(id) else { return false };
        let pos = rec.pos_xz();
        let radius = rec.selection_radius;

        let Self { nav, states, flocks, events, .. } = self;
        let Some(st) = states.get_mut(&id) else { return false };
        Self::detach(flocks, id);

        match st.state {
            ArrivalState::Arrived => {}
            ArrivalState::Waiting => {
                // Already at rest and blocking; just cancel the countdown.
                st.state = ArrivalState::Arrived;
                st.wait_ticks_left = 0;
                st.wait_resume = None;
            }
            ArrivalState::Moving | ArrivalState::SeekEnemies => {
                st.state = ArrivalState::Arrived;
                st.wait_ticks_left = 0;
                st.wait_resume = None;
                st.zero_velocities();
                Self::block(nav, st, pos, radius);
                events.push(MotionEvent::Ended(id));
            }
        }
        true
    }

    /// Switch `id` to enemy seeking: it follows the enemy flow field for
    /// its faction instead of any flock destination.
    pub fn set_seek_enemies(&mut self, store: &EntityStore, id: EntityId) -> bool {
        let Some(rec) = store.get(id) else { return false };
        if rec.is_immobile() {
            return false;
        }
        let Self { nav, states, flocks, events, .. } = self;
        let Some(st) = states.get_mut(&id) else { return false };
        Self::detach(flocks, id);

        if st.state == ArrivalState::SeekEnemies {
            return true;
        }
        if st.state.is_still() {
            if st.blocking {
                Self::unblock(nav, st);
            }
            events.push(MotionEvent::Started(id));
        }
        st.state = ArrivalState::SeekEnemies;
        st.wait_ticks_left = 0;
        st.wait_resume = None;
        true
    }

    /// Current flock target of `id`, if it is moving with a flock.
    pub fn dest_of(&self, id: EntityId) -> Option<Vec2> {
        self.flocks.iter().find(|f| f.contains(id)).map(|f| f.target_xz)
    }

    /// Order a single entity to `target` (one-member [`MoveEngine::make_flock`]).
    pub fn set_dest(&mut self, store: &EntityStore, id: EntityId, target: Vec2) -> bool {
        self.make_flock(store, &[id], target, false)
    }

    pub fn set_move_on_left_click(&mut self) {
        self.click_mode = ClickMode::Move;
    }

    pub fn set_attack_on_left_click(&mut self) {
        self.click_mode = ClickMode::Attack;
    }

    pub fn click_mode(&self) -> ClickMode {
        self.click_mode
    }

    // ── Out-of-band host mutations ────────────────────────────────────────

    /// The host teleported `id`; keep the blocker accounting in step.
    pub fn update_pos(&mut self, store: &mut EntityStore, id: EntityId, pos: Vec3) -> bool {
        if !store.set_pos(id, pos) {
            return false;
        }
        let radius = store.get(id).map_or(0.0, |r| r.selection_radius);
        let Self { nav, states, .. } = self;
        if let Some(st) = states.get_mut(&id)
            && st.blocking
        {
            Self::unblock(nav, st);
            Self::block(nav, st, pos.xz(), radius);
        }
        true
    }

    /// The host resized `id`; re-acquire any blocker at the new radius.
    pub fn update_selection_radius(
        &mut self,
        store:  &mut EntityStore,
        id:     EntityId,
        radius: f32,
    ) -> bool {
        let Some(rec) = store.get_mut(id) else { return false };
        rec.selection_radius = radius;
        let pos = rec.pos_xz();
        let Self { nav, states, .. } = self;
        if let Some(st) = states.get_mut(&id)
            && st.blocking
        {
            Self::unblock(nav, st);
            Self::block(nav, st, pos, radius);
        }
        true
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn state_of(&self, id: EntityId) -> Option<&MoveState> {
        self.states.get(&id)
    }

    pub fn flocks(&self) -> &[Flock] {
        &self.flocks
    }

    pub fn flock_for_dest(&self, dest: rts_core::DestId) -> Option<&Flock> {
        self.flocks.iter().find(|f| f.dest_id == dest)
    }

    /// Take all motion events accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<MotionEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// One 20 Hz steering step.
    pub fn tick(&mut self, store: &mut EntityStore) {
        self.disband_done_flocks();

        let index = PositionIndex::build(store);
        let store_ref: &EntityStore = store;

        // Produce pass — ascending id order keeps results deterministic
        // regardless of map iteration order or the parallel feature.
        let mut movers: Vec<EntityId> = self
            .states
            .iter()
            .filter(|(_, st)| !st.state.is_still())
            .map(|(&id, _)| id)
            .filter(|&id| store_ref.get(id).is_some_and(|r| !r.is_immobile()))
            .collect();
        movers.sort_unstable();

        #[cfg(not(feature = "parallel"))]
        let produced: Vec<(EntityId, Vec2, Vec2)> = movers
            .iter()
            .map(|&id| {
                let (vdes, vnew) = self.produce_velocity(store_ref, &index, id);
                (id, vdes, vnew)
            })
            .collect();

        #[cfg(feature = "parallel")]
        let produced: Vec<(EntityId, Vec2, Vec2)> = {
            use rayon::prelude::*;
            let this: &Self = self;
            movers
                .par_iter()
                .map(|&id| {
                    let (vdes, vnew) = this.produce_velocity(store_ref, &index, id);
                    (id, vdes, vnew)
                })
                .collect()
        };

        for (id, vdes, vnew) in produced {
            if let Some(st) = self.states.get_mut(&id) {
                st.vdes = vdes;
                st.vnew = vnew;
                st.vel_hist.push(vnew);
            }
        }

        // Commit pass — sequential, ascending id.  Waiting countdowns tick
        // here too.
        let mut ids: Vec<EntityId> = self.states.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            self.commit_entity(store, id);
        }
    }

    /// Drop flocks whose every member has arrived (with members holding
    /// only moving agents, that means flocks with no members left).
    fn disband_done_flocks(&mut self) {
        for i in (0..self.flocks.len()).rev() {
            let done = self.flocks[i].members.iter().all(|&m| {
                self.states
                    .get(&m)
                    .is_none_or(|s| s.state == ArrivalState::Arrived)
            });
            if done {
                self.flocks.swap_remove(i);
            }
        }
    }

    /// Produce-pass work for one moving agent: desired velocity from nav,
    /// steering force cascade, avoidance reconciliation.
    fn produce_velocity(
        &self,
        store: &EntityStore,
        index: &PositionIndex,
        id:    EntityId,
    ) -> (Vec2, Vec2) {
        let Some(rec) = store.get(id) else {
            return (Vec2::ZERO, Vec2::ZERO);
        };
        let Some(st) = self.states.get(&id) else {
            return (Vec2::ZERO, Vec2::ZERO);
        };
        let pos = rec.pos_xz();
        let ctx = SteerCtx {
            pos,
            velocity: st.velocity,
            max_speed: rec.max_speed,
        };

        // Separation sees every nearby non-static agent, flockmate or not.
        let mut sep_neighbours: Vec<(Vec2, f32)> = Vec::new();
        for n in index.query_radius(pos, SEPARATION_NEIGHB_RADIUS) {
            if n == id {
                continue;
            }
            let Some(nrec) = store.get(n) else { continue };
            if nrec.is_static() || nrec.selection_radius <= 0.0 {
                continue;
            }
            sep_neighbours.push((nrec.pos_xz(), nrec.selection_radius));
        }

        let (vdes, force) = match st.state {
            ArrivalState::SeekEnemies => {
                let vdes = self.nav.enemy_seek_velocity(pos, rec.faction);
                let force = forces::enemy_seek_force(
                    &self.nav,
                    &ctx,
                    vdes,
                    rec.selection_radius,
                    &sep_neighbours,
                );
                (vdes, force)
            }
            ArrivalState::Moving => {
                let Some(flock) = self.flocks.iter().find(|f| f.contains(id)) else {
                    debug_assert!(false, "moving agent outside any flock");
                    return (Vec2::ZERO, Vec2::ZERO);
                };
                let vdes = self.nav.point_seek_velocity(flock.dest_id, pos, flock.target_xz);
                let mates: Vec<Vec2> = flock
                    .members
                    .iter()
                    .filter(|&&m| m != id)
                    .filter_map(|&m| store.get(m).map(|r| r.pos_xz()))
                    .collect();
                let force = forces::point_seek_force(
                    &self.nav,
                    &ctx,
                    flock.target_xz,
                    vdes,
                    &mates,
                    rec.selection_radius,
                    &sep_neighbours,
                );
                (vdes, force)
            }
            ArrivalState::Arrived | ArrivalState::Waiting => {
                return (Vec2::ZERO, Vec2::ZERO);
            }
        };

        let vpref = forces::integrate(&ctx, force);

        // Avoidance neighbours, partitioned still/moving so resting agents
        // enter the obstacle side of the reconciliation.
        let mut dynamic: Vec<AvoidanceAgent> = Vec::new();
        let mut stationary: Vec<AvoidanceAgent> = Vec::new();
        for n in index.query_radius(pos, AVOID_NEIGHBOUR_RADIUS) {
            if n == id {
                continue;
            }
            let Some(nrec) = store.get(n) else { continue };
            if nrec.selection_radius <= 0.0 || nrec.is_static() {
                continue;
            }
            let nst = self.states.get(&n);
            let desc = AvoidanceAgent {
                pos: nrec.pos_xz(),
                vel: nst.map_or(Vec2::ZERO, |s| s.velocity),
                radius: nrec.selection_radius,
            };
            if nst.is_none_or(|s| s.state.is_still()) {
                stationary.push(desc);
            } else {
                dynamic.push(desc);
            }
        }

        let me = AvoidanceAgent {
            pos,
            vel: st.velocity,
            radius: rec.selection_radius,
        };
        let chosen = self.avoid.new_velocity(&me, vpref, &dynamic, &stationary);
        let vnew = forces::couple_velocity(st.velocity, chosen).truncated(ctx.tick_speed());
        (vdes, vnew)
    }

    /// Commit-pass work for one agent: waiting countdown, position commit,
    /// orientation, state transitions.
    fn commit_entity(&mut self, store: &mut EntityStore, id: EntityId) {
        let Self { nav, states, flocks, events, .. } = self;

        let Some(rec) = store.get(id) else { return };
        let radius = rec.selection_radius;
        let combatable = rec.flags.contains(EntityFlags::COMBATABLE);
        let immobile = rec.is_immobile();
        let pos = rec.pos_xz();

        let Some(st) = states.get_mut(&id) else { return };

        match st.state {
            ArrivalState::Arrived => return,
            ArrivalState::Waiting => {
                debug_assert!(st.wait_ticks_left > 0, "waiting with expired countdown");
                st.wait_ticks_left -= 1;
                if st.wait_ticks_left == 0 {
                    let prev = st.wait_prev;
                    let resume = st.wait_resume.take();
                    if prev == ArrivalState::Moving && resume.is_none() {
                        // Nothing to resume towards: settle in place, the
                        // blocker stays where it is.
                        st.state = ArrivalState::Arrived;
                        return;
                    }
                    if st.blocking {
                        Self::unblock(nav, st);
                    }
                    st.state = prev;
                    events.push(MotionEvent::Started(id));
                    if prev == ArrivalState::Moving
                        && let Some(r) = resume
                    {
                        Self::rejoin(flocks, id, r);
                    }
                }
                return;
            }
            ArrivalState::Moving | ArrivalState::SeekEnemies => {}
        }

        if immobile {
            return;
        }

        // ── Position commit ───────────────────────────────────────────────
        let vnew = st.vnew;
        let new_pos = pos + vnew;
        let committed = if vnew.len() > 0.0 && nav.passable(new_pos) {
            store.set_pos(id, Vec3::from_xz(new_pos, nav.height_at(new_pos)));
            st.velocity = vnew;
            new_pos
        } else {
            st.velocity = Vec2::ZERO;
            pos
        };

        // ── Orientation smoothing ─────────────────────────────────────────
        let wma = st.vel_hist.weighted_average();
        if !wma.is_near_zero() {
            let angle = wma.z.atan2(wma.x) - std::f32::consts::FRAC_PI_2;
            store.set_rotation(id, Quat::from_y_rotation(angle));
        }

        // A scripted teleport onto unwalkable ground freezes the state
        // machine until the entity is back on the nav surface.
        if !nav.passable(committed) {
            return;
        }

        // ── Transitions ───────────────────────────────────────────────────
        if st.state == ArrivalState::Moving {
            let Some(fi) = flocks.iter().position(|f| f.contains(id)) else {
                debug_assert!(false, "moving agent outside any flock");
                return;
            };
            let arrived = {
                let flock = &flocks[fi];
                committed.dist(flock.target_xz) <= ARRIVE_THRESHOLD_DIST
                    || nav.maximally_close(flock.dest_id, committed)
                    || flock.settled.iter().any(|&m| {
                        store.get(m).is_some_and(|mrec| {
                            committed.dist(mrec.pos_xz())
                                <= radius + mrec.selection_radius + ADJACENCY_SEP_DIST
                        })
                    })
            };
            if arrived {
                if flocks[fi].attack && combatable {
                    // Attack move: hunt from here instead of settling.
                    flocks[fi].remove(id);
                    if flocks[fi].is_empty() {
                        flocks.swap_remove(fi);
                    }
                    st.state = ArrivalState::SeekEnemies;
                } else {
                    flocks[fi].settle(id);
                    st.state = ArrivalState::Arrived;
                    st.zero_velocities();
                    Self::block(nav, st, committed, radius);
                    events.push(MotionEvent::Ended(id));
                }
                return;
            }
        }

        // Empty flow field: hold position for a while before trying again.
        if st.vdes.is_near_zero() {
            let resume = match st.state {
                ArrivalState::Moving => {
                    flocks.iter().find(|f| f.contains(id)).map(|f| WaitResume {
                        dest_id: f.dest_id,
                        target_xz: f.target_xz,
                        attack: f.attack,
                    })
                }
                _ => None,
            };
            if st.state == ArrivalState::Moving {
                Self::detach(flocks, id);
            }
            st.wait_prev = st.state;
            st.wait_resume = resume;
            st.state = ArrivalState::Waiting;
            st.wait_ticks_left = WAIT_TICKS;
            st.zero_velocities();
            Self::block(nav, st, committed, radius);
            events.push(MotionEvent::Ended(id));
        }
    }
}
