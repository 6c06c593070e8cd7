//! Save / load of movement state.
//!
//! # What is and is not serialized
//!
//! The save stream carries the flock list (member ids, target, destination
//! handle) and, per agent: the state-machine variables, the flow-field and
//! integrated velocities, the blocking bit, the waiting bookkeeping, and the
//! whole velocity-history ring.  Blocker *parameters* are deliberately not
//! serialized: they are reconstructed from the loaded entity position, so a
//! save can never resurrect a blocker that has drifted away from where the
//! agent actually stands.
//!
//! # Load protocol
//!
//! The host re-creates entities and registers them with the engine first
//! (which acquires the creation-time blocker), then calls
//! [`MoveEngine::load_state`].  Loading applies entity records one by one
//! and aborts on the first record whose entity is missing; records applied
//! before the failure keep their loaded state.

use std::io::{Read, Write};

use rts_core::{DestId, EntityId, Vec2};
use rts_entity::EntityStore;
use rts_nav::{LocalAvoidance, Nav};

use crate::{
    ArrivalState, Flock, MoveEngine, MoveError, MoveResult, VelHistory, WaitResume,
};

// ── Stream records ────────────────────────────────────────────────────────────

#[derive(serde::Serialize, serde::Deserialize)]
struct FlockSave {
    members: Vec<EntityId>,
    target_xz: Vec2,
    dest_id: DestId,
    attack: bool,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct EntitySave {
    uid: EntityId,
    state: ArrivalState,
    vdes: Vec2,
    velocity: Vec2,
    blocking: bool,
    wait_prev: ArrivalState,
    wait_ticks_left: u32,
    wait_resume: Option<WaitResume>,
    vel_hist: VelHistory,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct MoveSave {
    flocks: Vec<FlockSave>,
    entities: Vec<EntitySave>,
}

// ── Engine entry points ───────────────────────────────────────────────────────

impl<N: Nav, A: LocalAvoidance> MoveEngine<N, A> {
    /// Write the movement state of every registered agent to `writer`.
    ///
    /// Entities are emitted in ascending uid order so identical worlds
    /// produce identical streams.
    pub fn save_state<W: Write>(&self, writer: W) -> MoveResult<()> {
        let flocks = self
            .flocks
            .iter()
            .map(|f| FlockSave {
                members: f.members.clone(),
                target_xz: f.target_xz,
                dest_id: f.dest_id,
                attack: f.attack,
            })
            .collect();

        let mut entities: Vec<EntitySave> = self
            .states
            .iter()
            .map(|(&uid, st)| EntitySave {
                uid,
                state: st.state,
                vdes: st.vdes,
                velocity: st.velocity,
                blocking: st.blocking,
                wait_prev: st.wait_prev,
                wait_ticks_left: st.wait_ticks_left,
                wait_resume: st.wait_resume,
                vel_hist: st.vel_hist.clone(),
            })
            .collect();
        entities.sort_unstable_by_key(|e| e.uid);

        serde_json::to_writer(writer, &MoveSave { flocks, entities })?;
        Ok(())
    }

    /// Restore movement state saved by [`MoveEngine::save_state`].
    ///
    /// Every referenced entity must already exist in `store` and be
    /// registered with the engine (so each holds its creation-time blocker);
    /// the loaded `blocking` bit then decides whether that blocker stays or
    /// is released.
    pub fn load_state<R: Read>(&mut self, store: &EntityStore, reader: R) -> MoveResult<()> {
        let save: MoveSave = serde_json::from_reader(reader)?;

        self.flocks = save
            .flocks
            .into_iter()
            .map(|f| {
                let mut flock = Flock::new(f.target_xz, f.dest_id, f.attack);
                flock.members = f.members;
                flock
            })
            .collect();

        let Self { nav, states, .. } = self;
        for e in save.entities {
            let (Some(rec), Some(st)) = (store.get(e.uid), states.get_mut(&e.uid)) else {
                log::warn!("load aborted: entity {} not re-created before load", e.uid);
                return Err(MoveError::MissingEntity(e.uid));
            };

            st.state = e.state;
            st.vdes = e.vdes;
            st.vnew = Vec2::ZERO;
            st.velocity = e.velocity;
            st.wait_prev = e.wait_prev;
            st.wait_ticks_left = e.wait_ticks_left;
            st.wait_resume = e.wait_resume;
            st.vel_hist = e.vel_hist;

            // Blocker reconciliation against the creation-time blocker; the
            // parameters come from the live position, never the stream.
            if e.blocking && !st.blocking {
                Self::block(nav, st, rec.pos_xz(), rec.selection_radius);
            } else if !e.blocking && st.blocking {
                Self::unblock(nav, st);
            }
        }
        Ok(())
    }
}
