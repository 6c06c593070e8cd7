//! Unit tests for rts-move.

use rts_core::{EntityId, FactionId, Vec2, Vec3};
use rts_entity::{EntityFlags, EntityRec, EntityStore};
use rts_nav::{GridMap, Nav, NoAvoidance};

use crate::forces::{self, SteerCtx};
use crate::tuning::{MAX_FORCE, VEL_HIST_LEN, WAIT_TICKS};
use crate::{ArrivalState, MotionEvent, MoveEngine};

type Engine = MoveEngine<GridMap, NoAvoidance>;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// 20×20 map of 10-unit cells (world 200×200), all passable and flat.
fn world() -> (EntityStore, Engine) {
    let map = GridMap::new(20, 20, 10.0, 10.0);
    (EntityStore::new(), MoveEngine::new(map, NoAvoidance))
}

/// Fast test unit: radius 2, 100 units/s (5 units per movement tick).
fn runner(x: f32, z: f32) -> EntityRec {
    let mut rec = EntityRec::unit(Vec3::new(x, 0.0, z), FactionId(0));
    rec.max_speed = 100.0;
    rec
}

fn spawn(store: &mut EntityStore, engine: &mut Engine, rec: EntityRec) -> EntityId {
    let id = store.add(rec);
    assert!(engine.add_entity(store, id));
    id
}

fn tick_n(engine: &mut Engine, store: &mut EntityStore, n: u32) {
    for _ in 0..n {
        engine.tick(store);
    }
}

fn state(engine: &Engine, id: EntityId) -> ArrivalState {
    engine.state_of(id).expect("movement state").state
}

/// The cross-cutting invariants that must hold at every tick boundary.
fn assert_invariants(engine: &Engine, store: &EntityStore) {
    for (i, flock) in engine.flocks().iter().enumerate() {
        for &m in &flock.members {
            assert_eq!(
                engine.state_of(m).map(|s| s.state),
                Some(ArrivalState::Moving),
                "flock member {m} not moving"
            );
        }
        for other in engine.flocks().iter().skip(i + 1) {
            assert_ne!(flock.dest_id, other.dest_id, "two flocks share a destination");
        }
    }
    for id in store.ids() {
        if let Some(st) = engine.state_of(id) {
            assert_eq!(
                st.blocking,
                st.state.is_still(),
                "blocking bit out of step for {id}"
            );
            assert_eq!(st.wait_ticks_left > 0, st.state == ArrivalState::Waiting);
        }
    }
}

// ── Flock construction ────────────────────────────────────────────────────────

#[cfg(test)]
mod flock_construction {
    use super::*;

    #[test]
    fn empty_selection_fails() {
        let (store, mut engine) = world();
        assert!(!engine.make_flock(&store, &[], Vec2::new(100.0, 100.0), false));
        assert!(engine.flocks().is_empty());
    }

    #[test]
    fn move_command_starts_motion() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 10.0));
        let start = store.get(a).unwrap().pos_xz();

        assert!(engine.make_flock(&store, &[a], Vec2::new(100.0, 100.0), false));
        assert_eq!(state(&engine, a), ArrivalState::Moving);
        assert_eq!(engine.drain_events(), vec![MotionEvent::Started(a)]);
        // The resting blocker was released.
        assert_eq!(engine.nav.blocker_count(start), 0);
        assert_invariants(&engine, &store);
    }

    #[test]
    fn same_destination_merges_flocks() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 10.0));
        let b = spawn(&mut store, &mut engine, runner(20.0, 10.0));
        let target = Vec2::new(105.0, 105.0);

        assert!(engine.make_flock(&store, &[a], target, false));
        assert!(engine.make_flock(&store, &[b], target, false));

        assert_eq!(engine.flocks().len(), 1);
        let flock = &engine.flocks()[0];
        assert!(flock.contains(a) && flock.contains(b));
        assert_eq!(flock.target_xz, target);
        assert_invariants(&engine, &store);
    }

    #[test]
    fn repeated_set_dest_keeps_one_flock() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 10.0));
        let target = Vec2::new(100.0, 100.0);

        assert!(engine.set_dest(&store, a, target));
        assert!(engine.set_dest(&store, a, target));
        assert_eq!(engine.flocks().len(), 1);
        assert_eq!(engine.flocks()[0].members, vec![a]);
    }

    #[test]
    fn immobile_entities_are_skipped() {
        let (mut store, mut engine) = world();
        let mut rock = runner(10.0, 10.0);
        rock.flags.insert(EntityFlags::STATIC);
        let rock = spawn(&mut store, &mut engine, rock);

        let mut turret = runner(20.0, 10.0);
        turret.max_speed = 0.0;
        let turret = spawn(&mut store, &mut engine, turret);

        assert!(!engine.make_flock(&store, &[rock, turret], Vec2::new(100.0, 100.0), false));
        assert!(engine.flocks().is_empty());
        assert_eq!(state(&engine, rock), ArrivalState::Arrived);
        assert_eq!(state(&engine, turret), ArrivalState::Arrived);
    }

    #[test]
    fn unreachable_target_fails_without_commit() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 10.0));
        // Wall off a large region and aim well inside it.
        for tx in 6..20 {
            for tz in 6..20 {
                engine.nav.set_impassable(tx, tz);
            }
        }
        assert!(!engine.make_flock(&store, &[a], Vec2::new(195.0, 195.0), false));
        assert_eq!(state(&engine, a), ArrivalState::Arrived);
        assert!(engine.flocks().is_empty());
    }
}

// ── Steering and arrival ──────────────────────────────────────────────────────

#[cfg(test)]
mod steering {
    use super::*;

    #[test]
    fn agent_progresses_towards_target() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 100.0));
        engine.make_flock(&store, &[a], Vec2::new(150.0, 100.0), false);

        let x0 = store.get(a).unwrap().pos.x;
        tick_n(&mut engine, &mut store, 10);
        let x1 = store.get(a).unwrap().pos.x;
        assert!(x1 > x0 + 1.0, "no eastward progress: {x0} → {x1}");
        assert_invariants(&engine, &store);
    }

    #[test]
    fn agent_arrives_and_settles() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 100.0));
        let target = Vec2::new(60.0, 100.0);
        engine.make_flock(&store, &[a], target, false);
        engine.drain_events();

        tick_n(&mut engine, &mut store, 120);

        assert_eq!(state(&engine, a), ArrivalState::Arrived);
        let st = engine.state_of(a).unwrap();
        assert!(st.blocking);
        assert_eq!(st.velocity, Vec2::ZERO);
        let pos = store.get(a).unwrap().pos_xz();
        assert!(pos.dist(target) <= crate::tuning::ARRIVE_THRESHOLD_DIST + 1.0);
        assert!(engine.nav.blocker_count(pos) > 0);
        assert!(
            engine.drain_events().contains(&MotionEvent::Ended(a)),
            "arrival emits a motion-end event"
        );
        // The flock disbands once everyone has arrived.
        tick_n(&mut engine, &mut store, 1);
        assert!(engine.flocks().is_empty());
        assert_invariants(&engine, &store);
    }

    #[test]
    fn arrival_cascades_to_adjacent_flockmates() {
        let (mut store, mut engine) = world();
        // a sits just outside the arrive threshold of its neighbour's
        // cascade reach; b is already basically at the target.
        let b = spawn(&mut store, &mut engine, runner(97.0, 100.0));
        let a = spawn(&mut store, &mut engine, runner(90.0, 100.0));
        let target = Vec2::new(100.0, 100.0);
        engine.make_flock(&store, &[a, b], target, false);

        tick_n(&mut engine, &mut store, 2);

        assert_eq!(state(&engine, b), ArrivalState::Arrived, "b reaches the target");
        assert_eq!(
            state(&engine, a),
            ArrivalState::Arrived,
            "a arrives by adjacency to settled b"
        );
        // a stopped outside the plain arrive threshold, so only the cascade
        // explains its arrival.
        let a_pos = store.get(a).unwrap().pos_xz();
        assert!(a_pos.dist(target) > crate::tuning::ARRIVE_THRESHOLD_DIST);
        assert_invariants(&engine, &store);
    }

    #[test]
    fn orientation_follows_velocity_history() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 100.0));
        engine.make_flock(&store, &[a], Vec2::new(150.0, 100.0), false);

        tick_n(&mut engine, &mut store, 10);
        // Moving due east (+x): the facing angle is atan2(0, 1) − π/2.
        let angle = store.get(a).unwrap().rotation.y_angle();
        assert!(
            (angle + std::f32::consts::FRAC_PI_2).abs() < 0.1,
            "facing angle {angle}"
        );
    }
}

// ── Stop and seek-enemies commands ────────────────────────────────────────────

#[cfg(test)]
mod commands {
    use super::*;

    #[test]
    fn stop_is_idempotent() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 10.0));
        engine.make_flock(&store, &[a], Vec2::new(100.0, 100.0), false);
        tick_n(&mut engine, &mut store, 5);
        engine.drain_events();

        assert!(engine.stop(&store, a));
        assert_eq!(state(&engine, a), ArrivalState::Arrived);
        assert_eq!(engine.drain_events(), vec![MotionEvent::Ended(a)]);
        let snapshot = engine.state_of(a).unwrap().clone();

        assert!(engine.stop(&store, a));
        assert!(engine.drain_events().is_empty(), "second stop is silent");
        assert_eq!(engine.state_of(a).unwrap(), &snapshot);
        assert_invariants(&engine, &store);
    }

    #[test]
    fn stop_unknown_entity_is_rejected() {
        let (store, mut engine) = world();
        assert!(!engine.stop(&store, EntityId(7)));
    }

    #[test]
    fn seek_enemies_leaves_rest_state() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 10.0));
        let start = store.get(a).unwrap().pos_xz();
        engine.nav.set_enemy_direction(FactionId(0), Vec2::new(1.0, 0.0));

        assert!(engine.set_seek_enemies(&store, a));
        assert_eq!(state(&engine, a), ArrivalState::SeekEnemies);
        assert_eq!(engine.drain_events(), vec![MotionEvent::Started(a)]);
        assert_eq!(engine.nav.blocker_count(start), 0);

        tick_n(&mut engine, &mut store, 10);
        assert!(store.get(a).unwrap().pos.x > start.x + 1.0);
        assert_invariants(&engine, &store);
    }

    #[test]
    fn attack_move_turns_combatable_arrivals_into_seekers() {
        let (mut store, mut engine) = world();
        let mut rec = runner(80.0, 100.0);
        rec.flags.insert(EntityFlags::COMBATABLE);
        let a = spawn(&mut store, &mut engine, rec);
        engine.nav.set_enemy_direction(FactionId(0), Vec2::new(0.0, 1.0));

        engine.make_flock(&store, &[a], Vec2::new(100.0, 100.0), true);
        tick_n(&mut engine, &mut store, 40);

        assert_eq!(state(&engine, a), ArrivalState::SeekEnemies);
        assert!(!engine.state_of(a).unwrap().blocking);
        assert_invariants(&engine, &store);
    }

    #[test]
    fn update_pos_relocates_the_blocker() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 10.0));
        let from = Vec2::new(10.0, 10.0);
        let to = Vec3::new(110.0, 0.0, 110.0);

        assert!(engine.nav.blocker_count(from) > 0);
        assert!(engine.update_pos(&mut store, a, to));
        assert_eq!(engine.nav.blocker_count(from), 0);
        assert!(engine.nav.blocker_count(to.xz()) > 0);
        assert_eq!(store.get(a).unwrap().pos_xz(), to.xz());
    }

    #[test]
    fn remove_entity_releases_blocker_and_membership() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 10.0));
        let b = spawn(&mut store, &mut engine, runner(20.0, 10.0));
        engine.make_flock(&store, &[a, b], Vec2::new(100.0, 100.0), false);

        assert!(engine.remove_entity(a));
        assert!(engine.state_of(a).is_none());
        assert!(!engine.flocks()[0].contains(a));
        assert!(!engine.remove_entity(a), "double removal is rejected");
    }

    #[test]
    fn shutdown_releases_every_blocker() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 10.0));
        let b = spawn(&mut store, &mut engine, runner(50.0, 50.0));
        let (pa, pb) = (
            store.get(a).unwrap().pos_xz(),
            store.get(b).unwrap().pos_xz(),
        );

        engine.shutdown();
        assert_eq!(engine.nav.blocker_count(pa), 0);
        assert_eq!(engine.nav.blocker_count(pb), 0);
        assert!(engine.state_of(a).is_none());
        assert!(engine.flocks().is_empty());
    }
}

// ── Waiting ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod waiting {
    use super::*;

    /// Drive an agent into WAITING by obstructing its destination cell,
    /// which silences the flow field.
    fn waiting_setup() -> (EntityStore, Engine, EntityId, Vec2) {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 100.0));
        let target = Vec2::new(150.0, 100.0);
        engine.make_flock(&store, &[a], target, false);
        tick_n(&mut engine, &mut store, 3);
        engine.nav.add_blocker(target, 1.0);
        engine.drain_events();
        tick_n(&mut engine, &mut store, 1);
        (store, engine, a, target)
    }

    #[test]
    fn empty_flow_field_enters_waiting_once() {
        let (store, mut engine, a, _) = waiting_setup();

        let st = engine.state_of(a).unwrap();
        assert_eq!(st.state, ArrivalState::Waiting);
        assert_eq!(st.wait_ticks_left, WAIT_TICKS);
        assert_eq!(st.wait_prev, ArrivalState::Moving);
        assert!(st.blocking, "waiting agents contribute a blocker");
        assert!(engine.drain_events().contains(&MotionEvent::Ended(a)));
        assert_invariants(&engine, &store);
    }

    #[test]
    fn waiting_recovers_after_the_full_countdown() {
        let (mut store, mut engine, a, target) = waiting_setup();
        let rest_pos = store.get(a).unwrap().pos_xz();

        // One tick short of recovery: still waiting, still blocking.
        tick_n(&mut engine, &mut store, WAIT_TICKS - 1);
        assert_eq!(state(&engine, a), ArrivalState::Waiting);
        assert_eq!(engine.state_of(a).unwrap().wait_ticks_left, 1);
        assert!(engine.nav.blocker_count(rest_pos) > 0);

        // The 60th tick restores the previous state and re-joins a flock
        // for the original destination.
        engine.drain_events();
        tick_n(&mut engine, &mut store, 1);
        assert_eq!(state(&engine, a), ArrivalState::Moving);
        assert!(engine.drain_events().contains(&MotionEvent::Started(a)));
        assert_eq!(engine.flocks().len(), 1);
        assert!(engine.flocks()[0].contains(a));
        assert_eq!(engine.flocks()[0].target_xz, target);
        assert_eq!(engine.nav.blocker_count(rest_pos), 0);
        assert_invariants(&engine, &store);

        // Field still silent: it waits again on the next evaluation.
        tick_n(&mut engine, &mut store, 1);
        assert_eq!(state(&engine, a), ArrivalState::Waiting);
        assert_eq!(engine.state_of(a).unwrap().wait_ticks_left, WAIT_TICKS);
    }

    #[test]
    fn seeker_with_no_guidance_waits_and_resumes_seeking() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(50.0, 50.0));
        // No enemy direction scripted: the enemy field is empty.
        engine.set_seek_enemies(&store, a);
        tick_n(&mut engine, &mut store, 1);

        let st = engine.state_of(a).unwrap();
        assert_eq!(st.state, ArrivalState::Waiting);
        assert_eq!(st.wait_prev, ArrivalState::SeekEnemies);
        assert!(st.wait_resume.is_none());

        tick_n(&mut engine, &mut store, WAIT_TICKS);
        assert_eq!(state(&engine, a), ArrivalState::SeekEnemies);
        assert_invariants(&engine, &store);
    }
}

// ── Forces ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod force_functions {
    use super::*;

    // Slow enough that single forces stay below the MAX_FORCE cap.
    fn ctx(pos: Vec2, velocity: Vec2) -> SteerCtx {
        SteerCtx { pos, velocity, max_speed: 10.0 }
    }

    #[test]
    fn seek_points_at_target() {
        let c = ctx(Vec2::ZERO, Vec2::ZERO);
        let f = forces::seek_force(&c, Vec2::new(50.0, 0.0));
        assert!((f.x - c.tick_speed()).abs() < 1e-5);
        assert!(f.z.abs() < 1e-6);
    }

    #[test]
    fn arrive_decelerates_inside_slowing_radius() {
        let map = GridMap::new(20, 20, 10.0, 10.0);
        let c = ctx(Vec2::new(95.0, 100.0), Vec2::ZERO);
        let near = forces::arrive_force(&map, &c, Some(Vec2::new(100.0, 100.0)), Vec2::ZERO);
        let far = forces::arrive_force(&map, &c, Some(Vec2::new(180.0, 100.0)), Vec2::ZERO);
        assert!(near.len() < far.len(), "closing in slows the desired speed");
    }

    #[test]
    fn arrive_without_line_of_sight_follows_the_field() {
        let mut map = GridMap::new(20, 20, 10.0, 10.0);
        for tz in 0..20 {
            map.set_impassable(10, tz); // wall across the middle
        }
        let c = ctx(Vec2::new(50.0, 100.0), Vec2::ZERO);
        let vdes = Vec2::new(0.0, 1.0);
        let f = forces::arrive_force(&map, &c, Some(Vec2::new(150.0, 100.0)), vdes);
        // Desired comes from vdes, so the force points along +z.
        assert!(f.z > 0.0);
        assert!(f.x.abs() < 1e-6);
        assert!(f.len() <= MAX_FORCE + 1e-6);
    }

    #[test]
    fn alignment_cancels_to_zero() {
        let c = ctx(Vec2::ZERO, Vec2::new(3.0, 1.0));
        let mates = [
            (Vec2::new(2.0, 0.0), Vec2::new(-1.0, 5.0)),
            (Vec2::new(0.0, 4.0), Vec2::new(2.0, -2.0)),
        ];
        assert_eq!(forces::alignment_force(&c, &mates), Vec2::ZERO);
        assert_eq!(forces::alignment_force(&c, &[]), Vec2::ZERO);
    }

    #[test]
    fn cohesion_pulls_towards_the_flock() {
        let c = ctx(Vec2::ZERO, Vec2::ZERO);
        let mates = [Vec2::new(20.0, 0.0), Vec2::new(30.0, 0.0)];
        let f = forces::cohesion_force(&c, &mates);
        assert!(f.x > 0.0);
        assert!(f.len() <= MAX_FORCE + 1e-6);
        assert_eq!(forces::cohesion_force(&c, &[]), Vec2::ZERO);
    }

    #[test]
    fn separation_pushes_away_and_grows_when_overlapping() {
        let c = ctx(Vec2::ZERO, Vec2::ZERO);
        let near = forces::separation_force(&c, 2.0, &[(Vec2::new(3.0, 0.0), 2.0)]);
        let far = forces::separation_force(&c, 2.0, &[(Vec2::new(25.0, 0.0), 2.0)]);
        assert!(near.x < 0.0, "pushes west, away from an eastern neighbour");
        assert!(near.len() > far.len());
    }

    #[test]
    fn nullification_zeroes_components_into_walls() {
        let mut map = GridMap::new(20, 20, 10.0, 10.0);
        map.set_impassable(6, 5); // east neighbour of cell (5, 5)
        let pos = Vec2::new(55.0, 55.0);
        let f = forces::nullify_impass_components(&map, pos, Vec2::new(0.5, 0.3));
        assert_eq!(f, Vec2::new(0.0, 0.3));
        // Away from the wall the component survives.
        let f = forces::nullify_impass_components(&map, pos, Vec2::new(-0.5, 0.3));
        assert_eq!(f, Vec2::new(-0.5, 0.3));
    }

    #[test]
    fn integrate_caps_at_tick_speed() {
        let c = ctx(Vec2::ZERO, Vec2::new(4.0, 0.0));
        let v = forces::integrate(&c, Vec2::new(100.0, 0.0));
        assert!((v.len() - c.tick_speed()).abs() < 1e-5);
    }

    #[test]
    fn couple_velocity_is_the_identity_today() {
        let prev = Vec2::new(1.0, 2.0);
        let chosen = Vec2::new(-3.0, 0.5);
        assert_eq!(forces::couple_velocity(prev, chosen), chosen);
    }

    #[test]
    fn velocity_history_weights_recent_samples() {
        let mut hist = crate::VelHistory::new();
        hist.push(Vec2::new(1.0, 0.0));
        let wma = hist.weighted_average();
        // One sample of weight VEL_HIST_LEN out of 105 total weight.
        let expected = VEL_HIST_LEN as f32 / 105.0;
        assert!((wma.x - expected).abs() < 1e-5);

        for _ in 0..VEL_HIST_LEN {
            hist.push(Vec2::new(0.0, 2.0));
        }
        let wma = hist.weighted_average();
        assert_eq!(wma.x, 0.0, "old sample fully evicted");
        assert!((wma.z - 2.0).abs() < 1e-5);
    }
}

// ── Save / load ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod save_load {
    use super::*;
    use crate::MoveError;

    /// Rebuild a fresh world mirroring `store`'s entities (same uids via the
    /// same insertion order) and register them all with a fresh engine.
    fn mirrored_world(store: &EntityStore) -> (EntityStore, Engine) {
        let (mut new_store, mut new_engine) = world();
        let mut ids: Vec<EntityId> = store.ids().collect();
        ids.sort_unstable();
        for id in ids {
            let rec = store.get(id).unwrap().clone();
            let new_id = new_store.add(rec);
            assert_eq!(new_id, id, "mirror must reproduce uids");
            assert!(new_engine.add_entity(&new_store, new_id));
        }
        (new_store, new_engine)
    }

    #[test]
    fn quiescent_round_trip_is_identical() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 100.0));
        let b = spawn(&mut store, &mut engine, runner(20.0, 100.0));
        engine.make_flock(&store, &[a, b], Vec2::new(70.0, 100.0), false);
        tick_n(&mut engine, &mut store, 200);
        assert_eq!(state(&engine, a), ArrivalState::Arrived);
        assert_eq!(state(&engine, b), ArrivalState::Arrived);

        let mut stream = Vec::new();
        engine.save_state(&mut stream).unwrap();

        let (loaded_store, mut loaded) = mirrored_world(&store);
        loaded.load_state(&loaded_store, stream.as_slice()).unwrap();

        for id in [a, b] {
            assert_eq!(
                loaded.state_of(id).unwrap(),
                engine.state_of(id).unwrap(),
                "movement state of {id} survives the round trip"
            );
        }
        assert!(loaded.flocks().is_empty());
        assert_invariants(&loaded, &loaded_store);
    }

    #[test]
    fn mid_flight_round_trip_restores_flock_and_releases_creation_blocker() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 100.0));
        let target = Vec2::new(150.0, 100.0);
        engine.make_flock(&store, &[a], target, false);
        tick_n(&mut engine, &mut store, 10);
        assert_eq!(state(&engine, a), ArrivalState::Moving);

        let mut stream = Vec::new();
        engine.save_state(&mut stream).unwrap();

        let (loaded_store, mut loaded) = mirrored_world(&store);
        loaded.load_state(&loaded_store, stream.as_slice()).unwrap();

        let orig = engine.state_of(a).unwrap();
        let got = loaded.state_of(a).unwrap();
        assert_eq!(got.state, ArrivalState::Moving);
        assert_eq!(got.vdes, orig.vdes);
        assert_eq!(got.velocity, orig.velocity);
        assert_eq!(got.vel_hist, orig.vel_hist);
        assert!(!got.blocking, "creation blocker released for a moving agent");
        let pos = loaded_store.get(a).unwrap().pos_xz();
        assert_eq!(loaded.nav.blocker_count(pos), 0);

        assert_eq!(loaded.flocks().len(), 1);
        assert!(loaded.flocks()[0].contains(a));
        assert_eq!(loaded.flocks()[0].target_xz, target);
        assert_invariants(&loaded, &loaded_store);
    }

    #[test]
    fn load_aborts_on_missing_entity() {
        let (mut store, mut engine) = world();
        let a = spawn(&mut store, &mut engine, runner(10.0, 10.0));
        let mut stream = Vec::new();
        engine.save_state(&mut stream).unwrap();

        // A world that never re-created the entity.
        let (empty_store, mut fresh) = world();
        match fresh.load_state(&empty_store, stream.as_slice()) {
            Err(MoveError::MissingEntity(id)) => assert_eq!(id, a),
            other => panic!("expected MissingEntity, got {other:?}"),
        }
    }

    #[test]
    fn malformed_stream_is_rejected_before_applying() {
        let (store, mut engine) = world();
        let res = engine.load_state(&store, br#"{"flocks": 7}"#.as_slice());
        assert!(matches!(res, Err(MoveError::Stream(_))));
    }
}
