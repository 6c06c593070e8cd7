//! Unit tests for rts-nav.

use rts_core::{DestId, FactionId, Vec2};

use crate::{AvoidanceAgent, GridMap, LocalAvoidance, Nav, NoAvoidance, SampledAvoidance};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// 10×10 map of 10-unit cells (world 100×100), all passable and flat.
fn open_map() -> GridMap {
    GridMap::new(10, 10, 10.0, 10.0)
}

fn agent(pos: Vec2, vel: Vec2) -> AvoidanceAgent {
    AvoidanceAgent { pos, vel, radius: 2.0 }
}

// ── GridMap ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod grid_map {
    use super::*;

    #[test]
    fn snap_keeps_passable_click_point() {
        let map = open_map();
        let click = Vec2::new(55.0, 42.0);
        let (dest, point) = map.closest_reachable_dest(Vec2::new(5.0, 5.0), click).unwrap();
        assert_eq!(point, click);
        // Cell (5, 4) → 4*10 + 5.
        assert_eq!(dest, DestId(45));
    }

    #[test]
    fn snap_moves_off_obstructed_cell() {
        let mut map = open_map();
        map.set_impassable(5, 4);
        let click = Vec2::new(55.0, 42.0);
        let (dest, point) = map.closest_reachable_dest(Vec2::new(5.0, 5.0), click).unwrap();
        assert_ne!(dest, DestId(45));
        assert_ne!(point, click);
        assert!(map.passable(point));
    }

    #[test]
    fn snap_clamps_offmap_click() {
        let map = open_map();
        let (_, point) = map
            .closest_reachable_dest(Vec2::new(5.0, 5.0), Vec2::new(250.0, 42.0))
            .unwrap();
        assert!(map.passable(point));
        assert!(point.x < 100.0);
    }

    #[test]
    fn point_seek_heads_for_target() {
        let map = open_map();
        let (dest, target) = map
            .closest_reachable_dest(Vec2::new(5.0, 5.0), Vec2::new(95.0, 5.0))
            .unwrap();
        let v = map.point_seek_velocity(dest, Vec2::new(5.0, 5.0), target);
        assert!((v.x - 1.0).abs() < 1e-6);
        assert!(v.z.abs() < 1e-6);
    }

    #[test]
    fn blockers_make_cells_impassable_and_kill_guidance() {
        let mut map = open_map();
        let p = Vec2::new(55.0, 45.0);
        assert!(map.passable(p));

        map.add_blocker(p, 3.0);
        assert!(!map.passable(p));

        // Field guidance toward a blocked destination cell is suppressed.
        let dest = DestId(45); // cell (5, 4)
        assert_eq!(map.point_seek_velocity(dest, Vec2::new(5.0, 5.0), p), Vec2::ZERO);

        map.remove_blocker(p, 3.0);
        assert!(map.passable(p));
    }

    #[test]
    fn blocker_counts_nest() {
        let mut map = open_map();
        let p = Vec2::new(15.0, 15.0);
        map.add_blocker(p, 2.0);
        map.add_blocker(p, 2.0);
        map.remove_blocker(p, 2.0);
        assert!(!map.passable(p), "one reference still outstanding");
        map.remove_blocker(p, 2.0);
        assert!(map.passable(p));
    }

    #[test]
    fn line_of_sight_blocked_by_terrain() {
        let mut map = open_map();
        let a = Vec2::new(5.0, 55.0);
        let b = Vec2::new(95.0, 55.0);
        assert!(map.line_of_sight(a, b));
        map.set_impassable(5, 5);
        assert!(!map.line_of_sight(a, b));
    }

    #[test]
    fn maximally_close_on_dest_cell() {
        let map = open_map();
        let dest = DestId(45);
        assert!(map.maximally_close(dest, Vec2::new(55.0, 42.0)));
        assert!(!map.maximally_close(dest, Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn maximally_close_beside_obstructed_dest() {
        let mut map = open_map();
        map.set_impassable(5, 4);
        let dest = DestId(45);
        // One cell west of the obstructed destination.
        assert!(map.maximally_close(dest, Vec2::new(45.0, 45.0)));
    }

    #[test]
    fn height_field_lookup() {
        let mut map = open_map();
        map.set_height(2, 3, 7.5);
        assert_eq!(map.height_at(Vec2::new(25.0, 35.0)), 7.5);
        assert_eq!(map.height_at(Vec2::new(5.0, 5.0)), 0.0);
        assert_eq!(map.height_at(Vec2::new(-50.0, 5.0)), 0.0);
    }

    #[test]
    fn enemy_direction_scripting() {
        let mut map = open_map();
        let f = FactionId(1);
        assert_eq!(map.enemy_seek_velocity(Vec2::ZERO, f), Vec2::ZERO);
        map.set_enemy_direction(f, Vec2::new(0.0, 2.0));
        let v = map.enemy_seek_velocity(Vec2::ZERO, f);
        assert!((v.z - 1.0).abs() < 1e-6, "direction is normalized");
    }
}

// ── Avoidance ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod avoidance {
    use super::*;

    #[test]
    fn no_avoidance_passes_preference_through() {
        let v = NoAvoidance.new_velocity(
            &agent(Vec2::ZERO, Vec2::ZERO),
            Vec2::new(1.0, 2.0),
            &[],
            &[],
        );
        assert_eq!(v, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn sampled_keeps_preference_when_clear() {
        let vpref = Vec2::new(1.0, 0.0);
        let v = SampledAvoidance.new_velocity(&agent(Vec2::ZERO, Vec2::ZERO), vpref, &[], &[]);
        assert_eq!(v, vpref);
    }

    #[test]
    fn sampled_deviates_around_head_on_neighbour() {
        let vpref = Vec2::new(1.0, 0.0);
        let me = agent(Vec2::ZERO, vpref);
        // Stationary agent dead ahead, inside the scan horizon.
        let wall = agent(Vec2::new(10.0, 0.0), Vec2::ZERO);
        let v = SampledAvoidance.new_velocity(&me, vpref, &[], &[wall]);
        assert_ne!(v, vpref, "straight ahead collides");
        // Still makes forward or lateral progress rather than reversing.
        assert!(v.len() > 0.0 || v == Vec2::ZERO);
    }

    #[test]
    fn sampled_zero_preference_short_circuits() {
        let v = SampledAvoidance.new_velocity(
            &agent(Vec2::ZERO, Vec2::ZERO),
            Vec2::ZERO,
            &[agent(Vec2::new(1.0, 0.0), Vec2::ZERO)],
            &[],
        );
        assert_eq!(v, Vec2::ZERO);
    }
}
