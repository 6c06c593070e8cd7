//! `GridMap` — a uniform-grid `Nav` implementation.
//!
//! # Scope
//!
//! This is the reference nav surface used by tests and demos: a rectangle of
//! uniform cells with per-cell terrain passability, blocker reference counts,
//! and a height sample.  Flow sampling is straight-line (normalized
//! `target − pos`), destination snapping is a ring search for the nearest
//! passable cell, and line of sight walks the segment at quarter-cell steps.
//! A production nav stack replaces this with real flow fields behind the same
//! trait.

use rustc_hash::FxHashMap;

use rts_core::{DestId, FactionId, Vec2};

use crate::Nav;

/// How many cells outward destination snapping searches before giving up.
const SNAP_SEARCH_RADIUS: i32 = 8;

/// A uniform-grid nav surface.
pub struct GridMap {
    width: i32,
    height: i32,
    tile_w: f32,
    tile_h: f32,
    /// Per-cell terrain passability.
    terrain: Vec<bool>,
    /// Per-cell blocker reference counts.  A cell with a positive count is
    /// impassable regardless of terrain.
    blockers: Vec<u16>,
    /// Per-cell height sample.
    heights: Vec<f32>,
    /// Uniform enemy-seek direction per faction.  Tests script this; a real
    /// nav stack derives it from enemy positions.
    enemy_dirs: FxHashMap<FactionId, Vec2>,
}

impl GridMap {
    /// Create an all-passable, flat map of `width × height` cells of
    /// `tile_w × tile_h` world units each.
    pub fn new(width: i32, height: i32, tile_w: f32, tile_h: f32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        assert!(tile_w > 0.0 && tile_h > 0.0, "cell dimensions must be positive");
        let cells = (width * height) as usize;
        Self {
            width,
            height,
            tile_w,
            tile_h,
            terrain: vec![true; cells],
            blockers: vec![0; cells],
            heights: vec![0.0; cells],
            enemy_dirs: FxHashMap::default(),
        }
    }

    /// Mark cell `(tx, tz)` as terrain-impassable.
    pub fn set_impassable(&mut self, tx: i32, tz: i32) {
        if let Some(i) = self.idx(tx, tz) {
            self.terrain[i] = false;
        }
    }

    /// Set the height sample of cell `(tx, tz)`.
    pub fn set_height(&mut self, tx: i32, tz: i32, h: f32) {
        if let Some(i) = self.idx(tx, tz) {
            self.heights[i] = h;
        }
    }

    /// Script the enemy-seek direction reported for `faction`.
    pub fn set_enemy_direction(&mut self, faction: FactionId, dir: Vec2) {
        self.enemy_dirs.insert(faction, dir.normalized());
    }

    /// Blocker reference count on the cell containing `pos` (0 off-map).
    pub fn blocker_count(&self, pos: Vec2) -> u16 {
        match self.cell_of(pos) {
            Some((tx, tz)) => self.blockers[self.idx(tx, tz).unwrap_or(0)],
            None => 0,
        }
    }

    // ── Cell addressing ───────────────────────────────────────────────────

    fn idx(&self, tx: i32, tz: i32) -> Option<usize> {
        if tx < 0 || tz < 0 || tx >= self.width || tz >= self.height {
            None
        } else {
            Some((tz * self.width + tx) as usize)
        }
    }

    fn cell_of(&self, pos: Vec2) -> Option<(i32, i32)> {
        let tx = (pos.x / self.tile_w).floor() as i32;
        let tz = (pos.z / self.tile_h).floor() as i32;
        self.idx(tx, tz).map(|_| (tx, tz))
    }

    fn cell_center(&self, tx: i32, tz: i32) -> Vec2 {
        Vec2::new(
            (tx as f32 + 0.5) * self.tile_w,
            (tz as f32 + 0.5) * self.tile_h,
        )
    }

    fn cell_passable(&self, tx: i32, tz: i32) -> bool {
        match self.idx(tx, tz) {
            Some(i) => self.terrain[i] && self.blockers[i] == 0,
            None => false,
        }
    }

    fn dest_cell(&self, dest: DestId) -> (i32, i32) {
        let i = dest.0 as i32;
        (i % self.width, i / self.width)
    }

    /// Cells overlapped by the circle `(pos, radius)`.
    fn cells_in_circle(&self, pos: Vec2, radius: f32) -> Vec<usize> {
        let min_tx = ((pos.x - radius) / self.tile_w).floor() as i32;
        let max_tx = ((pos.x + radius) / self.tile_w).floor() as i32;
        let min_tz = ((pos.z - radius) / self.tile_h).floor() as i32;
        let max_tz = ((pos.z + radius) / self.tile_h).floor() as i32;

        let mut out = Vec::new();
        for tz in min_tz..=max_tz {
            for tx in min_tx..=max_tx {
                let Some(i) = self.idx(tx, tz) else { continue };
                // Closest point on the cell rectangle to the circle center.
                let cx = pos.x.clamp(tx as f32 * self.tile_w, (tx + 1) as f32 * self.tile_w);
                let cz = pos.z.clamp(tz as f32 * self.tile_h, (tz + 1) as f32 * self.tile_h);
                if Vec2::new(cx, cz).dist(pos) <= radius {
                    out.push(i);
                }
            }
        }
        out
    }
}

impl Nav for GridMap {
    fn closest_reachable_dest(&self, _from: Vec2, target: Vec2) -> Option<(DestId, Vec2)> {
        let (ttx, ttz) = match self.cell_of(target) {
            Some(c) => c,
            None => {
                // Clicked off the map: clamp to the nearest edge cell.
                let tx = ((target.x / self.tile_w).floor() as i32).clamp(0, self.width - 1);
                let tz = ((target.z / self.tile_h).floor() as i32).clamp(0, self.height - 1);
                (tx, tz)
            }
        };

        if self.cell_passable(ttx, ttz) {
            let id = DestId((ttz * self.width + ttx) as u32);
            // The exact click point is navigable: keep it.
            let point = if self.cell_of(target).is_some() {
                target
            } else {
                self.cell_center(ttx, ttz)
            };
            return Some((id, point));
        }

        // Ring search outward for the nearest passable cell.
        for r in 1..=SNAP_SEARCH_RADIUS {
            let mut best: Option<((i32, i32), f32)> = None;
            for tz in (ttz - r)..=(ttz + r) {
                for tx in (ttx - r)..=(ttx + r) {
                    if (tx - ttx).abs() != r && (tz - ttz).abs() != r {
                        continue; // interior of the ring was covered earlier
                    }
                    if !self.cell_passable(tx, tz) {
                        continue;
                    }
                    let d = self.cell_center(tx, tz).dist_sq(target);
                    if best.is_none_or(|(_, bd)| d < bd) {
                        best = Some(((tx, tz), d));
                    }
                }
            }
            if let Some(((tx, tz), _)) = best {
                let id = DestId((tz * self.width + tx) as u32);
                return Some((id, self.cell_center(tx, tz)));
            }
        }
        None
    }

    fn point_seek_velocity(&self, dest: DestId, pos: Vec2, target: Vec2) -> Vec2 {
        let (dtx, dtz) = self.dest_cell(dest);
        // Destination obstructed: the field has no guidance.
        if !self.cell_passable(dtx, dtz) {
            return Vec2::ZERO;
        }
        (target - pos).normalized()
    }

    fn enemy_seek_velocity(&self, _pos: Vec2, faction: FactionId) -> Vec2 {
        self.enemy_dirs.get(&faction).copied().unwrap_or(Vec2::ZERO)
    }

    fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        let dist = from.dist(to);
        let step = 0.25 * self.tile_w.min(self.tile_h);
        let samples = (dist / step).ceil() as i32;
        for i in 0..=samples {
            let t = if samples == 0 { 0.0 } else { i as f32 / samples as f32 };
            let p = from + (to - from) * t;
            match self.cell_of(p) {
                Some((tx, tz)) if self.cell_passable(tx, tz) => {}
                _ => return false,
            }
        }
        true
    }

    fn maximally_close(&self, dest: DestId, pos: Vec2) -> bool {
        let (dtx, dtz) = self.dest_cell(dest);
        let Some((tx, tz)) = self.cell_of(pos) else {
            return false;
        };
        if (tx, tz) == (dtx, dtz) {
            return true;
        }
        // Next to an obstructed destination cell is as close as it gets.
        !self.cell_passable(dtx, dtz) && (tx - dtx).abs() <= 1 && (tz - dtz).abs() <= 1
    }

    fn passable(&self, pos: Vec2) -> bool {
        match self.cell_of(pos) {
            Some((tx, tz)) => self.cell_passable(tx, tz),
            None => false,
        }
    }

    fn tile_dims(&self) -> (f32, f32) {
        (self.tile_w, self.tile_h)
    }

    fn height_at(&self, pos: Vec2) -> f32 {
        match self.cell_of(pos) {
            Some((tx, tz)) => self.heights[self.idx(tx, tz).unwrap_or(0)],
            None => 0.0,
        }
    }

    fn add_blocker(&mut self, pos: Vec2, radius: f32) {
        for i in self.cells_in_circle(pos, radius) {
            self.blockers[i] += 1;
        }
    }

    fn remove_blocker(&mut self, pos: Vec2, radius: f32) {
        for i in self.cells_in_circle(pos, radius) {
            debug_assert!(self.blockers[i] > 0, "unbalanced blocker release");
            self.blockers[i] = self.blockers[i].saturating_sub(1);
        }
    }
}
