//! The `Nav` trait — everything the steering simulation asks of navigation.

use rts_core::{DestId, FactionId, Vec2};

/// Navigation queries consumed by the movement core.
///
/// Implementations must be cheap per call: every method except the blocker
/// pair is invoked inside the 20 Hz steering loop, often once per agent.
///
/// # Blockers
///
/// A blocker is a reference-counted marker added to the nav surface around an
/// agent at rest.  While any cell's count is positive that cell is treated as
/// impassable, which makes resting agents part of the obstacle field for
/// everyone else.  Calls must balance: each `add_blocker(pos, r)` is undone
/// by exactly one `remove_blocker(pos, r)` with the same arguments.
pub trait Nav: Send + Sync {
    /// Snap `target` to the nearest reachable destination, judged from
    /// `from` (the first selected agent's position).
    ///
    /// Returns the destination handle and the (possibly adjusted) target
    /// point, or `None` when nothing near `target` is navigable.
    fn closest_reachable_dest(&self, from: Vec2, target: Vec2) -> Option<(DestId, Vec2)>;

    /// Flow-field preferred direction for a point-seek agent at `pos`
    /// heading for `dest`/`target`.
    ///
    /// Unit scale, or `Vec2::ZERO` when the field provides no guidance.
    fn point_seek_velocity(&self, dest: DestId, pos: Vec2, target: Vec2) -> Vec2;

    /// Flow-field preferred direction for an enemy-seeking agent of
    /// `faction` at `pos`.  `Vec2::ZERO` when no enemies are reachable.
    fn enemy_seek_velocity(&self, pos: Vec2, faction: FactionId) -> Vec2;

    /// `true` if the straight segment `from → to` crosses only passable
    /// cells.
    fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool;

    /// `true` when `pos` is as close to `dest` as the nav surface allows
    /// (on the destination cell, or adjacent to it when the destination
    /// itself is obstructed).
    fn maximally_close(&self, dest: DestId, pos: Vec2) -> bool;

    /// `true` if `pos` lies on a passable cell (terrain passable and no
    /// active blockers).
    fn passable(&self, pos: Vec2) -> bool;

    /// Cell dimensions `(width_x, width_z)` in world units.  The steering
    /// code probes one cell-dimension in each cardinal direction when
    /// nullifying force components that push into walls.
    fn tile_dims(&self) -> (f32, f32);

    /// Height-field sample at `pos` (0.0 off the map).
    fn height_at(&self, pos: Vec2) -> f32;

    /// Add one blocker reference on the cells covered by the circle
    /// `(pos, radius)`.
    fn add_blocker(&mut self, pos: Vec2, radius: f32);

    /// Remove one blocker reference added by a matching [`Nav::add_blocker`].
    fn remove_blocker(&mut self, pos: Vec2, radius: f32);
}
