//! `PositionIndex` — R-tree radius queries over entity positions.
//!
//! # Usage pattern
//!
//! The steering tick rebuilds the index once from the entity store, then
//! issues many radius queries against the frozen snapshot.  Rebuilding uses
//! `RTree::bulk_load`, which is O(n log n) and much faster than n inserts;
//! the positions written during the commit pass never touch the index, so
//! every query inside one tick sees the same consistent world.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use rts_core::{EntityId, Vec2};

use crate::EntityStore;

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a nav-plane point with the owning entity.
#[derive(Clone)]
struct PosEntry {
    point: [f32; 2], // [x, z]
    id: EntityId,
}

impl RTreeObject for PosEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for PosEntry {
    /// Squared Euclidean distance on the nav plane.
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dz = self.point[1] - point[1];
        dx * dx + dz * dz
    }
}

// ── PositionIndex ─────────────────────────────────────────────────────────────

/// A per-tick spatial snapshot of all entity positions.
#[derive(Default)]
pub struct PositionIndex {
    tree: RTree<PosEntry>,
}

impl PositionIndex {
    /// Build the index from every entity currently in `store`.
    pub fn build(store: &EntityStore) -> Self {
        let entries = store
            .iter()
            .map(|(id, rec)| PosEntry {
                point: [rec.pos.x, rec.pos.z],
                id,
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// All entities whose position lies within `radius` of `center`,
    /// including any entity exactly at `center`.  Order is unspecified.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.tree
            .locate_within_distance([center.x, center.z], radius * radius)
            .map(|e| e.id)
            .collect()
    }

    /// The entity nearest to `center`, or `None` on an empty index.
    pub fn nearest(&self, center: Vec2) -> Option<EntityId> {
        self.tree
            .nearest_neighbor(&[center.x, center.z])
            .map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
