//! Core entity storage: `EntityStore` (uid → record) and `EntityFlags`.

use rustc_hash::FxHashMap;

use rts_core::{EntityId, FactionId, Quat, Vec2, Vec3};

// ── EntityFlags ───────────────────────────────────────────────────────────────

/// Per-entity flag bits.
///
/// Stored as a plain `u32` so new bits never change the record layout.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityFlags(pub u32);

impl EntityFlags {
    pub const NONE: EntityFlags = EntityFlags(0);
    /// Never moves; part of the static obstacle field.
    pub const STATIC: EntityFlags = EntityFlags(1 << 0);
    /// Can fight; participates in attack-move and enemy seeking.
    pub const COMBATABLE: EntityFlags = EntityFlags(1 << 1);
    /// UI move-marker entity; ignored by selection and steering.
    pub const MARKER: EntityFlags = EntityFlags(1 << 2);

    #[inline]
    pub fn contains(self, other: EntityFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: EntityFlags) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: EntityFlags) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for EntityFlags {
    type Output = EntityFlags;
    #[inline]
    fn bitor(self, rhs: EntityFlags) -> EntityFlags {
        EntityFlags(self.0 | rhs.0)
    }
}

// ── EntityRec ─────────────────────────────────────────────────────────────────

/// The per-entity attributes the movement core reads.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityRec {
    /// World position.  The Y component is a height-field sample.
    pub pos: Vec3,
    /// Facing, written by the movement core's orientation smoothing.
    pub rotation: Quat,
    /// Selection radius; doubles as the collision radius.  Entities with a
    /// zero radius are unselectable scenery and carry no movement state.
    pub selection_radius: f32,
    /// Maximum speed in world units per second.
    pub max_speed: f32,
    pub faction: FactionId,
    pub flags: EntityFlags,
}

impl EntityRec {
    /// A unit-sized mobile entity at `pos` — the common test/demo shape.
    pub fn unit(pos: Vec3, faction: FactionId) -> Self {
        Self {
            pos,
            rotation: Quat::IDENTITY,
            selection_radius: 2.0,
            max_speed: 10.0,
            faction,
            flags: EntityFlags::NONE,
        }
    }

    /// Nav-plane projection of the world position.
    #[inline]
    pub fn pos_xz(&self) -> Vec2 {
        self.pos.xz()
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(EntityFlags::STATIC)
    }

    /// `true` for entities that can never be given a move order.
    #[inline]
    pub fn is_immobile(&self) -> bool {
        self.is_static() || self.max_speed == 0.0
    }
}

// ── EntityStore ───────────────────────────────────────────────────────────────

/// Owner of all entity records, keyed by a never-reused [`EntityId`].
///
/// Uids allocate sequentially and are stable for the lifetime of a session,
/// which is what lets save files reference entities by id.
#[derive(Default)]
pub struct EntityStore {
    records: FxHashMap<EntityId, EntityRec>,
    next_uid: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entity, returning its freshly allocated uid.
    pub fn add(&mut self, rec: EntityRec) -> EntityId {
        let id = EntityId(self.next_uid);
        self.next_uid += 1;
        self.records.insert(id, rec);
        id
    }

    /// Remove an entity.  Returns `false` if `id` was not present.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.records.remove(&id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityRec> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityRec> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterator over `(id, record)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRec)> + '_ {
        self.records.iter().map(|(&id, rec)| (id, rec))
    }

    /// All live entity ids in unspecified order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.records.keys().copied()
    }

    // ── Setters used by the movement core ─────────────────────────────────

    /// Write a new world position.  Returns `false` for unknown ids.
    pub fn set_pos(&mut self, id: EntityId, pos: Vec3) -> bool {
        match self.records.get_mut(&id) {
            Some(rec) => {
                rec.pos = pos;
                true
            }
            None => false,
        }
    }

    /// Write a new facing.  Returns `false` for unknown ids.
    pub fn set_rotation(&mut self, id: EntityId, rotation: Quat) -> bool {
        match self.records.get_mut(&id) {
            Some(rec) => {
                rec.rotation = rotation;
                true
            }
            None => false,
        }
    }
}
