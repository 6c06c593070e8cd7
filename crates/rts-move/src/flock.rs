//! Flocks — groups of agents sharing a destination.

use rts_core::{DestId, EntityId, Vec2};

/// A group of agents ordered to the same destination.
///
/// Membership is exclusive: an agent belongs to at most one flock, and only
/// while its state is MOVING.  Members that reach the destination move to
/// `settled`, which feeds the adjacency arrival cascade (an agent next to a
/// settled flockmate counts as arrived too) without violating the
/// members-are-moving rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Flock {
    /// Moving members.
    pub members: Vec<EntityId>,
    /// Former members that arrived at this flock's destination.
    pub settled: Vec<EntityId>,
    /// The (snapped) commanded target point.
    pub target_xz: Vec2,
    /// Destination handle the nav subsystem assigned to `target_xz`.
    pub dest_id: DestId,
    /// `true` for attack moves: combatable members switch to enemy seeking
    /// on arrival instead of settling.
    pub attack: bool,
}

impl Flock {
    pub fn new(target_xz: Vec2, dest_id: DestId, attack: bool) -> Self {
        Self {
            members: Vec::new(),
            settled: Vec::new(),
            target_xz,
            dest_id,
            attack,
        }
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    /// Remove `id` from both lists.  Returns `true` if it was a moving
    /// member.  Uses swap-removal; member order is not meaningful.
    pub fn remove(&mut self, id: EntityId) -> bool {
        if let Some(i) = self.settled.iter().position(|&m| m == id) {
            self.settled.swap_remove(i);
        }
        match self.members.iter().position(|&m| m == id) {
            Some(i) => {
                self.members.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Move `id` from the moving members to the settled list.
    pub fn settle(&mut self, id: EntityId) {
        if let Some(i) = self.members.iter().position(|&m| m == id) {
            self.members.swap_remove(i);
            self.settled.push(id);
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
