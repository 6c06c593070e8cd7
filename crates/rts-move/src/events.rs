//! Motion events emitted on still/moving boundary transitions.

use rts_core::EntityId;

/// Emitted whenever an agent crosses the still/moving boundary.
///
/// `Started` fires when a still agent (ARRIVED or WAITING) begins moving —
/// a move command, an enemy-seek order, or a waiting recovery.  `Ended`
/// fires when a moving agent comes to rest — arrival, a stop command, or
/// entering the waiting state.  The host drains these once per tick via
/// [`MoveEngine::drain_events`][crate::MoveEngine::drain_events].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MotionEvent {
    Started(EntityId),
    Ended(EntityId),
}

impl MotionEvent {
    /// The entity this event concerns.
    pub fn entity(self) -> EntityId {
        match self {
            MotionEvent::Started(id) | MotionEvent::Ended(id) => id,
        }
    }
}
