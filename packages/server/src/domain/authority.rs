//! DJ permission checks.
//!
//! Every mutating command that is not open to all participants goes
//! through one of these predicates before the room changes. Clients may
//! cache the same predicate for display, but only this check is enforced.

use super::{entity::Room, error::RoomError, value_object::Identity};

/// `true` for the room creator and for every granted co-DJ.
pub fn is_dj(room: &Room, identity: &Identity) -> bool {
    is_creator(room, identity) || room.dj_set.contains(identity)
}

pub fn is_creator(room: &Room, identity: &Identity) -> bool {
    &room.creator_id == identity
}

/// # Errors
///
/// `RoomError::Forbidden` when `identity` is not a DJ of `room`.
pub fn ensure_dj(room: &Room, identity: &Identity, action: &'static str) -> Result<(), RoomError> {
    if is_dj(room, identity) {
        Ok(())
    } else {
        Err(RoomError::Forbidden {
            action,
            required: "DJ rights",
        })
    }
}

/// # Errors
///
/// `RoomError::Forbidden` when `identity` did not create `room`.
pub fn ensure_creator(
    room: &Room,
    identity: &Identity,
    action: &'static str,
) -> Result<(), RoomError> {
    if is_creator(room, identity) {
        Ok(())
    } else {
        Err(RoomError::Forbidden {
            action,
            required: "room creator",
        })
    }
}
