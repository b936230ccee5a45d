//! Domain factories for creating domain entities and value objects.

use super::value_object::ConnectionId;

/// Factory for generating ConnectionId instances.
///
/// Connection ids are assigned by the coordinator when a socket is accepted;
/// clients never choose them.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    pub fn generate() -> ConnectionId {
        ConnectionId::new(uuid::Uuid::new_v4().to_string())
    }
}
