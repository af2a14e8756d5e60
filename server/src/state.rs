use std::collections::HashMap;

use tracing::info;

use common::{authority::ServerAuthority, movement::spawn_state};

/// Every entity the authority owns, keyed by the client that controls it.
pub struct World {
    entities: HashMap<u64, ServerAuthority>,
    buffer_capacity: usize,
}

impl World {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            entities: HashMap::new(),
            buffer_capacity,
        }
    }

    pub fn spawn(&mut self, client_id: u64) {
        self.entities
            .entry(client_id)
            .or_insert_with(|| ServerAuthority::new(spawn_state(), self.buffer_capacity));
        info!(client_id, "spawned entity");
    }

    /// Drops the entity together with its queue and history.
    pub fn despawn(&mut self, client_id: u64) -> bool {
        let removed = self.entities.remove(&client_id).is_some();
        if removed {
            info!(client_id, "despawned entity");
        }
        removed
    }

    pub fn entity(&self, client_id: u64) -> Option<&ServerAuthority> {
        self.entities.get(&client_id)
    }

    pub fn entity_mut(&mut self, client_id: u64) -> Option<&mut ServerAuthority> {
        self.entities.get_mut(&client_id)
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = (u64, &mut ServerAuthority)> {
        self.entities
            .iter_mut()
            .map(|(&client_id, authority)| (client_id, authority))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
