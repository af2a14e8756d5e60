use std::fmt;

use tracing::warn;

use crate::{net::ServerNetworkHandle, state::World};
use common::{
    net::AppChannel,
    protocol::{self, ClientMessage},
};

/// Moves every pending input from the transport into its entity's queue.
/// Nothing is dropped for volume; a client that sends garbage is disconnected.
pub fn receive_inputs(network: &mut dyn ServerNetworkHandle, world: &mut World) {
    for client_id in network.clients_id() {
        while let Some(data) = network.receive_message(client_id, AppChannel::Unreliable) {
            let Some(authority) = world.entity_mut(client_id) else {
                warn!(client_id, "input from client without an entity; skipping");
                continue;
            };

            match decode_message(&data) {
                Ok(ClientMessage::Input(input)) => authority.enqueue(input),
                Err(error) => {
                    warn!("{}", error.message(client_id));
                    network.disconnect(client_id);
                    world.despawn(client_id);
                    break;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputError {
    Malformed,
}

impl InputError {
    fn message(&self, client_id: u64) -> String {
        format!("client {client_id} {self}; disconnecting them")
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Malformed => formatter.write_str("sent malformed data"),
        }
    }
}

impl std::error::Error for InputError {}

fn decode_message(data: &[u8]) -> Result<ClientMessage, InputError> {
    protocol::decode::<ClientMessage>(data).map_err(|_| InputError::Malformed)
}
