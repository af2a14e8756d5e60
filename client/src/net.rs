use std::{net::SocketAddr, time::Duration};

use renet::RenetClient;
use renet_netcode::ConnectToken;
use tracing::warn;

use common::{
    input::InputSample,
    net::AppChannel,
    protocol::{self, ClientMessage, ProtocolError, ServerMessage},
    snapshot::StateSnapshot,
};

pub trait ClientNetworkHandle {
    fn is_connected(&self) -> bool;
    fn is_disconnected(&self) -> bool;
    fn send_message(&mut self, channel: AppChannel, message: Vec<u8>);
    fn receive_message(&mut self, channel: AppChannel) -> Option<Vec<u8>>;
}

pub struct RenetClientNetworkHandle<'a> {
    pub client: &'a mut RenetClient,
}

impl ClientNetworkHandle for RenetClientNetworkHandle<'_> {
    fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    fn is_disconnected(&self) -> bool {
        self.client.is_disconnected()
    }

    fn send_message(&mut self, channel: AppChannel, message: Vec<u8>) {
        self.client.send_message(channel, message);
    }

    fn receive_message(&mut self, channel: AppChannel) -> Option<Vec<u8>> {
        self.client
            .receive_message(channel)
            .map(|bytes| bytes.to_vec())
    }
}

/// Fire-and-forget: no acknowledgement is awaited.
pub fn send_input(
    network: &mut dyn ClientNetworkHandle,
    input: InputSample,
) -> Result<(), ProtocolError> {
    let payload = protocol::encode(&ClientMessage::Input(input))?;
    network.send_message(AppChannel::Unreliable, payload);
    Ok(())
}

/// Drains every state message that arrived since the last call, in arrival
/// order. Undecodable payloads are dropped.
pub fn receive_states(network: &mut dyn ClientNetworkHandle) -> Vec<StateSnapshot> {
    let mut states = Vec::new();

    while let Some(data) = network.receive_message(AppChannel::Unreliable) {
        match protocol::decode::<ServerMessage>(&data) {
            Ok(ServerMessage::State(snapshot)) => states.push(snapshot),
            Err(error) => warn!(%error, "dropping malformed server message"),
        }
    }

    states
}

pub fn create_connect_token(
    current_time: Duration,
    protocol_id: u64,
    client_id: u64,
    server_addr: SocketAddr,
    private_key: &[u8; 32],
) -> Result<ConnectToken, String> {
    ConnectToken::generate(
        current_time,
        protocol_id,
        3600,
        client_id,
        15,
        vec![server_addr],
        None,
        private_key,
    )
    .map_err(|error| error.to_string())
}
