use std::collections::{HashMap, VecDeque};

use crate::net::ClientNetworkHandle;
use common::{
    net::AppChannel,
    protocol::{self, ServerMessage},
    snapshot::StateSnapshot,
};

pub struct MockClientNetwork {
    pub connected: bool,

    /// **Incoming (Server -> Client):** drained by `receive_message`.
    incoming: HashMap<AppChannel, VecDeque<Vec<u8>>>,

    /// **Outgoing (Client -> Server):** everything passed to `send_message`.
    sent: Vec<(AppChannel, Vec<u8>)>,
}

impl MockClientNetwork {
    pub fn new() -> Self {
        Self {
            connected: true,
            incoming: HashMap::new(),
            sent: Vec::new(),
        }
    }

    pub fn queue_raw(&mut self, channel: AppChannel, message: Vec<u8>) {
        self.incoming.entry(channel).or_default().push_back(message);
    }

    pub fn queue_state(&mut self, snapshot: StateSnapshot) {
        let payload =
            protocol::encode(&ServerMessage::State(snapshot)).expect("failed to encode state");
        self.queue_raw(AppChannel::Unreliable, payload);
    }

    pub fn sent_on(&self, channel: AppChannel) -> Vec<Vec<u8>> {
        self.sent
            .iter()
            .filter(|(sent_channel, _)| *sent_channel == channel)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl ClientNetworkHandle for MockClientNetwork {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_disconnected(&self) -> bool {
        !self.connected
    }

    fn send_message(&mut self, channel: AppChannel, message: Vec<u8>) {
        self.sent.push((channel, message));
    }

    fn receive_message(&mut self, channel: AppChannel) -> Option<Vec<u8>> {
        self.incoming.get_mut(&channel)?.pop_front()
    }
}
