use std::collections::{HashMap, VecDeque};

use crate::net::{ServerNetworkEvent, ServerNetworkHandle};
use common::{
    input::InputSample,
    net::AppChannel,
    protocol::{self, ClientMessage, ServerMessage},
};

#[derive(Default)]
pub struct MockServerNetwork {
    /// Drained by `process_events`; filled with `queue_event`.
    events_to_process: VecDeque<ServerNetworkEvent>,

    /// Client -> server payloads, filled with `queue_input` or `queue_raw_message`.
    client_messages: HashMap<u64, VecDeque<Vec<u8>>>,

    /// Server -> client payloads as written by `send_message`.
    sent_messages: HashMap<u64, Vec<(AppChannel, Vec<u8>)>>,

    pub disconnected_clients: Vec<u64>,

    client_ids: Vec<u64>,
}

impl MockServerNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&mut self, client_id: u64) {
        self.client_ids.push(client_id);
        self.client_messages.entry(client_id).or_default();
        self.sent_messages.entry(client_id).or_default();
    }

    pub fn queue_event(&mut self, event: ServerNetworkEvent) {
        self.events_to_process.push_back(event);
    }

    pub fn queue_input(&mut self, client_id: u64, input: InputSample) {
        let bytes = protocol::encode(&ClientMessage::Input(input)).expect("encode input");
        self.queue_raw_message(client_id, bytes);
    }

    pub fn queue_raw_message(&mut self, client_id: u64, message: Vec<u8>) {
        self.client_messages
            .entry(client_id)
            .or_default()
            .push_back(message);
    }

    pub fn sent_states(&self, client_id: u64) -> Vec<(AppChannel, ServerMessage)> {
        self.sent_messages
            .get(&client_id)
            .map(|messages| {
                messages
                    .iter()
                    .map(|(channel, bytes)| {
                        let message =
                            protocol::decode::<ServerMessage>(bytes).expect("decode state");
                        (*channel, message)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ServerNetworkHandle for MockServerNetwork {
    fn get_event(&mut self) -> Option<ServerNetworkEvent> {
        self.events_to_process.pop_front()
    }

    fn clients_id(&self) -> Vec<u64> {
        self.client_ids.clone()
    }

    fn receive_message(&mut self, client_id: u64, _channel: AppChannel) -> Option<Vec<u8>> {
        self.client_messages
            .entry(client_id)
            .or_default()
            .pop_front()
    }

    fn send_message(&mut self, client_id: u64, channel: AppChannel, message: Vec<u8>) {
        self.sent_messages
            .entry(client_id)
            .or_default()
            .push((channel, message));
    }

    fn disconnect(&mut self, client_id: u64) {
        self.disconnected_clients.push(client_id);
        self.client_ids.retain(|&id| id != client_id);
    }
}
