use bincode::{
    config::standard,
    error::{DecodeError, EncodeError},
    serde::{decode_from_slice, encode_to_vec},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{input::InputSample, snapshot::StateSnapshot};

/// Authority to owning client, at most once per authority tick.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    State(StateSnapshot),
}

/// Client to authority, at most once per client tick.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Input(InputSample),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] EncodeError),

    #[error("failed to decode message: {0}")]
    Decode(#[from] DecodeError),
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(encode_to_vec(message, standard())?)
}

pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    let (message, _) = decode_from_slice::<T, _>(data, standard())?;
    Ok(message)
}

pub fn version() -> u64 {
    env!("CARGO_PKG_VERSION")
        .split('.')
        .next()
        .and_then(|major| major.parse().ok())
        .unwrap_or(0)
}
