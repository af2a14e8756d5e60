use std::{
    env, io,
    net::{SocketAddr, UdpSocket},
};

use renet::{ChannelConfig, ConnectionConfig, SendType};
use socket2::{Domain, Socket, Type};

use crate::config::ConfigError;

pub fn get_connectable_address() -> Result<SocketAddr, ConfigError> {
    dotenvy::dotenv().ok();

    let ip = env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());

    let address_string = format!("{}:{}", ip, port);
    address_string.parse().map_err(|_| ConfigError::Invalid {
        name: "IP/PORT",
        value: address_string,
    })
}

/// Inputs and states ride the unreliable channel: every payload carries its
/// tick, so loss and reordering are absorbed by the history buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppChannel {
    Unreliable,
}

impl From<AppChannel> for u8 {
    fn from(channel: AppChannel) -> Self {
        match channel {
            AppChannel::Unreliable => 0,
        }
    }
}

pub fn connection_config() -> ConnectionConfig {
    let unreliable_config = ChannelConfig {
        channel_id: AppChannel::Unreliable.into(),
        max_memory_usage_bytes: 5 * 1024 * 1024,
        send_type: SendType::Unreliable,
    };

    let channels_config = vec![unreliable_config];

    ConnectionConfig {
        client_channels_config: channels_config.clone(),
        server_channels_config: channels_config,
        ..Default::default()
    }
}

pub fn bind_socket(addr: SocketAddr) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::DGRAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}
