use std::{
    io,
    net::{SocketAddr, UdpSocket},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use renet::RenetServer;
use renet_netcode::NetcodeServerTransport;
use tracing::{debug, info, warn};

use crate::{
    input::receive_inputs,
    net::{RenetServerNetworkHandle, ServerNetworkEvent, ServerNetworkHandle, build_server_config},
    state::World,
};
use common::{
    self,
    config::{ConfigError, NetcodeConfig},
    movement::{ShipMovement, Simulation},
    net::AppChannel,
    protocol::{self, ProtocolError, ServerMessage},
    time::FixedTickClock,
};

const FRAME_SLEEP: Duration = Duration::from_millis(1);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create transport: {0}")]
    Transport(io::Error),

    #[error("failed to update transport: {0}")]
    Update(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Runs until `running` is cleared, then returns so sockets close cleanly.
pub fn run_server(
    socket: UdpSocket,
    server_addr: SocketAddr,
    private_key: [u8; 32],
    config: &NetcodeConfig,
    running: Arc<AtomicBool>,
) -> Result<(), ServerError> {
    let protocol_id = protocol::version();
    let server_config =
        build_server_config(common::time::now(), protocol_id, server_addr, private_key);
    let mut transport =
        NetcodeServerTransport::new(server_config, socket).map_err(ServerError::Transport)?;
    let mut server = RenetServer::new(common::net::connection_config());

    info!(
        protocol_id,
        %server_addr,
        tick_rate = config.tick_rate,
        buffer_capacity = config.buffer_capacity,
        "server listening"
    );

    let simulation = ShipMovement::default();
    let dt = config.fixed_delta();
    let mut world = World::new(config.buffer_capacity);
    let mut clock = FixedTickClock::new(config.tick_rate)?;
    let mut last_updated = Instant::now();

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        let duration = now - last_updated;
        last_updated = now;

        transport
            .update(duration, &mut server)
            .map_err(|error| ServerError::Update(error.to_string()))?;
        server.update(duration);

        clock.advance(duration);

        let mut network = RenetServerNetworkHandle {
            server: &mut server,
        };
        process_events(&mut network, &mut world);
        receive_inputs(&mut network, &mut world);

        while clock.should_tick() {
            update_world(&mut network, &mut world, &simulation, dt)?;
        }

        transport.send_packets(&mut server);
        thread::sleep(FRAME_SLEEP);
    }

    info!(ticks = clock.current_tick(), "server shutting down");
    transport.disconnect_all(&mut server);

    Ok(())
}

pub fn process_events(network: &mut dyn ServerNetworkHandle, world: &mut World) {
    while let Some(event) = network.get_event() {
        match event {
            ServerNetworkEvent::ClientConnected { client_id } => {
                info!(client_id, "client connected");
                world.spawn(client_id);
            }
            ServerNetworkEvent::ClientDisconnected { client_id, reason } => {
                info!(client_id, %reason, "client disconnected");
                if !world.despawn(client_id) {
                    warn!(client_id, "disconnect for unknown client");
                }
            }
        }
    }
}

/// One authority tick: every entity drains its queue, and the newest state
/// goes back to its owner only. An empty queue sends nothing.
pub fn update_world(
    network: &mut dyn ServerNetworkHandle,
    world: &mut World,
    simulation: &impl Simulation,
    dt: f32,
) -> Result<(), ProtocolError> {
    for (client_id, authority) in world.entities_mut() {
        let Some(snapshot) = authority.tick(simulation, dt) else {
            continue;
        };

        let message = protocol::encode(&ServerMessage::State(snapshot))?;
        network.send_message(client_id, AppChannel::Unreliable, message);
        debug!(client_id, tick = snapshot.tick, "sent state");
    }

    Ok(())
}
