use std::{
    io,
    net::{SocketAddr, UdpSocket},
    thread,
    time::{Duration, Instant},
};

use renet::RenetClient;
use renet_netcode::{ClientAuthentication, NetcodeClientTransport};
use tracing::{debug, info};

use crate::{
    host::LocalHost,
    input::{ScriptedInput, wander},
    net::{self, ClientNetworkHandle, RenetClientNetworkHandle},
    predictor::ClientPredictor,
    reconcile::Reconciliation,
};
use common::{
    self,
    config::{ConfigError, NetcodeConfig},
    movement::{ShipMovement, Simulation, spawn_state},
    protocol::ProtocolError,
    role::Role,
    time::FixedTickClock,
};

const FRAME_SLEEP: Duration = Duration::from_millis(1);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind client socket: {0}")]
    Socket(#[from] io::Error),

    #[error("failed to generate connect token: {0}")]
    Token(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("disconnected from server")]
    Disconnected,
}

/// Tallies reconciliation outcomes between progress reports.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub corrected: u64,
    pub within_threshold: u64,
    pub skipped: u64,
}

impl ReconcileStats {
    pub fn record(&mut self, outcome: &Reconciliation) {
        match outcome {
            Reconciliation::Idle => {}
            Reconciliation::InsufficientHistory => self.skipped += 1,
            Reconciliation::WithinThreshold(_) => self.within_threshold += 1,
            Reconciliation::Corrected { .. } => self.corrected += 1,
        }
    }
}

pub fn run_client(config: &NetcodeConfig, server_addr: SocketAddr) -> Result<(), ClientError> {
    let client_id = rand::random::<u64>();
    let protocol_id = common::protocol::version();
    let connect_token = net::create_connect_token(
        common::time::now(),
        protocol_id,
        client_id,
        server_addr,
        &common::auth::private_key(),
    )
    .map_err(ClientError::Token)?;

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    let authentication = ClientAuthentication::Secure { connect_token };
    let mut transport = NetcodeClientTransport::new(common::time::now(), authentication, socket)
        .map_err(|error| ClientError::Transport(error.to_string()))?;
    let mut client = RenetClient::new(common::net::connection_config());

    info!(%server_addr, client_id, "connecting");

    let mut predictor = ClientPredictor::new(
        Role::ClientOnly,
        spawn_state(),
        config,
        ShipMovement::default(),
    );
    let mut clock = FixedTickClock::new(config.tick_rate)?;
    let mut input = ScriptedInput::new();
    let mut stats = ReconcileStats::default();
    let report_every = config.tick_rate.round().max(1.0) as u64;
    let mut announced = false;
    let mut last_updated = Instant::now();

    loop {
        let now = Instant::now();
        let duration = now - last_updated;
        last_updated = now;

        transport
            .update(duration, &mut client)
            .map_err(|error| ClientError::Transport(error.to_string()))?;
        client.update(duration);

        if client.is_disconnected() {
            return Err(ClientError::Disconnected);
        }

        if client.is_connected() {
            if !announced {
                info!(client_id, "connected; predicting");
                announced = true;
            }

            let mut network = RenetClientNetworkHandle {
                client: &mut client,
            };

            clock.advance(duration);
            while clock.should_tick() {
                let tick = clock.current_tick();
                wander(&mut input, tick);

                let outcome = client_tick(&mut predictor, &mut network, &input, tick)?;
                stats.record(&outcome);

                if tick % report_every == 0 {
                    let entity = predictor.state().entity();
                    info!(
                        tick,
                        position = ?entity.position,
                        resource = entity.resource_level,
                        corrected = stats.corrected,
                        within_threshold = stats.within_threshold,
                        skipped = stats.skipped,
                        "prediction status"
                    );
                    stats = ReconcileStats::default();
                }
            }
        }

        transport
            .send_packets(&mut client)
            .map_err(|error| ClientError::Transport(error.to_string()))?;
        thread::sleep(FRAME_SLEEP);
    }
}

/// One client tick: take in whatever the authority sent, predict, transmit
/// the input, reconcile.
pub fn client_tick<S: Simulation>(
    predictor: &mut ClientPredictor<S>,
    network: &mut dyn ClientNetworkHandle,
    input: &ScriptedInput,
    tick: u64,
) -> Result<Reconciliation, ProtocolError> {
    for snapshot in net::receive_states(network) {
        predictor.receive(snapshot);
    }

    let sample = predictor.predict(tick, input);
    net::send_input(network, sample)?;

    Ok(predictor.reconcile(tick, None))
}

/// Runs owner and authority in this process, with no network at all.
pub fn run_host(config: &NetcodeConfig) -> Result<(), ClientError> {
    let mut host = LocalHost::new(spawn_state(), config, ShipMovement::default());
    let mut clock = FixedTickClock::new(config.tick_rate)?;
    let mut input = ScriptedInput::new();
    let mut stats = ReconcileStats::default();
    let report_every = config.tick_rate.round().max(1.0) as u64;
    let mut last_updated = Instant::now();

    info!("hosting locally");

    loop {
        let now = Instant::now();
        clock.advance(now - last_updated);
        last_updated = now;

        while clock.should_tick() {
            let tick = clock.current_tick();
            wander(&mut input, tick);

            let outcome = host.tick(tick, &input);
            stats.record(&outcome);

            if tick % report_every == 0 {
                debug!(tick, pending = host.authority().pending(), "host tick");
                info!(
                    tick,
                    corrected = stats.corrected,
                    within_threshold = stats.within_threshold,
                    skipped = stats.skipped,
                    "host status"
                );
                stats = ReconcileStats::default();
            }
        }

        thread::sleep(FRAME_SLEEP);
    }
}
