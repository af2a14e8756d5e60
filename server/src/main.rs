use std::{
    io, process,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{error, info};

use common::{config::NetcodeConfig, logging};

fn main() {
    let config = match NetcodeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: invalid configuration: {}.", e);
            process::exit(1);
        }
    };
    logging::init(&config.log_level);

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("server asked to shut down");
        handler_flag.store(false, Ordering::SeqCst);
    }) {
        error!("error setting Ctrl-C handler: {}", e);
        process::exit(1);
    }

    let server_addr = match common::net::get_connectable_address() {
        Ok(addr) => addr,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let socket = match common::net::bind_socket(server_addr) {
        Ok(socket) => socket,
        Err(e) => {
            error!(%server_addr, "failed to bind socket: {}", e);
            if e.kind() == io::ErrorKind::AddrInUse {
                error!("is another instance of the server already running?");
            }
            process::exit(1);
        }
    };

    let private_key = common::auth::private_key();
    if let Err(e) = server::run::run_server(socket, server_addr, private_key, &config, running) {
        error!("{}", e);
        process::exit(1);
    }
}
