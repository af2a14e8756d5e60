use std::{env, process};

use tracing::error;

use client::run;
use common::{config::NetcodeConfig, logging, net::get_connectable_address};

fn main() {
    let config = match NetcodeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}.");
            process::exit(1);
        }
    };
    logging::init(&config.log_level);

    if env::args().any(|arg| arg == "--host") {
        if let Err(e) = run::run_host(&config) {
            error!("{e}");
            process::exit(1);
        }
        return;
    }

    let server_addr = match get_connectable_address() {
        Ok(addr) => addr,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    if let Err(e) = run::run_client(&config, server_addr) {
        error!("{e}");
        process::exit(1);
    }
}
