pub mod auth;
pub mod authority;
pub mod config;
pub mod constants;
pub mod input;
pub mod logging;
pub mod movement;
pub mod net;
pub mod protocol;
pub mod ring;
pub mod role;
pub mod snapshot;
pub mod time;
