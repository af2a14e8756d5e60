pub mod input;
pub mod net;
pub mod run;
pub mod state;

#[cfg(test)]
mod test_helpers;

pub use net::{RenetServerNetworkHandle, ServerNetworkEvent, ServerNetworkHandle};
pub use run::{process_events, update_world};
