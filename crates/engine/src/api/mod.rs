//! API layer - host events, UI commands and socket messages.

pub mod commands;
pub mod events;
pub mod remote;

pub use commands::handle_command;
pub use events::{handle_host_event, HostEvent};
pub use remote::handle_socket_message;
