//! WebSocket Relay
//!
//! This module contains the core logic for bridging one downstream client to
//! the upstream realtime voice API. It is structured into submodules:
//!
//! - `upstream`: opens the authenticated outbound connection.
//! - `session`: owns both links for one session and runs the duplex
//!   forwarding loop, including failure reporting and teardown.

pub mod session;
pub mod upstream;

pub use session::ws_handler;
