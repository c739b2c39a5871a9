//! Parley Relay Library Crate
//!
//! This library contains all the core logic for the relay service: the
//! application state, configuration, routing, and the WebSocket relay
//! session itself. The `relay` binary is a thin wrapper around this library.

pub mod config;
pub mod router;
pub mod state;
pub mod ws;
