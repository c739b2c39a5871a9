//! Parley Client Library Crate
//!
//! Reconstructs one conversational turn from the relayed event stream:
//! incremental text, incremental audio, and the elapsed generation time.
//! The `client` binary wires this to a live WebSocket connection.

pub mod latency;
pub mod turn;
