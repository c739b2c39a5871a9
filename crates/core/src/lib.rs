//! Shared building blocks for the parley voice relay.
//!
//! This crate holds everything both services agree on:
//!
//! - `event`: the JSON wire protocol spoken between the client, the relay,
//!   and the upstream realtime API, plus the frame classification helpers
//!   the relay uses for its logging policy.
//! - `audio`: assembling streamed PCM fragments into a playable WAV file.

pub mod audio;
pub mod event;
