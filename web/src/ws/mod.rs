//! WebSocket endpoint for realtime event delivery.
//!
//! This module contains only the Axum upgrade handler and the adapter that
//! registers the socket's write half with the hub. The fan-out machinery
//! itself lives in the `hub` crate.

pub(crate) mod handler;
