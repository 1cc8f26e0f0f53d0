//! gRPC transport for the chat API.
//!
//! The streaming endpoint is the second consumer surface of the realtime
//! hub: `StreamMessages` registers a bounded stream channel and forwards
//! every chat message fanned out to the caller until the channel closes or
//! the call is cancelled.

pub mod proto {
    pub mod wellness {
        pub mod v1 {
            tonic::include_proto!("wellness.v1");
        }
    }
}

pub use proto::wellness::v1::*;

mod server;
mod stream;

pub use server::{start_server, WellnessRpc};
pub use stream::MessageStream;
