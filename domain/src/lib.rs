//! Business logic for the wellness platform: the services that originate
//! realtime events (chat, activities, challenges) and the token validation
//! used by both transports.
//!
//! Services here compute event recipient lists server-side and hand finished
//! [`events::Event`]s to the hub; they never expose the hub's internals to
//! controllers. Persistence is out of scope for this subsystem, so small
//! in-memory stores stand in behind the same seams a database layer would
//! occupy.

pub mod activity;
pub mod challenge;
pub mod chat;
pub mod error;
pub mod jwt;
pub mod social;

pub use error::Error;

use activity::ActivityStore;
use challenge::ChallengeStore;
use chat::MessageStore;
use social::FriendGraph;

/// Bundle of the in-memory stores backing the wellness services, shared
/// app-wide the way a database connection pool would be.
#[derive(Default)]
pub struct Stores {
    pub messages: MessageStore,
    pub friends: FriendGraph,
    pub activities: ActivityStore,
    pub challenges: ChallengeStore,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }
}
