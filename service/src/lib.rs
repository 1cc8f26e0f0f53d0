use config::Config;
use domain::Stores;
use hub::Hub;
use std::sync::Arc;

pub mod config;
pub mod logging;

// Service-level state containing only infrastructure concerns, shared by the
// HTTP and gRPC transports. Needs to implement Clone to be able to be passed
// into Router as State.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub hub: Arc<Hub>,
    pub stores: Arc<Stores>,
}

impl AppState {
    pub fn new(config: Config, hub: Arc<Hub>, stores: Arc<Stores>) -> Self {
        Self {
            config,
            hub,
            stores,
        }
    }

    pub fn hub_ref(&self) -> &Hub {
        self.hub.as_ref()
    }

    pub fn stores_ref(&self) -> &Stores {
        self.stores.as_ref()
    }
}
