//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::session::RoomRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(RoomRegistry::new(config.room_broadcast_capacity));
        Self {
            config: Arc::new(config),
            registry,
        }
    }
}
