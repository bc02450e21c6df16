//! Application state shared by all handlers.

use fatbox_services::Forwarder;
use fatbox_storage::ChunkStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Chunk sessions and scratch files
    pub store: Arc<dyn ChunkStore>,
    /// Relays finished files to the hosting services
    pub forwarder: Arc<dyn Forwarder>,
}

impl AppState {
    pub fn new(store: Arc<dyn ChunkStore>, forwarder: Arc<dyn Forwarder>) -> Self {
        Self {
            store,
            forwarder,
        }
    }
}
