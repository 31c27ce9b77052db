use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::catalog::MediaCatalog;
use crate::config::Config;
use crate::party::{Coordinator, Intent, PartyError};

/// Shared application state exposed to handlers.
///
/// Handlers never see party state; they only hold the sending side of the
/// coordinator's intent queue.
#[derive(Clone)]
pub struct AppState {
    pub intents: mpsc::UnboundedSender<Intent>,
    pub catalog: Arc<dyn MediaCatalog>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Spawn the coordinator for `config` and return the state handlers use
    /// to reach it, plus the coordinator task.
    pub fn spawn(
        config: Config,
        catalog: Arc<dyn MediaCatalog>,
    ) -> (Self, JoinHandle<Result<(), PartyError>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = Coordinator::new(config.party_settings(), catalog.clone());
        let task = tokio::spawn(coordinator.run(rx));
        let state = Self {
            intents: tx,
            catalog,
            config: Arc::new(config),
        };
        (state, task)
    }

    /// Queue an intent. Fails only once the coordinator has stopped.
    pub fn submit(&self, intent: Intent) -> bool {
        match self.intents.send(intent) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(intent = e.0.name(), "coordinator is gone, intent dropped");
                false
            }
        }
    }
}
