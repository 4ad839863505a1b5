//! Lifecycle event notifications
//!
//! Every orchestrator operation emits a starting event before its mutating
//! side effect and a completed event after, so external subscribers (the
//! host's provider loader, a UI) can react. Events ride a broadcast channel:
//! no global event bus, and emission with no subscribers is a no-op rather
//! than an error.

use tokio::sync::broadcast;
use tracing::debug;

/// Notifications emitted around each lifecycle phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    Installing { name: String },
    Installed { name: String },
    Updating { name: String },
    Updated { name: String },
    Enabling { name: String },
    Enabled { name: String },
    Disabling { name: String },
    Disabled { name: String },
    Uninstalling { name: String },
    Uninstalled { name: String },
    Making { name: String },
    Made { name: String },
    /// The registry repository was registered in the project package file.
    Setup,
    /// Result of an explicit update check: names with a newer version.
    UpdatesAvailable { names: Vec<String> },
}

/// Broadcast fan-out for [`HookEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HookEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<HookEvent> {
        self.sender.subscribe()
    }

    /// Emit an event. Lagging or absent subscribers never fail the operation.
    pub fn emit(&self, event: HookEvent) {
        debug!(?event, "hook event");
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
