//! Polls a manager's store for navigation done behind its back.

use common::{
    manager::{Manager, Transport},
    parameter_store::StateStore,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Re-requests whenever the persisted state changed outside the manager, until
/// `cancel` fires. Returns at once for stores that are not watched; call it
/// after the first request, which initializes the store.
pub async fn watch_hash<T: Transport, S: StateStore>(manager: &mut Manager<T, S>, cancel: CancellationToken) {
    let Some(period) = manager.store().poll_interval() else {
        debug!("store is not watched, nothing to poll");
        return;
    };
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = manager.on_navigation().await {
                    warn!("reloading after navigation failed: {:#}", e);
                }
            }
        }
    }
    debug!("hash watcher stopped");
}
