//! Scheduled global notifications.
//!
//! The notifications app runs one background job that posts a fixed
//! reminder to every user on an interval.

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::NotificationsConfig;
use crate::db::{GlobalNotification, SharedStore};

/// Store a global notification under the first free id.
pub fn publish_global(
    store: &SharedStore<u64, GlobalNotification>,
    text: &str,
) -> GlobalNotification {
    store.insert_next(&mut |id| GlobalNotification {
        id: *id,
        text: text.to_string(),
    })
}

/// Spawn the scheduled notification job. Returns `None` when the interval is 0.
///
/// The first notification is posted immediately, then one per interval.
pub fn spawn_scheduled_notifications(
    store: SharedStore<u64, GlobalNotification>,
    config: &NotificationsConfig,
) -> Option<JoinHandle<()>> {
    if config.schedule_interval_secs == 0 {
        tracing::info!("Scheduled notifications are disabled");
        return None;
    }

    let interval_secs = config.schedule_interval_secs;
    let text = config.scheduled_text.clone();
    tracing::info!(interval_secs, "Starting scheduled notification task");

    Some(tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(interval_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick.tick().await;
            let notification = publish_global(&store, &text);
            tracing::info!(id = notification.id, "Scheduled global notification created");
        }
    }))
}
