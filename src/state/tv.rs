use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::state::notification_queue::{NotificationQueue, QueueSettings};

/// Score change flashed on the TV display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorePopup {
    pub player_name: String,
    pub points: i32,
    pub label: Option<String>,
}

/// Queue dedicated to one party's TV display.
pub type TvQueue = NotificationQueue<ScorePopup>;

/// Registry of TV popup queues keyed by normalized party code.
pub struct TvSessions {
    settings: QueueSettings,
    sessions: DashMap<String, Arc<TvQueue>>,
}

impl TvSessions {
    /// Empty registry; every queue it opens uses `settings`.
    pub fn new(settings: QueueSettings) -> Self {
        Self {
            settings,
            sessions: DashMap::new(),
        }
    }

    /// Return the queue for `party_code`, creating it on first use.
    pub fn open(&self, party_code: &str) -> Arc<TvQueue> {
        self.sessions
            .entry(party_code.to_owned())
            .or_insert_with(|| {
                info!(party_code, "opening TV session");
                Arc::new(NotificationQueue::new(self.settings))
            })
            .clone()
    }

    /// Return the queue for `party_code` without creating one.
    pub fn get(&self, party_code: &str) -> Option<Arc<TvQueue>> {
        self.sessions
            .get(party_code)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Forget the session. Timers stop once the last handle is dropped.
    pub fn close(&self, party_code: &str) -> bool {
        let removed = self.sessions.remove(party_code).is_some();
        if removed {
            info!(party_code, "closed TV session");
        }
        removed
    }

    /// Drop the session if nobody needs it anymore: no popup showing or
    /// waiting, no live watcher, and no other handle in flight.
    ///
    /// Called when a TV display disconnects. Returns whether it was removed.
    pub fn release(&self, party_code: &str) -> bool {
        let removed = self
            .sessions
            .remove_if(party_code, |_, queue| {
                Arc::strong_count(queue) == 1 && !queue.is_draining() && queue.watcher_count() == 0
            })
            .is_some();
        if removed {
            debug!(party_code, "released idle TV session");
        }
        removed
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is open.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
