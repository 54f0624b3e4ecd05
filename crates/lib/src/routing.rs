//! Per-conversation serialization: webhooks for the same conversation are handled one at a time.
//!
//! Different conversations never wait on each other. Entries nobody holds or waits on are
//! pruned whenever a new lock is taken.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-memory table: conversation_id -> lock.
#[derive(Default)]
pub struct ConversationLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other webhook for `conversation_id` is in flight. The guard releases on drop.
    pub async fn lock(&self, conversation_id: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut table = self.inner.lock().await;
            table.retain(|id, lock| id == conversation_id || Arc::strong_count(lock) > 1);
            table
                .entry(conversation_id.to_string())
                .or_default()
                .clone()
        };
        entry.lock_owned().await
    }

    /// Number of conversations currently tracked.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
