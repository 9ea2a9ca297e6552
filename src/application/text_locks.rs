//! Per-text exclusive sections.
//!
//! Every handler that reads a text or its amendments and then writes them
//! back holds the text's lock for the whole read-modify-write. Handlers on
//! different texts never wait for each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

use crate::domain::foundation::TextId;

/// Guard of a text's exclusive section; released on drop.
pub type TextGuard = OwnedMutexGuard<()>;

/// Registry of async mutexes keyed by text.
#[derive(Debug, Default)]
pub struct TextLocks {
    locks: Mutex<HashMap<TextId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TextLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `text_id`.
    ///
    /// Entries nobody holds or waits on are pruned on the way.
    pub async fn lock(&self, text_id: TextId) -> TextGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|id, m| *id == text_id || Arc::strong_count(m) > 1);
            Arc::clone(locks.entry(text_id).or_default())
        };
        mutex.lock_owned().await
    }

    /// Number of texts with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_text_is_exclusive() {
        let locks = Arc::new(TextLocks::new());
        let text_id = TextId::new();

        let guard = locks.lock(text_id).await;
        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(text_id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_texts_do_not_block() {
        let locks = TextLocks::new();
        let _first = locks.lock(TextId::new()).await;

        let second = tokio::time::timeout(Duration::from_millis(100), locks.lock(TextId::new())).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = TextLocks::new();
        for _ in 0..3 {
            let _guard = locks.lock(TextId::new()).await;
        }
        let _guard = locks.lock(TextId::new()).await;

        assert_eq!(locks.len(), 1);
    }
}
