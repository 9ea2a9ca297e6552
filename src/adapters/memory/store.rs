//! In-memory storage adapter.
//!
//! Keeps texts and amendments in one map pair behind a single lock, so a
//! resolution commit is atomic with respect to every other reader and writer.
//! Useful for tests and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::amend::Amend;
use crate::domain::foundation::{AmendId, DomainError, ErrorCode, TextId};
use crate::domain::text::Text;
use crate::ports::{
    stale_changeset, AmendRepository, ResolutionChangeset, ResolutionStore, TextRepository,
};

#[derive(Debug, Default)]
struct State {
    texts: HashMap<TextId, Text>,
    amends: HashMap<AmendId, Amend>,
}

/// In-memory implementation of every storage port.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    writes: Arc<AtomicUsize>,
    fail_commits: Arc<AtomicBool>,
    commit_delay: Arc<std::sync::Mutex<Option<Duration>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful write operations (save, update, commit).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every following commit fail without writing anything.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Delays every following commit before it writes.
    pub fn delay_commits(&self, delay: Option<Duration>) {
        *self
            .commit_delay
            .lock()
            .expect("InMemoryStore: delay lock poisoned") = delay;
    }

    pub async fn text_count(&self) -> usize {
        self.state.read().await.texts.len()
    }

    pub async fn amend_count(&self) -> usize {
        self.state.read().await.amends.len()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn by_creation(amends: &mut [Amend]) {
    amends.sort_by(|a, b| (a.created_at(), a.id()).cmp(&(b.created_at(), b.id())));
}

#[async_trait]
impl TextRepository for InMemoryStore {
    async fn save(&self, text: &Text) -> Result<(), DomainError> {
        self.state.write().await.texts.insert(*text.id(), text.clone());
        self.record_write();
        Ok(())
    }

    async fn update(&self, text: &Text) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        match state.texts.get_mut(text.id()) {
            Some(stored) => *stored = text.clone(),
            None => {
                return Err(DomainError::new(
                    ErrorCode::TextNotFound,
                    format!("Text not found: {}", text.id()),
                ))
            }
        }
        self.record_write();
        Ok(())
    }

    async fn find_by_id(&self, id: &TextId) -> Result<Option<Text>, DomainError> {
        Ok(self.state.read().await.texts.get(id).cloned())
    }

    async fn list_ids(&self) -> Result<Vec<TextId>, DomainError> {
        let state = self.state.read().await;
        let mut texts: Vec<&Text> = state.texts.values().collect();
        texts.sort_by(|a, b| (a.created_at(), a.id()).cmp(&(b.created_at(), b.id())));
        Ok(texts.into_iter().map(|t| *t.id()).collect())
    }
}

#[async_trait]
impl AmendRepository for InMemoryStore {
    async fn save(&self, amend: &Amend) -> Result<(), DomainError> {
        self.state.write().await.amends.insert(*amend.id(), amend.clone());
        self.record_write();
        Ok(())
    }

    async fn update(&self, amend: &Amend) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        match state.amends.get_mut(amend.id()) {
            Some(stored) => *stored = amend.clone(),
            None => {
                return Err(DomainError::new(
                    ErrorCode::AmendNotFound,
                    format!("Amend not found: {}", amend.id()),
                ))
            }
        }
        self.record_write();
        Ok(())
    }

    async fn find_by_id(&self, id: &AmendId) -> Result<Option<Amend>, DomainError> {
        Ok(self.state.read().await.amends.get(id).cloned())
    }

    async fn find_open_by_text(&self, text_id: &TextId) -> Result<Vec<Amend>, DomainError> {
        let mut amends: Vec<Amend> = self
            .state
            .read()
            .await
            .amends
            .values()
            .filter(|a| a.text_id() == text_id && !a.is_closed())
            .cloned()
            .collect();
        by_creation(&mut amends);
        Ok(amends)
    }

    async fn find_by_text(&self, text_id: &TextId) -> Result<Vec<Amend>, DomainError> {
        let mut amends: Vec<Amend> = self
            .state
            .read()
            .await
            .amends
            .values()
            .filter(|a| a.text_id() == text_id)
            .cloned()
            .collect();
        by_creation(&mut amends);
        Ok(amends)
    }
}

#[async_trait]
impl ResolutionStore for InMemoryStore {
    async fn commit(&self, changeset: ResolutionChangeset<'_>) -> Result<(), DomainError> {
        let delay = *self
            .commit_delay
            .lock()
            .expect("InMemoryStore: delay lock poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(DomainError::database("Commit rejected"));
        }

        let mut state = self.state.write().await;

        // validate everything before the first write
        if let Some(text) = changeset.text {
            let stored = state.texts.get(text.id()).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::TextNotFound,
                    format!("Text not found: {}", text.id()),
                )
            })?;
            if stored.version() + 1 != text.version() {
                return Err(stale_changeset(format!("Text {}", text.id())));
            }
        }
        for amend in changeset.amends {
            match state.amends.get(amend.id()) {
                None => {
                    return Err(DomainError::new(
                        ErrorCode::AmendNotFound,
                        format!("Amend not found: {}", amend.id()),
                    ))
                }
                Some(stored) if stored.is_closed() => {
                    return Err(stale_changeset(format!("Amend {}", amend.id())))
                }
                Some(_) => {}
            }
        }

        if let Some(text) = changeset.text {
            state.texts.insert(*text.id(), text.clone());
        }
        for amend in changeset.amends {
            state.amends.insert(*amend.id(), amend.clone());
        }
        self.record_write();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::patch::PatchEngine;

    fn text() -> Text {
        let engine = PatchEngine::default();
        let mut text = Text::new("Charter".into(), "Founding charter".into()).unwrap();
        text.append_patch(&engine, engine.diff("", "Hello world.")).unwrap();
        text
    }

    fn amend(text: &Text, proposed: &str) -> Amend {
        let patch = PatchEngine::default().diff(text.body(), proposed);
        Amend::propose(text, UserId::new("author").unwrap(), "Change".into(), String::new(), patch)
            .unwrap()
    }

    #[tokio::test]
    async fn find_open_by_text_skips_closed_and_foreign() {
        let store = InMemoryStore::new();
        let text = text();
        let other = self::text();
        let open = amend(&text, "Hello earth.");
        let mut closed = amend(&text, "Hello there.");
        closed.refuse(Timestamp::now()).unwrap();
        let foreign = amend(&other, "Hi.");

        for a in [&open, &closed, &foreign] {
            AmendRepository::save(&store, a).await.unwrap();
        }

        let found = store.find_open_by_text(text.id()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), open.id());
        assert_eq!(store.find_by_text(text.id()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_of_unknown_text_fails() {
        let store = InMemoryStore::new();
        let err = TextRepository::update(&store, &text()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TextNotFound);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn commit_with_unknown_amend_writes_nothing() {
        let store = InMemoryStore::new();
        let mut text = text();
        TextRepository::save(&store, &text).await.unwrap();
        let unsaved = amend(&text, "Hello earth.");
        let engine = PatchEngine::default();
        text.append_patch(&engine, engine.diff(text.body(), "Hello there.")).unwrap();
        text.follow(UserId::new("f").unwrap()).unwrap();

        let amends = vec![unsaved];
        let err = store
            .commit(ResolutionChangeset {
                text: Some(&text),
                amends: &amends,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::AmendNotFound);
        let stored = TextRepository::find_by_id(&store, text.id()).await.unwrap().unwrap();
        assert_eq!(stored.followers_count(), 0);
    }

    #[tokio::test]
    async fn commit_from_stale_text_version_is_rejected() {
        let store = InMemoryStore::new();
        let engine = PatchEngine::default();
        let base = text();
        TextRepository::save(&store, &base).await.unwrap();

        let mut first = base.clone();
        first.append_patch(&engine, engine.diff(base.body(), "Hello brave world.")).unwrap();
        let mut second = base.clone();
        second.append_patch(&engine, engine.diff(base.body(), "Hello world!")).unwrap();

        store
            .commit(ResolutionChangeset {
                text: Some(&first),
                amends: &[],
            })
            .await
            .unwrap();
        let err = store
            .commit(ResolutionChangeset {
                text: Some(&second),
                amends: &[],
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ConcurrentModification);
        let stored = TextRepository::find_by_id(&store, base.id()).await.unwrap().unwrap();
        assert_eq!(stored.body(), "Hello brave world.");
    }

    #[tokio::test]
    async fn commit_touching_a_closed_amend_is_rejected() {
        let store = InMemoryStore::new();
        let text = text();
        let mut refused = amend(&text, "Hello earth.");
        AmendRepository::save(&store, &refused).await.unwrap();
        refused.refuse(Timestamp::now()).unwrap();
        AmendRepository::update(&store, &refused).await.unwrap();

        let err = store
            .commit(ResolutionChangeset {
                text: None,
                amends: std::slice::from_ref(&refused),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ConcurrentModification);
    }

    #[tokio::test]
    async fn failing_commit_is_reported() {
        let store = InMemoryStore::new();
        store.fail_commits(true);
        let err = store
            .commit(ResolutionChangeset {
                text: None,
                amends: &[],
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
