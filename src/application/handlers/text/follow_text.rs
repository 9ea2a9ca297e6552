//! FollowTextHandler / UnfollowTextHandler - Command handlers for followers.
//!
//! The follower count is the electorate snapshotted when voting ends, so
//! both handlers hold the text lock while they read and write the text.

use std::sync::Arc;

use crate::application::TextLocks;
use crate::domain::foundation::{
    CommandMetadata, EventId, SerializableDomainEvent, TextId, Timestamp, UserId,
};
use crate::domain::text::{Text, TextError, TextFollowersChanged};
use crate::ports::{EventPublisher, TextRepository};

/// Command to follow a text.
#[derive(Debug, Clone)]
pub struct FollowTextCommand {
    pub text_id: TextId,
    pub user_id: UserId,
}

/// Command to stop following a text.
#[derive(Debug, Clone)]
pub struct UnfollowTextCommand {
    pub text_id: TextId,
    pub user_id: UserId,
}

/// Result of a follower change.
#[derive(Debug, Clone)]
pub struct FollowersChangedResult {
    pub text: Text,
    pub event: TextFollowersChanged,
}

struct FollowerUpdater {
    repository: Arc<dyn TextRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    locks: Arc<TextLocks>,
}

impl FollowerUpdater {
    async fn apply(
        &self,
        text_id: TextId,
        user_id: UserId,
        following: bool,
        metadata: CommandMetadata,
    ) -> Result<FollowersChangedResult, TextError> {
        let _guard = self.locks.lock(text_id).await;

        let mut text = self
            .repository
            .find_by_id(&text_id)
            .await?
            .ok_or_else(|| TextError::not_found(text_id))?;

        if following {
            text.follow(user_id.clone())?;
        } else {
            text.unfollow(&user_id)?;
        }
        self.repository.update(&text).await?;

        let event = TextFollowersChanged {
            event_id: EventId::new(),
            text_id,
            user_id,
            following,
            followers_count: text.followers_count(),
            changed_at: Timestamp::now(),
        };
        self.event_publisher
            .publish(metadata.stamp(event.to_envelope()))
            .await?;

        Ok(FollowersChangedResult { text, event })
    }
}

/// Handler for following texts.
pub struct FollowTextHandler {
    inner: FollowerUpdater,
}

impl FollowTextHandler {
    pub fn new(
        repository: Arc<dyn TextRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        locks: Arc<TextLocks>,
    ) -> Self {
        Self {
            inner: FollowerUpdater {
                repository,
                event_publisher,
                locks,
            },
        }
    }

    pub async fn handle(
        &self,
        cmd: FollowTextCommand,
        metadata: CommandMetadata,
    ) -> Result<FollowersChangedResult, TextError> {
        self.inner.apply(cmd.text_id, cmd.user_id, true, metadata).await
    }
}

/// Handler for unfollowing texts.
pub struct UnfollowTextHandler {
    inner: FollowerUpdater,
}

impl UnfollowTextHandler {
    pub fn new(
        repository: Arc<dyn TextRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        locks: Arc<TextLocks>,
    ) -> Self {
        Self {
            inner: FollowerUpdater {
                repository,
                event_publisher,
                locks,
            },
        }
    }

    pub async fn handle(
        &self,
        cmd: UnfollowTextCommand,
        metadata: CommandMetadata,
    ) -> Result<FollowersChangedResult, TextError> {
        self.inner.apply(cmd.text_id, cmd.user_id, false, metadata).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryEventBus, InMemoryStore};

    struct Fixture {
        follow: FollowTextHandler,
        unfollow: UnfollowTextHandler,
        bus: Arc<InMemoryEventBus>,
        text_id: TextId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let locks = Arc::new(TextLocks::new());
        let text = Text::new("Charter".into(), "Founding charter".into()).unwrap();
        store.save(&text).await.unwrap();

        Fixture {
            follow: FollowTextHandler::new(store.clone(), bus.clone(), locks.clone()),
            unfollow: UnfollowTextHandler::new(store, bus.clone(), locks),
            bus,
            text_id: *text.id(),
        }
    }

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[tokio::test]
    async fn follow_then_unfollow() {
        let f = fixture().await;

        let followed = f
            .follow
            .handle(
                FollowTextCommand {
                    text_id: f.text_id,
                    user_id: alice(),
                },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap();
        assert_eq!(followed.event.followers_count, 1);

        let unfollowed = f
            .unfollow
            .handle(
                UnfollowTextCommand {
                    text_id: f.text_id,
                    user_id: alice(),
                },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap();
        assert_eq!(unfollowed.text.followers_count(), 0);
        assert!(!unfollowed.event.following);
        assert_eq!(f.bus.events_of_type("text.followers_changed.v1").len(), 2);
    }

    #[tokio::test]
    async fn duplicate_follow_is_rejected() {
        let f = fixture().await;
        let cmd = FollowTextCommand {
            text_id: f.text_id,
            user_id: alice(),
        };

        f.follow.handle(cmd.clone(), CommandMetadata::test_fixture()).await.unwrap();
        let err = f
            .follow
            .handle(cmd, CommandMetadata::test_fixture())
            .await
            .unwrap_err();

        assert_eq!(err, TextError::AlreadyFollowing);
        assert_eq!(f.bus.event_count(), 1);
    }

    #[tokio::test]
    async fn unfollow_without_following_is_rejected() {
        let f = fixture().await;
        let err = f
            .unfollow
            .handle(
                UnfollowTextCommand {
                    text_id: f.text_id,
                    user_id: alice(),
                },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap_err();

        assert_eq!(err, TextError::NotFollowing);
    }

    #[tokio::test]
    async fn unknown_text_is_not_found() {
        let f = fixture().await;
        let missing = TextId::new();
        let err = f
            .follow
            .handle(
                FollowTextCommand {
                    text_id: missing,
                    user_id: alice(),
                },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap_err();

        assert_eq!(err, TextError::NotFound(missing));
    }
}
