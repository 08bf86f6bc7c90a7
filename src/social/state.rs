//! Client-side application state and its transitions.
//!
//! [`AppState`] holds everything the client mirrors from the server: the
//! session, the feed, and the like/follow caches. It never performs I/O.
//! Remote mutations are split into three steps so the caller can run the
//! network call in between:
//!
//! 1. `begin_like` / `begin_follow` applies the user's intent immediately and
//!    returns a [`PendingMutation`] describing the remote [`Effect`].
//! 2. The caller executes the effect.
//! 3. `confirm` keeps the new state, `rollback` restores the snapshot taken
//!    in step 1. Either one releases the per-target in-flight guard.
//!
//! A pending mutation belongs to the session it was started in. Once the
//! session changes, settling it is a no-op.
//!
//! The like and follow sets are caches; [`AppState::replace_feed`] replaces
//! them wholesale on every feed load.

use crate::error::{Result, YuyuError};
use crate::social::types::{FeedItem, FeedView, FollowAction, LikeAction, SessionUser, UserId, WeiboId};
use std::collections::HashSet;
use std::sync::Arc;

/// Remote call required to confirm an optimistic change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Like {
        weibo_id: WeiboId,
        action: LikeAction,
    },
    Follow {
        followee_id: UserId,
        action: FollowAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Snapshot {
    Like {
        weibo_id: WeiboId,
        liked: bool,
        like_count: u64,
    },
    Follow {
        user_id: UserId,
        following: bool,
    },
}

/// An optimistic change awaiting server confirmation.
///
/// Must be handed back to [`AppState::confirm`] or [`AppState::rollback`]
/// exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending mutation holds the in-flight guard until confirmed or rolled back"]
pub struct PendingMutation {
    effect: Effect,
    snapshot: Snapshot,
    epoch: u64,
}

impl PendingMutation {
    /// The remote call to execute.
    pub fn effect(&self) -> Effect {
        self.effect
    }
}

/// A feed item as it should be presented to the current user.
#[derive(Debug, Clone, Copy)]
pub struct FeedEntry<'a> {
    pub item: &'a FeedItem,
    pub liked: bool,
    pub following_author: bool,
    /// Like button is offered (logged in).
    pub can_like: bool,
    /// Follow button is offered (logged in, not own post).
    pub can_follow: bool,
    /// Delete button is offered (own post).
    pub can_delete: bool,
}

/// Everything the client knows, owned by a single controller.
#[derive(Debug, Default)]
pub struct AppState {
    session: Option<Arc<SessionUser>>,
    feed: Vec<FeedItem>,
    likes: HashSet<WeiboId>,
    following: HashSet<UserId>,
    view: FeedView,
    pending_likes: HashSet<WeiboId>,
    pending_follows: HashSet<UserId>,
    /// Bumped on every session change.
    epoch: u64,
}

impl AppState {
    /// Creates an empty, logged-out state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state with an existing session.
    pub fn with_session(session: Option<SessionUser>) -> Self {
        let mut state = Self::new();
        state.set_session(session);
        state
    }

    // ==========================================================================
    // Session
    // ==========================================================================

    /// Current session, shared.
    pub fn session(&self) -> Option<Arc<SessionUser>> {
        self.session.clone()
    }

    /// Id of the logged-in user.
    pub fn user_id(&self) -> Option<UserId> {
        self.session.as_ref().map(|s| s.user_id)
    }

    /// Replaces the session.
    ///
    /// Drops every per-user cache, the pending guards and the view selection.
    /// Mutations begun under the previous session can no longer touch state.
    pub fn set_session(&mut self, session: Option<SessionUser>) {
        self.session = session.map(Arc::new);
        self.epoch = self.epoch.wrapping_add(1);
        self.likes.clear();
        self.following.clear();
        self.pending_likes.clear();
        self.pending_follows.clear();
        self.view = FeedView::All;
    }

    /// Copy-on-write update of the session.
    ///
    /// Readers holding the previous `Arc` keep seeing the old value. Returns
    /// the new session, or `None` if logged out.
    pub fn update_session(
        &mut self,
        update: impl FnOnce(&mut SessionUser),
    ) -> Option<Arc<SessionUser>> {
        let current = self.session.as_ref()?;
        let mut next = SessionUser::clone(current);
        update(&mut next);
        let next = Arc::new(next);
        self.session = Some(Arc::clone(&next));
        Some(next)
    }

    // ==========================================================================
    // Feed
    // ==========================================================================

    /// Replaces the feed and refreshes both caches.
    ///
    /// Without a session the caches are emptied regardless of the input.
    pub fn replace_feed(
        &mut self,
        feed: Vec<FeedItem>,
        likes: HashSet<WeiboId>,
        following: HashSet<UserId>,
    ) {
        self.feed = feed;
        if self.session.is_some() {
            self.likes = likes;
            self.following = following;
        } else {
            self.likes.clear();
            self.following.clear();
        }
    }

    /// Full feed in server order.
    pub fn feed(&self) -> &[FeedItem] {
        &self.feed
    }

    /// Looks up a feed item.
    pub fn item(&self, weibo_id: WeiboId) -> Option<&FeedItem> {
        self.feed.iter().find(|w| w.weibo_id == weibo_id)
    }

    /// Removes an item locally. Returns true if it was present.
    pub fn remove_item(&mut self, weibo_id: WeiboId) -> bool {
        let before = self.feed.len();
        self.feed.retain(|w| w.weibo_id != weibo_id);
        self.feed.len() != before
    }

    pub fn likes(&self) -> &HashSet<WeiboId> {
        &self.likes
    }

    pub fn following(&self) -> &HashSet<UserId> {
        &self.following
    }

    pub fn is_liked(&self, weibo_id: WeiboId) -> bool {
        self.likes.contains(&weibo_id)
    }

    pub fn is_following(&self, user_id: UserId) -> bool {
        self.following.contains(&user_id)
    }

    pub fn is_like_pending(&self, weibo_id: WeiboId) -> bool {
        self.pending_likes.contains(&weibo_id)
    }

    pub fn is_follow_pending(&self, user_id: UserId) -> bool {
        self.pending_follows.contains(&user_id)
    }

    pub fn view(&self) -> FeedView {
        self.view
    }

    pub fn set_view(&mut self, view: FeedView) {
        self.view = view;
    }

    /// Flips between the full feed and the following feed.
    pub fn toggle_view(&mut self) -> FeedView {
        self.view = self.view.toggled();
        self.view
    }

    /// The feed filtered by the current view, with per-item affordances.
    ///
    /// The following view only applies with a session.
    pub fn visible_feed(&self) -> Vec<FeedEntry<'_>> {
        let me = self.user_id();
        let filter_following = self.view == FeedView::Following && me.is_some();

        self.feed
            .iter()
            .filter(|w| !filter_following || self.following.contains(&w.user_id))
            .map(|item| {
                let own = me == Some(item.user_id);
                FeedEntry {
                    item,
                    liked: me.is_some() && self.likes.contains(&item.weibo_id),
                    following_author: me.is_some() && self.following.contains(&item.user_id),
                    can_like: me.is_some(),
                    can_follow: me.is_some() && !own,
                    can_delete: own,
                }
            })
            .collect()
    }

    // ==========================================================================
    // Optimistic mutations
    // ==========================================================================

    /// Toggles the like on a feed item ahead of the server.
    ///
    /// The action is derived from the cached like set: an item already liked
    /// always produces [`LikeAction::Unlike`].
    pub fn begin_like(&mut self, weibo_id: WeiboId) -> Result<PendingMutation> {
        if self.session.is_none() {
            return Err(YuyuError::NotAuthenticated);
        }
        if self.pending_likes.contains(&weibo_id) {
            return Err(YuyuError::in_flight(format!("like on weibo {}", weibo_id)));
        }
        let liked = self.likes.contains(&weibo_id);
        let item = self
            .feed
            .iter_mut()
            .find(|w| w.weibo_id == weibo_id)
            .ok_or_else(|| YuyuError::not_found(format!("weibo {}", weibo_id)))?;

        let snapshot = Snapshot::Like {
            weibo_id,
            liked,
            like_count: item.like_count,
        };
        let action = if liked {
            item.like_count = item.like_count.saturating_sub(1);
            self.likes.remove(&weibo_id);
            LikeAction::Unlike
        } else {
            item.like_count = item.like_count.saturating_add(1);
            self.likes.insert(weibo_id);
            LikeAction::Like
        };
        self.pending_likes.insert(weibo_id);

        Ok(PendingMutation {
            effect: Effect::Like { weibo_id, action },
            snapshot,
            epoch: self.epoch,
        })
    }

    /// Toggles following an author ahead of the server.
    pub fn begin_follow(&mut self, user_id: UserId) -> Result<PendingMutation> {
        let me = self.user_id().ok_or(YuyuError::NotAuthenticated)?;
        if me == user_id {
            return Err(YuyuError::validation("cannot follow yourself"));
        }
        if self.pending_follows.contains(&user_id) {
            return Err(YuyuError::in_flight(format!("follow on user {}", user_id)));
        }

        let following = self.following.contains(&user_id);
        let action = if following {
            self.following.remove(&user_id);
            FollowAction::Unfollow
        } else {
            self.following.insert(user_id);
            FollowAction::Follow
        };
        self.pending_follows.insert(user_id);

        Ok(PendingMutation {
            effect: Effect::Follow {
                followee_id: user_id,
                action,
            },
            snapshot: Snapshot::Follow { user_id, following },
            epoch: self.epoch,
        })
    }

    /// The server accepted the change.
    pub fn confirm(&mut self, pending: PendingMutation) {
        if pending.epoch == self.epoch {
            self.release(&pending.snapshot);
        }
    }

    /// The server rejected the change or could not be reached.
    ///
    /// Restores the values captured when the mutation began. If the item has
    /// since left the feed only the cached set is restored. After a logout or
    /// a switch of user nothing is restored or released.
    pub fn rollback(&mut self, pending: PendingMutation) {
        if pending.epoch == self.epoch {
            self.restore(&pending.snapshot);
            self.release(&pending.snapshot);
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        match *snapshot {
            Snapshot::Like {
                weibo_id,
                liked,
                like_count,
            } => {
                if liked {
                    self.likes.insert(weibo_id);
                } else {
                    self.likes.remove(&weibo_id);
                }
                if let Some(item) = self.feed.iter_mut().find(|w| w.weibo_id == weibo_id) {
                    item.like_count = like_count;
                }
            }
            Snapshot::Follow { user_id, following } => {
                if following {
                    self.following.insert(user_id);
                } else {
                    self.following.remove(&user_id);
                }
            }
        }
    }

    fn release(&mut self, snapshot: &Snapshot) {
        match *snapshot {
            Snapshot::Like { weibo_id, .. } => {
                self.pending_likes.remove(&weibo_id);
            }
            Snapshot::Follow { user_id, .. } => {
                self.pending_follows.remove(&user_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user_id: UserId) -> SessionUser {
        SessionUser {
            user_id,
            username: format!("user{}", user_id),
            token: "tok".to_string(),
            avatar: String::new(),
        }
    }

    fn item(weibo_id: WeiboId, user_id: UserId, like_count: u64) -> FeedItem {
        FeedItem {
            weibo_id,
            user_id,
            username: format!("user{}", user_id),
            avatar: String::new(),
            content: "hello".to_string(),
            media: None,
            like_count,
            comment_count: 0,
            created_at: 0,
        }
    }

    fn logged_in_with_feed(feed: Vec<FeedItem>) -> AppState {
        let mut state = AppState::with_session(Some(session(1)));
        state.replace_feed(feed, HashSet::new(), HashSet::new());
        state
    }

    #[test]
    fn test_like_confirm_then_failed_unlike_reverts() {
        let mut state = logged_in_with_feed(vec![item(10, 2, 5)]);

        let pending = state.begin_like(10).unwrap();
        assert_eq!(
            pending.effect(),
            Effect::Like {
                weibo_id: 10,
                action: LikeAction::Like
            }
        );
        assert!(state.is_liked(10));
        assert_eq!(state.item(10).unwrap().like_count, 6);
        state.confirm(pending);
        assert!(!state.is_like_pending(10));

        let pending = state.begin_like(10).unwrap();
        assert_eq!(
            pending.effect(),
            Effect::Like {
                weibo_id: 10,
                action: LikeAction::Unlike
            }
        );
        assert!(!state.is_liked(10));
        assert_eq!(state.item(10).unwrap().like_count, 5);
        state.rollback(pending);

        assert!(state.is_liked(10));
        assert_eq!(state.item(10).unwrap().like_count, 6);
        assert!(!state.is_like_pending(10));
    }

    #[test]
    fn test_like_on_already_liked_becomes_unlike() {
        let mut state = AppState::with_session(Some(session(1)));
        state.replace_feed(
            vec![item(10, 2, 3)],
            HashSet::from([10]),
            HashSet::new(),
        );
        let pending = state.begin_like(10).unwrap();
        assert!(matches!(
            pending.effect(),
            Effect::Like {
                action: LikeAction::Unlike,
                ..
            }
        ));
        assert_eq!(state.item(10).unwrap().like_count, 2);
        state.confirm(pending);
    }

    #[test]
    fn test_unlike_clamps_at_zero() {
        let mut state = AppState::with_session(Some(session(1)));
        state.replace_feed(
            vec![item(10, 2, 0)],
            HashSet::from([10]),
            HashSet::new(),
        );
        let pending = state.begin_like(10).unwrap();
        assert_eq!(state.item(10).unwrap().like_count, 0);
        state.confirm(pending);
        assert_eq!(state.item(10).unwrap().like_count, 0);
    }

    #[test]
    fn test_like_guard_blocks_same_item_only() {
        let mut state = logged_in_with_feed(vec![item(10, 2, 0), item(11, 2, 0)]);
        let first = state.begin_like(10).unwrap();
        assert!(matches!(state.begin_like(10), Err(YuyuError::InFlight(_))));
        let other = state.begin_like(11).unwrap();
        state.confirm(first);
        state.confirm(other);
        assert!(state.begin_like(10).is_ok());
    }

    #[test]
    fn test_like_requires_session_and_known_item() {
        let mut state = AppState::new();
        state.replace_feed(vec![item(10, 2, 0)], HashSet::new(), HashSet::new());
        assert!(matches!(state.begin_like(10), Err(YuyuError::NotAuthenticated)));

        let mut state = logged_in_with_feed(vec![]);
        assert!(matches!(state.begin_like(10), Err(YuyuError::NotFound(_))));
        assert!(!state.is_like_pending(10));
    }

    #[test]
    fn test_follow_guard_and_rollback() {
        let mut state = logged_in_with_feed(vec![item(10, 42, 0)]);

        let pending = state.begin_follow(42).unwrap();
        assert!(state.is_following(42));
        assert!(state.is_follow_pending(42));
        assert!(matches!(state.begin_follow(42), Err(YuyuError::InFlight(_))));

        state.rollback(pending);
        assert!(!state.is_following(42));
        assert!(!state.is_follow_pending(42));
    }

    #[test]
    fn test_follow_existing_becomes_unfollow() {
        let mut state = AppState::with_session(Some(session(1)));
        state.replace_feed(vec![], HashSet::new(), HashSet::from([42]));
        let pending = state.begin_follow(42).unwrap();
        assert_eq!(
            pending.effect(),
            Effect::Follow {
                followee_id: 42,
                action: FollowAction::Unfollow
            }
        );
        assert!(!state.is_following(42));
        state.confirm(pending);
        assert!(!state.is_following(42));
    }

    #[test]
    fn test_cannot_follow_self() {
        let mut state = logged_in_with_feed(vec![]);
        assert!(matches!(state.begin_follow(1), Err(YuyuError::Validation(_))));
    }

    #[test]
    fn test_no_session_has_no_affordances() {
        let mut state = AppState::new();
        state.replace_feed(
            vec![item(10, 2, 1), item(11, 3, 0)],
            HashSet::from([10]),
            HashSet::from([2]),
        );
        assert!(state.likes().is_empty());
        assert!(state.following().is_empty());

        let entries = state.visible_feed();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|e| !e.can_like && !e.can_follow && !e.can_delete && !e.liked));
    }

    #[test]
    fn test_following_view_filters_by_author() {
        let mut state = AppState::with_session(Some(session(1)));
        state.replace_feed(
            vec![item(10, 2, 0), item(11, 3, 0), item(12, 1, 0)],
            HashSet::new(),
            HashSet::from([3]),
        );
        assert_eq!(state.visible_feed().len(), 3);

        assert_eq!(state.toggle_view(), FeedView::Following);
        let ids: Vec<_> = state
            .visible_feed()
            .iter()
            .map(|e| e.item.weibo_id)
            .collect();
        assert_eq!(ids, vec![11]);

        state.set_view(FeedView::All);
        let own = state
            .visible_feed()
            .into_iter()
            .find(|e| e.item.weibo_id == 12)
            .unwrap();
        assert!(own.can_delete);
        assert!(!own.can_follow);
    }

    #[test]
    fn test_logout_clears_caches() {
        let mut state = AppState::with_session(Some(session(1)));
        state.replace_feed(vec![item(10, 2, 0)], HashSet::from([10]), HashSet::from([2]));
        state.set_view(FeedView::Following);
        let _pending = state.begin_follow(3).unwrap();

        state.set_session(None);
        assert!(state.likes().is_empty());
        assert!(state.following().is_empty());
        assert!(!state.is_follow_pending(3));
        assert_eq!(state.view(), FeedView::All);
        assert_eq!(state.feed().len(), 1);
    }

    #[test]
    fn test_rollback_after_logout_restores_nothing() {
        let mut state = AppState::with_session(Some(session(1)));
        state.replace_feed(vec![item(10, 2, 0)], HashSet::new(), HashSet::from([2]));
        let pending = state.begin_follow(2).unwrap();
        state.set_session(None);

        state.rollback(pending);
        assert!(state.following().is_empty());
        assert!(!state.is_follow_pending(2));
    }

    #[test]
    fn test_switching_user_drops_previous_guards() {
        let mut state = AppState::with_session(Some(session(1)));
        state.replace_feed(vec![item(10, 2, 0)], HashSet::new(), HashSet::new());
        let _stale = state.begin_like(10).unwrap();

        state.set_session(Some(session(2)));
        assert!(!state.is_liked(10));
        assert!(!state.is_like_pending(10));
        assert!(state.begin_like(10).is_ok());
    }

    #[test]
    fn test_stale_rollback_leaves_new_session_alone() {
        let mut state = AppState::with_session(Some(session(1)));
        state.replace_feed(vec![item(10, 2, 3)], HashSet::new(), HashSet::new());
        let stale = state.begin_like(10).unwrap();

        state.set_session(None);
        state.set_session(Some(session(2)));
        state.replace_feed(vec![item(10, 2, 3)], HashSet::new(), HashSet::new());
        let current = state.begin_like(10).unwrap();

        state.rollback(stale);
        assert!(state.is_like_pending(10));
        assert!(state.is_liked(10));
        assert_eq!(state.item(10).unwrap().like_count, 4);
        assert!(matches!(state.begin_like(10), Err(YuyuError::InFlight(_))));

        state.confirm(current);
        assert!(!state.is_like_pending(10));
    }

    #[test]
    fn test_stale_confirm_keeps_guard_of_same_user_relogin() {
        let mut state = AppState::with_session(Some(session(1)));
        state.replace_feed(vec![], HashSet::new(), HashSet::new());
        let stale = state.begin_follow(42).unwrap();

        state.set_session(None);
        state.set_session(Some(session(1)));
        let current = state.begin_follow(42).unwrap();

        state.confirm(stale);
        assert!(state.is_follow_pending(42));
        state.rollback(current);
        assert!(!state.is_follow_pending(42));
        assert!(!state.is_following(42));
    }

    #[test]
    fn test_session_update_is_copy_on_write() {
        let mut state = AppState::with_session(Some(session(1)));
        let before = state.session().unwrap();

        let after = state
            .update_session(|s| s.username = "renamed".to_string())
            .unwrap();

        assert_eq!(before.username, "user1");
        assert_eq!(after.username, "renamed");
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(AppState::new().update_session(|_| {}).is_none());
    }

    #[test]
    fn test_remove_item() {
        let mut state = logged_in_with_feed(vec![item(10, 1, 0)]);
        assert!(state.remove_item(10));
        assert!(!state.remove_item(10));
        assert!(state.feed().is_empty());
    }
}
