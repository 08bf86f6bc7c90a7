//! High-level microblog client.
//!
//! [`YuyuClient`] combines the HTTP layer, the session store and the
//! client-side [`AppState`]. Every operation takes `&self`, so several may
//! be in flight at once on one client; the state lock is only taken for
//! synchronous transitions and is never held across an `.await`.
//!
//! ## Usage
//!
//! ```ignore
//! let client = YuyuClient::new(ClientConfig::from_env())?;
//! client.restore();
//! client.load_feed().await;
//!
//! let shown = client.with_state(|s| s.visible_feed().len());
//! client.toggle_like(weibo_id).await?;
//! ```

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{Result, YuyuError};
use crate::media::ImageData;
use crate::session::{FileSessionStore, SessionStore};
use crate::social::state::{AppState, Effect, PendingMutation};
use crate::social::thread::CommentForest;
use crate::social::types::{
    CommentId, FeedView, SessionUser, UserId, WeiboId, ROOT_PARENT,
};
use crate::validation::Validator;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Client for one user of a yuyu server.
pub struct YuyuClient {
    api: ApiClient,
    store: Box<dyn SessionStore>,
    state: Mutex<AppState>,
    config: ClientConfig,
}

impl YuyuClient {
    /// Creates a client that persists its session to `config.session_path`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let store = FileSessionStore::new(config.session_path.clone());
        Self::with_store(config, store)
    }

    /// Creates a client with a custom session store.
    pub fn with_store(config: ClientConfig, store: impl SessionStore + 'static) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(&config)?,
            store: Box::new(store),
            state: Mutex::new(AppState::new()),
            config,
        })
    }

    /// The underlying HTTP client.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        lock(&self.state)
    }

    /// Runs `f` against the current state.
    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.lock())
    }

    /// Current session, if logged in.
    pub fn session(&self) -> Option<Arc<SessionUser>> {
        self.lock().session()
    }

    fn require_session(&self) -> Result<Arc<SessionUser>> {
        self.session().ok_or(YuyuError::NotAuthenticated)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Loads the persisted session, if any.
    ///
    /// An unreadable record is treated as no session.
    pub fn restore(&self) -> Option<Arc<SessionUser>> {
        let session = match self.store.load() {
            Ok(session) => session?,
            Err(e) => {
                warn!("Ignoring stored session: {}", e);
                return None;
            }
        };
        info!("Restored session for user {}", session.user_id);
        self.activate(session);
        self.session()
    }

    fn activate(&self, session: SessionUser) {
        self.api.set_token(Some(session.token.clone()));
        self.lock().set_session(Some(session));
    }

    /// Logs in and loads the feed.
    ///
    /// The initial username is the local part of the email; the server
    /// profile replaces it when available.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Arc<SessionUser>> {
        Validator::validate_login(email, password)?;
        let grant = self.api.login(email.trim(), password).await?;
        let username = Validator::email_local_part(email).to_string();
        self.establish(grant.user_id, grant.token, username).await
    }

    /// Creates an account, logs in as it and loads the feed.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Arc<SessionUser>> {
        Validator::validate_register(username, email, password)?;
        let grant = self
            .api
            .register(username.trim(), email.trim(), password)
            .await?;
        self.establish(grant.user_id, grant.token, username.trim().to_string())
            .await
    }

    async fn establish(
        &self,
        user_id: UserId,
        token: String,
        username: String,
    ) -> Result<Arc<SessionUser>> {
        let mut session = SessionUser {
            user_id,
            username,
            token,
            avatar: String::new(),
        };

        self.api.set_token(Some(session.token.clone()));
        match self.api.user_info().await {
            Ok(info) => {
                if !info.username.is_empty() {
                    session.username = info.username;
                }
                session.avatar = info.avatar.unwrap_or_default();
            }
            Err(e) => debug!("Profile refresh failed: {}", e),
        }

        if let Err(e) = self.store.save(&session) {
            self.api.set_token(None);
            return Err(e);
        }
        self.activate(session);
        self.load_feed().await;
        self.require_session()
    }

    /// Forgets the session locally and in the store.
    pub fn logout(&self) -> Result<()> {
        self.api.set_token(None);
        self.lock().set_session(None);
        self.store.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Changes the username and/or avatar.
    ///
    /// An empty `username` keeps the current one.
    #[instrument(skip(self, avatar))]
    pub async fn update_profile(
        &self,
        username: &str,
        avatar: Option<ImageData>,
    ) -> Result<Arc<SessionUser>> {
        let current = self.require_session()?;
        let username = username.trim();
        Validator::validate_profile_update(username, &current.username, avatar.is_some())?;

        let avatar = avatar.map(ImageData::into_data_uri);
        self.api
            .update_profile(username, avatar.as_deref().unwrap_or_default())
            .await?;

        let updated = self
            .lock()
            .update_session(|s| {
                if !username.is_empty() {
                    s.username = username.to_string();
                }
                if let Some(avatar) = avatar {
                    s.avatar = avatar;
                }
            })
            .ok_or(YuyuError::NotAuthenticated)?;
        self.store.save(&updated)?;
        Ok(updated)
    }

    /// Drops the avatar from the local session only.
    pub fn clear_avatar(&self) -> Result<Arc<SessionUser>> {
        let updated = self
            .lock()
            .update_session(|s| s.avatar.clear())
            .ok_or(YuyuError::NotAuthenticated)?;
        self.store.save(&updated)?;
        Ok(updated)
    }

    // =========================================================================
    // Feed
    // =========================================================================

    /// Reloads the feed and, with a session, the like and follow caches.
    ///
    /// Never fails: an unreachable feed leaves it empty and a failed cache
    /// fetch leaves that cache empty. Failures are logged.
    #[instrument(skip(self))]
    pub async fn load_feed(&self) {
        let me = self.lock().user_id();

        let feed = match self.api.weibos(self.config.feed_limit).await {
            Ok(list) => list.weibos,
            Err(e) => {
                warn!("Failed to load feed: {}", e);
                Vec::new()
            }
        };

        let (likes, following) = match me {
            Some(me) => {
                let (likes, following) =
                    tokio::join!(self.api.user_likes(), self.api.following(me));
                (
                    likes.unwrap_or_else(|e| {
                        warn!("Failed to load likes: {}", e);
                        HashSet::new()
                    }),
                    following.unwrap_or_else(|e| {
                        warn!("Failed to load following: {}", e);
                        HashSet::new()
                    }),
                )
            }
            None => (HashSet::new(), HashSet::new()),
        };

        let mut state = self.lock();
        if state.user_id() != me {
            debug!("Session changed during feed load, dropping caches");
            state.replace_feed(feed, HashSet::new(), HashSet::new());
        } else {
            state.replace_feed(feed, likes, following);
        }
        debug!("Feed holds {} posts", state.feed().len());
    }

    pub fn set_view(&self, view: FeedView) {
        self.lock().set_view(view);
    }

    pub fn toggle_view(&self) -> FeedView {
        self.lock().toggle_view()
    }

    // =========================================================================
    // Reactions
    // =========================================================================

    /// Likes or unlikes a post, showing the change before the server answers.
    ///
    /// On failure the change is reverted and the error returned. Returns the
    /// effect that was confirmed.
    #[instrument(skip(self))]
    pub async fn toggle_like(&self, weibo_id: WeiboId) -> Result<Effect> {
        let pending = self.lock().begin_like(weibo_id)?;
        self.settle(pending).await
    }

    /// Follows or unfollows an author, showing the change before the server
    /// answers.
    #[instrument(skip(self))]
    pub async fn toggle_follow(&self, user_id: UserId) -> Result<Effect> {
        let pending = self.lock().begin_follow(user_id)?;
        self.settle(pending).await
    }

    async fn settle(&self, pending: PendingMutation) -> Result<Effect> {
        let effect = pending.effect();
        let guard = Settle {
            state: &self.state,
            pending: Some(pending),
        };

        let outcome = match effect {
            Effect::Like { weibo_id, action } => self.api.like(weibo_id, action).await,
            Effect::Follow {
                followee_id,
                action,
            } => self.api.follow(followee_id, action).await,
        };

        match outcome {
            Ok(()) => {
                guard.confirm();
                Ok(effect)
            }
            Err(e) => {
                warn!(?effect, "Reverting optimistic change: {}", e);
                drop(guard);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Posts and comments
    // =========================================================================

    /// Publishes a post and reloads the feed.
    #[instrument(skip(self, content, media))]
    pub async fn post_weibo(&self, content: &str, media: Option<ImageData>) -> Result<WeiboId> {
        let session = self.require_session()?;
        let content = Validator::validate_weibo_content(content)?;
        let media = media.map(ImageData::into_data_uri).unwrap_or_default();

        let weibo_id = self
            .api
            .create_weibo(session.user_id, content, &media)
            .await?;
        self.load_feed().await;
        Ok(weibo_id)
    }

    /// Deletes a post and drops it from the local feed.
    #[instrument(skip(self))]
    pub async fn delete_weibo(&self, weibo_id: WeiboId) -> Result<()> {
        self.require_session()?;
        self.api.delete_weibo(weibo_id).await?;
        self.lock().remove_item(weibo_id);
        Ok(())
    }

    /// Fetches the comments of a post as a fresh thread.
    ///
    /// Leaves client state untouched.
    #[instrument(skip(self))]
    pub async fn open_comments(&self, weibo_id: WeiboId) -> Result<CommentForest> {
        let list = self.api.comments(weibo_id).await?;
        let forest = CommentForest::build(list.comments);
        let orphans = forest.orphans().len();
        if orphans > 0 {
            debug!(weibo_id, "{} comments are unreachable from the root", orphans);
        }
        Ok(forest)
    }

    /// Adds a comment, or a reply when `parent_id` names another comment.
    #[instrument(skip(self, content))]
    pub async fn add_comment(
        &self,
        weibo_id: WeiboId,
        content: &str,
        parent_id: Option<CommentId>,
    ) -> Result<Option<CommentId>> {
        self.require_session()?;
        let content = Validator::validate_comment_content(content)?;
        let parent_id = parent_id.filter(|&p| p != ROOT_PARENT);

        let comment_id = self.api.create_comment(weibo_id, content, parent_id).await?;
        self.load_feed().await;
        Ok(comment_id)
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(&self, comment_id: CommentId) -> Result<()> {
        self.require_session()?;
        self.api.delete_comment(comment_id).await?;
        self.load_feed().await;
        Ok(())
    }
}

fn lock(state: &Mutex<AppState>) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Settles a pending mutation exactly once. Rolls back when dropped
/// unconfirmed, including when the owning future is cancelled.
struct Settle<'a> {
    state: &'a Mutex<AppState>,
    pending: Option<PendingMutation>,
}

impl Settle<'_> {
    fn confirm(mut self) {
        if let Some(pending) = self.pending.take() {
            lock(self.state).confirm(pending);
        }
    }
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            lock(self.state).rollback(pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use crate::social::types::FeedItem;

    fn offline_client() -> YuyuClient {
        let config = ClientConfig::default().with_api_base("http://127.0.0.1:1/api");
        YuyuClient::with_store(config, MemorySessionStore::new()).unwrap()
    }

    fn item(weibo_id: WeiboId, user_id: UserId) -> FeedItem {
        FeedItem {
            weibo_id,
            user_id,
            username: String::new(),
            avatar: String::new(),
            content: "x".to_string(),
            media: None,
            like_count: 1,
            comment_count: 0,
            created_at: 0,
        }
    }

    #[test]
    fn test_dropped_settle_rolls_back() {
        let client = offline_client();
        client.activate(SessionUser {
            user_id: 1,
            username: "amy".to_string(),
            token: "t".to_string(),
            avatar: String::new(),
        });
        client
            .lock()
            .replace_feed(vec![item(5, 2)], HashSet::new(), HashSet::new());

        let pending = client.lock().begin_like(5).unwrap();
        drop(Settle {
            state: &client.state,
            pending: Some(pending),
        });

        client.with_state(|s| {
            assert!(!s.is_liked(5));
            assert!(!s.is_like_pending(5));
            assert_eq!(s.item(5).unwrap().like_count, 1);
        });
    }

    #[tokio::test]
    async fn test_actions_need_session() {
        let client = offline_client();
        assert!(matches!(
            client.post_weibo("hi", None).await,
            Err(YuyuError::NotAuthenticated)
        ));
        assert!(matches!(
            client.toggle_like(1).await,
            Err(YuyuError::NotAuthenticated)
        ));
        assert!(matches!(client.clear_avatar(), Err(YuyuError::NotAuthenticated)));
    }

    #[test]
    fn test_restore_ignores_empty_store() {
        let client = offline_client();
        assert!(client.restore().is_none());
        assert!(!client.api().has_token());
    }
}
