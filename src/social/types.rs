//! Domain types mirrored from the remote API.
//!
//! Wire records are tolerant: missing numbers read as 0, missing or `null`
//! strings read as empty, and an empty `media` reads as no media.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// User identifier assigned by the backend.
pub type UserId = i64;

/// Feed item identifier.
pub type WeiboId = i64;

/// Comment identifier.
pub type CommentId = i64;

/// Parent id of top-level comments.
pub const ROOT_PARENT: CommentId = 0;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

/// A comment on a feed item.
///
/// Comments are immutable once created; deleting one removes it from the
/// server's list entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique comment id.
    pub comment_id: CommentId,
    /// Id of the comment replied to, or [`ROOT_PARENT`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_id: CommentId,
    /// Author id.
    #[serde(default)]
    pub user_id: UserId,
    /// Author display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    /// Author avatar (URL or data URI), empty when unset.
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    /// Comment text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
}

impl Comment {
    /// Returns true if this comment is a top-level comment.
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT
    }
}

/// A single post in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub weibo_id: WeiboId,
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Attached image as a data URI or URL.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub media: Option<String>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    /// Creation time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
}

/// The logged-in identity, persisted verbatim between runs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: UserId,
    #[serde(default)]
    pub username: String,
    pub token: String,
    #[serde(default)]
    pub avatar: String,
}

impl fmt::Debug for SessionUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionUser")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("has_avatar", &!self.avatar.is_empty())
            .finish_non_exhaustive()
    }
}

impl SessionUser {
    /// Name to show for this user, falling back to the numeric id.
    pub fn display_name(&self) -> String {
        display_name(&self.username, self.user_id)
    }
}

/// Formats a username, falling back to `user#<id>` when it is empty.
pub fn display_name(username: &str, user_id: UserId) -> String {
    if username.is_empty() {
        format!("user#{}", user_id)
    } else {
        username.to_string()
    }
}

/// Like mutation sent to `/like`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Like,
    Unlike,
}

impl fmt::Display for LikeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikeAction::Like => write!(f, "like"),
            LikeAction::Unlike => write!(f, "unlike"),
        }
    }
}

/// Follow mutation sent to `/follow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowAction {
    Follow,
    Unfollow,
}

impl fmt::Display for FollowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowAction::Follow => write!(f, "follow"),
            FollowAction::Unfollow => write!(f, "unfollow"),
        }
    }
}

/// Which subset of the feed is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedView {
    /// Every post.
    #[default]
    All,
    /// Only posts by followed authors.
    Following,
}

impl FeedView {
    /// Returns the other view.
    pub fn toggled(self) -> Self {
        match self {
            FeedView::All => FeedView::Following,
            FeedView::Following => FeedView::All,
        }
    }
}
