//! Request and response shapes for the REST API.
//!
//! Every call, whatever its outcome, is first normalised into an
//! [`ApiResponse`]. Typed results are extracted from it afterwards, so
//! transport failures, HTTP error statuses and `ok:false` bodies all surface
//! through one path.

use crate::error::{Result, YuyuError};
use crate::social::types::{
    Comment, CommentId, FeedItem, FollowAction, LikeAction, UserId, WeiboId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// =============================================================================
// Normalised response
// =============================================================================

/// Outcome of a single API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status was 2xx.
    pub ok: bool,
    /// HTTP status, `None` on transport failure.
    pub status: Option<u16>,
    /// Parsed JSON body, `Null` if absent or not JSON.
    pub body: Value,
    /// Application error from the body, or the transport error.
    pub error: Option<String>,
}

impl ApiResponse {
    /// Builds a response from a received status and body.
    pub fn from_parts(status: u16, success: bool, body: Value) -> Self {
        let error = body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            ok: success,
            status: Some(status),
            body,
            error,
        }
    }

    /// Builds a response for a request that never got an answer.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: None,
            body: Value::Null,
            error: Some(message.into()),
        }
    }

    /// The body's `ok` flag, if present.
    pub fn body_ok(&self) -> Option<bool> {
        self.body.get("ok").and_then(Value::as_bool)
    }

    /// 2xx and the body does not report `ok:false`.
    ///
    /// Listing endpoints omit `ok` on success.
    pub fn succeeded(&self) -> bool {
        self.ok && self.body_ok() != Some(false)
    }

    /// Best available description of a failure.
    pub fn failure_message(&self) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }
        match self.status {
            Some(status) => format!("HTTP {}", status),
            None => "request failed".to_string(),
        }
    }

    fn into_error(self) -> YuyuError {
        let message = self.failure_message();
        YuyuError::api(self.status, message)
    }

    /// Returns the body of a successful query.
    pub fn into_result(self) -> Result<Value> {
        if !self.succeeded() {
            return Err(self.into_error());
        }
        Ok(self.body)
    }

    /// Returns the body of a mutation that the server explicitly accepted
    /// with `ok:true`.
    pub fn into_ack(self) -> Result<Value> {
        if !self.ok || self.body_ok() != Some(true) {
            return Err(self.into_error());
        }
        Ok(self.body)
    }

    /// Deserializes the body of a successful query.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        let value = self.into_result()?;
        serde_json::from_value(value)
            .map_err(|e| YuyuError::serialization(format!("Failed to parse response: {}", e)))
    }

    /// Deserializes the body of an accepted mutation.
    pub fn into_typed_ack<T: DeserializeOwned>(self) -> Result<T> {
        let value = self.into_ack()?;
        serde_json::from_value(value)
            .map_err(|e| YuyuError::serialization(format!("Failed to parse response: {}", e)))
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /register`.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /user/update`. Empty fields are left unchanged server-side.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdateRequest {
    pub username: String,
    /// Avatar as a data URI, or empty.
    pub avatar: String,
}

/// Body of `POST /weibo`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateWeiboRequest {
    pub user_id: UserId,
    pub content: String,
    /// Media as a data URI, or empty.
    pub media: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteWeiboRequest {
    pub weibo_id: WeiboId,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeRequest {
    pub weibo_id: WeiboId,
    pub action: LikeAction,
}

/// Body of `POST /comment`. Top-level comments omit `parent_id`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentRequest {
    pub weibo_id: WeiboId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteCommentRequest {
    pub comment_id: CommentId,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowRequest {
    pub followee_id: UserId,
    pub action: FollowAction,
}

// =============================================================================
// Responses
// =============================================================================

/// Result of register and login.
#[derive(Clone, Deserialize)]
pub struct AuthGrant {
    pub user_id: UserId,
    pub token: String,
}

impl fmt::Debug for AuthGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGrant")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Result of `GET /user/info`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoResponse {
    pub data: UserInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedList {
    #[serde(default)]
    pub weibos: Vec<FeedItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedWeibo {
    pub weibo_id: WeiboId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedComment {
    #[serde(default)]
    pub comment_id: Option<CommentId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LikedIds {
    #[serde(default)]
    pub weibo_ids: Vec<WeiboId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentList {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowingList {
    #[serde(default)]
    pub users: Vec<FollowedUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowedUser {
    pub user_id: UserId,
    #[serde(default)]
    pub username: String,
}
