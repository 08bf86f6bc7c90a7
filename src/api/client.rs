//! Async HTTP client for the yuyu REST API.
//!
//! Raw calls ([`ApiClient::get`], [`ApiClient::post`]) never fail: transport
//! errors, error statuses and unparseable bodies are folded into an
//! [`ApiResponse`]. The typed endpoint methods then turn that into a
//! [`Result`].

use crate::api::types::*;
use crate::config::ClientConfig;
use crate::error::{Result, YuyuError};
use crate::social::types::{CommentId, FollowAction, LikeAction, UserId, WeiboId};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, instrument, warn};

/// HTTP client bound to one API base.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.has_token())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for `config.api_base` with the configured timeout.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| YuyuError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets or clears the bearer token sent with every request.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request and normalises whatever comes back.
    async fn execute(&self, request: RequestBuilder) -> ApiResponse {
        let response = match self.authorize(request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request failed: {}", e);
                return ApiResponse::transport(e.to_string());
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) if bytes.is_empty() => Value::Null,
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                debug!("Response body is not JSON: {}", e);
                Value::Null
            }),
            Err(e) => {
                warn!("Failed to read response body: {}", e);
                Value::Null
            }
        };

        ApiResponse::from_parts(status.as_u16(), status.is_success(), body)
    }

    /// `GET {base}{path}`.
    pub async fn get(&self, path: &str) -> ApiResponse {
        debug!("GET {}", path);
        self.execute(self.client.get(self.url(path))).await
    }

    /// `GET {base}{path}` with query parameters.
    pub async fn get_with_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> ApiResponse {
        debug!("GET {}", path);
        self.execute(self.client.get(self.url(path)).query(query))
            .await
    }

    /// `POST {base}{path}` with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResponse {
        debug!("POST {}", path);
        self.execute(self.client.post(self.url(path)).json(body))
            .await
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Creates an account.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthGrant> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let grant: AuthGrant = self.post("/register", &request).await.into_typed_ack()?;
        info!("Registered user {}", grant.user_id);
        Ok(grant)
    }

    /// Exchanges credentials for a token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthGrant> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let grant: AuthGrant = self.post("/login", &request).await.into_typed_ack()?;
        info!("Logged in as user {}", grant.user_id);
        Ok(grant)
    }

    /// Profile of the token's owner.
    #[instrument(skip(self))]
    pub async fn user_info(&self) -> Result<UserInfo> {
        let response: UserInfoResponse = self.get("/user/info").await.into_typed_ack()?;
        Ok(response.data)
    }

    #[instrument(skip(self, avatar))]
    pub async fn update_profile(&self, username: &str, avatar: &str) -> Result<()> {
        let request = ProfileUpdateRequest {
            username: username.to_string(),
            avatar: avatar.to_string(),
        };
        self.post("/user/update", &request).await.into_ack()?;
        info!("Updated profile");
        Ok(())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Most recent posts, newest first.
    #[instrument(skip(self))]
    pub async fn weibos(&self, limit: u32) -> Result<FeedList> {
        let feed: FeedList = self
            .get_with_query("/weibos", &[("limit", limit)])
            .await
            .into_typed()?;
        debug!("Fetched {} posts", feed.weibos.len());
        Ok(feed)
    }

    #[instrument(skip(self, content, media))]
    pub async fn create_weibo(&self, user_id: UserId, content: &str, media: &str) -> Result<WeiboId> {
        let request = CreateWeiboRequest {
            user_id,
            content: content.to_string(),
            media: media.to_string(),
        };
        let created: CreatedWeibo = self.post("/weibo", &request).await.into_typed_ack()?;
        info!(weibo_id = created.weibo_id, "Created post");
        Ok(created.weibo_id)
    }

    #[instrument(skip(self))]
    pub async fn delete_weibo(&self, weibo_id: WeiboId) -> Result<()> {
        self.post("/weibo/delete", &DeleteWeiboRequest { weibo_id })
            .await
            .into_ack()?;
        info!(weibo_id, "Deleted post");
        Ok(())
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Ids of posts the token's owner has liked.
    #[instrument(skip(self))]
    pub async fn user_likes(&self) -> Result<HashSet<WeiboId>> {
        let liked: LikedIds = self.get("/user_likes").await.into_typed()?;
        Ok(liked.weibo_ids.into_iter().collect())
    }

    #[instrument(skip(self))]
    pub async fn like(&self, weibo_id: WeiboId, action: LikeAction) -> Result<()> {
        self.post("/like", &LikeRequest { weibo_id, action })
            .await
            .into_ack()?;
        debug!(weibo_id, %action, "Like accepted");
        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn comments(&self, weibo_id: WeiboId) -> Result<CommentList> {
        let list: CommentList = self
            .get_with_query("/comments", &[("weibo_id", weibo_id)])
            .await
            .into_typed()?;
        debug!(weibo_id, "Fetched {} comments", list.comments.len());
        Ok(list)
    }

    #[instrument(skip(self, content))]
    pub async fn create_comment(
        &self,
        weibo_id: WeiboId,
        content: &str,
        parent_id: Option<CommentId>,
    ) -> Result<Option<CommentId>> {
        let request = CreateCommentRequest {
            weibo_id,
            content: content.to_string(),
            parent_id,
        };
        let created: CreatedComment = self.post("/comment", &request).await.into_typed_ack()?;
        info!(weibo_id, ?parent_id, "Created comment");
        Ok(created.comment_id)
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(&self, comment_id: CommentId) -> Result<()> {
        self.post("/comment/delete", &DeleteCommentRequest { comment_id })
            .await
            .into_ack()?;
        info!(comment_id, "Deleted comment");
        Ok(())
    }

    // =========================================================================
    // Follows
    // =========================================================================

    /// Ids of the users `user_id` follows.
    #[instrument(skip(self))]
    pub async fn following(&self, user_id: UserId) -> Result<HashSet<UserId>> {
        let list: FollowingList = self
            .get_with_query("/following", &[("user_id", user_id)])
            .await
            .into_typed()?;
        Ok(list.users.into_iter().map(|u| u.user_id).collect())
    }

    #[instrument(skip(self))]
    pub async fn follow(&self, followee_id: UserId, action: FollowAction) -> Result<()> {
        self.post("/follow", &FollowRequest { followee_id, action })
            .await
            .into_ack()?;
        debug!(followee_id, %action, "Follow accepted");
        Ok(())
    }
}
