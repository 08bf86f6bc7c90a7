//! Microblog domain: feed items, threaded comments and optimistic state.
//!
//! ## Layers
//!
//! ```text
//! YuyuClient (client)      effects: HTTP calls, session persistence
//!     └── AppState (state)  pure transitions: begin → confirm | rollback
//!             └── types     wire records shared with the API layer
//! CommentForest (thread)   flat comment list → display order
//! ```
//!
//! Only [`YuyuClient`] touches the network. Everything below it can be
//! exercised without a server.

pub mod client;
pub mod state;
pub mod thread;
pub mod types;

pub use client::YuyuClient;
pub use state::{AppState, Effect, FeedEntry, PendingMutation};
pub use thread::{CommentForest, ThreadedComment, Walk};
pub use types::{
    display_name, Comment, CommentId, FeedItem, FeedView, FollowAction, LikeAction, SessionUser,
    UserId, WeiboId, ROOT_PARENT,
};
