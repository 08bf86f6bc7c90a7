//! # yuyu - microblog client
//!
//! Client library and CLI for a small microblogging service: posts with
//! optional images, likes, follows and threaded comments over a REST/JSON
//! API.
//!
//! ## Features
//!
//! - **Threaded comments**: a flat comment list becomes a depth-annotated,
//!   pre-order thread that tolerates dangling parents and cycles
//! - **Optimistic reactions**: likes and follows show immediately and are
//!   reverted if the server rejects them, with one request in flight per
//!   target
//! - **Fail-open feed loading**: like and follow caches load concurrently
//!   and never block the feed
//! - **Persistent sessions**: the logged-in user survives between runs
//!
//! ## Examples
//!
//! ### Threading comments
//!
//! ```rust
//! use yuyu::social::{Comment, CommentForest};
//!
//! let comment = |comment_id: i64, parent_id: i64| Comment {
//!     comment_id,
//!     parent_id,
//!     user_id: 1,
//!     username: String::new(),
//!     avatar: String::new(),
//!     content: String::new(),
//!     created_at: 0,
//! };
//! let forest = CommentForest::build(vec![comment(1, 0), comment(2, 1), comment(3, 0)]);
//! let order: Vec<_> = forest
//!     .iter()
//!     .map(|t| (t.comment.comment_id, t.depth))
//!     .collect();
//! assert_eq!(order, vec![(1, 0), (2, 1), (3, 0)]);
//! ```
//!
//! ### Liking a post
//!
//! ```rust,no_run
//! use yuyu::{ClientConfig, YuyuClient};
//! # async fn run() -> yuyu::Result<()> {
//! let client = YuyuClient::new(ClientConfig::from_env())?;
//! client.login("amy@example.com", "secret").await?;
//! client.toggle_like(42).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod session;
pub mod social;
pub mod validation;

pub use config::ClientConfig;
pub use error::{Result, YuyuError};
pub use social::YuyuClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
