//! REST API access: the HTTP client and its wire types.

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{ApiResponse, AuthGrant, FeedList, UserInfo};
