//! Command-line argument parsing for yuyu.

use crate::social::types::{CommentId, UserId, WeiboId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line client for a yuyu microblog server
#[derive(Debug, Parser)]
#[command(name = "yuyu", version, about)]
pub struct Cli {
    /// API base URL, e.g. https://yuyu.example.com/api
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// File holding the persisted session
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Command-line interface commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and log in
    Register {
        username: String,
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in
    Login {
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show the feed
    Feed {
        /// Only posts from followed authors
        #[arg(long)]
        following: bool,
    },
    /// Publish a post (up to 140 characters)
    Post {
        content: String,
        /// Image to attach (JPG, PNG, GIF or WebP, up to 2 MB)
        #[arg(long)]
        media: Option<PathBuf>,
    },
    /// Delete one of your posts
    Delete { weibo_id: WeiboId },
    /// Like or unlike a post
    Like { weibo_id: WeiboId },
    /// Follow or unfollow a user
    Follow { user_id: UserId },
    /// Show the comment thread of a post
    Comments { weibo_id: WeiboId },
    /// Comment on a post
    Comment {
        weibo_id: WeiboId,
        content: String,
        /// Reply to this comment instead of the post
        #[arg(long)]
        reply_to: Option<CommentId>,
    },
    /// Delete one of your comments
    DeleteComment { comment_id: CommentId },
    /// Change username or avatar
    Profile {
        #[arg(long)]
        username: Option<String>,
        /// Image file for the new avatar
        #[arg(long, conflicts_with = "clear_avatar")]
        avatar: Option<PathBuf>,
        /// Remove the avatar locally
        #[arg(long)]
        clear_avatar: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reply() {
        let cli = Cli::try_parse_from([
            "yuyu",
            "--api-base",
            "http://localhost:9000/api",
            "comment",
            "3",
            "nice",
            "--reply-to",
            "8",
        ])
        .unwrap();
        assert_eq!(cli.api_base.as_deref(), Some("http://localhost:9000/api"));
        match cli.command {
            Command::Comment {
                weibo_id,
                content,
                reply_to,
            } => {
                assert_eq!(weibo_id, 3);
                assert_eq!(content, "nice");
                assert_eq!(reply_to, Some(8));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_avatar_conflicts_with_clear() {
        let result = Cli::try_parse_from([
            "yuyu",
            "profile",
            "--avatar",
            "a.png",
            "--clear-avatar",
        ]);
        assert!(result.is_err());
    }
}
