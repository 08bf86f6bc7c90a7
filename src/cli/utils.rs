//! Utility functions for CLI operations.

use crate::error::{Result, YuyuError};
use crate::social::thread::ThreadedComment;
use crate::social::types::display_name;
use crate::social::FeedEntry;
use chrono::{DateTime, Local};
use rpassword::prompt_password;

/// Use the given password or prompt for one without echo.
pub fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let password = prompt_password("Password: ")
        .map_err(|e| YuyuError::validation(format!("Failed to read password: {}", e)))?;
    if password.is_empty() {
        return Err(YuyuError::validation("Password cannot be empty"));
    }
    Ok(password)
}

/// Format a millisecond Unix timestamp in local time.
pub fn format_timestamp(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "-".to_string(),
    }
}

/// One feed entry as a block of text.
pub fn format_entry(entry: &FeedEntry<'_>) -> String {
    let item = entry.item;
    let mut header = format!(
        "#{} {} · {}",
        item.weibo_id,
        display_name(&item.username, item.user_id),
        format_timestamp(item.created_at)
    );
    if entry.following_author {
        header.push_str(" · following");
    }

    let mut out = format!("{}\n  {}\n", header, item.content);
    if item.media.is_some() {
        out.push_str("  [image]\n");
    }
    let heart = if entry.liked { "♥" } else { "♡" };
    out.push_str(&format!(
        "  {} {}  💬 {}\n",
        heart, item.like_count, item.comment_count
    ));
    out
}

/// One comment line, indented by depth.
pub fn format_comment(threaded: &ThreadedComment<'_>) -> String {
    let comment = threaded.comment;
    format!(
        "{}[{}] {}: {} ({})",
        "  ".repeat(threaded.depth),
        comment.comment_id,
        display_name(&comment.username, comment.user_id),
        comment.content,
        format_timestamp(comment.created_at)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::types::Comment;

    #[test]
    fn test_invalid_timestamp() {
        assert_eq!(format_timestamp(i64::MAX), "-");
        assert!(!format_timestamp(1_700_000_000_000).is_empty());
    }

    #[test]
    fn test_comment_indentation() {
        let comment = Comment {
            comment_id: 2,
            parent_id: 1,
            user_id: 4,
            username: String::new(),
            avatar: String::new(),
            content: "reply".to_string(),
            created_at: 0,
        };
        let line = format_comment(&ThreadedComment {
            comment: &comment,
            depth: 2,
        });
        assert!(line.starts_with("    [2] user#4: reply"));
    }

    #[test]
    fn test_given_password_is_not_prompted() {
        assert_eq!(password_or_prompt(Some("pw".to_string())).unwrap(), "pw");
    }
}
