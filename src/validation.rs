//! Client-side input validation.
//!
//! Every check here runs before a request is built, so invalid input never
//! reaches the network.

use crate::error::{Result, YuyuError};

/// Maximum post length, in characters.
pub const MAX_WEIBO_CHARS: usize = 140;

/// Validation functions for user input
pub struct Validator;

impl Validator {
    /// Rejects an empty (after trimming) required field.
    pub fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(YuyuError::validation(format!("{} is required", field)));
        }
        Ok(trimmed)
    }

    /// Validate login credentials. The password is not trimmed.
    pub fn validate_login(email: &str, password: &str) -> Result<()> {
        Self::require("email", email)?;
        if password.is_empty() {
            return Err(YuyuError::validation("password is required"));
        }
        Ok(())
    }

    /// Validate registration fields
    pub fn validate_register(username: &str, email: &str, password: &str) -> Result<()> {
        Self::require("username", username)?;
        Self::validate_login(email, password)
    }

    /// Validate post text, returning it trimmed.
    pub fn validate_weibo_content(content: &str) -> Result<&str> {
        let content = Self::require("content", content)?;
        let chars = content.chars().count();
        if chars > MAX_WEIBO_CHARS {
            return Err(YuyuError::validation(format!(
                "Post too long: {} characters exceeds maximum of {}",
                chars, MAX_WEIBO_CHARS
            )));
        }
        Ok(content)
    }

    /// Validate comment text, returning it trimmed.
    pub fn validate_comment_content(content: &str) -> Result<&str> {
        Self::require("comment", content)
    }

    /// A profile update must change something: a new avatar, or a username
    /// that is non-empty and differs from the current one.
    pub fn validate_profile_update(username: &str, current: &str, has_avatar: bool) -> Result<()> {
        let username = username.trim();
        if has_avatar || (!username.is_empty() && username != current) {
            return Ok(());
        }
        Err(YuyuError::validation("nothing to update"))
    }

    /// Local part of an email address, used as the initial display name.
    pub fn email_local_part(email: &str) -> &str {
        let email = email.trim();
        email.split('@').next().unwrap_or(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        assert_eq!(Validator::require("username", "  amy ").unwrap(), "amy");
        assert!(Validator::require("username", " \n").is_err());

        assert!(Validator::validate_login("a@b.c", "pw").is_ok());
        assert!(Validator::validate_login("", "pw").is_err());
        assert!(Validator::validate_login("a@b.c", "").is_err());

        assert!(Validator::validate_register("amy", "a@b.c", "pw").is_ok());
        assert!(Validator::validate_register("", "a@b.c", "pw").is_err());
    }

    #[test]
    fn test_weibo_length_counts_characters() {
        // 140 multi-byte characters are within the limit.
        let full = "雨".repeat(MAX_WEIBO_CHARS);
        assert_eq!(Validator::validate_weibo_content(&full).unwrap(), full);

        let over = "a".repeat(MAX_WEIBO_CHARS + 1);
        assert!(Validator::validate_weibo_content(&over).is_err());

        assert_eq!(Validator::validate_weibo_content("  hi  ").unwrap(), "hi");
        assert!(Validator::validate_weibo_content("   ").is_err());
    }

    #[test]
    fn test_profile_update_needs_a_change() {
        assert!(Validator::validate_profile_update("amy", "amy", false).is_err());
        assert!(Validator::validate_profile_update("  ", "amy", false).is_err());
        assert!(Validator::validate_profile_update("bo", "amy", false).is_ok());
        assert!(Validator::validate_profile_update("amy", "amy", true).is_ok());
        assert!(Validator::validate_profile_update("", "amy", true).is_ok());
    }

    #[test]
    fn test_email_local_part() {
        assert_eq!(Validator::email_local_part("amy@example.com"), "amy");
        assert_eq!(Validator::email_local_part("no-at-sign"), "no-at-sign");
    }
}
