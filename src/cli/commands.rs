//! Command implementations for the yuyu CLI.

use crate::cli::utils::{format_comment, format_entry, password_or_prompt};
use crate::error::{Result, YuyuError};
use crate::media::ImageData;
use crate::social::types::{CommentId, FeedView, UserId, WeiboId};
use crate::social::{Effect, YuyuClient};
use std::path::Path;
use tracing::info;

/// Execute register command
pub async fn register(
    client: &YuyuClient,
    username: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_prompt(password)?;
    let session = client.register(username, email, &password).await?;
    println!(
        "Registered and logged in as {} (id {})",
        session.display_name(),
        session.user_id
    );
    Ok(())
}

/// Execute login command
pub async fn login(client: &YuyuClient, email: &str, password: Option<String>) -> Result<()> {
    let password = password_or_prompt(password)?;
    let session = client.login(email, &password).await?;
    println!("Logged in as {} (id {})", session.display_name(), session.user_id);
    Ok(())
}

pub fn logout(client: &YuyuClient) -> Result<()> {
    client.logout()?;
    println!("Logged out");
    Ok(())
}

pub fn whoami(client: &YuyuClient) -> Result<()> {
    match client.session() {
        Some(session) => {
            println!("{} (id {})", session.display_name(), session.user_id);
            if !session.avatar.is_empty() {
                println!("avatar set");
            }
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

/// Execute feed command
pub async fn feed(client: &YuyuClient, following: bool) -> Result<()> {
    if following && client.session().is_none() {
        return Err(YuyuError::NotAuthenticated);
    }
    client.set_view(if following {
        FeedView::Following
    } else {
        FeedView::All
    });
    client.load_feed().await;

    let rendered: Vec<String> = client.with_state(|state| {
        state.visible_feed().iter().map(format_entry).collect()
    });
    if rendered.is_empty() {
        println!("No posts yet");
    }
    for block in rendered {
        println!("{}", block);
    }
    Ok(())
}

/// Execute post command
pub async fn post(client: &YuyuClient, content: &str, media: Option<&Path>) -> Result<()> {
    let media = media.map(ImageData::from_file).transpose()?;
    let weibo_id = client.post_weibo(content, media).await?;
    info!(weibo_id, "Posted");
    println!("Posted #{}", weibo_id);
    Ok(())
}

pub async fn delete(client: &YuyuClient, weibo_id: WeiboId) -> Result<()> {
    client.delete_weibo(weibo_id).await?;
    println!("Deleted #{}", weibo_id);
    Ok(())
}

/// Execute like command. The feed is loaded first so the toggle starts from
/// the server's like state.
pub async fn like(client: &YuyuClient, weibo_id: WeiboId) -> Result<()> {
    client.load_feed().await;
    if let Effect::Like { action, .. } = client.toggle_like(weibo_id).await? {
        let count = client.with_state(|s| s.item(weibo_id).map(|w| w.like_count));
        println!("{} #{} ({} likes)", action, weibo_id, count.unwrap_or_default());
    }
    Ok(())
}

/// Execute follow command
pub async fn follow(client: &YuyuClient, user_id: UserId) -> Result<()> {
    client.load_feed().await;
    if let Effect::Follow { action, .. } = client.toggle_follow(user_id).await? {
        println!("{} user#{}", action, user_id);
    }
    Ok(())
}

/// Execute comments command
pub async fn comments(client: &YuyuClient, weibo_id: WeiboId) -> Result<()> {
    let forest = client.open_comments(weibo_id).await?;
    if forest.is_empty() {
        println!("No comments");
    }
    for threaded in &forest {
        println!("{}", format_comment(&threaded));
    }
    Ok(())
}

pub async fn comment(
    client: &YuyuClient,
    weibo_id: WeiboId,
    content: &str,
    reply_to: Option<CommentId>,
) -> Result<()> {
    match client.add_comment(weibo_id, content, reply_to).await? {
        Some(comment_id) => println!("Commented [{}] on #{}", comment_id, weibo_id),
        None => println!("Commented on #{}", weibo_id),
    }
    Ok(())
}

pub async fn delete_comment(client: &YuyuClient, comment_id: CommentId) -> Result<()> {
    client.delete_comment(comment_id).await?;
    println!("Deleted comment [{}]", comment_id);
    Ok(())
}

/// Execute profile command
pub async fn profile(
    client: &YuyuClient,
    username: Option<&str>,
    avatar: Option<&Path>,
    clear_avatar: bool,
) -> Result<()> {
    let session = if clear_avatar && username.is_none() {
        client.clear_avatar()?
    } else {
        let avatar = avatar.map(ImageData::from_file).transpose()?;
        let session = client
            .update_profile(username.unwrap_or_default(), avatar)
            .await?;
        if clear_avatar {
            client.clear_avatar()?
        } else {
            session
        }
    };
    println!("Profile: {} (id {})", session.display_name(), session.user_id);
    Ok(())
}
