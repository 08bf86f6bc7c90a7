//! Command-line interface for yuyu.
//!
//! Every invocation restores the persisted session, runs one command and
//! exits. Login and register persist the new session for later runs.

pub mod args;
pub mod commands;
pub mod utils;

use crate::config::ClientConfig;
use crate::social::YuyuClient;
use crate::Result;
use clap::Parser;

pub use args::{Cli, Command};

/// Main entry point for the CLI application
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(api_base) = &cli.api_base {
        config = config.with_api_base(api_base);
    }
    if let Some(path) = cli.session_file {
        config = config.with_session_path(path);
    }

    let client = YuyuClient::new(config)?;
    client.restore();

    match cli.command {
        Command::Register {
            username,
            email,
            password,
        } => commands::register(&client, &username, &email, password).await,
        Command::Login { email, password } => commands::login(&client, &email, password).await,
        Command::Logout => commands::logout(&client),
        Command::Whoami => commands::whoami(&client),
        Command::Feed { following } => commands::feed(&client, following).await,
        Command::Post { content, media } => {
            commands::post(&client, &content, media.as_deref()).await
        }
        Command::Delete { weibo_id } => commands::delete(&client, weibo_id).await,
        Command::Like { weibo_id } => commands::like(&client, weibo_id).await,
        Command::Follow { user_id } => commands::follow(&client, user_id).await,
        Command::Comments { weibo_id } => commands::comments(&client, weibo_id).await,
        Command::Comment {
            weibo_id,
            content,
            reply_to,
        } => commands::comment(&client, weibo_id, &content, reply_to).await,
        Command::DeleteComment { comment_id } => {
            commands::delete_comment(&client, comment_id).await
        }
        Command::Profile {
            username,
            avatar,
            clear_avatar,
        } => {
            commands::profile(
                &client,
                username.as_deref(),
                avatar.as_deref(),
                clear_avatar,
            )
            .await
        }
    }
}
