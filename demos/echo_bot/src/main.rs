//! Echo Bot Example
//!
//! A small bot showing every way of registering handlers:
//!
//! - `on_event` / `on_event_with_subtype`: raw event routing
//! - `listen`: react to text anywhere in a channel
//! - `respond`: react to messages addressed to the bot (`echobot: ping`)
//! - plugins: bundles of registrations
//!
//! # Usage
//!
//! ```bash
//! RTMBOT_BOT__TOKEN=xoxb-... cargo run --package echo-bot
//! cargo run --package echo-bot -- --config ./rtmbot.toml --profile production
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rtmbot::prelude::*;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::info;

/// Command line options.
#[derive(Debug, Parser)]
#[command(name = "echo-bot", about = "A simple echo bot for real-time messaging")]
struct Args {
    /// Configuration file (defaults to searching for rtmbot.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(short, long)]
    profile: Option<String>,

    /// API token, overriding the configuration.
    #[arg(long, env = "SLACK_TOKEN")]
    token: Option<String>,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Logs every chat message.
async fn logging_handler(ctx: Arc<BotContext>) -> Reply {
    let event = ctx.event();
    info!(
        "[{}] {}: {}",
        event.channel().unwrap_or("?"),
        event.user().unwrap_or("?"),
        event.text().unwrap_or_default()
    );
    Reply::none()
}

/// `echobot: echo <text>` replies with `<text>`.
async fn echo_handler(ctx: Arc<BotContext>) -> Reply {
    let event = ctx.event();
    let (Some(text), Some(channel)) = (event.text(), event.channel()) else {
        return Reply::none();
    };
    let content = ctx
        .session()
        .identity()
        .strip_mention(text)
        .and_then(|rest| rest.strip_prefix("echo "))
        .unwrap_or_default();

    Reply::send(OutgoingMessage::new(content, channel))
}

/// `echobot: time` replies with the bot's local time.
async fn time_handler(ctx: Arc<BotContext>) -> Reply {
    let (Some(user), Some(channel)) = (ctx.event().user(), ctx.event().channel()) else {
        return Reply::none();
    };
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let formatted = now
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| now.to_string());

    Reply::send(ctx.session().mention(user, &format!("it is {formatted}"), channel))
}

/// `echobot: dm me` answers in a direct message.
async fn dm_handler(ctx: Arc<BotContext>) -> Reply {
    let Some(user) = ctx.event().user() else {
        return Reply::none();
    };
    ctx.session().direct_message(user, "psst, over here").await.into()
}

/// Greets users joining a channel.
async fn greet_handler(ctx: Arc<BotContext>) -> Reply {
    let (Some(user), Some(channel)) = (ctx.event().user(), ctx.event().channel()) else {
        return Reply::none();
    };
    Reply::send(ctx.session().mention(user, "welcome!", channel))
}

/// `echobot: quit` says goodbye and stops the bot.
async fn quit_handler(ctx: Arc<BotContext>) -> Reply {
    let channel = ctx.event().channel().unwrap_or_default();
    Reply::send(OutgoingMessage::new("bye!", channel)).with_status(Status::Shutdown)
}

// ============================================================================
// Plugins
// ============================================================================

/// Help text and liveness check.
struct HelpPlugin;

impl Plugin for HelpPlugin {
    fn name(&self) -> &str {
        "help"
    }

    fn load(&self, bot: &mut Bot) -> Result<()> {
        let help_text = "commands: echo <text>, ping, time, dm me, quit";
        bot.respond("^help$", respond_with(help_text))?
            .respond("^ping$", respond_with("pong"))?;
        Ok(())
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    if let Some(profile) = &args.profile {
        loader = loader.profile(profile);
    }
    if let Some(token) = args.token {
        loader = loader.token(token);
    }
    let config = loader.load()?;

    logging::init_from_config(&config.logging);

    let mut bot = Bot::from_config(&config.bot)?;

    bot.on_event("message", logging_handler)
        .on_event_with_subtype("message", "channel_join", greet_handler)
        .listen("(?i)ship it", react_with("rocket"))?
        .respond("^echo .+", echo_handler)?
        .respond("^time$", time_handler)?
        .respond("^dm me$", dm_handler)?
        .respond("^(quit|shutdown)$", quit_handler)?;
    bot.use_plugin(HelpPlugin)?;

    info!("Echo bot starting");
    bot.run().await?;
    info!("Echo bot stopped");

    Ok(())
}
