use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatJoinRequest, ChatMemberUpdated, InputFile, ParseMode, User};
use teloxide::update_listeners::webhooks::{self, Options};
use teloxide::update_listeners::UpdateListener;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::templates::{self, EventKind, OutboundMessage};

/// Shared application state
pub struct AppState {
    config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

/// Commands answered in a private chat
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start,
}

/// Start the Telegram bot: serve the webhook + health surface, register the
/// webhook with Telegram, then dispatch updates until shutdown.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bot = Bot::new(&state.config.bot_token);

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let url = state.config.webhook_url()?;
    let (listener, stop_flag, app) = webhook_app(Options::new(addr, url.clone()));

    let tcp = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app)
            .with_graceful_shutdown(stop_flag)
            .await
        {
            error!("HTTP server error: {e}");
        }
    });

    bot.set_webhook(url.clone())
        .await
        .context("Failed to register the webhook with Telegram")?;
    info!("Webhook registered: {url}");

    let handler = dptree::entry()
        .branch(Update::filter_chat_join_request().endpoint(handle_join_request))
        .branch(Update::filter_chat_member().endpoint(handle_chat_member))
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("webhook listener"),
        )
        .await;

    Ok(())
}

/// The HTTP surface: teloxide's webhook route plus the liveness endpoint.
fn webhook_app(
    options: Options,
) -> (
    impl UpdateListener<Err = Infallible>,
    impl Future<Output = ()>,
    Router,
) {
    let (listener, stop_flag, router) = webhooks::axum_no_setup(options);
    (listener, stop_flag, router.route("/", get(health)))
}

/// Liveness probe for the hosting platform
async fn health() -> &'static str {
    "OK"
}

async fn handle_join_request(bot: Bot, request: ChatJoinRequest) -> ResponseResult<()> {
    let user = &request.from;
    let chat = &request.chat;

    info!("Join request from {} in chat {}", user.full_name(), chat.id);

    // Approval failure must not block the welcome DM.
    if let Err(e) = bot.approve_chat_join_request(chat.id, user.id).await {
        warn!(
            "Couldn't approve join request from {}: {}",
            user.full_name(),
            e
        );
    }

    let message = templates::compose(
        EventKind::JoinRequest,
        &user.first_name,
        chat.title().unwrap_or_default(),
    );
    send_direct_logged(&bot, user, message).await;

    Ok(())
}

async fn handle_chat_member(
    bot: Bot,
    update: ChatMemberUpdated,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let user = &update.new_chat_member.user;
    let chat = &update.chat;

    if update.new_chat_member.is_member() {
        info!("{} joined chat {}", user.full_name(), chat.id);
        let message = templates::compose(
            EventKind::MemberJoined,
            &user.first_name,
            chat.title().unwrap_or_default(),
        );
        send_direct_logged(&bot, user, message).await;
        return Ok(());
    }

    // Farewells only fire for the configured channel.
    let gone = update.new_chat_member.is_left() || update.new_chat_member.is_banned();
    if gone && chat.id == ChatId(state.config.channel_id) {
        info!("{} left chat {}", user.full_name(), chat.id);
        let message = templates::compose(
            EventKind::MemberLeft,
            &user.first_name,
            chat.title().unwrap_or_default(),
        );
        send_direct_logged(&bot, user, message).await;
    }

    Ok(())
}

async fn handle_command(bot: Bot, msg: Message, command: Command) -> ResponseResult<()> {
    let user = match msg.from.as_ref() {
        Some(user) => user,
        None => return Ok(()),
    };

    match command {
        Command::Start => {
            info!("/start from {}", user.full_name());
            let message = templates::compose(EventKind::Start, &user.first_name, "");
            // Photo and text share one failure scope: a failed photo send
            // skips the text, and the dispatcher logs the error.
            send_direct(&bot, user, message).await?;
        }
    }

    Ok(())
}

/// Send a composed message to the user's private chat. A photo, when the
/// template carries one, goes out before the text.
async fn send_direct(bot: &Bot, user: &User, message: OutboundMessage) -> ResponseResult<()> {
    let chat_id = ChatId(user.id.0 as i64);

    if let Some(path) = message.photo {
        bot.send_photo(chat_id, InputFile::file(path)).await?;
    }

    let mut request = bot
        .send_message(chat_id, message.text)
        .parse_mode(ParseMode::Markdown);
    if let Some(keyboard) = message.keyboard {
        request = request.reply_markup(keyboard);
    }
    request.await?;

    Ok(())
}

/// Send and log, never propagate. Delivery commonly fails when the user has
/// not started a private chat with the bot.
async fn send_direct_logged(bot: &Bot, user: &User, message: OutboundMessage) {
    match send_direct(bot, user, message).await {
        Ok(()) => info!("Sent DM to {}", user.full_name()),
        Err(e) => warn!("Couldn't send DM to {}: {}", user.full_name(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
        listener.local_addr().expect("local_addr").port()
    }

    // Serve the webhook app on an ephemeral port. The returned listener half
    // must stay alive for the duration of the test: the webhook route hands
    // parsed updates to it.
    async fn spawn_app(port: u16) -> impl UpdateListener<Err = Infallible> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let url = format!("http://127.0.0.1:{port}/telegram").parse().unwrap();
        let (listener, stop_flag, app) = webhook_app(Options::new(addr, url));

        let tcp = tokio::net::TcpListener::bind(addr).await.unwrap();
        tokio::spawn(async move {
            axum::serve(tcp, app)
                .with_graceful_shutdown(stop_flag)
                .await
                .unwrap();
        });

        listener
    }

    #[tokio::test]
    async fn test_health_endpoint_returns_200() {
        let port = free_port();
        let _listener = spawn_app(port).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_webhook_acknowledges_malformed_json() {
        let port = free_port();
        let _listener = spawn_app(port).await;

        let resp = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/telegram"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_webhook_acknowledges_join_request_update() {
        let port = free_port();
        let _listener = spawn_app(port).await;

        let payload = serde_json::json!({
            "update_id": 1,
            "chat_join_request": {
                "chat": { "id": -1001234567890i64, "title": "VIP Room", "type": "channel" },
                "from": { "id": 1, "is_bot": false, "first_name": "Ana" },
                "user_chat_id": 1,
                "date": 1700000000
            }
        });
        let resp = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/telegram"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
}
