use anyhow::{Context, Result};
use url::Url;

const DEFAULT_WEBHOOK_PATH: &str = "/telegram";
const DEFAULT_PORT: u16 = 10000;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot API token.
    pub bot_token: String,
    /// Numeric id of the channel whose departures get a farewell.
    pub channel_id: i64,
    /// Externally reachable base URL of this service.
    pub external_url: String,
    /// Path Telegram POSTs updates to.
    pub webhook_path: String,
    /// Port the HTTP server listens on.
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = get("BOT_TOKEN").context("BOT_TOKEN is not set")?;
        let channel_id = get("CHANNEL_ID")
            .context("CHANNEL_ID is not set")?
            .parse::<i64>()
            .context("CHANNEL_ID must be a numeric chat id")?;
        let external_url = get("RENDER_EXTERNAL_URL").context("RENDER_EXTERNAL_URL is not set")?;
        let webhook_path =
            get("WEBHOOK_PATH").unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string());
        let port = match get("PORT") {
            Some(port) => port.parse::<u16>().context("PORT must be a port number")?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            bot_token,
            channel_id,
            external_url,
            webhook_path,
            port,
        })
    }

    /// Externally reachable callback URL registered with setWebhook.
    pub fn webhook_url(&self) -> Result<Url> {
        let url = format!(
            "{}{}",
            self.external_url.trim_end_matches('/'),
            self.webhook_path
        );
        Url::parse(&url).with_context(|| format!("Invalid webhook URL: {url}"))
    }
}
