use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Events that produce an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    JoinRequest,
    MemberJoined,
    Start,
    MemberLeft,
}

/// A composed message, ready to send: text, optional inline keyboard,
/// optional local photo to attach before the text.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
    pub photo: Option<&'static str>,
}

struct Template {
    text: &'static str,
    buttons: &'static [(&'static str, &'static str)],
    photo: Option<&'static str>,
}

const ADMIN_CONTACT_URL: &str =
    "https://t.me/Wayne_Trader01?text=Hello%F0%9F%91%8B%20Wayne%20Trader%2C%20I%20want%20to%20Join%20your%20VVIP";
const CHANNEL_INVITE_URL: &str = "https://t.me/+VMf10CU1Qf9mOTA1";
const WELCOME_PHOTO: &str = "welcome.jpg";

const WELCOME_TEXT: &str = r#"👋 Hey {first_name}, Welcome to 👑 *{chat_title}* 👑

🔥 You've just joined the elite trading community of **Wayne Traders** – where success is the only option! 🔥

🏆 **Join our VVIP and receive daily sureshots!** 🏆

🚀 **Why choose Wayne Traders?**
▪️ **8–15 accurate signals daily (96% win rate)**
▪️ **Non-MTG signals every day 🦁**
▪️ **Fast deposit & withdrawal ♻️**
▪️ **Exclusive giveaways & winning strategies 📊**
▪️ **24/7 personal support ✅**

💵 **Start making profits today – don't miss out!** 💵

(1) **Register from this link ⬇️**
👉 [Sign Up Here](https://bit.ly/WayneFreeSignals)

(2) **Deposit a minimum of $50 or above 💱**

(3) **Send your Trader ID to:**
👨‍💼 [@Wayne_Trader01](https://t.me/Wayne_Trader01) ✅

🔗 **Let's grow together and achieve financial freedom! 😎 🤝**"#;

const START_TEXT: &str = r#"👋 Hey {first_name}, Welcome!

🔥 You've just unlocked the gateway to **Wayne Traders** – your ticket to financial success! 🔥

💰 Ready to make $300 to $600 per day for FREE? 💰

🚀 This bot will guide you step by step to achieve consistent profits.

🔹 Join our exclusive trading community
🔹 Get expert insights & winning strategies
🔹 Start earning like a pro!

📌 Need assistance? Our admin is here to help!
👨‍💼 Admin Contact: [@Wayne_Trader01](https://t.me/Wayne_Trader01)

👇 Click the button below to join our free Telegram channel now!"#;

const FAREWELL_TEXT: &str = r#"😢 {first_name}, you just left 👑 *{chat_title}* 👑.

The signals keep coming every day – you're welcome back whenever you're ready to trade with us again. 🤝"#;

fn template(kind: EventKind) -> Template {
    match kind {
        // Join requests and plain joins get the same welcome.
        EventKind::JoinRequest | EventKind::MemberJoined => Template {
            text: WELCOME_TEXT,
            buttons: &[("👨‍💼 Admin", ADMIN_CONTACT_URL)],
            photo: None,
        },
        EventKind::Start => Template {
            text: START_TEXT,
            buttons: &[("🔥 JOIN CHANNEL 🔥", CHANNEL_INVITE_URL)],
            photo: Some(WELCOME_PHOTO),
        },
        EventKind::MemberLeft => Template {
            text: FAREWELL_TEXT,
            buttons: &[],
            photo: None,
        },
    }
}

/// Build the outbound message for an event, interpolating the user's first
/// name and the chat title into the template.
pub fn compose(kind: EventKind, first_name: &str, chat_title: &str) -> OutboundMessage {
    let t = template(kind);
    let text = t
        .text
        .replace("{first_name}", first_name)
        .replace("{chat_title}", chat_title);

    let keyboard = if t.buttons.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(t.buttons.iter().map(
            |(label, url)| {
                vec![InlineKeyboardButton::url(
                    label.to_string(),
                    url.parse().expect("button url is a valid URL"),
                )]
            },
        )))
    };

    OutboundMessage {
        text,
        keyboard,
        photo: t.photo,
    }
}
