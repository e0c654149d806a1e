use std::{fmt, str::FromStr};

use {anyhow::Result, async_trait::async_trait, moltis_common::types::ReplyPayload};

use crate::Error;

// ── Channel types ───────────────────────────────────────────────────────────

/// Supported messaging platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Telegram,
    Discord,
    Slack,
    Whatsapp,
    #[serde(rename = "msteams")]
    MsTeams,
    Xmpp,
}

/// How a platform scopes its chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCapabilities {
    /// Group chats may be split into topic threads that carry their own
    /// sessions and config.
    pub topics: bool,
    /// Scope tokens that precede a chat id in a session scope chain, e.g.
    /// `group` in `telegram:group:-100123`.
    pub group_scopes: &'static [&'static str],
    /// Scope token that precedes a topic id inside a group scope chain.
    pub topic_scope: Option<&'static str>,
}

impl ChannelCapabilities {
    const FLAT: Self = Self {
        topics: false,
        group_scopes: &[],
        topic_scope: None,
    };
}

impl ChannelType {
    pub const ALL: &'static [ChannelType] = &[
        Self::Telegram,
        Self::Discord,
        Self::Slack,
        Self::Whatsapp,
        Self::MsTeams,
        Self::Xmpp,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Telegram => "telegram",
            Self::Discord => "discord",
            Self::Slack => "slack",
            Self::Whatsapp => "whatsapp",
            Self::MsTeams => "msteams",
            Self::Xmpp => "xmpp",
        }
    }

    #[must_use]
    pub fn capabilities(self) -> ChannelCapabilities {
        match self {
            Self::Telegram => ChannelCapabilities {
                topics: true,
                group_scopes: &["group", "channel"],
                topic_scope: Some("topic"),
            },
            Self::Discord | Self::Slack | Self::Whatsapp | Self::MsTeams | Self::Xmpp => {
                ChannelCapabilities::FLAT
            },
        }
    }

    /// Parse a free-form channel name (trimmed, case-insensitive).
    ///
    /// Unknown names yield `None`; routing treats them as having no special
    /// capabilities.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        if name.is_empty() {
            return Err(Error::invalid_input("channel name is empty"));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| Error::unknown_channel(&name))
    }
}

// ── Outbound ────────────────────────────────────────────────────────────────

/// Where to send the LLM response back.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChannelReplyTarget {
    pub channel_type: ChannelType,
    pub account_id: String,
    /// Chat/peer ID to send the reply to.
    pub chat_id: String,
}

/// Send messages to a channel. Implemented by each platform adapter.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    /// Send text to a routing address such as `telegram:-100123`.
    async fn send_text(&self, account_id: &str, to: &str, text: &str) -> Result<()>;
    async fn send_media(&self, account_id: &str, to: &str, payload: &ReplyPayload) -> Result<()>;
}
