//! Inbound message context and reply payloads shared by channels and the
//! auto-reply pipeline.

use serde::{Deserialize, Serialize};

/// Kind of chat a message arrived in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    #[default]
    Dm,
    Group,
    Channel,
}

impl ChatType {
    /// Group and broadcast chats can carry group-level config overrides.
    #[must_use]
    pub fn is_group_like(self) -> bool {
        matches!(self, Self::Group | Self::Channel)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dm => "dm",
            Self::Group => "group",
            Self::Channel => "channel",
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized inbound message, built by a channel adapter.
///
/// The addressing fields mirror what adapters know about a message: where it
/// physically came from (`originating_*`), what it claims to come from and
/// reply to (`from`/`to`), and for commands, which session they act on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MsgContext {
    pub body: String,
    pub channel: String,
    pub account_id: String,
    pub chat_type: ChatType,
    pub session_key: String,
    /// Address the message was received from, e.g. `telegram:group:-100123`.
    pub from: String,
    /// Address the message nominally replies to; may be a pseudo-address.
    pub to: String,
    pub sender_name: Option<String>,
    pub reply_to_id: Option<String>,
    /// Chat id for group/broadcast chats.
    pub group_id: Option<String>,
    /// Thread/topic id inside a forum-style group.
    pub topic_id: Option<String>,
    pub originating_channel: Option<String>,
    pub originating_to: Option<String>,
    /// Session a command operates on, when it differs from `session_key`.
    pub command_target_session_key: Option<String>,
}

/// Reply produced by the agent for delivery back to a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub text: String,
    pub media: Option<String>,
    pub reply_to_id: Option<String>,
    pub silent: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn chat_type_group_like() {
        assert!(!ChatType::Dm.is_group_like());
        assert!(ChatType::Group.is_group_like());
        assert!(ChatType::Channel.is_group_like());
    }

    #[test]
    fn msg_context_deserializes_sparse_json() {
        let msg: MsgContext = serde_json::from_str(
            r#"{"body":"/new","channel":"telegram","chat_type":"group","to":"slash:12345"}"#,
        )
        .unwrap();
        assert_eq!(msg.chat_type, ChatType::Group);
        assert_eq!(msg.to, "slash:12345");
        assert!(msg.originating_to.is_none());
    }
}
