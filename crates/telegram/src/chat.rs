//! The slice of the Bot API `Message` object that routing needs.

use {moltis_common::types::ChatType, serde::Deserialize};

use crate::{Error, Result};

/// Bot API chat `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelegramChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TelegramChatKind,
    #[serde(default)]
    pub title: Option<String>,
    /// Supergroup with topics enabled.
    #[serde(default)]
    pub is_forum: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl TelegramUser {
    /// `@username` when set, otherwise the first name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.username.as_deref() {
            Some(username) if !username.is_empty() => format!("@{username}"),
            _ => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub message_thread_id: Option<i64>,
}

impl TelegramMessage {
    /// Parse a `Message` object as delivered in a Bot API update.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Message text, falling back to the media caption.
    #[must_use]
    pub fn body(&self) -> &str {
        self.text
            .as_deref()
            .or(self.caption.as_deref())
            .unwrap_or_default()
    }

    /// Forum topic the message was posted in.
    ///
    /// Reply threads in ordinary groups also carry `message_thread_id`, so it
    /// only counts as a topic inside forum supergroups.
    #[must_use]
    pub fn topic_id(&self) -> Option<String> {
        if self.chat.kind != TelegramChatKind::Supergroup || !self.chat.is_forum {
            return None;
        }
        self.message_thread_id.map(|id| id.to_string())
    }

    /// Id of the sending user, required for DMs.
    pub fn sender_id(&self) -> Result<i64> {
        self.from
            .as_ref()
            .map(|u| u.id)
            .ok_or_else(|| Error::message("message has no sender"))
    }
}

/// Classify the chat type.
#[must_use]
pub fn classify_chat(chat: &TelegramChat) -> (ChatType, Option<String>) {
    match chat.kind {
        TelegramChatKind::Private => (ChatType::Dm, None),
        TelegramChatKind::Channel => (ChatType::Channel, Some(chat.id.to_string())),
        TelegramChatKind::Group | TelegramChatKind::Supergroup => {
            (ChatType::Group, Some(chat.id.to_string()))
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest};

    fn chat(kind: TelegramChatKind, is_forum: bool) -> TelegramChat {
        TelegramChat {
            id: -100123,
            kind,
            title: None,
            is_forum,
        }
    }

    #[rstest]
    #[case(TelegramChatKind::Private, ChatType::Dm, None)]
    #[case(TelegramChatKind::Group, ChatType::Group, Some("-100123"))]
    #[case(TelegramChatKind::Supergroup, ChatType::Group, Some("-100123"))]
    #[case(TelegramChatKind::Channel, ChatType::Channel, Some("-100123"))]
    fn classifies(
        #[case] kind: TelegramChatKind,
        #[case] chat_type: ChatType,
        #[case] group_id: Option<&str>,
    ) {
        let (got_type, got_group) = classify_chat(&chat(kind, false));
        assert_eq!(got_type, chat_type);
        assert_eq!(got_group.as_deref(), group_id);
    }

    #[test]
    fn parses_bot_api_message() {
        let msg = TelegramMessage::from_json(
            r#"{
                "message_id": 1,
                "date": 1700000000,
                "chat": {"id": -100123, "type": "supergroup", "title": "Forum", "is_forum": true},
                "from": {"id": 42, "is_bot": false, "first_name": "Alice"},
                "message_thread_id": 99,
                "text": "@bot hello"
            }"#,
        )
        .unwrap();
        assert_eq!(msg.chat.kind, TelegramChatKind::Supergroup);
        assert_eq!(msg.topic_id().as_deref(), Some("99"));
        assert_eq!(msg.body(), "@bot hello");
        assert_eq!(msg.sender_id().unwrap(), 42);
        assert_eq!(msg.from.unwrap().display_name(), "Alice");
    }

    #[test]
    fn rejects_malformed_update() {
        let err = TelegramMessage::from_json(r#"{"message_id": 1}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[rstest]
    #[case::forum(TelegramChatKind::Supergroup, true, Some("99"))]
    #[case::reply_thread(TelegramChatKind::Supergroup, false, None)]
    #[case::plain_group(TelegramChatKind::Group, true, None)]
    fn topic_only_in_forums(
        #[case] kind: TelegramChatKind,
        #[case] is_forum: bool,
        #[case] expected: Option<&str>,
    ) {
        let msg = TelegramMessage {
            message_id: 1,
            chat: chat(kind, is_forum),
            from: None,
            text: None,
            caption: Some("photo".into()),
            message_thread_id: Some(99),
        };
        assert_eq!(msg.topic_id().as_deref(), expected);
        assert_eq!(msg.body(), "photo");
        assert!(msg.sender_id().is_err());
    }
}
