//! Inbound Telegram message → normalized message context.

use {
    moltis_channels::{ChannelReplyTarget, ChannelType},
    moltis_common::types::{ChatType, MsgContext},
    moltis_config::MoltisConfig,
    moltis_routing::{ChatScope, ScopeField, resolve_with_lookup},
    moltis_sessions::{DEFAULT_AGENT_ID, SessionKey},
    tracing::debug,
};

use crate::{
    Result,
    chat::{TelegramMessage, classify_chat},
    lookup::{CHANNEL, TelegramGroupLookup},
};

/// Everything the reply pipeline needs to know about one inbound message.
#[derive(Debug, Clone)]
pub struct TelegramMessageContext {
    pub chat_type: ChatType,
    pub session_key: SessionKey,
    /// Chat the reply goes back to.
    pub reply_target: ChannelReplyTarget,
    /// Effective model, `None` when no scope configures one.
    pub model: Option<String>,
    pub msg: MsgContext,
}

/// Build the message context for a message received by `account_id`.
pub fn build_message_context(
    config: &MoltisConfig,
    account_id: &str,
    message: &TelegramMessage,
) -> Result<TelegramMessageContext> {
    let (chat_type, group_id) = classify_chat(&message.chat);
    let topic_id = message.topic_id();
    let chat_id = message.chat.id.to_string();

    let scope = ChatScope {
        channel: CHANNEL.into(),
        account_id: account_id.into(),
        chat_type,
        group_id: group_id.clone(),
        topic_id: topic_id.clone(),
    };
    let model = resolve_with_lookup(
        ScopeField::Model,
        &scope,
        &TelegramGroupLookup::new(config),
    )
    .map(|r| r.value);

    let (rest, from) = match chat_type {
        ChatType::Dm => {
            let peer = message.sender_id()?.to_string();
            (
                SessionKey::dm_scope(CHANNEL, account_id, &peer),
                format!("{CHANNEL}:{peer}"),
            )
        },
        ChatType::Group => {
            let scope = SessionKey::group_scope(CHANNEL, &chat_id, topic_id.as_deref());
            (scope.clone(), scope)
        },
        ChatType::Channel => {
            let scope = SessionKey::channel_scope(CHANNEL, &chat_id);
            (scope.clone(), scope)
        },
    };
    let agent_id = match config.agents.defaults.id.trim() {
        "" => DEFAULT_AGENT_ID,
        id => id,
    };
    let session_key = SessionKey::for_agent(agent_id, &rest);
    let to = format!("{CHANNEL}:{chat_id}");

    debug!(
        account_id,
        chat_id = %chat_id,
        chat_type = %chat_type,
        topic_id = ?topic_id,
        session_key = %session_key,
        model = ?model,
        "built telegram message context"
    );

    let msg = MsgContext {
        body: message.body().to_string(),
        channel: CHANNEL.into(),
        account_id: account_id.into(),
        chat_type,
        session_key: session_key.to_string(),
        from,
        to: to.clone(),
        sender_name: message.from.as_ref().map(|u| u.display_name()),
        reply_to_id: Some(message.message_id.to_string()),
        group_id,
        topic_id,
        originating_channel: Some(CHANNEL.into()),
        originating_to: Some(to),
        command_target_session_key: None,
    };

    Ok(TelegramMessageContext {
        chat_type,
        session_key,
        reply_target: ChannelReplyTarget {
            channel_type: ChannelType::Telegram,
            account_id: account_id.into(),
            chat_id,
        },
        model,
        msg,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::chat::{TelegramChat, TelegramChatKind, TelegramUser},
        moltis_config::{GroupConfig, ScopeOverrides},
    };

    fn base_config() -> MoltisConfig {
        toml::from_str(
            r#"
[agents.defaults]
model = "anthropic/claude-opus-4-5"

[channels.telegram]
model = "openai/gpt-5.2"

[channels.telegram.accounts.default]
model = "anthropic/claude-sonnet-4-5"
"#,
        )
        .unwrap()
    }

    /// Adds a `-100123` group entry (and optionally topic 99) to the account.
    fn with_group(mut config: MoltisConfig, group: &str, topic: Option<&str>) -> MoltisConfig {
        let mut entry = GroupConfig {
            overrides: ScopeOverrides::with_model(group),
            ..Default::default()
        };
        if let Some(topic) = topic {
            entry
                .topics
                .insert("99".into(), ScopeOverrides::with_model(topic));
        }
        config
            .channels
            .0
            .get_mut("telegram")
            .unwrap()
            .accounts
            .get_mut("default")
            .unwrap()
            .groups
            .insert("-100123".into(), entry);
        config
    }

    fn message(kind: TelegramChatKind, is_forum: bool, thread: Option<i64>) -> TelegramMessage {
        TelegramMessage {
            message_id: 1,
            chat: TelegramChat {
                id: if kind == TelegramChatKind::Private {
                    42
                } else {
                    -100123
                },
                kind,
                title: Some("Group".into()),
                is_forum,
            },
            from: Some(TelegramUser {
                id: 42,
                first_name: "Alice".into(),
                username: None,
            }),
            text: Some("@bot hello".into()),
            caption: None,
            message_thread_id: thread,
        }
    }

    #[test]
    fn prefers_topic_model_over_group_and_account() {
        let cfg = with_group(
            base_config(),
            "openai/gpt-4.1-mini",
            Some("google/gemini-2.5-pro"),
        );
        let ctx = build_message_context(
            &cfg,
            "default",
            &message(TelegramChatKind::Supergroup, true, Some(99)),
        )
        .unwrap();
        assert_eq!(ctx.model.as_deref(), Some("google/gemini-2.5-pro"));
        assert_eq!(
            ctx.session_key.as_str(),
            "agent:main:telegram:group:-100123:topic:99"
        );
        assert_eq!(ctx.msg.from, "telegram:group:-100123:topic:99");
        assert_eq!(ctx.msg.topic_id.as_deref(), Some("99"));
    }

    #[test]
    fn uses_group_model_when_topic_model_is_missing() {
        let cfg = with_group(base_config(), "openai/gpt-4.1-mini", None);
        let ctx = build_message_context(
            &cfg,
            "default",
            &message(TelegramChatKind::Supergroup, false, None),
        )
        .unwrap();
        assert_eq!(ctx.model.as_deref(), Some("openai/gpt-4.1-mini"));
        assert_eq!(ctx.chat_type, ChatType::Group);
        assert_eq!(ctx.session_key.as_str(), "agent:main:telegram:group:-100123");
    }

    #[test]
    fn falls_back_to_account_model_when_group_and_topic_do_not_set_one() {
        let ctx = build_message_context(
            &base_config(),
            "default",
            &message(TelegramChatKind::Supergroup, false, None),
        )
        .unwrap();
        assert_eq!(ctx.model.as_deref(), Some("anthropic/claude-sonnet-4-5"));
    }

    #[test]
    fn thread_in_non_forum_group_is_not_a_topic() {
        let cfg = with_group(
            base_config(),
            "openai/gpt-4.1-mini",
            Some("google/gemini-2.5-pro"),
        );
        let ctx = build_message_context(
            &cfg,
            "default",
            &message(TelegramChatKind::Supergroup, false, Some(99)),
        )
        .unwrap();
        assert_eq!(ctx.model.as_deref(), Some("openai/gpt-4.1-mini"));
        assert!(ctx.msg.topic_id.is_none());
    }

    #[test]
    fn dm_context() {
        let ctx = build_message_context(
            &base_config(),
            "default",
            &message(TelegramChatKind::Private, false, None),
        )
        .unwrap();
        assert_eq!(ctx.chat_type, ChatType::Dm);
        assert_eq!(ctx.session_key.as_str(), "agent:main:telegram:default:dm:42");
        assert_eq!(ctx.msg.from, "telegram:42");
        assert_eq!(ctx.msg.to, "telegram:42");
        assert_eq!(ctx.reply_target.chat_id, "42");
        assert_eq!(ctx.msg.group_id, None);
    }

    #[test]
    fn broadcast_channel_context() {
        let mut msg = message(TelegramChatKind::Channel, false, None);
        msg.from = None;
        let ctx = build_message_context(&base_config(), "default", &msg).unwrap();
        assert_eq!(ctx.chat_type, ChatType::Channel);
        assert_eq!(ctx.session_key.as_str(), "agent:main:telegram:channel:-100123");
        assert_eq!(ctx.msg.originating_to.as_deref(), Some("telegram:-100123"));
        assert_eq!(ctx.reply_target.channel_type, ChannelType::Telegram);
    }

    #[test]
    fn dm_without_sender_is_rejected() {
        let mut msg = message(TelegramChatKind::Private, false, None);
        msg.from = None;
        assert!(build_message_context(&base_config(), "default", &msg).is_err());
    }

    #[test]
    fn custom_default_agent_owns_session() {
        let mut cfg = base_config();
        cfg.agents.defaults.id = "ops".into();
        let ctx = build_message_context(
            &cfg,
            "default",
            &message(TelegramChatKind::Group, false, None),
        )
        .unwrap();
        assert_eq!(ctx.session_key.as_str(), "agent:ops:telegram:group:-100123");
        assert_eq!(ctx.session_key.agent().as_deref(), Some("ops"));
    }

    #[test]
    fn no_model_anywhere_is_none() {
        let ctx = build_message_context(
            &MoltisConfig::default(),
            "default",
            &message(TelegramChatKind::Group, false, None),
        )
        .unwrap();
        assert_eq!(ctx.model, None);
    }
}
