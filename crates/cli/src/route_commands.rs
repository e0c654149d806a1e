use std::{io::Read, path::Path};

use {
    anyhow::{Context, Result},
    clap::{Subcommand, ValueEnum},
    moltis_common::types::ChatType,
    moltis_config::MoltisConfig,
    moltis_routing::{
        ChatScope, CommandReplySignals, ScopeField, ScopeTiers,
        resolve_command_reply_target_with_rule, resolve_with_lookup,
    },
    moltis_telegram::{TelegramGroupLookup, TelegramMessage, build_message_context},
    serde_json::json,
};

#[derive(Subcommand)]
pub enum RouteAction {
    /// Resolve where a command reply should be delivered.
    Target {
        /// Address the user interacted through, e.g. `telegram:12345`.
        #[arg(long)]
        originating_to: Option<String>,
        /// Channel of the origin, e.g. `telegram`.
        #[arg(long)]
        originating_channel: Option<String>,
        /// Session the command operates on, e.g.
        /// `agent:main:telegram:group:-100123:topic:99`.
        #[arg(long)]
        session_key: Option<String>,
        /// Command sender address.
        #[arg(long)]
        from: Option<String>,
        /// Command recipient address.
        #[arg(long)]
        to: Option<String>,
    },
    /// Resolve a scoped config field for a chat.
    Model {
        #[arg(long, default_value = "telegram")]
        channel: String,
        #[arg(long, default_value = "default")]
        account: String,
        #[arg(long, value_enum, default_value_t = ChatKind::Group)]
        chat_type: ChatKind,
        /// Group/broadcast chat id.
        #[arg(long)]
        group: Option<String>,
        /// Topic/thread id inside the group.
        #[arg(long)]
        topic: Option<String>,
        #[arg(long, value_enum, default_value_t = Field::Model)]
        field: Field,
    },
    /// Build the message context for a Telegram Bot API `Message` JSON
    /// object read from a file, or stdin when the path is `-`.
    Telegram {
        #[arg(long, default_value = "default")]
        account: String,
        message: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ChatKind {
    Dm,
    Group,
    Channel,
}

impl From<ChatKind> for ChatType {
    fn from(kind: ChatKind) -> Self {
        match kind {
            ChatKind::Dm => Self::Dm,
            ChatKind::Group => Self::Group,
            ChatKind::Channel => Self::Channel,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Field {
    Model,
    ModelProvider,
    SystemPrompt,
}

impl From<Field> for ScopeField {
    fn from(field: Field) -> Self {
        match field {
            Field::Model => Self::Model,
            Field::ModelProvider => Self::ModelProvider,
            Field::SystemPrompt => Self::SystemPrompt,
        }
    }
}

pub async fn handle_route(action: RouteAction, config_path: Option<&Path>) -> Result<()> {
    match action {
        RouteAction::Target {
            originating_to,
            originating_channel,
            session_key,
            from,
            to,
        } => {
            let signals = CommandReplySignals {
                originating_to,
                originating_channel,
                command_target_session_key: session_key,
                command_from: from,
                command_to: to,
            };
            let resolved = resolve_command_reply_target_with_rule(&signals);
            print_json(&json!({
                "to": resolved.as_ref().map(|(to, _)| to),
                "rule": resolved.as_ref().map(|(_, rule)| rule.as_str()),
            }))
        },
        RouteAction::Model {
            channel,
            account,
            chat_type,
            group,
            topic,
            field,
        } => {
            let config = crate::load_config(config_path)?;
            let scope = ChatScope {
                channel,
                account_id: account,
                chat_type: chat_type.into(),
                group_id: group,
                topic_id: topic,
            };
            let resolved = if scope.channel.eq_ignore_ascii_case(moltis_telegram::CHANNEL) {
                resolve_with_lookup(field.into(), &scope, &TelegramGroupLookup::new(&config))
            } else {
                let lookup = |scope: &ChatScope| config_tiers(&config, scope);
                resolve_with_lookup(field.into(), &scope, &lookup)
            };
            print_json(&json!({
                "value": resolved.as_ref().map(|r| r.value.as_str()),
                "level": resolved.as_ref().map(|r| r.level.as_str()),
            }))
        },
        RouteAction::Telegram { account, message } => {
            let config = crate::load_config(config_path)?;
            let raw = read_input(&message)?;
            let message = TelegramMessage::from_json(&raw)?;
            let ctx = build_message_context(&config, &account, &message)?;
            print_json(&json!({
                "chat_type": ctx.chat_type,
                "session_key": ctx.session_key,
                "reply_target": ctx.reply_target,
                "model": ctx.model,
                "msg": ctx.msg,
            }))
        },
    }
}

/// Tiers for channels without their own lookup: account groups only, no
/// channel-wide group fallback.
fn config_tiers(config: &MoltisConfig, scope: &ChatScope) -> ScopeTiers {
    let channel = config.channels.get(&scope.channel);
    let account = channel.and_then(|c| c.account(&scope.account_id));
    let group = scope
        .group()
        .and_then(|id| account.and_then(|a| a.groups.get(id)));
    ScopeTiers {
        topic: scope
            .topic()
            .and_then(|id| group.and_then(|g| g.topics.get(id)))
            .cloned(),
        group: group.map(|g| g.overrides.clone()),
        account: account.map(|a| a.overrides.clone()),
        channel: channel.map(|c| c.overrides.clone()),
        global: Some(config.agents.defaults.overrides.clone()),
    }
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read message from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, moltis_routing::ScopeLevel};

    fn slack_config() -> MoltisConfig {
        toml::from_str(
            r#"
[agents.defaults]
model = "anthropic/claude-opus-4-5"

[channels.slack.accounts.work]
model = "openai/gpt-5.2"

[channels.slack.accounts.work.groups.C024BE91L]
system_prompt = "Answer in the thread."
"#,
        )
        .unwrap()
    }

    fn scope(chat_type: ChatType) -> ChatScope {
        ChatScope {
            channel: "slack".into(),
            account_id: "work".into(),
            chat_type,
            group_id: Some("C024BE91L".into()),
            topic_id: None,
        }
    }

    #[test]
    fn generic_tiers_cover_account_groups() {
        let config = slack_config();
        let lookup = |scope: &ChatScope| config_tiers(&config, scope);

        let prompt =
            resolve_with_lookup(ScopeField::SystemPrompt, &scope(ChatType::Group), &lookup)
                .unwrap();
        assert_eq!(prompt.level, ScopeLevel::Group);

        let model = resolve_with_lookup(ScopeField::Model, &scope(ChatType::Group), &lookup)
            .unwrap();
        assert_eq!(model.value, "openai/gpt-5.2");
        assert_eq!(model.level, ScopeLevel::Account);
    }

    #[test]
    fn dm_skips_group_tier() {
        let config = slack_config();
        let tiers = config_tiers(&config, &scope(ChatType::Dm));
        assert!(tiers.group.is_none());
        assert!(tiers.account.is_some());
    }

    #[test]
    fn read_input_reports_missing_file() {
        let err = read_input("/nonexistent/message.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/message.json"));
    }
}
