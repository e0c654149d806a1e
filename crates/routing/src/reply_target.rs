//! Pick the one real destination a command reply is sent to.
//!
//! A command carries several addressing signals that can disagree: the
//! address the user physically typed into, the session the command acts on,
//! and the nominal `from`/`to` pair. Pseudo-addresses (`slash:*`) never become
//! destinations, and on topic-capable channels the session's own chat wins
//! over a differing origin so `/new` typed through a slash surface still
//! replies into the group it reset.

use std::fmt;

use {
    moltis_channels::ChannelType,
    moltis_common::types::MsgContext,
    moltis_sessions::parse_agent_session_key,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

#[cfg(feature = "metrics")]
use moltis_metrics::{counter, labels, routing as routing_metrics};

use crate::address::{RoutingAddress, is_pseudo_address};

/// Addressing signals attached to one command invocation. Every field is
/// optional; blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandReplySignals {
    /// Address the user interacted through.
    pub originating_to: Option<String>,
    /// Channel name of the origin, e.g. `telegram`.
    pub originating_channel: Option<String>,
    /// Session the command operates on.
    pub command_target_session_key: Option<String>,
    /// Address the command was received from.
    pub command_from: Option<String>,
    /// Address the command nominally replies to; may be a pseudo-address.
    pub command_to: Option<String>,
}

impl From<&MsgContext> for CommandReplySignals {
    fn from(msg: &MsgContext) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        let present = |s: &Option<String>| s.as_deref().and_then(non_empty);
        Self {
            originating_to: present(&msg.originating_to),
            originating_channel: present(&msg.originating_channel),
            command_target_session_key: present(&msg.command_target_session_key),
            command_from: non_empty(&msg.from),
            command_to: non_empty(&msg.to),
        }
    }
}

/// Which precedence rule produced the reply target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyRuleKind {
    /// The command's session lives in a different chat than the origin.
    SessionTargetOverride,
    OriginatingTo,
    SessionTarget,
    CommandFrom,
    CommandTo,
}

impl ReplyRuleKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionTargetOverride => "session_target_override",
            Self::OriginatingTo => "originating_to",
            Self::SessionTarget => "session_target",
            Self::CommandFrom => "command_from",
            Self::CommandTo => "command_to",
        }
    }
}

impl fmt::Display for ReplyRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signals after trimming, plus the derived session target.
struct RuleInput<'a> {
    session_target: Option<String>,
    originating_to: Option<&'a str>,
    command_from: Option<&'a str>,
    command_to: Option<&'a str>,
}

struct ReplyRule {
    kind: ReplyRuleKind,
    apply: fn(&RuleInput<'_>) -> Option<String>,
}

/// Evaluated in order; the first rule that yields an address wins.
const RULES: &[ReplyRule] = &[
    ReplyRule {
        kind: ReplyRuleKind::SessionTargetOverride,
        apply: |input| match (input.originating_to, &input.session_target) {
            (Some(origin), Some(target)) if origin != target.as_str() => Some(target.clone()),
            _ => None,
        },
    },
    ReplyRule {
        kind: ReplyRuleKind::OriginatingTo,
        apply: |input| input.originating_to.map(str::to_string),
    },
    ReplyRule {
        kind: ReplyRuleKind::SessionTarget,
        apply: |input| input.session_target.clone(),
    },
    ReplyRule {
        kind: ReplyRuleKind::CommandFrom,
        apply: |input| input.command_from.map(str::to_string),
    },
    ReplyRule {
        kind: ReplyRuleKind::CommandTo,
        apply: |input| {
            input
                .command_to
                .filter(|to| is_routable_address(to))
                .map(str::to_string)
        },
    },
];

fn trimmed(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn normalize_channel(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_lowercase()
}

/// Parent chat address of the group/broadcast scope a session lives in.
///
/// Only topic-capable channels derive one. The scope chain comes from the
/// parsed session key, or from the lowercased raw key when it is not in
/// `agent:` form, and must start with `<channel>:<group scope>:`. The chat id
/// ends at the topic marker or the next `:`; replies go to the parent chat,
/// not the thread.
fn derive_session_target(channel: ChannelType, session_key: Option<&str>) -> Option<String> {
    let caps = channel.capabilities();
    if !caps.topics {
        return None;
    }
    let rest = match parse_agent_session_key(session_key) {
        Some(parsed) => parsed.rest,
        None => session_key.unwrap_or_default().trim().to_lowercase(),
    };
    let scoped = rest
        .strip_prefix(channel.as_str())
        .and_then(|r| r.strip_prefix(':'))?;
    let (scope, tail) = caps.group_scopes.iter().find_map(|scope| {
        scoped
            .strip_prefix(scope)
            .and_then(|r| r.strip_prefix(':'))
            .map(|tail| (*scope, tail))
    })?;

    let tail = match caps.topic_scope {
        Some(topic) => tail
            .split_once(&format!(":{topic}:"))
            .map_or(tail, |(head, _)| head),
        None => tail,
    };
    let chat_id = tail.split(':').next().unwrap_or_default().trim();
    if chat_id.is_empty() {
        return None;
    }

    let address: RoutingAddress = format!("{channel}:{scope}:{chat_id}").parse().ok()?;
    address.parent_chat().map(|chat| chat.to_string())
}

/// Routable unless it is a pseudo-address; unparseable values pass through.
fn is_routable_address(address: &str) -> bool {
    match address.parse::<RoutingAddress>() {
        Ok(parsed) => parsed.is_routable(),
        Err(_) => !is_pseudo_address(address),
    }
}

/// Resolve the reply destination and report which rule chose it.
pub fn resolve_command_reply_target_with_rule(
    signals: &CommandReplySignals,
) -> Option<(String, ReplyRuleKind)> {
    let channel_name = normalize_channel(signals.originating_channel.as_deref());
    let session_target = ChannelType::from_name(&channel_name).and_then(|channel| {
        derive_session_target(channel, signals.command_target_session_key.as_deref())
    });

    let input = RuleInput {
        session_target,
        originating_to: trimmed(signals.originating_to.as_ref()),
        command_from: trimmed(signals.command_from.as_ref()),
        command_to: trimmed(signals.command_to.as_ref()),
    };

    let resolved = RULES
        .iter()
        .find_map(|rule| (rule.apply)(&input).map(|to| (to, rule.kind)));

    match &resolved {
        Some((to, rule)) => {
            debug!(channel = %channel_name, %rule, to = %to, "resolved command reply target");
            #[cfg(feature = "metrics")]
            counter!(
                routing_metrics::REPLY_TARGET_RESOLVED_TOTAL,
                labels::RULE => rule.as_str()
            )
            .increment(1);
        },
        None => {
            debug!(channel = %channel_name, "no routable command reply target");
            #[cfg(feature = "metrics")]
            counter!(routing_metrics::REPLY_TARGET_UNROUTABLE_TOTAL).increment(1);
        },
    }

    resolved
}

/// Resolve the single outbound destination for a command reply, or `None`
/// when nothing routable is available.
pub fn resolve_command_reply_target(signals: &CommandReplySignals) -> Option<String> {
    resolve_command_reply_target_with_rule(signals).map(|(to, _)| to)
}
