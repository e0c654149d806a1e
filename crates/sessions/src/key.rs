use std::fmt;

use serde::{Deserialize, Serialize};

/// Agent that owns sessions when no explicit agent is bound.
pub const DEFAULT_AGENT_ID: &str = "main";

const AGENT_PREFIX: &str = "agent";

/// Structural parts of an `agent:<id>:<rest>` session key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSessionKey {
    pub agent_id: String,
    /// Scope chain the session belongs to, e.g. `telegram:group:-100123:topic:99`.
    pub rest: String,
}

/// Split a session key into its owning agent and scope chain.
///
/// Returns `None` for absent, blank, or malformed keys; callers fall back to
/// treating the raw string as opaque. Matching on the `agent` token is
/// case-sensitive and `rest` keeps its original case.
pub fn parse_agent_session_key(key: Option<&str>) -> Option<ParsedSessionKey> {
    let raw = key?.trim();
    if raw.is_empty() {
        return None;
    }
    let parts: Vec<&str> = raw.split(':').filter(|p| !p.is_empty()).collect();
    if parts.len() < 3 || parts[0] != AGENT_PREFIX {
        return None;
    }
    let agent_id = parts[1].trim();
    let rest = parts[2..].join(":");
    if agent_id.is_empty() || rest.trim().is_empty() {
        return None;
    }
    Some(ParsedSessionKey {
        agent_id: agent_id.to_string(),
        rest,
    })
}

/// Session key newtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Wrap an existing key string as-is.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key owned by `agent_id` for the given scope chain.
    pub fn for_agent(agent_id: &str, rest: &str) -> Self {
        Self(format!("{AGENT_PREFIX}:{agent_id}:{rest}"))
    }

    /// Scope chain for a group chat, optionally narrowed to a topic thread.
    pub fn group_scope(channel: &str, chat_id: &str, topic_id: Option<&str>) -> String {
        match topic_id {
            Some(topic) => format!("{channel}:group:{chat_id}:topic:{topic}"),
            None => format!("{channel}:group:{chat_id}"),
        }
    }

    /// Scope chain for a broadcast channel chat.
    pub fn channel_scope(channel: &str, chat_id: &str) -> String {
        format!("{channel}:channel:{chat_id}")
    }

    /// Scope chain for a direct conversation with one peer on one account.
    pub fn dm_scope(channel: &str, account_id: &str, peer_id: &str) -> String {
        format!("{channel}:{account_id}:dm:{peer_id}")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Option<ParsedSessionKey> {
        parse_agent_session_key(Some(&self.0))
    }

    /// Owning agent, if the key is in `agent:` form.
    pub fn agent(&self) -> Option<String> {
        self.parse().map(|p| p.agent_id)
    }

    /// Scope chain, if the key is in `agent:` form.
    pub fn rest(&self) -> Option<String> {
        self.parse().map(|p| p.rest)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for SessionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
