//! Config schema types: agent defaults and the per-channel override tree
//! (`channels.<channel>.accounts.<account>.groups.<chat>.topics.<thread>`).

use std::collections::HashMap;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Agent served when no binding picks another one.
pub const DEFAULT_AGENT_ID: &str = "main";

/// Settings that any scope may override. Absent or blank values defer to the
/// enclosing scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeOverrides {
    /// Model ID, e.g. `anthropic/claude-sonnet-4-5`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Provider name associated with `model` (e.g. "anthropic").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_provider: Option<String>,
    /// Extra system prompt text for sessions in this scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl ScopeOverrides {
    #[must_use]
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MoltisConfig {
    pub agents: AgentsConfig,
    pub channels: ChannelsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub defaults: AgentDefaults,
}

/// Global defaults applied when no channel scope sets a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDefaults {
    pub id: String,
    #[serde(flatten)]
    pub overrides: ScopeOverrides,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            id: DEFAULT_AGENT_ID.into(),
            overrides: ScopeOverrides::default(),
        }
    }
}

/// Channel configs keyed by channel name (`telegram`, `discord`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelsConfig(pub HashMap<String, ChannelConfig>);

impl ChannelsConfig {
    /// Channel config by name. Names are matched case-insensitively.
    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&ChannelConfig> {
        let wanted = channel.trim();
        self.0.get(wanted).or_else(|| {
            self.0
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
                .map(|(_, cfg)| cfg)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ChannelConfig)> {
        self.0.iter()
    }
}

/// Channel-wide defaults plus per-account and per-group overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    #[serde(flatten)]
    pub overrides: ScopeOverrides,
    pub accounts: HashMap<String, ChannelAccountConfig>,
    /// Group overrides shared by every account of this channel.
    pub groups: HashMap<String, GroupConfig>,
}

impl ChannelConfig {
    #[must_use]
    pub fn account(&self, account_id: &str) -> Option<&ChannelAccountConfig> {
        self.accounts.get(account_id)
    }
}

/// One bot account/identity on a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelAccountConfig {
    /// Bot token for the platform API.
    #[serde(
        serialize_with = "serialize_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    #[serde(flatten)]
    pub overrides: ScopeOverrides,
    /// Group overrides for this account only; these win over channel-wide
    /// group entries for the same chat.
    pub groups: HashMap<String, GroupConfig>,
}

/// Overrides for one group/broadcast chat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    #[serde(flatten)]
    pub overrides: ScopeOverrides,
    /// Topic overrides keyed by thread id.
    pub topics: HashMap<String, ScopeOverrides>,
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_str(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[agents.defaults]
model = "anthropic/claude-opus-4-5"

[channels.telegram]
model = "openai/gpt-5.2"

[channels.telegram.accounts.default]
token = "123:ABC"
model = "anthropic/claude-sonnet-4-5"

[channels.telegram.accounts.default.groups."-100123"]
model = "openai/gpt-4.1-mini"

[channels.telegram.accounts.default.groups."-100123".topics."99"]
model = "google/gemini-2.5-pro"
"#;

    #[test]
    fn parses_override_tree() {
        let cfg: MoltisConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.agents.defaults.id, "main");
        assert_eq!(
            cfg.agents.defaults.overrides.model.as_deref(),
            Some("anthropic/claude-opus-4-5")
        );
        let tg = cfg.channels.get("Telegram").unwrap();
        assert_eq!(tg.overrides.model.as_deref(), Some("openai/gpt-5.2"));
        let account = tg.account("default").unwrap();
        assert_eq!(account.token.as_ref().unwrap().expose_secret(), "123:ABC");
        let group = &account.groups["-100123"];
        assert_eq!(group.overrides.model.as_deref(), Some("openai/gpt-4.1-mini"));
        assert_eq!(
            group.topics["99"].model.as_deref(),
            Some("google/gemini-2.5-pro")
        );
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let cfg: MoltisConfig = toml::from_str(SAMPLE).unwrap();
        let account = cfg.channels.get("telegram").unwrap().account("default").unwrap();
        assert!(!format!("{account:?}").contains("123:ABC"));
    }

    #[test]
    fn serializes_through_json() {
        let cfg: MoltisConfig = toml::from_str(SAMPLE).unwrap();
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(
            json["channels"]["telegram"]["accounts"]["default"]["model"],
            "anthropic/claude-sonnet-4-5"
        );
        assert_eq!(json["channels"]["telegram"]["accounts"]["default"]["token"], "123:ABC");
        let back: MoltisConfig = serde_json::from_value(json).unwrap();
        assert!(back.channels.get("telegram").is_some());
    }

    #[test]
    fn empty_config_defaults() {
        let cfg: MoltisConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.agents.defaults.id, DEFAULT_AGENT_ID);
        assert!(cfg.agents.defaults.overrides.model.is_none());
        assert!(cfg.channels.get("telegram").is_none());
    }
}
