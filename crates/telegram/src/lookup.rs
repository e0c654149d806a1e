//! Per-chat override lookup over `channels.telegram` in the moltis config.

use {
    moltis_config::{ChannelConfig, GroupConfig, MoltisConfig, ScopeOverrides},
    moltis_routing::{ChatScope, ScopeField, ScopeLookup, ScopeTiers, ScopeValue},
};

/// Channel name under `channels.*`.
pub const CHANNEL: &str = "telegram";

/// Finds group and topic overrides for a Telegram chat.
///
/// Groups are looked up under `accounts.<id>.groups.<chat>` first; the
/// channel-wide `groups.<chat>` entry fills in any field the account entry
/// leaves unset. Topics follow the same rule under each group's `topics`.
pub struct TelegramGroupLookup<'a> {
    config: &'a MoltisConfig,
}

impl<'a> TelegramGroupLookup<'a> {
    pub fn new(config: &'a MoltisConfig) -> Self {
        Self { config }
    }

    fn channel(&self) -> Option<&'a ChannelConfig> {
        self.config.channels.get(CHANNEL)
    }

    /// Account-level and channel-level entries for one group chat.
    fn groups(&self, account_id: &str, chat_id: &str) -> [Option<&'a GroupConfig>; 2] {
        let channel = self.channel();
        let account = channel
            .and_then(|c| c.account(account_id))
            .and_then(|a| a.groups.get(chat_id));
        [account, channel.and_then(|c| c.groups.get(chat_id))]
    }
}

impl ScopeLookup for TelegramGroupLookup<'_> {
    fn lookup(&self, scope: &ChatScope) -> ScopeTiers {
        let channel = self.channel();
        let groups = scope
            .group()
            .map(|chat_id| self.groups(&scope.account_id, chat_id.trim()))
            .unwrap_or_default();

        let topic = scope.topic().and_then(|topic_id| {
            let [account, shared] = groups.map(|g| g.and_then(|g| g.topics.get(topic_id.trim())));
            overlay(account, shared)
        });
        let [account_group, shared_group] = groups;
        let group = overlay(
            account_group.map(|g| &g.overrides),
            shared_group.map(|g| &g.overrides),
        );

        ScopeTiers {
            topic,
            group,
            account: channel
                .and_then(|c| c.account(&scope.account_id))
                .map(|a| a.overrides.clone()),
            channel: channel.map(|c| c.overrides.clone()),
            global: Some(self.config.agents.defaults.overrides.clone()),
        }
    }
}

/// Field-wise merge: set values in `primary` win, `fallback` fills the rest.
fn overlay(
    primary: Option<&ScopeOverrides>,
    fallback: Option<&ScopeOverrides>,
) -> Option<ScopeOverrides> {
    match (primary, fallback) {
        (None, None) => None,
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (Some(primary), Some(fallback)) => {
            let pick = |field: ScopeField| {
                field
                    .get(primary)
                    .filter(|v| v.is_set())
                    .or_else(|| field.get(fallback))
                    .map(str::to_string)
            };
            Some(ScopeOverrides {
                model: pick(ScopeField::Model),
                model_provider: pick(ScopeField::ModelProvider),
                system_prompt: pick(ScopeField::SystemPrompt),
            })
        },
    }
}
