//! Effective per-chat settings from the channel → account → group → topic
//! override hierarchy.
//!
//! Where group and topic overrides are stored is the channel adapter's
//! business; it hands them in through [`ScopeLookup`] or as an already
//! looked-up [`ScopeTiers`]. Resolution itself only walks the tiers.

use std::fmt;

use {
    moltis_common::types::{ChatType, MsgContext},
    moltis_config::ScopeOverrides,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

#[cfg(feature = "metrics")]
use moltis_metrics::{counter, labels, routing as routing_metrics};

/// One tier of the override hierarchy, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeLevel {
    Topic,
    Group,
    Account,
    Channel,
    Global,
}

impl ScopeLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Group => "group",
            Self::Account => "account",
            Self::Channel => "channel",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that may be present but still count as "not set".
pub trait ScopeValue {
    fn is_set(&self) -> bool;
}

impl ScopeValue for str {
    fn is_set(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl ScopeValue for String {
    fn is_set(&self) -> bool {
        self.as_str().is_set()
    }
}

impl<T: ScopeValue> ScopeValue for Vec<T> {
    fn is_set(&self) -> bool {
        !self.is_empty()
    }
}

/// First tier whose value is present and set. Absent or empty tiers defer to
/// the next one; nothing is ever cleared by a more specific tier.
pub fn first_non_empty<'a, T, I>(tiers: I) -> Option<(ScopeLevel, &'a T)>
where
    T: ScopeValue + ?Sized + 'a,
    I: IntoIterator<Item = (ScopeLevel, Option<&'a T>)>,
{
    tiers
        .into_iter()
        .find_map(|(level, value)| value.filter(|v| v.is_set()).map(|v| (level, v)))
}

/// Field selector for [`ScopeOverrides`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeField {
    Model,
    ModelProvider,
    SystemPrompt,
}

impl ScopeField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::ModelProvider => "model_provider",
            Self::SystemPrompt => "system_prompt",
        }
    }

    /// This field's value within one scope's overrides.
    #[must_use]
    pub fn get(self, overrides: &ScopeOverrides) -> Option<&str> {
        match self {
            Self::Model => overrides.model.as_deref(),
            Self::ModelProvider => overrides.model_provider.as_deref(),
            Self::SystemPrompt => overrides.system_prompt.as_deref(),
        }
    }
}

/// Identity of the chat a message arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatScope {
    pub channel: String,
    pub account_id: String,
    pub chat_type: ChatType,
    /// Chat id, for group and broadcast chats.
    pub group_id: Option<String>,
    /// Thread id inside a forum-style group.
    pub topic_id: Option<String>,
}

impl ChatScope {
    /// Group id when group-level overrides apply to this chat.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        if !self.chat_type.is_group_like() {
            return None;
        }
        self.group_id.as_deref().filter(|g| !g.trim().is_empty())
    }

    /// Topic id when topic-level overrides apply to this chat.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.group()?;
        self.topic_id.as_deref().filter(|t| !t.trim().is_empty())
    }
}

impl From<&MsgContext> for ChatScope {
    fn from(msg: &MsgContext) -> Self {
        Self {
            channel: msg.channel.clone(),
            account_id: msg.account_id.clone(),
            chat_type: msg.chat_type,
            group_id: msg.group_id.clone(),
            topic_id: msg.topic_id.clone(),
        }
    }
}

/// Overrides for each tier, as located for one chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeTiers {
    pub topic: Option<ScopeOverrides>,
    pub group: Option<ScopeOverrides>,
    pub account: Option<ScopeOverrides>,
    pub channel: Option<ScopeOverrides>,
    pub global: Option<ScopeOverrides>,
}

impl ScopeTiers {
    /// Tiers in precedence order, skipping the ones the chat does not have.
    fn ordered<'a>(
        &'a self,
        scope: &ChatScope,
    ) -> [(ScopeLevel, Option<&'a ScopeOverrides>); 5] {
        let topic = scope.topic().and(self.topic.as_ref());
        let group = scope.group().and(self.group.as_ref());
        [
            (ScopeLevel::Topic, topic),
            (ScopeLevel::Group, group),
            (ScopeLevel::Account, self.account.as_ref()),
            (ScopeLevel::Channel, self.channel.as_ref()),
            (ScopeLevel::Global, self.global.as_ref()),
        ]
    }
}

/// Locates the per-tier overrides for a chat. Implemented by channel adapters
/// over whatever config storage they use.
pub trait ScopeLookup {
    fn lookup(&self, scope: &ChatScope) -> ScopeTiers;
}

impl<F> ScopeLookup for F
where
    F: Fn(&ChatScope) -> ScopeTiers,
{
    fn lookup(&self, scope: &ChatScope) -> ScopeTiers {
        self(scope)
    }
}

/// An effective value and the tier that provided it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub value: String,
    pub level: ScopeLevel,
}

/// Walk the tiers for one field. Returns `None` when no tier sets it; any
/// hard-coded baseline is the caller's to apply.
pub fn resolve_field(
    field: ScopeField,
    scope: &ChatScope,
    tiers: &ScopeTiers,
) -> Option<ResolvedField> {
    let ordered = tiers.ordered(scope);
    let resolved = first_non_empty(
        ordered
            .iter()
            .map(|(level, overrides)| (*level, overrides.and_then(|o| field.get(o)))),
    )
    .map(|(level, value)| ResolvedField {
        value: value.trim().to_string(),
        level,
    });

    match &resolved {
        Some(r) => {
            debug!(
                field = field.as_str(),
                level = %r.level,
                channel = %scope.channel,
                account_id = %scope.account_id,
                "resolved scoped config field"
            );
            #[cfg(feature = "metrics")]
            counter!(
                routing_metrics::SCOPE_FIELD_RESOLVED_TOTAL,
                labels::FIELD => field.as_str(),
                labels::SCOPE_LEVEL => r.level.as_str()
            )
            .increment(1);
        },
        None => debug!(
            field = field.as_str(),
            channel = %scope.channel,
            "scoped config field unset at every level"
        ),
    }

    resolved
}

/// Effective value of `field` for the chat, or `None` when unset everywhere.
pub fn resolve_effective_field(
    field: ScopeField,
    scope: &ChatScope,
    tiers: &ScopeTiers,
) -> Option<String> {
    resolve_field(field, scope, tiers).map(|r| r.value)
}

/// Look up the tiers with the caller's strategy, then resolve `field`.
pub fn resolve_with_lookup(
    field: ScopeField,
    scope: &ChatScope,
    lookup: &impl ScopeLookup,
) -> Option<ResolvedField> {
    let tiers = lookup.lookup(scope);
    resolve_field(field, scope, &tiers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest};

    fn forum_topic() -> ChatScope {
        ChatScope {
            channel: "telegram".into(),
            account_id: "default".into(),
            chat_type: ChatType::Group,
            group_id: Some("-100123".into()),
            topic_id: Some("99".into()),
        }
    }

    fn full_tiers() -> ScopeTiers {
        ScopeTiers {
            topic: Some(ScopeOverrides::with_model("google/gemini-2.5-pro")),
            group: Some(ScopeOverrides::with_model("openai/gpt-4.1-mini")),
            account: Some(ScopeOverrides::with_model("anthropic/claude-sonnet-4-5")),
            channel: Some(ScopeOverrides::with_model("openai/gpt-5.2")),
            global: Some(ScopeOverrides::with_model("anthropic/claude-opus-4-5")),
        }
    }

    #[test]
    fn topic_beats_group_and_account() {
        let resolved = resolve_field(ScopeField::Model, &forum_topic(), &full_tiers()).unwrap();
        assert_eq!(resolved.value, "google/gemini-2.5-pro");
        assert_eq!(resolved.level, ScopeLevel::Topic);
    }

    #[test]
    fn group_message_without_topic_uses_group() {
        let scope = ChatScope {
            topic_id: None,
            ..forum_topic()
        };
        assert_eq!(
            resolve_effective_field(ScopeField::Model, &scope, &full_tiers()).as_deref(),
            Some("openai/gpt-4.1-mini")
        );
    }

    #[test]
    fn no_group_or_topic_config_falls_to_account() {
        let tiers = ScopeTiers {
            topic: None,
            group: None,
            ..full_tiers()
        };
        let resolved = resolve_field(ScopeField::Model, &forum_topic(), &tiers).unwrap();
        assert_eq!(resolved.value, "anthropic/claude-sonnet-4-5");
        assert_eq!(resolved.level, ScopeLevel::Account);
    }

    #[rstest]
    #[case::topic(5, ScopeLevel::Topic)]
    #[case::group(4, ScopeLevel::Group)]
    #[case::account(3, ScopeLevel::Account)]
    #[case::channel(2, ScopeLevel::Channel)]
    #[case::global(1, ScopeLevel::Global)]
    fn falls_through_one_level_at_a_time(#[case] present: usize, #[case] expected: ScopeLevel) {
        // Blank out tiers from most specific down, leaving `present` tiers set.
        let mut tiers = full_tiers();
        let slots = [
            &mut tiers.topic,
            &mut tiers.group,
            &mut tiers.account,
            &mut tiers.channel,
            &mut tiers.global,
        ];
        for slot in slots.into_iter().take(5 - present) {
            *slot = Some(ScopeOverrides::with_model("   "));
        }
        let resolved = resolve_field(ScopeField::Model, &forum_topic(), &tiers).unwrap();
        assert_eq!(resolved.level, expected);
    }

    #[test]
    fn empty_everywhere_is_unset() {
        let tiers = ScopeTiers {
            topic: Some(ScopeOverrides::with_model("")),
            account: Some(ScopeOverrides::default()),
            ..Default::default()
        };
        assert_eq!(
            resolve_effective_field(ScopeField::Model, &forum_topic(), &tiers),
            None
        );
    }

    #[test]
    fn dm_ignores_group_and_topic_tiers() {
        let scope = ChatScope {
            chat_type: ChatType::Dm,
            ..forum_topic()
        };
        let resolved = resolve_field(ScopeField::Model, &scope, &full_tiers()).unwrap();
        assert_eq!(resolved.level, ScopeLevel::Account);
    }

    #[test]
    fn topic_without_group_id_is_ignored() {
        let scope = ChatScope {
            group_id: None,
            ..forum_topic()
        };
        assert_eq!(scope.topic(), None);
        let resolved = resolve_field(ScopeField::Model, &scope, &full_tiers()).unwrap();
        assert_eq!(resolved.level, ScopeLevel::Account);
    }

    #[test]
    fn fields_resolve_independently() {
        let tiers = ScopeTiers {
            topic: Some(ScopeOverrides::with_model("google/gemini-2.5-pro")),
            account: Some(ScopeOverrides {
                system_prompt: Some("Be brief.".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let prompt = resolve_field(ScopeField::SystemPrompt, &forum_topic(), &tiers).unwrap();
        assert_eq!(prompt.value, "Be brief.");
        assert_eq!(prompt.level, ScopeLevel::Account);
        assert_eq!(
            resolve_effective_field(ScopeField::ModelProvider, &forum_topic(), &tiers),
            None
        );
    }

    #[test]
    fn closure_lookup_strategy() {
        let lookup = |scope: &ChatScope| ScopeTiers {
            group: scope
                .group()
                .filter(|g| *g == "-100123")
                .map(|_| ScopeOverrides::with_model("openai/gpt-4.1-mini")),
            ..Default::default()
        };
        let resolved = resolve_with_lookup(ScopeField::Model, &forum_topic(), &lookup).unwrap();
        assert_eq!(resolved.value, "openai/gpt-4.1-mini");
        assert_eq!(resolved.level, ScopeLevel::Group);
    }

    #[test]
    fn scope_from_msg_context() {
        let msg = MsgContext {
            channel: "telegram".into(),
            account_id: "default".into(),
            chat_type: ChatType::Group,
            group_id: Some("-100123".into()),
            topic_id: Some("99".into()),
            ..Default::default()
        };
        assert_eq!(ChatScope::from(&msg), forum_topic());
    }

    #[test]
    fn first_non_empty_over_plain_strings() {
        let a = String::new();
        let b = "x".to_string();
        let hit = first_non_empty([
            (ScopeLevel::Topic, None),
            (ScopeLevel::Group, Some(&a)),
            (ScopeLevel::Account, Some(&b)),
        ]);
        assert_eq!(hit, Some((ScopeLevel::Account, &b)));

        let empty: Vec<String> = Vec::new();
        assert_eq!(first_non_empty([(ScopeLevel::Global, Some(&empty))]), None);
    }
}
