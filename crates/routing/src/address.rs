//! Routing addresses: `channel:chatId`, `channel:scope:chatId[:kind:id...]`,
//! and non-routable pseudo-addresses such as `slash:12345`.

use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// Address kinds that denote a non-channel origin and are never valid reply
/// destinations.
pub const PSEUDO_KINDS: &[&str] = &["slash"];

/// Case-insensitive check for a `<pseudo-kind>:` prefix.
pub fn is_pseudo_address(address: &str) -> bool {
    let lower = address.trim().to_lowercase();
    PSEUDO_KINDS.iter().any(|kind| {
        lower
            .strip_prefix(kind)
            .is_some_and(|rest| rest.starts_with(':'))
    })
}

/// Trailing `kind:id` pair narrowing a scoped address, e.g. `topic:99`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubScope {
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingAddress {
    /// Direct chat address, e.g. `telegram:-100123`.
    Chat { channel: String, chat_id: String },
    /// Address with an explicit scope token, e.g.
    /// `telegram:group:-100123:topic:99`.
    Scoped {
        channel: String,
        scope: String,
        chat_id: String,
        subscopes: Vec<SubScope>,
    },
    /// Command-line or slash-command origin.
    Pseudo { kind: String, id: String },
}

impl RoutingAddress {
    pub fn chat(channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self::Chat {
            channel: channel.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Channel name, or `None` for pseudo-addresses.
    pub fn channel(&self) -> Option<&str> {
        match self {
            Self::Chat { channel, .. } | Self::Scoped { channel, .. } => Some(channel),
            Self::Pseudo { .. } => None,
        }
    }

    pub fn chat_id(&self) -> &str {
        match self {
            Self::Chat { chat_id, .. } | Self::Scoped { chat_id, .. } => chat_id,
            Self::Pseudo { id, .. } => id,
        }
    }

    pub fn scope(&self) -> Option<&str> {
        match self {
            Self::Scoped { scope, .. } => Some(scope),
            _ => None,
        }
    }

    pub fn is_routable(&self) -> bool {
        !matches!(self, Self::Pseudo { .. })
    }

    /// Parent chat of this address with scope and sub-scopes dropped.
    pub fn parent_chat(&self) -> Option<Self> {
        match self {
            Self::Chat { .. } => Some(self.clone()),
            Self::Scoped {
                channel, chat_id, ..
            } => Some(Self::chat(channel.clone(), chat_id.clone())),
            Self::Pseudo { .. } => None,
        }
    }
}

impl FromStr for RoutingAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() < 2 {
            return Err(Error::invalid_address(raw, "missing ':' separator"));
        }
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(Error::invalid_address(raw, "empty segment"));
        }

        if is_pseudo_address(raw) {
            return Ok(Self::Pseudo {
                kind: parts[0].to_string(),
                id: parts[1..].join(":"),
            });
        }

        let channel = parts[0].to_string();
        let tail = &parts[2..];
        // A scope chain needs `scope:chatId` followed by whole `kind:id` pairs;
        // anything else is an opaque chat id (some platforms use ':' in ids).
        if parts.len() >= 3 && (tail.len() - 1) % 2 == 0 {
            let subscopes = tail[1..]
                .chunks_exact(2)
                .map(|pair| SubScope {
                    kind: pair[0].to_string(),
                    id: pair[1].to_string(),
                })
                .collect();
            return Ok(Self::Scoped {
                channel,
                scope: parts[1].to_string(),
                chat_id: tail[0].to_string(),
                subscopes,
            });
        }

        Ok(Self::Chat {
            channel,
            chat_id: parts[1..].join(":"),
        })
    }
}

impl fmt::Display for RoutingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat { channel, chat_id } => write!(f, "{channel}:{chat_id}"),
            Self::Scoped {
                channel,
                scope,
                chat_id,
                subscopes,
            } => {
                write!(f, "{channel}:{scope}:{chat_id}")?;
                for sub in subscopes {
                    write!(f, ":{}:{}", sub.kind, sub.id)?;
                }
                Ok(())
            },
            Self::Pseudo { kind, id } => write!(f, "{kind}:{id}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn parses_plain_chat() {
        let addr: RoutingAddress = "telegram:-100123".parse().unwrap();
        assert_eq!(addr, RoutingAddress::chat("telegram", "-100123"));
        assert_eq!(addr.channel(), Some("telegram"));
        assert!(addr.is_routable());
    }

    #[test]
    fn parses_topic_scope() {
        let addr: RoutingAddress = "telegram:group:-1001234567890:topic:99".parse().unwrap();
        assert_eq!(addr.scope(), Some("group"));
        assert_eq!(addr.chat_id(), "-1001234567890");
        let RoutingAddress::Scoped { ref subscopes, .. } = addr else {
            panic!("expected scoped address: {addr:?}");
        };
        assert_eq!(subscopes, &[SubScope {
            kind: "topic".into(),
            id: "99".into()
        }]);
        assert_eq!(
            addr.parent_chat().unwrap().to_string(),
            "telegram:-1001234567890"
        );
    }

    #[test]
    fn uneven_tail_is_opaque_chat_id() {
        let addr: RoutingAddress = "msteams:19:abc@thread:v2".parse().unwrap();
        assert_eq!(addr.chat_id(), "19:abc@thread:v2");
        assert_eq!(addr.scope(), None);
    }

    #[test]
    fn slash_is_pseudo() {
        let addr: RoutingAddress = "SLASH:12345".parse().unwrap();
        assert!(!addr.is_routable());
        assert!(addr.channel().is_none());
        assert!(addr.parent_chat().is_none());
    }

    #[rstest]
    #[case("slash:12345", true)]
    #[case("  Slash:1 ", true)]
    #[case("slash:", true)]
    #[case("slash", false)]
    #[case("slashdot:1", false)]
    #[case("telegram:12345", false)]
    fn pseudo_prefix(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_pseudo_address(input), expected);
    }

    #[rstest]
    #[case("telegram")]
    #[case("telegram:")]
    #[case(":123")]
    #[case("telegram:group::topic:1")]
    fn rejects_malformed(#[case] input: &str) {
        assert!(input.parse::<RoutingAddress>().is_err());
    }

    #[rstest]
    #[case("telegram:12345")]
    #[case("telegram:group:-100123")]
    #[case("telegram:group:-100123:topic:99")]
    #[case("telegram:bot1:dm:user123")]
    #[case("slash:12345")]
    fn display_matches_input(#[case] input: &str) {
        assert_eq!(input.parse::<RoutingAddress>().unwrap().to_string(), input);
    }
}
