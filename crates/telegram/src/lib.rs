//! Telegram channel adapter for moltis.
//!
//! Turns Bot API messages into [`MsgContext`](moltis_common::types::MsgContext)
//! values: chat classification, session keys, reply targets and the
//! effective model from `channels.telegram` group and topic overrides.

pub mod chat;
pub mod context;
pub mod error;
pub mod lookup;

pub use {
    chat::{TelegramChat, TelegramChatKind, TelegramMessage, TelegramUser, classify_chat},
    context::{TelegramMessageContext, build_message_context},
    error::{Error, Result},
    lookup::{CHANNEL, TelegramGroupLookup},
};
