//! Channel types, per-channel capabilities, and the outbound delivery seam.
//!
//! Each messaging platform (Telegram, Discord, Slack, ...) is identified by a
//! [`ChannelType`]. Capabilities describe how a platform scopes its chats so
//! routing can stay platform-agnostic.

pub mod error;
pub mod plugin;

pub use {
    error::{Error, Result},
    plugin::{ChannelCapabilities, ChannelOutbound, ChannelReplyTarget, ChannelType},
};
