//! Inbound message processing pipeline, the glue between channels and agents.
//!
//! Flow: channel message → MsgContext → scoped model/prompt → agent turn →
//! reply target → delivery via channel outbound.

pub mod reply;
pub mod runner;

pub use {
    reply::{ReplyDispatch, deliver_reply, dispatch_command_reply},
    runner::{AgentRequest, AgentRunner},
};
