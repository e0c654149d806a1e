use {
    async_trait::async_trait,
    moltis_common::types::{MsgContext, ReplyPayload},
};

/// One agent turn as handed to the engine.
#[derive(Debug, Clone, Copy)]
pub struct AgentRequest<'a> {
    pub msg: &'a MsgContext,
    /// Effective model for the chat, `None` to let the engine pick.
    pub model: Option<&'a str>,
    /// Scoped system prompt addition.
    pub system_prompt: Option<&'a str>,
    /// Where the reply will be delivered, if anywhere.
    pub message_to: Option<&'a str>,
}

/// The agent engine that turns a message into a reply.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, request: AgentRequest<'_>) -> anyhow::Result<ReplyPayload>;
}
