use {
    moltis_channels::ChannelOutbound,
    moltis_common::types::{MsgContext, ReplyPayload},
    moltis_routing::{
        ChatScope, CommandReplySignals, ScopeField, ScopeLookup,
        resolve_command_reply_target_with_rule, resolve_field,
    },
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use moltis_metrics::{auto_reply as auto_reply_metrics, counter, histogram, labels};

use crate::runner::{AgentRequest, AgentRunner};

/// Agent reply and where it should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDispatch {
    /// Routing address for the reply; `None` means the reply is suppressed.
    pub to: Option<String>,
    /// Model the agent was asked to use.
    pub model: Option<String>,
    pub payload: ReplyPayload,
}

/// Process an inbound message or command and decide where the reply goes.
///
/// `lookup` supplies the channel's override tiers for the model and system
/// prompt. The agent runs even when no destination resolves, so side effects
/// of commands like `/new` still happen.
pub async fn dispatch_command_reply(
    msg: &MsgContext,
    lookup: &impl ScopeLookup,
    runner: &dyn AgentRunner,
) -> anyhow::Result<ReplyDispatch> {
    #[cfg(feature = "metrics")]
    let start = std::time::Instant::now();

    #[cfg(feature = "metrics")]
    counter!(
        auto_reply_metrics::MESSAGES_RECEIVED_TOTAL,
        labels::CHANNEL => msg.channel.clone()
    )
    .increment(1);

    info!(
        channel = %msg.channel,
        account_id = %msg.account_id,
        from = %msg.from,
        sender = msg.sender_name.as_deref().unwrap_or("unknown"),
        chat_type = %msg.chat_type,
        session_key = %msg.session_key,
        "incoming message: {}",
        msg.body,
    );

    let scope = ChatScope::from(msg);
    let tiers = lookup.lookup(&scope);
    let model = resolve_field(ScopeField::Model, &scope, &tiers).map(|r| r.value);
    let system_prompt = resolve_field(ScopeField::SystemPrompt, &scope, &tiers).map(|r| r.value);

    let to = match resolve_command_reply_target_with_rule(&CommandReplySignals::from(msg)) {
        Some((to, rule)) => {
            debug!(to = %to, rule = %rule, "reply target resolved");
            Some(to)
        },
        None => {
            warn!(
                channel = %msg.channel,
                session_key = %msg.session_key,
                from = %msg.from,
                to = %msg.to,
                "no routable reply target; reply will be suppressed"
            );
            None
        },
    };

    let payload = runner
        .run(AgentRequest {
            msg,
            model: model.as_deref(),
            system_prompt: system_prompt.as_deref(),
            message_to: to.as_deref(),
        })
        .await?;

    #[cfg(feature = "metrics")]
    histogram!(
        auto_reply_metrics::PROCESSING_DURATION_SECONDS,
        labels::CHANNEL => msg.channel.clone()
    )
    .record(start.elapsed().as_secs_f64());

    Ok(ReplyDispatch { to, model, payload })
}

/// Send a dispatched reply through the channel. Returns `false` when the
/// reply had no destination and was dropped.
pub async fn deliver_reply(
    dispatch: &ReplyDispatch,
    account_id: &str,
    outbound: &dyn ChannelOutbound,
) -> anyhow::Result<bool> {
    let Some(to) = dispatch.to.as_deref() else {
        debug!(account_id, "suppressing reply without destination");
        #[cfg(feature = "metrics")]
        counter!(auto_reply_metrics::REPLIES_SUPPRESSED_TOTAL).increment(1);
        return Ok(false);
    };

    let payload = &dispatch.payload;
    let sent = if payload.media.is_some() {
        outbound.send_media(account_id, to, payload).await
    } else {
        outbound.send_text(account_id, to, &payload.text).await
    };

    if let Err(e) = sent {
        warn!(account_id, to, error = %e, "reply delivery failed");
        #[cfg(feature = "metrics")]
        counter!(
            auto_reply_metrics::DELIVERY_FAILURES_TOTAL,
            labels::ACCOUNT_ID => account_id.to_string()
        )
        .increment(1);
        return Err(e);
    }
    Ok(true)
}
