//! Reply routing and channel-scoped config resolution.
//!
//! Reply target precedence (first match wins):
//! 1. Session target, when it differs from the originating address
//! 2. Originating address
//! 3. Session target
//! 4. Command sender address
//! 5. Command recipient address, unless it is a pseudo-address (`slash:*`)
//!
//! Config field precedence (first non-empty wins):
//! topic → group → account → channel → global default.

pub mod address;
pub mod error;
pub mod reply_target;
pub mod scope;

pub use {
    address::{RoutingAddress, SubScope, is_pseudo_address},
    error::{Error, Result},
    moltis_config::ScopeOverrides,
    reply_target::{
        CommandReplySignals, ReplyRuleKind, resolve_command_reply_target,
        resolve_command_reply_target_with_rule,
    },
    scope::{
        ChatScope, ResolvedField, ScopeField, ScopeLevel, ScopeLookup, ScopeTiers, ScopeValue,
        first_non_empty, resolve_effective_field, resolve_field, resolve_with_lookup,
    },
};
