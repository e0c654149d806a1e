//! Session key parsing and construction.
//!
//! Session keys bind an owning agent to the chat scope a conversation lives
//! in: `agent:<agentId>:<channel>:<scope>:<chatId>[:<subscope>:<subId>...]`.
//! Routing only needs the structural split; persistence lives elsewhere.

pub mod key;

pub use key::{DEFAULT_AGENT_ID, ParsedSessionKey, SessionKey, parse_agent_session_key};
