//! Metric names and label keys.

/// Reply routing and scoped config resolution
pub mod routing {
    /// Command replies routed, labelled by the precedence rule that won
    pub const REPLY_TARGET_RESOLVED_TOTAL: &str = "moltis_routing_reply_target_resolved_total";
    /// Command replies with no routable destination
    pub const REPLY_TARGET_UNROUTABLE_TOTAL: &str = "moltis_routing_reply_target_unroutable_total";
    /// Scoped config fields resolved, labelled by field and winning scope level
    pub const SCOPE_FIELD_RESOLVED_TOTAL: &str = "moltis_routing_scope_field_resolved_total";
}

/// Inbound message pipeline
pub mod auto_reply {
    /// Total messages received for processing
    pub const MESSAGES_RECEIVED_TOTAL: &str = "moltis_auto_reply_messages_received_total";
    /// Message processing duration in seconds
    pub const PROCESSING_DURATION_SECONDS: &str = "moltis_auto_reply_processing_duration_seconds";
    /// Replies dropped because no destination could be resolved
    pub const REPLIES_SUPPRESSED_TOTAL: &str = "moltis_auto_reply_replies_suppressed_total";
    /// Delivery failures by account
    pub const DELIVERY_FAILURES_TOTAL: &str = "moltis_auto_reply_delivery_failures_total";
}

/// Common label keys
pub mod labels {
    pub const CHANNEL: &str = "channel";
    pub const RULE: &str = "rule";
    pub const FIELD: &str = "field";
    pub const SCOPE_LEVEL: &str = "scope_level";
    pub const ACCOUNT_ID: &str = "account_id";
}

/// Standard histogram buckets
pub mod buckets {
    use once_cell::sync::Lazy;

    /// Message processing duration buckets (in seconds)
    /// Covers 10ms to 5 minutes, agent turns included
    pub static PROCESSING_DURATION: Lazy<Vec<f64>> = Lazy::new(|| {
        vec![
            0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
        ]
    });
}
