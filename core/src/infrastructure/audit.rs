use serde::Serialize;
use tracing::{info, info_span};

/// Domain event for audit logging.
/// Structured for JSON serialization to enable machine-readable audit trails.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// An application's database file was deleted.
    StoreCleared {
        /// The application whose store was removed.
        app_id: String,
    },
    /// A public caller asked for a property outside the whitelist.
    PropertyWithheld {
        /// The requested key.
        key: String,
        /// The service method that was called.
        method: String,
    },
    /// A service method was refused on the channel it arrived on.
    AccessDenied {
        /// The service method that was called.
        method: String,
        /// Name of the channel.
        channel: String,
    },
}

/// Logs an audit event to the dedicated audit channel as structured JSON.
/// This uses a specific `target` which can be filtered by the subscriber to redirect to a secure file.
pub fn log_audit(event: &AuditEvent) {
    let span = info_span!(target: "audit", "audit_event");
    let _enter = span.enter();

    let json = serde_json::to_string(event).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
    info!(target: "audit", audit_json = %json, "Audit event");
}
