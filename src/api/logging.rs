use crate::error::ChatError;
use crate::util::parse_bool_str;
use serde_json::Value;

const DEBUG_PAYLOAD_ENV: &str = "THINKCHAT_DEBUG_PAYLOAD";

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .and_then(|v| parse_bool_str(&v))
        .unwrap_or(false)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    tracing::debug!(url = request_url, payload = %formatted_payload, "chat request payload");
}

pub fn emit_malformed_event(error: &ChatError) {
    if let ChatError::MalformedEvent { line, reason } = error {
        tracing::warn!(%reason, %line, "skipping malformed stream line");
    }
}

pub fn emit_transport_failure(request_url: &str, error: &ChatError) {
    tracing::error!(url = request_url, %error, "chat stream transport failed");
}
