//! API usage audit records.

use serde_json::Value;
use tracing::warn;

use crate::db::{
    handlers::{Store, UsageStore},
    models::usage::ApiUsageCreateDBRequest,
};

/// Estimated cost in USD: `tokens / 1000 * unit_price`
pub fn estimate_cost(tokens_used: i32, cost_per_1k_tokens: f64) -> f64 {
    if tokens_used <= 0 {
        return 0.0;
    }
    f64::from(tokens_used) / 1000.0 * cost_per_1k_tokens
}

/// One external call, ready to be recorded
#[derive(Debug, Clone)]
pub struct UsageEntry {
    pub service: &'static str,
    pub endpoint: &'static str,
    pub request_data: Value,
    pub response_data: Value,
    pub tokens_used: i32,
    pub cost_usd: f64,
    pub response_time_ms: i64,
    pub error: Option<String>,
}

impl From<UsageEntry> for ApiUsageCreateDBRequest {
    fn from(entry: UsageEntry) -> Self {
        Self {
            service: entry.service.to_string(),
            endpoint: entry.endpoint.to_string(),
            request_data: entry.request_data,
            response_data: entry.response_data,
            tokens_used: entry.tokens_used,
            cost_usd: entry.cost_usd,
            response_time_ms: entry.response_time_ms,
            success: entry.error.is_none(),
            error_message: entry.error.unwrap_or_default(),
        }
    }
}

/// Record an external call. Failures to record are logged and otherwise ignored.
pub async fn record_usage(store: &dyn Store, entry: UsageEntry) {
    let service = entry.service;
    let endpoint = entry.endpoint;
    if let Err(e) = store.log_api_usage(&entry.into()).await {
        warn!(service, endpoint, error = %e, "Failed to log API usage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::InMemoryStore;
    use serde_json::json;

    #[test]
    fn test_estimate_cost() {
        assert_eq!(estimate_cost(0, 0.000125), 0.0);
        assert_eq!(estimate_cost(-5, 0.000125), 0.0);
        assert!((estimate_cost(2000, 0.000125) - 0.00025).abs() < 1e-12);
        assert!((estimate_cost(1500, 0.002) - 0.003).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_record_usage_success_flag() {
        let store = InMemoryStore::new();
        record_usage(
            &store,
            UsageEntry {
                service: "gemini",
                endpoint: "etymology_analysis",
                request_data: json!({"word": "filosofia"}),
                response_data: json!({}),
                tokens_used: 0,
                cost_usd: 0.0,
                response_time_ms: 12,
                error: Some("timeout".to_string()),
            },
        )
        .await;

        let rows = store.api_usage();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].success);
        assert_eq!(rows[0].error_message, "timeout");
        assert_eq!(rows[0].service, "gemini");
    }
}
