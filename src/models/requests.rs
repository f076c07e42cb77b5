//! Request DTOs for the gateway API
//!
//! Defines the structure of incoming HTTP request bodies and queries.
//! Report payloads themselves are deserialized by the endpoint registry
//! against their typed shapes, not here.

use serde::Deserialize;

/// Request body for the replay operation (POST /reports/:endpoint/replay)
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRequest {
    /// Tenant whose last request should be re-executed
    pub tenant: String,
}

/// Optional namespace scope for cache maintenance endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamespaceQuery {
    #[serde(default)]
    pub namespace: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_request_deserialize() {
        let req: ReplayRequest = serde_json::from_str(r#"{"tenant":"t1"}"#).unwrap();
        assert_eq!(req.tenant, "t1");
    }

    #[test]
    fn test_namespace_query_defaults_to_all() {
        let q: NamespaceQuery = serde_json::from_str("{}").unwrap();
        assert!(q.namespace.is_none());
    }
}
