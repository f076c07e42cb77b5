//! Replay Dispatch Module
//!
//! Registration-based dispatch from endpoint identifiers to their typed
//! request shapes and fetch operations. Adding a report family is a
//! registration at startup, not a new conditional branch.

use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::reports::{ReportFetch, ReportRequest, TenantContext};

// == Parsed Request ==
/// A payload validated against an endpoint's request shape.
///
/// `canonical` is the typed request re-serialized after the replay flag has
/// been forced off; it is what gets fingerprinted, cached against, and
/// persisted to the last-request store.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub tenant: String,
    /// Whether the incoming payload asked for a replay of the last request
    pub replay_requested: bool,
    pub canonical: Value,
}

// == Erased Endpoint ==
/// Type-erased pairing of payload validation and fetch invocation for one
/// endpoint, so the registry can hold heterogeneous request shapes.
#[async_trait]
pub(crate) trait ErasedEndpoint: Send + Sync {
    /// Validates a raw payload against the endpoint's request shape and
    /// canonicalizes it with the replay flag cleared.
    fn parse(&self, payload: Value) -> Result<ParsedRequest>;

    /// Re-types a canonical payload and invokes the fetch operation.
    async fn fetch(&self, ctx: &TenantContext, canonical: &Value) -> Result<Value>;
}

struct TypedEndpoint<R, F> {
    fetch: F,
    _request: PhantomData<fn() -> R>,
}

#[async_trait]
impl<R, F> ErasedEndpoint for TypedEndpoint<R, F>
where
    R: ReportRequest,
    F: ReportFetch<R>,
{
    fn parse(&self, payload: Value) -> Result<ParsedRequest> {
        let mut request: R = serde_json::from_value(payload).map_err(|e| {
            GatewayError::InvalidRequest(format!(
                "payload does not match '{}' request shape: {}",
                R::ENDPOINT,
                e
            ))
        })?;

        let replay_requested = request.replay_requested();
        // Stored payloads must never re-trigger a replay when re-executed
        request.clear_replay_flag();

        let canonical = serde_json::to_value(&request)
            .map_err(|e| GatewayError::Encoding(e.to_string()))?;

        Ok(ParsedRequest {
            tenant: request.tenant().to_string(),
            replay_requested,
            canonical,
        })
    }

    async fn fetch(&self, ctx: &TenantContext, canonical: &Value) -> Result<Value> {
        let request: R = serde_json::from_value(canonical.clone())
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
        self.fetch.fetch(ctx, &request).await
    }
}

// == Endpoint Registry ==
/// Maps endpoint identifiers to their registered handlers.
#[derive(Default)]
pub struct EndpointRegistry {
    entries: HashMap<&'static str, Box<dyn ErasedEndpoint>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Registers the fetch operation for request shape `R` under
    /// `R::ENDPOINT`. Duplicate registrations are a wiring error and are
    /// rejected so they surface at startup.
    pub fn register<R, F>(&mut self, fetch: F) -> Result<()>
    where
        R: ReportRequest,
        F: ReportFetch<R> + 'static,
    {
        if self.entries.contains_key(R::ENDPOINT) {
            return Err(GatewayError::Internal(format!(
                "endpoint '{}' registered twice",
                R::ENDPOINT
            )));
        }
        self.entries.insert(
            R::ENDPOINT,
            Box::new(TypedEndpoint::<R, F> {
                fetch,
                _request: PhantomData,
            }),
        );
        Ok(())
    }

    pub(crate) fn entry(&self, endpoint: &str) -> Result<&dyn ErasedEndpoint> {
        self.entries
            .get(endpoint)
            .map(|b| b.as_ref())
            .ok_or_else(|| GatewayError::UnsupportedEndpoint(endpoint.to_string()))
    }

    /// Registered endpoint identifiers in stable order.
    pub fn endpoints(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // == Replay ==
    /// Re-executes a stored payload against `endpoint`: validates it against
    /// the endpoint's request shape, forces any nested replay flag off, and
    /// invokes the fetch operation under the given (current) caller context.
    pub async fn replay(
        &self,
        endpoint: &str,
        payload: Value,
        ctx: &TenantContext,
    ) -> Result<Value> {
        let entry = self.entry(endpoint)?;
        let parsed = entry.parse(payload)?;
        entry.fetch(ctx, &parsed.canonical).await
    }
}
