//! Registry queries over JSON-RPC.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use certbox_core::CertificateRecord;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ViewerConfig;

/// Registry query failures.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Registry ids are unsigned 64-bit integers.
    #[error("invalid certificate id {0:?}")]
    InvalidCertificateId(String),

    /// Transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("RPC endpoint answered with HTTP {0}")]
    Status(u16),

    /// The RPC node or the contract reported an error.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The response does not have the `call_function` shape.
    #[error("malformed RPC response: {0}")]
    Malformed(String),

    /// The contract result is not a certificate record.
    #[error("invalid certificate payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Source of sealed certificates by registry id.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// Fetches a certificate; `Ok(None)` when the registry has no such id.
    async fn fetch(&self, certificate_id: &str) -> Result<Option<CertificateRecord>, FetchError>;
}

/// JSON-RPC body calling `get_certificate` on the registry contract.
pub fn query_request(
    contract_account_id: &str,
    finality: &str,
    certificate_id: &str,
) -> Result<Value, FetchError> {
    if certificate_id.parse::<u64>().is_err() {
        return Err(FetchError::InvalidCertificateId(certificate_id.to_owned()));
    }
    // The contract takes ids as JSON strings (U64).
    let args = json!({ "certificate_id": certificate_id }).to_string();
    Ok(json!({
        "jsonrpc": "2.0",
        "id": "dontcare",
        "method": "query",
        "params": {
            "request_type": "call_function",
            "account_id": contract_account_id,
            "method_name": "get_certificate",
            "args_base64": STANDARD.encode(args),
            "finality": finality,
        }
    }))
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<CallFunctionResult>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct CallFunctionResult {
    #[serde(default)]
    result: Option<Vec<u8>>,
    #[serde(default)]
    error: Option<String>,
}

/// Extracts the certificate from a `call_function` response body.
///
/// The contract result is a byte array holding the JSON of an optional
/// record; `null` means the id is unknown.
pub fn parse_query_response(body: &[u8]) -> Result<Option<CertificateRecord>, FetchError> {
    let response: RpcResponse = serde_json::from_slice(body)
        .map_err(|err| FetchError::Malformed(err.to_string()))?;
    if let Some(error) = response.error {
        return Err(FetchError::Rpc(error.to_string()));
    }
    let call = response
        .result
        .ok_or_else(|| FetchError::Malformed("missing result".to_owned()))?;
    if let Some(error) = call.error {
        return Err(FetchError::Rpc(error));
    }
    let bytes = call
        .result
        .ok_or_else(|| FetchError::Malformed("missing result.result".to_owned()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// [`CertificateFetcher`] backed by a chain JSON-RPC endpoint.
#[derive(Clone, Debug)]
pub struct RpcFetcher {
    client: reqwest::Client,
    rpc_url: String,
    contract_account_id: String,
    finality: String,
}

impl RpcFetcher {
    /// Creates a fetcher from the viewer configuration.
    pub fn new(config: &ViewerConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            contract_account_id: config.contract_account_id.clone(),
            finality: config.finality.clone(),
        })
    }
}

#[async_trait]
impl CertificateFetcher for RpcFetcher {
    async fn fetch(&self, certificate_id: &str) -> Result<Option<CertificateRecord>, FetchError> {
        let body = query_request(&self.contract_account_id, &self.finality, certificate_id)?;
        tracing::debug!(
            rpc_url = %self.rpc_url,
            contract = %self.contract_account_id,
            certificate_id,
            "querying certificate registry"
        );
        let response = self
            .client
            .post(&self.rpc_url)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        parse_query_response(&bytes)
    }
}
