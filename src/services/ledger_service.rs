//! Server-to-server access to the qbet88 ledger, guarded by a shared key.

use crate::error::{AppError, AppResult};
use crate::external::LedgerApi;
use crate::models::{LedgerBalanceRequest, LedgerGatewayRequest};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct LedgerService {
    ledger: Arc<dyn LedgerApi>,
    internal_api_key: String,
}

impl LedgerService {
    pub fn new(ledger: Arc<dyn LedgerApi>, internal_api_key: String) -> Self {
        Self {
            ledger,
            internal_api_key,
        }
    }

    /// An empty configured key disables the routes entirely.
    pub fn authorize(&self, provided: Option<&str>) -> AppResult<()> {
        if self.internal_api_key.is_empty() {
            return Err(AppError::Unauthorized(
                "Ledger access is not configured".to_string(),
            ));
        }
        match provided {
            Some(key) if key == self.internal_api_key => Ok(()),
            _ => Err(AppError::Unauthorized("Invalid API key".to_string())),
        }
    }

    pub async fn balance(&self, request: &LedgerBalanceRequest) -> AppResult<Value> {
        let member = request.member.trim();
        if member.is_empty() {
            return Err(AppError::ValidationError("member is required".to_string()));
        }
        self.ledger.balance(member).await
    }

    /// Forwards a signed call for an arbitrary operation.
    pub async fn call(&self, request: LedgerGatewayRequest) -> AppResult<Value> {
        let operation = request.operation.trim();
        let valid = !operation.is_empty()
            && operation
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::ValidationError(
                "operation must be a plain identifier".to_string(),
            ));
        }
        log::info!("Forwarding ledger operation {operation}");
        self.ledger.call(operation, request.payload).await
    }
}
