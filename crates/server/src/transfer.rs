//! `POST /transfer`

use api_types::transfer::{TransferCreated, TransferNew};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::AUTHORIZATION},
};
use engine::{TransferCmd, TransferReceipt};

use crate::{ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    payload: Result<Json<TransferNew>, JsonRejection>,
) -> Result<Json<TransferCreated>, ServerError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::warn!("transfer rejected: {}", rejection.body_text());
        ServerError::Generic(format!("Invalid request: {}", rejection.body_text()))
    })?;

    // A header that is not valid UTF-8 is reported as malformed by the engine.
    let authorization = headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_string());

    let cmd = TransferCmd {
        authorization,
        sender_account_id: payload.sender_account_id,
        recipient_email: payload.recipient_email,
        amount: payload.amount.map(|amount| amount.to_decimal_string()),
        currency: payload.currency,
        category: payload.category,
        description: payload.description,
        idempotency_key: payload.idempotency_key,
    };

    // Run detached: a client hanging up must not drop the unit of work
    // between its writes.
    let engine = state.engine.clone();
    let receipt = tokio::spawn(async move { engine.transfer(cmd).await })
        .await
        .map_err(|err| ServerError::Internal(format!("transfer task failed: {err}")))??;

    Ok(Json(TransferCreated {
        message: TransferReceipt::MESSAGE.to_string(),
        amount: receipt.amount.decimal_string(),
        currency: receipt.amount.currency().code().to_string(),
        recipient_email: receipt.recipient_email,
        transfer_id: receipt.transfer_id,
    }))
}
