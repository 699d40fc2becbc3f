//! Read-only account endpoints.

use api_types::account::{
    AccountStatus, AccountView, AccountsResponse, BalanceResponse, BalanceView, EntriesQuery,
    EntriesResponse, EntryKind, LedgerEntryView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::PathRejection, rejection::QueryRejection},
};
use engine::UserIdentity;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_status(status: engine::AccountStatus) -> AccountStatus {
    match status {
        engine::AccountStatus::Open => AccountStatus::Open,
        engine::AccountStatus::Restricted => AccountStatus::Restricted,
        engine::AccountStatus::Closed => AccountStatus::Closed,
    }
}

fn map_kind(kind: engine::EntryKind) -> EntryKind {
    match kind {
        engine::EntryKind::Credit => EntryKind::Credit,
        engine::EntryKind::Debit => EntryKind::Debit,
    }
}

fn account_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ServerError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ServerError::Generic(format!("Invalid request: {}", rejection.body_text())))
}

pub async fn list(
    Extension(caller): Extension<UserIdentity>,
    State(state): State<ServerState>,
) -> Result<Json<AccountsResponse>, ServerError> {
    let accounts = state.engine.accounts(&caller).await?;
    Ok(Json(AccountsResponse {
        accounts: accounts
            .into_iter()
            .map(|account| AccountView {
                id: account.id,
                created_at: account.created_at,
                status: map_status(account.status),
            })
            .collect(),
    }))
}

pub async fn entries(
    Extension(caller): Extension<UserIdentity>,
    State(state): State<ServerState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<EntriesQuery>, QueryRejection>,
) -> Result<Json<EntriesResponse>, ServerError> {
    let account_id = account_id(path)?;
    let Query(query) = query.map_err(|rejection| {
        ServerError::Generic(format!("Invalid request: {}", rejection.body_text()))
    })?;

    let entries = state
        .engine
        .ledger_entries(&caller, account_id, query.limit)
        .await?;
    Ok(Json(EntriesResponse {
        account_id,
        entries: entries
            .into_iter()
            .map(|entry| LedgerEntryView {
                id: entry.id,
                transfer_id: entry.transfer_id,
                kind: map_kind(entry.kind),
                amount: entry.amount.decimal_string(),
                currency: entry.amount.currency().code().to_string(),
                category: entry.category,
                description: entry.description,
                occurred_at: entry.occurred_at,
            })
            .collect(),
    }))
}

pub async fn balance(
    Extension(caller): Extension<UserIdentity>,
    State(state): State<ServerState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let account_id = account_id(path)?;
    let balances = state.engine.balances(&caller, account_id).await?;
    Ok(Json(BalanceResponse {
        account_id,
        balances: balances
            .into_iter()
            .map(|money| BalanceView {
                amount: money.decimal_string(),
                currency: money.currency().code().to_string(),
            })
            .collect(),
    }))
}
