use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, router, run, run_with_listener};

mod accounts;
mod server;
mod transfer;

pub mod types {
    pub mod transfer {
        pub use api_types::transfer::{Amount, TransferCreated, TransferNew};
    }

    pub mod account {
        pub use api_types::account::{
            AccountStatus, AccountView, AccountsResponse, BalanceResponse, BalanceView,
            EntriesQuery, EntriesResponse, EntryKind, LedgerEntryView,
        };
    }

    pub use api_types::ErrorBody;
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Request rejected before it reached the engine (bad JSON, bad path).
    Generic(String),
    Internal(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::RecipientNotFound(_) | EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::InsufficientFunds(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::LedgerWriteFailed(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// Client-facing body. Store and upstream details are logged, never echoed.
fn body_for_engine_error(err: EngineError) -> ErrorBody {
    match err {
        EngineError::LedgerWriteFailed(detail) => {
            tracing::error!("ledger write failed: {detail}");
            ErrorBody {
                error: "Transaction failed".to_string(),
                details: Some("no funds were moved; the request can be retried".to_string()),
            }
        }
        EngineError::UpstreamTimeout(detail) => {
            tracing::error!("upstream timeout: {detail}");
            ErrorBody {
                error: "Upstream timeout".to_string(),
                details: Some("a dependency did not answer in time; retry later".to_string()),
            }
        }
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            ErrorBody {
                error: "Internal server error".to_string(),
                details: Some("unexpected store error".to_string()),
            }
        }
        other => ErrorBody {
            error: other.to_string(),
            details: None,
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Generic(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: err,
                    details: None,
                },
            ),
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Internal server error".to_string(),
                        details: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    fn status(err: EngineError) -> StatusCode {
        ServerError::from(err).into_response().status()
    }

    #[test]
    fn engine_errors_map_to_statuses() {
        let s = |v: &str| v.to_string();
        assert_eq!(status(EngineError::InvalidRequest(s("x"))), StatusCode::BAD_REQUEST);
        assert_eq!(status(EngineError::Unauthorized(s("x"))), StatusCode::UNAUTHORIZED);
        assert_eq!(status(EngineError::Forbidden(s("x"))), StatusCode::FORBIDDEN);
        assert_eq!(status(EngineError::RecipientNotFound(s("x"))), StatusCode::NOT_FOUND);
        assert_eq!(status(EngineError::KeyNotFound(s("x"))), StatusCode::NOT_FOUND);
        assert_eq!(status(EngineError::ExistingKey(s("x"))), StatusCode::CONFLICT);
        assert_eq!(
            status(EngineError::InsufficientFunds(s("x"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(EngineError::LedgerWriteFailed(s("x"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(EngineError::Database(DbErr::Custom(s("x")))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status(EngineError::UpstreamTimeout(s("x"))), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn store_details_are_not_echoed() {
        let body = body_for_engine_error(EngineError::Database(DbErr::Custom(
            "UNIQUE constraint failed: users.email".to_string(),
        )));
        assert!(!body.error.contains("UNIQUE"));
        assert!(!body.details.unwrap_or_default().contains("UNIQUE"));
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
