//! Transfer core of peerpay.
//!
//! The [`Engine`] authenticates callers, resolves accounts and posts matched
//! debit/credit pairs to the ledger in a single unit of work. It is built
//! once at startup and shared by every request; it holds no per-request
//! state.

use std::{future::Future, sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;

pub use accounts::{Account, AccountStatus};
pub use auth::{Authenticator, StoreAuthenticator, UserIdentity, bearer_token};
pub use commands::{DEFAULT_CATEGORY, TransferCmd, TransferReceipt, TransferRequest};
pub use currency::Currency;
pub use error::EngineError;
pub use ledger::{EntryKind, LedgerEntry};
pub use money::Money;
pub use ops::{DEFAULT_ENTRIES_LIMIT, MAX_ENTRIES_LIMIT};
pub use transfers::TransferRecord;

mod access_tokens;
mod accounts;
mod auth;
mod commands;
mod currency;
mod error;
mod ledger;
mod money;
mod ops;
mod transfers;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

/// Upper bounds for calls leaving the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Identity provider (token verification).
    pub identity: Duration,
    /// Store round-trips, including the work of an atomic write.
    pub store: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            identity: Duration::from_secs(5),
            store: Duration::from_secs(10),
        }
    }
}

/// Optional ledger rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Reject transfers that would take the sender's balance in the
    /// transfer currency below zero.
    pub enforce_balance: bool,
}

#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
    authenticator: Arc<dyn Authenticator>,
    timeouts: Timeouts,
    policy: LedgerPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }
}

/// Run `fut`, failing with [`EngineError::UpstreamTimeout`] once `limit`
/// elapses. The future is dropped on expiry.
async fn bounded<T, F>(upstream: &'static str, limit: Duration, fut: F) -> ResultEngine<T>
where
    F: Future<Output = ResultEngine<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(upstream, limit_ms = limit.as_millis() as u64, "upstream call timed out");
            Err(EngineError::UpstreamTimeout(format!(
                "{upstream} did not answer within {}ms",
                limit.as_millis()
            )))
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    authenticator: Option<Arc<dyn Authenticator>>,
    timeouts: Timeouts,
    policy: LedgerPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the default [`StoreAuthenticator`].
    pub fn authenticator(mut self, authenticator: impl Authenticator + 'static) -> EngineBuilder {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> EngineBuilder {
        self.timeouts = timeouts;
        self
    }

    pub fn policy(mut self, policy: LedgerPolicy) -> EngineBuilder {
        self.policy = policy;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let authenticator = match self.authenticator {
            Some(authenticator) => authenticator,
            None => Arc::new(StoreAuthenticator::new(self.database.clone())),
        };
        Ok(Engine {
            database: self.database,
            authenticator,
            timeouts: self.timeouts,
            policy: self.policy,
        })
    }
}
