use std::{future::Future, pin::Pin};

use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::{Engine, ResultEngine, bounded};

/// A unit of work run by [`Engine::run_atomic`].
pub(crate) type UnitOfWork<'c, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 'c>>;

impl Engine {
    /// Run `work` inside one database transaction.
    ///
    /// Commits only if `work` succeeds; any error rolls every write back.
    /// The store timeout bounds `begin` and `work`. Commit is left to finish
    /// so a timed-out call never lands after the caller was told it failed.
    pub(crate) async fn run_atomic<T, F>(&self, work: F) -> ResultEngine<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c Engine, &'c DatabaseTransaction) -> UnitOfWork<'c, T> + Send,
    {
        let limit = self.timeouts.store;
        let db_tx =
            bounded("ledger store", limit, async { Ok(self.database.begin().await?) }).await?;
        match bounded("ledger store", limit, work(self, &db_tx)).await {
            Ok(value) => {
                db_tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = db_tx.rollback().await {
                    tracing::error!("rollback failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }
}
