use chrono::Utc;
use sea_orm::{
    ConnectionTrait, DatabaseTransaction, DbErr, QueryFilter, QuerySelect, SqlErr, prelude::*,
};
use uuid::Uuid;

use crate::{
    Currency, EngineError, EntryKind, ResultEngine, TransferCmd, TransferReceipt, TransferRecord,
    TransferRequest, UserIdentity, bounded, ledger, transfers,
};

use super::Engine;

impl Engine {
    /// Move money from one of the caller's accounts to the oldest account of
    /// the user owning `recipient_email`.
    ///
    /// Steps run in order and stop at the first failure:
    ///
    /// 1. shape validation ([`EngineError::InvalidRequest`])
    /// 2. authentication ([`EngineError::Unauthorized`])
    /// 3. sender ownership ([`EngineError::Forbidden`]), then the replay check
    ///    for a caller-scoped idempotency key
    /// 4. recipient resolution ([`EngineError::RecipientNotFound`])
    /// 5. one unit of work writing the transfer record, the debit and the
    ///    credit ([`EngineError::LedgerWriteFailed`] leaves no rows behind)
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferReceipt> {
        let request = cmd.validate().inspect_err(|err| {
            tracing::warn!("transfer rejected: {err}");
        })?;
        let caller = self.authenticate(cmd.authorization.as_deref()).await?;

        let owned = self.accounts_owned_by(&caller).await?;
        if !owned.contains(&request.sender_account_id) {
            tracing::warn!(
                user_id = %caller.user_id,
                sender_account_id = %request.sender_account_id,
                "transfer rejected: sender account not owned by caller"
            );
            return Err(EngineError::Forbidden(
                "sender account does not belong to the caller".to_string(),
            ));
        }

        if let Some(receipt) = self.replay(&caller, &request).await? {
            return Ok(receipt);
        }

        let recipient_account_id = self
            .first_account_for_email(&request.recipient_email)
            .await?;
        if recipient_account_id == request.sender_account_id {
            return Err(EngineError::InvalidRequest(
                "cannot transfer to the sender account".to_string(),
            ));
        }

        let record = TransferRecord::new(&caller, &request, recipient_account_id, Utc::now());
        let written = {
            let caller = caller.clone();
            let record = record.clone();
            self.run_atomic(move |engine, db_tx| {
                Box::pin(async move { engine.write_transfer(db_tx, &caller, &record).await })
            })
            .await
        };

        match written {
            Ok(()) => {
                tracing::info!(
                    transfer_id = %record.id,
                    sender_account_id = %record.sender_account_id,
                    recipient_account_id = %record.recipient_account_id,
                    amount = %record.amount,
                    "transfer committed"
                );
                Ok(receipt(&record, false))
            }
            Err(EngineError::Database(err)) => {
                if is_unique_violation(&err)
                    && let Some(receipt) = self.replay(&caller, &request).await?
                {
                    return Ok(receipt);
                }
                tracing::error!(transfer_id = %record.id, "ledger write failed: {err}");
                Err(EngineError::LedgerWriteFailed(
                    "the transfer was rolled back".to_string(),
                ))
            }
            Err(err) => Err(err),
        }
    }

    /// Answer a retried request from the transfer it already produced.
    ///
    /// Returns `None` when the request carries no key or the key is unused.
    async fn replay(
        &self,
        caller: &UserIdentity,
        request: &TransferRequest,
    ) -> ResultEngine<Option<TransferReceipt>> {
        let Some(key) = request.idempotency_key.as_deref() else {
            return Ok(None);
        };
        let model = bounded("ledger store", self.timeouts.store, async {
            Ok(transfers::Entity::find()
                .filter(transfers::Column::CreatedBy.eq(caller.user_id.to_string()))
                .filter(transfers::Column::IdempotencyKey.eq(key))
                .one(&self.database)
                .await?)
        })
        .await?;
        let Some(model) = model else {
            return Ok(None);
        };

        let record = TransferRecord::try_from(model)?;
        if !record.matches(request) {
            tracing::warn!(
                transfer_id = %record.id,
                "idempotency key reused with a different payload"
            );
            return Err(EngineError::InvalidRequest(
                "idempotency_key already used for a different transfer".to_string(),
            ));
        }
        tracing::info!(transfer_id = %record.id, "transfer replayed");
        Ok(Some(receipt(&record, true)))
    }

    async fn write_transfer(
        &self,
        db_tx: &DatabaseTransaction,
        caller: &UserIdentity,
        record: &TransferRecord,
    ) -> ResultEngine<()> {
        self.require_sender_can_send(db_tx, caller, record.sender_account_id)
            .await?;
        self.require_recipient_can_receive(db_tx, record.recipient_account_id)
            .await?;

        if self.policy.enforce_balance {
            let available =
                balance_in(db_tx, record.sender_account_id, record.amount.currency()).await?;
            if available < record.amount.minor() {
                return Err(EngineError::InsufficientFunds(format!(
                    "sender balance does not cover {}",
                    record.amount
                )));
            }
        }

        transfers::ActiveModel::from(record).insert(db_tx).await?;
        for entry in &record.entries(&caller.email) {
            ledger::ActiveModel::from(entry).insert(db_tx).await?;
        }
        Ok(())
    }
}

fn receipt(record: &TransferRecord, replayed: bool) -> TransferReceipt {
    TransferReceipt {
        transfer_id: record.id,
        amount: record.amount,
        recipient_email: record.recipient_email.clone(),
        replayed,
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Credits minus debits of `account_id` in `currency`, in minor units.
async fn balance_in<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    currency: Currency,
) -> ResultEngine<i64> {
    let rows: Vec<(String, i64)> = ledger::Entity::find()
        .select_only()
        .column(ledger::Column::Kind)
        .column(ledger::Column::AmountMinor)
        .filter(ledger::Column::AccountId.eq(account_id.to_string()))
        .filter(ledger::Column::Currency.eq(currency.code()))
        .into_tuple()
        .all(db)
        .await?;

    let mut balance: i64 = 0;
    for (kind, amount) in rows {
        let signed = match EntryKind::try_from(kind.as_str())? {
            EntryKind::Credit => amount,
            EntryKind::Debit => -amount,
        };
        balance = balance
            .checked_add(signed)
            .ok_or_else(|| EngineError::Database(DbErr::Custom("balance overflow".to_string())))?;
    }
    Ok(balance)
}
