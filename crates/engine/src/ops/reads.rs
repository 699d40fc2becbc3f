use std::collections::BTreeMap;

use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{
    Account, EngineError, EntryKind, LedgerEntry, Money, ResultEngine, UserIdentity, accounts,
    bounded, ledger, util::stored_currency,
};

use super::Engine;

/// Entries returned by [`Engine::ledger_entries`] when no limit is given.
pub const DEFAULT_ENTRIES_LIMIT: u64 = 50;
/// Upper bound for [`Engine::ledger_entries`].
pub const MAX_ENTRIES_LIMIT: u64 = 200;

impl Engine {
    /// Accounts owned by `caller`, oldest first.
    pub async fn accounts(&self, caller: &UserIdentity) -> ResultEngine<Vec<Account>> {
        let models = bounded("ledger store", self.timeouts.store, async {
            Ok(accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(caller.user_id.to_string()))
                .order_by_asc(accounts::Column::CreatedAt)
                .order_by_asc(accounts::Column::Id)
                .all(&self.database)
                .await?)
        })
        .await?;
        models.into_iter().map(Account::try_from).collect()
    }

    /// Most recent ledger entries of one of the caller's accounts, newest
    /// first.
    ///
    /// `limit` is clamped to `1..=MAX_ENTRIES_LIMIT`.
    pub async fn ledger_entries(
        &self,
        caller: &UserIdentity,
        account_id: Uuid,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let limit = limit
            .unwrap_or(DEFAULT_ENTRIES_LIMIT)
            .clamp(1, MAX_ENTRIES_LIMIT);
        bounded("ledger store", self.timeouts.store, async {
            self.require_owned_account(&self.database, caller, account_id)
                .await?;
            let models = ledger::Entity::find()
                .filter(ledger::Column::AccountId.eq(account_id.to_string()))
                .order_by_desc(ledger::Column::OccurredAt)
                .order_by_desc(ledger::Column::Id)
                .limit(limit)
                .all(&self.database)
                .await?;
            models.into_iter().map(LedgerEntry::try_from).collect()
        })
        .await
    }

    /// Balance of one of the caller's accounts, one amount per currency it
    /// has entries in, ordered by currency code.
    pub async fn balances(
        &self,
        caller: &UserIdentity,
        account_id: Uuid,
    ) -> ResultEngine<Vec<Money>> {
        bounded("ledger store", self.timeouts.store, async {
            self.require_owned_account(&self.database, caller, account_id)
                .await?;
            let rows: Vec<(String, String, i64)> = ledger::Entity::find()
                .select_only()
                .column(ledger::Column::Currency)
                .column(ledger::Column::Kind)
                .column(ledger::Column::AmountMinor)
                .filter(ledger::Column::AccountId.eq(account_id.to_string()))
                .into_tuple()
                .all(&self.database)
                .await?;

            let mut totals: BTreeMap<&'static str, Money> = BTreeMap::new();
            for (code, kind, amount) in rows {
                let currency = stored_currency(&code)?;
                let change = Money::new(amount, currency);
                let total = totals
                    .entry(currency.code())
                    .or_insert_with(|| Money::zero(currency));
                let next = match EntryKind::try_from(kind.as_str())? {
                    EntryKind::Credit => total.checked_add(change),
                    EntryKind::Debit => total.checked_sub(change),
                };
                *total = next.ok_or_else(|| {
                    EngineError::Database(DbErr::Custom(format!(
                        "balance overflow on account {account_id}"
                    )))
                })?;
            }
            Ok(totals.into_values().collect())
        })
        .await
    }
}
