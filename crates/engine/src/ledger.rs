//! Ledger entries.
//!
//! A `LedgerEntry` records one single-account, single-direction money
//! movement. Amounts are stored unsigned; the direction lives in `kind`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money,
    util::{parse_uuid, stored_currency, stored_value_fault},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Credit,
    Debit,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(stored_value_fault("entry kind", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub transfer_id: Option<Uuid>,
    pub account_id: Uuid,
    pub kind: EntryKind,
    pub amount: Money,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transfer_id: Option<String>,
    pub account_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub currency: String,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transfer_id: ActiveValue::Set(entry.transfer_id.map(|id| id.to_string())),
            account_id: ActiveValue::Set(entry.account_id.to_string()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(entry.amount.minor()),
            currency: ActiveValue::Set(entry.amount.currency().code().to_string()),
            category: ActiveValue::Set(entry.category.clone()),
            description: ActiveValue::Set(entry.description.clone()),
            occurred_at: ActiveValue::Set(entry.occurred_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let currency = stored_currency(&model.currency)?;
        Ok(Self {
            id: parse_uuid(&model.id, "ledger entry")?,
            transfer_id: model
                .transfer_id
                .as_deref()
                .map(|id| parse_uuid(id, "transfer"))
                .transpose()?,
            account_id: parse_uuid(&model.account_id, "account")?,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor, currency),
            category: model.category,
            description: model.description,
            occurred_at: model.occurred_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_stored_kind_is_a_storage_fault() {
        assert_eq!(EntryKind::try_from("debit").unwrap(), EntryKind::Debit);
        assert!(matches!(
            EntryKind::try_from("refund"),
            Err(EngineError::Database(DbErr::Type(_)))
        ));
    }
}
