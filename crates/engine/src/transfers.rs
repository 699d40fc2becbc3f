//! Transfer records.
//!
//! One row per executed transfer, written in the same unit of work as its two
//! ledger entries. The row carries the caller-scoped idempotency key and is
//! what an idempotent replay answers from.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, EntryKind, LedgerEntry, Money, TransferRequest, UserIdentity,
    util::{parse_uuid, stored_currency},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRecord {
    pub id: Uuid,
    pub created_by: Uuid,
    pub idempotency_key: Option<String>,
    pub sender_account_id: Uuid,
    pub recipient_account_id: Uuid,
    pub recipient_email: String,
    pub amount: Money,
    pub category: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    pub(crate) fn new(
        caller: &UserIdentity,
        request: &TransferRequest,
        recipient_account_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_by: caller.user_id,
            idempotency_key: request.idempotency_key.clone(),
            sender_account_id: request.sender_account_id,
            recipient_account_id,
            recipient_email: request.recipient_email.clone(),
            amount: request.amount,
            category: request.category.clone(),
            description: request.description.clone(),
            created_at,
        }
    }

    /// Whether `request` describes the same transfer this record executed.
    pub(crate) fn matches(&self, request: &TransferRequest) -> bool {
        self.sender_account_id == request.sender_account_id
            && self.recipient_email == request.recipient_email
            && self.amount == request.amount
            && self.category == request.category
            && self.description == request.description
    }

    /// The matched debit/credit pair for this transfer.
    ///
    /// Without an explicit description the debit reads
    /// `Transfer to <recipient>` and the credit `Transfer from <sender>`.
    pub(crate) fn entries(&self, sender_email: &str) -> [LedgerEntry; 2] {
        let entry = |account_id, kind, description: String| LedgerEntry {
            id: Uuid::new_v4(),
            transfer_id: Some(self.id),
            account_id,
            kind,
            amount: self.amount,
            category: self.category.clone(),
            description: Some(self.description.clone().unwrap_or(description)),
            occurred_at: self.created_at,
        };
        [
            entry(
                self.sender_account_id,
                EntryKind::Debit,
                format!("Transfer to {}", self.recipient_email),
            ),
            entry(
                self.recipient_account_id,
                EntryKind::Credit,
                format!("Transfer from {sender_email}"),
            ),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_by: String,
    pub idempotency_key: Option<String>,
    pub sender_account_id: String,
    pub recipient_account_id: String,
    pub recipient_email: String,
    pub amount_minor: i64,
    pub currency: String,
    pub category: String,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&TransferRecord> for ActiveModel {
    fn from(record: &TransferRecord) -> Self {
        Self {
            id: ActiveValue::Set(record.id.to_string()),
            created_by: ActiveValue::Set(record.created_by.to_string()),
            idempotency_key: ActiveValue::Set(record.idempotency_key.clone()),
            sender_account_id: ActiveValue::Set(record.sender_account_id.to_string()),
            recipient_account_id: ActiveValue::Set(record.recipient_account_id.to_string()),
            recipient_email: ActiveValue::Set(record.recipient_email.clone()),
            amount_minor: ActiveValue::Set(record.amount.minor()),
            currency: ActiveValue::Set(record.amount.currency().code().to_string()),
            category: ActiveValue::Set(record.category.clone()),
            description: ActiveValue::Set(record.description.clone()),
            created_at: ActiveValue::Set(record.created_at),
        }
    }
}

impl TryFrom<Model> for TransferRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let currency = stored_currency(&model.currency)?;
        Ok(Self {
            id: parse_uuid(&model.id, "transfer")?,
            created_by: parse_uuid(&model.created_by, "user")?,
            idempotency_key: model.idempotency_key,
            sender_account_id: parse_uuid(&model.sender_account_id, "account")?,
            recipient_account_id: parse_uuid(&model.recipient_account_id, "account")?,
            recipient_email: model.recipient_email,
            amount: Money::new(model.amount_minor, currency),
            category: model.category,
            description: model.description,
            created_at: model.created_at,
        })
    }
}
