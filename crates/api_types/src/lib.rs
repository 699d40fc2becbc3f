//! JSON shapes exchanged with HTTP clients.
//!
//! These types carry no behavior beyond (de)serialization; validation
//! happens in the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of every non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub mod transfer {
    use super::*;

    /// A decimal amount sent either as a JSON number or a JSON string.
    ///
    /// Numbers are kept in their shortest decimal form so `50.1` stays
    /// `"50.1"`; strings are the safer choice for clients.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Amount {
        Number(serde_json::Number),
        Text(String),
    }

    impl Amount {
        pub fn to_decimal_string(&self) -> String {
            match self {
                Self::Number(number) => number.to_string(),
                Self::Text(text) => text.clone(),
            }
        }
    }

    /// `POST /transfer` body.
    ///
    /// Every field is optional at this layer so a missing field surfaces as a
    /// validation error naming it, not as a generic JSON error.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct TransferNew {
        pub sender_account_id: Option<String>,
        #[serde(alias = "recepient_email")]
        pub recipient_email: Option<String>,
        pub amount: Option<Amount>,
        pub currency: Option<String>,
        pub category: Option<String>,
        pub description: Option<String>,
        pub idempotency_key: Option<String>,
    }

    /// `POST /transfer` success body.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransferCreated {
        pub message: String,
        /// Decimal with exactly the currency's precision (`"50.00"`).
        pub amount: String,
        pub currency: String,
        pub recipient_email: String,
        pub transfer_id: Uuid,
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountStatus {
        Open,
        Restricted,
        Closed,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryKind {
        Credit,
        Debit,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub created_at: DateTime<Utc>,
        pub status: AccountStatus,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AccountsResponse {
        pub accounts: Vec<AccountView>,
    }

    /// Query string of `GET /accounts/{id}/entries`.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct EntriesQuery {
        pub limit: Option<u64>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LedgerEntryView {
        pub id: Uuid,
        pub transfer_id: Option<Uuid>,
        #[serde(rename = "type")]
        pub kind: EntryKind,
        pub amount: String,
        pub currency: String,
        pub category: String,
        pub description: Option<String>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EntriesResponse {
        pub account_id: Uuid,
        pub entries: Vec<LedgerEntryView>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BalanceView {
        pub amount: String,
        pub currency: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub account_id: Uuid,
        pub balances: Vec<BalanceView>,
    }
}

#[cfg(test)]
mod tests {
    use super::transfer::*;

    #[test]
    fn transfer_new_accepts_misspelled_recipient_and_numeric_amount() {
        let body: TransferNew = serde_json::from_str(
            r#"{"sender_account_id":"a","recepient_email":"x@y.com","amount":50.5,"currency":"USD"}"#,
        )
        .unwrap();
        assert_eq!(body.recipient_email.as_deref(), Some("x@y.com"));
        assert_eq!(body.amount.unwrap().to_decimal_string(), "50.5");
        assert_eq!(body.category, None);
    }

    #[test]
    fn transfer_new_accepts_string_amount() {
        let body: TransferNew =
            serde_json::from_str(r#"{"amount":"50.00","recipient_email":"x@y.com"}"#).unwrap();
        assert_eq!(body.amount, Some(Amount::Text("50.00".to_string())));
    }
}
