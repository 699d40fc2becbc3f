//! Command structs for engine operations.
//!
//! [`TransferCmd`] carries a transfer exactly as the client sent it: nothing
//! in it is trusted. [`TransferCmd::validate`] turns it into a
//! [`TransferRequest`], the shape-checked form the orchestrator works with.

use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, ResultEngine,
    util::{normalize_email, normalize_optional_text},
};

/// Category used when the client does not send one.
pub const DEFAULT_CATEGORY: &str = "Transfer";

const MAX_CATEGORY_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Request to move money to the account of another user.
#[derive(Clone, Debug, Default)]
pub struct TransferCmd {
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    pub sender_account_id: Option<String>,
    pub recipient_email: Option<String>,
    /// Decimal amount in major units (`"50.00"`).
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        sender_account_id: impl Into<String>,
        recipient_email: impl Into<String>,
        amount: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            sender_account_id: Some(sender_account_id.into()),
            recipient_email: Some(recipient_email.into()),
            amount: Some(amount.into()),
            currency: Some(currency.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn authorization(mut self, header: impl Into<String>) -> Self {
        self.authorization = Some(header.into());
        self
    }

    /// Shorthand for `authorization(format!("Bearer {token}"))`.
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.authorization(format!("Bearer {token}"))
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Check the shape of the request without touching any collaborator.
    pub fn validate(&self) -> ResultEngine<TransferRequest> {
        let sender_account_id = normalize_optional_text(self.sender_account_id.as_deref());
        let recipient_email = normalize_optional_text(self.recipient_email.as_deref());
        let amount = normalize_optional_text(self.amount.as_deref());
        let currency = normalize_optional_text(self.currency.as_deref());

        let missing: Vec<&str> = [
            ("sender_account_id", sender_account_id.is_none()),
            ("recipient_email", recipient_email.is_none()),
            ("amount", amount.is_none()),
            ("currency", currency.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();
        let (Some(sender_account_id), Some(recipient_email), Some(amount), Some(currency)) =
            (sender_account_id, recipient_email, amount, currency)
        else {
            return Err(EngineError::InvalidRequest(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        };

        let sender_account_id = Uuid::parse_str(&sender_account_id).map_err(|_| {
            EngineError::InvalidRequest("sender_account_id must be a UUID".to_string())
        })?;
        let recipient_email = normalize_email(&recipient_email)?;
        let currency = Currency::try_from(currency.as_str())?;
        let amount = Money::parse(&amount, currency)?;
        if !amount.is_positive() {
            return Err(EngineError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }

        let category = normalize_optional_text(self.category.as_deref())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        if category.chars().count() > MAX_CATEGORY_LEN {
            return Err(EngineError::InvalidRequest(format!(
                "category must be at most {MAX_CATEGORY_LEN} characters"
            )));
        }

        let description = normalize_optional_text(self.description.as_deref());
        if description
            .as_deref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
        {
            return Err(EngineError::InvalidRequest(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }

        let idempotency_key = normalize_optional_text(self.idempotency_key.as_deref());
        if let Some(key) = idempotency_key.as_deref()
            && (key.len() > MAX_IDEMPOTENCY_KEY_LEN || !key.chars().all(|c| c.is_ascii_graphic()))
        {
            return Err(EngineError::InvalidRequest(format!(
                "idempotency_key must be 1-{MAX_IDEMPOTENCY_KEY_LEN} printable ASCII characters"
            )));
        }

        Ok(TransferRequest {
            sender_account_id,
            recipient_email,
            amount,
            category,
            description,
            idempotency_key,
        })
    }
}

/// A shape-checked transfer. Ownership of the sender account is *not*
/// implied: it is authorized against the caller's identity later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender_account_id: Uuid,
    pub recipient_email: String,
    pub amount: Money,
    pub category: String,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Outcome of a successful (or replayed) transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub transfer_id: Uuid,
    pub amount: Money,
    pub recipient_email: String,
    /// `true` when answered from an earlier execution with the same
    /// idempotency key.
    pub replayed: bool,
}

impl TransferReceipt {
    pub const MESSAGE: &'static str = "Transaction successful";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TransferCmd {
        TransferCmd::new(
            "11111111-1111-1111-1111-111111111111",
            "X@Y.com",
            "50.00",
            "usd",
        )
    }

    #[test]
    fn validate_normalizes_fields_and_defaults_category() {
        let request = valid().validate().unwrap();
        assert_eq!(request.recipient_email, "x@y.com");
        assert_eq!(request.amount, Money::new(5000, Currency::Usd));
        assert_eq!(request.category, DEFAULT_CATEGORY);
        assert_eq!(request.description, None);
        assert_eq!(request.idempotency_key, None);
    }

    #[test]
    fn validate_lists_every_missing_field() {
        let err = TransferCmd::default().validate().unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidRequest(
                "missing required fields: sender_account_id, recipient_email, amount, currency"
                    .to_string()
            )
        );

        let mut cmd = valid();
        cmd.amount = Some("  ".to_string());
        assert_eq!(
            cmd.validate().unwrap_err(),
            EngineError::InvalidRequest("missing required fields: amount".to_string())
        );
    }

    #[test]
    fn validate_rejects_non_positive_amounts() {
        for amount in ["0", "0.00", "-5"] {
            let mut cmd = valid();
            cmd.amount = Some(amount.to_string());
            assert_eq!(
                cmd.validate().unwrap_err(),
                EngineError::InvalidRequest("amount must be greater than zero".to_string()),
                "{amount}"
            );
        }
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let mut cmd = valid();
        cmd.sender_account_id = Some("not-a-uuid".to_string());
        assert!(matches!(cmd.validate(), Err(EngineError::InvalidRequest(_))));

        let mut cmd = valid();
        cmd.currency = Some("XXX".to_string());
        assert!(matches!(cmd.validate(), Err(EngineError::InvalidRequest(_))));

        let mut cmd = valid();
        cmd.recipient_email = Some("nobody".to_string());
        assert!(matches!(cmd.validate(), Err(EngineError::InvalidRequest(_))));

        let cmd = valid().idempotency_key("has space");
        assert!(matches!(cmd.validate(), Err(EngineError::InvalidRequest(_))));

        let cmd = valid().idempotency_key("k".repeat(129));
        assert!(matches!(cmd.validate(), Err(EngineError::InvalidRequest(_))));
    }

    #[test]
    fn validate_keeps_optional_metadata() {
        let request = valid()
            .category(" Rent ")
            .description("March")
            .idempotency_key("retry-1")
            .validate()
            .unwrap();
        assert_eq!(request.category, "Rent");
        assert_eq!(request.description.as_deref(), Some("March"));
        assert_eq!(request.idempotency_key.as_deref(), Some("retry-1"));
    }
}
