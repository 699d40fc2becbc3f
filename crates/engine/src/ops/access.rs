use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::{
    Account, AccountStatus, EngineError, ResultEngine, UserIdentity, accounts, bearer_token,
    bounded,
};

use super::Engine;

impl Engine {
    /// Authenticate the raw `Authorization` header of a request.
    pub async fn authenticate(&self, authorization: Option<&str>) -> ResultEngine<UserIdentity> {
        let token = bearer_token(authorization)?;
        self.authenticate_token(token).await
    }

    /// Verify a bare bearer token with the configured [`Authenticator`].
    ///
    /// [`Authenticator`]: crate::Authenticator
    pub async fn authenticate_token(&self, token: &str) -> ResultEngine<UserIdentity> {
        let identity = bounded(
            "identity provider",
            self.timeouts.identity,
            self.authenticator.verify(token),
        )
        .await?;
        tracing::debug!(user_id = %identity.user_id, "caller authenticated");
        Ok(identity)
    }

    /// Load an account owned by `caller`.
    ///
    /// Fails with `Forbidden` whether the account is foreign or missing, so
    /// callers cannot probe for account ids.
    pub(super) async fn require_owned_account<C: ConnectionTrait>(
        &self,
        db: &C,
        caller: &UserIdentity,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        let forbidden =
            || EngineError::Forbidden("account does not belong to the caller".to_string());
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .ok_or_else(forbidden)?;
        let account = Account::try_from(model)?;
        if account.user_id != caller.user_id {
            return Err(forbidden());
        }
        Ok(account)
    }

    /// Re-check, inside the unit of work, that the sender may still be debited.
    pub(super) async fn require_sender_can_send<C: ConnectionTrait>(
        &self,
        db: &C,
        caller: &UserIdentity,
        account_id: Uuid,
    ) -> ResultEngine<()> {
        let account = self.require_owned_account(db, caller, account_id).await?;
        if !account.status.can_send() {
            return Err(EngineError::Forbidden(format!(
                "sender account is {}",
                account.status.as_str()
            )));
        }
        Ok(())
    }

    /// Re-check, inside the unit of work, that the recipient still accepts
    /// funds.
    pub(super) async fn require_recipient_can_receive<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: Uuid,
    ) -> ResultEngine<()> {
        let status = accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .map(|model| AccountStatus::try_from(model.status.as_str()))
            .transpose()?;
        match status {
            Some(status) if status.can_receive() => Ok(()),
            Some(_) => Err(EngineError::RecipientNotFound(
                "recipient account is closed".to_string(),
            )),
            None => Err(EngineError::RecipientNotFound(
                "recipient account not exists".to_string(),
            )),
        }
    }
}
