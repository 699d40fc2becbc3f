//! Out-of-band provisioning.
//!
//! Identities, accounts and tokens are created outside the transfer path.
//! These operations back the admin binary and the test suites.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Account, AccountStatus, EngineError, ResultEngine, access_tokens, accounts, users,
    util::{normalize_email, parse_uuid},
};

use super::Engine;

impl Engine {
    /// Register a new active user. Emails are unique after normalization.
    pub async fn register_user(&self, email: &str) -> ResultEngine<Uuid> {
        let email = normalize_email(email)?;
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(email));
        }

        let user_id = Uuid::new_v4();
        users::ActiveModel {
            id: ActiveValue::Set(user_id.to_string()),
            email: ActiveValue::Set(email),
            active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(%user_id, "user registered");
        Ok(user_id)
    }

    /// Id of the user registered with `email`, active or not.
    pub async fn user_id_for_email(&self, email: &str) -> ResultEngine<Uuid> {
        let email = normalize_email(email)?;
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.database)
            .await?
            .ok_or(EngineError::KeyNotFound(email))?;
        parse_uuid(&user.id, "user")
    }

    /// Deactivated users can neither authenticate nor receive transfers.
    pub async fn set_user_active(&self, user_id: Uuid, active: bool) -> ResultEngine<()> {
        let user = users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
        let mut user: users::ActiveModel = user.into();
        user.active = ActiveValue::Set(active);
        user.update(&self.database).await?;
        tracing::info!(%user_id, active, "user activity changed");
        Ok(())
    }

    /// Open an account for `user_id`. `opened_at` defaults to now; it decides
    /// which account receives transfers addressed to the user's email.
    pub async fn open_account(
        &self,
        user_id: Uuid,
        opened_at: Option<DateTime<Utc>>,
    ) -> ResultEngine<Uuid> {
        users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;

        let account = Account {
            id: Uuid::new_v4(),
            user_id,
            created_at: opened_at.unwrap_or_else(Utc::now),
            status: AccountStatus::Open,
        };
        accounts::ActiveModel::from(&account)
            .insert(&self.database)
            .await?;
        tracing::info!(account_id = %account.id, %user_id, "account opened");
        Ok(account.id)
    }

    pub async fn set_account_status(
        &self,
        account_id: Uuid,
        status: AccountStatus,
    ) -> ResultEngine<()> {
        let account = accounts::Entity::find_by_id(account_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        let mut account: accounts::ActiveModel = account.into();
        account.status = ActiveValue::Set(status.as_str().to_string());
        account.update(&self.database).await?;
        tracing::info!(%account_id, status = status.as_str(), "account status changed");
        Ok(())
    }

    /// Issue a bearer token for `user_id`, valid for `ttl` (forever if
    /// `None`).
    pub async fn issue_token(&self, user_id: Uuid, ttl: Option<Duration>) -> ResultEngine<String> {
        users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;

        let issued_at = Utc::now();
        let token = Uuid::new_v4().simple().to_string();
        access_tokens::ActiveModel {
            token: ActiveValue::Set(token.clone()),
            user_id: ActiveValue::Set(user_id.to_string()),
            issued_at: ActiveValue::Set(issued_at),
            expires_at: ActiveValue::Set(ttl.map(|ttl| issued_at + ttl)),
            revoked: ActiveValue::Set(false),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(%user_id, "token issued");
        Ok(token)
    }

    pub async fn revoke_token(&self, token: &str) -> ResultEngine<()> {
        let grant = access_tokens::Entity::find_by_id(token.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("token not exists".to_string()))?;
        let mut grant: access_tokens::ActiveModel = grant.into();
        grant.revoked = ActiveValue::Set(true);
        grant.update(&self.database).await?;
        tracing::info!("token revoked");
        Ok(())
    }
}
