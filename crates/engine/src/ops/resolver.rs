//! Account resolution: who owns which account, and which account receives
//! money sent to an email.

use std::collections::HashSet;

use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, UserIdentity, accounts, bounded, users,
    util::{normalize_email, parse_uuid},
};

use super::Engine;

/// Ids of every account owned by `user_id`.
pub(super) async fn owned_account_ids<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> ResultEngine<HashSet<Uuid>> {
    let ids: Vec<String> = accounts::Entity::find()
        .select_only()
        .column(accounts::Column::Id)
        .filter(accounts::Column::UserId.eq(user_id.to_string()))
        .into_tuple()
        .all(db)
        .await?;
    ids.iter().map(|id| parse_uuid(id, "account")).collect()
}

/// Bridge from an email to an identity.
///
/// Reads only the id of an *active* user with exactly that (normalized)
/// email; nothing else of the identity tables is exposed.
pub(super) async fn user_id_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> ResultEngine<Option<Uuid>> {
    let id: Option<String> = users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .filter(users::Column::Email.eq(email))
        .filter(users::Column::Active.eq(true))
        .into_tuple()
        .one(db)
        .await?;
    id.as_deref().map(|id| parse_uuid(id, "user")).transpose()
}

/// The oldest account of `user_id` (ties broken by id).
pub(super) async fn earliest_account_of<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> ResultEngine<Option<Uuid>> {
    let id: Option<String> = accounts::Entity::find()
        .select_only()
        .column(accounts::Column::Id)
        .filter(accounts::Column::UserId.eq(user_id.to_string()))
        .order_by_asc(accounts::Column::CreatedAt)
        .order_by_asc(accounts::Column::Id)
        .into_tuple()
        .one(db)
        .await?;
    id.as_deref().map(|id| parse_uuid(id, "account")).transpose()
}

impl Engine {
    /// Accounts owned by the caller. Used to authorize the sender of a
    /// transfer.
    pub async fn accounts_owned_by(&self, caller: &UserIdentity) -> ResultEngine<HashSet<Uuid>> {
        bounded(
            "ledger store",
            self.timeouts.store,
            owned_account_ids(&self.database, caller.user_id),
        )
        .await
    }

    /// Resolve `email` to the account that receives money sent to it: the
    /// oldest account of the matching identity.
    pub async fn first_account_for_email(&self, email: &str) -> ResultEngine<Uuid> {
        let email = normalize_email(email)?;
        bounded("ledger store", self.timeouts.store, async {
            let user_id = user_id_by_email(&self.database, &email)
                .await?
                .ok_or_else(|| {
                    EngineError::RecipientNotFound(format!("no user with email {email}"))
                })?;
            let account_id = earliest_account_of(&self.database, user_id)
                .await?
                .ok_or_else(|| {
                    EngineError::RecipientNotFound(format!("user {email} has no accounts"))
                })?;
            tracing::debug!(%account_id, "recipient resolved");
            Ok(account_id)
        })
        .await
    }
}
