//! Engine operations, grouped by concern.
//!
//! Every public operation authenticates or receives an already verified
//! [`UserIdentity`](crate::UserIdentity); nothing here trusts ids sent by a
//! client without checking them against the caller.

use crate::Engine;

mod access;
mod provisioning;
mod reads;
mod resolver;
mod store;
mod transfer;

pub use reads::{DEFAULT_ENTRIES_LIMIT, MAX_ENTRIES_LIMIT};
