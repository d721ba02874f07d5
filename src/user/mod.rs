use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::typedid::{TypedId, TypedIdMarker};

pub mod auth;
pub mod db;

pub use auth::{AuthSettings, Caller};

pub type UserId = TypedId<User>;
pub type AccountId = TypedId<Account>;

#[derive(Clone, Debug)]
pub struct User;

impl TypedIdMarker for User {
    fn tag() -> &'static str {
        "USR"
    }
}

/// The tenant boundary. Every campaign belongs to exactly one account.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: AccountId,
    pub name: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl TypedIdMarker for Account {
    fn tag() -> &'static str {
        "ACT"
    }
}

/// A login session issued by the identity provider, keyed by its token.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    #[serde(rename = "_id")]
    pub token: String,
    pub user_id: UserId,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Maps a user onto the account they act for.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub user_id: UserId,
    pub account_id: AccountId,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}
