use async_trait::async_trait;
use mongodb::{bson, Collection, Database};

use crate::error::Error;

use super::{Account, Session, UserId, UserProfile};

const ACCOUNTS: &str = "accounts";
const SESSIONS: &str = "sessions";
const USER_PROFILES: &str = "user_profiles";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_account(&self, account: &Account) -> Result<(), Error>;

    async fn insert_session(&self, session: &Session) -> Result<(), Error>;

    async fn insert_profile(&self, profile: &UserProfile) -> Result<(), Error>;

    async fn fetch_session_by_token(&self, token: &str) -> Result<Option<Session>, Error>;

    async fn fetch_profile_by_user_id(&self, user_id: UserId)
        -> Result<Option<UserProfile>, Error>;
}

#[derive(Debug, Clone)]
pub struct MongoUserStore {
    accounts: Collection<Account>,
    sessions: Collection<Session>,
    profiles: Collection<UserProfile>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> MongoUserStore {
        MongoUserStore {
            accounts: db.collection(ACCOUNTS),
            sessions: db.collection(SESSIONS),
            profiles: db.collection(USER_PROFILES),
        }
    }
}

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": USER_PROFILES,
            "indexes": [
                { "key": { "account_id": 1 }, "name": "by_account_id" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

#[async_trait]
impl UserStore for MongoUserStore {
    #[tracing::instrument(skip(self))]
    async fn insert_account(&self, account: &Account) -> Result<(), Error> {
        self.accounts.insert_one(account, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn insert_session(&self, session: &Session) -> Result<(), Error> {
        self.sessions.insert_one(session, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn insert_profile(&self, profile: &UserProfile) -> Result<(), Error> {
        self.profiles.insert_one(profile, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, token))]
    async fn fetch_session_by_token(&self, token: &str) -> Result<Option<Session>, Error> {
        let session = self
            .sessions
            .find_one(bson::doc! { "_id": token }, None)
            .await?;

        Ok(session)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_profile_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserProfile>, Error> {
        let profile = self
            .profiles
            .find_one(bson::doc! { "_id": user_id }, None)
            .await?;

        Ok(profile)
    }
}
