//! A process-local backend. Used for development runs without MongoDB and
//! by the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::campaign::db::CampaignStore;
use crate::campaign::filter::CampaignFilter;
use crate::campaign::validation::CampaignPatch;
use crate::campaign::{Campaign, CampaignId};
use crate::error::Error;
use crate::user::db::UserStore;
use crate::user::{Account, AccountId, Session, UserId, UserProfile};

use super::Database;

#[derive(Debug, Default)]
pub struct MemoryDatabase {
    campaigns: MemoryCampaignStore,
    users: MemoryUserStore,
}

impl MemoryDatabase {
    pub fn new() -> MemoryDatabase {
        MemoryDatabase::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }

    fn users(&self) -> &dyn UserStore {
        &self.users
    }

    async fn drop(&self) -> Result<(), Error> {
        self.campaigns.campaigns.write().clear();
        self.users.accounts.write().clear();
        self.users.sessions.write().clear();
        self.users.profiles.write().clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCampaignStore {
    campaigns: RwLock<Vec<Campaign>>,
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error> {
        self.campaigns.write().push(campaign.clone());

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn count_campaigns(&self, filter: &CampaignFilter) -> Result<u64, Error> {
        let count = self
            .campaigns
            .read()
            .iter()
            .filter(|campaign| filter.matches(campaign))
            .count();

        Ok(count as u64)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns(
        &self,
        filter: &CampaignFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Campaign>, Error> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .read()
            .iter()
            .filter(|campaign| filter.matches(campaign))
            .cloned()
            .collect();

        // newest first, ids as the tie-break, same as the mongo sort
        campaigns.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.to_string().cmp(&a.id.to_string()))
        });

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(campaigns.into_iter().skip(offset).take(limit).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_id(
        &self,
        account_id: AccountId,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        let campaign = self
            .campaigns
            .read()
            .iter()
            .find(|campaign| campaign.id == campaign_id && campaign.account_id == account_id)
            .cloned();

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn update_campaign(
        &self,
        account_id: AccountId,
        campaign_id: CampaignId,
        patch: &CampaignPatch,
    ) -> Result<Option<Campaign>, Error> {
        let mut campaigns = self.campaigns.write();
        let campaign = campaigns
            .iter_mut()
            .find(|campaign| campaign.id == campaign_id && campaign.account_id == account_id);

        Ok(campaign.map(|campaign| {
            campaign.apply_patch(patch, Utc::now());
            campaign.clone()
        }))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_campaign(
        &self,
        account_id: AccountId,
        campaign_id: CampaignId,
    ) -> Result<bool, Error> {
        let mut campaigns = self.campaigns.write();
        let before = campaigns.len();
        campaigns.retain(|campaign| !(campaign.id == campaign_id && campaign.account_id == account_id));

        Ok(campaigns.len() != before)
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    accounts: RwLock<Vec<Account>>,
    sessions: RwLock<HashMap<String, Session>>,
    profiles: RwLock<HashMap<UserId, UserProfile>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    #[tracing::instrument(skip(self))]
    async fn insert_account(&self, account: &Account) -> Result<(), Error> {
        self.accounts.write().push(account.clone());

        Ok(())
    }

    #[tracing::instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn insert_session(&self, session: &Session) -> Result<(), Error> {
        self.sessions
            .write()
            .insert(session.token.clone(), session.clone());

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn insert_profile(&self, profile: &UserProfile) -> Result<(), Error> {
        self.profiles
            .write()
            .insert(profile.user_id, profile.clone());

        Ok(())
    }

    #[tracing::instrument(skip(self, token))]
    async fn fetch_session_by_token(&self, token: &str) -> Result<Option<Session>, Error> {
        Ok(self.sessions.read().get(token).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_profile_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserProfile>, Error> {
        Ok(self.profiles.read().get(&user_id).cloned())
    }
}
