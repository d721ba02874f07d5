use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{self, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Database;

use crate::database::MongoCampaignStore;
use crate::error::Error;
use crate::user::AccountId;

use super::filter::CampaignFilter;
use super::validation::CampaignPatch;
use super::{Campaign, CampaignId};

pub const CAMPAIGNS: &str = "campaigns";

// the driver sends skip as a signed 64-bit integer
const MAX_SKIP: u64 = i64::MAX as u64;

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error>;

    async fn count_campaigns(&self, filter: &CampaignFilter) -> Result<u64, Error>;

    /// Matching campaigns, newest first, starting at `offset`.
    async fn fetch_campaigns(
        &self,
        filter: &CampaignFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Campaign>, Error>;

    async fn fetch_campaign_by_id(
        &self,
        account_id: AccountId,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error>;

    /// Writes only the fields present in `patch`. Returns the updated
    /// campaign, or `None` if nothing matched.
    async fn update_campaign(
        &self,
        account_id: AccountId,
        campaign_id: CampaignId,
        patch: &CampaignPatch,
    ) -> Result<Option<Campaign>, Error>;

    /// Returns whether a campaign was removed.
    async fn delete_campaign(
        &self,
        account_id: AccountId,
        campaign_id: CampaignId,
    ) -> Result<bool, Error>;
}

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": CAMPAIGNS,
            "indexes": [
                { "key": { "account_id": 1, "created_at": -1 }, "name": "by_account_id" },
                { "key": { "created_at": -1 }, "name": "by_created_at" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

/// The `$set` body for a partial update; absent fields are left out so the
/// stored values survive.
pub fn patch_document(patch: &CampaignPatch) -> Result<Document, Error> {
    let mut set = bson::doc! {};

    if let Some(name) = &patch.name {
        set.insert("name", name.clone());
    }
    if let Some(budget_usd) = patch.budget_usd {
        set.insert("budget_usd", budget_usd);
    }
    if let Some(start_date) = &patch.start_date {
        set.insert("start_date", bson::to_bson(start_date)?);
    }
    if let Some(end_date) = &patch.end_date {
        set.insert("end_date", bson::to_bson(end_date)?);
    }
    if let Some(age_min) = patch.age_min {
        set.insert("age_min", age_min);
    }
    if let Some(age_max) = patch.age_max {
        set.insert("age_max", age_max);
    }
    if let Some(gender) = &patch.gender {
        set.insert("gender", bson::to_bson(gender)?);
    }
    if let Some(country) = &patch.country {
        set.insert("country", country.clone());
    }
    if let Some(state) = &patch.state {
        set.insert("state", bson::to_bson(state)?);
    }
    if let Some(city) = &patch.city {
        set.insert("city", bson::to_bson(city)?);
    }
    if let Some(zip) = &patch.zip {
        set.insert("zip", bson::to_bson(zip)?);
    }
    if let Some(inventory) = &patch.inventory {
        set.insert("inventory", bson::to_bson(inventory)?);
    }
    if let Some(screens) = &patch.screens {
        set.insert("screens", bson::to_bson(screens)?);
    }

    Ok(set)
}

#[async_trait]
impl CampaignStore for MongoCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error> {
        self.insert_one(campaign, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn count_campaigns(&self, filter: &CampaignFilter) -> Result<u64, Error> {
        let count = self.count_documents(filter.to_document(), None).await?;

        Ok(count)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns(
        &self,
        filter: &CampaignFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Campaign>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "created_at": -1, "_id": -1 })
            .skip(offset.min(MAX_SKIP))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();

        let campaigns: Vec<Campaign> = self
            .find(filter.to_document(), options)
            .await?
            .try_collect()
            .await?;

        Ok(campaigns)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_id(
        &self,
        account_id: AccountId,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        let campaign: Option<Campaign> = self
            .find_one(
                bson::doc! { "_id": campaign_id, "account_id": account_id },
                None,
            )
            .await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn update_campaign(
        &self,
        account_id: AccountId,
        campaign_id: CampaignId,
        patch: &CampaignPatch,
    ) -> Result<Option<Campaign>, Error> {
        let mut set = patch_document(patch)?;
        set.insert("updated_at", bson::DateTime::from_chrono(Utc::now()));

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let campaign = self
            .find_one_and_update(
                bson::doc! { "_id": campaign_id, "account_id": account_id },
                bson::doc! { "$set": set },
                options,
            )
            .await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_campaign(
        &self,
        account_id: AccountId,
        campaign_id: CampaignId,
    ) -> Result<bool, Error> {
        let result = self
            .delete_one(
                bson::doc! { "_id": campaign_id, "account_id": account_id },
                None,
            )
            .await?;

        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::campaign::{Gender, Publisher, Screen};

    #[test]
    fn patch_document_only_holds_present_fields() {
        let patch = CampaignPatch {
            name: Some("Renamed".to_owned()),
            ..Default::default()
        };

        assert_eq!(patch_document(&patch).unwrap(), bson::doc! { "name": "Renamed" });
        assert_eq!(patch_document(&CampaignPatch::default()).unwrap(), bson::doc! {});
    }

    #[test]
    fn patch_document_renders_dates_enums_and_nulls() {
        let patch = CampaignPatch {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            gender: Some(Gender::Female),
            city: Some(None),
            zip: Some(Some("10001".to_owned())),
            inventory: Some(vec![Publisher::FoxNews, Publisher::Tlc]),
            screens: Some(vec![Screen::WebBrowser]),
            ..Default::default()
        };

        assert_eq!(
            patch_document(&patch).unwrap(),
            bson::doc! {
                "start_date": "2024-01-10",
                "gender": "female",
                "city": null,
                "zip": "10001",
                "inventory": ["Fox News", "TLC"],
                "screens": ["Web Browser"],
            }
        );
    }
}
