use chrono::Utc;
use tracing::info;

use crate::database::Database;
use crate::error::Error;
use crate::user::AccountId;

use super::filter::CampaignFilter;
use super::query::ListQuery;
use super::validation::{CampaignInput, CampaignPatch};
use super::{Campaign, CampaignId};

#[derive(Clone, Debug)]
pub struct CampaignPage {
    pub items: Vec<Campaign>,
    pub total: u64,
}

/// Counts and fetches with the same filter. The two calls are not a
/// snapshot; concurrent writes may make them disagree.
#[tracing::instrument(skip(db))]
pub async fn list_campaigns(
    db: &dyn Database,
    query: &ListQuery,
    account_id: Option<AccountId>,
) -> Result<CampaignPage, Error> {
    let filter = CampaignFilter::from_query(query, account_id)?;

    let total = db.campaigns().count_campaigns(&filter).await?;
    if query.offset() >= total {
        return Ok(CampaignPage {
            items: Vec::new(),
            total,
        });
    }

    let items = db
        .campaigns()
        .fetch_campaigns(&filter, query.offset(), query.page_size)
        .await?;

    Ok(CampaignPage { items, total })
}

#[tracing::instrument(skip(db))]
pub async fn create_campaign(
    db: &dyn Database,
    account_id: AccountId,
    input: CampaignInput,
) -> Result<Campaign, Error> {
    let campaign = Campaign::new(account_id, input, Utc::now());

    db.campaigns().insert_campaign(&campaign).await?;

    info!(campaign_id = %campaign.id, account_id = %account_id, "created campaign");

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: &dyn Database,
    account_id: AccountId,
    campaign_id: CampaignId,
) -> Result<Campaign, Error> {
    let campaign = db
        .campaigns()
        .fetch_campaign_by_id(account_id, campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn update_campaign(
    db: &dyn Database,
    account_id: AccountId,
    campaign_id: CampaignId,
    patch: CampaignPatch,
) -> Result<Campaign, Error> {
    let campaign = db
        .campaigns()
        .update_campaign(account_id, campaign_id, &patch)
        .await?
        .ok_or(Error::CampaignNotUpdated { campaign_id })?;

    Ok(campaign)
}

/// Succeeds whether or not the campaign existed.
#[tracing::instrument(skip(db))]
pub async fn delete_campaign(
    db: &dyn Database,
    account_id: AccountId,
    campaign_id: CampaignId,
) -> Result<(), Error> {
    let deleted = db
        .campaigns()
        .delete_campaign(account_id, campaign_id)
        .await?;

    if deleted {
        info!(campaign_id = %campaign_id, "deleted campaign");
    }

    Ok(())
}
