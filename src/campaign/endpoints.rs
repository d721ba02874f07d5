use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, patch, post, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::Database;
use crate::error::Error;
use crate::user::{AccountId, AuthSettings, Caller};
use crate::utils::SuccessBody;

use super::query::ListQuery;
use super::{manager, validation, Campaign, CampaignId, Gender, Publisher, Screen};

pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignBody {
    pub id: CampaignId,
    pub account_id: AccountId,
    pub name: String,
    pub budget_usd: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub age_min: i32,
    pub age_max: i32,
    pub gender: Gender,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub inventory: Vec<Publisher>,
    pub screens: Vec<Screen>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CampaignBody {
    pub fn render(campaign: Campaign) -> CampaignBody {
        CampaignBody {
            id: campaign.id,
            account_id: campaign.account_id,
            name: campaign.name,
            budget_usd: campaign.budget_usd,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            age_min: campaign.age_min,
            age_max: campaign.age_max,
            gender: campaign.gender,
            country: campaign.country,
            state: campaign.state,
            city: campaign.city,
            zip: campaign.zip,
            inventory: campaign.inventory,
            screens: campaign.screens,
            created_at: campaign.created_at,
            updated_at: campaign.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignListBody {
    pub items: Vec<CampaignBody>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[get("/campaigns")]
#[tracing::instrument(skip(db, settings, caller))]
pub async fn get_campaigns(
    db: Data<Box<dyn Database>>,
    settings: Data<AuthSettings>,
    caller: Result<Caller, Error>,
    params: Query<Vec<(String, String)>>,
) -> Result<HttpResponse, Error> {
    let query = ListQuery::from_pairs(params.into_inner());

    let account_id = if settings.require_auth_for_list {
        Some(caller?.account_id()?)
    } else {
        None
    };

    let page = manager::list_campaigns(&***db, &query, account_id).await?;

    let body = CampaignListBody {
        items: page.items.into_iter().map(CampaignBody::render).collect(),
        total: page.total,
        page: query.page,
        page_size: query.page_size,
    };

    Ok(HttpResponse::Ok()
        .insert_header((TOTAL_COUNT_HEADER, page.total.to_string()))
        .json(body))
}

#[post("/campaigns")]
#[tracing::instrument(skip(db, body))]
pub async fn create_campaign(
    db: Data<Box<dyn Database>>,
    caller: Caller,
    body: Json<Value>,
) -> Result<HttpResponse, Error> {
    let input = validation::validate_create(&body)?;
    let account_id = caller.account_id()?;

    let campaign = manager::create_campaign(&***db, account_id, input).await?;

    Ok(HttpResponse::Created().json(CampaignBody::render(campaign)))
}

#[get("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: Data<Box<dyn Database>>,
    caller: Caller,
    params: Path<CampaignId>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();
    let account_id = caller.account_id()?;

    let campaign = manager::get_campaign_by_id(&***db, account_id, campaign_id).await?;

    Ok(Json(CampaignBody::render(campaign)))
}

#[patch("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db, body))]
pub async fn update_campaign(
    db: Data<Box<dyn Database>>,
    caller: Caller,
    params: Path<CampaignId>,
    body: Json<Value>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();
    let patch = validation::validate_update(&body)?;
    let account_id = caller.account_id()?;

    let campaign = manager::update_campaign(&***db, account_id, campaign_id, patch).await?;

    Ok(Json(CampaignBody::render(campaign)))
}

#[delete("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn delete_campaign(
    db: Data<Box<dyn Database>>,
    caller: Caller,
    params: Path<CampaignId>,
) -> Result<Json<SuccessBody>, Error> {
    let campaign_id = params.into_inner();
    let account_id = caller.account_id()?;

    manager::delete_campaign(&***db, account_id, campaign_id).await?;

    Ok(Json(SuccessBody::ok()))
}
