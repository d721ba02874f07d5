use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::typedid::{TypedId, TypedIdMarker};
use crate::user::AccountId;

pub mod db;
pub mod endpoints;
pub mod filter;
pub mod manager;
pub mod query;
pub mod validation;
pub use endpoints::*;

use validation::{CampaignInput, CampaignPatch};

pub type CampaignId = TypedId<Campaign>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Campaign {
    #[serde(rename = "_id")]
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
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl TypedIdMarker for Campaign {
    fn tag() -> &'static str {
        "CPN"
    }
}

impl Campaign {
    pub fn new(account_id: AccountId, input: CampaignInput, now: DateTime<Utc>) -> Campaign {
        Campaign {
            id: CampaignId::new(),
            account_id,
            name: input.name,
            budget_usd: input.budget_usd,
            start_date: input.start_date,
            end_date: input.end_date,
            age_min: input.age_min,
            age_max: input.age_max,
            gender: input.gender,
            country: input.country,
            state: input.state,
            city: input.city,
            zip: input.zip,
            inventory: input.inventory,
            screens: input.screens,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites only the fields present in the patch.
    pub fn apply_patch(&mut self, patch: &CampaignPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(budget_usd) = patch.budget_usd {
            self.budget_usd = budget_usd;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(age_min) = patch.age_min {
            self.age_min = age_min;
        }
        if let Some(age_max) = patch.age_max {
            self.age_max = age_max;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(country) = &patch.country {
            self.country = country.clone();
        }
        if let Some(state) = &patch.state {
            self.state = state.clone();
        }
        if let Some(city) = &patch.city {
            self.city = city.clone();
        }
        if let Some(zip) = &patch.zip {
            self.zip = zip.clone();
        }
        if let Some(inventory) = &patch.inventory {
            self.inventory = inventory.clone();
        }
        if let Some(screens) = &patch.screens {
            self.screens = screens.clone();
        }
        self.updated_at = now;
    }
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, AsRefStr, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    Any,
    Male,
    Female,
    Nonbinary,
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, AsRefStr, Display, EnumIter, EnumString,
)]
pub enum Screen {
    #[serde(rename = "CTV")]
    #[strum(serialize = "CTV")]
    Ctv,
    #[serde(rename = "Mobile Device")]
    #[strum(serialize = "Mobile Device")]
    MobileDevice,
    #[serde(rename = "Web Browser")]
    #[strum(serialize = "Web Browser")]
    WebBrowser,
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, AsRefStr, Display, EnumIter, EnumString,
)]
pub enum Publisher {
    Hulu,
    Discovery,
    #[serde(rename = "ABC")]
    #[strum(serialize = "ABC")]
    Abc,
    #[serde(rename = "A&E")]
    #[strum(serialize = "A&E")]
    AAndE,
    #[serde(rename = "TLC")]
    #[strum(serialize = "TLC")]
    Tlc,
    #[serde(rename = "Fox News")]
    #[strum(serialize = "Fox News")]
    FoxNews,
    #[serde(rename = "Fox Sports")]
    #[strum(serialize = "Fox Sports")]
    FoxSports,
    Etc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_their_display_names() {
        assert_eq!(serde_json::to_value(Screen::MobileDevice).unwrap(), "Mobile Device");
        assert_eq!(serde_json::to_value(Publisher::AAndE).unwrap(), "A&E");
        assert_eq!(serde_json::to_value(Gender::Nonbinary).unwrap(), "nonbinary");
        assert_eq!("Fox Sports".parse::<Publisher>().unwrap(), Publisher::FoxSports);
        assert_eq!(Screen::Ctv.as_ref(), "CTV");
        assert!("fox sports".parse::<Publisher>().is_err());
    }
}
