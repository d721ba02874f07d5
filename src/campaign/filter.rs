//! The listing predicate, built once and shared by the count and the page
//! query so both always agree on which campaigns match.

use chrono::NaiveDate;
use mongodb::bson::{self, Document};
use serde_json::Value;

use crate::error::Error;
use crate::user::AccountId;

use super::query::ListQuery;
use super::validation::parse_date;
use super::Campaign;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stored dates are `YYYY-MM-DD` strings, so the document form compares
/// formatted bounds while `matches` compares dates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateRange {
    Any,
    Overlapping { from: NaiveDate, to: NaiveDate },
    EndingOnOrAfter(NaiveDate),
    StartingOnOrBefore(NaiveDate),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CampaignFilter {
    pub account_id: Option<AccountId>,
    pub name_contains: Option<String>,
    pub screens: Vec<String>,
    pub inventory: Vec<String>,
    pub dates: DateRange,
}

impl CampaignFilter {
    /// Fails if a date bound is given but is not a recognizable date.
    pub fn from_query(
        query: &ListQuery,
        account_id: Option<AccountId>,
    ) -> Result<CampaignFilter, Error> {
        let from = date_bound("from", query.from.as_deref())?;
        let to = date_bound("to", query.to.as_deref())?;

        let dates = match (from, to) {
            (Some(from), Some(to)) => DateRange::Overlapping { from, to },
            (Some(from), None) => DateRange::EndingOnOrAfter(from),
            (None, Some(to)) => DateRange::StartingOnOrBefore(to),
            (None, None) => DateRange::Any,
        };

        Ok(CampaignFilter {
            account_id,
            name_contains: query.search.clone(),
            screens: query.screens.clone().unwrap_or_default(),
            inventory: query.inventory.clone().unwrap_or_default(),
            dates,
        })
    }

    pub fn to_document(&self) -> Document {
        let mut filter = bson::doc! {};

        if let Some(account_id) = self.account_id {
            filter.insert("account_id", account_id);
        }

        if let Some(search) = &self.name_contains {
            filter.insert(
                "name",
                bson::doc! { "$regex": regex::escape(search), "$options": "i" },
            );
        }

        // `$in` against an array field matches on any shared element
        if !self.screens.is_empty() {
            filter.insert("screens", bson::doc! { "$in": self.screens.clone() });
        }
        if !self.inventory.is_empty() {
            filter.insert("inventory", bson::doc! { "$in": self.inventory.clone() });
        }

        let format = |date: &NaiveDate| date.format(DATE_FORMAT).to_string();
        match &self.dates {
            DateRange::Any => {}
            DateRange::Overlapping { from, to } => {
                filter.insert("start_date", bson::doc! { "$lte": format(to) });
                filter.insert("end_date", bson::doc! { "$gte": format(from) });
            }
            DateRange::EndingOnOrAfter(from) => {
                filter.insert("end_date", bson::doc! { "$gte": format(from) });
            }
            DateRange::StartingOnOrBefore(to) => {
                filter.insert("start_date", bson::doc! { "$lte": format(to) });
            }
        }

        filter
    }

    pub fn matches(&self, campaign: &Campaign) -> bool {
        if let Some(account_id) = self.account_id {
            if campaign.account_id != account_id {
                return false;
            }
        }

        if let Some(search) = &self.name_contains {
            if !campaign
                .name
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }

        if !self.screens.is_empty()
            && !overlaps(campaign.screens.iter().map(|screen| screen.as_ref()), &self.screens)
        {
            return false;
        }

        if !self.inventory.is_empty()
            && !overlaps(campaign.inventory.iter().map(|publisher| publisher.as_ref()), &self.inventory)
        {
            return false;
        }

        match &self.dates {
            DateRange::Any => true,
            DateRange::Overlapping { from, to } => {
                campaign.start_date <= *to && campaign.end_date >= *from
            }
            DateRange::EndingOnOrAfter(from) => campaign.end_date >= *from,
            DateRange::StartingOnOrBefore(to) => campaign.start_date <= *to,
        }
    }
}

fn date_bound(parameter: &str, value: Option<&str>) -> Result<Option<NaiveDate>, Error> {
    let value = match value {
        Some(value) => value,
        None => return Ok(None),
    };

    parse_date(&Value::String(value.to_owned()))
        .map(Some)
        .map_err(|_| Error::InvalidDateFilter {
            parameter: parameter.to_owned(),
            value: value.to_owned(),
        })
}

fn overlaps<'a>(mut values: impl Iterator<Item = &'a str>, requested: &[String]) -> bool {
    values.any(|value| requested.iter().any(|r| r == value))
}
