use chrono::{Duration, NaiveDate, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::campaign::validation::CampaignInput;
use crate::campaign::{Campaign, Gender, Publisher, Screen};
use crate::database::Database;
use crate::error::Error;
use crate::user::{Account, AccountId, Session, UserId, UserProfile};

const SESSION_TOKEN_LENGTH: usize = 48;
const SESSION_LIFETIME_DAYS: i64 = 30;

pub fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Replaces everything in the database with one demo account, a user
/// mapped onto it, a session for that user and a few campaigns. Returns
/// the session token.
pub async fn seed(db: &dyn Database) -> Result<String, Error> {
    db.drop().await?;

    let account_id: AccountId = "ACT-16E77539-8873-4C8A-BCA3-2036010474AD"
        .parse()
        .map_err(|err| Error::ExistentialState(format!("bad seed account id: {}", err)))?;
    let user_id: UserId = "USR-33957EB6-0EE7-487F-A087-E55C335BD63C"
        .parse()
        .map_err(|err| Error::ExistentialState(format!("bad seed user id: {}", err)))?;

    let now = Utc::now();
    let account = Account {
        id: account_id,
        name: "Green Bean Media".to_string(),
        created_at: now,
    };
    let profile = UserProfile {
        user_id,
        account_id,
        created_at: now,
    };
    let session = Session {
        token: generate_session_token(),
        user_id,
        created_at: now,
        expires_at: now + Duration::days(SESSION_LIFETIME_DAYS),
    };

    db.users().insert_account(&account).await?;
    db.users().insert_profile(&profile).await?;
    db.users().insert_session(&session).await?;

    let date = |y, m, d| {
        NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| Error::ExistentialState(format!("bad seed date {}-{}-{}", y, m, d)))
    };

    let inputs = vec![
        CampaignInput {
            name: "Spring Streaming Launch".to_string(),
            budget_usd: 25000.0,
            start_date: date(2024, 3, 1)?,
            end_date: date(2024, 4, 15)?,
            age_min: 18,
            age_max: 34,
            gender: Gender::Any,
            country: "US".to_string(),
            state: Some("CA".to_string()),
            city: Some("Los Angeles".to_string()),
            zip: None,
            inventory: vec![Publisher::Hulu, Publisher::Discovery],
            screens: vec![Screen::Ctv, Screen::MobileDevice],
        },
        CampaignInput {
            name: "Election Night Coverage".to_string(),
            budget_usd: 80000.0,
            start_date: date(2024, 10, 20)?,
            end_date: date(2024, 11, 6)?,
            age_min: 35,
            age_max: 120,
            gender: Gender::Any,
            country: "US".to_string(),
            state: None,
            city: None,
            zip: None,
            inventory: vec![Publisher::FoxNews, Publisher::Abc],
            screens: vec![Screen::Ctv, Screen::WebBrowser],
        },
        CampaignInput {
            name: "Playoffs Push".to_string(),
            budget_usd: 42000.5,
            start_date: date(2025, 1, 4)?,
            end_date: date(2025, 2, 9)?,
            age_min: 21,
            age_max: 54,
            gender: Gender::Male,
            country: "US".to_string(),
            state: Some("TX".to_string()),
            city: Some("Dallas".to_string()),
            zip: Some("75201".to_string()),
            inventory: vec![Publisher::FoxSports],
            screens: vec![Screen::Ctv],
        },
        CampaignInput {
            name: "Home Makeover Week".to_string(),
            budget_usd: 9000.0,
            start_date: date(2025, 5, 1)?,
            end_date: date(2025, 5, 7)?,
            age_min: 25,
            age_max: 64,
            gender: Gender::Female,
            country: "CA".to_string(),
            state: Some("ON".to_string()),
            city: Some("Toronto".to_string()),
            zip: None,
            inventory: vec![Publisher::Tlc, Publisher::AAndE, Publisher::Etc],
            screens: vec![Screen::MobileDevice, Screen::WebBrowser],
        },
    ];

    for (n, input) in inputs.into_iter().enumerate() {
        let campaign = Campaign::new(account_id, input, now + Duration::seconds(n as i64));
        db.campaigns().insert_campaign(&campaign).await?;
    }

    Ok(session.token)
}
