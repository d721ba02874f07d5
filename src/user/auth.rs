//! Per-request caller resolution.
//!
//! A `Caller` is extracted once per request from the session cookie (or an
//! `Authorization: Bearer` header) and handed to the handler explicitly.
//! Handlers that take a `Caller` reject unauthenticated requests before any
//! campaign data is touched.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use tracing::debug;

use crate::database::Database;
use crate::error::Error;

use super::{AccountId, UserId};

pub const DEFAULT_SESSION_COOKIE: &str = "session";

#[derive(Clone, Debug)]
pub struct AuthSettings {
    pub session_cookie: String,
    /// Campaign listing is public unless this is set, in which case it
    /// requires a session and only shows the caller's account.
    pub require_auth_for_list: bool,
}

impl Default for AuthSettings {
    fn default() -> AuthSettings {
        AuthSettings {
            session_cookie: DEFAULT_SESSION_COOKIE.to_owned(),
            require_auth_for_list: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    account_id: Option<AccountId>,
}

impl Caller {
    pub fn new(user_id: UserId, account_id: Option<AccountId>) -> Caller {
        Caller {
            user_id,
            account_id,
        }
    }

    /// The account this caller acts for. A user without a profile mapping
    /// cannot work with campaigns.
    pub fn account_id(&self) -> Result<AccountId, Error> {
        self.account_id.ok_or(Error::ProfileNotFound {
            user_id: self.user_id,
        })
    }
}

#[tracing::instrument(skip(db, token))]
pub async fn authenticate(
    db: &dyn Database,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Caller, Error> {
    let session = db
        .users()
        .fetch_session_by_token(token)
        .await?
        .filter(|session| session.is_active(now))
        .ok_or(Error::Unauthorized)?;

    let profile = db
        .users()
        .fetch_profile_by_user_id(session.user_id)
        .await?;

    if profile.is_none() {
        debug!(user_id = %session.user_id, "session has no profile mapping");
    }

    Ok(Caller::new(
        session.user_id,
        profile.map(|profile| profile.account_id),
    ))
}

fn session_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = req.cookie(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_owned());
        }
    }

    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Caller, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = req.app_data::<Data<Box<dyn Database>>>().cloned();
        let settings = req.app_data::<Data<AuthSettings>>().cloned();
        let cookie_name = settings
            .as_ref()
            .map(|settings| settings.session_cookie.as_str())
            .unwrap_or(DEFAULT_SESSION_COOKIE);
        let token = session_token(req, cookie_name);

        Box::pin(async move {
            let token = token.ok_or(Error::Unauthorized)?;
            let db = db.ok_or_else(|| {
                Error::ExistentialState("no database registered with the app".to_owned())
            })?;

            authenticate(&***db, &token, Utc::now()).await
        })
    }
}
