use std::borrow::Cow;
use std::fmt::{Debug, Display};
use std::io::Error as IoError;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derivative::Derivative;
use mongodb::bson::ser::Error as BsonError;
use mongodb::error::Error as DatabaseError;
use serde::{Serialize, Serializer};

use crate::campaign::validation::ValidationErrors;
use crate::campaign::CampaignId;
use crate::user::UserId;

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

#[derive(Debug, Serialize, Derivative)]
#[derivative(PartialEq)]
#[serde(untagged)]
pub enum Error {
    // 400
    #[serde(serialize_with = "display")]
    InvalidJson(#[derivative(PartialEq = "ignore")] JsonPayloadError),
    #[serde(serialize_with = "display")]
    InvalidPath(#[derivative(PartialEq = "ignore")] PathError),
    #[serde(serialize_with = "display")]
    InvalidQuery(#[derivative(PartialEq = "ignore")] QueryPayloadError),
    ValidationFailed(ValidationErrors),
    ProfileNotFound {
        user_id: UserId,
    },
    CampaignNotUpdated {
        campaign_id: CampaignId,
    },
    InvalidDateFilter {
        parameter: String,
        value: String,
    },
    #[serde(serialize_with = "display")]
    FailedDatabaseCall(#[derivative(PartialEq = "ignore")] DatabaseError),

    // 401
    Unauthorized,

    // 404
    PathNotFound,
    CampaignNotFound {
        campaign_id: CampaignId,
    },

    // 500
    ExistentialState(String),
    #[serde(serialize_with = "display")]
    FailedToSerializeToBson(#[derivative(PartialEq = "ignore")] BsonError),
    #[serde(serialize_with = "display")]
    IoError(#[derivative(PartialEq = "ignore")] IoError),
}

impl Error {
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "E4001000",
            Error::InvalidPath(_) => "E4001001",
            Error::InvalidQuery(_) => "E4001002",
            Error::ValidationFailed(_) => "E4001003",
            Error::ProfileNotFound { .. } => "E4001004",
            Error::CampaignNotUpdated { .. } => "E4001005",
            Error::FailedDatabaseCall(_) => "E4001006",
            Error::InvalidDateFilter { .. } => "E4001007",
            Error::Unauthorized => "E4011000",
            Error::PathNotFound => "E4041000",
            Error::CampaignNotFound { .. } => "E4041001",
            Error::ExistentialState(_) => "E5001000",
            Error::FailedToSerializeToBson(_) => "E5001001",
            Error::IoError(_) => "E5001002",
        }
    }

    /// Store failures are relayed with the store's own message.
    pub fn error_message(&self) -> Cow<'static, str> {
        let message = match self {
            Error::InvalidJson(_) => "The given json could not be parsed",
            Error::InvalidPath(_) => "The given path could not be parsed",
            Error::InvalidQuery(_) => "The given query could not be parsed",
            Error::ValidationFailed(_) => "The given campaign is invalid",
            Error::ProfileNotFound { .. } => "The requesting user has no account profile",
            Error::CampaignNotUpdated { .. } => "The requested campaign could not be updated",
            Error::InvalidDateFilter { .. } => "The given date filter could not be parsed",
            Error::FailedDatabaseCall(err) => return Cow::Owned(err.to_string()),
            Error::Unauthorized => "Unauthorized",
            Error::PathNotFound => "The requested path was not found",
            Error::CampaignNotFound { .. } => "The requested campaign was not found",
            Error::ExistentialState(_) => "The server detected an invalid state",
            Error::FailedToSerializeToBson(_) => {
                "An error occurred when serializing an object to bson"
            }
            Error::IoError(_) => "An error occurred during an I/O operation",
        };

        Cow::Borrowed(message)
    }

    fn has_meta(&self) -> bool {
        !matches!(
            self,
            Error::FailedDatabaseCall(_) | Error::Unauthorized | Error::PathNotFound
        )
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Error::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Error::ProfileNotFound { .. } => StatusCode::BAD_REQUEST,
            Error::CampaignNotUpdated { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidDateFilter { .. } => StatusCode::BAD_REQUEST,
            Error::FailedDatabaseCall(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::PathNotFound => StatusCode::NOT_FOUND,
            Error::CampaignNotFound { .. } => StatusCode::NOT_FOUND,
            Error::ExistentialState(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedToSerializeToBson(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        #[derive(Serialize)]
        struct Dummy<'a> {
            error: Cow<'static, str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error_meta: Option<&'a Error>,
        }

        HttpResponse::build(self.status_code())
            .insert_header((ERROR_CODE_HEADER, self.error_code()))
            .json(&Dummy {
                error: self.error_message(),
                error_meta: self.has_meta().then(|| self),
            })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Debug::fmt(self, f)
    }
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Error {
        Error::FailedDatabaseCall(error)
    }
}

impl From<BsonError> for Error {
    fn from(error: BsonError) -> Error {
        Error::FailedToSerializeToBson(error)
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Error {
        Error::ValidationFailed(errors)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidJson(err) => Some(err),
            Error::InvalidPath(err) => Some(err),
            Error::InvalidQuery(err) => Some(err),
            Error::FailedDatabaseCall(err) => Some(err),
            Error::FailedToSerializeToBson(err) => Some(err),
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

fn display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::{json, Value};

    async fn body_of(error: Error) -> (StatusCode, String, Value) {
        let response = error.error_response();
        let status = response.status();
        let code = response
            .headers()
            .get(ERROR_CODE_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, code, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn unauthorized_has_a_bare_body() {
        let (status, code, body) = body_of(Error::Unauthorized).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, "E4011000");
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }

    #[actix_web::test]
    async fn validation_failures_carry_field_errors() {
        let mut errors = ValidationErrors::default();
        errors.add("start_date", "Start must be ≤ End");

        let (status, _, body) = body_of(Error::ValidationFailed(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "error": "The given campaign is invalid",
                "error_meta": { "start_date": ["Start must be ≤ End"] },
            })
        );
    }

    #[actix_web::test]
    async fn not_found_names_the_campaign() {
        let campaign_id = CampaignId::new();

        let (status, code, body) = body_of(Error::CampaignNotFound { campaign_id }).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "E4041001");
        assert_eq!(body["error_meta"]["campaign_id"], campaign_id.to_string());
    }
}
