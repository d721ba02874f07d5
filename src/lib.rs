use actix_web::web::{self, Data, JsonConfig, PathConfig, QueryConfig, ServiceConfig};
use actix_web::{App, HttpServer, ResponseError};
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

pub mod campaign;
pub mod config;
pub mod database;
pub mod error;
pub mod seed;
pub mod typedid;
pub mod user;
pub mod utils;

pub use campaign::{CampaignBody, CampaignListBody};
pub use config::{Backend, ServerConfig};
pub use error::Error;

use crate::database::memory::MemoryDatabase;
use crate::database::{Database, MongoDatabase};
use crate::user::AuthSettings;

/// Registers the campaign routes, the shared state they read, and the
/// extractor error handlers.
pub fn configure(
    db: Data<Box<dyn Database>>,
    settings: Data<AuthSettings>,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(JsonConfig::default().error_handler(|err, _req| {
            // format json errors with custom format
            Error::InvalidJson(err).into()
        }))
        .app_data(PathConfig::default().error_handler(|err, _req| {
            // format path errors with custom format
            Error::InvalidPath(err).into()
        }))
        .app_data(QueryConfig::default().error_handler(|err, _req| {
            // format query errors with custom format
            Error::InvalidQuery(err).into()
        }))
        .app_data(db)
        .app_data(settings)
        .service(campaign::endpoints::get_campaigns)
        .service(campaign::endpoints::create_campaign)
        .service(campaign::endpoints::get_campaign_by_id)
        .service(campaign::endpoints::update_campaign)
        .service(campaign::endpoints::delete_campaign)
        .default_service(web::to(|| async { Error::PathNotFound.error_response() }));
    }
}

pub async fn connect(config: &ServerConfig) -> Result<Box<dyn Database>, Error> {
    let db: Box<dyn Database> = match config.backend {
        Backend::Mongo => {
            info!("connecting to db: {}", config.mongo_uri);
            Box::new(MongoDatabase::connect(&config.mongo_uri, &config.database_name).await?)
        }
        Backend::Memory => {
            warn!("using the in-memory backend, nothing will be persisted");
            Box::new(MemoryDatabase::new())
        }
    };

    Ok(db)
}

pub async fn run(config: ServerConfig) -> Result<(), Error> {
    let db = connect(&config).await?;

    if config.seed {
        let token = seed::seed(db.as_ref()).await?;
        info!(session_cookie = %config.session_cookie, "seeded demo data, session token: {}", token);
    }

    let db = Data::new(db);
    let settings = Data::new(config.auth_settings());
    if settings.require_auth_for_list {
        info!("campaign listing requires a session");
    }

    info!("listening on {}", config.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .configure(configure(db.clone(), settings.clone()))
    })
    .bind(config.bind)?
    .run()
    .await?;

    Ok(())
}
