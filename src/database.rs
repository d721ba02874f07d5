use async_trait::async_trait;
use mongodb::{bson, Client, Collection};

use crate::campaign::db::CampaignStore;
use crate::campaign::{self, Campaign};
use crate::error::Error;
use crate::user::db::{MongoUserStore, UserStore};
use crate::user;

pub mod memory;

pub type MongoCampaignStore = Collection<Campaign>;

/// Every store the service talks to. Handlers receive it as
/// `Data<Box<dyn Database>>` so the backend is chosen at startup.
#[async_trait]
pub trait Database: Send + Sync {
    fn campaigns(&self) -> &dyn CampaignStore;

    fn users(&self) -> &dyn UserStore;

    /// Removes all stored data. Only used when seeding.
    async fn drop(&self) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    campaigns: MongoCampaignStore,
    users: MongoUserStore,
    db: mongodb::Database,
}

impl MongoDatabase {
    pub async fn connect(uri: &str, name: &str) -> Result<MongoDatabase, Error> {
        let db = Client::with_uri_str(uri).await?.database(name);

        // ping the database to ensure connection is established
        db.run_command(bson::doc! { "ping": 1 }, None).await?;

        MongoDatabase::initialize(db).await
    }

    pub async fn initialize(db: mongodb::Database) -> Result<MongoDatabase, Error> {
        campaign::db::initialize(&db).await?;
        user::db::initialize(&db).await?;

        Ok(MongoDatabase {
            campaigns: db.collection(campaign::db::CAMPAIGNS),
            users: MongoUserStore::new(&db),
            db,
        })
    }
}

#[async_trait]
impl Database for MongoDatabase {
    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }

    fn users(&self) -> &dyn UserStore {
        &self.users
    }

    async fn drop(&self) -> Result<(), Error> {
        self.db.drop(None).await?;
        Ok(())
    }
}
