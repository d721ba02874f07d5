use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

use crate::user::auth::DEFAULT_SESSION_COOKIE;
use crate::user::AuthSettings;

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE_NAME: &str = "campaign_console";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "campaign_console", version, about = "Campaign management API server")]
pub struct ServerConfig {
    #[arg(
        long,
        env = "CAMPAIGN_CONSOLE_BIND",
        value_name = "ADDR",
        default_value = DEFAULT_BIND,
        help = "Address the HTTP server listens on"
    )]
    pub bind: SocketAddr,

    #[arg(
        long,
        env = "CAMPAIGN_CONSOLE_BACKEND",
        value_enum,
        default_value_t = Backend::Mongo,
        help = "Where campaigns, sessions and profiles are stored"
    )]
    pub backend: Backend,

    #[arg(
        long,
        env = "CAMPAIGN_CONSOLE_MONGO_URI",
        value_name = "URI",
        default_value = DEFAULT_MONGO_URI
    )]
    pub mongo_uri: String,

    #[arg(
        long,
        env = "CAMPAIGN_CONSOLE_DATABASE",
        value_name = "NAME",
        default_value = DEFAULT_DATABASE_NAME
    )]
    pub database_name: String,

    #[arg(
        long,
        env = "CAMPAIGN_CONSOLE_SESSION_COOKIE",
        value_name = "NAME",
        default_value = DEFAULT_SESSION_COOKIE,
        help = "Cookie holding the session token"
    )]
    pub session_cookie: String,

    #[arg(
        long,
        env = "CAMPAIGN_CONSOLE_REQUIRE_AUTH_FOR_LIST",
        help = "Require a session to list campaigns and scope the list to the caller's account"
    )]
    pub require_auth_for_list: bool,

    #[arg(
        long,
        env = "CAMPAIGN_CONSOLE_SEED",
        help = "Drop all data and load a demo account, session and campaigns on startup"
    )]
    pub seed: bool,
}

impl ServerConfig {
    pub fn auth_settings(&self) -> AuthSettings {
        let session_cookie = match self.session_cookie.trim() {
            "" => DEFAULT_SESSION_COOKIE.to_owned(),
            name => name.to_owned(),
        };

        AuthSettings {
            session_cookie,
            require_auth_for_list: self.require_auth_for_list,
        }
    }
}
