//! Environment-based configuration. `main` loads `.env` first, so a local
//! dotenv file works the same as real environment variables.

use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    /// Postgres connection string. When unset the server runs on the
    /// in-memory store, which is handy for local development.
    pub database_url: Option<String>,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok(),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_owned()),
        }
    }
}
