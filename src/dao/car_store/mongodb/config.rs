use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE: &str = "crm";
const APP_NAME: &str = "crm-cars";

/// Parsed client options plus the database holding the car collections.
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let mut options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        if options.app_name.is_none() {
            options.app_name = Some(APP_NAME.to_owned());
        }

        Ok(Self {
            options,
            database_name: db_name
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_DATABASE)
                .to_owned(),
        })
    }

    /// Read `MONGO_URI` and `MONGO_DB`, falling back to a local server.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = std::env::var("MONGO_URI").unwrap_or_else(|_| DEFAULT_URI.into());
        let db = std::env::var("MONGO_DB").ok();
        Self::from_uri(&uri, db.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fills_in_database_and_app_name() {
        let config = MongoConfig::from_uri(DEFAULT_URI, None).await.unwrap();
        assert_eq!(config.database_name, "crm");
        assert_eq!(config.options.app_name.as_deref(), Some("crm-cars"));

        let named = MongoConfig::from_uri("mongodb://localhost:27017/?appName=fleet", Some("fleet"))
            .await
            .unwrap();
        assert_eq!(named.database_name, "fleet");
        assert_eq!(named.options.app_name.as_deref(), Some("fleet"));
    }

    #[tokio::test]
    async fn rejects_malformed_uri() {
        let err = MongoConfig::from_uri("postgres://localhost", None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, MongoDaoError::InvalidUri { .. }));
    }
}
