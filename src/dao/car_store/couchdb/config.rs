use std::env;

const DEFAULT_BASE_URL: &str = "http://localhost:5984";
const DEFAULT_DATABASE: &str = "crm_cars";

/// Where the CouchDB car store lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CouchConfig {
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Read `COUCH_BASE_URL` and `COUCH_DB`, defaulting to a local server.
    /// Credentials apply only when both `COUCH_USERNAME` and `COUCH_PASSWORD` are set.
    pub fn from_env() -> Self {
        let base_url = non_empty_var("COUCH_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let database = non_empty_var("COUCH_DB").unwrap_or_else(|| DEFAULT_DATABASE.into());
        let config = Self::new(base_url, database);

        match (non_empty_var("COUCH_USERNAME"), non_empty_var("COUCH_PASSWORD")) {
            (Some(username), Some(password)) => config.with_credentials(username, password),
            _ => config,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
