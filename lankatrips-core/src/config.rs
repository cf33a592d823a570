use std::env;

/// Application configuration, loaded once at startup and injected through
/// `AppState` rather than read from the environment at call sites.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host the HTTP server binds to
    pub host: String,

    /// Port the HTTP server binds to
    pub port: u16,

    /// PostgreSQL connection string
    pub database_url: String,

    /// HMAC secret for signing bearer tokens
    pub jwt_secret: String,

    /// Token lifetime in hours
    pub jwt_expiration_hours: i64,

    /// Currency code stamped on issued receipts
    pub default_currency: String,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// `DATABASE_URL` and `JWT_SECRET` are required; everything else has a
    /// sensible default.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("Invalid SERVER_PORT"))?;

        let jwt_expiration_hours = env::var("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|_| "168".to_string())
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Invalid JWT_EXPIRATION_HOURS"))?;

        let default_currency = env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "LKR".to_string());

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            default_currency,
        })
    }
}
