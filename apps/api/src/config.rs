use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub voice_api_key: String,
    /// Public host the dashboard is served from, e.g. `cadence.example.com`
    /// or `localhost:3000`. Used to derive the webhook callback URL.
    pub public_base_url: String,
    pub environment: Environment,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let environment = match std::env::var("ENVIRONMENT").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            voice_api_key: require_env("VOICE_API_KEY")?,
            public_base_url: require_env("PUBLIC_BASE_URL")?,
            environment,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Absolute origin for this deployment. Localhost base URLs get plain
    /// HTTP so local webhook testing works; everything else is HTTPS.
    pub fn server_url(&self) -> String {
        if self.public_base_url.contains("localhost") {
            format!("http://{}", self.public_base_url)
        } else {
            format!("https://{}", self.public_base_url)
        }
    }

    /// Callback URL registered with the voice provider when a phone number
    /// is linked to an agent.
    pub fn webhook_url(&self) -> String {
        format!("{}/api/response-webhook", self.server_url())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
