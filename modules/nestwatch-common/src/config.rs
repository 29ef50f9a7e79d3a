use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Geocoding gateway
    pub geocoder_url: String,
    pub geocoder_api_key: Option<String>,

    // Retention
    pub post_retention_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            geocoder_url: required_env("GEOCODER_URL"),
            geocoder_api_key: env::var("GEOCODER_API_KEY").ok(),
            post_retention_days: env::var("POST_RETENTION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .expect("POST_RETENTION_DAYS must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
