use anyhow::Context;

pub const DEFAULT_RESUME_PREFIX: &str = "resumes/";
pub const DEFAULT_PASSWORD_SUFFIX: &str = "@123";
const DEFAULT_CLOUDINARY_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub resume_prefix: String,
    pub password_suffix: String,
    pub cloudinary: Option<CloudinaryConfig>,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub api_base: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to a production Postgres instance")?;
        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url,
            max_connections,
            resume_prefix: env_or("RESUME_PREFIX", DEFAULT_RESUME_PREFIX),
            password_suffix: env_or("INITIAL_PASSWORD_SUFFIX", DEFAULT_PASSWORD_SUFFIX),
            cloudinary: CloudinaryConfig::from_env(),
        })
    }
}

impl CloudinaryConfig {
    /// Present only when all three credentials are set.
    fn from_env() -> Option<Self> {
        let cloud_name = std::env::var("CLOUDINARY_CLOUD_NAME").ok()?;
        let api_key = std::env::var("CLOUDINARY_API_KEY").ok()?;
        let api_secret = std::env::var("CLOUDINARY_API_SECRET").ok()?;

        Some(Self {
            api_base: env_or("CLOUDINARY_API_BASE", DEFAULT_CLOUDINARY_BASE),
            cloud_name,
            api_key,
            api_secret,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
