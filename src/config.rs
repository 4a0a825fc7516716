use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// S3-compatible bucket holding blog images.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Base URL under which uploaded objects are publicly readable.
    pub public_url: String,
}

/// Webhook that tells the public site to drop cached pages.
#[derive(Debug, Clone, Deserialize)]
pub struct RevalidateConfig {
    pub url: String,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub revalidate: Option<RevalidateConfig>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "eyesite-admin"),
            audience: env_or("JWT_AUDIENCE", "eyesite-staff"),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };

        let endpoint = env_or("S3_ENDPOINT", "http://localhost:9000");
        let bucket = env_or("S3_BUCKET", "blog-images");
        let public_url = env_opt("S3_PUBLIC_URL")
            .unwrap_or_else(|| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));
        let storage = StorageConfig {
            endpoint,
            bucket,
            access_key: std::env::var("S3_ACCESS_KEY")?,
            secret_key: std::env::var("S3_SECRET_KEY")?,
            region: env_or("S3_REGION", "us-east-1"),
            public_url,
        };

        let revalidate = env_opt("REVALIDATE_URL").map(|url| RevalidateConfig {
            url,
            secret: env_opt("REVALIDATE_SECRET"),
        });

        let bootstrap_admin = match (
            env_opt("BOOTSTRAP_ADMIN_EMAIL"),
            env_opt("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt,
            storage,
            revalidate,
            bootstrap_admin,
        })
    }
}
