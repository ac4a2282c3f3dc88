use serde::Deserialize;

/// Secret and lifetime for one token class.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access: TokenConfig,
    pub refresh: TokenConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Object key prefix for uploaded profile media.
    pub key_prefix: String,
    /// Local directory where multipart uploads are spooled before the
    /// asset store accepts them.
    pub upload_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cors_origin: String,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "cliptube".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "cliptube-users".into()),
            access: TokenConfig {
                secret: std::env::var("ACCESS_TOKEN_SECRET")?,
                ttl_minutes: std::env::var("ACCESS_TOKEN_TTL_MINUTES")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(15),
            },
            refresh: TokenConfig {
                secret: std::env::var("REFRESH_TOKEN_SECRET")?,
                ttl_minutes: std::env::var("REFRESH_TOKEN_TTL_MINUTES")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(60 * 24 * 10),
            },
        };

        let media = MediaConfig {
            endpoint: std::env::var("S3_ENDPOINT")?,
            bucket: std::env::var("S3_BUCKET")?,
            access_key: std::env::var("S3_ACCESS_KEY")?,
            secret_key: std::env::var("S3_SECRET_KEY")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            key_prefix: std::env::var("MEDIA_KEY_PREFIX").unwrap_or_else(|_| "cliptube".into()),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "public/temp".into()),
        };

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
            database_url: std::env::var("DATABASE_URL")?,
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".into()),
            jwt,
            media,
        })
    }
}
