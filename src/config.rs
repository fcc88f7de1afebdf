/// Configuration management for clip-service
///
/// Loads all settings from environment variables. Production deployments
/// must set CORS origins and JWT secrets explicitly; development falls back
/// to local defaults.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// JWT signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
}

/// Media storage (S3-compatible) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub bucket: String,
    /// Public base URL for stored objects (CDN or bucket endpoint)
    pub public_base_url: String,
    /// Upper bound for any single relay call
    pub operation_timeout_secs: u64,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if is_production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:3000".to_string(),
            };

            if is_production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let auth = {
            let access_token_secret = match std::env::var("ACCESS_TOKEN_SECRET") {
                Ok(value) => value,
                Err(_) if is_production => {
                    return Err("ACCESS_TOKEN_SECRET must be set in production".to_string())
                }
                Err(_) => "dev-access-secret".to_string(),
            };
            let refresh_token_secret = match std::env::var("REFRESH_TOKEN_SECRET") {
                Ok(value) => value,
                Err(_) if is_production => {
                    return Err("REFRESH_TOKEN_SECRET must be set in production".to_string())
                }
                Err(_) => "dev-refresh-secret".to_string(),
            };

            AuthConfig {
                access_token_secret,
                refresh_token_secret,
            }
        };

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("CLIP_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("CLIP_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            cors,
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/clip".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(20),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
                acquire_timeout_secs: std::env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
            auth,
            media: MediaConfig {
                bucket: std::env::var("MEDIA_BUCKET").unwrap_or_else(|_| "clip-media".to_string()),
                public_base_url: std::env::var("MEDIA_PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:9000/clip-media".to_string()),
                operation_timeout_secs: std::env::var("MEDIA_OPERATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
                max_upload_bytes: std::env::var("MEDIA_MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(100 * 1024 * 1024),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_outside_production() {
        // Serial-unsafe env mutation is fine here; no other test touches
        // these variables.
        std::env::remove_var("APP_ENV");
        std::env::remove_var("CORS_ALLOWED_ORIGINS");
        std::env::remove_var("CLIP_SERVICE_PORT");

        let config = Config::from_env().expect("development config loads");
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.cors.allowed_origins, "http://localhost:3000");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.media.operation_timeout_secs, 30);
    }
}
