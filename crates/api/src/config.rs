//! Environment-driven configuration.

use gatehouse_infra::SmtpConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Secret for validating bearer session tokens.
    pub jwt_secret: String,
    /// Secret for signing email verification tokens.
    pub verify_token_secret: String,
    /// Base URL used when building verification links.
    pub public_base_url: String,
    pub bind_addr: String,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    /// SMTP delivery; when absent, mail is logged instead of sent.
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let verify_token_secret =
            std::env::var("VERIFY_TOKEN_SECRET").unwrap_or_else(|_| jwt_secret.clone());

        let use_persistent_stores = std::env::var("USE_PERSISTENT_STORES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let smtp = std::env::var("SMTP_HOST").ok().map(|host| SmtpConfig {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            from: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "Gatehouse <no-reply@localhost>".to_string()),
        });

        Self {
            jwt_secret,
            verify_token_secret,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            use_persistent_stores,
            database_url: std::env::var("DATABASE_URL").ok(),
            smtp,
        }
    }
}
